// ==============================================================================
// Literal Rendering
// ==============================================================================
//
// Prints merged entries as the replacement for a literal's braces: one
// `Key: value,` per line, gofmt-style column alignment within runs of
// single-line entries, comments kept where they were attached.

use std::fmt::Write;

use smol_str::SmolStr;

use crate::merge::{Merged, Value};
use crate::zero::ZeroExpr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndentStyle {
    #[default]
    Tab,
    Spaces(usize),
}

impl IndentStyle {
    pub fn unit(self) -> String {
        match self {
            IndentStyle::Tab => "\t".to_string(),
            IndentStyle::Spaces(n) => " ".repeat(n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub indent: IndentStyle,
    pub align: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent: IndentStyle::Tab,
            align: true,
        }
    }
}

struct Row<'a> {
    leading: &'a [SmolStr],
    key: &'a str,
    value: String,
    trailing: Option<&'a str>,
}

impl Row<'_> {
    fn is_multiline(&self) -> bool {
        self.value.contains('\n')
    }
}

/// Text replacing `{` through `}`; `base` is the indentation of the line
/// holding the opening brace.
pub fn render(merged: &Merged, base: &str, options: RenderOptions) -> String {
    if merged.entries.is_empty() && merged.dangling.is_empty() {
        return "{}".to_string();
    }
    let unit = options.indent.unit();
    let inner = format!("{base}{unit}");

    let rows: Vec<Row<'_>> = merged
        .entries
        .iter()
        .map(|entry| Row {
            leading: &entry.leading,
            key: &entry.name,
            value: match &entry.value {
                Value::Source(text) => text.clone(),
                Value::Zero(expr) => render_zero(expr, &inner, &unit, options.align),
            },
            trailing: entry.trailing.as_deref(),
        })
        .collect();

    let mut out = String::from("{\n");
    write_rows(&mut out, &rows, &inner, options.align);
    for comment in &merged.dangling {
        let _ = writeln!(out, "{inner}{comment}");
    }
    out.push_str(base);
    out.push('}');
    out
}

fn render_zero(expr: &ZeroExpr, indent: &str, unit: &str, align: bool) -> String {
    match expr {
        ZeroExpr::Text(text) => text.clone(),
        ZeroExpr::Composite { ty, fields } => {
            let inner = format!("{indent}{unit}");
            let rows: Vec<Row<'_>> = fields
                .iter()
                .map(|(name, expr)| Row {
                    leading: &[],
                    key: name,
                    value: render_zero(expr, &inner, unit, align),
                    trailing: None,
                })
                .collect();
            let mut out = format!("{ty}{{\n");
            write_rows(&mut out, &rows, &inner, align);
            out.push_str(indent);
            out.push('}');
            out
        }
    }
}

fn width(text: &str) -> usize {
    text.chars().count()
}

fn write_rows(out: &mut String, rows: &[Row<'_>], indent: &str, align: bool) {
    // Value column per row: rows in one alignment run share the widest key.
    let mut key_cols = vec![0; rows.len()];
    let mut run_start = 0;
    for i in 0..=rows.len() {
        let breaks = i == rows.len()
            || rows[i].is_multiline()
            || !rows[i].leading.is_empty()
            || (i > 0 && rows[i - 1].is_multiline());
        if breaks {
            let run = &rows[run_start..i];
            let col = run.iter().map(|r| width(r.key) + 1).max().unwrap_or(0);
            for (j, row) in run.iter().enumerate() {
                key_cols[run_start + j] = if align { col } else { width(row.key) + 1 };
            }
            run_start = i;
        }
    }

    let lines: Vec<String> = rows
        .iter()
        .zip(&key_cols)
        .map(|(row, col)| {
            let colon = format!("{}:", row.key);
            if row.is_multiline() {
                format!("{colon} {},", row.value)
            } else {
                format!("{colon:<col$} {},", row.value, col = *col)
            }
        })
        .collect();

    // Trailing comments align within runs of commented single-line rows.
    let commented = |row: &Row<'_>| row.trailing.is_some() && !row.is_multiline();
    let mut comment_cols = vec![0; rows.len()];
    let mut i = 0;
    while i < rows.len() {
        if !commented(&rows[i]) {
            i += 1;
            continue;
        }
        let start = i;
        i += 1;
        while i < rows.len() && commented(&rows[i]) && rows[i].leading.is_empty() {
            i += 1;
        }
        let col = (start..i).map(|j| width(&lines[j])).max().unwrap_or(0);
        for j in start..i {
            comment_cols[j] = if align { col } else { width(&lines[j]) };
        }
    }

    for ((row, line), col) in rows.iter().zip(&lines).zip(&comment_cols) {
        for comment in row.leading {
            let _ = writeln!(out, "{indent}{comment}");
        }
        out.push_str(indent);
        match row.trailing {
            Some(comment) => {
                let _ = writeln!(out, "{line:<col$} {comment}", col = *col);
            }
            None => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }
}
