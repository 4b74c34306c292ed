pub mod db;
pub mod diagnostic;
pub mod imports;
pub mod merge;
pub mod render;
pub mod resolve;
pub mod zero;


#[cfg(test)]
mod pbt;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use derive_more::Debug;
use go_ast::{CompositeLit, LiteralId, SourceFile, Span, TypeExpr};
use smol_str::SmolStr;

pub use db::{Package, PackageDb};
pub use diagnostic::FillError;
pub use imports::{FileQualifier, ImportAugmenter, ImportRequest};
pub use render::{IndentStyle, RenderOptions};
pub use resolve::{ResolveError, ResolvedStruct, Scope, SourceResolver, TypeResolver};
pub use zero::{Synthesizer, WellKnown, ZeroExpr, ZeroValue};

/// Which literal(s) to fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The innermost struct literal containing this byte offset.
    Offset(usize),
    /// The literal spanning exactly this range, else the innermost one
    /// containing it.
    Span(Span),
    /// Every outermost struct literal whose type starts on this 1-based line.
    Line(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct FillRequest<'a> {
    pub file: &'a SourceFile,
    pub path: Option<&'a Path>,
    /// Import path of the package `file` belongs to.
    pub package_path: &'a str,
    pub target: &'a Target,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillOptions {
    pub indent: IndentStyle,
    pub align: bool,
    pub recurse: bool,
    pub well_known: WellKnown,
    /// Longer arrays render as `[N]T{}` instead of N zero elements.
    pub max_array_elems: Option<u64>,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            indent: IndentStyle::Tab,
            align: true,
            recurse: false,
            well_known: WellKnown::default(),
            max_array_elems: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[debug("{span:?} => {text:?}")]
pub struct TextEdit {
    /// Byte range of the original braces, both included.
    pub span: Span,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillOutput {
    /// Sorted by position, never overlapping.
    pub edits: Vec<TextEdit>,
    /// Imports the file lacks for the edits to compile.
    pub imports: Vec<ImportRequest>,
}

/// Fills the targeted literals with keyed zero values for every field the
/// user has not written yet.
///
/// Returns `Ok(None)` when `cancel` is raised before the work completes. On
/// error nothing is forwarded to `augmenter`.
pub fn fill_struct(
    request: &FillRequest<'_>,
    resolver: &dyn TypeResolver,
    options: &FillOptions,
    augmenter: &mut dyn ImportAugmenter,
    cancel: Option<&Arc<AtomicBool>>,
) -> Result<Option<FillOutput>, FillError> {
    let file = request.file;
    let cancelled = || cancel.is_some_and(|f| f.load(Ordering::Relaxed));
    log::debug!("fill_struct {:?} at {:?}", request.path, request.target);

    let qualifier = FileQualifier::new(file, request.package_path);
    let synth = Synthesizer::new(
        &qualifier,
        request.package_path,
        &options.well_known,
        options.recurse,
    )
    .with_max_array_elems(options.max_array_elems);
    let render_options = RenderOptions {
        indent: options.indent,
        align: options.align,
    };

    let (targets, skip_non_structs) = locate(file, request.target)?;
    let mut edits = Vec::new();
    let mut used: BTreeSet<SmolStr> = BTreeSet::new();
    for id in targets {
        if cancelled() {
            log::info!("fill_struct: cancelled");
            return Ok(None);
        }
        let lit = &file[id];
        let scope = Scope {
            file,
            path: request.path,
            package_path: request.package_path,
            offset: lit.lbrace,
            cancel,
        };
        let resolved = match resolver.resolve(&lit.ty, &scope) {
            Ok(resolved) => resolved,
            Err(ResolveError::Cancelled) => return Ok(None),
            Err(ResolveError::NotAStruct { .. }) if skip_non_structs => {
                log::debug!("skipping non-struct literal {}", file.slice(&lit.ty_span));
                continue;
            }
            Err(ResolveError::NotAStruct { underlying, .. }) => {
                return Err(FillError::not_a_struct(
                    file.slice(&lit.ty_span),
                    underlying,
                    &lit.ty_span,
                ))
            }
            Err(ResolveError::Unresolved(name)) => {
                return Err(FillError::unresolved(name, &lit.ty_span))
            }
        };

        let Some(merged) = merge::merge(file, lit, &resolved, &synth, cancel)? else {
            return Ok(None);
        };
        used.extend(merged.imports.iter().cloned());
        let text = render::render(&merged, file.indent_at(lit.lbrace), render_options);
        edits.push(TextEdit {
            span: lit.brace_span(),
            text,
        });
    }

    if edits.is_empty() {
        return Err(FillError::no_literal(&target_span(file, request.target)));
    }
    edits.sort_by_key(|edit| edit.span.start);

    let imports = imports::missing_imports(file, request.package_path, &used);
    for import in &imports {
        augmenter.add_import(import.clone());
    }
    Ok(Some(FillOutput { edits, imports }))
}

/// Applies non-overlapping edits to `text`.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> String {
    let mut out = text.to_string();
    let mut edits: Vec<&TextEdit> = edits.iter().collect();
    edits.sort_by_key(|edit| std::cmp::Reverse(edit.span.start));
    for edit in edits {
        out.replace_range(edit.span.clone(), &edit.text);
    }
    out
}

/// Literals written with a struct-capable type: a type name or an explicit
/// struct type. Slice, array and map literals never are.
fn may_be_struct(lit: &CompositeLit) -> bool {
    matches!(lit.ty, TypeExpr::Name { .. } | TypeExpr::Struct { .. })
}

/// The literals to fill, and whether non-struct ones are skipped rather
/// than reported.
fn locate(file: &SourceFile, target: &Target) -> Result<(Vec<LiteralId>, bool), FillError> {
    let not_found = || FillError::no_literal(&target_span(file, target));
    match target {
        Target::Offset(offset) => file
            .literals_at(*offset)
            .into_iter()
            .find(|id| may_be_struct(&file[*id]))
            .map(|id| (vec![id], false))
            .ok_or_else(not_found),
        Target::Span(span) => {
            let exact = file
                .literals()
                .find(|(_, lit)| lit.span() == *span && may_be_struct(lit))
                .map(|(id, _)| id);
            let containing = || {
                file.literals_at(span.start)
                    .into_iter()
                    .find(|id| {
                        let lit = &file[*id];
                        lit.span().end >= span.end && may_be_struct(lit)
                    })
            };
            exact
                .or_else(containing)
                .map(|id| (vec![id], false))
                .ok_or_else(not_found)
        }
        Target::Line(line) => {
            if *line == 0 || *line > file.line_index.line_count() {
                return Err(not_found());
            }
            let line = line - 1;
            let on_line: Vec<LiteralId> = file
                .literals()
                .filter(|(_, lit)| may_be_struct(lit))
                .filter(|(_, lit)| file.line_index.line_of(lit.ty_span.start) == line)
                .map(|(id, _)| id)
                .collect();
            let outermost: Vec<LiteralId> = on_line
                .iter()
                .copied()
                .filter(|id| {
                    let span = file[*id].span();
                    !on_line.iter().any(|other| {
                        let outer = file[*other].span();
                        *other != *id
                            && outer.start <= span.start
                            && span.end <= outer.end
                            && outer != span
                    })
                })
                .collect();
            if outermost.is_empty() {
                return Err(not_found());
            }
            Ok((outermost, true))
        }
    }
}

fn target_span(file: &SourceFile, target: &Target) -> Span {
    match target {
        Target::Offset(offset) => *offset..*offset,
        Target::Span(span) => span.clone(),
        Target::Line(line) => {
            let index = &file.line_index;
            let line = line.saturating_sub(1);
            let start = index.line_start(line);
            let end = if line + 1 < index.line_count() {
                index.line_start(line + 1)
            } else {
                file.text.len()
            };
            start.min(file.text.len())..end
        }
    }
}
