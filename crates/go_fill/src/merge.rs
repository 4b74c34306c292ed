// ==============================================================================
// Literal Merging
// ==============================================================================
//
// Lines up the elements the user already wrote with the struct's fields and
// decides, field by field, whether to keep the user's text or synthesize a
// zero value. The output is always keyed and in declaration order; rendering
// happens separately.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use go_ast::{CompositeLit, Element, SourceFile};
use smol_str::SmolStr;

use crate::diagnostic::{suggest_similar, FillError};
use crate::resolve::ResolvedStruct;
use crate::zero::{Synthesizer, ZeroExpr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// The user's expression, sliced verbatim from the source.
    Source(String),
    Zero(ZeroExpr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedEntry {
    pub name: SmolStr,
    pub value: Value,
    pub leading: Vec<SmolStr>,
    pub trailing: Option<SmolStr>,
    pub user_supplied: bool,
}

impl MergedEntry {
    fn zero(name: SmolStr, expr: ZeroExpr) -> Self {
        Self {
            name,
            value: Value::Zero(expr),
            leading: Vec::new(),
            trailing: None,
            user_supplied: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Merged {
    pub entries: Vec<MergedEntry>,
    /// Comments that sat before the closing brace.
    pub dangling: Vec<SmolStr>,
    /// Import paths named by synthesized values.
    pub imports: BTreeSet<SmolStr>,
}

/// Merges `lit` with the fields of `resolved`. `Ok(None)` means `cancel`
/// was raised part way through.
pub fn merge(
    file: &SourceFile,
    lit: &CompositeLit,
    resolved: &ResolvedStruct,
    synth: &Synthesizer<'_>,
    cancel: Option<&Arc<AtomicBool>>,
) -> Result<Option<Merged>, FillError> {
    let ty_text = file.slice(&lit.ty_span);
    let supplied = match_elements(lit, resolved, ty_text)?;
    let same_package = resolved.package_path == synth.package_path();

    let mut merged = Merged {
        dangling: lit.dangling.clone(),
        ..Merged::default()
    };
    for field in &resolved.fields.fields {
        if let Some(element) = supplied.get(&field.ordinal) {
            merged.entries.push(MergedEntry {
                name: field.name.clone(),
                value: Value::Source(file.slice(&element.value).to_string()),
                leading: element.leading.clone(),
                trailing: element.trailing.clone(),
                user_supplied: true,
            });
            continue;
        }
        if !field.exported && !same_package {
            continue;
        }
        if cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
            log::info!("merge: cancelled");
            return Ok(None);
        }
        let zero = synth.synthesize(&field.ty);
        merged.imports.extend(zero.imports);
        merged.entries.push(MergedEntry::zero(field.name.clone(), zero.expr));
    }
    Ok(Some(merged))
}

/// Field ordinal -> the element that sets it.
fn match_elements<'l>(
    lit: &'l CompositeLit,
    resolved: &ResolvedStruct,
    ty_text: &str,
) -> Result<HashMap<usize, &'l Element>, FillError> {
    let keyed = lit.elements.iter().filter(|e| e.key.is_some()).count();
    if keyed > 0 && keyed < lit.elements.len() {
        return Err(FillError::mixed_syntax(ty_text, &lit.span()));
    }

    let fields = &resolved.fields;
    let mut supplied = HashMap::new();
    if keyed == 0 {
        if let Some(extra) = lit.elements.get(fields.len()) {
            return Err(FillError::too_many_values(
                ty_text,
                fields.len(),
                lit.elements.len(),
                &extra.span,
            ));
        }
        supplied.extend(lit.elements.iter().enumerate());
        return Ok(supplied);
    }

    for element in &lit.elements {
        let Some(key) = &element.key else { continue };
        let field = key.is_ident.then(|| fields.field(&key.text)).flatten();
        let Some(field) = field else {
            let names = fields.fields.iter().map(|f| &f.name);
            return Err(FillError::ambiguous_key(
                key.text.clone(),
                ty_text,
                suggest_similar(&key.text, names),
                &key.span,
            ));
        };
        if supplied.insert(field.ordinal, element).is_some() {
            return Err(FillError::duplicate_key(key.text.clone(), &key.span));
        }
    }
    Ok(supplied)
}
