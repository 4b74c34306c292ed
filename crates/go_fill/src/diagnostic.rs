// ==============================================================================
// Fill Errors
// ==============================================================================
//
// Everything that stops a literal from being filled. Each variant carries the
// offending name and its byte span in the request's source so the CLI can
// render it with miette; the library never produces a partial edit alongside
// one of these.

use go_ast::Span;
use miette::{Diagnostic, SourceSpan};
use smol_str::SmolStr;
use thiserror::Error;

fn label(span: &Span) -> SourceSpan {
    span.clone().into()
}

#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum FillError {
    #[error("`{name}` is not a struct type (underlying type is `{underlying}`)")]
    #[diagnostic(code(fillstruct::not_a_struct))]
    NotAStruct {
        name: SmolStr,
        underlying: String,
        #[label("literal type")]
        span: SourceSpan,
    },

    #[error("cannot resolve type `{name}`")]
    #[diagnostic(
        code(fillstruct::unresolved_type),
        help("check the import list, or add a search root or module mapping to fillstruct.toml")
    )]
    UnresolvedType {
        name: SmolStr,
        #[label("not found in any visible scope")]
        span: SourceSpan,
    },

    #[error("unknown field `{key}` in struct literal of type `{ty}`")]
    #[diagnostic(code(fillstruct::ambiguous_key))]
    AmbiguousKey {
        key: SmolStr,
        ty: SmolStr,
        suggestion: Option<SmolStr>,
        #[help]
        help: Option<String>,
        #[label("no such field")]
        span: SourceSpan,
    },

    #[error("duplicate field `{key}` in struct literal")]
    #[diagnostic(code(fillstruct::duplicate_key))]
    DuplicateKey {
        key: SmolStr,
        #[label("already given earlier in this literal")]
        span: SourceSpan,
    },

    #[error("mixture of field:value and value elements in struct literal of type `{ty}`")]
    #[diagnostic(
        code(fillstruct::mixed_literal_syntax),
        help("use either keyed or positional elements, not both")
    )]
    MixedLiteralSyntax {
        ty: SmolStr,
        #[label("literal mixes both forms")]
        span: SourceSpan,
    },

    #[error("too many values in struct literal of type `{ty}`: expected {expected}, found {found}")]
    #[diagnostic(code(fillstruct::too_many_values))]
    TooManyValues {
        ty: SmolStr,
        expected: usize,
        found: usize,
        #[label("extra value")]
        span: SourceSpan,
    },

    #[error("no composite literal at the requested position")]
    #[diagnostic(code(fillstruct::no_composite_literal))]
    NoCompositeLiteral {
        #[label("here")]
        span: SourceSpan,
    },
}

impl FillError {
    pub fn not_a_struct(name: impl Into<SmolStr>, underlying: String, span: &Span) -> Self {
        FillError::NotAStruct {
            name: name.into(),
            underlying,
            span: label(span),
        }
    }

    pub fn unresolved(name: impl Into<SmolStr>, span: &Span) -> Self {
        FillError::UnresolvedType {
            name: name.into(),
            span: label(span),
        }
    }

    pub fn ambiguous_key(
        key: impl Into<SmolStr>,
        ty: impl Into<SmolStr>,
        suggestion: Option<SmolStr>,
        span: &Span,
    ) -> Self {
        FillError::AmbiguousKey {
            key: key.into(),
            ty: ty.into(),
            help: suggestion.as_ref().map(|s| format!("did you mean `{s}`?")),
            suggestion,
            span: label(span),
        }
    }

    pub fn duplicate_key(key: impl Into<SmolStr>, span: &Span) -> Self {
        FillError::DuplicateKey {
            key: key.into(),
            span: label(span),
        }
    }

    pub fn mixed_syntax(ty: impl Into<SmolStr>, span: &Span) -> Self {
        FillError::MixedLiteralSyntax {
            ty: ty.into(),
            span: label(span),
        }
    }

    pub fn too_many_values(ty: impl Into<SmolStr>, expected: usize, found: usize, span: &Span) -> Self {
        FillError::TooManyValues {
            ty: ty.into(),
            expected,
            found,
            span: label(span),
        }
    }

    pub fn no_literal(span: &Span) -> Self {
        FillError::NoCompositeLiteral { span: label(span) }
    }

    /// Byte range of the offending source, for callers that do their own
    /// rendering.
    pub fn span(&self) -> Span {
        let span = match self {
            FillError::NotAStruct { span, .. }
            | FillError::UnresolvedType { span, .. }
            | FillError::AmbiguousKey { span, .. }
            | FillError::DuplicateKey { span, .. }
            | FillError::MixedLiteralSyntax { span, .. }
            | FillError::TooManyValues { span, .. }
            | FillError::NoCompositeLiteral { span } => span,
        };
        span.offset()..span.offset() + span.len()
    }
}

// ==============================================================================
// Field name suggestions
// ==============================================================================

/// Levenshtein distance counted in chars, so identifiers with non-ASCII
/// letters are measured per letter.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let target: Vec<char> = b.chars().collect();
    // `row[j]` is the distance from the prefix of `a` seen so far to
    // `target[..j]`.
    let mut row: Vec<usize> = (0..=target.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &cb) in target.iter().enumerate() {
            let replaced = diagonal + usize::from(ca != cb);
            diagonal = row[j + 1];
            row[j + 1] = replaced.min(diagonal + 1).min(row[j] + 1);
        }
    }
    row[target.len()]
}

/// Closest candidate to `needle` within about half its length, and never
/// more than 3 edits away. Exact matches are not suggestions. Ties go to
/// the earliest candidate.
pub fn suggest_similar<'a>(
    needle: &str,
    candidates: impl IntoIterator<Item = &'a SmolStr>,
) -> Option<SmolStr> {
    let budget = needle.chars().count().div_ceil(2).clamp(1, 3);
    candidates
        .into_iter()
        .map(|candidate| (candidate, edit_distance(needle, candidate)))
        .filter(|&(_, dist)| (1..=budget).contains(&dist))
        .min_by_key(|&(_, dist)| dist)
        .map(|(candidate, _)| candidate.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distances() {
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("Name", "Name"), 0);
        assert_eq!(edit_distance("Nmae", "Name"), 2);
        assert_eq!(edit_distance("Numbr", "Number"), 1);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("name", "Name"), 1);
        assert_eq!(edit_distance("Größe", "Grösse"), 2);
        assert_eq!(edit_distance("Größe", "Grose"), 2);
    }

    #[test]
    fn suggestion_skips_exact_and_distant_names() {
        let fields: Vec<SmolStr> = ["String", "Number", "Float"].map(SmolStr::from).to_vec();
        assert_eq!(suggest_similar("Numbr", &fields).as_deref(), Some("Number"));
        assert_eq!(suggest_similar("Number", &fields), None);
        assert_eq!(suggest_similar("Zzz", &fields), None);

        let tied: Vec<SmolStr> = ["Nx", "Ny"].map(SmolStr::from).to_vec();
        assert_eq!(suggest_similar("Nz", &tied).as_deref(), Some("Nx"));
    }

    #[test]
    fn ambiguous_key_help_names_the_suggestion() {
        let err = FillError::ambiguous_key("Numbr", "Struct", Some("Number".into()), &(10..15));
        assert_eq!(
            err.to_string(),
            "unknown field `Numbr` in struct literal of type `Struct`"
        );
        assert_eq!(
            err.help().map(|h| h.to_string()).as_deref(),
            Some("did you mean `Number`?")
        );
        assert_eq!(err.span(), 10..15);
    }
}
