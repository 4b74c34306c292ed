use std::ops;

use derive_more::Debug;
use la_arena::{Arena, Idx};
use smol_str::SmolStr;

use crate::error::{Diag, Span};
use crate::line_index::LineIndex;

pub type TypeDeclId = Idx<TypeDecl>;
pub type LiteralId = Idx<CompositeLit>;

/// One parsed Go file. Owns its text so that spans can be turned back into
/// source slices without re-reading anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    #[debug(skip)]
    pub text: String,
    pub package: Option<SmolStr>,
    pub imports: Vec<ImportSpec>,
    pub types: Arena<TypeDecl>,
    pub consts: Vec<ConstDecl>,
    pub literals: Arena<CompositeLit>,
    pub diags: Vec<Diag>,
    #[debug(skip)]
    pub line_index: LineIndex,
}

impl SourceFile {
    pub fn slice(&self, span: &Span) -> &str {
        &self.text[span.clone()]
    }

    pub fn type_decls(&self) -> impl Iterator<Item = (TypeDeclId, &TypeDecl)> + '_ {
        self.types.iter()
    }

    pub fn literals(&self) -> impl Iterator<Item = (LiteralId, &CompositeLit)> + '_ {
        self.literals.iter()
    }

    /// Package-level type declaration with the given name.
    pub fn package_type(&self, name: &str) -> Option<TypeDeclId> {
        self.types
            .iter()
            .find(|(_, decl)| decl.scope.is_none() && decl.name == name)
            .map(|(id, _)| id)
    }

    /// The innermost function-local declaration of `name` visible at `offset`.
    pub fn local_type(&self, name: &str, offset: usize) -> Option<TypeDeclId> {
        self.types
            .iter()
            .filter(|(_, decl)| decl.name == name && decl.span.start <= offset)
            .filter(|(_, decl)| decl.scope.as_ref().is_some_and(|s| s.contains(&offset)))
            .min_by_key(|(_, decl)| decl.scope.as_ref().map(|s| s.len()))
            .map(|(id, _)| id)
    }

    pub fn package_const(&self, name: &str) -> Option<u64> {
        self.consts
            .iter()
            .find(|c| c.scope.is_none() && c.name == name)
            .and_then(|c| c.value)
    }

    /// The import whose local name is `qualifier`.
    pub fn import_by_name(&self, qualifier: &str) -> Option<&ImportSpec> {
        self.imports
            .iter()
            .find(|spec| spec.local_name().as_deref() == Some(qualifier))
    }

    pub fn import_by_path(&self, path: &str) -> Option<&ImportSpec> {
        self.imports.iter().find(|spec| spec.path == path)
    }

    /// Indentation (leading spaces and tabs) of the line containing `offset`.
    pub fn indent_at(&self, offset: usize) -> &str {
        let line = self.line_index.line_of(offset);
        let start = self.line_index.line_start(line);
        let rest = &self.text[start..];
        let len = rest
            .find(|c: char| c != ' ' && c != '\t')
            .unwrap_or(rest.len());
        &rest[..len]
    }
}

impl ops::Index<TypeDeclId> for SourceFile {
    type Output = TypeDecl;
    fn index(&self, index: TypeDeclId) -> &Self::Output {
        &self.types[index]
    }
}

impl ops::Index<LiteralId> for SourceFile {
    type Output = CompositeLit;
    fn index(&self, index: LiteralId) -> &Self::Output {
        &self.literals[index]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit name: an alias, `_` or `.`.
    pub name: Option<SmolStr>,
    pub path: SmolStr,
    pub span: Span,
}

impl ImportSpec {
    /// Last path element, which is the conventional package name.
    pub fn default_name(&self) -> SmolStr {
        default_package_name(&self.path)
    }

    /// The identifier this import binds in the file, if any. Blank and dot
    /// imports bind nothing.
    pub fn local_name(&self) -> Option<SmolStr> {
        match self.name.as_deref() {
            Some("_") | Some(".") => None,
            Some(name) => Some(name.into()),
            None => Some(self.default_name()),
        }
    }

    pub fn is_dot(&self) -> bool {
        self.name.as_deref() == Some(".")
    }
}

/// `gopkg.in/yaml.v3` is package `yaml`, `example.com/mod/v2` is `mod`.
pub fn default_package_name(path: &str) -> SmolStr {
    let mut parts = path.rsplit('/');
    let mut last = parts.next().unwrap_or(path);
    if last.len() > 1 && last.starts_with('v') && last[1..].bytes().all(|b| b.is_ascii_digit()) {
        if let Some(prev) = parts.next() {
            last = prev;
        }
    }
    let last = last.strip_prefix("go-").unwrap_or(last);
    let end = last.find('.').unwrap_or(last.len());
    last[..end].replace('-', "_").into()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: SmolStr,
    pub params: Vec<SmolStr>,
    /// `type A = B` rather than `type A B`.
    pub alias: bool,
    pub ty: TypeExpr,
    pub span: Span,
    /// Body of the function this declaration is local to.
    pub scope: Option<Span>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstDecl {
    pub name: SmolStr,
    /// Set only for plain integer literal values.
    pub value: Option<u64>,
    pub scope: Option<Span>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayLen {
    Int(u64),
    /// `[...]T{}` – only valid in literals.
    Ellipsis,
    /// A constant expression we do not evaluate here.
    Expr(SmolStr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Name {
        qualifier: Option<SmolStr>,
        name: SmolStr,
        args: Vec<TypeExpr>,
    },
    #[debug("*{_0:?}")]
    Pointer(Box<TypeExpr>),
    #[debug("[]{_0:?}")]
    Slice(Box<TypeExpr>),
    #[debug("[{len:?}]{elem:?}")]
    Array { len: ArrayLen, elem: Box<TypeExpr> },
    #[debug("map[{key:?}]{value:?}")]
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    #[debug("chan({dir:?}) {elem:?}")]
    Chan { dir: ChanDir, elem: Box<TypeExpr> },
    #[debug("{text}")]
    Func { text: SmolStr },
    #[debug("struct{fields:?}")]
    Struct { fields: Vec<FieldDecl> },
    #[debug("{text}")]
    Interface { text: SmolStr },
}

impl TypeExpr {
    pub fn name(name: impl Into<SmolStr>) -> Self {
        TypeExpr::Name {
            qualifier: None,
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn qualified(qualifier: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        TypeExpr::Name {
            qualifier: Some(qualifier.into()),
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Whether a literal of this type uses the bare TypeName form, the one
    /// Go forbids unparenthesized in statement headers.
    pub fn is_type_name(&self) -> bool {
        matches!(self, TypeExpr::Name { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Empty for an embedded field.
    pub names: Vec<SmolStr>,
    pub ty: TypeExpr,
    pub tag: Option<SmolStr>,
    pub span: Span,
}

impl FieldDecl {
    pub fn is_embedded(&self) -> bool {
        self.names.is_empty()
    }

    /// Implicit name of an embedded field: the type name without qualifier,
    /// pointer or type arguments.
    pub fn embedded_name(&self) -> Option<SmolStr> {
        let mut ty = &self.ty;
        if let TypeExpr::Pointer(inner) = ty {
            ty = inner;
        }
        match ty {
            TypeExpr::Name { name, .. } => Some(name.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeLit {
    pub ty: TypeExpr,
    pub ty_span: Span,
    /// Offset of `{`.
    pub lbrace: usize,
    /// Offset of the matching `}`.
    pub rbrace: usize,
    pub elements: Vec<Element>,
    /// Comments after the last element, before `}`.
    pub dangling: Vec<SmolStr>,
}

impl CompositeLit {
    /// Type through closing brace.
    pub fn span(&self) -> Span {
        self.ty_span.start..self.rbrace + 1
    }

    /// `{` through `}` inclusive.
    pub fn brace_span(&self) -> Span {
        self.lbrace..self.rbrace + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub key: Option<Key>,
    /// The value expression, from its first token to its last.
    pub value: Span,
    /// Whole element, key included.
    pub span: Span,
    pub leading: Vec<SmolStr>,
    pub trailing: Option<SmolStr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    pub text: SmolStr,
    pub span: Span,
    /// Struct literal keys are plain identifiers; map and array keys are not.
    pub is_ident: bool,
}
