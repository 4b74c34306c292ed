mod display;
mod primitive;

#[cfg(feature = "proptest_support")]
pub mod arbitrary;

use std::{ops::Deref, sync::Arc};

pub use display::{Qualifier, TyDisplay};
pub use go_ast::ChanDir;
pub use primitive::PrimitiveTy;

use derive_more::Debug;
use smol_str::SmolStr;

/// A declared type's identity. `path` is empty for the universe scope.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TypeName {
    pub path: SmolStr,
    pub package: SmolStr,
    pub name: SmolStr,
}

impl TypeName {
    pub fn new(
        path: impl Into<SmolStr>,
        package: impl Into<SmolStr>,
        name: impl Into<SmolStr>,
    ) -> Self {
        Self {
            path: path.into(),
            package: package.into(),
            name: name.into(),
        }
    }

    pub fn universe(name: impl Into<SmolStr>) -> Self {
        Self::new("", "", name)
    }

    pub fn is_universe(&self) -> bool {
        self.path.is_empty()
    }

    /// `import/path.Name`, the key used for well-known type lists.
    pub fn qualified(&self) -> String {
        if self.is_universe() {
            self.name.to_string()
        } else {
            format!("{}.{}", self.path, self.name)
        }
    }
}

impl std::fmt::Debug for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.qualified())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ArrayLen {
    #[debug("{_0}")]
    Known(u64),
    /// A constant we could not evaluate; kept as written.
    #[debug("{_0}")]
    Symbolic(SmolStr),
}

// A fully resolved Go type. Named types carry their underlying shape, except
// where the resolver had to stop: declarations it cannot see, and recursive
// references, become `Opaque`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    #[debug("{_0:?}")]
    Primitive(PrimitiveTy),
    #[debug("{_0:?}")]
    Named(NamedTy),
    #[debug("*{_0:?}")]
    Pointer(TyRef),
    #[debug("[]{_0:?}")]
    Slice(TyRef),
    #[debug("[{len:?}]{elem:?}")]
    Array { len: ArrayLen, elem: TyRef },
    #[debug("map[{key:?}]{value:?}")]
    Map { key: TyRef, value: TyRef },
    #[debug("{_0:?}")]
    Struct(StructTy),
    /// Interface type, kept as source text.
    #[debug("{_0}")]
    Interface(SmolStr),
    #[debug("chan({dir:?}) {elem:?}")]
    Chan { dir: ChanDir, elem: TyRef },
    /// Function type, kept as source text.
    #[debug("{_0}")]
    Func(SmolStr),
    #[debug("TypeParam({_0})")]
    TypeParam(SmolStr),
    #[debug("Opaque({_0:?})")]
    Opaque(TypeName),
}

impl Ty {
    /// Follow named types down to the first unnamed shape.
    pub fn underlying(&self) -> &Ty {
        match self {
            Ty::Named(named) => named.underlying.underlying(),
            ty => ty,
        }
    }

    pub fn as_struct(&self) -> Option<&StructTy> {
        match self.underlying() {
            Ty::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> Option<&TypeName> {
        match self {
            Ty::Named(named) => Some(&named.name),
            Ty::Opaque(name) => Some(name),
            _ => None,
        }
    }

    /// Whether the zero value of this type is spelled `nil`.
    pub fn is_nilable(&self) -> bool {
        match self.underlying() {
            Ty::Pointer(_)
            | Ty::Slice(_)
            | Ty::Map { .. }
            | Ty::Chan { .. }
            | Ty::Func(_)
            | Ty::Interface(_) => true,
            Ty::Primitive(p) => *p == PrimitiveTy::UnsafePointer,
            _ => false,
        }
    }

    pub fn display<'a>(&'a self, qualifier: &'a dyn Qualifier) -> TyDisplay<'a> {
        TyDisplay::new(self, qualifier)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[debug("{name:?}{args:?}")]
pub struct NamedTy {
    pub name: TypeName,
    pub args: Vec<TyRef>,
    pub underlying: TyRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[debug("struct{fields:?}")]
pub struct StructTy {
    pub fields: Vec<Field>,
}

impl StructTy {
    pub fn new(fields: impl IntoIterator<Item = Field>) -> Self {
        let mut fields: Vec<Field> = fields.into_iter().collect();
        for (ordinal, field) in fields.iter_mut().enumerate() {
            field.ordinal = ordinal;
        }
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[debug("{name}: {ty:?}")]
pub struct Field {
    pub name: SmolStr,
    pub ty: TyRef,
    pub exported: bool,
    pub embedded: bool,
    pub ordinal: usize,
    /// Raw tag literal, quotes included.
    pub tag: Option<SmolStr>,
}

impl Field {
    pub fn new(name: impl Into<SmolStr>, ty: impl Into<TyRef>) -> Self {
        let name = name.into();
        Self {
            exported: is_exported(&name),
            name,
            ty: ty.into(),
            embedded: false,
            ordinal: 0,
            tag: None,
        }
    }

    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }

    pub fn with_tag(mut self, tag: Option<SmolStr>) -> Self {
        self.tag = tag;
        self
    }
}

/// Go's export rule: the name starts with an upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[debug("{_0:?}")]
pub struct TyRef(Arc<Ty>);

impl From<Ty> for TyRef {
    fn from(value: Ty) -> Self {
        TyRef(Arc::new(value))
    }
}

impl From<PrimitiveTy> for TyRef {
    fn from(value: PrimitiveTy) -> Self {
        Ty::Primitive(value).into()
    }
}

impl Deref for TyRef {
    type Target = Ty;

    fn deref(&self) -> &Ty {
        &self.0
    }
}

/// The predeclared `error` interface.
pub fn error_ty() -> Ty {
    Ty::Named(NamedTy {
        name: TypeName::universe("error"),
        args: Vec::new(),
        underlying: Ty::Interface("interface{ Error() string }".into()).into(),
    })
}
