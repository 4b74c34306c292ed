use std::fmt;

use smol_str::SmolStr;

use crate::{ArrayLen, ChanDir, PrimitiveTy, Ty, TypeName};

/// Decides how a type from another package is spelled in the file being
/// edited. `None` means unqualified (same package, universe, dot import).
pub trait Qualifier {
    fn qualify(&self, name: &TypeName) -> Option<SmolStr>;
}

impl<F> Qualifier for F
where
    F: Fn(&TypeName) -> Option<SmolStr>,
{
    fn qualify(&self, name: &TypeName) -> Option<SmolStr> {
        self(name)
    }
}

/// Go syntax for a `Ty`, as it would be written in the target file.
pub struct TyDisplay<'a> {
    ty: &'a Ty,
    qualifier: &'a dyn Qualifier,
}

impl<'a> TyDisplay<'a> {
    pub fn new(ty: &'a Ty, qualifier: &'a dyn Qualifier) -> Self {
        Self { ty, qualifier }
    }

    fn nested(&self, ty: &'a Ty) -> Self {
        Self::new(ty, self.qualifier)
    }

    fn write_name(&self, f: &mut fmt::Formatter<'_>, name: &TypeName) -> fmt::Result {
        match self.qualifier.qualify(name) {
            Some(prefix) => write!(f, "{prefix}.{}", name.name),
            None => f.write_str(&name.name),
        }
    }
}

impl fmt::Display for TyDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty {
            Ty::Primitive(PrimitiveTy::UnsafePointer) => {
                self.write_name(f, &TypeName::new("unsafe", "unsafe", "Pointer"))
            }
            Ty::Primitive(p) => f.write_str(p.name()),
            Ty::Named(named) => {
                self.write_name(f, &named.name)?;
                if !named.args.is_empty() {
                    f.write_str("[")?;
                    for (i, arg) in named.args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", self.nested(arg))?;
                    }
                    f.write_str("]")?;
                }
                Ok(())
            }
            Ty::Opaque(name) => self.write_name(f, name),
            Ty::Pointer(elem) => write!(f, "*{}", self.nested(elem)),
            Ty::Slice(elem) => write!(f, "[]{}", self.nested(elem)),
            Ty::Array { len, elem } => {
                match len {
                    ArrayLen::Known(n) => write!(f, "[{n}]")?,
                    ArrayLen::Symbolic(expr) => write!(f, "[{expr}]")?,
                }
                write!(f, "{}", self.nested(elem))
            }
            Ty::Map { key, value } => {
                write!(f, "map[{}]{}", self.nested(key), self.nested(value))
            }
            Ty::Chan { dir, elem } => match dir {
                ChanDir::Both => write!(f, "chan {}", self.nested(elem)),
                ChanDir::Send => write!(f, "chan<- {}", self.nested(elem)),
                ChanDir::Recv => write!(f, "<-chan {}", self.nested(elem)),
            },
            Ty::Struct(s) if s.fields.is_empty() => f.write_str("struct{}"),
            Ty::Struct(s) => {
                f.write_str("struct{ ")?;
                for (i, field) in s.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    if field.embedded {
                        write!(f, "{}", self.nested(&field.ty))?;
                    } else {
                        write!(f, "{} {}", field.name, self.nested(&field.ty))?;
                    }
                    if let Some(tag) = &field.tag {
                        write!(f, " {tag}")?;
                    }
                }
                f.write_str(" }")
            }
            Ty::Interface(text) | Ty::Func(text) | Ty::TypeParam(text) => f.write_str(text),
        }
    }
}
