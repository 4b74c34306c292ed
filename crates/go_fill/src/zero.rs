// ==============================================================================
// Zero-Value Synthesis
// ==============================================================================
//
// Maps a resolved type to the expression a Go programmer would write for its
// zero value. Pure and infallible: every type has some zero spelling, the
// worst case being an empty composite literal.

use std::cell::RefCell;
use std::collections::BTreeSet;

use go_ty::{ArrayLen, PrimitiveTy, Qualifier, Ty, TypeName};
use itertools::Itertools;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

/// Named struct types whose zero value is always `pkg.Type{}` and never
/// expanded, keyed by `import/path.Name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WellKnown(FxHashSet<String>);

impl WellKnown {
    pub const DEFAULTS: [&'static str; 9] = [
        "time.Time",
        "sync.Mutex",
        "sync.RWMutex",
        "sync.WaitGroup",
        "sync.Once",
        "strings.Builder",
        "bytes.Buffer",
        "math/big.Int",
        "math/big.Float",
    ];

    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        WellKnown(names.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, name: &TypeName) -> bool {
        self.0.contains(&name.qualified())
    }
}

impl Default for WellKnown {
    fn default() -> Self {
        WellKnown::new(Self::DEFAULTS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZeroExpr {
    /// A complete single-line expression.
    Text(String),
    /// A recursively filled struct literal, rendered one field per line.
    Composite {
        ty: String,
        fields: Vec<(SmolStr, ZeroExpr)>,
    },
}

impl ZeroExpr {
    pub fn text(text: impl Into<String>) -> Self {
        ZeroExpr::Text(text.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ZeroExpr::Text(text) => Some(text),
            ZeroExpr::Composite { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZeroValue {
    pub expr: ZeroExpr,
    /// Import paths of every foreign package the expression names.
    pub imports: BTreeSet<SmolStr>,
}

/// Wraps the file's qualifier and remembers which packages were named.
struct Recorder<'a> {
    inner: &'a dyn Qualifier,
    package_path: &'a str,
    used: RefCell<BTreeSet<SmolStr>>,
}

impl Qualifier for Recorder<'_> {
    fn qualify(&self, name: &TypeName) -> Option<SmolStr> {
        if !name.is_universe() && name.path != self.package_path {
            self.used.borrow_mut().insert(name.path.clone());
        }
        self.inner.qualify(name)
    }
}

pub struct Synthesizer<'a> {
    qualifier: &'a dyn Qualifier,
    package_path: &'a str,
    well_known: &'a WellKnown,
    recurse: bool,
    /// Arrays longer than this are spelled `[N]T{}`; unbounded when `None`.
    max_array_elems: Option<u64>,
}

impl<'a> Synthesizer<'a> {
    pub fn new(
        qualifier: &'a dyn Qualifier,
        package_path: &'a str,
        well_known: &'a WellKnown,
        recurse: bool,
    ) -> Self {
        Self {
            qualifier,
            package_path,
            well_known,
            recurse,
            max_array_elems: None,
        }
    }

    pub fn with_max_array_elems(mut self, max: Option<u64>) -> Self {
        self.max_array_elems = max;
        self
    }

    pub fn package_path(&self) -> &str {
        self.package_path
    }

    pub fn synthesize(&self, ty: &Ty) -> ZeroValue {
        let recorder = Recorder {
            inner: self.qualifier,
            package_path: self.package_path,
            used: RefCell::new(BTreeSet::new()),
        };
        let mut visiting = Vec::new();
        let expr = self.zero(ty, &recorder, &mut visiting, self.recurse);
        ZeroValue {
            expr,
            imports: recorder.used.into_inner(),
        }
    }

    fn zero(
        &self,
        ty: &Ty,
        q: &Recorder<'_>,
        visiting: &mut Vec<TypeName>,
        recurse: bool,
    ) -> ZeroExpr {
        match ty {
            Ty::Primitive(p) => ZeroExpr::text(primitive_zero(*p)),
            Ty::Named(named) => {
                let spelled = ty.display(q).to_string();
                if self.well_known.contains(&named.name) {
                    return ZeroExpr::Text(format!("{spelled}{{}}"));
                }
                match named.underlying.underlying() {
                    Ty::Struct(s) if recurse && !visiting.contains(&named.name) => {
                        visiting.push(named.name.clone());
                        let same_package = named.name.path == self.package_path;
                        let fields = s
                            .fields
                            .iter()
                            .filter(|f| f.exported || same_package)
                            .map(|f| (f.name.clone(), self.zero(&f.ty, q, visiting, recurse)))
                            .collect_vec();
                        visiting.pop();
                        if fields.is_empty() {
                            ZeroExpr::Text(format!("{spelled}{{}}"))
                        } else {
                            ZeroExpr::Composite {
                                ty: spelled,
                                fields,
                            }
                        }
                    }
                    Ty::Struct(_) => ZeroExpr::Text(format!("{spelled}{{}}")),
                    Ty::Array { len, elem } => self.array(spelled, len, elem, q, visiting),
                    underlying => self.zero(underlying, q, visiting, recurse),
                }
            }
            Ty::Pointer(_)
            | Ty::Slice(_)
            | Ty::Map { .. }
            | Ty::Chan { .. }
            | Ty::Func(_)
            | Ty::Interface(_) => ZeroExpr::text("nil"),
            Ty::Array { len, elem } => {
                let spelled = ty.display(q).to_string();
                self.array(spelled, len, elem, q, visiting)
            }
            Ty::Struct(_) | Ty::Opaque(_) => {
                ZeroExpr::Text(format!("{}{{}}", ty.display(q)))
            }
            Ty::TypeParam(name) => ZeroExpr::Text(format!("*new({name})")),
        }
    }

    fn array(
        &self,
        spelled: String,
        len: &ArrayLen,
        elem: &Ty,
        q: &Recorder<'_>,
        visiting: &mut Vec<TypeName>,
    ) -> ZeroExpr {
        let listed = |n: u64| n > 0 && self.max_array_elems.map_or(true, |max| n <= max);
        match len {
            ArrayLen::Known(n) if listed(*n) => {
                // Elements stay on one line, so they are never expanded.
                let elem = match self.zero(elem, q, visiting, false) {
                    ZeroExpr::Text(text) => text,
                    ZeroExpr::Composite { ty, .. } => format!("{ty}{{}}"),
                };
                let elems = itertools::repeat_n(elem.as_str(), *n as usize).join(", ");
                ZeroExpr::Text(format!("{spelled}{{{elems}}}"))
            }
            _ => ZeroExpr::Text(format!("{spelled}{{}}")),
        }
    }
}

pub fn primitive_zero(p: PrimitiveTy) -> &'static str {
    match p {
        PrimitiveTy::Bool => "false",
        PrimitiveTy::String => "\"\"",
        PrimitiveTy::UnsafePointer => "nil",
        p if p.is_float() => "0.0",
        p if p.is_complex() => "(0 + 0i)",
        _ => "0",
    }
}
