use super::Ty;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTy {
    Bool,
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Byte,
    Rune,
    Float32,
    Float64,
    Complex64,
    Complex128,
    UnsafePointer,
}

impl PrimitiveTy {
    pub const ALL: [PrimitiveTy; 20] = [
        PrimitiveTy::Bool,
        PrimitiveTy::String,
        PrimitiveTy::Int,
        PrimitiveTy::Int8,
        PrimitiveTy::Int16,
        PrimitiveTy::Int32,
        PrimitiveTy::Int64,
        PrimitiveTy::Uint,
        PrimitiveTy::Uint8,
        PrimitiveTy::Uint16,
        PrimitiveTy::Uint32,
        PrimitiveTy::Uint64,
        PrimitiveTy::Uintptr,
        PrimitiveTy::Byte,
        PrimitiveTy::Rune,
        PrimitiveTy::Float32,
        PrimitiveTy::Float64,
        PrimitiveTy::Complex64,
        PrimitiveTy::Complex128,
        PrimitiveTy::UnsafePointer,
    ];

    /// Predeclared identifier lookup. `unsafe.Pointer` is not an identifier
    /// and is matched by the resolver instead.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .filter(|p| *p != PrimitiveTy::UnsafePointer)
            .find(|p| p.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveTy::Bool => "bool",
            PrimitiveTy::String => "string",
            PrimitiveTy::Int => "int",
            PrimitiveTy::Int8 => "int8",
            PrimitiveTy::Int16 => "int16",
            PrimitiveTy::Int32 => "int32",
            PrimitiveTy::Int64 => "int64",
            PrimitiveTy::Uint => "uint",
            PrimitiveTy::Uint8 => "uint8",
            PrimitiveTy::Uint16 => "uint16",
            PrimitiveTy::Uint32 => "uint32",
            PrimitiveTy::Uint64 => "uint64",
            PrimitiveTy::Uintptr => "uintptr",
            PrimitiveTy::Byte => "byte",
            PrimitiveTy::Rune => "rune",
            PrimitiveTy::Float32 => "float32",
            PrimitiveTy::Float64 => "float64",
            PrimitiveTy::Complex64 => "complex64",
            PrimitiveTy::Complex128 => "complex128",
            PrimitiveTy::UnsafePointer => "unsafe.Pointer",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            PrimitiveTy::Int
                | PrimitiveTy::Int8
                | PrimitiveTy::Int16
                | PrimitiveTy::Int32
                | PrimitiveTy::Int64
                | PrimitiveTy::Uint
                | PrimitiveTy::Uint8
                | PrimitiveTy::Uint16
                | PrimitiveTy::Uint32
                | PrimitiveTy::Uint64
                | PrimitiveTy::Uintptr
                | PrimitiveTy::Byte
                | PrimitiveTy::Rune
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, PrimitiveTy::Float32 | PrimitiveTy::Float64)
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, PrimitiveTy::Complex64 | PrimitiveTy::Complex128)
    }
}

impl From<PrimitiveTy> for Ty {
    fn from(value: PrimitiveTy) -> Self {
        Ty::Primitive(value)
    }
}
