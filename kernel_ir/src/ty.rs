use std::fmt;

/// The type tag of a value, as far as the promotion pass cares about it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Scalar,
    Pointer,
    /// A struct, identified by its name.
    Struct(String),
}

impl TypeTag {
    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeTag::Pointer)
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, TypeTag::Struct(_))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Scalar => f.write_str("scalar"),
            TypeTag::Pointer => f.write_str("ptr"),
            TypeTag::Struct(name) => write!(f, "struct {name}"),
        }
    }
}

/// Element type of an image buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarTy {
    U8,
    I32,
    F32,
    F64,
}

impl ScalarTy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "u8" => Some(ScalarTy::U8),
            "i32" => Some(ScalarTy::I32),
            "f32" => Some(ScalarTy::F32),
            "f64" => Some(ScalarTy::F64),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarTy::U8 => "u8",
            ScalarTy::I32 => "i32",
            ScalarTy::F32 => "f32",
            ScalarTy::F64 => "f64",
        }
    }

    /// The spelling of this type in generated C-like kernel code.
    pub fn c_name(self) -> &'static str {
        match self {
            ScalarTy::U8 => "unsigned char",
            ScalarTy::I32 => "int",
            ScalarTy::F32 => "float",
            ScalarTy::F64 => "double",
        }
    }
}

impl fmt::Display for ScalarTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
