//! Target machine description: sizes, alignments and integer ranges of the C
//! basic types.

use std::{fmt, str::FromStr};

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Signedness {
    Signed,
    Unsigned,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IntegerKind {
    Char,
    Short,
    Int,
    Long,
    LongLong,
    Int128,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FloatKind {
    Float,
    Double,
    LongDouble,
}

/// The C types whose layout depends on the machine.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CType {
    Void,
    Bool,
    /// Plain `char`. Whether it is signed is up to the machine.
    Char,
    Integer(IntegerKind, Signedness),
    Float(FloatKind),
    Pointer(Box<CType>),
}

impl CType {
    pub fn signed(kind: IntegerKind) -> Self {
        CType::Integer(kind, Signedness::Signed)
    }

    pub fn unsigned(kind: IntegerKind) -> Self {
        CType::Integer(kind, Signedness::Unsigned)
    }

    pub fn int() -> Self {
        Self::signed(IntegerKind::Int)
    }

    pub fn pointer_to(self) -> Self {
        CType::Pointer(Box::new(self))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, CType::Bool | CType::Char | CType::Integer(..))
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, CType::Float(_))
    }

    /// `char`, `signed char` or `unsigned char`.
    pub fn is_character(&self) -> bool {
        matches!(self, CType::Char | CType::Integer(IntegerKind::Char, _))
    }
}

impl fmt::Display for IntegerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IntegerKind::Char => "char",
            IntegerKind::Short => "short",
            IntegerKind::Int => "int",
            IntegerKind::Long => "long",
            IntegerKind::LongLong => "long long",
            IntegerKind::Int128 => "__int128",
        })
    }
}

impl fmt::Display for FloatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FloatKind::Float => "float",
            FloatKind::Double => "double",
            FloatKind::LongDouble => "long double",
        })
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CType::Void => write!(f, "void"),
            CType::Bool => write!(f, "_Bool"),
            CType::Char => write!(f, "char"),
            CType::Integer(kind, Signedness::Signed) if *kind == IntegerKind::Char => {
                write!(f, "signed char")
            }
            CType::Integer(kind, Signedness::Signed) => write!(f, "{kind}"),
            CType::Integer(kind, Signedness::Unsigned) => write!(f, "unsigned {kind}"),
            CType::Float(kind) => write!(f, "{kind}"),
            CType::Pointer(target) => write!(f, "{target} *"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MachineModel {
    Linux32,
    Linux64,
    Arm,
    Arm64,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown machine model {0:?}, expected one of LINUX32, LINUX64, ARM, ARM64")]
pub struct UnknownMachineModel(pub String);

/// Per-model numbers that differ between the supported targets.
struct Layout {
    sizeof_long: usize,
    sizeof_long_double: usize,
    sizeof_pointer: usize,
    alignof_long_long: usize,
    alignof_double: usize,
    alignof_long_double: usize,
    char_is_signed: bool,
}

const LINUX32: Layout = Layout {
    sizeof_long: 4,
    sizeof_long_double: 12,
    sizeof_pointer: 4,
    alignof_long_long: 4,
    alignof_double: 4,
    alignof_long_double: 4,
    char_is_signed: true,
};

const LINUX64: Layout = Layout {
    sizeof_long: 8,
    sizeof_long_double: 16,
    sizeof_pointer: 8,
    alignof_long_long: 8,
    alignof_double: 8,
    alignof_long_double: 16,
    char_is_signed: true,
};

const ARM: Layout = Layout {
    sizeof_long: 4,
    sizeof_long_double: 8,
    sizeof_pointer: 4,
    alignof_long_long: 8,
    alignof_double: 8,
    alignof_long_double: 8,
    char_is_signed: false,
};

const ARM64: Layout = Layout {
    sizeof_long: 8,
    sizeof_long_double: 16,
    sizeof_pointer: 8,
    alignof_long_long: 8,
    alignof_double: 8,
    alignof_long_double: 16,
    char_is_signed: false,
};

impl MachineModel {
    pub const ALL: [MachineModel; 4] = [
        MachineModel::Linux32,
        MachineModel::Linux64,
        MachineModel::Arm,
        MachineModel::Arm64,
    ];

    const SIZEOF_CHAR_IN_BITS: usize = 8;

    fn layout(self) -> &'static Layout {
        match self {
            MachineModel::Linux32 => &LINUX32,
            MachineModel::Linux64 => &LINUX64,
            MachineModel::Arm => &ARM,
            MachineModel::Arm64 => &ARM64,
        }
    }

    /// Size in bytes. `void` has size one, as in GCC.
    pub fn sizeof(self, ty: &CType) -> usize {
        let layout = self.layout();
        match ty {
            CType::Void | CType::Bool | CType::Char => 1,
            CType::Integer(kind, _) => match kind {
                IntegerKind::Char => 1,
                IntegerKind::Short => 2,
                IntegerKind::Int => 4,
                IntegerKind::Long => layout.sizeof_long,
                IntegerKind::LongLong => 8,
                IntegerKind::Int128 => 16,
            },
            CType::Float(FloatKind::Float) => 4,
            CType::Float(FloatKind::Double) => 8,
            CType::Float(FloatKind::LongDouble) => layout.sizeof_long_double,
            CType::Pointer(_) => layout.sizeof_pointer,
        }
    }

    pub fn alignof(self, ty: &CType) -> usize {
        let layout = self.layout();
        match ty {
            CType::Integer(IntegerKind::LongLong, _) => layout.alignof_long_long,
            CType::Float(FloatKind::Double) => layout.alignof_double,
            CType::Float(FloatKind::LongDouble) => layout.alignof_long_double,
            _ => self.sizeof(ty),
        }
    }

    pub fn sizeof_in_bits(self, ty: &CType) -> usize {
        self.sizeof(ty) * Self::SIZEOF_CHAR_IN_BITS
    }

    pub fn pointer_size(self) -> usize {
        self.layout().sizeof_pointer
    }

    pub fn char_is_signed(self) -> bool {
        self.layout().char_is_signed
    }

    pub fn endianness(self) -> Endianness {
        Endianness::Little
    }

    /// Whether values of the integer type `ty` can be negative.
    pub fn is_signed(self, ty: &CType) -> bool {
        match ty {
            CType::Char => self.char_is_signed(),
            CType::Integer(_, signedness) => *signedness == Signedness::Signed,
            _ => false,
        }
    }

    /// # Panics
    /// If `ty` is not an integer type.
    pub fn minimal_integer_value(self, ty: &CType) -> i128 {
        assert!(ty.is_integer(), "{ty} is not an integer type");
        if self.is_signed(ty) {
            i128::MIN >> (128 - self.sizeof_in_bits(ty))
        } else {
            0
        }
    }

    /// Returned as `u128` so that `unsigned __int128` fits.
    ///
    /// # Panics
    /// If `ty` is not an integer type.
    pub fn maximal_integer_value(self, ty: &CType) -> u128 {
        assert!(ty.is_integer(), "{ty} is not an integer type");
        if *ty == CType::Bool {
            return 1;
        }
        let bits = self.sizeof_in_bits(ty) as u32;
        let value_bits = if self.is_signed(ty) { bits - 1 } else { bits };
        u128::MAX >> (128 - value_bits)
    }

    /// Whether `value` is representable in the integer type `ty`.
    pub fn fits(self, ty: &CType, value: i128) -> bool {
        value >= self.minimal_integer_value(ty)
            && (value < 0 || value as u128 <= self.maximal_integer_value(ty))
    }
}

impl fmt::Display for MachineModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MachineModel::Linux32 => "LINUX32",
            MachineModel::Linux64 => "LINUX64",
            MachineModel::Arm => "ARM",
            MachineModel::Arm64 => "ARM64",
        })
    }
}

impl FromStr for MachineModel {
    type Err = UnknownMachineModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MachineModel::ALL
            .into_iter()
            .find(|m| m.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownMachineModel(s.to_string()))
    }
}
