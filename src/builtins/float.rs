//! Floating-point helpers from `<math.h>` and their GCC `__builtin_` forms.

use crate::machine_model::FloatKind;

use super::{lookup, split_precision_suffix};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FloatFunctionKind {
    Nan,
    Infinity,
    HugeVal,
    Absolute,
    Floor,
    Ceil,
    Round,
    Lround,
    Llround,
    Trunc,
    Fdim,
    Fmax,
    Fmin,
    Fmod,
    Modf,
    Remainder,
    CopySign,
    SignBit,
    FpClassify,
    IsNan,
    IsInfinity,
    IsInfinitySign,
    Finite,
    IsGreater,
    IsGreaterEqual,
    IsLess,
    IsLessEqual,
    IsLessGreater,
    IsUnordered,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FloatFunction {
    pub kind: FloatFunctionKind,
    /// `None` for the type-generic macros, whose precision follows the
    /// argument.
    pub precision: Option<FloatKind>,
}

use FloatFunctionKind::*;

/// Stems that take a precision suffix.
const SUFFIXED: &[(&str, FloatFunctionKind)] = &[
    ("nan", Nan),
    ("__builtin_nan", Nan),
    ("__builtin_inf", Infinity),
    ("__builtin_huge_val", HugeVal),
    ("fabs", Absolute),
    ("__builtin_fabs", Absolute),
    ("floor", Floor),
    ("__builtin_floor", Floor),
    ("ceil", Ceil),
    ("__builtin_ceil", Ceil),
    ("round", Round),
    ("__builtin_round", Round),
    ("lround", Lround),
    ("__builtin_lround", Lround),
    ("llround", Llround),
    ("__builtin_llround", Llround),
    ("trunc", Trunc),
    ("__builtin_trunc", Trunc),
    ("fdim", Fdim),
    ("__builtin_fdim", Fdim),
    ("fmax", Fmax),
    ("__builtin_fmax", Fmax),
    ("fmin", Fmin),
    ("__builtin_fmin", Fmin),
    ("fmod", Fmod),
    ("__builtin_fmod", Fmod),
    ("modf", Modf),
    ("__builtin_modf", Modf),
    ("remainder", Remainder),
    ("__builtin_remainder", Remainder),
    ("copysign", CopySign),
    ("__builtin_copysign", CopySign),
    ("signbit", SignBit),
    ("__signbit", SignBit),
    ("__builtin_signbit", SignBit),
    ("__fpclassify", FpClassify),
    ("isnan", IsNan),
    ("__isnan", IsNan),
    ("__builtin_isnan", IsNan),
    ("isinf", IsInfinity),
    ("__isinf", IsInfinity),
    ("__builtin_isinf", IsInfinity),
    ("finite", Finite),
    ("__finite", Finite),
    ("__builtin_finite", Finite),
];

/// Type-generic macros, spelled without suffix.
const GENERIC: &[(&str, FloatFunctionKind)] = &[
    ("__builtin_fpclassify", FpClassify),
    ("__builtin_isinf_sign", IsInfinitySign),
    ("isgreater", IsGreater),
    ("__builtin_isgreater", IsGreater),
    ("isgreaterequal", IsGreaterEqual),
    ("__builtin_isgreaterequal", IsGreaterEqual),
    ("isless", IsLess),
    ("__builtin_isless", IsLess),
    ("islessequal", IsLessEqual),
    ("__builtin_islessequal", IsLessEqual),
    ("islessgreater", IsLessGreater),
    ("__builtin_islessgreater", IsLessGreater),
    ("isunordered", IsUnordered),
    ("__builtin_isunordered", IsUnordered),
];

pub fn classify_float_function(name: &str) -> Option<FloatFunction> {
    if let Some(kind) = lookup(name, GENERIC) {
        return Some(FloatFunction {
            kind,
            precision: None,
        });
    }
    split_precision_suffix(name, SUFFIXED).map(|(kind, precision)| FloatFunction {
        kind,
        precision: Some(precision),
    })
}

pub fn is_builtin_float_function(name: &str) -> bool {
    classify_float_function(name).is_some()
}

/// The floating type the function operates on, `None` for type-generic
/// macros.
///
/// # Panics
/// If `name` is not a float function.
pub fn type_of_builtin_float_function(name: &str) -> Option<FloatKind> {
    match classify_float_function(name) {
        Some(f) => f.precision,
        None => panic!("{name} is not a builtin float function"),
    }
}

fn has_kind(name: &str, kinds: &[FloatFunctionKind]) -> bool {
    classify_float_function(name).is_some_and(|f| kinds.contains(&f.kind))
}

/// `nan("")` and friends.
pub fn is_nan(name: &str) -> bool {
    has_kind(name, &[Nan])
}

/// `__builtin_inf` and `__builtin_huge_val` in all precisions.
pub fn is_infinity(name: &str) -> bool {
    has_kind(name, &[Infinity, HugeVal])
}

pub fn is_absolute(name: &str) -> bool {
    has_kind(name, &[Absolute])
}

pub fn is_rounding(name: &str) -> bool {
    has_kind(name, &[Floor, Ceil, Round, Lround, Llround, Trunc])
}

pub fn is_fmod(name: &str) -> bool {
    has_kind(name, &[Fmod])
}

pub fn is_classification(name: &str) -> bool {
    has_kind(
        name,
        &[FpClassify, IsNan, IsInfinity, IsInfinitySign, Finite, SignBit],
    )
}

pub fn is_comparison(name: &str) -> bool {
    has_kind(
        name,
        &[
            IsGreater,
            IsGreaterEqual,
            IsLess,
            IsLessEqual,
            IsLessGreater,
            IsUnordered,
        ],
    )
}
