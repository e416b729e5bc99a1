//! libm, allocation and termination functions of the C standard library
//! (plus the Linux kernel allocators).

use crate::machine_model::FloatKind;

use super::{lookup, split_precision_suffix};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MathFunctionKind {
    Sqrt,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Exp,
    Exp2,
    Log,
    Log10,
    Log2,
    Pow,
    Cbrt,
    Hypot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MathFunction {
    pub kind: MathFunctionKind,
    pub precision: FloatKind,
}

const MATH: &[(&str, MathFunctionKind)] = &[
    ("sqrt", MathFunctionKind::Sqrt),
    ("__builtin_sqrt", MathFunctionKind::Sqrt),
    ("sin", MathFunctionKind::Sin),
    ("__builtin_sin", MathFunctionKind::Sin),
    ("cos", MathFunctionKind::Cos),
    ("__builtin_cos", MathFunctionKind::Cos),
    ("tan", MathFunctionKind::Tan),
    ("__builtin_tan", MathFunctionKind::Tan),
    ("asin", MathFunctionKind::Asin),
    ("__builtin_asin", MathFunctionKind::Asin),
    ("acos", MathFunctionKind::Acos),
    ("__builtin_acos", MathFunctionKind::Acos),
    ("atan", MathFunctionKind::Atan),
    ("__builtin_atan", MathFunctionKind::Atan),
    ("atan2", MathFunctionKind::Atan2),
    ("__builtin_atan2", MathFunctionKind::Atan2),
    ("exp", MathFunctionKind::Exp),
    ("__builtin_exp", MathFunctionKind::Exp),
    ("exp2", MathFunctionKind::Exp2),
    ("__builtin_exp2", MathFunctionKind::Exp2),
    ("log", MathFunctionKind::Log),
    ("__builtin_log", MathFunctionKind::Log),
    ("log10", MathFunctionKind::Log10),
    ("__builtin_log10", MathFunctionKind::Log10),
    ("log2", MathFunctionKind::Log2),
    ("__builtin_log2", MathFunctionKind::Log2),
    ("pow", MathFunctionKind::Pow),
    ("__builtin_pow", MathFunctionKind::Pow),
    ("cbrt", MathFunctionKind::Cbrt),
    ("__builtin_cbrt", MathFunctionKind::Cbrt),
    ("hypot", MathFunctionKind::Hypot),
    ("__builtin_hypot", MathFunctionKind::Hypot),
];

pub fn classify_math_function(name: &str) -> Option<MathFunction> {
    split_precision_suffix(name, MATH).map(|(kind, precision)| MathFunction { kind, precision })
}

pub fn is_math_function(name: &str) -> bool {
    classify_math_function(name).is_some()
}

/// # Panics
/// If `name` is not a libm function.
pub fn type_of_math_function(name: &str) -> FloatKind {
    classify_math_function(name)
        .unwrap_or_else(|| panic!("{name} is not a math function"))
        .precision
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AllocationFunction {
    Malloc,
    Calloc,
    Realloc,
    /// Allocates on the caller's stack frame.
    Alloca,
    Kmalloc,
    Kzalloc,
}

const ALLOCATION: &[(&str, AllocationFunction)] = &[
    ("malloc", AllocationFunction::Malloc),
    ("calloc", AllocationFunction::Calloc),
    ("realloc", AllocationFunction::Realloc),
    ("alloca", AllocationFunction::Alloca),
    ("__builtin_alloca", AllocationFunction::Alloca),
    ("kmalloc", AllocationFunction::Kmalloc),
    ("__kmalloc", AllocationFunction::Kmalloc),
    ("kzalloc", AllocationFunction::Kzalloc),
];

impl AllocationFunction {
    pub fn is_stack_allocation(self) -> bool {
        self == AllocationFunction::Alloca
    }

    pub fn zero_initialises(self) -> bool {
        matches!(self, AllocationFunction::Calloc | AllocationFunction::Kzalloc)
    }

    /// Arguments whose product is the allocated size.
    pub fn size_arguments(self) -> &'static [usize] {
        match self {
            AllocationFunction::Calloc => &[0, 1],
            AllocationFunction::Realloc => &[1],
            _ => &[0],
        }
    }
}

pub fn classify_allocation_function(name: &str) -> Option<AllocationFunction> {
    lookup(name, ALLOCATION)
}

pub fn is_memory_allocation(name: &str) -> bool {
    classify_allocation_function(name).is_some()
}

pub fn is_memory_free(name: &str) -> bool {
    name == "free"
}

const TERMINATORS: &[&str] = &["abort", "exit", "_Exit", "__assert_fail", "__VERIFIER_error"];

/// Calls that never return.
pub fn is_program_terminator(name: &str) -> bool {
    TERMINATORS.contains(&name)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn math_suffixes() {
        assert_eq!(type_of_math_function("log10l"), FloatKind::LongDouble);
        assert_eq!(type_of_math_function("logl"), FloatKind::LongDouble);
        assert_eq!(type_of_math_function("__builtin_exp2f"), FloatKind::Float);
        assert_eq!(
            classify_math_function("atan2").map(|f| f.kind),
            Some(MathFunctionKind::Atan2)
        );
        assert!(!is_math_function("sqrtq"));
        assert!(!is_math_function("log1p"));
    }

    #[test]
    fn allocators() {
        assert_eq!(
            classify_allocation_function("__kmalloc"),
            Some(AllocationFunction::Kmalloc)
        );
        assert!(AllocationFunction::Calloc.zero_initialises());
        assert!(classify_allocation_function("__builtin_alloca")
            .is_some_and(|a| a.is_stack_allocation()));
        assert_eq!(AllocationFunction::Realloc.size_arguments(), [1]);
        assert!(!is_memory_allocation("xmalloc"));
        assert!(is_memory_free("free"));
    }

    #[test]
    fn terminators() {
        assert!(is_program_terminator("__VERIFIER_error"));
        assert!(!is_program_terminator("atexit"));
    }
}
