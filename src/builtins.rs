//! # Builtin Function Recognisers
//!
//! Static tables that map the spelling of a called function to what it is:
//! a floating-point helper, an atomic, an overflow check, a `scanf` variant, a
//! libm function, an allocator or a program terminator.
//!
//! All lookups are exact. A name matches either verbatim or as a known stem
//! followed by a precision suffix (`""` for `double`, `f` for `float`, `l` for
//! `long double`). A user function that merely shares a prefix with a builtin
//! is never classified as one.
//!
//! Queries of the form `is_*`/`classify_*` return `bool`/`Option`. Accessors
//! such as [`float::type_of_builtin_float_function`] are only meaningful after
//! a positive check and panic on an unrecognised name.

use std::fmt;

use thiserror::Error;

use crate::machine_model::FloatKind;

pub mod atomic;
pub mod float;
pub mod io;
pub mod overflow;
pub mod stdlib;

/// Rejection of a piece of C code.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CodeError {
    /// Not valid C.
    #[error("unrecognized C code: {0}")]
    Unrecognized(String),
    /// Valid C this crate does not handle.
    #[error("unsupported C code: {0}")]
    Unsupported(String),
}

const PRECISION_SUFFIXES: [(&str, FloatKind); 3] = [
    ("", FloatKind::Double),
    ("f", FloatKind::Float),
    ("l", FloatKind::LongDouble),
];

/// Splits `name` into a stem of `table` and a precision suffix.
///
/// The empty suffix is tried first, so a stem that itself ends in `f` or `l`
/// is never misread as a shorter stem plus suffix.
pub(crate) fn split_precision_suffix<K: Copy>(
    name: &str,
    table: &[(&str, K)],
) -> Option<(K, FloatKind)> {
    PRECISION_SUFFIXES.iter().find_map(|(suffix, precision)| {
        let stem = name.strip_suffix(suffix)?;
        lookup(stem, table).map(|kind| (kind, *precision))
    })
}

pub(crate) fn lookup<K: Copy>(name: &str, table: &[(&str, K)]) -> Option<K> {
    table.iter().find(|(n, _)| *n == name).map(|(_, k)| *k)
}

/// What a recognised builtin is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuiltinFunction {
    Float(float::FloatFunction),
    Atomic(atomic::AtomicFunction),
    Overflow(overflow::OverflowFunction),
    Scanf(io::ScanfFunction),
    Math(stdlib::MathFunction),
    Allocation(stdlib::AllocationFunction),
    Free,
    Terminator,
}

/// Looks `name` up in every table.
pub fn classify(name: &str) -> Option<BuiltinFunction> {
    float::classify_float_function(name)
        .map(BuiltinFunction::Float)
        .or_else(|| atomic::classify_atomic_function(name).map(BuiltinFunction::Atomic))
        .or_else(|| overflow::classify_overflow_function(name).map(BuiltinFunction::Overflow))
        .or_else(|| io::classify_scanf_function(name).map(BuiltinFunction::Scanf))
        .or_else(|| stdlib::classify_math_function(name).map(BuiltinFunction::Math))
        .or_else(|| stdlib::classify_allocation_function(name).map(BuiltinFunction::Allocation))
        .or_else(|| stdlib::is_memory_free(name).then_some(BuiltinFunction::Free))
        .or_else(|| stdlib::is_program_terminator(name).then_some(BuiltinFunction::Terminator))
}

impl BuiltinFunction {
    /// Whether a call can be dropped when its result is unused.
    pub fn is_side_effect_free(&self) -> bool {
        match self {
            BuiltinFunction::Float(_) | BuiltinFunction::Math(_) => true,
            BuiltinFunction::Overflow(f) => f.side_effect_free,
            BuiltinFunction::Atomic(_)
            | BuiltinFunction::Scanf(_)
            | BuiltinFunction::Allocation(_)
            | BuiltinFunction::Free
            | BuiltinFunction::Terminator => false,
        }
    }
}

impl fmt::Display for BuiltinFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuiltinFunction::Float(func) => match func.precision {
                Some(p) => write!(f, "float function {:?} ({p})", func.kind),
                None => write!(f, "float function {:?} (type-generic)", func.kind),
            },
            BuiltinFunction::Atomic(func) => {
                write!(f, "atomic {:?}", func.operation)?;
                if func.generic {
                    write!(f, ", by reference")?;
                }
                write!(f, ", {} memory order argument(s)", func.memory_orders)
            }
            BuiltinFunction::Overflow(func) => {
                write!(f, "overflow check {}", func.operator)?;
                match &func.operand_type {
                    Some(ty) => write!(f, " on {ty}")?,
                    None => write!(f, " (type-generic)")?,
                }
                if func.side_effect_free {
                    write!(f, ", side-effect free")?;
                }
                Ok(())
            }
            BuiltinFunction::Scanf(func) => write!(
                f,
                "scanf variant reading from {:?}, format at argument {}{}",
                func.source,
                func.format_index,
                if func.va_list { ", va_list" } else { "" }
            ),
            BuiltinFunction::Math(func) => {
                write!(f, "math function {:?} ({})", func.kind, func.precision)
            }
            BuiltinFunction::Allocation(func) => write!(f, "allocation {func:?}"),
            BuiltinFunction::Free => write!(f, "deallocation"),
            BuiltinFunction::Terminator => write!(f, "program terminator"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dispatcher_reaches_every_table() {
        let cases = [
            "__builtin_nanf",
            "__atomic_fetch_add",
            "__builtin_uaddll_overflow",
            "__isoc99_sscanf",
            "sqrtl",
            "calloc",
            "free",
            "abort",
        ];
        let described: Vec<_> = cases
            .iter()
            .map(|n| format!("{n}: {}", classify(n).unwrap()))
            .collect();
        insta::assert_snapshot!(described.join("\n"), @r"
        __builtin_nanf: float function Nan (float)
        __atomic_fetch_add: atomic FetchOp(Add), 1 memory order argument(s)
        __builtin_uaddll_overflow: overflow check + on unsigned long long
        __isoc99_sscanf: scanf variant reading from String, format at argument 1
        sqrtl: math function Sqrt (long double)
        calloc: allocation Calloc
        free: deallocation
        abort: program terminator
        ");
    }

    #[test]
    fn look_alikes_stay_unclassified() {
        for name in ["my_malloc", "__builtin_nanq", "scanf2", "__atomic_fetch_mul", "sqrtx", ""] {
            assert_eq!(classify(name), None, "{name}");
        }
    }

    #[test]
    fn suffix_split_prefers_whole_stems() {
        let table = [("huge_val", 0), ("inf", 1)];
        assert_eq!(split_precision_suffix("huge_val", &table), Some((0, FloatKind::Double)));
        assert_eq!(
            split_precision_suffix("huge_vall", &table),
            Some((0, FloatKind::LongDouble))
        );
        assert_eq!(split_precision_suffix("inff", &table), Some((1, FloatKind::Float)));
        assert_eq!(split_precision_suffix("infq", &table), None);
    }
}
