//! Integer overflow checks: `__builtin_add_overflow` and its relatives.
//!
//! The generic forms (`__builtin_mul_overflow`) take the result type from
//! their third argument; the typed forms (`__builtin_smull_overflow`) fix it
//! in the name. The `_p` forms only report and store nothing.

use std::fmt;

use crate::machine_model::{CType, IntegerKind, MachineModel, Signedness};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArithmeticOperator {
    Add,
    Sub,
    Mul,
}

impl ArithmeticOperator {
    const NAMES: [(&'static str, ArithmeticOperator); 3] = [
        ("add", ArithmeticOperator::Add),
        ("sub", ArithmeticOperator::Sub),
        ("mul", ArithmeticOperator::Mul),
    ];

    /// The exact result, `None` only if it leaves `i128`.
    pub fn checked_apply(self, lhs: i128, rhs: i128) -> Option<i128> {
        match self {
            ArithmeticOperator::Add => lhs.checked_add(rhs),
            ArithmeticOperator::Sub => lhs.checked_sub(rhs),
            ArithmeticOperator::Mul => lhs.checked_mul(rhs),
        }
    }
}

impl fmt::Display for ArithmeticOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ArithmeticOperator::Add => "+",
            ArithmeticOperator::Sub => "-",
            ArithmeticOperator::Mul => "*",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OverflowFunction {
    pub operator: ArithmeticOperator,
    /// Fixed operand type of the typed forms.
    pub operand_type: Option<CType>,
    pub side_effect_free: bool,
}

const SIGNEDNESS: [(&str, Signedness); 2] =
    [("s", Signedness::Signed), ("u", Signedness::Unsigned)];

const LENGTHS: [(&str, IntegerKind); 3] = [
    ("", IntegerKind::Int),
    ("l", IntegerKind::Long),
    ("ll", IntegerKind::LongLong),
];

fn typed(middle: &str) -> Option<(ArithmeticOperator, CType)> {
    let (signedness, rest) = SIGNEDNESS
        .iter()
        .find_map(|(p, s)| middle.strip_prefix(p).map(|rest| (*s, rest)))?;
    ArithmeticOperator::NAMES.iter().find_map(|(op_name, op)| {
        let length = rest.strip_prefix(op_name)?;
        let kind = super::lookup(length, &LENGTHS)?;
        Some((*op, CType::Integer(kind, signedness)))
    })
}

pub fn classify_overflow_function(name: &str) -> Option<OverflowFunction> {
    let rest = name.strip_prefix("__builtin_")?;

    if let Some(middle) = rest.strip_suffix("_overflow_p") {
        let operator = super::lookup(middle, &ArithmeticOperator::NAMES)?;
        return Some(OverflowFunction {
            operator,
            operand_type: None,
            side_effect_free: true,
        });
    }

    let middle = rest.strip_suffix("_overflow")?;
    if let Some(operator) = super::lookup(middle, &ArithmeticOperator::NAMES) {
        return Some(OverflowFunction {
            operator,
            operand_type: None,
            side_effect_free: false,
        });
    }
    let (operator, ty) = typed(middle)?;
    Some(OverflowFunction {
        operator,
        operand_type: Some(ty),
        side_effect_free: false,
    })
}

pub fn is_overflow_function(name: &str) -> bool {
    classify_overflow_function(name).is_some()
}

fn expect_overflow_function(name: &str) -> OverflowFunction {
    classify_overflow_function(name)
        .unwrap_or_else(|| panic!("{name} is not an overflow builtin"))
}

/// # Panics
/// If `name` is not an overflow builtin.
pub fn operator_of_overflow_function(name: &str) -> ArithmeticOperator {
    expect_overflow_function(name).operator
}

/// The operand type fixed by the name, `None` for the generic forms.
///
/// # Panics
/// If `name` is not an overflow builtin.
pub fn type_of_overflow_function(name: &str) -> Option<CType> {
    expect_overflow_function(name).operand_type
}

/// # Panics
/// If `name` is not an overflow builtin.
pub fn is_side_effect_free(name: &str) -> bool {
    expect_overflow_function(name).side_effect_free
}

/// Whether `lhs op rhs` leaves the range of `ty` on `model`.
///
/// # Panics
/// If `ty` is not an integer type.
pub fn overflows(
    operator: ArithmeticOperator,
    ty: &CType,
    lhs: i128,
    rhs: i128,
    model: MachineModel,
) -> bool {
    operator
        .checked_apply(lhs, rhs)
        .map_or(true, |exact| !model.fits(ty, exact))
}

/// Evaluates the typed builtin `name` on concrete operands. `None` if `name`
/// is unknown or one of the generic forms, whose type the name does not fix.
pub fn would_overflow(name: &str, lhs: i128, rhs: i128, model: MachineModel) -> Option<bool> {
    let function = classify_overflow_function(name)?;
    let ty = function.operand_type?;
    Some(overflows(function.operator, &ty, lhs, rhs, model))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn generic_forms() {
        assert_eq!(
            classify_overflow_function("__builtin_mul_overflow"),
            Some(OverflowFunction {
                operator: ArithmeticOperator::Mul,
                operand_type: None,
                side_effect_free: false,
            })
        );
        assert!(is_side_effect_free("__builtin_add_overflow_p"));
        assert_eq!(type_of_overflow_function("__builtin_sub_overflow_p"), None);
    }

    #[test]
    fn typed_forms() {
        assert_eq!(
            type_of_overflow_function("__builtin_saddll_overflow"),
            Some(CType::signed(IntegerKind::LongLong))
        );
        assert_eq!(
            type_of_overflow_function("__builtin_umul_overflow"),
            Some(CType::unsigned(IntegerKind::Int))
        );
        assert_eq!(
            operator_of_overflow_function("__builtin_usubl_overflow"),
            ArithmeticOperator::Sub
        );
        // typed forms have no predicate variant
        assert!(!is_overflow_function("__builtin_saddl_overflow_p"));
        assert!(!is_overflow_function("__builtin_saddlll_overflow"));
        assert!(!is_overflow_function("__builtin_xadd_overflow"));
    }

    #[test]
    fn concrete_overflow_depends_on_the_model() {
        let big = i32::MAX as i128;
        assert_eq!(
            would_overflow("__builtin_sadd_overflow", big, 1, MachineModel::Linux64),
            Some(true)
        );
        assert_eq!(
            would_overflow("__builtin_saddl_overflow", big, 1, MachineModel::Linux64),
            Some(false)
        );
        assert_eq!(
            would_overflow("__builtin_saddl_overflow", big, 1, MachineModel::Linux32),
            Some(true)
        );
        assert_eq!(
            would_overflow("__builtin_usub_overflow", 0, 1, MachineModel::Linux32),
            Some(true)
        );
        assert_eq!(
            would_overflow("__builtin_add_overflow", 0, 1, MachineModel::Linux32),
            None
        );
        assert!(overflows(
            ArithmeticOperator::Mul,
            &CType::signed(IntegerKind::Int128),
            i128::MAX,
            2,
            MachineModel::Linux64
        ));
    }

    #[test]
    #[should_panic(expected = "not an overflow builtin")]
    fn accessor_on_unknown_name_panics() {
        operator_of_overflow_function("__builtin_div_overflow");
    }
}
