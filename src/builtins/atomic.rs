//! GCC's `__atomic_*` builtins and the legacy `__sync_*` family.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AtomicBinaryOperator {
    Add,
    Sub,
    And,
    Or,
    Xor,
    Nand,
}

impl AtomicBinaryOperator {
    const ALL: [(&'static str, AtomicBinaryOperator); 6] = [
        ("add", AtomicBinaryOperator::Add),
        ("sub", AtomicBinaryOperator::Sub),
        ("and", AtomicBinaryOperator::And),
        ("or", AtomicBinaryOperator::Or),
        ("xor", AtomicBinaryOperator::Xor),
        ("nand", AtomicBinaryOperator::Nand),
    ];

    fn from_name(name: &str) -> Option<Self> {
        super::lookup(name, &Self::ALL)
    }

    /// Applies the operator the way the builtin does on two's complement
    /// values of any width.
    pub fn apply(self, lhs: i128, rhs: i128) -> i128 {
        match self {
            AtomicBinaryOperator::Add => lhs.wrapping_add(rhs),
            AtomicBinaryOperator::Sub => lhs.wrapping_sub(rhs),
            AtomicBinaryOperator::And => lhs & rhs,
            AtomicBinaryOperator::Or => lhs | rhs,
            AtomicBinaryOperator::Xor => lhs ^ rhs,
            AtomicBinaryOperator::Nand => !(lhs & rhs),
        }
    }
}

impl fmt::Display for AtomicBinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AtomicBinaryOperator::Add => "+",
            AtomicBinaryOperator::Sub => "-",
            AtomicBinaryOperator::And => "&",
            AtomicBinaryOperator::Or => "|",
            AtomicBinaryOperator::Xor => "^",
            AtomicBinaryOperator::Nand => "~&",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AtomicOperation {
    Load,
    Store,
    Exchange,
    CompareExchange,
    /// Returns the old value.
    FetchOp(AtomicBinaryOperator),
    /// Returns the new value.
    OpFetch(AtomicBinaryOperator),
    TestAndSet,
    Clear,
    ThreadFence,
    SignalFence,
    LockFree,
    Synchronize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AtomicFunction {
    pub operation: AtomicOperation,
    /// The by-reference form (`__atomic_load` as opposed to `__atomic_load_n`).
    pub generic: bool,
    /// Number of trailing memory-order arguments.
    pub memory_orders: usize,
}

const fn entry(operation: AtomicOperation, generic: bool, memory_orders: usize) -> AtomicFunction {
    AtomicFunction {
        operation,
        generic,
        memory_orders,
    }
}

/// Names with a fixed meaning. The read-modify-write forms are decomposed
/// in [`classify_atomic_function`].
const FIXED: &[(&str, AtomicFunction)] = &[
    ("__atomic_load_n", entry(AtomicOperation::Load, false, 1)),
    ("__atomic_load", entry(AtomicOperation::Load, true, 1)),
    ("__atomic_store_n", entry(AtomicOperation::Store, false, 1)),
    ("__atomic_store", entry(AtomicOperation::Store, true, 1)),
    ("__atomic_exchange_n", entry(AtomicOperation::Exchange, false, 1)),
    ("__atomic_exchange", entry(AtomicOperation::Exchange, true, 1)),
    (
        "__atomic_compare_exchange_n",
        entry(AtomicOperation::CompareExchange, false, 2),
    ),
    (
        "__atomic_compare_exchange",
        entry(AtomicOperation::CompareExchange, true, 2),
    ),
    ("__atomic_test_and_set", entry(AtomicOperation::TestAndSet, false, 1)),
    ("__atomic_clear", entry(AtomicOperation::Clear, false, 1)),
    ("__atomic_thread_fence", entry(AtomicOperation::ThreadFence, false, 1)),
    ("__atomic_signal_fence", entry(AtomicOperation::SignalFence, false, 1)),
    ("__atomic_always_lock_free", entry(AtomicOperation::LockFree, false, 0)),
    ("__atomic_is_lock_free", entry(AtomicOperation::LockFree, false, 0)),
    (
        "__sync_bool_compare_and_swap",
        entry(AtomicOperation::CompareExchange, false, 0),
    ),
    (
        "__sync_val_compare_and_swap",
        entry(AtomicOperation::CompareExchange, false, 0),
    ),
    ("__sync_synchronize", entry(AtomicOperation::Synchronize, false, 0)),
    ("__sync_lock_test_and_set", entry(AtomicOperation::TestAndSet, false, 0)),
    ("__sync_lock_release", entry(AtomicOperation::Clear, false, 0)),
];

fn read_modify_write(name: &str) -> Option<AtomicFunction> {
    let (operation, memory_orders) = if let Some(rest) = name.strip_prefix("__atomic_") {
        let op = match rest.strip_prefix("fetch_") {
            Some(op) => AtomicOperation::FetchOp(AtomicBinaryOperator::from_name(op)?),
            None => AtomicOperation::OpFetch(AtomicBinaryOperator::from_name(
                rest.strip_suffix("_fetch")?,
            )?),
        };
        (op, 1)
    } else {
        let rest = name.strip_prefix("__sync_")?;
        let op = match rest.strip_prefix("fetch_and_") {
            Some(op) => AtomicOperation::FetchOp(AtomicBinaryOperator::from_name(op)?),
            None => AtomicOperation::OpFetch(AtomicBinaryOperator::from_name(
                rest.strip_suffix("_and_fetch")?,
            )?),
        };
        (op, 0)
    };
    Some(entry(operation, false, memory_orders))
}

pub fn classify_atomic_function(name: &str) -> Option<AtomicFunction> {
    super::lookup(name, FIXED).or_else(|| read_modify_write(name))
}

pub fn is_atomic_function(name: &str) -> bool {
    classify_atomic_function(name).is_some()
}

/// The operator of a read-modify-write builtin.
///
/// # Panics
/// If `name` is not an atomic fetch-op or op-fetch builtin.
pub fn operator_of_atomic_function(name: &str) -> AtomicBinaryOperator {
    match classify_atomic_function(name).map(|f| f.operation) {
        Some(AtomicOperation::FetchOp(op) | AtomicOperation::OpFetch(op)) => op,
        _ => panic!("{name} is not an atomic read-modify-write builtin"),
    }
}

/// Whether the builtin returns the value stored before the operation.
pub fn returns_previous_value(name: &str) -> bool {
    classify_atomic_function(name).is_some_and(|f| {
        matches!(
            f.operation,
            AtomicOperation::FetchOp(_) | AtomicOperation::Exchange | AtomicOperation::TestAndSet
        )
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fetch_op_and_op_fetch() {
        assert_eq!(
            classify_atomic_function("__atomic_fetch_nand"),
            Some(entry(AtomicOperation::FetchOp(AtomicBinaryOperator::Nand), false, 1))
        );
        assert_eq!(
            operator_of_atomic_function("__atomic_xor_fetch"),
            AtomicBinaryOperator::Xor
        );
        assert_eq!(
            operator_of_atomic_function("__sync_fetch_and_sub"),
            AtomicBinaryOperator::Sub
        );
        assert_eq!(
            classify_atomic_function("__sync_or_and_fetch").map(|f| f.memory_orders),
            Some(0)
        );
        assert!(returns_previous_value("__sync_fetch_and_add"));
        assert!(!returns_previous_value("__sync_add_and_fetch"));
    }

    #[test]
    fn generic_and_sized_forms() {
        let by_ref = classify_atomic_function("__atomic_compare_exchange").unwrap();
        let sized = classify_atomic_function("__atomic_compare_exchange_n").unwrap();
        assert!(by_ref.generic && !sized.generic);
        assert_eq!(sized.memory_orders, 2);
    }

    #[test]
    fn near_misses() {
        for name in [
            "__atomic_fetch_mul",
            "__atomic_fetch_",
            "__atomic_add",
            "__sync_fetch_and_",
            "atomic_fetch_add",
            "__atomic_load_n2",
        ] {
            assert!(!is_atomic_function(name), "{name}");
        }
    }

    #[test]
    fn nand_is_bitwise() {
        assert_eq!(AtomicBinaryOperator::Nand.apply(0b1100, 0b1010), !0b1000);
    }

    #[test]
    #[should_panic(expected = "not an atomic read-modify-write builtin")]
    fn operator_of_a_load_panics() {
        operator_of_atomic_function("__atomic_load_n");
    }
}
