//! # Analysis Context
//!
//! Process-wide services that used to live in global singletons: the unique id
//! counter used for CFA node numbers and the seeded random number generator.
//!
//! An [`AnalysisContext`] is built once by the composition root (the binary,
//! or a test) and handed to whatever needs it by reference. Nothing in this
//! crate keeps a hidden static copy, so "re-initialising" simply means building
//! a fresh context.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex, PoisonError,
};

use rand::{rngs::SmallRng, seq::SliceRandom, Rng, SeedableRng};

/// Thread-safe, monotonically increasing id source starting at zero.
#[derive(Debug, Default)]
pub struct UniqueIdGenerator {
    next: AtomicUsize,
}

impl UniqueIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> usize {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// The id the next call to [`next_id`](Self::next_id) will hand out.
    pub fn peek(&self) -> usize {
        self.next.load(Ordering::Relaxed)
    }
}

/// Deterministic random source. Two providers built from the same seed
/// produce the same sequence.
#[derive(Debug)]
pub struct RandomProvider {
    seed: u64,
    rng: Mutex<SmallRng>,
}

impl RandomProvider {
    pub fn from_seed(seed: u64) -> Self {
        RandomProvider {
            seed,
            rng: Mutex::new(SmallRng::seed_from_u64(seed)),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform value in `0..n`.
    ///
    /// # Panics
    /// If `n == 0`.
    pub fn next_below(&self, n: usize) -> usize {
        assert!(n > 0, "cannot draw from an empty range");
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0..n)
    }

    pub fn shuffle<T>(&self, items: &mut [T]) {
        items.shuffle(&mut *self.rng.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

#[derive(Debug)]
pub struct AnalysisContext {
    pub ids: UniqueIdGenerator,
    pub random: RandomProvider,
}

impl AnalysisContext {
    pub fn new(seed: u64) -> Self {
        AnalysisContext {
            ids: UniqueIdGenerator::new(),
            random: RandomProvider::from_seed(seed),
        }
    }
}

#[cfg(test)]
mod test {
    use std::{sync::Arc, thread};

    use ahash::AHashSet;

    use super::*;

    #[test]
    fn ids_are_unique_across_threads() {
        let ids = Arc::new(UniqueIdGenerator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = Arc::clone(&ids);
                thread::spawn(move || (0..250).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = AHashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(seen.insert(id), "id {id} handed out twice");
            }
        }
        assert_eq!(seen.len(), 1000);
        assert_eq!(ids.peek(), 1000);
    }

    #[test]
    fn same_seed_same_sequence() {
        let a = RandomProvider::from_seed(42);
        let b = RandomProvider::from_seed(42);
        let xs: Vec<_> = (0..20).map(|_| a.next_below(1000)).collect();
        let ys: Vec<_> = (0..20).map(|_| b.next_below(1000)).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().all(|x| *x < 1000));

        let mut v1: Vec<u32> = (0..50).collect();
        let mut v2 = v1.clone();
        a.shuffle(&mut v1);
        b.shuffle(&mut v2);
        assert_eq!(v1, v2);
    }

    #[test]
    fn fresh_context_restarts_ids() {
        let ctx = AnalysisContext::new(0);
        ctx.ids.next_id();
        ctx.ids.next_id();
        assert_eq!(ctx.ids.peek(), 2);
        assert_eq!(AnalysisContext::new(0).ids.peek(), 0);
    }
}
