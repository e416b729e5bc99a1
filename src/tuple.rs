//! # Tuple Types
//!
//! Named two- and three-element value types. They behave like Rust tuples
//! (ordering, hashing, conversion in both directions) but carry field names,
//! which keeps signatures such as `Vec<Pair<CfaNodeId, usize>>` readable.

use std::fmt::{self, Display};

use derive_more::{From, Into};
use itertools::{EitherOrBoth, Itertools};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pair<A, B> {
    pub first: A,
    pub second: B,
}

impl<A, B> Pair<A, B> {
    pub fn of(first: A, second: B) -> Self {
        Pair { first, second }
    }

    pub fn swap(self) -> Pair<B, A> {
        Pair::of(self.second, self.first)
    }

    pub fn map_first<C>(self, f: impl FnOnce(A) -> C) -> Pair<C, B> {
        Pair::of(f(self.first), self.second)
    }

    pub fn map_second<C>(self, f: impl FnOnce(B) -> C) -> Pair<A, C> {
        Pair::of(self.first, f(self.second))
    }

    /// Pairs up two sequences element-wise, stopping at the end of the shorter one.
    pub fn zip(
        firsts: impl IntoIterator<Item = A>,
        seconds: impl IntoIterator<Item = B>,
    ) -> impl Iterator<Item = Pair<A, B>> {
        firsts
            .into_iter()
            .zip(seconds)
            .map(|(first, second)| Pair { first, second })
    }
}

impl<A, B> Pair<Option<A>, Option<B>> {
    /// Pairs up two sequences element-wise up to the end of the longer one;
    /// the missing side is `None`.
    pub fn zip_with_padding(
        firsts: impl IntoIterator<Item = A>,
        seconds: impl IntoIterator<Item = B>,
    ) -> impl Iterator<Item = Self> {
        firsts
            .into_iter()
            .zip_longest(seconds)
            .map(|both| match both {
                EitherOrBoth::Both(a, b) => Pair::of(Some(a), Some(b)),
                EitherOrBoth::Left(a) => Pair::of(Some(a), None),
                EitherOrBoth::Right(b) => Pair::of(None, Some(b)),
            })
    }
}

impl<A: Display, B: Display> Display for Pair<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Triple<A, B, C> {
    pub first: A,
    pub second: B,
    pub third: C,
}

impl<A, B, C> Triple<A, B, C> {
    pub fn of(first: A, second: B, third: C) -> Self {
        Triple {
            first,
            second,
            third,
        }
    }

    pub fn into_pair_and_third(self) -> (Pair<A, B>, C) {
        (Pair::of(self.first, self.second), self.third)
    }
}

impl<A: Display, B: Display, C: Display> Display for Triple<A, B, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.first, self.second, self.third)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ordering_is_lexicographic() {
        let mut pairs = vec![Pair::of(2, "a"), Pair::of(1, "z"), Pair::of(1, "b")];
        pairs.sort();
        assert_eq!(
            pairs,
            vec![Pair::of(1, "b"), Pair::of(1, "z"), Pair::of(2, "a")]
        );
        assert!(Triple::of(0, 0, 1) < Triple::of(0, 1, 0));
    }

    #[test]
    fn tuple_conversions() {
        let p: Pair<u8, char> = (3, 'x').into();
        assert_eq!(p.first, 3);
        let (a, b): (u8, char) = p.swap().swap().into();
        assert_eq!((a, b), (3, 'x'));

        let t: Triple<i32, i32, &str> = (1, 2, "three").into();
        let (pair, third) = t.into_pair_and_third();
        assert_eq!(pair, Pair::of(1, 2));
        assert_eq!(third, "three");
    }

    #[test]
    fn display() {
        insta::assert_snapshot!(Pair::of(1, "two").to_string(), @"(1, two)");
        insta::assert_snapshot!(Triple::of('a', 2.5, -1).to_string(), @"(a, 2.5, -1)");
    }

    #[test]
    fn zip_stops_and_pads() {
        let short: Vec<_> = Pair::zip([1, 2, 3], ["a", "b"]).collect();
        assert_eq!(short, vec![Pair::of(1, "a"), Pair::of(2, "b")]);

        let padded: Vec<_> = Pair::zip_with_padding([1, 2, 3], ["a"]).collect();
        assert_eq!(
            padded,
            vec![
                Pair::of(Some(1), Some("a")),
                Pair::of(Some(2), None),
                Pair::of(Some(3), None)
            ]
        );
    }
}
