//! Compact textual form for sets of integers: `1,3-5,7`.

use std::{collections::BTreeSet, num::ParseIntError};

use itertools::Itertools;
use thiserror::Error;

/// Sorts and deduplicates `values` and collapses consecutive runs into
/// `start-end`. `{7, 5, 1, 3, 4, 5, 7}` becomes `"1,3-5,7"`.
pub fn format_ranges(values: impl IntoIterator<Item = i64>) -> String {
    values
        .into_iter()
        .sorted_unstable()
        .dedup()
        .map(|v| (v, v))
        .coalesce(|(start, end), (next, _)| {
            if end.checked_add(1) == Some(next) {
                Ok((start, next))
            } else {
                Err(((start, end), (next, next)))
            }
        })
        .map(|(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{start}-{end}")
            }
        })
        .join(",")
}

/// Largest number of values a single `start-end` item may expand to.
pub const MAX_RANGE_LEN: u64 = 1 << 20;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeParseError {
    #[error("invalid number {token:?}")]
    InvalidNumber {
        token: String,
        #[source]
        source: ParseIntError,
    },
    #[error("range {start}-{end} is reversed")]
    Reversed { start: i64, end: i64 },
    #[error("range {start}-{end} has more than {MAX_RANGE_LEN} values")]
    TooLarge { start: i64, end: i64 },
}

fn parse_number(token: &str) -> Result<i64, RangeParseError> {
    let token = token.trim();
    token
        .parse()
        .map_err(|source| RangeParseError::InvalidNumber {
            token: token.to_string(),
            source,
        })
}

/// Inverse of [`format_ranges`]. Whitespace around items is ignored and
/// negative bounds are allowed (`-3--1`). Each range is expanded into the
/// set, so a range spanning more than [`MAX_RANGE_LEN`] values is rejected.
pub fn parse_ranges(input: &str) -> Result<BTreeSet<i64>, RangeParseError> {
    let mut values = BTreeSet::new();
    for item in input.split(',').map(str::trim).filter(|i| !i.is_empty()) {
        // the separator is the first '-' that is not a leading sign
        let split = item
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '-')
            .map(|(i, _)| i);

        match split {
            None => {
                values.insert(parse_number(item)?);
            }
            Some(at) => {
                let start = parse_number(&item[..at])?;
                let end = parse_number(&item[at + 1..])?;
                if start > end {
                    return Err(RangeParseError::Reversed { start, end });
                }
                if end.abs_diff(start) >= MAX_RANGE_LEN {
                    return Err(RangeParseError::TooLarge { start, end });
                }
                values.extend(start..=end);
            }
        }
    }
    Ok(values)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn collapses_runs() {
        insta::assert_snapshot!(format_ranges([7, 5, 1, 3, 4, 5, 7]), @"1,3-5,7");
        insta::assert_snapshot!(format_ranges([-2, -1, 0, 9]), @"-2-0,9");
        assert_eq!(format_ranges([]), "");
        assert_eq!(
            format_ranges([i64::MAX, i64::MAX - 1]),
            format!("{}-{}", i64::MAX - 1, i64::MAX)
        );
    }

    #[test]
    fn parses_what_it_formats() {
        let set = parse_ranges("1, 3-5,7").unwrap();
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), [1, 3, 4, 5, 7]);
        assert_eq!(format_ranges(set), "1,3-5,7");

        let negative = parse_ranges("-3--1").unwrap();
        assert_eq!(negative.into_iter().collect::<Vec<_>>(), [-3, -2, -1]);
        assert!(parse_ranges("").unwrap().is_empty());
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            parse_ranges("5-2"),
            Err(RangeParseError::Reversed { start: 5, end: 2 })
        );
        let err = parse_ranges("1,x").unwrap_err();
        insta::assert_snapshot!(err.to_string(), @r#"invalid number "x""#);
    }

    #[test]
    fn huge_ranges_are_rejected() {
        assert_eq!(
            parse_ranges("0-9223372036854775807"),
            Err(RangeParseError::TooLarge {
                start: 0,
                end: i64::MAX
            })
        );
        assert!(matches!(
            parse_ranges(&format!("{}-{}", i64::MIN, i64::MAX)),
            Err(RangeParseError::TooLarge { .. })
        ));

        let last = MAX_RANGE_LEN as i64 - 1;
        assert_eq!(parse_ranges(&format!("0-{last}")).map(|s| s.len()), Ok(MAX_RANGE_LEN as usize));
        assert!(parse_ranges(&format!("0-{}", last + 1)).is_err());
    }
}
