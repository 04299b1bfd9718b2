use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

use super::tolerance_ranges::EPSILON_WIDTH;

/// Finds the index range of elements in a slice sorted by a floating point key
/// whose keys fall within the (inclusive) range.
///
/// Same contract as a binary search over integer keys, but for keys that only
/// implement `PartialOrd` (m/z, intensities, times).
///
/// ```
/// use dimsquery::utils::{TupleRange, partition_range_by_key};
///
/// let mzs = [100.0, 100.5, 101.0, 101.5, 102.0];
/// let range = TupleRange::try_new(100.4, 101.5).unwrap();
/// let found = partition_range_by_key(&mzs, range, |x| *x);
/// assert_eq!(found, 1..4);
/// ```
pub fn partition_range_by_key<T, F>(
    slice: &[T],
    key_range: TupleRange<f64>,
    key_fn: F,
) -> std::ops::Range<usize>
where
    F: Fn(&T) -> f64,
{
    let start_idx = slice.partition_point(|x| key_fn(x) < key_range.start());
    let end_idx =
        start_idx + slice[start_idx..].partition_point(|x| key_fn(x) <= key_range.end());

    start_idx..end_idx
}

/// TupleRange represents a range defined by a tuple of two elements (T, T).
///
/// It represents a range as closed-closed [a, b], meaning both endpoints are inclusive.
/// It ensures that the first element is always less than or equal to the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TupleRange<T: Copy + PartialOrd>(T, T);

#[derive(Error, Debug)]
pub enum TupleRangeError<T: Copy + PartialOrd + std::fmt::Debug> {
    #[error(
        "Expected the first element to be less than or equal to the second, got ({0:?}, {1:?})"
    )]
    ExpectedOrderedRange(T, T),
}

impl<T: Copy + PartialOrd + std::fmt::Debug> TupleRange<T> {
    pub fn try_new(left: T, right: T) -> Result<Self, TupleRangeError<T>> {
        // NaN bounds fail the comparison and are rejected too.
        if left <= right {
            Ok(Self(left, right))
        } else {
            Err(TupleRangeError::ExpectedOrderedRange(left, right))
        }
    }

    pub fn as_tuple(&self) -> (T, T) {
        (self.0, self.1)
    }

    pub fn contains(&self, x: T) -> bool {
        self.0 <= x && x <= self.1
    }

    pub fn start(&self) -> T {
        self.0
    }

    pub fn end(&self) -> T {
        self.1
    }
}

impl TupleRange<f64> {
    /// Builds a range from possibly swapped or degenerate bounds.
    ///
    /// Bounds are re-ordered, and a zero-width window is widened by a small
    /// epsilon so downstream scale math never divides by zero.
    pub fn new_widening(left: f64, right: f64) -> Self {
        let (lo, hi) = if left <= right {
            (left, right)
        } else {
            (right, left)
        };
        if hi - lo <= 0.0 {
            Self(lo - EPSILON_WIDTH, hi + EPSILON_WIDTH)
        } else {
            Self(lo, hi)
        }
    }

    pub fn width(&self) -> f64 {
        (self.1 - self.0).max(EPSILON_WIDTH)
    }
}

impl<T> TryFrom<(T, T)> for TupleRange<T>
where
    T: Copy + PartialOrd + std::fmt::Debug,
{
    type Error = TupleRangeError<T>;

    fn try_from(value: (T, T)) -> Result<Self, Self::Error> {
        TupleRange::try_new(value.0, value.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_search_repeats() {
        let input = vec![1.0, 2.0, 3.0, 3.0, 3.0, 4.0, 5.0, 7.0, 7.0, 8.0];
        let range = TupleRange::try_new(3.0, 7.0).unwrap();
        let result = partition_range_by_key(&input, range, |x| *x);
        assert_eq!(result, 2..9);
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        assert!(TupleRange::try_new(2.0, 1.0).is_err());
        assert!(TupleRange::try_new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_widening_handles_swapped_and_degenerate() {
        let r = TupleRange::new_widening(5.0, 1.0);
        assert_eq!(r.as_tuple(), (1.0, 5.0));
        let r = TupleRange::new_widening(3.0, 3.0);
        assert!(r.width() > 0.0);
        assert!(r.contains(3.0));
    }
}
