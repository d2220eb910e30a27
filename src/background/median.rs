//! Per-pixel temporal median over a stack of frames.

use crate::frames::Frame;

/// Median of `values`, narrowed to `u8`.
///
/// For an even count the two middle values are averaged and the
/// fractional half is truncated, so `[10, 11]` yields `10`.
/// The slice is reordered in place. Returns `None` when empty.
pub fn median_u8(values: &mut [u8]) -> Option<u8> {
    let n = values.len();
    if n == 0 {
        return None;
    }

    let mid = n / 2;
    let (lower, upper, _) = values.select_nth_unstable(mid);
    let upper = *upper;

    if n % 2 == 1 {
        return Some(upper);
    }

    let lower = lower.iter().copied().max().unwrap_or(upper);
    Some(((lower as u16 + upper as u16) / 2) as u8)
}

/// Computes the element-wise median across equally shaped frames.
///
/// Callers guarantee a non-empty stack of frames with identical shapes.
pub(super) fn median_stack(frames: &[Frame]) -> Vec<u8> {
    let Some(first) = frames.first() else {
        return Vec::new();
    };

    let mut column = Vec::with_capacity(frames.len());
    (0..first.pixels().len())
        .map(|i| {
            column.clear();
            column.extend(frames.iter().map(|f| f.pixels()[i]));
            median_u8(&mut column).unwrap_or_default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_odd_count() {
        assert_eq!(median_u8(&mut [9, 1, 5]), Some(5));
    }

    #[test]
    fn test_even_count_truncates() {
        assert_eq!(median_u8(&mut [11, 10]), Some(10));
        assert_eq!(median_u8(&mut [0, 255, 255, 0]), Some(127));
    }

    #[test]
    fn test_empty() {
        assert_eq!(median_u8(&mut []), None);
    }

    #[test]
    fn test_minority_outlier_ignored() {
        // A bright object covering one of five samples does not leak
        // into the median.
        let frames: Vec<Frame> = [100u8, 100, 250, 100, 100]
            .iter()
            .enumerate()
            .map(|(i, &v)| Frame::gray(vec![v; 4], 2, 2, i))
            .collect();

        assert_eq!(median_stack(&frames), vec![100; 4]);
    }

    proptest! {
        #[test]
        fn prop_median_within_range(mut values in prop::collection::vec(any::<u8>(), 1..64)) {
            let min = *values.iter().min().unwrap();
            let max = *values.iter().max().unwrap();
            let median = median_u8(&mut values).unwrap();
            prop_assert!(min <= median && median <= max);
        }

        #[test]
        fn prop_median_matches_sorted(mut values in prop::collection::vec(any::<u8>(), 1..64)) {
            let mut sorted = values.clone();
            sorted.sort_unstable();
            let n = sorted.len();
            let expected = if n % 2 == 1 {
                sorted[n / 2]
            } else {
                ((sorted[n / 2 - 1] as u16 + sorted[n / 2] as u16) / 2) as u8
            };
            prop_assert_eq!(median_u8(&mut values), Some(expected));
        }
    }
}
