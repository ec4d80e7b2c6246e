//! Contiguous partitioning of the credential list
//!
//! Chunk size is `ceil(len / width)`, so every partition except possibly the
//! last is full and none is empty. With fewer credentials than units the
//! result simply has fewer partitions.

use std::ops::Range;

/// Split `0..len` into contiguous, non-overlapping ranges for `width` units.
///
/// A `width` of 0 is treated as 1.
pub fn partition_ranges(len: usize, width: usize) -> Vec<Range<usize>> {
    if len == 0 {
        return Vec::new();
    }
    let chunk = len.div_ceil(width.max(1));
    (0..len)
        .step_by(chunk)
        .map(|start| start..(start + chunk).min(len))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_split() {
        assert_eq!(partition_ranges(10, 5), vec![0..2, 2..4, 4..6, 6..8, 8..10]);
    }

    #[test]
    fn uneven_split_puts_remainder_last() {
        assert_eq!(partition_ranges(10, 4), vec![0..3, 3..6, 6..9, 9..10]);
    }

    #[test]
    fn more_units_than_credentials() {
        assert_eq!(partition_ranges(3, 10), vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn empty_list_has_no_partitions() {
        assert!(partition_ranges(0, 4).is_empty());
    }

    #[test]
    fn zero_width_is_single_partition() {
        assert_eq!(partition_ranges(7, 0), vec![0..7]);
    }

    #[test]
    fn partitions_cover_list_exactly_for_all_shapes() {
        for len in 0..60usize {
            for width in 1..16usize {
                let ranges = partition_ranges(len, width);
                let limit = len.div_ceil(width);

                let mut next = 0;
                for range in &ranges {
                    assert_eq!(range.start, next, "gap or overlap at len={len} width={width}");
                    assert!(!range.is_empty(), "empty partition at len={len} width={width}");
                    assert!(range.len() <= limit, "oversized partition at len={len} width={width}");
                    next = range.end;
                }
                assert_eq!(next, len, "partitions must cover len={len} width={width}");
                assert!(ranges.len() <= width);
                if width <= len {
                    assert!(!ranges.is_empty());
                }
            }
        }
    }
}
