//! Slicing algebra: per-dimension specifications to contiguous regions.
//!
//! A slice takes one [`SliceSpec`] per dimension of its source:
//!
//! - [`full()`]: the whole axis; kept in the result.
//! - [`range(start, end)`](range): the **closed** interval `start..=end`; kept in
//!   the result, even when it selects a single element.
//! - [`idx(i)`](idx) or a bare integer: one position; the axis is dropped.
//!
//! Negative `start`/`end`/index values count from the end of the axis
//! (`-1` is the last element).
//!
//! Views are plain borrowed slices, so only regions that occupy consecutive
//! buffer positions can be produced. Walking from the fastest-varying
//! dimension toward the slowest, the first spec that is not `full()` closes
//! the run; every slower dimension must then select exactly one element.
//! Axes of extent 1 are skipped, since any selection on them is the whole axis.

use std::ops::{RangeFull, RangeInclusive};

use crate::shape::{Layout, Shape};
use crate::{DenseError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SliceKind {
    Full,
    Range,
    Index,
}

/// Selection along one dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceSpec {
    start: isize,
    end: isize,
    kind: SliceKind,
}

impl SliceSpec {
    /// Inclusive start (negative counts from the end). Zero for `full()`.
    #[inline]
    pub fn start(&self) -> isize {
        self.start
    }

    /// Inclusive end (negative counts from the end). `-1` for `full()`.
    #[inline]
    pub fn end(&self) -> isize {
        self.end
    }

    /// Whether this selects the whole axis.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.kind == SliceKind::Full
    }

    /// Whether this is a bare index that drops its axis.
    #[inline]
    pub fn is_index(&self) -> bool {
        self.kind == SliceKind::Index
    }
}

/// Select the whole axis.
pub const fn full() -> SliceSpec {
    SliceSpec {
        start: 0,
        end: -1,
        kind: SliceKind::Full,
    }
}

/// Select the closed interval `start..=end`, keeping the axis.
pub const fn range(start: isize, end: isize) -> SliceSpec {
    SliceSpec {
        start,
        end,
        kind: SliceKind::Range,
    }
}

/// Select a single position, dropping the axis.
pub const fn idx(index: isize) -> SliceSpec {
    SliceSpec {
        start: index,
        end: index,
        kind: SliceKind::Index,
    }
}

impl From<isize> for SliceSpec {
    fn from(index: isize) -> Self {
        idx(index)
    }
}

impl From<i32> for SliceSpec {
    fn from(index: i32) -> Self {
        idx(index as isize)
    }
}

impl From<i64> for SliceSpec {
    fn from(index: i64) -> Self {
        idx(index as isize)
    }
}

impl From<usize> for SliceSpec {
    fn from(index: usize) -> Self {
        idx(index as isize)
    }
}

impl From<RangeFull> for SliceSpec {
    fn from(_: RangeFull) -> Self {
        full()
    }
}

impl From<RangeInclusive<isize>> for SliceSpec {
    fn from(r: RangeInclusive<isize>) -> Self {
        range(*r.start(), *r.end())
    }
}

impl From<RangeInclusive<i32>> for SliceSpec {
    fn from(r: RangeInclusive<i32>) -> Self {
        range(*r.start() as isize, *r.end() as isize)
    }
}

/// A validated contiguous region: where it starts in the source buffer and
/// the shape it is read with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Region<const M: usize> {
    pub(crate) offset: usize,
    pub(crate) shape: Shape<M>,
}

impl<const M: usize> Region<M> {
    /// Number of elements in the region.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.shape.len()
    }
}

/// Normalize a possibly negative position against `extent`.
#[inline]
fn normalize(pos: isize, extent: usize) -> isize {
    if pos < 0 {
        pos + extent as isize
    } else {
        pos
    }
}

/// Resolve `specs` against `shape` into a rank-`M` contiguous region.
///
/// # Errors
/// - [`DenseError::RankMismatch`] if the number of kept dimensions is not `M`
/// - [`DenseError::SliceOutOfRange`] if a normalized bound is outside `[0, extent)`
/// - [`DenseError::InvalidSlice`] if a normalized start is past its end
/// - [`DenseError::NonContiguousSlice`] if the region has gaps
pub(crate) fn resolve<const N: usize, const M: usize>(
    shape: &Shape<N>,
    specs: &[SliceSpec; N],
) -> Result<Region<M>> {
    let kept = specs.iter().filter(|s| !s.is_index()).count();
    if kept != M {
        return Err(DenseError::RankMismatch(kept, M));
    }

    // Closed bounds per dimension, after normalization and bounds checks.
    let mut starts = [0usize; N];
    let mut ends = [0usize; N];
    for (dim, spec) in specs.iter().enumerate() {
        let extent = shape.extent(dim);
        if spec.is_full() {
            if extent == 0 {
                return Err(DenseError::SliceOutOfRange {
                    dim,
                    start: 0,
                    end: -1,
                    extent,
                });
            }
            ends[dim] = extent - 1;
            continue;
        }
        let start = normalize(spec.start, extent);
        let end = normalize(spec.end, extent);
        let in_range = |p: isize| p >= 0 && (p as usize) < extent;
        if !in_range(start) || !in_range(end) {
            return Err(DenseError::SliceOutOfRange {
                dim,
                start: spec.start,
                end: spec.end,
                extent,
            });
        }
        if start > end {
            return Err(DenseError::InvalidSlice { dim, start, end });
        }
        starts[dim] = start as usize;
        ends[dim] = end as usize;
    }

    // Contiguity: fastest-varying dimension first.
    let mut closed = false;
    for k in 0..N {
        let dim = match shape.layout() {
            Layout::RowMajor => N - 1 - k,
            Layout::ColMajor => k,
        };
        // Any selection on a unit axis covers the whole axis.
        if shape.extent(dim) == 1 {
            continue;
        }
        let count = ends[dim] - starts[dim] + 1;
        if closed && count > 1 {
            return Err(DenseError::NonContiguousSlice { dim });
        }
        if !specs[dim].is_full() {
            closed = true;
        }
    }

    let mut extents = [0usize; M];
    let mut out = 0;
    for dim in 0..N {
        if !specs[dim].is_index() {
            extents[out] = ends[dim] - starts[dim] + 1;
            out += 1;
        }
    }

    let offset = (0..N).map(|dim| starts[dim] * shape.stride(dim)).sum();

    Ok(Region {
        offset,
        shape: Shape::new(extents, shape.layout()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Shape<2> {
        Shape::row_major([3, 3])
    }

    #[test]
    fn test_index_drops_dimension() {
        let r: Region<1> = resolve(&square(), &[idx(1), full()]).unwrap();
        assert_eq!(r.offset, 3);
        assert_eq!(r.shape.extents(), &[3]);
    }

    #[test]
    fn test_closed_range_keeps_dimension() {
        let r: Region<1> = resolve(&square(), &[idx(1), range(1, -1)]).unwrap();
        assert_eq!(r.offset, 4);
        assert_eq!(r.shape.extents(), &[2]);
    }

    #[test]
    fn test_negative_index_counts_from_end() {
        let r: Region<1> = resolve(&square(), &[idx(-1), full()]).unwrap();
        assert_eq!(r.offset, 6);
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn test_single_element_range_keeps_rank() {
        let r: Region<2> = resolve(&square(), &[range(2, 2), range(0, 0)]).unwrap();
        assert_eq!(r.offset, 6);
        assert_eq!(r.shape.extents(), &[1, 1]);
    }

    #[test]
    fn test_all_indices_give_rank_zero() {
        let r: Region<0> = resolve(&square(), &[idx(2), idx(1)]).unwrap();
        assert_eq!(r.offset, 7);
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn test_two_ranges_are_non_contiguous() {
        let err = resolve::<2, 2>(&square(), &[range(0, 2), range(0, 2)]).unwrap_err();
        assert_eq!(err, DenseError::NonContiguousSlice { dim: 0 });
    }

    #[test]
    fn test_column_is_non_contiguous_in_row_major() {
        let err = resolve::<2, 1>(&square(), &[full(), idx(1)]).unwrap_err();
        assert_eq!(err, DenseError::NonContiguousSlice { dim: 0 });
    }

    #[test]
    fn test_column_is_contiguous_in_col_major() {
        let shape = Shape::col_major([3, 3]);
        let r: Region<1> = resolve(&shape, &[full(), idx(1)]).unwrap();
        assert_eq!(r.offset, 3);
        assert_eq!(r.shape.extents(), &[3]);
        assert_eq!(r.shape.layout(), Layout::ColMajor);
    }

    #[test]
    fn test_row_is_non_contiguous_in_col_major() {
        let shape = Shape::col_major([3, 3]);
        let err = resolve::<2, 1>(&shape, &[idx(1), full()]).unwrap_err();
        assert_eq!(err, DenseError::NonContiguousSlice { dim: 1 });
    }

    #[test]
    fn test_unit_axes_do_not_close_the_run() {
        for layout in [Layout::RowMajor, Layout::ColMajor] {
            let column = Shape::new([3, 1], layout);
            let r: Region<1> = resolve(&column, &[range(1, 2), idx(0)]).unwrap();
            assert_eq!(r.offset, 1);
            assert_eq!(r.shape.extents(), &[2]);
            let r: Region<1> = resolve(&column, &[full(), idx(0)]).unwrap();
            assert_eq!(r.offset, 0);
            assert_eq!(r.shape.extents(), &[3]);

            let row = Shape::new([1, 4], layout);
            let r: Region<1> = resolve(&row, &[idx(0), range(1, 2)]).unwrap();
            assert_eq!(r.offset, 1);
            assert_eq!(r.shape.extents(), &[2]);
            let r: Region<2> = resolve(&row, &[range(0, 0), range(-3, -1)]).unwrap();
            assert_eq!(r.offset, 1);
            assert_eq!(r.shape.extents(), &[1, 3]);
        }
        // A unit axis between two partial selections does not join them.
        let err = resolve::<3, 3>(&Shape::row_major([3, 1, 3]), &[range(0, 1), full(), range(0, 1)])
            .unwrap_err();
        assert_eq!(err, DenseError::NonContiguousSlice { dim: 0 });
    }

    #[test]
    fn test_leading_block_of_rows_is_contiguous() {
        let shape = Shape::row_major([4, 2, 3]);
        let r: Region<3> = resolve(&shape, &[range(1, 2), full(), full()]).unwrap();
        assert_eq!(r.offset, 6);
        assert_eq!(r.shape.extents(), &[2, 2, 3]);
        assert_eq!(r.shape.strides(), &[6, 3, 1]);
    }

    #[test]
    fn test_out_of_range() {
        let err = resolve::<2, 1>(&square(), &[idx(3), full()]).unwrap_err();
        assert_eq!(
            err,
            DenseError::SliceOutOfRange {
                dim: 0,
                start: 3,
                end: 3,
                extent: 3
            }
        );
        let err = resolve::<2, 1>(&square(), &[idx(-4), full()]).unwrap_err();
        assert!(matches!(err, DenseError::SliceOutOfRange { dim: 0, .. }));
    }

    #[test]
    fn test_start_after_end() {
        let err = resolve::<2, 1>(&square(), &[idx(0), range(2, 1)]).unwrap_err();
        assert_eq!(
            err,
            DenseError::InvalidSlice {
                dim: 1,
                start: 2,
                end: 1
            }
        );
    }

    #[test]
    fn test_rank_mismatch() {
        let err = resolve::<2, 2>(&square(), &[idx(0), full()]).unwrap_err();
        assert_eq!(err, DenseError::RankMismatch(1, 2));
    }

    #[test]
    fn test_conversions() {
        assert_eq!(SliceSpec::from(2), idx(2));
        assert_eq!(SliceSpec::from(2usize), idx(2));
        assert_eq!(SliceSpec::from(..), full());
        assert_eq!(SliceSpec::from(1..=-1), range(1, -1));
        assert!(full().is_full());
        assert!(idx(0).is_index());
        assert!(!range(0, 0).is_index());
    }
}
