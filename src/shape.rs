//! Shape and stride bookkeeping.
//!
//! A [`Shape`] is the pure value describing how a flat buffer is read as an
//! N-dimensional array: the extents, the memory [`Layout`], and the strides
//! derived from both. Strides are never stored independently of the extents;
//! [`compute_strides`] is the only place they come from.

use crate::{DenseError, Result};

/// Memory order of a dense array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Last dimension varies fastest (C order).
    #[default]
    RowMajor,
    /// First dimension varies fastest (Fortran order).
    ColMajor,
}

/// Compute element strides for `extents` under `layout`.
///
/// Row-major: the last dimension has stride 1 and each earlier dimension's
/// stride is the product of all later extents. Column-major is the mirror image.
pub fn compute_strides<const N: usize>(extents: &[usize; N], layout: Layout) -> [usize; N] {
    let mut strides = [1usize; N];
    match layout {
        Layout::RowMajor => {
            for i in (0..N.saturating_sub(1)).rev() {
                strides[i] = strides[i + 1].saturating_mul(extents[i + 1]);
            }
        }
        Layout::ColMajor => {
            for i in 1..N {
                strides[i] = strides[i - 1].saturating_mul(extents[i - 1]);
            }
        }
    }
    strides
}

/// Extents, strides and layout of a rank-`N` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape<const N: usize> {
    extents: [usize; N],
    strides: [usize; N],
    layout: Layout,
}

impl<const N: usize> Shape<N> {
    /// Create a shape, deriving strides from `extents` and `layout`.
    pub fn new(extents: [usize; N], layout: Layout) -> Self {
        Self {
            strides: compute_strides(&extents, layout),
            extents,
            layout,
        }
    }

    /// Row-major shape.
    pub fn row_major(extents: [usize; N]) -> Self {
        Self::new(extents, Layout::RowMajor)
    }

    /// Column-major shape.
    pub fn col_major(extents: [usize; N]) -> Self {
        Self::new(extents, Layout::ColMajor)
    }

    #[inline]
    pub fn extents(&self) -> &[usize; N] {
        &self.extents
    }

    #[inline]
    pub fn extent(&self, dim: usize) -> usize {
        self.extents[dim]
    }

    #[inline]
    pub fn strides(&self) -> &[usize; N] {
        &self.strides
    }

    #[inline]
    pub fn stride(&self, dim: usize) -> usize {
        self.strides[dim]
    }

    #[inline]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    #[inline]
    pub fn rank(&self) -> usize {
        N
    }

    /// Total number of elements (1 for rank 0).
    #[inline]
    pub fn len(&self) -> usize {
        self.extents.iter().product()
    }

    /// Total number of elements, or `None` on overflow.
    pub fn checked_len(&self) -> Option<usize> {
        self.extents
            .iter()
            .try_fold(1usize, |acc, &e| acc.checked_mul(e))
    }

    /// Whether any extent is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.extents.contains(&0)
    }

    /// Flat offset `Σ indices[i] * strides[i]`. No bounds checking.
    #[inline]
    pub fn linear_offset(&self, indices: &[usize; N]) -> usize {
        let mut offset = 0usize;
        for i in 0..N {
            offset += indices[i] * self.strides[i];
        }
        offset
    }

    /// Flat offset after checking every index against its extent.
    pub fn checked_offset(&self, indices: &[usize; N]) -> Result<usize> {
        for (dim, (&index, &extent)) in indices.iter().zip(self.extents.iter()).enumerate() {
            if index >= extent {
                return Err(DenseError::IndexOutOfRange { dim, index, extent });
            }
        }
        Ok(self.linear_offset(indices))
    }

    /// Multi-index of flat position `offset`; inverse of [`linear_offset`](Self::linear_offset).
    pub fn unravel(&self, offset: usize) -> [usize; N] {
        let mut index = [0usize; N];
        for i in 0..N {
            if self.extents[i] > 0 && self.strides[i] > 0 {
                index[i] = (offset / self.strides[i]) % self.extents[i];
            }
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_row_major_strides() {
        assert_eq!(compute_strides(&[2, 3, 4], Layout::RowMajor), [12, 4, 1]);
        assert_eq!(compute_strides(&[5], Layout::RowMajor), [1]);
        assert_eq!(compute_strides::<0>(&[], Layout::RowMajor), [0usize; 0]);
    }

    #[test]
    fn test_col_major_strides() {
        assert_eq!(compute_strides(&[2, 3, 4], Layout::ColMajor), [1, 2, 6]);
    }

    #[test]
    fn test_linear_offset() {
        let s = Shape::row_major([2, 3]);
        assert_eq!(s.linear_offset(&[1, 2]), 5);
        let s = Shape::col_major([2, 3]);
        assert_eq!(s.linear_offset(&[1, 2]), 5);
        assert_eq!(s.linear_offset(&[1, 0]), 1);
    }

    #[test]
    fn test_checked_offset_reports_first_bad_dim() {
        let s = Shape::row_major([2, 3]);
        assert_eq!(s.checked_offset(&[1, 1]), Ok(4));
        assert_eq!(
            s.checked_offset(&[1, 3]),
            Err(DenseError::IndexOutOfRange {
                dim: 1,
                index: 3,
                extent: 3
            })
        );
    }

    #[test]
    fn test_offset_corners_random_shapes() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let extents: [usize; 4] = std::array::from_fn(|_| rng.gen_range(1..6));
            for layout in [Layout::RowMajor, Layout::ColMajor] {
                let s = Shape::new(extents, layout);
                assert_eq!(s.linear_offset(&[0; 4]), 0);
                let last = extents.map(|e| e - 1);
                assert_eq!(s.linear_offset(&last), s.len() - 1);
            }
        }
    }

    #[test]
    fn test_unravel_inverts_linear_offset() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let extents: [usize; 3] = std::array::from_fn(|_| rng.gen_range(1..5));
            for layout in [Layout::RowMajor, Layout::ColMajor] {
                let s = Shape::new(extents, layout);
                for offset in 0..s.len() {
                    assert_eq!(s.linear_offset(&s.unravel(offset)), offset);
                }
            }
        }
    }

    #[test]
    fn test_len_and_checked_len() {
        assert_eq!(Shape::row_major([3, 4]).len(), 12);
        assert_eq!(Shape::<0>::row_major([]).len(), 1);
        assert_eq!(Shape::row_major([usize::MAX, 2]).checked_len(), None);
        assert!(Shape::row_major([3, 0]).is_empty());
    }
}
