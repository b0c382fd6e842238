//! Borrowed contiguous views.
//!
//! - [`ArrayView`]: shared view, `Copy`, any number may coexist
//! - [`ArrayViewMut`]: exclusive view; writes are visible through the source array
//!
//! A view is a borrowed slice plus its own [`Shape`]. The slice covers exactly
//! the viewed elements, so every access is memory safe and the borrow checker
//! ties the view's lifetime to its source. Views are produced by slicing
//! (`view`, `view_mut`), which only accepts contiguous regions.

use crate::shape::Shape;
use crate::slice::{self, Region, SliceSpec};
use crate::{DenseError, Element, Result};

// ============================================================================
// Contiguous access traits
// ============================================================================

/// Read access to a contiguous region read through a rank-`N` shape.
///
/// Implemented by [`DenseArray`](crate::DenseArray), [`ArrayView`] and
/// [`ArrayViewMut`]. Reductions and math functions are written against it.
pub trait Contiguous<T: Element, const N: usize> {
    fn shape(&self) -> &Shape<N>;

    /// Elements in memory order. Length equals `shape().len()`.
    fn as_slice(&self) -> &[T];
}

/// Write access to a contiguous region.
pub trait ContiguousMut<T: Element, const N: usize>: Contiguous<T, N> {
    fn as_mut_slice(&mut self) -> &mut [T];
}

/// Check that `data` holds exactly the elements described by `shape`.
fn check_len<const N: usize>(len: usize, shape: &Shape<N>) -> Result<()> {
    match shape.checked_len() {
        Some(expected) if expected == len => Ok(()),
        _ => Err(DenseError::ShapeMismatch(
            vec![len],
            shape.extents().to_vec(),
        )),
    }
}

// ============================================================================
// ArrayView
// ============================================================================

/// Shared view of a contiguous region.
#[derive(Clone, Copy, PartialEq)]
pub struct ArrayView<'a, T: Element, const N: usize> {
    data: &'a [T],
    shape: Shape<N>,
}

impl<'a, T: Element, const N: usize> ArrayView<'a, T, N> {
    /// Read `data` through `shape`.
    ///
    /// # Errors
    /// [`DenseError::ShapeMismatch`] if `data.len()` differs from the shape's element count.
    pub fn new(data: &'a [T], shape: Shape<N>) -> Result<Self> {
        check_len(data.len(), &shape)?;
        Ok(Self { data, shape })
    }

    #[inline]
    pub(crate) fn from_parts(data: &'a [T], shape: Shape<N>) -> Self {
        Self { data, shape }
    }

    #[inline]
    pub(crate) fn from_region(data: &'a [T], region: Region<N>) -> Self {
        let end = region.offset + region.len();
        Self {
            data: &data[region.offset..end],
            shape: region.shape,
        }
    }

    /// Slice into a contiguous view of rank `M`.
    ///
    /// The result borrows from the same source as `self`, not from `self`, so
    /// sub-views can be returned from functions and chained on temporaries.
    pub fn view<const M: usize>(&self, specs: [SliceSpec; N]) -> Result<ArrayView<'a, T, M>> {
        let region = slice::resolve::<N, M>(&self.shape, &specs)?;
        Ok(ArrayView::from_region(self.data, region))
    }

    /// The underlying slice with the full source lifetime.
    #[inline]
    pub fn into_slice(self) -> &'a [T] {
        self.data
    }
}

impl<T: Element, const N: usize> Contiguous<T, N> for ArrayView<'_, T, N> {
    #[inline]
    fn shape(&self) -> &Shape<N> {
        &self.shape
    }

    #[inline]
    fn as_slice(&self) -> &[T] {
        self.data
    }
}

impl<T: Element, const N: usize> std::fmt::Debug for ArrayView<'_, T, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArrayView")
            .field("extents", self.shape.extents())
            .field("layout", &self.shape.layout())
            .field("data", &self.data)
            .finish()
    }
}

impl_read_access!(ArrayView<'a>);

// ============================================================================
// ArrayViewMut
// ============================================================================

/// Exclusive view of a contiguous region.
pub struct ArrayViewMut<'a, T: Element, const N: usize> {
    data: &'a mut [T],
    shape: Shape<N>,
}

impl<'a, T: Element, const N: usize> ArrayViewMut<'a, T, N> {
    /// Read and write `data` through `shape`.
    ///
    /// # Errors
    /// [`DenseError::ShapeMismatch`] if `data.len()` differs from the shape's element count.
    pub fn new(data: &'a mut [T], shape: Shape<N>) -> Result<Self> {
        check_len(data.len(), &shape)?;
        Ok(Self { data, shape })
    }

    #[inline]
    pub(crate) fn from_parts(data: &'a mut [T], shape: Shape<N>) -> Self {
        Self { data, shape }
    }

    #[inline]
    pub(crate) fn from_region(data: &'a mut [T], region: Region<N>) -> Self {
        let end = region.offset + region.len();
        Self {
            data: &mut data[region.offset..end],
            shape: region.shape,
        }
    }

    /// Downgrade to a shared view with the full source lifetime.
    #[inline]
    pub fn into_view(self) -> ArrayView<'a, T, N> {
        ArrayView {
            data: self.data,
            shape: self.shape,
        }
    }
}

impl<T: Element, const N: usize> Contiguous<T, N> for ArrayViewMut<'_, T, N> {
    #[inline]
    fn shape(&self) -> &Shape<N> {
        &self.shape
    }

    #[inline]
    fn as_slice(&self) -> &[T] {
        &*self.data
    }
}

impl<T: Element, const N: usize> ContiguousMut<T, N> for ArrayViewMut<'_, T, N> {
    #[inline]
    fn as_mut_slice(&mut self) -> &mut [T] {
        &mut *self.data
    }
}

impl<T: Element, const N: usize> std::fmt::Debug for ArrayViewMut<'_, T, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArrayViewMut")
            .field("extents", self.shape.extents())
            .field("layout", &self.shape.layout())
            .field("data", &self.data)
            .finish()
    }
}

impl_read_access!(ArrayViewMut<'a>);
impl_write_access!(ArrayViewMut<'a>);
