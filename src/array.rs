//! The owning dense array.

use crate::alloc::AlignedBuf;
use crate::eval;
use crate::expr::{Expression, IntoExpr};
use crate::shape::{Layout, Shape};
use crate::view::{Contiguous, ContiguousMut};
use crate::{DenseError, Element, LaneElement, Result};

/// Owning rank-`N` array over a lane-aligned buffer.
///
/// Extents are fixed at construction (or [`reset`](Self::reset)). The element
/// count is the product of the extents and every extent is at least 1; the
/// only array with no elements is the empty state left by [`Default`] and
/// [`take`](Self::take).
///
/// `Clone` deep-copies the buffer.
#[derive(Clone)]
pub struct DenseArray<T: Element, const N: usize> {
    buf: AlignedBuf<T>,
    shape: Shape<N>,
}

/// Validate extents and return the element count.
fn element_count<T, const N: usize>(extents: &[usize; N]) -> Result<usize> {
    if extents.contains(&0) {
        return Err(DenseError::InvalidShape(extents.to_vec()));
    }
    extents
        .iter()
        .try_fold(1usize, |acc, &e| acc.checked_mul(e))
        .ok_or(DenseError::OutOfMemory {
            elements: usize::MAX,
            element_size: std::mem::size_of::<T>(),
        })
}

impl<T: Element, const N: usize> DenseArray<T, N> {
    /// Zero-filled row-major array.
    ///
    /// # Errors
    /// - [`DenseError::InvalidShape`] if any extent is zero
    /// - [`DenseError::OutOfMemory`] if the buffer cannot be allocated
    pub fn zeros(extents: [usize; N]) -> Result<Self> {
        Self::with_layout(extents, Layout::RowMajor)
    }

    /// Same as [`zeros`](Self::zeros).
    pub fn new(extents: [usize; N]) -> Result<Self> {
        Self::zeros(extents)
    }

    /// Zero-filled array with the given memory layout.
    pub fn with_layout(extents: [usize; N], layout: Layout) -> Result<Self> {
        let len = element_count::<T, N>(&extents)?;
        Ok(Self {
            buf: AlignedBuf::zeroed(len)?,
            shape: Shape::new(extents, layout),
        })
    }

    /// Row-major array with every element set to `value`.
    pub fn filled(extents: [usize; N], value: T) -> Result<Self> {
        Self::filled_with_layout(extents, Layout::RowMajor, value)
    }

    /// Array with the given memory layout and every element set to `value`.
    pub fn filled_with_layout(extents: [usize; N], layout: Layout, value: T) -> Result<Self> {
        let len = element_count::<T, N>(&extents)?;
        Ok(Self {
            buf: AlignedBuf::filled(len, value)?,
            shape: Shape::new(extents, layout),
        })
    }

    /// Row-major array of ones.
    pub fn ones(extents: [usize; N]) -> Result<Self>
    where
        T: num_traits::One,
    {
        Self::filled(extents, T::one())
    }

    /// Copy `data` (in memory order for `layout`) into a new array.
    ///
    /// # Errors
    /// [`DenseError::ShapeMismatch`] if `data.len()` is not the product of `extents`.
    pub fn from_vec(extents: [usize; N], layout: Layout, data: Vec<T>) -> Result<Self> {
        let len = element_count::<T, N>(&extents)?;
        if data.len() != len {
            return Err(DenseError::ShapeMismatch(vec![data.len()], extents.to_vec()));
        }
        Ok(Self {
            buf: AlignedBuf::from_slice(&data)?,
            shape: Shape::new(extents, layout),
        })
    }

    /// Build an array by calling `f` with every multi-index, in memory order.
    pub fn from_fn(
        extents: [usize; N],
        layout: Layout,
        mut f: impl FnMut([usize; N]) -> T,
    ) -> Result<Self> {
        let mut array = Self::with_layout(extents, layout)?;
        let shape = array.shape;
        for (offset, slot) in array.buf.as_mut_slice().iter_mut().enumerate() {
            *slot = f(shape.unravel(offset));
        }
        Ok(array)
    }

    pub(crate) fn from_parts(buf: AlignedBuf<T>, shape: Shape<N>) -> Self {
        Self { buf, shape }
    }

    /// Reallocate to `extents`, keeping the current layout. Contents become zero.
    ///
    /// On error the array is left unchanged.
    pub fn reset(&mut self, extents: [usize; N]) -> Result<()> {
        self.reset_with_layout(extents, self.shape.layout())
    }

    /// Reallocate to `extents` under `layout`. Contents become zero.
    ///
    /// On error the array is left unchanged.
    pub fn reset_with_layout(&mut self, extents: [usize; N], layout: Layout) -> Result<()> {
        let fresh = Self::with_layout(extents, layout)?;
        trace!(
            "reset {:?} {:?} -> {:?} {:?}",
            self.shape.extents(),
            self.shape.layout(),
            extents,
            layout
        );
        *self = fresh;
        Ok(())
    }

    /// Move the contents out, leaving `self` in the empty state.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

impl<T: LaneElement, const N: usize> DenseArray<T, N> {
    /// Materialize an expression into a new array with the expression's
    /// extents and layout.
    ///
    /// All array operands must share extents and layout. Operands with equal
    /// extents but different layouts are rejected, except where both layouts
    /// have the same strides (rank 1, single-element shapes).
    ///
    /// # Errors
    /// - [`DenseError::ShapeMismatch`] / [`DenseError::LayoutMismatch`] from
    ///   validating the expression's operands
    /// - [`DenseError::UnsizedExpression`] if the expression contains no array
    pub fn from_expr(expr: impl IntoExpr<T, N>) -> Result<Self> {
        let node = expr.into_node();
        let shape = node.check()?.ok_or(DenseError::UnsizedExpression)?;
        let mut out = Self::with_layout(*shape.extents(), shape.layout())?;
        eval::assign(&mut out, &node)?;
        Ok(out)
    }

    /// Evaluate `expr` into `self`, first reallocating if the extents or
    /// layout differ. A scalar-only expression fills the current array.
    ///
    /// Validation happens before any reallocation; on error `self` is unchanged.
    pub fn assign_resize(&mut self, expr: impl IntoExpr<T, N>) -> Result<()> {
        let node = expr.into_node();
        if let Some(shape) = node.check()? {
            if shape.extents() != self.shape.extents() || shape.layout() != self.shape.layout() {
                self.reset_with_layout(*shape.extents(), shape.layout())?;
            }
        }
        eval::assign(self, &node)
    }
}

impl<T: Element, const N: usize> Default for DenseArray<T, N> {
    /// The empty state: all extents zero, no allocation.
    fn default() -> Self {
        Self {
            buf: AlignedBuf::empty(),
            shape: Shape::row_major([0; N]),
        }
    }
}

impl<T: Element, const N: usize> Contiguous<T, N> for DenseArray<T, N> {
    #[inline]
    fn shape(&self) -> &Shape<N> {
        &self.shape
    }

    #[inline]
    fn as_slice(&self) -> &[T] {
        self.buf.as_slice()
    }
}

impl<T: Element, const N: usize> ContiguousMut<T, N> for DenseArray<T, N> {
    #[inline]
    fn as_mut_slice(&mut self) -> &mut [T] {
        self.buf.as_mut_slice()
    }
}

impl<T: Element, const N: usize> PartialEq for DenseArray<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.shape == other.shape && self.buf.as_slice() == other.buf.as_slice()
    }
}

impl<T: Element, const N: usize> std::fmt::Debug for DenseArray<T, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DenseArray")
            .field("extents", self.shape.extents())
            .field("layout", &self.shape.layout())
            .field("data", &self.buf)
            .finish()
    }
}

impl_read_access!(DenseArray);
impl_write_access!(DenseArray);
