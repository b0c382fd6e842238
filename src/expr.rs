//! Lazy elementwise expression graph.
//!
//! Arithmetic on arrays, views and scalars builds a tree of [`Expression`]
//! nodes without reading or allocating anything. The tree is consumed by a
//! terminal operation (assignment, compound assignment, [`DenseArray::from_expr`],
//! a reduction) that walks it once per lane:
//!
//! - [`Leaf`]: a borrowed contiguous region
//! - [`Scalar`]: a value broadcast to every index; it has no shape of its own
//! - [`Binary`]: two children combined by an operator tag from [`crate::op`]
//! - [`Negate`]: lane-wise negation of one child
//!
//! Children are held by value and leaves borrow their data, so the borrow
//! checker guarantees every operand outlives the expression.

use std::marker::PhantomData;

use crate::array::DenseArray;
use crate::op::BinaryOp;
use crate::shape::Shape;
use crate::view::{ArrayView, ArrayViewMut, Contiguous};
use crate::{eval, reduce, DenseError, LaneElement, Result};

/// A node that can be evaluated at any flat index, one element or one lane at a time.
///
/// Indices are positions in the memory order shared by every array operand;
/// [`check`](Self::check) is what guarantees that order is shared.
pub trait Expression<T: LaneElement, const N: usize> {
    /// Validate operands pairwise and return the common shape, or `None` if
    /// the expression contains only scalars.
    ///
    /// # Errors
    /// - [`DenseError::ShapeMismatch`] if two array operands have different extents
    /// - [`DenseError::LayoutMismatch`] if they have equal extents but different strides
    fn check(&self) -> Result<Option<Shape<N>>>;

    /// Whether every leaf's first element sits on a `T::ALIGN` boundary.
    fn is_aligned(&self) -> bool;

    /// Element at flat index `i`.
    ///
    /// # Panics
    /// If `i` is past the end of a leaf.
    fn eval(&self, i: usize) -> T;

    /// Full lane starting at flat index `i`.
    ///
    /// # Safety
    /// `i + T::LANES` must not exceed any leaf's length. With `ALIGNED = true`,
    /// [`is_aligned`](Self::is_aligned) must hold and `i` must be a multiple of `T::LANES`.
    unsafe fn eval_lane<const ALIGNED: bool>(&self, i: usize) -> T::Lane;

    /// Partial lane of `remaining` elements starting at `i`. Inactive lanes
    /// hold unspecified values.
    ///
    /// # Safety
    /// `remaining <= T::LANES` and `i + remaining` must not exceed any leaf's length.
    unsafe fn eval_tail(&self, i: usize, remaining: usize) -> T::Lane;
}

// ============================================================================
// Nodes
// ============================================================================

/// Borrowed contiguous operand.
#[derive(Debug, Clone, Copy)]
pub struct Leaf<'a, T: LaneElement, const N: usize> {
    data: &'a [T],
    shape: Shape<N>,
}

impl<'a, T: LaneElement, const N: usize> Leaf<'a, T, N> {
    pub fn new(data: &'a [T], shape: Shape<N>) -> Self {
        Self { data, shape }
    }

    fn from_contiguous<C: Contiguous<T, N> + ?Sized>(src: &'a C) -> Self {
        Self::new(src.as_slice(), *src.shape())
    }
}

impl<T: LaneElement, const N: usize> Expression<T, N> for Leaf<'_, T, N> {
    fn check(&self) -> Result<Option<Shape<N>>> {
        // The empty rank-0 array has a one-element shape but no data.
        if self.data.len() != self.shape.len() {
            return Err(DenseError::ShapeMismatch(
                vec![self.data.len()],
                self.shape.extents().to_vec(),
            ));
        }
        Ok(Some(self.shape))
    }

    #[inline]
    fn is_aligned(&self) -> bool {
        self.data.as_ptr() as usize % T::ALIGN == 0
    }

    #[inline(always)]
    fn eval(&self, i: usize) -> T {
        self.data[i]
    }

    #[inline(always)]
    unsafe fn eval_lane<const ALIGNED: bool>(&self, i: usize) -> T::Lane {
        let ptr = self.data.as_ptr().add(i);
        if ALIGNED {
            T::load(ptr)
        } else {
            T::loadu(ptr)
        }
    }

    #[inline(always)]
    unsafe fn eval_tail(&self, i: usize, remaining: usize) -> T::Lane {
        T::masked_load(self.data.as_ptr().add(i), remaining)
    }
}

/// Broadcast scalar operand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scalar<T> {
    value: T,
}

impl<T: LaneElement> Scalar<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn value(&self) -> T {
        self.value
    }
}

impl<T: LaneElement, const N: usize> Expression<T, N> for Scalar<T> {
    #[inline]
    fn check(&self) -> Result<Option<Shape<N>>> {
        Ok(None)
    }

    #[inline]
    fn is_aligned(&self) -> bool {
        true
    }

    #[inline(always)]
    fn eval(&self, _i: usize) -> T {
        self.value
    }

    #[inline(always)]
    unsafe fn eval_lane<const ALIGNED: bool>(&self, _i: usize) -> T::Lane {
        T::splat(self.value)
    }

    #[inline(always)]
    unsafe fn eval_tail(&self, _i: usize, _remaining: usize) -> T::Lane {
        T::splat(self.value)
    }
}

/// Two children combined by the operator tag `Op`.
#[derive(Debug, Clone, Copy)]
pub struct Binary<L, R, Op> {
    lhs: L,
    rhs: R,
    _op: PhantomData<Op>,
}

impl<L, R, Op> Binary<L, R, Op> {
    pub fn new(lhs: L, rhs: R) -> Self {
        Self {
            lhs,
            rhs,
            _op: PhantomData,
        }
    }
}

/// Merge the shapes of two operands.
fn merge_shapes<const N: usize>(
    lhs: Option<Shape<N>>,
    rhs: Option<Shape<N>>,
) -> Result<Option<Shape<N>>> {
    match (lhs, rhs) {
        (Some(a), Some(b)) => {
            if a.extents() != b.extents() {
                return Err(DenseError::ShapeMismatch(
                    a.extents().to_vec(),
                    b.extents().to_vec(),
                ));
            }
            // Rank-1 and single-element shapes have identical strides in both layouts.
            if a.strides() != b.strides() {
                return Err(DenseError::LayoutMismatch(a.layout(), b.layout()));
            }
            Ok(Some(a))
        }
        (a, b) => Ok(a.or(b)),
    }
}

impl<T, const N: usize, L, R, Op> Expression<T, N> for Binary<L, R, Op>
where
    T: LaneElement,
    L: Expression<T, N>,
    R: Expression<T, N>,
    Op: BinaryOp<T>,
{
    fn check(&self) -> Result<Option<Shape<N>>> {
        merge_shapes(self.lhs.check()?, self.rhs.check()?)
    }

    #[inline]
    fn is_aligned(&self) -> bool {
        self.lhs.is_aligned() && self.rhs.is_aligned()
    }

    #[inline(always)]
    fn eval(&self, i: usize) -> T {
        Op::apply(self.lhs.eval(i), self.rhs.eval(i))
    }

    #[inline(always)]
    unsafe fn eval_lane<const ALIGNED: bool>(&self, i: usize) -> T::Lane {
        Op::apply_lane(
            self.lhs.eval_lane::<ALIGNED>(i),
            self.rhs.eval_lane::<ALIGNED>(i),
        )
    }

    #[inline(always)]
    unsafe fn eval_tail(&self, i: usize, remaining: usize) -> T::Lane {
        Op::apply_lane(
            self.lhs.eval_tail(i, remaining),
            self.rhs.eval_tail(i, remaining),
        )
    }
}

/// Lane-wise negation.
#[derive(Debug, Clone, Copy)]
pub struct Negate<E> {
    inner: E,
}

impl<E> Negate<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }
}

impl<T: LaneElement, const N: usize, E: Expression<T, N>> Expression<T, N> for Negate<E> {
    fn check(&self) -> Result<Option<Shape<N>>> {
        self.inner.check()
    }

    #[inline]
    fn is_aligned(&self) -> bool {
        self.inner.is_aligned()
    }

    #[inline(always)]
    fn eval(&self, i: usize) -> T {
        -self.inner.eval(i)
    }

    #[inline(always)]
    unsafe fn eval_lane<const ALIGNED: bool>(&self, i: usize) -> T::Lane {
        // Multiplying by -1 flips the sign of zeros too.
        <T as LaneElement>::mul(self.inner.eval_lane::<ALIGNED>(i), T::splat(-T::one()))
    }

    #[inline(always)]
    unsafe fn eval_tail(&self, i: usize, remaining: usize) -> T::Lane {
        <T as LaneElement>::mul(self.inner.eval_tail(i, remaining), T::splat(-T::one()))
    }
}

// ============================================================================
// Expr wrapper
// ============================================================================

/// An unevaluated expression.
///
/// This is what the arithmetic operators return. It carries the operator
/// overloads so expressions compose, and the terminal operations that read
/// it without materializing intermediates.
#[derive(Debug, Clone, Copy)]
pub struct Expr<T, const N: usize, E> {
    node: E,
    _marker: PhantomData<T>,
}

impl<T: LaneElement, const N: usize, E: Expression<T, N>> Expr<T, N, E> {
    pub fn new(node: E) -> Self {
        Self {
            node,
            _marker: PhantomData,
        }
    }

    /// The root node.
    pub fn node(&self) -> &E {
        &self.node
    }

    /// Validated shape, or `None` for a scalar-only expression.
    pub fn shape(&self) -> Result<Option<Shape<N>>> {
        self.node.check()
    }

    /// Element at multi-index `index`, computed without evaluating the rest.
    ///
    /// # Errors
    /// Validation errors, [`DenseError::UnsizedExpression`] for scalar-only
    /// expressions, or [`DenseError::IndexOutOfRange`].
    pub fn eval_at(&self, index: [usize; N]) -> Result<T> {
        let shape = self.shape()?.ok_or(DenseError::UnsizedExpression)?;
        let offset = shape.checked_offset(&index)?;
        Ok(self.node.eval(offset))
    }

    /// Materialize into a new array.
    pub fn to_array(&self) -> Result<DenseArray<T, N>> {
        let shape = self.shape()?.ok_or(DenseError::UnsizedExpression)?;
        let mut out = DenseArray::with_layout(*shape.extents(), shape.layout())?;
        eval::assign(&mut out, &self.node)?;
        Ok(out)
    }

    /// Sum of all elements, fused.
    pub fn sum(&self) -> Result<T> {
        let len = self.sized_len()?;
        Ok(reduce::sum_node(&self.node, len))
    }

    /// Product of all elements, fused.
    pub fn product(&self) -> Result<T> {
        let len = self.sized_len()?;
        Ok(reduce::product_node(&self.node, len))
    }

    /// Arithmetic mean, fused.
    pub fn mean(&self) -> Result<T> {
        let len = self.sized_len()?;
        let n = <T as num_traits::NumCast>::from(len).ok_or(DenseError::UnsizedExpression)?;
        Ok(reduce::sum_node(&self.node, len) / n)
    }

    /// Smallest element, ignoring NaN.
    pub fn min(&self) -> Result<T> {
        self.fold(T::infinity(), num_traits::Float::min)
    }

    /// Largest element, ignoring NaN.
    pub fn max(&self) -> Result<T> {
        self.fold(T::neg_infinity(), num_traits::Float::max)
    }

    /// Fold every element in memory order.
    pub fn fold<A>(&self, init: A, mut f: impl FnMut(A, T) -> A) -> Result<A> {
        let len = self.sized_len()?;
        Ok((0..len).fold(init, |acc, i| f(acc, self.node.eval(i))))
    }

    fn sized_len(&self) -> Result<usize> {
        Ok(self.shape()?.ok_or(DenseError::UnsizedExpression)?.len())
    }
}

// ============================================================================
// Conversion into nodes
// ============================================================================

/// Anything usable as an operand: arrays and views by reference, expressions,
/// and `f32`/`f64` scalars.
pub trait IntoExpr<T: LaneElement, const N: usize> {
    type Node: Expression<T, N>;

    fn into_node(self) -> Self::Node;
}

impl<'a, T: LaneElement, const N: usize> IntoExpr<T, N> for &'a DenseArray<T, N> {
    type Node = Leaf<'a, T, N>;

    #[inline]
    fn into_node(self) -> Self::Node {
        Leaf::from_contiguous(self)
    }
}

impl<'a, T: LaneElement, const N: usize> IntoExpr<T, N> for ArrayView<'a, T, N> {
    type Node = Leaf<'a, T, N>;

    #[inline]
    fn into_node(self) -> Self::Node {
        Leaf::new(self.into_slice(), *Contiguous::shape(&self))
    }
}

impl<'a, T: LaneElement, const N: usize> IntoExpr<T, N> for &'a ArrayView<'_, T, N> {
    type Node = Leaf<'a, T, N>;

    #[inline]
    fn into_node(self) -> Self::Node {
        Leaf::from_contiguous(self)
    }
}

impl<'a, T: LaneElement, const N: usize> IntoExpr<T, N> for &'a ArrayViewMut<'_, T, N> {
    type Node = Leaf<'a, T, N>;

    #[inline]
    fn into_node(self) -> Self::Node {
        Leaf::from_contiguous(self)
    }
}

impl<T: LaneElement, const N: usize, E: Expression<T, N>> IntoExpr<T, N> for Expr<T, N, E> {
    type Node = E;

    #[inline]
    fn into_node(self) -> Self::Node {
        self.node
    }
}

macro_rules! impl_scalar_into_expr {
    ($($t:ty),*) => {$(
        impl<const N: usize> IntoExpr<$t, N> for $t {
            type Node = Scalar<$t>;

            #[inline]
            fn into_node(self) -> Self::Node {
                Scalar::new(self)
            }
        }
    )*};
}

impl_scalar_into_expr!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::{Add, Mul};
    use crate::Layout;

    fn leaf(data: &[f64]) -> Leaf<'_, f64, 1> {
        Leaf::new(data, Shape::row_major([data.len()]))
    }

    #[test]
    fn test_scalar_has_no_shape() {
        let s = Scalar::new(2.0f64);
        assert_eq!(Expression::<f64, 2>::check(&s), Ok(None));
        assert_eq!(Expression::<f64, 2>::eval(&s, 123), 2.0);
    }

    #[test]
    fn test_binary_eval_matches_scalar_math() {
        let a = [1.0, 2.0, 3.0];
        let b = [10.0, 20.0, 30.0];
        let e: Binary<_, _, Mul> = Binary::new(Binary::<_, _, Add>::new(leaf(&a), leaf(&b)), Scalar::new(2.0));
        assert_eq!(e.check().unwrap().unwrap().extents(), &[3]);
        assert_eq!((0..3).map(|i| e.eval(i)).collect::<Vec<_>>(), vec![22.0, 44.0, 66.0]);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = [1.0; 3];
        let b = [1.0; 4];
        let e: Binary<_, _, Add> = Binary::new(leaf(&a), leaf(&b));
        assert_eq!(e.check(), Err(DenseError::ShapeMismatch(vec![3], vec![4])));
    }

    #[test]
    fn test_layout_mismatch() {
        let a = [0.0f64; 6];
        let row = Leaf::new(&a[..], Shape::new([2, 3], Layout::RowMajor));
        let col = Leaf::new(&a[..], Shape::new([2, 3], Layout::ColMajor));
        let e: Binary<_, _, Add> = Binary::new(row, col);
        assert_eq!(
            e.check(),
            Err(DenseError::LayoutMismatch(Layout::RowMajor, Layout::ColMajor))
        );
        // Vectors read the same in both layouts.
        let v_row = Leaf::new(&a[..], Shape::new([6], Layout::RowMajor));
        let v_col = Leaf::new(&a[..], Shape::new([6], Layout::ColMajor));
        let e: Binary<_, _, Add> = Binary::new(v_row, v_col);
        assert!(e.check().is_ok());
    }

    #[test]
    fn test_negate_lane_and_scalar_agree() {
        let a: Vec<f64> = (0..16).map(|k| k as f64 - 3.0).collect();
        let e = Negate::new(leaf(&a));
        let lane = unsafe { e.eval_lane::<false>(0) };
        for k in 0..f64::LANES {
            assert_eq!(lane.0[k], e.eval(k));
        }
        let tail = unsafe { e.eval_tail(14, 2) };
        assert_eq!(&tail.0[..2], &[-11.0, -12.0]);
    }

    #[test]
    fn test_eval_at_and_reductions() {
        let a = DenseArray::<f64, 2>::from_fn([2, 3], Layout::RowMajor, |[i, j]| (3 * i + j) as f64)
            .unwrap();
        let e = Expr::new(Binary::<_, _, Mul>::new((&a).into_node(), Scalar::new(2.0)));
        assert_eq!(e.eval_at([1, 2]).unwrap(), 10.0);
        assert!(e.eval_at([2, 0]).is_err());
        assert_eq!(e.sum().unwrap(), 30.0);
        assert_eq!(e.min().unwrap(), 0.0);
        assert_eq!(e.max().unwrap(), 10.0);
        assert_eq!(e.mean().unwrap(), 5.0);
    }

    #[test]
    fn test_unsized_expression() {
        let e: Expr<f64, 1, _> = Expr::new(Scalar::new(1.0f64));
        assert_eq!(e.to_array().unwrap_err(), DenseError::UnsizedExpression);
        assert_eq!(e.sum().unwrap_err(), DenseError::UnsizedExpression);
    }
}
