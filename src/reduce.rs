//! Fold-style reductions over arrays, views and fused expressions.
//!
//! Sums and products accumulate a whole lane per step and combine the lanes
//! at the end; the remainder is folded element by element. Reducing an
//! expression evaluates it on the fly, so `dot(&a, &b)` never materializes
//! `a * b`.

use crate::expr::{Binary, Expr, Expression, IntoExpr, Leaf};
use crate::op;
use crate::shape::Shape;
use crate::simd;
use crate::view::Contiguous;
use crate::{DenseError, LaneElement, Result};

/// Upper bound on lane width for spilling a lane to the stack.
const MAX_SPILL: usize = 64;

#[inline(always)]
unsafe fn lane_at<T, const N: usize, E, const ALIGNED: bool>(expr: &E, i: usize) -> T::Lane
where
    T: LaneElement,
    E: Expression<T, N>,
{
    expr.eval_lane::<ALIGNED>(i)
}

#[inline(always)]
unsafe fn sum_lanes<T, const N: usize, E, const ALIGNED: bool>(expr: &E, len: usize) -> T
where
    T: LaneElement,
    E: Expression<T, N>,
{
    let mut acc = T::splat(T::zero());
    let mut i = 0;
    while i + T::LANES <= len {
        acc = <T as LaneElement>::add(acc, lane_at::<T, N, E, ALIGNED>(expr, i));
        i += T::LANES;
    }
    // Scalar tail: a broadcast scalar fills inactive lanes with its own value,
    // so a masked lane cannot be summed as-is.
    (i..len).fold(T::reduce_add(acc), |total, j| total + expr.eval(j))
}

#[inline(always)]
unsafe fn product_lanes<T, const N: usize, E, const ALIGNED: bool>(expr: &E, len: usize) -> T
where
    T: LaneElement,
    E: Expression<T, N>,
{
    let mut acc = T::splat(T::one());
    let mut i = 0;
    while i + T::LANES <= len {
        acc = <T as LaneElement>::mul(acc, lane_at::<T, N, E, ALIGNED>(expr, i));
        i += T::LANES;
    }
    let mut spill = [T::one(); MAX_SPILL];
    T::storeu(spill.as_mut_ptr(), acc);
    let head = spill[..T::LANES].iter().fold(T::one(), |p, &x| p * x);
    (i..len).fold(head, |total, j| total * expr.eval(j))
}

/// Sum the first `len` elements of `expr`.
///
/// `len` must not exceed the length of any leaf; callers pass the validated
/// element count.
pub(crate) fn sum_node<T, const N: usize, E>(expr: &E, len: usize) -> T
where
    T: LaneElement,
    E: Expression<T, N>,
{
    let aligned = expr.is_aligned();
    trace!("sum {} elements, {}", len, if aligned { "aligned" } else { "unaligned" });
    simd::dispatch_if_large(len, || unsafe {
        if aligned {
            sum_lanes::<T, N, E, true>(expr, len)
        } else {
            sum_lanes::<T, N, E, false>(expr, len)
        }
    })
}

/// Product of the first `len` elements of `expr`. Same contract as [`sum_node`].
pub(crate) fn product_node<T, const N: usize, E>(expr: &E, len: usize) -> T
where
    T: LaneElement,
    E: Expression<T, N>,
{
    if T::LANES > MAX_SPILL {
        return (0..len).fold(T::one(), |p, j| p * expr.eval(j));
    }
    let aligned = expr.is_aligned();
    simd::dispatch_if_large(len, || unsafe {
        if aligned {
            product_lanes::<T, N, E, true>(expr, len)
        } else {
            product_lanes::<T, N, E, false>(expr, len)
        }
    })
}

fn flat_leaf<T: LaneElement>(data: &[T]) -> Leaf<'_, T, 1> {
    Leaf::new(data, Shape::row_major([data.len()]))
}

pub(crate) fn sum_contiguous<T, const N: usize, C>(src: &C) -> T
where
    T: LaneElement,
    C: Contiguous<T, N> + ?Sized,
{
    let data = src.as_slice();
    sum_node(&flat_leaf(data), data.len())
}

pub(crate) fn product_contiguous<T, const N: usize, C>(src: &C) -> T
where
    T: LaneElement,
    C: Contiguous<T, N> + ?Sized,
{
    let data = src.as_slice();
    product_node(&flat_leaf(data), data.len())
}

/// Sum of every element of an array, view or expression.
///
/// # Errors
/// Validation errors from the expression, or [`DenseError::UnsizedExpression`]
/// if it contains no array.
pub fn sum<T: LaneElement, const N: usize>(expr: impl IntoExpr<T, N>) -> Result<T> {
    let node = expr.into_node();
    let shape = node.check()?.ok_or(DenseError::UnsizedExpression)?;
    Ok(sum_node(&node, shape.len()))
}

/// Inner product `Σ a[i] * b[i]`, fused.
///
/// ```rust
/// use dense_rs::{dot, DenseArray};
///
/// let a = DenseArray::<f64, 1>::filled([10], 2.0).unwrap();
/// let b = DenseArray::<f64, 1>::filled([10], 3.0).unwrap();
/// assert_eq!(dot(&a, &b).unwrap(), 60.0);
/// ```
pub fn dot<T, const N: usize, A, B>(a: A, b: B) -> Result<T>
where
    T: LaneElement,
    A: IntoExpr<T, N>,
    B: IntoExpr<T, N>,
{
    sum(Expr::new(Binary::<_, _, op::Mul>::new(
        a.into_node(),
        b.into_node(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{full, idx, DenseArray, Layout};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_sum_matches_scalar_fold() {
        let mut rng = StdRng::seed_from_u64(5);
        for len in 1..100 {
            let data: Vec<f64> = (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect();
            let a = DenseArray::from_vec([len], Layout::RowMajor, data.clone()).unwrap();
            assert_relative_eq!(a.sum(), data.iter().sum::<f64>(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_product() {
        let a = DenseArray::<f64, 1>::from_fn([10], Layout::RowMajor, |[i]| (i + 1) as f64).unwrap();
        assert_eq!(a.product(), 3_628_800.0);
        let b = DenseArray::<f32, 2>::filled([3, 3], 2.0).unwrap();
        assert_eq!(b.product(), 512.0);
    }

    #[test]
    fn test_mean_min_max() {
        let a = DenseArray::<f64, 2>::from_vec([2, 3], Layout::RowMajor, vec![3.0, -1.0, 4.0, 1.0, 5.0, -9.0])
            .unwrap();
        assert_relative_eq!(a.mean().unwrap(), 0.5);
        assert_eq!(a.min(), Some(-9.0));
        assert_eq!(a.max(), Some(5.0));
        assert_eq!(a.fold(0usize, |n, x| n + (x > 0.0) as usize), 4);
    }

    #[test]
    fn test_empty_array_reductions() {
        let a = DenseArray::<f64, 2>::default();
        assert_eq!(a.sum(), 0.0);
        assert_eq!(a.product(), 1.0);
        assert_eq!(a.mean(), None);
        assert_eq!(a.min(), None);
    }

    #[test]
    fn test_sum_over_view() {
        let a = DenseArray::<f64, 2>::from_fn([4, 5], Layout::RowMajor, |[i, j]| (i * 5 + j) as f64)
            .unwrap();
        let row = a.view::<1>([idx(3), full()]).unwrap();
        assert_eq!(row.sum(), 15.0 + 16.0 + 17.0 + 18.0 + 19.0);
        assert_eq!(sum(row).unwrap(), 85.0);
    }

    #[test]
    fn test_fused_sum_with_scalar_tail() {
        // 13 elements leaves a tail for every lane width.
        let a = DenseArray::<f64, 1>::filled([13], 1.0).unwrap();
        assert_eq!(sum(&a + 1.0).unwrap(), 26.0);
        assert_eq!(sum(&a * 0.0 + 0.5).unwrap(), 6.5);
    }

    #[test]
    fn test_dot() {
        let a = DenseArray::<f32, 1>::from_fn([33], Layout::RowMajor, |[i]| i as f32).unwrap();
        let expected: f32 = (0..33).map(|i| (i * i) as f32).sum();
        assert_relative_eq!(dot(&a, &a).unwrap(), expected);
        let b = DenseArray::<f32, 1>::zeros([4]).unwrap();
        assert!(matches!(dot(&a, &b), Err(DenseError::ShapeMismatch(_, _))));
    }

    #[test]
    fn test_scalar_only_sum_is_unsized() {
        assert_eq!(sum::<f64, 2>(1.0).unwrap_err(), DenseError::UnsizedExpression);
    }
}
