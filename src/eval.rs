//! Fused lane evaluator.
//!
//! One pass over the destination: for every full lane the expression tree is
//! evaluated once and the result stored, then the remainder is handled by a
//! single masked lane that never reads or writes past the end. Aligned loads
//! and stores are used when the destination and every leaf start on a
//! `T::ALIGN` boundary; the choice is made once per pass, not per lane.
//!
//! Compound assignment runs the same loop with the destination also read as
//! the left operand. That is sound because lane `i` only reads and writes
//! index range `i..i + LANES`.

use std::marker::PhantomData;

use crate::expr::Expression;
use crate::op::BinaryOp;
use crate::shape::Shape;
use crate::simd;
use crate::view::ContiguousMut;
use crate::{DenseError, LaneElement, Result};

/// How an evaluated lane is combined with the destination.
pub(crate) trait Combine<T: LaneElement> {
    /// Whether the destination's current value is an input.
    const READS_DST: bool;

    fn lane(current: T::Lane, value: T::Lane) -> T::Lane;
}

/// `dst = value`
pub(crate) struct Overwrite;

impl<T: LaneElement> Combine<T> for Overwrite {
    const READS_DST: bool = false;

    #[inline(always)]
    fn lane(_current: T::Lane, value: T::Lane) -> T::Lane {
        value
    }
}

/// `dst = dst <op> value`
pub(crate) struct Update<Op>(PhantomData<Op>);

impl<T: LaneElement, Op: BinaryOp<T>> Combine<T> for Update<Op> {
    const READS_DST: bool = true;

    #[inline(always)]
    fn lane(current: T::Lane, value: T::Lane) -> T::Lane {
        Op::apply_lane(current, value)
    }
}

/// Check that `expr` can be written into a destination of shape `dst`.
///
/// A scalar-only expression fits any destination.
pub(crate) fn check_target<T, const N: usize, E>(dst: &Shape<N>, expr: &E) -> Result<()>
where
    T: LaneElement,
    E: Expression<T, N>,
{
    if let Some(shape) = expr.check()? {
        if shape.extents() != dst.extents() {
            return Err(DenseError::ShapeMismatch(
                dst.extents().to_vec(),
                shape.extents().to_vec(),
            ));
        }
        if shape.strides() != dst.strides() {
            return Err(DenseError::LayoutMismatch(dst.layout(), shape.layout()));
        }
    }
    Ok(())
}

/// Evaluate `expr` into `dst`.
///
/// # Errors
/// [`DenseError::ShapeMismatch`] or [`DenseError::LayoutMismatch`]; `dst` is
/// untouched on error.
pub(crate) fn assign<T, const N: usize, D, E>(dst: &mut D, expr: &E) -> Result<()>
where
    T: LaneElement,
    D: ContiguousMut<T, N> + ?Sized,
    E: Expression<T, N>,
{
    check_target(dst.shape(), expr)?;
    // SAFETY: check_target proved every leaf has exactly dst's element count.
    unsafe { drive::<T, N, E, Overwrite>(dst.as_mut_slice(), expr) };
    Ok(())
}

/// Evaluate `dst = dst <Op> expr` in place.
pub(crate) fn update<T, const N: usize, D, E, Op>(dst: &mut D, expr: &E) -> Result<()>
where
    T: LaneElement,
    D: ContiguousMut<T, N> + ?Sized,
    E: Expression<T, N>,
    Op: BinaryOp<T>,
{
    check_target(dst.shape(), expr)?;
    // SAFETY: as in `assign`.
    unsafe { drive::<T, N, E, Update<Op>>(dst.as_mut_slice(), expr) };
    Ok(())
}

/// # Safety
/// Every leaf of `expr` must hold at least `dst.len()` elements.
unsafe fn drive<T, const N: usize, E, C>(dst: &mut [T], expr: &E)
where
    T: LaneElement,
    E: Expression<T, N>,
    C: Combine<T>,
{
    let len = dst.len();
    if len == 0 {
        return;
    }
    let aligned = expr.is_aligned() && dst.as_ptr() as usize % T::ALIGN == 0;
    trace!(
        "eval {} elements: {} full lanes of {}, tail {}, {}",
        len,
        len / T::LANES,
        T::LANES,
        len % T::LANES,
        if aligned { "aligned" } else { "unaligned" }
    );
    simd::dispatch_if_large(len, || {
        if aligned {
            run::<T, N, E, C, true>(dst, expr)
        } else {
            run::<T, N, E, C, false>(dst, expr)
        }
    });
}

#[inline(always)]
unsafe fn run<T, const N: usize, E, C, const ALIGNED: bool>(dst: &mut [T], expr: &E)
where
    T: LaneElement,
    E: Expression<T, N>,
    C: Combine<T>,
{
    let len = dst.len();
    let ptr = dst.as_mut_ptr();
    let mut i = 0;
    while i + T::LANES <= len {
        let value = expr.eval_lane::<ALIGNED>(i);
        let p = ptr.add(i);
        let out = if C::READS_DST {
            let current = if ALIGNED { T::load(p) } else { T::loadu(p) };
            C::lane(current, value)
        } else {
            value
        };
        if ALIGNED {
            T::store(p, out)
        } else {
            T::storeu(p, out)
        }
        i += T::LANES;
    }
    let remaining = len - i;
    if remaining > 0 {
        let value = expr.eval_tail(i, remaining);
        let p = ptr.add(i);
        let out = if C::READS_DST {
            C::lane(T::masked_load(p, remaining), value)
        } else {
            value
        };
        T::masked_store(p, out, remaining);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Binary, Leaf, Scalar};
    use crate::op::{Add, Mul, Sub};
    use crate::{DenseArray, IntoExpr, Layout};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_vec(rng: &mut StdRng, len: usize) -> DenseArray<f64, 1> {
        DenseArray::from_vec([len], Layout::RowMajor, (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect())
            .unwrap()
    }

    #[test]
    fn test_assign_every_tail_length() {
        let mut rng = StdRng::seed_from_u64(3);
        for len in 1..=3 * f64::LANES + 1 {
            let a = random_vec(&mut rng, len);
            let b = random_vec(&mut rng, len);
            let mut out = DenseArray::<f64, 1>::filled([len], f64::NAN).unwrap();
            let e: Binary<_, _, Sub> = Binary::new((&a).into_node(), (&b).into_node());
            assign(&mut out, &e).unwrap();
            for i in 0..len {
                assert_relative_eq!(out[[i]], a[[i]] - b[[i]]);
            }
        }
    }

    #[test]
    fn test_unaligned_sources_and_destination() {
        let a = DenseArray::<f32, 1>::from_fn([37], Layout::RowMajor, |[i]| i as f32).unwrap();
        let mut out = DenseArray::<f32, 1>::zeros([37]).unwrap();
        let src = Leaf::new(&a.as_slice()[1..], crate::Shape::row_major([36]));
        let mut dst = crate::ArrayViewMut::new(&mut out.as_mut_slice()[1..], crate::Shape::row_major([36]))
            .unwrap();
        let e: Binary<_, _, Mul> = Binary::new(src, Scalar::new(2.0f32));
        assert!(!e.is_aligned());
        assign(&mut dst, &e).unwrap();
        assert_eq!(out[[0]], 0.0);
        for i in 1..37 {
            assert_eq!(out[[i]], 2.0 * i as f32);
        }
    }

    #[test]
    fn test_update_reads_destination() {
        let mut a = DenseArray::<f64, 2>::filled([3, 5], 1.0).unwrap();
        let b = DenseArray::<f64, 2>::filled([3, 5], 2.0).unwrap();
        update::<_, 2, _, _, Add>(&mut a, &(&b).into_node()).unwrap();
        assert!(a.iter().all(|&x| x == 3.0));
        update::<_, 2, _, _, Mul>(&mut a, &Scalar::new(10.0)).unwrap();
        assert!(a.iter().all(|&x| x == 30.0));
    }

    #[test]
    fn test_mismatch_leaves_destination_untouched() {
        let mut a = DenseArray::<f64, 2>::filled([2, 3], 1.0).unwrap();
        let b = DenseArray::<f64, 2>::filled([3, 2], 2.0).unwrap();
        let err = assign(&mut a, &(&b).into_node()).unwrap_err();
        assert_eq!(err, DenseError::ShapeMismatch(vec![2, 3], vec![3, 2]));
        let c = DenseArray::<f64, 2>::with_layout([2, 3], Layout::ColMajor).unwrap();
        let err = assign(&mut a, &(&c).into_node()).unwrap_err();
        assert_eq!(err, DenseError::LayoutMismatch(Layout::RowMajor, Layout::ColMajor));
        assert!(a.iter().all(|&x| x == 1.0));
    }

    #[test]
    fn test_large_pass_goes_through_dispatch() {
        let n = simd::DISPATCH_THRESHOLD * 4 + 3;
        let a = DenseArray::<f64, 1>::from_fn([n], Layout::RowMajor, |[i]| i as f64).unwrap();
        let mut out = DenseArray::<f64, 1>::zeros([n]).unwrap();
        assign(&mut out, &Binary::<_, _, Add>::new((&a).into_node(), (&a).into_node())).unwrap();
        assert_eq!(out[[n - 1]], 2.0 * (n - 1) as f64);
    }
}
