//! Operator overloads and compound assignment.
//!
//! `+ - * /` and unary `-` on `&DenseArray`, views and [`Expr`] build a new
//! [`Expr`]; nothing is evaluated until the result is assigned or reduced.
//! Scalars (`f32`, `f64`) can appear on either side.
//!
//! Compound assignment exists as fallible `try_*_assign` methods and as the
//! std `*Assign` traits, which panic with the error message on mismatch.

use std::ops::{AddAssign, DivAssign, MulAssign, Neg, SubAssign};

use crate::array::DenseArray;
use crate::eval;
use crate::expr::{Binary, Expr, Expression, IntoExpr, Leaf, Negate, Scalar};
use crate::op;
use crate::view::{ArrayView, ArrayViewMut};
use crate::{LaneElement, Result};

// ============================================================================
// Binary operators with an array, view or expression on the left
// ============================================================================

macro_rules! impl_binary_operator {
    ([$($gen:tt)*] $lhs:ty) => {
        impl_binary_operator!(@one [$($gen)*] $lhs, Add, add, op::Add);
        impl_binary_operator!(@one [$($gen)*] $lhs, Sub, sub, op::Sub);
        impl_binary_operator!(@one [$($gen)*] $lhs, Mul, mul, op::Mul);
        impl_binary_operator!(@one [$($gen)*] $lhs, Div, div, op::Div);

        impl<$($gen)* T: LaneElement, const N: usize> Neg for $lhs {
            type Output = Expr<T, N, Negate<<$lhs as IntoExpr<T, N>>::Node>>;

            #[inline]
            fn neg(self) -> Self::Output {
                Expr::new(Negate::new(self.into_node()))
            }
        }
    };
    (@one [$($gen:tt)*] $lhs:ty, $trait:ident, $method:ident, $tag:ty) => {
        impl<$($gen)* T: LaneElement, const N: usize, R: IntoExpr<T, N>> std::ops::$trait<R> for $lhs {
            type Output = Expr<T, N, Binary<<$lhs as IntoExpr<T, N>>::Node, R::Node, $tag>>;

            #[inline]
            fn $method(self, rhs: R) -> Self::Output {
                Expr::new(Binary::new(self.into_node(), rhs.into_node()))
            }
        }
    };
}

impl_binary_operator!(['a,] &'a DenseArray<T, N>);
impl_binary_operator!(['a,] ArrayView<'a, T, N>);
impl_binary_operator!(['a, 'b,] &'a ArrayView<'b, T, N>);
impl_binary_operator!(['a, 'b,] &'a ArrayViewMut<'b, T, N>);
impl_binary_operator!([E: Expression<T, N>,] Expr<T, N, E>);

// ============================================================================
// Binary operators with a scalar on the left
// ============================================================================

macro_rules! impl_scalar_lhs_operator {
    ($t:ty, [$($gen:tt)*] $rhs:ty, $node:ty) => {
        impl_scalar_lhs_operator!(@one $t, [$($gen)*] $rhs, $node, Add, add, op::Add);
        impl_scalar_lhs_operator!(@one $t, [$($gen)*] $rhs, $node, Sub, sub, op::Sub);
        impl_scalar_lhs_operator!(@one $t, [$($gen)*] $rhs, $node, Mul, mul, op::Mul);
        impl_scalar_lhs_operator!(@one $t, [$($gen)*] $rhs, $node, Div, div, op::Div);
    };
    (@one $t:ty, [$($gen:tt)*] $rhs:ty, $node:ty, $trait:ident, $method:ident, $tag:ty) => {
        impl<$($gen)* const N: usize> std::ops::$trait<$rhs> for $t {
            type Output = Expr<$t, N, Binary<Scalar<$t>, $node, $tag>>;

            #[inline]
            fn $method(self, rhs: $rhs) -> Self::Output {
                Expr::new(Binary::new(Scalar::new(self), rhs.into_node()))
            }
        }
    };
}

macro_rules! impl_scalar_lhs_operators {
    ($($t:ty),*) => {$(
        impl_scalar_lhs_operator!($t, ['a,] &'a DenseArray<$t, N>, Leaf<'a, $t, N>);
        impl_scalar_lhs_operator!($t, ['a,] ArrayView<'a, $t, N>, Leaf<'a, $t, N>);
        impl_scalar_lhs_operator!($t, ['a, 'b,] &'a ArrayView<'b, $t, N>, Leaf<'a, $t, N>);
        impl_scalar_lhs_operator!($t, ['a, 'b,] &'a ArrayViewMut<'b, $t, N>, Leaf<'a, $t, N>);
        impl_scalar_lhs_operator!($t, [E: Expression<$t, N>,] Expr<$t, N, E>, E);
    )*};
}

impl_scalar_lhs_operators!(f32, f64);

// ============================================================================
// Assignment and compound assignment
// ============================================================================

macro_rules! impl_assignment {
    ($ty:ident $(<$lt:lifetime>)?) => {
        impl<$($lt,)? T: LaneElement, const N: usize> $ty<$($lt,)? T, N> {
            /// Evaluate `expr` into this region's existing storage.
            ///
            /// A scalar fills every element. Nothing is written on error.
            ///
            /// # Errors
            /// [`DenseError::ShapeMismatch`](crate::DenseError::ShapeMismatch) or
            /// [`DenseError::LayoutMismatch`](crate::DenseError::LayoutMismatch).
            pub fn assign(&mut self, expr: impl IntoExpr<T, N>) -> Result<()> {
                eval::assign(self, &expr.into_node())
            }

            /// `self += rhs`, elementwise and fused.
            pub fn try_add_assign(&mut self, rhs: impl IntoExpr<T, N>) -> Result<()> {
                eval::update::<T, N, _, _, op::Add>(self, &rhs.into_node())
            }

            /// `self -= rhs`, elementwise and fused.
            pub fn try_sub_assign(&mut self, rhs: impl IntoExpr<T, N>) -> Result<()> {
                eval::update::<T, N, _, _, op::Sub>(self, &rhs.into_node())
            }

            /// `self *= rhs`, elementwise and fused.
            pub fn try_mul_assign(&mut self, rhs: impl IntoExpr<T, N>) -> Result<()> {
                eval::update::<T, N, _, _, op::Mul>(self, &rhs.into_node())
            }

            /// `self /= rhs`, elementwise and fused.
            pub fn try_div_assign(&mut self, rhs: impl IntoExpr<T, N>) -> Result<()> {
                eval::update::<T, N, _, _, op::Div>(self, &rhs.into_node())
            }
        }

        impl_assignment!(@std $ty $(<$lt>)?, AddAssign, add_assign, try_add_assign);
        impl_assignment!(@std $ty $(<$lt>)?, SubAssign, sub_assign, try_sub_assign);
        impl_assignment!(@std $ty $(<$lt>)?, MulAssign, mul_assign, try_mul_assign);
        impl_assignment!(@std $ty $(<$lt>)?, DivAssign, div_assign, try_div_assign);
    };
    (@std $ty:ident $(<$lt:lifetime>)?, $trait:ident, $method:ident, $try:ident) => {
        impl<$($lt,)? T: LaneElement, const N: usize, R: IntoExpr<T, N>> $trait<R>
            for $ty<$($lt,)? T, N>
        {
            /// # Panics
            /// If the operand's shape or layout does not match.
            #[inline]
            fn $method(&mut self, rhs: R) {
                if let Err(e) = self.$try(rhs) {
                    panic!("{}", e);
                }
            }
        }
    };
}

impl_assignment!(DenseArray);
impl_assignment!(ArrayViewMut<'a>);

#[cfg(test)]
mod tests {
    use crate::{full, idx, ArrayView, ArrayViewMut, DenseArray, DenseError, Layout};

    fn seq(extents: [usize; 2]) -> DenseArray<f64, 2> {
        DenseArray::from_fn(extents, Layout::RowMajor, |[i, j]| (i * extents[1] + j) as f64).unwrap()
    }

    #[test]
    fn test_expression_chain() {
        let a = seq([3, 7]);
        let b = DenseArray::<f64, 2>::filled([3, 7], 2.0).unwrap();
        let r = DenseArray::from_expr((&a + &b) * &b - 1.0).unwrap();
        for (i, &x) in r.iter().enumerate() {
            assert_eq!(x, (i as f64 + 2.0) * 2.0 - 1.0);
        }
    }

    #[test]
    fn test_scalar_on_the_left() {
        let a = seq([2, 5]);
        let r = DenseArray::from_expr(10.0 - &a).unwrap();
        assert_eq!(r[[1, 4]], 1.0);
        let r = DenseArray::from_expr(1.0 / (&a + 1.0)).unwrap();
        assert_eq!(r[[0, 1]], 0.5);
    }

    #[test]
    fn test_negation() {
        let a = seq([2, 2]);
        let r = DenseArray::from_expr(-&a + 3.0).unwrap();
        assert_eq!(r.as_slice(), &[3.0, 2.0, 1.0, 0.0]);
        let r = DenseArray::from_expr(-(&a * 2.0)).unwrap();
        assert_eq!(r.as_slice(), &[-0.0, -2.0, -4.0, -6.0]);
    }

    #[test]
    fn test_mixed_views_and_arrays() {
        let a = seq([3, 4]);
        let b = DenseArray::<f64, 1>::filled([4], 100.0).unwrap();
        let row: ArrayView<'_, f64, 1> = a.view([idx(2), full()]).unwrap();
        let r = DenseArray::from_expr(row + &b).unwrap();
        assert_eq!(r.as_slice(), &[108.0, 109.0, 110.0, 111.0]);
        let r = DenseArray::from_expr(&row * 2.0 + row).unwrap();
        assert_eq!(r.as_slice(), &[24.0, 27.0, 30.0, 33.0]);
    }

    #[test]
    fn test_compound_assignment_on_array() {
        let mut a = seq([2, 3]);
        let b = DenseArray::<f64, 2>::filled([2, 3], 1.0).unwrap();
        a += &b;
        a *= 2.0;
        a -= &b * 2.0;
        a /= 2.0;
        assert_eq!(a.as_slice(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_compound_assignment_through_view() {
        let mut a = seq([3, 3]);
        {
            let mut row: ArrayViewMut<'_, f64, 1> = a.view_mut([idx(1), full()]).unwrap();
            row *= 10.0;
            row.try_add_assign(1.0).unwrap();
        }
        assert_eq!(&a.as_slice()[3..6], &[31.0, 41.0, 51.0]);
        assert_eq!(a[[0, 0]], 0.0);
    }

    #[test]
    fn test_assign_scalar_and_expression() {
        let mut a = DenseArray::<f32, 1>::zeros([11]).unwrap();
        a.assign(1.5f32).unwrap();
        assert!(a.iter().all(|&x| x == 1.5));
        let b = a.clone();
        a.assign(&b + &b).unwrap();
        assert!(a.iter().all(|&x| x == 3.0));
    }

    #[test]
    fn test_try_assign_reports_mismatch() {
        let mut a = DenseArray::<f64, 2>::zeros([2, 3]).unwrap();
        let b = DenseArray::<f64, 2>::zeros([3, 2]).unwrap();
        assert_eq!(
            a.try_add_assign(&b).unwrap_err(),
            DenseError::ShapeMismatch(vec![2, 3], vec![3, 2])
        );
    }

    #[test]
    #[should_panic(expected = "shape mismatch")]
    fn test_operator_assign_panics_on_mismatch() {
        let mut a = DenseArray::<f64, 1>::zeros([3]).unwrap();
        let b = DenseArray::<f64, 1>::zeros([4]).unwrap();
        a += &b;
    }

    #[test]
    fn test_chained_operands_mismatch_at_evaluation() {
        let a = DenseArray::<f64, 1>::zeros([3]).unwrap();
        let b = DenseArray::<f64, 1>::zeros([4]).unwrap();
        let e = &a + &b;
        assert_eq!(
            DenseArray::from_expr(e).unwrap_err(),
            DenseError::ShapeMismatch(vec![3], vec![4])
        );
    }
}
