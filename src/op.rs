//! Binary operator tags.
//!
//! Each tag is a zero-sized type naming one elementwise operation. Expression
//! nodes and compound assignment are generic over the tag, so the operation is
//! resolved at compile time and inlined into the lane loop.

use crate::LaneElement;

/// An elementwise binary operation with a scalar form and a lane form.
pub trait BinaryOp<T: LaneElement>: Copy + Default + Send + Sync + 'static {
    /// Operator symbol, for traces and debug output.
    const SYMBOL: char;

    fn apply(a: T, b: T) -> T;

    fn apply_lane(a: T::Lane, b: T::Lane) -> T::Lane;
}

/// `a + b`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Add;

/// `a - b`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sub;

/// `a * b`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mul;

/// `a / b`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Div;

macro_rules! impl_binary_op {
    ($tag:ident, $symbol:literal, $op:tt, $lane:ident) => {
        impl<T: LaneElement> BinaryOp<T> for $tag {
            const SYMBOL: char = $symbol;

            #[inline(always)]
            fn apply(a: T, b: T) -> T {
                a $op b
            }

            #[inline(always)]
            fn apply_lane(a: T::Lane, b: T::Lane) -> T::Lane {
                <T as LaneElement>::$lane(a, b)
            }
        }
    };
}

impl_binary_op!(Add, '+', +, add);
impl_binary_op!(Sub, '-', -, sub);
impl_binary_op!(Mul, '*', *, mul);
impl_binary_op!(Div, '/', /, div);

#[cfg(test)]
mod tests {
    use super::*;

    fn both<Op: BinaryOp<f64>>(a: f64, b: f64) -> (f64, f64) {
        let lane = Op::apply_lane(f64::splat(a), f64::splat(b));
        (Op::apply(a, b), lane.0[0])
    }

    #[test]
    fn test_scalar_and_lane_forms_agree() {
        assert_eq!(both::<Add>(6.0, 3.0), (9.0, 9.0));
        assert_eq!(both::<Sub>(6.0, 3.0), (3.0, 3.0));
        assert_eq!(both::<Mul>(6.0, 3.0), (18.0, 18.0));
        assert_eq!(both::<Div>(6.0, 3.0), (2.0, 2.0));
    }

    #[test]
    fn test_symbols() {
        assert_eq!(<Add as BinaryOp<f32>>::SYMBOL, '+');
        assert_eq!(<Div as BinaryOp<f32>>::SYMBOL, '/');
    }
}
