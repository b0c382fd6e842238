//! Elementwise math functions.
//!
//! These are not fused into expressions. Each one reads its source once and
//! returns a new owned [`DenseArray`] with the same extents and layout,
//! computed element by element with the `num_traits::Float` scalar function.
//!
//! ```rust
//! use dense_rs::{math, DenseArray};
//!
//! let a = DenseArray::<f64, 2>::filled([2, 2], 4.0).unwrap();
//! let r = math::sqrt(&a).unwrap();
//! assert!(r.iter().all(|&x| x == 2.0));
//! assert_eq!(a.sqrt().unwrap(), r);
//! ```

use num_traits::Float;

use crate::alloc::AlignedBuf;
use crate::array::DenseArray;
use crate::view::Contiguous;
use crate::{Element, Result};

/// Apply `f` to every element of `src`, in memory order.
pub fn map<T, U, const N: usize, C>(src: &C, mut f: impl FnMut(T) -> U) -> Result<DenseArray<U, N>>
where
    T: Element,
    U: Element,
    C: Contiguous<T, N> + ?Sized,
{
    let data = src.as_slice();
    let mut buf = AlignedBuf::<U>::zeroed(data.len())?;
    for (out, &x) in buf.as_mut_slice().iter_mut().zip(data) {
        *out = f(x);
    }
    Ok(DenseArray::from_parts(buf, *src.shape()))
}

macro_rules! unary_functions {
    ($($(#[$doc:meta])* $name:ident => $f:ident;)*) => {$(
        $(#[$doc])*
        pub fn $name<T, const N: usize, C>(src: &C) -> Result<DenseArray<T, N>>
        where
            T: Element + Float,
            C: Contiguous<T, N> + ?Sized,
        {
            map(src, <T as Float>::$f)
        }
    )*};
}

unary_functions! {
    /// Sine (radians).
    sin => sin;
    /// Cosine (radians).
    cos => cos;
    /// Tangent (radians).
    tan => tan;
    asin => asin;
    acos => acos;
    atan => atan;
    sinh => sinh;
    cosh => cosh;
    tanh => tanh;
    /// `e^x`.
    exp => exp;
    /// Natural logarithm.
    ln => ln;
    /// Natural logarithm, same as [`ln`].
    log => ln;
    log2 => log2;
    log10 => log10;
    sqrt => sqrt;
    cbrt => cbrt;
    abs => abs;
    floor => floor;
    ceil => ceil;
    /// Round half away from zero.
    round => round;
}

/// `x^exponent` for a floating-point exponent.
pub fn powf<T, const N: usize, C>(src: &C, exponent: T) -> Result<DenseArray<T, N>>
where
    T: Element + Float,
    C: Contiguous<T, N> + ?Sized,
{
    map(src, |x: T| x.powf(exponent))
}

/// Same as [`powf`].
pub fn pow<T, const N: usize, C>(src: &C, exponent: T) -> Result<DenseArray<T, N>>
where
    T: Element + Float,
    C: Contiguous<T, N> + ?Sized,
{
    powf(src, exponent)
}

/// `x^exponent` for an integer exponent.
pub fn powi<T, const N: usize, C>(src: &C, exponent: i32) -> Result<DenseArray<T, N>>
where
    T: Element + Float,
    C: Contiguous<T, N> + ?Sized,
{
    map(src, |x: T| x.powi(exponent))
}
