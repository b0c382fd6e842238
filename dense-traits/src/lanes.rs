//! Vector-lane backend contract.
//!
//! The fused evaluator in `dense-rs` never issues target instructions itself.
//! It only talks to the [`LaneElement`] contract: load/store a full lane,
//! load/store a partial lane (the tail), broadcast a scalar, and the four
//! arithmetic operations. The lane width and byte alignment are compile-time
//! constants, so backend selection is a build-time decision and the evaluator
//! monomorphizes against it with no runtime dispatch.
//!
//! The backend shipped here is portable: a lane is a fixed-size array
//! ([`Pack`]) and every operation is a per-lane loop that LLVM turns into
//! vector instructions. When `dense-rs` is built with its `simd` feature, the
//! loops run inside `pulp`'s target-feature dispatch, which is what lets the
//! compiler pick wide registers for them.
//!
//! # Alignment
//!
//! [`ALIGNMENT`] is 64 bytes when the build enables AVX-512 and 32 bytes
//! otherwise. A lane always spans exactly `ALIGNMENT` bytes.

use crate::scalar::Element;

/// Byte alignment of every buffer allocated by the array engine.
#[cfg(target_feature = "avx512f")]
pub const ALIGNMENT: usize = 64;

/// Byte alignment of every buffer allocated by the array engine.
#[cfg(not(target_feature = "avx512f"))]
pub const ALIGNMENT: usize = 32;

/// Lane width for `f32`.
pub const F32_LANES: usize = ALIGNMENT / std::mem::size_of::<f32>();

/// Lane width for `f64`.
pub const F64_LANES: usize = ALIGNMENT / std::mem::size_of::<f64>();

/// Backend contract for element types with a vector fast path.
///
/// # Safety
///
/// Implementations must uphold:
/// - `LANES * size_of::<Self>() == ALIGN`, and `ALIGN` is a power of two.
/// - `load`/`store` only touch `LANES` consecutive elements starting at `ptr`.
/// - `masked_load`/`masked_store` only touch the first `count` elements
///   starting at `ptr`; `masked_load` fills the remaining lanes with zero.
/// - arithmetic is lane-wise: lane `k` of the result depends only on lane `k`
///   of the inputs.
pub unsafe trait LaneElement: Element + num_traits::Float {
    /// One vector register worth of elements.
    type Lane: Copy;

    /// Number of elements per lane.
    const LANES: usize;

    /// Byte alignment required by [`load`](Self::load) and [`store`](Self::store).
    const ALIGN: usize;

    /// Load a full lane from an `ALIGN`-aligned address.
    ///
    /// # Safety
    /// `ptr` must be aligned to `ALIGN` and valid for reading `LANES` elements.
    unsafe fn load(ptr: *const Self) -> Self::Lane;

    /// Load a full lane from any address.
    ///
    /// # Safety
    /// `ptr` must be valid for reading `LANES` elements.
    unsafe fn loadu(ptr: *const Self) -> Self::Lane;

    /// Store a full lane to an `ALIGN`-aligned address.
    ///
    /// # Safety
    /// `ptr` must be aligned to `ALIGN` and valid for writing `LANES` elements.
    unsafe fn store(ptr: *mut Self, value: Self::Lane);

    /// Store a full lane to any address.
    ///
    /// # Safety
    /// `ptr` must be valid for writing `LANES` elements.
    unsafe fn storeu(ptr: *mut Self, value: Self::Lane);

    /// Load the first `count` elements; the other lanes are zero.
    ///
    /// # Safety
    /// `count <= LANES` and `ptr` must be valid for reading `count` elements.
    unsafe fn masked_load(ptr: *const Self, count: usize) -> Self::Lane;

    /// Store the first `count` lanes of `value`.
    ///
    /// # Safety
    /// `count <= LANES` and `ptr` must be valid for writing `count` elements.
    unsafe fn masked_store(ptr: *mut Self, value: Self::Lane, count: usize);

    /// Broadcast a scalar into every lane.
    fn splat(value: Self) -> Self::Lane;

    fn add(a: Self::Lane, b: Self::Lane) -> Self::Lane;
    fn sub(a: Self::Lane, b: Self::Lane) -> Self::Lane;
    fn mul(a: Self::Lane, b: Self::Lane) -> Self::Lane;
    fn div(a: Self::Lane, b: Self::Lane) -> Self::Lane;

    /// Horizontal sum of all lanes.
    fn reduce_add(value: Self::Lane) -> Self;
}

/// Portable lane: `W` elements processed together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pack<T, const W: usize>(pub [T; W]);

macro_rules! impl_portable_lanes {
    ($t:ty, $w:expr) => {
        unsafe impl LaneElement for $t {
            type Lane = Pack<$t, { $w }>;

            const LANES: usize = $w;
            const ALIGN: usize = ALIGNMENT;

            #[inline(always)]
            unsafe fn load(ptr: *const $t) -> Self::Lane {
                debug_assert_eq!(ptr as usize % ALIGNMENT, 0, "unaligned lane load");
                Pack(ptr.cast::<[$t; $w]>().read())
            }

            #[inline(always)]
            unsafe fn loadu(ptr: *const $t) -> Self::Lane {
                Pack(ptr.cast::<[$t; $w]>().read_unaligned())
            }

            #[inline(always)]
            unsafe fn store(ptr: *mut $t, value: Self::Lane) {
                debug_assert_eq!(ptr as usize % ALIGNMENT, 0, "unaligned lane store");
                ptr.cast::<[$t; $w]>().write(value.0)
            }

            #[inline(always)]
            unsafe fn storeu(ptr: *mut $t, value: Self::Lane) {
                ptr.cast::<[$t; $w]>().write_unaligned(value.0)
            }

            #[inline(always)]
            unsafe fn masked_load(ptr: *const $t, count: usize) -> Self::Lane {
                debug_assert!(count <= $w);
                let mut out = [0.0; $w];
                std::ptr::copy_nonoverlapping(ptr, out.as_mut_ptr(), count);
                Pack(out)
            }

            #[inline(always)]
            unsafe fn masked_store(ptr: *mut $t, value: Self::Lane, count: usize) {
                debug_assert!(count <= $w);
                std::ptr::copy_nonoverlapping(value.0.as_ptr(), ptr, count);
            }

            #[inline(always)]
            fn splat(value: $t) -> Self::Lane {
                Pack([value; $w])
            }

            #[inline(always)]
            fn add(a: Self::Lane, b: Self::Lane) -> Self::Lane {
                Pack(std::array::from_fn(|k| a.0[k] + b.0[k]))
            }

            #[inline(always)]
            fn sub(a: Self::Lane, b: Self::Lane) -> Self::Lane {
                Pack(std::array::from_fn(|k| a.0[k] - b.0[k]))
            }

            #[inline(always)]
            fn mul(a: Self::Lane, b: Self::Lane) -> Self::Lane {
                Pack(std::array::from_fn(|k| a.0[k] * b.0[k]))
            }

            #[inline(always)]
            fn div(a: Self::Lane, b: Self::Lane) -> Self::Lane {
                Pack(std::array::from_fn(|k| a.0[k] / b.0[k]))
            }

            #[inline(always)]
            fn reduce_add(value: Self::Lane) -> $t {
                // Pairwise, so lane order matches a tree reduction on real hardware.
                let mut v = value.0;
                let mut width = $w;
                while width > 1 {
                    width /= 2;
                    for k in 0..width {
                        v[k] += v[k + width];
                    }
                }
                v[0]
            }
        }
    };
}

impl_portable_lanes!(f32, F32_LANES);
impl_portable_lanes!(f64, F64_LANES);
