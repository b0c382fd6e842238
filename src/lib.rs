//! Dense fixed-rank numeric arrays with fused elementwise expressions.
//!
//! This crate provides an owning, memory-aligned N-dimensional array, borrowed
//! contiguous views into it, and a lazy expression layer that evaluates chains
//! of elementwise arithmetic in a single lane-wide pass with no intermediate
//! arrays.
//!
//! # Core Types
//!
//! - [`DenseArray`]: Owning array over an aligned buffer, rank fixed at compile time
//! - [`ArrayView`] / [`ArrayViewMut`]: Borrowed contiguous sub-regions of an array
//! - [`Shape`] / [`Layout`]: Extents, derived strides, and memory order
//! - [`SliceSpec`]: Per-dimension slice specification ([`range`], [`full`], [`idx`])
//! - [`Expr`]: Unevaluated elementwise expression over arrays, views and scalars
//!
//! # Slicing
//!
//! Ranges are **closed** intervals and negative positions count from the end.
//! Integer indices drop their dimension; ranges keep it. Only contiguous regions
//! can be viewed; anything else is rejected with
//! [`DenseError::NonContiguousSlice`].
//!
//! ```rust
//! use dense_rs::{full, range, ArrayView, DenseArray, Layout};
//!
//! let a = DenseArray::from_vec([3, 3], Layout::RowMajor, (1..=9).map(f64::from).collect())
//!     .unwrap();
//!
//! let row: ArrayView<'_, f64, 1> = a.view([1.into(), full()]).unwrap();
//! assert_eq!(row.as_slice(), &[4.0, 5.0, 6.0]);
//!
//! let tail: ArrayView<'_, f64, 1> = a.view([1.into(), range(1, -1)]).unwrap();
//! assert_eq!(tail.as_slice(), &[5.0, 6.0]);
//! ```
//!
//! # Fused Expressions
//!
//! Arithmetic operators on `&DenseArray`, views and scalars build an [`Expr`]
//! without touching memory. Assigning it evaluates the whole tree once per lane.
//!
//! ```rust
//! use dense_rs::DenseArray;
//!
//! let a = DenseArray::<f64, 2>::filled([3, 5], 0.1).unwrap();
//! let result = DenseArray::from_expr((&a + 0.1) * 2.0).unwrap();
//! assert!(result.iter().all(|&x| (x - 0.4).abs() < 1e-12));
//! ```
//!
//! # Features
//!
//! - `simd` (default): run evaluation loops under `pulp`'s target-feature dispatch.
//!
//! Setting `DENSE_TRACE=1` prints allocation and evaluation traces to stderr.

#[macro_use]
mod macros;

mod alloc;
mod array;
mod eval;
mod expr;
pub mod math;
pub mod op;
mod ops;
mod reduce;
mod shape;
mod simd;
mod slice;
mod view;

pub use dense_traits::{Element, LaneElement, ALIGNMENT};

pub use crate::alloc::AlignedBuf;
pub use crate::array::DenseArray;
pub use crate::expr::{Binary, Expr, Expression, IntoExpr, Leaf, Negate, Scalar};
pub use crate::reduce::{dot, sum};
pub use crate::shape::{compute_strides, Layout, Shape};
pub use crate::slice::{full, idx, range, SliceSpec};
pub use crate::view::{ArrayView, ArrayViewMut, Contiguous, ContiguousMut};

// ============================================================================
// Error types
// ============================================================================

/// Errors that can occur during dense array operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DenseError {
    /// The allocator returned null, or the byte size overflowed `isize`.
    #[error("out of memory: cannot allocate {elements} elements of {element_size} bytes")]
    OutOfMemory { elements: usize, element_size: usize },

    /// A constructor was given a rejected extent (zero).
    #[error("invalid shape {0:?}: every extent must be at least 1")]
    InvalidShape(Vec<usize>),

    /// Checked element access with an index past the extent.
    #[error("index {index} out of range for dim {dim} with extent {extent}")]
    IndexOutOfRange {
        dim: usize,
        index: usize,
        extent: usize,
    },

    /// A normalized slice bound falls outside `[0, extent)`.
    #[error("slice {start}..={end} out of range for dim {dim} with extent {extent}")]
    SliceOutOfRange {
        dim: usize,
        start: isize,
        end: isize,
        extent: usize,
    },

    /// A slice whose normalized start lies past its end.
    #[error("invalid slice {start}..={end} for dim {dim}: start > end")]
    InvalidSlice { dim: usize, start: isize, end: isize },

    /// The requested region does not occupy consecutive buffer positions.
    #[error("slice is not contiguous: dim {dim} selects more than one element")]
    NonContiguousSlice { dim: usize },

    /// Ranks do not match (got vs expected).
    #[error("rank mismatch: {0} vs {1}")]
    RankMismatch(usize, usize),

    /// Two non-scalar operands have different extents.
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// Two same-shape operands use different memory layouts.
    #[error("layout mismatch: {0:?} vs {1:?}")]
    LayoutMismatch(Layout, Layout),

    /// An expression made only of scalars has no extents to materialize.
    #[error("expression has no array operand and therefore no shape")]
    UnsizedExpression,
}

/// Result type for dense array operations.
pub type Result<T> = std::result::Result<T, DenseError>;

/// Whether `DENSE_TRACE=1` is set. Read once per process.
pub(crate) fn trace_enabled() -> bool {
    static ENABLED: std::sync::OnceLock<bool> = std::sync::OnceLock::new();
    *ENABLED.get_or_init(|| matches!(std::env::var("DENSE_TRACE"), Ok(ref v) if v == "1"))
}
