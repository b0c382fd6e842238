//! Shared traits for the dense-rs ecosystem.
//!
//! This crate provides the two bounds the array engine is written against:
//!
//! - [`Element`]: what may be *stored* in a dense array (fixed-size, copyable,
//!   plain-old-data).
//! - [`LaneElement`]: the vector-lane backend contract for element types that
//!   get the fused arithmetic path (`f32`, `f64`).
//!
//! External crates can depend on `dense-traits` to provide their own lane
//! backend for a target without orphan-rule violations.

pub mod lanes;
pub mod scalar;

pub use lanes::{LaneElement, Pack, ALIGNMENT, F32_LANES, F64_LANES};
pub use scalar::Element;
