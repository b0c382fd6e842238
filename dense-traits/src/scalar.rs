//! Storage bound for dense array elements.

/// Element types that can be stored in a dense array.
///
/// Any `bytemuck::Pod` type qualifies, which rules out references, pointers,
/// and types with padding or invalid bit patterns. All-zero bytes are a valid
/// value for every `Element`, so freshly allocated buffers can be zero-filled.
///
/// Only types that also implement [`LaneElement`](crate::LaneElement) take part
/// in fused arithmetic; other elements can be stored, indexed, sliced and mapped.
pub trait Element:
    bytemuck::Pod + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static
{
}

impl<T> Element for T where
    T: bytemuck::Pod + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static
{
}
