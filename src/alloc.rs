//! Lane-aligned element buffers.
//!
//! [`AlignedBuf`] owns `len` elements whose first address is a multiple of
//! [`ALIGNMENT`] (or of `align_of::<T>()` if that is larger). The element count
//! seen by callers is exactly the requested one; no padding is exposed.

use std::alloc::{self, Layout};
use std::ptr::NonNull;

use dense_traits::{Element, ALIGNMENT};

use crate::{DenseError, Result};

/// Owning, aligned, fixed-length buffer of `T`.
pub struct AlignedBuf<T: Element> {
    ptr: NonNull<T>,
    len: usize,
}

// The buffer uniquely owns its allocation, like `Box<[T]>`.
unsafe impl<T: Element> Send for AlignedBuf<T> {}
unsafe impl<T: Element> Sync for AlignedBuf<T> {}

/// Byte alignment used for buffers of `T`.
#[inline]
pub(crate) fn alignment_of<T>() -> usize {
    ALIGNMENT.max(std::mem::align_of::<T>())
}

/// Allocation layout for `len` elements, with the size computed by checked math.
fn layout_for<T>(len: usize) -> Result<Layout> {
    let oom = || DenseError::OutOfMemory {
        elements: len,
        element_size: std::mem::size_of::<T>(),
    };
    let size = len.checked_mul(std::mem::size_of::<T>()).ok_or_else(oom)?;
    Layout::from_size_align(size, alignment_of::<T>()).map_err(|_| oom())
}

impl<T: Element> AlignedBuf<T> {
    /// An empty buffer. Does not allocate.
    pub const fn empty() -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
        }
    }

    /// Allocate `len` zero-filled elements.
    ///
    /// # Errors
    /// [`DenseError::OutOfMemory`] if the byte size overflows or the system
    /// allocator fails.
    pub fn zeroed(len: usize) -> Result<Self> {
        let layout = layout_for::<T>(len)?;
        if layout.size() == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                len,
            });
        }
        // SAFETY: non-zero size; every `Element` is valid when all bytes are zero.
        let raw = unsafe { alloc::alloc_zeroed(layout) };
        let ptr = NonNull::new(raw.cast::<T>()).ok_or(DenseError::OutOfMemory {
            elements: len,
            element_size: std::mem::size_of::<T>(),
        })?;
        trace!(
            "alloc {} x {}B aligned to {} at {:p}",
            len,
            std::mem::size_of::<T>(),
            layout.align(),
            raw
        );
        Ok(Self { ptr, len })
    }

    /// Allocate `len` elements set to `value`.
    pub fn filled(len: usize, value: T) -> Result<Self> {
        let mut buf = Self::zeroed(len)?;
        buf.as_mut_slice().fill(value);
        Ok(buf)
    }

    /// Allocate a copy of `src`.
    pub fn from_slice(src: &[T]) -> Result<Self> {
        let mut buf = Self::zeroed(src.len())?;
        buf.as_mut_slice().copy_from_slice(src);
        Ok(buf)
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: `ptr` is valid for `len` initialized elements (or dangling with len 0
        // or a zero-sized T).
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as above, and `&mut self` guarantees uniqueness.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Element> Drop for AlignedBuf<T> {
    fn drop(&mut self) {
        let size = self.len * std::mem::size_of::<T>();
        if size == 0 {
            return;
        }
        // SAFETY: the same layout succeeded in `zeroed`, so it is valid here.
        unsafe {
            let layout = Layout::from_size_align_unchecked(size, alignment_of::<T>());
            alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), layout);
        }
    }
}

impl<T: Element> Clone for AlignedBuf<T> {
    fn clone(&self) -> Self {
        match Self::from_slice(self.as_slice()) {
            Ok(buf) => buf,
            Err(_) => {
                // Clone cannot report failure; abort like the standard collections.
                let size = self.len * std::mem::size_of::<T>();
                let layout = Layout::from_size_align(size, alignment_of::<T>())
                    .unwrap_or_else(|_| Layout::new::<T>());
                alloc::handle_alloc_error(layout)
            }
        }
    }
}

impl<T: Element> Default for AlignedBuf<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Element> std::fmt::Debug for AlignedBuf<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}
