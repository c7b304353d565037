//! Aligned byte storage owned by the native engine.

use std::{alloc::Layout, ptr::NonNull};

use rockslice_common::{Result, error::Error, verify_arg};

/// An immutable, aligned heap allocation holding the bytes of one native buffer.
///
/// The storage is allocated in 64-byte blocks; the tail between `len` and `capacity`
/// is zero-filled. Empty buffers do not allocate.
pub struct NativeBuffer {
    /// Start of the allocation (dangling for empty buffers).
    ptr: NonNull<u8>,
    /// Number of meaningful bytes.
    len: usize,
    /// Allocated size, a multiple of `BLOCK_SIZE` (zero for empty buffers).
    capacity: usize,
    /// Alignment the allocation was requested with.
    alignment: usize,
}

impl NativeBuffer {
    /// Alignment used when the engine configuration does not request another one.
    pub const DEFAULT_ALIGNMENT: usize = 64;
    /// Allocation granularity.
    const BLOCK_SIZE: usize = 64;

    /// Creates an empty buffer.
    pub fn empty() -> NativeBuffer {
        NativeBuffer {
            ptr: NonNull::dangling(),
            len: 0,
            capacity: 0,
            alignment: 1,
        }
    }

    /// Allocates a new buffer with the given alignment and copies `data` into it.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `alignment` is not a power of two, `Allocation` if the
    /// allocator refuses the request.
    pub fn copy_from_slice(data: &[u8], alignment: usize) -> Result<NativeBuffer> {
        verify_arg!(alignment, alignment.is_power_of_two());
        if data.is_empty() {
            return Ok(NativeBuffer::empty());
        }

        let len = data.len();
        let capacity = len
            .checked_next_multiple_of(Self::BLOCK_SIZE)
            .ok_or_else(|| Error::allocation(len, "size overflow"))?;
        let layout = Layout::from_size_align(capacity, alignment)
            .map_err(|e| Error::allocation(len, e.to_string()))?;

        // SAFETY: `layout` has a non-zero size.
        let ptr = unsafe { std::alloc::alloc(layout) };
        let ptr = NonNull::new(ptr).ok_or_else(|| Error::allocation(len, "out of memory"))?;
        // SAFETY: the allocation is at least `capacity >= len` bytes long and cannot
        // overlap with the caller's slice.
        unsafe {
            ptr.as_ptr()
                .copy_from_nonoverlapping(data.as_ptr(), len);
            ptr.as_ptr().add(len).write_bytes(0, capacity - len);
        }

        Ok(NativeBuffer {
            ptr,
            len,
            capacity,
            alignment,
        })
    }

    /// Returns the number of bytes in the buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the buffer holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the allocated size in bytes, including the zero-filled tail.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the alignment of the allocation.
    #[inline]
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Returns the buffer contents.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: `ptr` is valid for `len` initialized bytes (or dangling with `len == 0`)
        // for the lifetime of `self`, and the contents are never mutated after creation.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for NativeBuffer {
    fn drop(&mut self) {
        if self.capacity != 0 {
            // SAFETY: the same layout was validated and used for the allocation.
            unsafe {
                let layout = Layout::from_size_align_unchecked(self.capacity, self.alignment);
                std::alloc::dealloc(self.ptr.as_ptr(), layout);
            }
        }
    }
}

// SAFETY: NativeBuffer exclusively owns its allocation and never mutates it after
// construction.
unsafe impl Send for NativeBuffer {}

// SAFETY: all access through a shared reference is read-only.
unsafe impl Sync for NativeBuffer {}

impl std::ops::Deref for NativeBuffer {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl AsRef<[u8]> for NativeBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Default for NativeBuffer {
    fn default() -> Self {
        NativeBuffer::empty()
    }
}

impl std::fmt::Debug for NativeBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeBuffer")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .field("alignment", &self.alignment)
            .finish()
    }
}
