//! The contract consumed from the native storage engine.

use std::{fmt, num::NonZeroU64, sync::Arc};

use rockslice_common::Result;

use crate::pinned::PinnedBuffer;

/// Opaque reference token to a buffer allocated by a [`NativeEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(NonZeroU64);

impl NativeHandle {
    /// Wraps a raw engine token; zero is never a valid handle.
    pub fn from_raw(raw: u64) -> Option<NativeHandle> {
        NonZeroU64::new(raw).map(NativeHandle)
    }

    #[inline]
    pub fn as_raw(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Byte storage owned by the native engine.
///
/// The engine allocates buffers, hands out [`NativeHandle`]s for them and frees them on
/// request. Buffer contents never change after allocation.
///
/// Callers guarantee that `free` is invoked at most once per handle and that no other
/// method is invoked with a handle after it was freed; implementations report such
/// misuse as `UnknownHandle` rather than touching released memory.
pub trait NativeEngine: Send + Sync {
    /// Allocates a new buffer holding a copy of `bytes[offset..offset + len]`.
    ///
    /// Fails with `OffsetOutOfRange` if the range is not within `bytes`.
    fn allocate_copy(&self, bytes: &[u8], offset: usize, len: usize) -> Result<NativeHandle>;

    /// Allocates a new buffer holding the UTF-8 encoding of `text`.
    fn allocate_copy_from_text(&self, text: &str) -> Result<NativeHandle> {
        self.allocate_copy(text.as_bytes(), 0, text.len())
    }

    /// Releases the buffer and any auxiliary data kept for it.
    fn free(&self, handle: NativeHandle) -> Result<()>;

    /// Returns a shared, zero-copy view of the buffer contents.
    fn pin(&self, handle: NativeHandle) -> Result<PinnedBuffer>;

    /// Returns a copy of the buffer contents.
    fn read(&self, handle: NativeHandle) -> Result<Vec<u8>> {
        Ok(self.pin(handle)?.to_vec())
    }

    /// Returns the length of the buffer in bytes.
    fn len(&self, handle: NativeHandle) -> Result<usize> {
        Ok(self.pin(handle)?.len())
    }
}

/// Shared reference to an engine, as held by every slice bound to it.
pub type EngineRef = Arc<dyn NativeEngine>;
