//! An engine wrapper that observes the calls made by the slice layer.

use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use rockslice_common::{Result, error::Error};
use rockslice_native::{EngineRef, HeapEngine, NativeEngine, NativeHandle, PinnedBuffer};

/// A [`NativeEngine`] that forwards to a [`HeapEngine`] and records every call.
///
/// `free` calls are counted per handle *before* being forwarded, so a double free
/// issued by the code under test shows up as a count of two even though the inner
/// engine rejects the second call.
#[derive(Default)]
pub struct SpyEngine {
    inner: HeapEngine,
    frees: Mutex<ahash::HashMap<NativeHandle, u64>>,
    allocations: AtomicU64,
    reads: AtomicU64,
    fail_frees: AtomicBool,
}

impl SpyEngine {
    pub fn new() -> SpyEngine {
        SpyEngine::default()
    }

    /// Creates a spy and returns it together with the same engine as an [`EngineRef`].
    pub fn shared() -> (Arc<SpyEngine>, EngineRef) {
        let spy = Arc::new(SpyEngine::new());
        let engine: EngineRef = spy.clone();
        (spy, engine)
    }

    /// Number of `free` calls issued for `handle`.
    pub fn free_count(&self, handle: NativeHandle) -> u64 {
        self.frees
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle)
            .copied()
            .unwrap_or(0)
    }

    /// Total number of `free` calls issued.
    pub fn total_frees(&self) -> u64 {
        self.frees
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .sum()
    }

    /// Total number of successful allocations.
    pub fn total_allocations(&self) -> u64 {
        self.allocations.load(Ordering::Relaxed)
    }

    /// Total number of `read`/`pin` calls.
    pub fn total_reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of buffers currently allocated in the inner engine.
    pub fn live_buffers(&self) -> usize {
        self.inner.live_buffers()
    }

    /// Returns `true` if `handle` is still allocated in the inner engine.
    pub fn is_live(&self, handle: NativeHandle) -> bool {
        self.inner.contains(handle)
    }

    /// Makes subsequent `free` calls fail (after being recorded) without releasing
    /// anything.
    pub fn set_fail_frees(&self, fail: bool) {
        self.fail_frees.store(fail, Ordering::Relaxed);
    }

    /// Allocates a buffer directly in the engine, the way the engine itself would
    /// before handing a value out to the slice layer.
    pub fn engine_owned(&self, bytes: &[u8]) -> Result<NativeHandle> {
        self.inner.allocate_copy(bytes, 0, bytes.len())
    }

    fn record_allocation(&self, handle: Result<NativeHandle>) -> Result<NativeHandle> {
        if handle.is_ok() {
            self.allocations.fetch_add(1, Ordering::Relaxed);
        }
        handle
    }
}

impl NativeEngine for SpyEngine {
    fn allocate_copy(&self, bytes: &[u8], offset: usize, len: usize) -> Result<NativeHandle> {
        self.record_allocation(self.inner.allocate_copy(bytes, offset, len))
    }

    fn allocate_copy_from_text(&self, text: &str) -> Result<NativeHandle> {
        self.record_allocation(self.inner.allocate_copy_from_text(text))
    }

    fn free(&self, handle: NativeHandle) -> Result<()> {
        *self
            .frees
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(handle)
            .or_default() += 1;
        if self.fail_frees.load(Ordering::Relaxed) {
            return Err(Error::invalid_operation("free (injected failure)"));
        }
        self.inner.free(handle)
    }

    fn pin(&self, handle: NativeHandle) -> Result<PinnedBuffer> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.inner.pin(handle)
    }

    fn read(&self, handle: NativeHandle) -> Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.inner.read(handle)
    }

    fn len(&self, handle: NativeHandle) -> Result<usize> {
        self.inner.len(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_frees_per_handle() {
        let spy = SpyEngine::new();
        let h = spy.allocate_copy(b"abc", 0, 3).unwrap();
        assert_eq!(spy.total_allocations(), 1);
        spy.free(h).unwrap();
        assert!(spy.free(h).is_err());
        assert_eq!(spy.free_count(h), 2);
        assert_eq!(spy.total_frees(), 2);
        assert!(!spy.is_live(h));
    }

    #[test]
    fn test_injected_free_failure() {
        let spy = SpyEngine::new();
        let h = spy.allocate_copy(b"abc", 0, 3).unwrap();
        spy.set_fail_frees(true);
        assert!(spy.free(h).is_err());
        assert!(spy.is_live(h));
        spy.set_fail_frees(false);
        spy.free(h).unwrap();
        assert_eq!(spy.free_count(h), 2);
    }

    #[test]
    fn test_engine_owned_is_not_counted() {
        let spy = SpyEngine::new();
        let h = spy.engine_owned(b"xyz").unwrap();
        assert_eq!(spy.total_allocations(), 0);
        assert_eq!(spy.read(h).unwrap(), b"xyz");
        assert_eq!(spy.total_reads(), 1);
    }
}
