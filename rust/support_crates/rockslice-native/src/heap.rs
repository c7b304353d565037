//! In-process reference implementation of [`NativeEngine`].

use std::sync::{
    Arc, PoisonError, RwLock,
    atomic::{AtomicU64, Ordering},
};

use rockslice_common::{Result, error::Error};

use crate::{
    buffer::NativeBuffer,
    config::HeapEngineConfig,
    engine::{EngineRef, NativeEngine, NativeHandle},
    pinned::PinnedBuffer,
};

/// A [`NativeEngine`] keeping its buffers on the process heap.
///
/// Buffers live in a handle-keyed table protected by a read-write lock: reads pin a
/// buffer under the shared lock, allocation and release take the exclusive lock.
/// Handles are never reused, so a stale handle is always reported as unknown.
pub struct HeapEngine {
    config: HeapEngineConfig,
    buffers: RwLock<ahash::HashMap<NativeHandle, Arc<NativeBuffer>>>,
    next_handle: AtomicU64,
    allocations: AtomicU64,
    frees: AtomicU64,
    live_bytes: AtomicU64,
}

/// Point-in-time allocation statistics of a [`HeapEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeapEngineStats {
    /// Total number of successful allocations.
    pub allocations: u64,
    /// Total number of successful frees.
    pub frees: u64,
    /// Number of buffers currently allocated.
    pub live_buffers: usize,
    /// Number of payload bytes currently allocated.
    pub live_bytes: u64,
}

impl HeapEngine {
    /// Creates an engine with the default configuration.
    pub fn new() -> HeapEngine {
        Self::make(HeapEngineConfig::default())
    }

    /// Creates an engine with the given configuration.
    ///
    /// Returns an `InvalidArgument` error if the configuration does not validate.
    pub fn with_config(config: HeapEngineConfig) -> Result<HeapEngine> {
        config.validate()?;
        Ok(Self::make(config))
    }

    /// Wraps the engine into a shared [`EngineRef`].
    pub fn into_ref(self) -> EngineRef {
        Arc::new(self)
    }

    pub fn config(&self) -> &HeapEngineConfig {
        &self.config
    }

    /// Returns `true` if `handle` refers to a live buffer.
    pub fn contains(&self, handle: NativeHandle) -> bool {
        self.buffers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&handle)
    }

    /// Returns the number of buffers currently allocated.
    pub fn live_buffers(&self) -> usize {
        self.buffers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns allocation statistics (possibly stale in a concurrent environment).
    pub fn stats(&self) -> HeapEngineStats {
        HeapEngineStats {
            allocations: self.allocations.load(Ordering::Relaxed),
            frees: self.frees.load(Ordering::Relaxed),
            live_buffers: self.live_buffers(),
            live_bytes: self.live_bytes.load(Ordering::Relaxed),
        }
    }
}

impl HeapEngine {
    fn make(config: HeapEngineConfig) -> HeapEngine {
        log::debug!(
            "heap engine created: alignment={}, max_buffer_size={}",
            config.alignment,
            config.max_buffer_size
        );
        HeapEngine {
            config,
            buffers: RwLock::new(ahash::HashMap::default()),
            next_handle: AtomicU64::new(1),
            allocations: AtomicU64::new(0),
            frees: AtomicU64::new(0),
            live_bytes: AtomicU64::new(0),
        }
    }

    fn get(&self, handle: NativeHandle) -> Result<Arc<NativeBuffer>> {
        self.buffers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle)
            .cloned()
            .ok_or_else(|| Error::unknown_handle(handle.as_raw()))
    }

    fn insert(&self, buffer: NativeBuffer) -> Result<NativeHandle> {
        let raw = self.next_handle.fetch_add(1, Ordering::Relaxed);
        let handle = NativeHandle::from_raw(raw)
            .ok_or_else(|| Error::allocation(buffer.len(), "native handle space exhausted"))?;
        let len = buffer.len();
        self.buffers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, Arc::new(buffer));
        self.allocations.fetch_add(1, Ordering::Relaxed);
        self.live_bytes.fetch_add(len as u64, Ordering::Relaxed);
        log::trace!("allocated native buffer {handle} ({len} bytes)");
        Ok(handle)
    }
}

impl NativeEngine for HeapEngine {
    fn allocate_copy(&self, bytes: &[u8], offset: usize, len: usize) -> Result<NativeHandle> {
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= bytes.len())
            .ok_or_else(|| Error::offset_out_of_range(offset, bytes.len()))?;
        if len > self.config.max_buffer_size {
            return Err(Error::allocation(
                len,
                format!("exceeds max_buffer_size {}", self.config.max_buffer_size),
            ));
        }
        let buffer = NativeBuffer::copy_from_slice(&bytes[offset..end], self.config.alignment)?;
        self.insert(buffer)
    }

    fn free(&self, handle: NativeHandle) -> Result<()> {
        let buffer = self
            .buffers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle)
            .ok_or_else(|| Error::unknown_handle(handle.as_raw()))?;
        self.frees.fetch_add(1, Ordering::Relaxed);
        self.live_bytes
            .fetch_sub(buffer.len() as u64, Ordering::Relaxed);
        log::trace!("freed native buffer {handle} ({} bytes)", buffer.len());
        Ok(())
    }

    fn pin(&self, handle: NativeHandle) -> Result<PinnedBuffer> {
        self.get(handle).map(PinnedBuffer::new)
    }

    fn len(&self, handle: NativeHandle) -> Result<usize> {
        self.get(handle).map(|buffer| buffer.len())
    }
}

impl Default for HeapEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HeapEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeapEngine")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
