//! Native buffers and the storage-engine contract consumed by slices.
//!
//! # Modules
//!
//! - [`engine`]: the [`NativeEngine`] trait and [`NativeHandle`] tokens
//! - [`buffer`]: aligned, immutable byte storage
//! - [`pinned`]: shared zero-copy views of a buffer
//! - [`heap`]: an in-process engine keeping buffers on the heap
//! - [`config`]: heap engine configuration

pub mod buffer;
pub mod config;
pub mod engine;
pub mod heap;
pub mod pinned;

pub use buffer::NativeBuffer;
pub use config::HeapEngineConfig;
pub use engine::{EngineRef, NativeEngine, NativeHandle};
pub use heap::{HeapEngine, HeapEngineStats};
pub use pinned::PinnedBuffer;
