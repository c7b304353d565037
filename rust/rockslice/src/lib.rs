//! Byte slices passed to and from a native storage engine.
//!
//! A slice references a buffer that is owned either by the slice itself or by the
//! engine, and callers do not need to know which. The [`AbstractSlice`] trait is the
//! common capability set; [`Slice`] hands out copies of its bytes and [`DirectSlice`]
//! hands out zero-copy pinned views.
//!
//! # Ownership and disposal
//!
//! Slices built by copying (`Slice::from_bytes`, `Slice::from_text`, ...) own their
//! buffer and free it exactly once, on `dispose()` or, by default, on drop. Slices
//! bound with [`Ownership::Viewing`], or disowned with `disown()`, never free.
//!
//! Components that keep using a buffer after handing a slice around take a
//! [`Lease`](rockslice_liveness::Lease) on it. Disposing an owning slice while leases
//! are outstanding fails with `PrematureDispose` instead of freeing memory that is
//! still in use.
//!
//! ```
//! use rockslice::{AbstractSlice, Slice, SliceContext};
//!
//! let ctx = SliceContext::heap();
//! let mut key = Slice::from_text(&ctx, "abc")?;
//! assert_eq!(key.size()?, 3);
//!
//! let lease = key.lease()?;
//! assert!(key.dispose().is_err());
//! drop(lease);
//! key.dispose()?;
//! assert!(key.data().is_err());
//! # Ok::<(), rockslice::Error>(())
//! ```

pub mod abstract_slice;
pub mod context;
pub mod direct_slice;
pub mod handle;
pub mod slice;

#[cfg(test)]
mod tests;

pub use abstract_slice::AbstractSlice;
pub use context::{DropPolicy, SliceContext, SliceOptions};
pub use direct_slice::DirectSlice;
pub use handle::{HandleState, Ownership, SliceHandle};
pub use slice::Slice;

pub use rockslice_common::{Result, error::Error, error::ErrorKind};
pub use rockslice_liveness::Lease;
pub use rockslice_native::{EngineRef, HeapEngine, NativeEngine, NativeHandle, PinnedBuffer};
