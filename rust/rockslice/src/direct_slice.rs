//! Zero-copy slices.

use rockslice_common::{Result, error::Error};
use rockslice_liveness::Liveness;
use rockslice_native::{NativeHandle, PinnedBuffer};

use crate::{
    abstract_slice::AbstractSlice,
    context::SliceContext,
    handle::{Ownership, SliceHandle},
};

/// A slice whose `data()` returns a pinned view of the native buffer instead of a copy.
///
/// A prefix can be dropped from the visible range with [`remove_prefix`]; the buffer
/// itself is left untouched, and rebinding or clearing the slice resets the prefix.
///
/// [`remove_prefix`]: DirectSlice::remove_prefix
pub struct DirectSlice {
    handle: SliceHandle,
    /// Leading bytes hidden from the binding they were removed on.
    prefix: Option<Prefix>,
}

struct Prefix {
    /// Token of the binding the prefix was removed on.
    binding: Liveness,
    len: usize,
}

impl DirectSlice {
    /// Creates an unbound slice that does not own anything; see [`crate::Slice::unowned`].
    pub fn unowned(ctx: &SliceContext) -> DirectSlice {
        DirectSlice {
            handle: SliceHandle::unowned(ctx),
            prefix: None,
        }
    }

    /// Creates a slice owning a fresh copy of `bytes`.
    pub fn copy_from(ctx: &SliceContext, bytes: &[u8]) -> Result<DirectSlice> {
        let handle = ctx.engine().allocate_copy(bytes, 0, bytes.len())?;
        Ok(DirectSlice {
            handle: SliceHandle::owning(ctx, handle, bytes.len()),
            prefix: None,
        })
    }

    /// Creates a slice viewing a buffer the engine keeps ownership of.
    pub fn viewing(ctx: &SliceContext, handle: NativeHandle) -> Result<DirectSlice> {
        let mut slice = DirectSlice::unowned(ctx);
        slice.handle.set_handle(handle, Ownership::Viewing)?;
        Ok(slice)
    }

    /// Hides the first `n` bytes of the slice.
    ///
    /// Fails with `OffsetOutOfRange` if `n` exceeds the current size.
    pub fn remove_prefix(&mut self, n: usize) -> Result<()> {
        let size = self.size()?;
        if n > size {
            return Err(Error::offset_out_of_range(n, size));
        }
        let len = self.prefix_len() + n;
        self.prefix = self.handle.liveness().map(|binding| Prefix {
            binding: binding.clone(),
            len,
        });
        Ok(())
    }

    /// Number of hidden leading bytes. A prefix removed on an earlier binding does
    /// not apply, even if the handle was rebound through `handle_mut()`.
    fn prefix_len(&self) -> usize {
        match (&self.prefix, self.handle.liveness()) {
            (Some(prefix), Some(binding)) if prefix.binding.same_as(binding) => prefix.len,
            _ => 0,
        }
    }
}

impl AbstractSlice for DirectSlice {
    type Data = PinnedBuffer;

    fn handle(&self) -> &SliceHandle {
        &self.handle
    }

    fn handle_mut(&mut self) -> &mut SliceHandle {
        &mut self.handle
    }

    fn data(&self) -> Result<PinnedBuffer> {
        self.pin_for("data")
    }

    fn pin_for(&self, operation: &'static str) -> Result<PinnedBuffer> {
        self.handle.pin_for(operation)?.skip(self.prefix_len())
    }

    fn size(&self) -> Result<usize> {
        let len = self.handle.len()?;
        let prefix = self.prefix_len();
        len.checked_sub(prefix)
            .ok_or_else(|| Error::offset_out_of_range(prefix, len))
    }

    fn set_handle(&mut self, handle: NativeHandle, ownership: Ownership) -> Result<()> {
        self.handle.set_handle(handle, ownership)?;
        self.prefix = None;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.handle.clear()?;
        self.prefix = None;
        Ok(())
    }
}

impl std::fmt::Debug for DirectSlice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectSlice")
            .field("handle", &self.handle)
            .field("prefix", &self.prefix_len())
            .finish()
    }
}
