//! Byte-copy slices.

use rockslice_common::{Result, error::Error};

use crate::{abstract_slice::AbstractSlice, context::SliceContext, handle::SliceHandle};

/// A slice whose `data()` returns a fresh copy of the bytes.
///
/// Every copying constructor allocates a new native buffer and copies the source
/// into it, so the slice never aliases memory owned by the caller.
pub struct Slice {
    handle: SliceHandle,
}

impl Slice {
    /// Creates an unbound slice that does not own anything.
    ///
    /// This is the form the engine fills in through
    /// [`set_handle`](AbstractSlice::set_handle) when it returns a value it keeps
    /// ownership of. Reading it before it is bound fails with `UnboundAccess`.
    pub fn unowned(ctx: &SliceContext) -> Slice {
        Slice {
            handle: SliceHandle::unowned(ctx),
        }
    }

    /// Creates a slice holding the UTF-8 bytes of `text`.
    pub fn from_text(ctx: &SliceContext, text: &str) -> Result<Slice> {
        let handle = ctx.engine().allocate_copy_from_text(text)?;
        Ok(Slice {
            handle: SliceHandle::owning(ctx, handle, text.len()),
        })
    }

    /// Creates a slice holding a copy of `bytes[offset..]`.
    ///
    /// Fails with `OffsetOutOfRange` if `offset` exceeds `bytes.len()`.
    pub fn from_bytes_at(ctx: &SliceContext, bytes: &[u8], offset: usize) -> Result<Slice> {
        if offset > bytes.len() {
            return Err(Error::offset_out_of_range(offset, bytes.len()));
        }
        let len = bytes.len() - offset;
        let handle = ctx.engine().allocate_copy(bytes, offset, len)?;
        Ok(Slice {
            handle: SliceHandle::owning(ctx, handle, len),
        })
    }

    /// Creates a slice holding a copy of `bytes`.
    pub fn from_bytes(ctx: &SliceContext, bytes: &[u8]) -> Result<Slice> {
        let handle = ctx.engine().allocate_copy(bytes, 0, bytes.len())?;
        Ok(Slice {
            handle: SliceHandle::owning(ctx, handle, bytes.len()),
        })
    }
}

impl AbstractSlice for Slice {
    type Data = Vec<u8>;

    fn handle(&self) -> &SliceHandle {
        &self.handle
    }

    fn handle_mut(&mut self) -> &mut SliceHandle {
        &mut self.handle
    }

    fn data(&self) -> Result<Vec<u8>> {
        self.handle.read()
    }
}

impl std::fmt::Debug for Slice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Slice").field(&self.handle).finish()
    }
}
