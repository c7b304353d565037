//! The capability set shared by all slice variants.

use std::cmp::Ordering;

use rockslice_common::Result;
use rockslice_liveness::Lease;
use rockslice_native::{NativeHandle, PinnedBuffer};

use crate::handle::{HandleState, Ownership, SliceHandle};

/// Operations every slice exposes, regardless of how its content is handed out.
///
/// Implementors provide access to their [`SliceHandle`] and decide what `data()`
/// returns; everything else has a default implementation on top of the handle.
///
/// Reads fail with `UnboundAccess` on an unbound slice and with `UseAfterDispose`
/// after `dispose()`.
pub trait AbstractSlice {
    /// What `data()` hands out.
    type Data;

    fn handle(&self) -> &SliceHandle;

    fn handle_mut(&mut self) -> &mut SliceHandle;

    /// Returns the referenced bytes.
    fn data(&self) -> Result<Self::Data>;

    /// Pins the bytes visible through this slice, attributing failures to `operation`.
    fn pin_for(&self, operation: &'static str) -> Result<PinnedBuffer> {
        self.handle().pin_for(operation)
    }

    /// Returns a zero-copy view of the bytes visible through this slice.
    fn pin(&self) -> Result<PinnedBuffer> {
        self.pin_for("pin")
    }

    /// Returns the length of the slice in bytes.
    fn size(&self) -> Result<usize> {
        self.handle().len()
    }

    fn is_empty(&self) -> Result<bool> {
        Ok(self.size()? == 0)
    }

    /// Compares two slices lexicographically, byte by byte (the engine's bytewise
    /// key order).
    fn compare<S>(&self, other: &S) -> Result<Ordering>
    where
        S: AbstractSlice + ?Sized,
    {
        let lhs = self.pin_for("compare")?;
        let rhs = other.pin_for("compare")?;
        Ok(lhs.as_slice().cmp(rhs.as_slice()))
    }

    fn equals<S>(&self, other: &S) -> Result<bool>
    where
        S: AbstractSlice + ?Sized,
    {
        Ok(self.compare(other)? == Ordering::Equal)
    }

    fn starts_with(&self, prefix: &[u8]) -> Result<bool> {
        Ok(self.pin_for("starts_with")?.starts_with(prefix))
    }

    /// Renders the slice as upper-case hex (`hex == true`) or as lossy UTF-8 text.
    fn to_text(&self, hex: bool) -> Result<String> {
        const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
        let bytes = self.pin_for("to_text")?;
        if hex {
            let mut text = String::with_capacity(bytes.len() * 2);
            for &b in bytes.iter() {
                text.push(DIGITS[(b >> 4) as usize] as char);
                text.push(DIGITS[(b & 0xf) as usize] as char);
            }
            Ok(text)
        } else {
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }

    /// Takes a lease on the underlying buffer; see [`SliceHandle::lease`].
    fn lease(&self) -> Result<Lease> {
        self.handle().lease()
    }

    fn is_owning(&self) -> bool {
        self.handle().is_owning()
    }

    fn state(&self) -> HandleState {
        self.handle().state()
    }

    /// Rebinds the slice; see [`SliceHandle::set_handle`].
    fn set_handle(&mut self, handle: NativeHandle, ownership: Ownership) -> Result<()> {
        self.handle_mut().set_handle(handle, ownership)
    }

    fn clear(&mut self) -> Result<()> {
        self.handle_mut().clear()
    }

    /// Gives up ownership of the buffer without freeing it. Irreversible.
    fn disown(&mut self) -> Result<()> {
        self.handle_mut().disown()
    }

    /// Disposes the slice; see [`SliceHandle::dispose`].
    fn dispose(&mut self) -> Result<()> {
        self.handle_mut().dispose()
    }
}
