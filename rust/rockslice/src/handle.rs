//! Binding and ownership state of a slice.
//!
//! A [`SliceHandle`] moves through `Unbound`, `BoundOwning` / `BoundViewing` and finally
//! `Disposed`, which is terminal. Only an owning handle ever frees its buffer, and it
//! does so at most once: the buffer's [`Liveness`] token is retired first, which fails
//! while any [`Lease`] on the buffer is outstanding.

use rockslice_common::{Result, error::Error};
use rockslice_liveness::{Lease, Liveness};
use rockslice_native::{NativeHandle, PinnedBuffer};

use crate::context::{DropPolicy, SliceContext};

/// Whether a handle is responsible for freeing the buffer it is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owning,
    Viewing,
}

/// Observable lifecycle state of a [`SliceHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Unbound,
    BoundOwning,
    BoundViewing,
    Disposed,
}

enum Binding {
    Unbound,
    Bound(Bound),
    Disposed,
}

struct Bound {
    handle: NativeHandle,
    /// Byte length captured at bind time.
    len: usize,
    /// Referrers of this particular binding; a rebind starts a new token.
    liveness: Liveness,
}

/// A reference to a native buffer plus the ownership flag that decides who frees it.
///
/// Mutating operations take `&mut self`; reads take `&self` and may run concurrently.
pub struct SliceHandle {
    ctx: SliceContext,
    binding: Binding,
    ownership: Ownership,
    disowned: bool,
}

impl SliceHandle {
    /// An unbound handle that will own whatever it is bound to.
    #[cfg(test)]
    pub(crate) fn unbound(ctx: &SliceContext) -> SliceHandle {
        SliceHandle {
            ctx: ctx.clone(),
            binding: Binding::Unbound,
            ownership: Ownership::Owning,
            disowned: false,
        }
    }

    /// An unbound, disowned handle, waiting for the engine to bind a value it owns.
    pub(crate) fn unowned(ctx: &SliceContext) -> SliceHandle {
        SliceHandle {
            ctx: ctx.clone(),
            binding: Binding::Unbound,
            ownership: Ownership::Viewing,
            disowned: true,
        }
    }

    /// A handle owning a buffer that was just allocated with `len` bytes.
    pub(crate) fn owning(ctx: &SliceContext, handle: NativeHandle, len: usize) -> SliceHandle {
        log::trace!("bound owning slice to native buffer {handle} ({len} bytes)");
        SliceHandle {
            ctx: ctx.clone(),
            binding: Binding::Bound(Bound {
                handle,
                len,
                liveness: Liveness::new(),
            }),
            ownership: Ownership::Owning,
            disowned: false,
        }
    }

    pub fn context(&self) -> &SliceContext {
        &self.ctx
    }

    pub fn state(&self) -> HandleState {
        match (&self.binding, self.ownership) {
            (Binding::Unbound, _) => HandleState::Unbound,
            (Binding::Bound(_), Ownership::Owning) => HandleState::BoundOwning,
            (Binding::Bound(_), Ownership::Viewing) => HandleState::BoundViewing,
            (Binding::Disposed, _) => HandleState::Disposed,
        }
    }

    #[inline]
    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Returns `true` if this handle frees the buffer it is (or will be) bound to.
    #[inline]
    pub fn is_owning(&self) -> bool {
        self.ownership == Ownership::Owning
    }

    /// Returns `true` once `disown()` has run on this handle.
    #[inline]
    pub fn is_disowned(&self) -> bool {
        self.disowned
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        matches!(self.binding, Binding::Disposed)
    }

    /// Returns the engine token of the bound buffer.
    pub fn native_handle(&self) -> Result<NativeHandle> {
        self.bound("native_handle").map(|bound| bound.handle)
    }

    /// Returns the byte length captured when the buffer was bound.
    pub fn len(&self) -> Result<usize> {
        self.bound("size").map(|bound| bound.len)
    }

    /// Returns a zero-copy view of the bound buffer.
    pub fn pin(&self) -> Result<PinnedBuffer> {
        self.pin_for("pin")
    }

    /// Returns a copy of the bound buffer contents.
    pub fn read(&self) -> Result<Vec<u8>> {
        let bound = self.bound("data")?;
        self.ctx.engine().read(bound.handle)
    }

    /// Takes a lease on the bound buffer. Disposal of an owning handle is refused
    /// until every lease has been dropped.
    pub fn lease(&self) -> Result<Lease> {
        self.bound("lease")?
            .liveness
            .lease()
            .map_err(|_| Error::use_after_dispose("lease"))
    }

    /// Returns the number of outstanding leases on the current binding.
    pub fn referrers(&self) -> u64 {
        match &self.binding {
            Binding::Bound(bound) => bound.liveness.referrers(),
            Binding::Unbound | Binding::Disposed => 0,
        }
    }

    /// Rebinds the handle to `handle`, releasing the previous binding first (and
    /// freeing it, if it was owned).
    ///
    /// Taking ownership is rejected once the handle has been disowned. Rebinding to the
    /// buffer that is already bound only changes the ownership flag.
    pub fn set_handle(&mut self, handle: NativeHandle, ownership: Ownership) -> Result<()> {
        self.ensure_live("set_handle")?;
        if ownership == Ownership::Owning && self.disowned {
            return Err(Error::invalid_operation(
                "set_handle: a disowned slice cannot take ownership",
            ));
        }
        if let Binding::Bound(bound) = &self.binding {
            if bound.handle == handle {
                self.ownership = ownership;
                return Ok(());
            }
        }

        let len = self.ctx.engine().len(handle)?;
        self.release("set_handle")?;
        self.binding = Binding::Bound(Bound {
            handle,
            len,
            liveness: Liveness::new(),
        });
        self.ownership = ownership;
        log::trace!("bound {ownership:?} slice to native buffer {handle} ({len} bytes)");
        Ok(())
    }

    /// Releases the current binding (freeing it if owned) and returns to `Unbound`.
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_live("clear")?;
        self.release("clear")?;
        self.binding = Binding::Unbound;
        Ok(())
    }

    /// Gives up ownership without freeing. Irreversible for this handle.
    pub fn disown(&mut self) -> Result<()> {
        self.ensure_live("disown")?;
        self.ownership = Ownership::Viewing;
        self.disowned = true;
        Ok(())
    }

    /// Disposes the handle: an owned buffer is freed, a viewed one is left alone.
    ///
    /// Fails with `PrematureDispose` (leaving the handle untouched) while leases on
    /// an owned buffer are outstanding. Disposing a disposed handle is a no-op.
    pub fn dispose(&mut self) -> Result<()> {
        if self.is_disposed() {
            return Ok(());
        }
        self.release("dispose")?;
        self.binding = Binding::Disposed;
        self.ownership = Ownership::Viewing;
        Ok(())
    }

    /// The liveness token of the current binding, if bound.
    pub(crate) fn liveness(&self) -> Option<&Liveness> {
        match &self.binding {
            Binding::Bound(bound) => Some(&bound.liveness),
            Binding::Unbound | Binding::Disposed => None,
        }
    }

    pub(crate) fn pin_for(&self, operation: &'static str) -> Result<PinnedBuffer> {
        let bound = self.bound(operation)?;
        self.ctx.engine().pin(bound.handle)
    }
}

impl SliceHandle {
    fn bound(&self, operation: &'static str) -> Result<&Bound> {
        match &self.binding {
            Binding::Bound(bound) => Ok(bound),
            Binding::Unbound => Err(Error::unbound_access(operation)),
            Binding::Disposed => Err(Error::use_after_dispose(operation)),
        }
    }

    fn ensure_live(&self, operation: &'static str) -> Result<()> {
        if self.is_disposed() {
            Err(Error::use_after_dispose(operation))
        } else {
            Ok(())
        }
    }

    /// Frees the bound buffer if it is owned. The binding itself is left in place; a
    /// failure keeps the handle bound so the release can be retried.
    fn release(&self, operation: &'static str) -> Result<()> {
        let Binding::Bound(bound) = &self.binding else {
            return Ok(());
        };
        match self.ownership {
            Ownership::Owning => {
                bound
                    .liveness
                    .retire()
                    .map_err(|e| Error::premature_dispose(e.live))?;
                self.ctx.engine().free(bound.handle)?;
                log::trace!("{operation}: freed native buffer {}", bound.handle);
            }
            Ownership::Viewing => {
                log::trace!(
                    "{operation}: released view of native buffer {}",
                    bound.handle
                );
            }
        }
        Ok(())
    }
}

impl Drop for SliceHandle {
    fn drop(&mut self) {
        let (handle, len) = match &self.binding {
            Binding::Bound(bound) if self.ownership == Ownership::Owning => {
                (bound.handle, bound.len)
            }
            _ => return,
        };
        match self.ctx.options().drop_policy {
            DropPolicy::Dispose => {
                if let Err(e) = self.release("drop") {
                    log::warn!("leaking native buffer {handle} ({len} bytes): {e}");
                }
            }
            DropPolicy::Leak => {
                log::warn!(
                    "slice dropped without dispose, leaking native buffer {handle} ({len} bytes)"
                );
            }
        }
    }
}

impl std::fmt::Debug for SliceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("SliceHandle");
        s.field("state", &self.state());
        if let Binding::Bound(bound) = &self.binding {
            s.field("handle", &bound.handle)
                .field("len", &bound.len)
                .field("referrers", &bound.liveness.referrers());
        }
        s.field("disowned", &self.disowned).finish()
    }
}
