//! Liveness tracking for buffers that may be referenced by more than one component.
//!
//! A [`Liveness`] token is created together with a binding to a native buffer. Every
//! component that keeps reading the buffer holds a [`Lease`] taken from the token; the
//! lease is returned when dropped. The owner of the buffer retires the token right
//! before freeing it: retirement only succeeds when no lease is outstanding, and no
//! lease can be taken afterwards.

use std::sync::Arc;

use counter::Counter;

pub mod counter;

/// Referrer tracking for a single buffer binding.
#[derive(Clone, Default)]
pub struct Liveness(Arc<LivenessNode>);

impl Liveness {
    /// Creates a new open token with no referrers.
    pub fn new() -> Liveness {
        Liveness(Arc::new(LivenessNode::default()))
    }

    /// Returns the number of outstanding leases.
    ///
    /// **Note**: This method is primarily intended for diagnostic purposes. The returned
    /// value may be outdated in a concurrent environment.
    pub fn referrers(&self) -> u64 {
        self.0.referrers.read()
    }

    /// Takes a new lease on the buffer.
    ///
    /// Returns a `LeaseError` if the token has already been retired.
    pub fn lease(&self) -> Result<Lease, LeaseError> {
        if self.0.referrers.acquire() {
            Ok(Lease(self.0.clone()))
        } else {
            Err(LeaseError)
        }
    }

    /// Retires the token, after which the buffer may be freed.
    ///
    /// Fails with a `RetireError` carrying the number of outstanding leases if any
    /// component still references the buffer. Retiring twice succeeds.
    pub fn retire(&self) -> Result<(), RetireError> {
        self.0.referrers.seal().map_err(|live| RetireError { live })
    }

    /// Returns `true` once the token has been retired.
    pub fn is_retired(&self) -> bool {
        self.0.referrers.is_sealed()
    }

    /// Returns `true` if both tokens track the same binding.
    pub fn same_as(&self, other: &Liveness) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Liveness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Liveness")
            .field("referrers", &self.referrers())
            .field("retired", &self.is_retired())
            .finish()
    }
}

/// A reference held by a component that still reads a buffer.
///
/// The reference is returned to its [`Liveness`] token when the lease is dropped.
pub struct Lease(Arc<LivenessNode>);

impl Lease {
    /// Returns `true` if the lease was taken from the given token.
    pub fn is_for(&self, liveness: &Liveness) -> bool {
        Arc::ptr_eq(&self.0, &liveness.0)
    }
}

impl Clone for Lease {
    /// Takes another reference on the same token.
    ///
    /// # Panics
    ///
    /// Panics if the referrer count would overflow.
    fn clone(&self) -> Lease {
        // The token cannot be retired while this lease is alive.
        let acquired = self.0.referrers.acquire();
        assert!(acquired, "lease count overflow");
        Lease(self.0.clone())
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.0.referrers.release();
    }
}

impl std::fmt::Debug for Lease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease")
            .field("referrers", &self.0.referrers.read())
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct LivenessNode {
    referrers: Counter,
}

/// An error returned when leasing a buffer whose token was already retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("buffer liveness token is already retired")]
pub struct LeaseError;

/// An error returned when retiring a token that still has outstanding leases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("{live} lease(s) still reference the buffer")]
pub struct RetireError {
    pub live: u64,
}
