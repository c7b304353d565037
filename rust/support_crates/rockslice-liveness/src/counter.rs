use std::sync::atomic::{AtomicU64, Ordering};

/// Value stored in a retired counter. No acquisition succeeds once it is set.
const SEALED: u64 = u64::MAX;

/// A thread-safe referrer counter that can be sealed exactly when it drops to zero.
///
/// Multiple consumers acquire and release references concurrently. Sealing is a
/// single compare-and-exchange from `0`, so a counter can never be sealed while a
/// reference is held, and no reference can be acquired after it was sealed.
pub struct Counter(AtomicU64);

impl Counter {
    /// Creates a new open `Counter` with no references.
    pub fn new() -> Counter {
        Counter(AtomicU64::new(0))
    }

    #[cfg(test)]
    pub(crate) fn with_count(count: u64) -> Counter {
        Counter(AtomicU64::new(count))
    }

    /// Attempts to acquire one reference.
    ///
    /// Returns `false` if the counter has been sealed (or is saturated); the counter
    /// remains unchanged in that case.
    pub fn acquire(&self) -> bool {
        let mut current = self.0.load(Ordering::Relaxed);
        while current < SEALED - 1 {
            match self.0.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(updated) => current = updated,
            }
        }
        false
    }

    /// Releases one previously acquired reference.
    pub fn release(&self) {
        let prev = self.0.fetch_sub(1, Ordering::Release);
        debug_assert!(prev != 0 && prev != SEALED, "unbalanced release");
    }

    /// Returns the number of live references (most likely stale by the time it is
    /// observed by the caller). A sealed counter reports zero.
    pub fn read(&self) -> u64 {
        match self.0.load(Ordering::Acquire) {
            SEALED => 0,
            n => n,
        }
    }

    /// Seals the counter if no references are held.
    ///
    /// Sealing an already sealed counter succeeds. On failure, returns the number of
    /// references observed at the time of the attempt.
    pub fn seal(&self) -> Result<(), u64> {
        match self
            .0
            .compare_exchange(0, SEALED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) | Err(SEALED) => Ok(()),
            Err(live) => Err(live),
        }
    }

    /// Returns `true` once the counter has been sealed.
    pub fn is_sealed(&self) -> bool {
        self.0.load(Ordering::Acquire) == SEALED
    }
}

impl Default for Counter {
    fn default() -> Self {
        Counter::new()
    }
}

impl std::fmt::Debug for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Counter")
            .field("live", &self.read())
            .field("sealed", &self.is_sealed())
            .finish()
    }
}
