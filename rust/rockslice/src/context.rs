//! The engine and options every slice is created with.

use std::sync::Arc;

use rockslice_native::{EngineRef, HeapEngine};

/// What happens when a slice that still owns its buffer goes out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropPolicy {
    /// Dispose the buffer on drop. If outstanding leases prevent it, the buffer is
    /// leaked and a warning is logged.
    #[default]
    Dispose,
    /// Never free on drop: the caller is expected to call `dispose()` explicitly,
    /// and every buffer leaked this way is reported with a warning.
    Leak,
}

/// Slice configuration.
#[derive(Debug, Clone, Default)]
pub struct SliceOptions {
    pub drop_policy: DropPolicy,
}

impl SliceOptions {
    pub fn drop_policy(mut self, drop_policy: DropPolicy) -> Self {
        self.drop_policy = drop_policy;
        self
    }
}

/// The native engine slices allocate from, together with the options they follow.
///
/// Cloning is cheap; all clones share the same engine.
#[derive(Clone)]
pub struct SliceContext {
    engine: EngineRef,
    options: Arc<SliceOptions>,
}

impl SliceContext {
    /// Creates a context over `engine` with default options.
    pub fn new(engine: EngineRef) -> SliceContext {
        Self::with_options(engine, SliceOptions::default())
    }

    pub fn with_options(engine: EngineRef, options: SliceOptions) -> SliceContext {
        SliceContext {
            engine,
            options: Arc::new(options),
        }
    }

    /// Creates a context over a fresh [`HeapEngine`] with default options.
    pub fn heap() -> SliceContext {
        Self::new(HeapEngine::new().into_ref())
    }

    #[inline]
    pub fn engine(&self) -> &EngineRef {
        &self.engine
    }

    #[inline]
    pub fn options(&self) -> &SliceOptions {
        &self.options
    }
}

impl std::fmt::Debug for SliceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SliceContext")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
