mod lifecycle;

use std::sync::Arc;

use rockslice_testkit::SpyEngine;

use crate::context::{SliceContext, SliceOptions};

fn spy_context() -> (Arc<SpyEngine>, SliceContext) {
    spy_context_with(SliceOptions::default())
}

fn spy_context_with(options: SliceOptions) -> (Arc<SpyEngine>, SliceContext) {
    let (spy, engine) = SpyEngine::shared();
    (spy, SliceContext::with_options(engine, options))
}
