//! Shared state for the API layer.

use std::sync::Arc;

use crate::backend::ImageryBackend;

/// Shared context for all API routes: the process-wide imagery backend
/// session, constructed once at startup and reused read-only.
#[derive(Clone)]
pub struct ApiContext {
    pub backend: Arc<dyn ImageryBackend>,
}

impl ApiContext {
    pub fn new(backend: Arc<dyn ImageryBackend>) -> Self {
        Self { backend }
    }
}
