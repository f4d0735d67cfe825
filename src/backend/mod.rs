//! Imagery compute backend boundary.
//!
//! All pixel-level work — compositing, per-pixel algebra, region reduction,
//! vectorization — is delegated to a remote compute service. The pipeline
//! composes declarative [`expr`] requests and materializes results through
//! the [`ImageryBackend`] trait; it never inspects backend-internal
//! representations. One client is constructed at process start and injected
//! into the API context for the process lifetime.

pub mod expr;
pub mod http;
pub mod mock;

use async_trait::async_trait;

use expr::{CollectionExpr, GeometryArea, RawFeature, RegionSum, VectorizeRequest};

/// Errors from imagery backend operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("cannot reach imagery backend at {0}")]
    Connection(String),
    #[error("imagery backend request timed out after {0}s")]
    Timeout(u64),
    #[error("imagery backend transport error: {0}")]
    Transport(String),
    #[error("imagery backend error {status}: {body}")]
    Compute { status: u16, body: String },
    #[error("cannot parse imagery backend response: {0}")]
    ResponseParsing(String),
}

/// Declarative compute surface of the remote imagery backend.
///
/// Calls are awaited at clear points in the pipeline; no retries are
/// performed here or by callers.
#[async_trait]
pub trait ImageryBackend: Send + Sync {
    /// Number of scenes in a filtered collection.
    async fn collection_size(&self, collection: &CollectionExpr) -> Result<u64, BackendError>;

    /// Sum of a per-pixel image over a region. Masked-out pixels contribute
    /// nothing.
    async fn region_sum(&self, request: &RegionSum) -> Result<f64, BackendError>;

    /// Geodesic area of a geometry in square meters.
    async fn geometry_area(&self, request: &GeometryArea) -> Result<f64, BackendError>;

    /// Convert contiguous unmasked regions of an image into polygons.
    async fn reduce_to_vectors(
        &self,
        request: &VectorizeRequest,
    ) -> Result<Vec<RawFeature>, BackendError>;
}
