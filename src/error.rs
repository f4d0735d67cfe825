//! Pipeline error taxonomy.
//!
//! Client-caused errors (invalid input, empty imagery window, degenerate
//! geometry) are detected before or during the cheap stages and surface as
//! HTTP 400; backend compute failures abort the request and surface as 500.
//! Per-class vectorization failures are handled locally in the aggregator
//! and never reach this enum.

use crate::backend::BackendError;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("area_sq_m must be > 0 (got {0})")]
    InvalidArea(f64),
    #[error("latitude must be within [-90, 90] (got {0})")]
    InvalidLatitude(f64),
    #[error("longitude must be within [-180, 180] (got {0})")]
    InvalidLongitude(f64),
    #[error("no imagery found for the area of interest within the last {lookback_days} days")]
    NoImagery { lookback_days: i64 },
    #[error("computed total area of the area of interest is zero")]
    DegenerateAoi,
    #[error(transparent)]
    Backend(#[from] BackendError),
}
