//! The AOI classification pipeline.
//!
//! Four stages composed linearly per request: AOI geometry derivation,
//! temporal compositing with cloud masking, spectral-index classification,
//! and per-class aggregation/vectorization. Data flows strictly forward;
//! every entity is created, transformed and discarded within one request.

pub mod aggregate;
pub mod aoi;
pub mod classify;
pub mod composite;

use serde::{Deserialize, Serialize};

use crate::backend::ImageryBackend;
use crate::error::AnalysisError;

pub use aggregate::{AnalysisSummary, Feature};
pub use aoi::Aoi;

/// Analysis input: a named center point and a target disk area.
#[derive(Debug, Clone, Deserialize)]
pub struct AoiRequest {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub area_sq_m: f64,
}

impl AoiRequest {
    /// Validate the client-supplied input. Runs once, before any backend
    /// work.
    fn validate(&self) -> Result<(), AnalysisError> {
        if self.area_sq_m <= 0.0 {
            return Err(AnalysisError::InvalidArea(self.area_sq_m));
        }
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(AnalysisError::InvalidLatitude(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(AnalysisError::InvalidLongitude(self.longitude));
        }
        Ok(())
    }
}

/// Full result of one analysis.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub summary: AnalysisSummary,
    pub layers: Vec<Feature>,
}

/// Run the full pipeline for one request.
pub async fn analyze(
    backend: &dyn ImageryBackend,
    request: &AoiRequest,
) -> Result<Analysis, AnalysisError> {
    request.validate()?;

    let aoi = Aoi::from_center_and_area(request.latitude, request.longitude, request.area_sq_m);
    tracing::info!(
        area_sq_m = request.area_sq_m,
        radius_m = aoi.radius_m,
        "starting AOI analysis"
    );

    let image = composite::fetch_composite(backend, &aoi, composite::DEFAULT_LOOKBACK_DAYS).await?;
    let masks = classify::classify(&image);
    let (summary, layers) = aggregate::aggregate(backend, &masks, &aoi, request).await?;

    tracing::info!(
        total_area_sq_m = summary.total_area_sq_m,
        layers = layers.len(),
        "analysis complete"
    );
    Ok(Analysis { summary, layers })
}
