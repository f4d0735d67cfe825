//! Temporal compositing of the source imagery collection.
//!
//! Scenes intersecting the AOI within the lookback window are prefiltered
//! by scene-level cloud metadata, per-pixel masked using the QA band's
//! cloud and cirrus bits, and reduced to a single per-pixel median
//! composite clipped to the AOI. Median compositing rides out residual
//! cloud contamination and sensor noise without per-scene quality scoring.

use chrono::{Duration, Utc};

use crate::backend::expr::{CollectionExpr, ImageExpr};
use crate::backend::ImageryBackend;
use crate::error::AnalysisError;

use super::aoi::Aoi;

/// Multispectral source: harmonized Sentinel-2 surface reflectance.
pub const COLLECTION_ID: &str = "COPERNICUS/S2_SR_HARMONIZED";
/// Scene metadata property holding the estimated cloud cover.
pub const CLOUD_COVER_PROPERTY: &str = "CLOUDY_PIXEL_PERCENTAGE";
/// Scenes at or above this cloud-cover percentage are dropped before any
/// per-pixel work.
pub const MAX_CLOUD_COVER_PCT: f64 = 40.0;
/// Quality-assurance band carrying the cloud bit flags.
pub const QA_BAND: &str = "QA60";
/// QA bit set for opaque clouds.
pub const QA_CLOUD_BIT: u8 = 10;
/// QA bit set for cirrus.
pub const QA_CIRRUS_BIT: u8 = 11;
/// How far back scenes are collected.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 365;

/// Cloud-masked median composite clipped to the AOI.
///
/// Opaque handle over the composite expression: created once per request,
/// consumed by the classifier, discarded at request end.
#[derive(Debug, Clone)]
pub struct CompositeImage {
    expr: ImageExpr,
}

impl CompositeImage {
    pub fn expr(&self) -> &ImageExpr {
        &self.expr
    }
}

/// Filtered, QA-masked source collection for the AOI and lookback window.
fn source_collection(aoi: &Aoi, lookback_days: i64) -> CollectionExpr {
    let end = Utc::now();
    let start = end - Duration::days(lookback_days);

    CollectionExpr::source(COLLECTION_ID)
        .filter_bounds(aoi.geometry())
        .filter_date(start, end)
        .filter_metadata_lt(CLOUD_COVER_PROPERTY, MAX_CLOUD_COVER_PCT)
        .mask_qa_bits(QA_BAND, [QA_CLOUD_BIT, QA_CIRRUS_BIT])
}

/// Fetch the composite for an AOI.
///
/// The collection size is materialized before the median reduction so that
/// an empty window fails fast instead of paying for the reducer.
pub async fn fetch_composite(
    backend: &dyn ImageryBackend,
    aoi: &Aoi,
    lookback_days: i64,
) -> Result<CompositeImage, AnalysisError> {
    let collection = source_collection(aoi, lookback_days);

    let scenes = backend.collection_size(&collection).await?;
    if scenes == 0 {
        return Err(AnalysisError::NoImagery { lookback_days });
    }
    tracing::debug!(scenes, lookback_days, "compositing source scenes");

    let expr = ImageExpr::median(collection).clip(aoi.geometry());
    Ok(CompositeImage { expr })
}
