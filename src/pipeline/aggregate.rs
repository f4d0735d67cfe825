//! Per-class area aggregation and guarded vectorization.
//!
//! Pixel-summed areas for water, forest and agriculture come from region
//! reductions on the backend; the AOI's own geometric area anchors the
//! total, and infrastructure is the floored remainder. Vectorization is
//! guarded per class (empty masks are never converted) and degrades to an
//! empty layer on failure without aborting the request.

use futures_util::future::join_all;
use serde::Serialize;

use crate::backend::expr::{GeometryArea, ImageExpr, RegionSum, VectorizeRequest};
use crate::backend::{BackendError, ImageryBackend};
use crate::error::AnalysisError;

use super::aoi::Aoi;
use super::classify::{ClassMasks, LandCoverClass};
use super::AoiRequest;

/// Native pixel resolution of the source collection, meters.
pub const NATIVE_SCALE_M: f64 = 10.0;
/// Reduction ceiling forwarded to the backend.
pub const MAX_REDUCE_PIXELS: f64 = 1e13;
/// Max geodesic error when resolving the AOI's own area, meters.
const AREA_MAX_ERROR_M: f64 = 1.0;
/// Property the backend groups connected regions by.
const VECTOR_LABEL_PROPERTY: &str = "label";

/// Per-class areas and percentages for one analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub name: String,
    pub input_area_sq_m: f64,
    pub calculated_radius_m: f64,
    pub total_area_sq_m: f64,
    pub agriculture_area_sq_m: f64,
    pub agriculture_pct: f64,
    pub water_area_sq_m: f64,
    pub water_pct: f64,
    pub forest_area_sq_m: f64,
    pub forest_pct: f64,
    pub infrastructure_area_sq_m: f64,
    pub infrastructure_pct: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// One classified polygon, GeoJSON-shaped for the response `layers`.
#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub feature_type: &'static str,
    pub geometry: serde_json::Value,
    pub properties: FeatureProperties,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureProperties {
    pub class: &'static str,
    pub area_sq_m: f64,
}

impl Feature {
    fn classified(class: LandCoverClass, geometry: serde_json::Value, area_sq_m: f64) -> Self {
        Self {
            feature_type: "Feature",
            geometry,
            properties: FeatureProperties {
                class: class.label(),
                area_sq_m,
            },
        }
    }
}

/// Pixel-area sum restricted to a class mask, over the AOI at native scale.
fn masked_pixel_area(mask: &ImageExpr, aoi: &Aoi) -> RegionSum {
    RegionSum {
        image: ImageExpr::pixel_area().update_mask(mask.clone()),
        geometry: aoi.geometry(),
        scale_m: NATIVE_SCALE_M,
        max_pixels: MAX_REDUCE_PIXELS,
    }
}

/// Percentage of `total`, rounded to four decimals.
fn pct(area: f64, total: f64) -> f64 {
    let raw = 100.0 * area / total;
    (raw * 10_000.0).round() / 10_000.0
}

/// Aggregate per-class areas and vectorize the class boundaries.
pub async fn aggregate(
    backend: &dyn ImageryBackend,
    masks: &ClassMasks,
    aoi: &Aoi,
    request: &AoiRequest,
) -> Result<(AnalysisSummary, Vec<Feature>), AnalysisError> {
    let total_request = GeometryArea {
        geometry: aoi.geometry(),
        max_error_m: AREA_MAX_ERROR_M,
    };

    // Four independent materializations; reassembled by class, not by
    // completion order.
    let (water_area, forest_area, agri_area, total_area) = tokio::join!(
        backend.region_sum(&masked_pixel_area(&masks.water, aoi)),
        backend.region_sum(&masked_pixel_area(&masks.forest, aoi)),
        backend.region_sum(&masked_pixel_area(&masks.agriculture, aoi)),
        backend.geometry_area(&total_request),
    );
    let (water_area, forest_area, agri_area, total_area) =
        (water_area?, forest_area?, agri_area?, total_area?);

    if total_area <= 0.0 {
        return Err(AnalysisError::DegenerateAoi);
    }

    // Infrastructure is the remainder of the geometric total, floored at
    // zero. Unmasked and no-data pixels land here rather than being
    // re-measured from the mask itself.
    let infra_area = (total_area - (water_area + forest_area + agri_area)).max(0.0);

    let summary = AnalysisSummary {
        name: request.name.clone(),
        input_area_sq_m: request.area_sq_m,
        calculated_radius_m: aoi.radius_m,
        total_area_sq_m: total_area,
        agriculture_area_sq_m: agri_area,
        agriculture_pct: pct(agri_area, total_area),
        water_area_sq_m: water_area,
        water_pct: pct(water_area, total_area),
        forest_area_sq_m: forest_area,
        forest_pct: pct(forest_area, total_area),
        infrastructure_area_sq_m: infra_area,
        infrastructure_pct: pct(infra_area, total_area),
        latitude: request.latitude,
        longitude: request.longitude,
    };

    // Vectorize the four classes concurrently; the output order is fixed
    // regardless of completion order.
    let layer_order = [
        (LandCoverClass::Water, &masks.water),
        (LandCoverClass::Agriculture, &masks.agriculture),
        (LandCoverClass::Forest, &masks.forest),
        (LandCoverClass::Infrastructure, &masks.infrastructure),
    ];
    let layers = join_all(
        layer_order
            .iter()
            .map(|&(class, mask)| vectorize_class(backend, class, mask, aoi)),
    )
    .await;
    let layers: Vec<Feature> = layers.into_iter().flatten().collect();

    Ok((summary, layers))
}

/// Vectorize one class mask, degrading to an empty layer on failure.
async fn vectorize_class(
    backend: &dyn ImageryBackend,
    class: LandCoverClass,
    mask: &ImageExpr,
    aoi: &Aoi,
) -> Vec<Feature> {
    match try_vectorize_class(backend, class, mask, aoi).await {
        Ok(features) => features,
        Err(error) => {
            tracing::warn!(
                class = class.label(),
                %error,
                "vectorization failed; returning empty layer"
            );
            Vec::new()
        }
    }
}

/// The mask's own area aggregate is materialized first: an empty mask skips
/// the conversion entirely instead of handing the backend an all-masked
/// raster.
async fn try_vectorize_class(
    backend: &dyn ImageryBackend,
    class: LandCoverClass,
    mask: &ImageExpr,
    aoi: &Aoi,
) -> Result<Vec<Feature>, BackendError> {
    let covered = backend.region_sum(&masked_pixel_area(mask, aoi)).await?;
    if covered <= 0.0 {
        return Ok(Vec::new());
    }

    let request = VectorizeRequest {
        image: mask.clone().self_mask(),
        geometry: aoi.geometry(),
        scale_m: NATIVE_SCALE_M,
        geometry_type: "polygon",
        label_property: VECTOR_LABEL_PROPERTY,
        max_pixels: MAX_REDUCE_PIXELS,
        best_effort: true,
    };
    let raw = backend.reduce_to_vectors(&request).await?;

    Ok(raw
        .into_iter()
        .map(|f| Feature::classified(class, f.geometry, f.area_sq_m))
        .collect())
}
