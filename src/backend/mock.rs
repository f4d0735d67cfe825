//! In-memory imagery backend for tests.
//!
//! Instead of canned numbers, the mock holds a bag of synthetic per-band
//! pixels and genuinely evaluates the expression model against them, so
//! tests exercise the same expressions production sends: normalized
//! differences, the boolean cascade, masked pixel-area sums. Collection
//! size, geometry area and failure modes are scriptable.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::expr::{CollectionExpr, Geometry, GeometryArea, ImageExpr, RawFeature, RegionSum, VectorizeRequest};
use super::{BackendError, ImageryBackend};

// ═══════════════════════════════════════════════════════════
// Synthetic pixels and the expression evaluator
// ═══════════════════════════════════════════════════════════

/// One composite pixel: surface reflectance per band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePixel {
    pub b3: f64,
    pub b4: f64,
    pub b8: f64,
}

impl SamplePixel {
    pub fn new(b3: f64, b4: f64, b8: f64) -> Self {
        Self { b3, b4, b8 }
    }

    /// Open water: green well above near-infrared (NDWI ≈ 0.6).
    pub fn water() -> Self {
        Self::new(0.12, 0.06, 0.03)
    }

    /// Dense canopy: strong near-infrared over red (NDVI ≈ 0.7).
    pub fn forest() -> Self {
        Self::new(0.07, 0.08, 0.45)
    }

    /// Cropland: moderate vegetation signal (NDVI ≈ 0.43).
    pub fn cropland() -> Self {
        Self::new(0.09, 0.12, 0.30)
    }

    /// Built-up/bare surface: flat spectrum (NDVI ≈ 0.1, NDWI < 0).
    pub fn built_up() -> Self {
        Self::new(0.15, 0.18, 0.22)
    }

    fn band(&self, name: &str) -> Option<f64> {
        match name {
            "B3" => Some(self.b3),
            "B4" => Some(self.b4),
            "B8" => Some(self.b8),
            _ => None,
        }
    }
}

/// Evaluate an image expression at one pixel.
///
/// Returns `None` for a masked-out pixel. Band lookups resolve against the
/// sample directly: every image expression the pipeline builds bottoms out
/// at the composite, which the sample stands in for.
pub fn eval_image(expr: &ImageExpr, px: &SamplePixel, pixel_area_m2: f64) -> Option<f64> {
    match expr {
        ImageExpr::Median { .. } => Some(1.0),
        ImageExpr::Clip { input, .. } => eval_image(input, px, pixel_area_m2),
        ImageExpr::NormalizedDifference { band_a, band_b, .. } => {
            let a = px.band(band_a)?;
            let b = px.band(band_b)?;
            let denom = a + b;
            if denom == 0.0 {
                Some(0.0)
            } else {
                Some((a - b) / denom)
            }
        }
        ImageExpr::Gt { input, value } => {
            let v = eval_image(input, px, pixel_area_m2)?;
            Some(if v > *value { 1.0 } else { 0.0 })
        }
        ImageExpr::And { lhs, rhs } => {
            let l = eval_image(lhs, px, pixel_area_m2)?;
            let r = eval_image(rhs, px, pixel_area_m2)?;
            Some(if l != 0.0 && r != 0.0 { 1.0 } else { 0.0 })
        }
        ImageExpr::Not { input } => {
            let v = eval_image(input, px, pixel_area_m2)?;
            Some(if v == 0.0 { 1.0 } else { 0.0 })
        }
        ImageExpr::Add { lhs, rhs } => {
            let l = eval_image(lhs, px, pixel_area_m2)?;
            let r = eval_image(rhs, px, pixel_area_m2)?;
            Some(l + r)
        }
        ImageExpr::Eq { input, value } => {
            let v = eval_image(input, px, pixel_area_m2)?;
            Some(if v == *value { 1.0 } else { 0.0 })
        }
        ImageExpr::PixelArea => Some(pixel_area_m2),
        ImageExpr::UpdateMask { input, mask } => {
            let m = eval_image(mask, px, pixel_area_m2)?;
            if m != 0.0 {
                eval_image(input, px, pixel_area_m2)
            } else {
                None
            }
        }
        ImageExpr::SelfMask { input } => {
            let v = eval_image(input, px, pixel_area_m2)?;
            if v != 0.0 {
                Some(v)
            } else {
                None
            }
        }
    }
}

/// Evaluate a boolean mask expression at one pixel.
pub fn eval_mask(expr: &ImageExpr, px: &SamplePixel) -> bool {
    matches!(eval_image(expr, px, 1.0), Some(v) if v != 0.0)
}

// ═══════════════════════════════════════════════════════════
// MockImageryBackend
// ═══════════════════════════════════════════════════════════

/// Scriptable in-memory [`ImageryBackend`].
pub struct MockImageryBackend {
    pixels: Vec<SamplePixel>,
    pixel_area_m2: f64,
    collection_size: u64,
    geometry_area_override: Option<f64>,
    fail_region_sum: bool,
    fail_vectorize: bool,
    region_sum_calls: AtomicUsize,
    vectorize_calls: AtomicUsize,
}

impl MockImageryBackend {
    /// Empty backend: one scene available, no pixels.
    pub fn new() -> Self {
        Self {
            pixels: Vec::new(),
            pixel_area_m2: 100.0,
            collection_size: 1,
            geometry_area_override: None,
            fail_region_sum: false,
            fail_vectorize: false,
            region_sum_calls: AtomicUsize::new(0),
            vectorize_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_pixels(mut self, pixels: Vec<SamplePixel>) -> Self {
        self.pixels = pixels;
        self
    }

    pub fn with_pixel_area(mut self, pixel_area_m2: f64) -> Self {
        self.pixel_area_m2 = pixel_area_m2;
        self
    }

    pub fn with_collection_size(mut self, size: u64) -> Self {
        self.collection_size = size;
        self
    }

    /// Fix the geometric AOI area instead of deriving it from the buffer
    /// radius.
    pub fn with_geometry_area(mut self, area_sq_m: f64) -> Self {
        self.geometry_area_override = Some(area_sq_m);
        self
    }

    pub fn failing_region_sum(mut self) -> Self {
        self.fail_region_sum = true;
        self
    }

    pub fn failing_vectorize(mut self) -> Self {
        self.fail_vectorize = true;
        self
    }

    pub fn region_sum_calls(&self) -> usize {
        self.region_sum_calls.load(Ordering::SeqCst)
    }

    pub fn vectorize_calls(&self) -> usize {
        self.vectorize_calls.load(Ordering::SeqCst)
    }

    fn masked_sum(&self, image: &ImageExpr) -> f64 {
        self.pixels
            .iter()
            .filter_map(|px| eval_image(image, px, self.pixel_area_m2))
            .sum()
    }

    fn circle_area(geometry: &Geometry) -> f64 {
        match geometry {
            Geometry::Buffer { distance_m, .. } => {
                std::f64::consts::PI * distance_m * distance_m
            }
            Geometry::Point { .. } => 0.0,
        }
    }
}

impl Default for MockImageryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageryBackend for MockImageryBackend {
    async fn collection_size(&self, _collection: &CollectionExpr) -> Result<u64, BackendError> {
        Ok(self.collection_size)
    }

    async fn region_sum(&self, request: &RegionSum) -> Result<f64, BackendError> {
        self.region_sum_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_region_sum {
            return Err(BackendError::Compute {
                status: 500,
                body: "region reduction failed".into(),
            });
        }
        Ok(self.masked_sum(&request.image))
    }

    async fn geometry_area(&self, request: &GeometryArea) -> Result<f64, BackendError> {
        Ok(self
            .geometry_area_override
            .unwrap_or_else(|| Self::circle_area(&request.geometry)))
    }

    async fn reduce_to_vectors(
        &self,
        request: &VectorizeRequest,
    ) -> Result<Vec<RawFeature>, BackendError> {
        self.vectorize_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_vectorize {
            return Err(BackendError::Compute {
                status: 500,
                body: "vectorization failed".into(),
            });
        }

        let covered: f64 = self
            .pixels
            .iter()
            .filter(|px| eval_mask(&request.image, px))
            .count() as f64
            * self.pixel_area_m2;
        if covered <= 0.0 {
            return Ok(Vec::new());
        }

        // One synthetic polygon standing in for the connected regions.
        let geometry = serde_json::json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [0.001, 0.0], [0.001, 0.001], [0.0, 0.001], [0.0, 0.0]]],
        });
        Ok(vec![RawFeature {
            geometry,
            area_sq_m: covered,
        }])
    }
}
