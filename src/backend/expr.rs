//! Declarative expression model for the imagery compute backend.
//!
//! The pipeline never touches pixels. It composes these serializable
//! expressions — geometry construction, collection filtering, per-pixel
//! algebra, region reduction, vectorization — and asks the backend to
//! materialize a number or a feature set. Each enum serializes with an `op`
//! tag so the backend can dispatch on the node kind.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════
// Geometry
// ═══════════════════════════════════════════════════════════

/// Region geometry, built client-side and resolved by the backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Geometry {
    /// Longitude/latitude point in degrees.
    Point { coordinates: [f64; 2] },
    /// Buffer around a geometry by a distance in meters.
    #[serde(rename_all = "camelCase")]
    Buffer {
        input: Box<Geometry>,
        distance_m: f64,
    },
}

impl Geometry {
    pub fn point(lon: f64, lat: f64) -> Self {
        Geometry::Point {
            coordinates: [lon, lat],
        }
    }

    pub fn buffer(self, distance_m: f64) -> Self {
        Geometry::Buffer {
            input: Box::new(self),
            distance_m,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Image collections
// ═══════════════════════════════════════════════════════════

/// A filtered stack of time-stamped scenes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum CollectionExpr {
    /// Named source collection on the backend.
    Source { id: String },
    /// Keep scenes intersecting a geometry.
    #[serde(rename_all = "camelCase")]
    FilterBounds {
        input: Box<CollectionExpr>,
        geometry: Geometry,
    },
    /// Keep scenes acquired within `[start, end)`.
    #[serde(rename_all = "camelCase")]
    FilterDate {
        input: Box<CollectionExpr>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// Keep scenes whose metadata property is strictly below a bound.
    #[serde(rename_all = "camelCase")]
    FilterMetadataLt {
        input: Box<CollectionExpr>,
        property: String,
        value: f64,
    },
    /// Mask out, in every scene, pixels where any of the given bits of the
    /// quality band is set.
    #[serde(rename_all = "camelCase")]
    MaskQaBits {
        input: Box<CollectionExpr>,
        band: String,
        bits: Vec<u8>,
    },
}

impl CollectionExpr {
    pub fn source(id: impl Into<String>) -> Self {
        CollectionExpr::Source { id: id.into() }
    }

    pub fn filter_bounds(self, geometry: Geometry) -> Self {
        CollectionExpr::FilterBounds {
            input: Box::new(self),
            geometry,
        }
    }

    pub fn filter_date(self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        CollectionExpr::FilterDate {
            input: Box::new(self),
            start,
            end,
        }
    }

    pub fn filter_metadata_lt(self, property: impl Into<String>, value: f64) -> Self {
        CollectionExpr::FilterMetadataLt {
            input: Box::new(self),
            property: property.into(),
            value,
        }
    }

    pub fn mask_qa_bits(self, band: impl Into<String>, bits: impl Into<Vec<u8>>) -> Self {
        CollectionExpr::MaskQaBits {
            input: Box::new(self),
            band: band.into(),
            bits: bits.into(),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Images
// ═══════════════════════════════════════════════════════════

/// A single raster, possibly masked, derived by per-pixel algebra.
/// Boolean images use 0 = false / 1 = true; masked-out pixels carry no
/// value and are excluded from reductions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ImageExpr {
    /// Per-pixel median of a collection across time.
    Median { input: CollectionExpr },
    /// Restrict an image to a geometry.
    Clip {
        input: Box<ImageExpr>,
        geometry: Geometry,
    },
    /// `(a - b) / (a + b)` over two bands of the input image.
    #[serde(rename_all = "camelCase")]
    NormalizedDifference {
        input: Box<ImageExpr>,
        band_a: String,
        band_b: String,
    },
    /// 1 where the input exceeds `value`, else 0.
    Gt { input: Box<ImageExpr>, value: f64 },
    /// 1 where both operands are non-zero.
    And {
        lhs: Box<ImageExpr>,
        rhs: Box<ImageExpr>,
    },
    /// 1 where the input is zero.
    Not { input: Box<ImageExpr> },
    /// Per-pixel sum.
    Add {
        lhs: Box<ImageExpr>,
        rhs: Box<ImageExpr>,
    },
    /// 1 where the input equals `value`.
    Eq { input: Box<ImageExpr>, value: f64 },
    /// Per-pixel area in square meters.
    PixelArea,
    /// Mask the input wherever `mask` is zero or masked out.
    UpdateMask {
        input: Box<ImageExpr>,
        mask: Box<ImageExpr>,
    },
    /// Mask the image by its own non-zero pixels.
    SelfMask { input: Box<ImageExpr> },
}

impl ImageExpr {
    pub fn median(input: CollectionExpr) -> Self {
        ImageExpr::Median { input }
    }

    pub fn pixel_area() -> Self {
        ImageExpr::PixelArea
    }

    pub fn clip(self, geometry: Geometry) -> Self {
        ImageExpr::Clip {
            input: Box::new(self),
            geometry,
        }
    }

    pub fn normalized_difference(
        self,
        band_a: impl Into<String>,
        band_b: impl Into<String>,
    ) -> Self {
        ImageExpr::NormalizedDifference {
            input: Box::new(self),
            band_a: band_a.into(),
            band_b: band_b.into(),
        }
    }

    pub fn gt(self, value: f64) -> Self {
        ImageExpr::Gt {
            input: Box::new(self),
            value,
        }
    }

    pub fn and(self, rhs: ImageExpr) -> Self {
        ImageExpr::And {
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }

    pub fn not(self) -> Self {
        ImageExpr::Not {
            input: Box::new(self),
        }
    }

    pub fn add(self, rhs: ImageExpr) -> Self {
        ImageExpr::Add {
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }

    pub fn eq(self, value: f64) -> Self {
        ImageExpr::Eq {
            input: Box::new(self),
            value,
        }
    }

    pub fn update_mask(self, mask: ImageExpr) -> Self {
        ImageExpr::UpdateMask {
            input: Box::new(self),
            mask: Box::new(mask),
        }
    }

    pub fn self_mask(self) -> Self {
        ImageExpr::SelfMask {
            input: Box::new(self),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Materialization requests and results
// ═══════════════════════════════════════════════════════════

/// Sum of a per-pixel image over a region at a fixed scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSum {
    pub image: ImageExpr,
    pub geometry: Geometry,
    pub scale_m: f64,
    pub max_pixels: f64,
}

/// Geodesic area of a geometry, in square meters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryArea {
    pub geometry: Geometry,
    pub max_error_m: f64,
}

/// Raster-to-polygon conversion over a masked image: contiguous unmasked
/// regions become polygons, grouped by the labeled band value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorizeRequest {
    pub image: ImageExpr,
    pub geometry: Geometry,
    pub scale_m: f64,
    pub geometry_type: &'static str,
    pub label_property: &'static str,
    pub max_pixels: f64,
    /// Let the backend approximate under tight compute limits rather than
    /// fail outright.
    pub best_effort: bool,
}

/// One polygon produced by vectorization: its GeoJSON geometry plus the
/// backend-computed geodesic area.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawFeature {
    pub geometry: serde_json::Value,
    pub area_sq_m: f64,
}
