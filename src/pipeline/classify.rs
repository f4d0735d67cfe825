//! Spectral-index classification into four disjoint land-cover masks.

use std::fmt;

use crate::backend::expr::ImageExpr;

use super::composite::CompositeImage;

/// Green band of the source collection.
pub const BAND_GREEN: &str = "B3";
/// Red band.
pub const BAND_RED: &str = "B4";
/// Near-infrared band.
pub const BAND_NIR: &str = "B8";

/// NDWI above this is water.
pub const NDWI_WATER_MIN: f64 = 0.30;
/// NDVI above this carries enough vegetation signal for agriculture.
pub const NDVI_AGRI_MIN: f64 = 0.35;
/// NDVI above this is forest.
pub const NDVI_FOREST_MIN: f64 = 0.60;

/// The four land-cover classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandCoverClass {
    Water,
    Forest,
    Agriculture,
    Infrastructure,
}

impl LandCoverClass {
    /// Stable lowercase label used in feature properties.
    pub fn label(self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Forest => "forest",
            Self::Agriculture => "agriculture",
            Self::Infrastructure => "infrastructure",
        }
    }
}

impl fmt::Display for LandCoverClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Boolean masks partitioning the AOI.
///
/// Mutually exclusive and collectively exhaustive by construction:
/// agriculture subtracts water and forest, and infrastructure is the
/// complement of the union of the other three.
#[derive(Debug, Clone)]
pub struct ClassMasks {
    pub water: ImageExpr,
    pub forest: ImageExpr,
    pub agriculture: ImageExpr,
    pub infrastructure: ImageExpr,
}

/// Classify a composite into the four class masks.
///
/// The cascade order is load-bearing. Water and forest are thresholded
/// independently; agriculture requires a vegetation signal while excluding
/// both; infrastructure is the complement of the union, not a fifth
/// threshold. A pixel over both the water and forest thresholds therefore
/// partitions into water, never into agriculture.
pub fn classify(composite: &CompositeImage) -> ClassMasks {
    let ndwi = composite
        .expr()
        .clone()
        .normalized_difference(BAND_GREEN, BAND_NIR);
    let ndvi = composite
        .expr()
        .clone()
        .normalized_difference(BAND_NIR, BAND_RED);

    let water = ndwi.gt(NDWI_WATER_MIN);
    let forest = ndvi.clone().gt(NDVI_FOREST_MIN);
    let agriculture = ndvi
        .gt(NDVI_AGRI_MIN)
        .and(forest.clone().not())
        .and(water.clone().not());
    let infrastructure = water
        .clone()
        .add(forest.clone())
        .add(agriculture.clone())
        .eq(0.0);

    ClassMasks {
        water,
        forest,
        agriculture,
        infrastructure,
    }
}
