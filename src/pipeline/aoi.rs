//! AOI geometry derivation.

use std::f64::consts::PI;

use crate::backend::expr::Geometry;

/// Circular area of interest derived from a center point and a target area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aoi {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: f64,
}

impl Aoi {
    /// Derive the circle covering `area_sq_m` around `(lat, lon)`, assuming
    /// a perfect disk: `radius = sqrt(area / π)`. Radius is positive
    /// whenever the input area is; the caller validates that before this
    /// stage.
    pub fn from_center_and_area(latitude: f64, longitude: f64, area_sq_m: f64) -> Self {
        let radius_m = (area_sq_m / PI).sqrt();
        Self {
            latitude,
            longitude,
            radius_m,
        }
    }

    /// Backend geometry for the AOI: the center point buffered by the
    /// radius.
    pub fn geometry(&self) -> Geometry {
        Geometry::point(self.longitude, self.latitude).buffer(self.radius_m)
    }
}
