//! # Geographic Utilities
//!
//! Distance computations used by the error evaluator and the calibrator.
//!
//! | Item | Description |
//! |------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two lat/lon pairs |
//! | [`point_distance`] | Haversine distance between two [`GeoPoint`]s |
//! | [`polyline_length`] | Total haversine length of a series |
//! | [`PlanarMetric`] | Locally linearised distance for repeated comparisons |
//!
//! ## Algorithm Notes
//!
//! ### Haversine Formula
//!
//! Spherical Earth with a mean radius of 6 371 000 m:
//!
//! ```text
//! a = sin²(Δφ/2) + cos φ1 · cos φ2 · sin²(Δλ/2)
//! d = 2 · R · asin(√a)
//! ```
//!
//! ### Planar Approximation
//!
//! Within one hike the latitude range is narrow, so the calibrator scales
//! degree differences by two constants instead of evaluating trigonometry for
//! every compared pair. A degree of latitude is taken as 111 km. A degree of
//! longitude is measured once with the haversine formula at a representative
//! latitude.

use serde::{Deserialize, Serialize};

use crate::{GeoPoint, GeoSeries};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude (approximately constant).
pub const METERS_PER_DEGREE_LAT: f64 = 111_000.0;

/// Great-circle distance in meters between two lat/lon pairs in degrees.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points
    2.0 * EARTH_RADIUS_M * a.sqrt().min(1.0).asin()
}

/// Haversine distance between two points in meters.
pub fn point_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    haversine_distance(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// Total length of the series path in meters.
pub fn polyline_length(series: &GeoSeries) -> f64 {
    let points = series.to_vec();
    points.windows(2).map(|w| point_distance(&w[0], &w[1])).sum()
}

/// Locally linearised distance metric.
///
/// Build once per calibration run with [`PlanarMetric::at_latitude`], then
/// reuse for every comparison in that run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanarMetric {
    /// Meters spanned by one degree of latitude
    pub meters_per_degree_lat: f64,
    /// Meters spanned by one degree of longitude at the reference latitude
    pub meters_per_degree_lon: f64,
}

impl PlanarMetric {
    /// Metric for a track located around `latitude_deg`.
    pub fn at_latitude(latitude_deg: f64) -> Self {
        Self {
            meters_per_degree_lat: METERS_PER_DEGREE_LAT,
            meters_per_degree_lon: haversine_distance(latitude_deg, 0.0, latitude_deg, 1.0),
        }
    }

    /// Squared planar distance in m².
    pub fn squared_distance(&self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        let dy = (a.latitude - b.latitude) * self.meters_per_degree_lat;
        let dx = (a.longitude - b.longitude) * self.meters_per_degree_lon;
        dy * dy + dx * dx
    }

    /// Planar distance in meters.
    pub fn distance(&self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        self.squared_distance(a, b).sqrt()
    }
}
