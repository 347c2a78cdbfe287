//! # trailsync
//!
//! Geotagged photo track extraction and GPS time-offset calibration.
//!
//! This library provides:
//! - Point extraction from photo EXIF data, a cloud photo folder, or GPX files
//! - GPX track reading and writing
//! - Uniform one-second resampling of irregular GPS series
//! - Time-offset calibration of a source series against a reference track
//! - Positional error statistics before and after calibration
//!
//! ## Features
//!
//! - **`parallel`** - Evaluate candidate offsets in parallel with rayon
//! - **`drive`** - HTTP photo catalog for Google Drive folders
//! - **`synthetic`** - Synthetic hike generator for tests and benchmarks
//!
//! ## Quick Start
//!
//! ```rust
//! use time::macros::datetime;
//! use time::Duration;
//! use trailsync::{calibrate, CalibrationConfig, GeoPoint, GeoSeries};
//!
//! let t0 = datetime!(2020-04-27 14:00:00 UTC);
//! let source: GeoSeries = [
//!     GeoPoint::new(t0, 40.0, -105.0),
//!     GeoPoint::new(t0 + Duration::seconds(20), 40.01, -105.01),
//! ]
//! .into_iter()
//! .collect();
//!
//! // Reference clock runs 3 seconds ahead of the photos
//! let reference = source.shifted(3);
//!
//! let calibration = calibrate(&source, &reference, &CalibrationConfig::default()).unwrap();
//! assert_eq!(calibration.best_offset_s, 3);
//! assert!(calibration.best_mean_error_m < 1.0);
//! ```

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::ops::Bound;

use geo::{BoundingRect, MultiPoint, Point};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

// Unified error handling
pub mod error;
pub use error::{OptionExt, Result, SampleError, TrailError};

// Geographic utilities (haversine, planar approximation, bounds)
pub mod geo_utils;
pub use geo_utils::{PlanarMetric, haversine_distance};

// Uniform one-second resampling
pub mod resample;
pub use resample::{SampleKind, UniformSample, UniformSeries, resample};

// Positional error between aligned series
pub mod evaluate;
pub use evaluate::{ErrorSample, ErrorStats, error_samples, mean_error, mean_error_at_offset};

// Time-offset search
pub mod calibration;
pub use calibration::{Calibration, CalibrationConfig, CandidateScore, calibrate};

// GPX reading and writing
pub mod gpx_io;
pub use gpx_io::{load_gpx_file, read_gpx, save_gpx_file, write_gpx};

// Point extraction adapters (photos, cloud folders, track files)
pub mod extract;
pub use extract::{Extraction, ExtractionReport, PointSource, UtcOffsetHours};

// Synthetic hike generator
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A timestamped GPS sample.
///
/// # Example
/// ```
/// use time::macros::datetime;
/// use trailsync::GeoPoint;
///
/// let point = GeoPoint::new(datetime!(2019-02-14 06:28:54 UTC), 36.1069, -112.1129)
///     .with_elevation(2100.0);
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// UTC capture instant
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub latitude: f64,
    pub longitude: f64,
    /// Elevation in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
    /// Dilution of precision reported by the receiver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<f64>,
}

impl GeoPoint {
    /// Create a point without elevation or precision.
    pub fn new(timestamp: OffsetDateTime, latitude: f64, longitude: f64) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            elevation: None,
            precision: None,
        }
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    /// Seconds since the Unix epoch, including the sub-second part.
    pub fn unix_seconds(&self) -> f64 {
        unix_seconds(self.timestamp)
    }

    /// Same coordinates at another instant.
    pub fn at(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(p: GeoPoint) -> Self {
        Point::new(p.longitude, p.latitude)
    }
}

/// Fractional Unix seconds of an instant.
pub fn unix_seconds(t: OffsetDateTime) -> f64 {
    t.unix_timestamp() as f64 + t.nanosecond() as f64 / 1e9
}

/// Bounding box of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Get the center of the bounds as (latitude, longitude).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// A chronologically ordered series of GPS samples with unique timestamps.
///
/// Inserting at an existing timestamp replaces the earlier point, so a series
/// always iterates in strictly increasing time order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoSeries {
    points: BTreeMap<OffsetDateTime, GeoPoint>,
}

impl GeoSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from points in any order. Later duplicates win.
    pub fn from_points(points: impl IntoIterator<Item = GeoPoint>) -> Self {
        points.into_iter().collect()
    }

    /// Insert a point, replacing any point at the same timestamp.
    ///
    /// Returns `false` (and drops the point) if its coordinates are invalid.
    pub fn insert(&mut self, point: GeoPoint) -> bool {
        if !point.is_valid() {
            return false;
        }
        self.points.insert(point.timestamp, point);
        true
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points in chronological order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &GeoPoint> + '_ {
        self.points.values()
    }

    pub fn to_vec(&self) -> Vec<GeoPoint> {
        self.points.values().copied().collect()
    }

    pub fn get(&self, timestamp: OffsetDateTime) -> Option<&GeoPoint> {
        self.points.get(&timestamp)
    }

    pub fn first(&self) -> Option<&GeoPoint> {
        self.points.values().next()
    }

    pub fn last(&self) -> Option<&GeoPoint> {
        self.points.values().next_back()
    }

    pub fn start(&self) -> Option<OffsetDateTime> {
        self.first().map(|p| p.timestamp)
    }

    pub fn end(&self) -> Option<OffsetDateTime> {
        self.last().map(|p| p.timestamp)
    }

    /// Latest point at or before `t`.
    pub fn at_or_before(&self, t: OffsetDateTime) -> Option<&GeoPoint> {
        self.points.range(..=t).next_back().map(|(_, p)| p)
    }

    /// Earliest point at or after `t`.
    pub fn at_or_after(&self, t: OffsetDateTime) -> Option<&GeoPoint> {
        self.points
            .range((Bound::Included(t), Bound::Unbounded))
            .next()
            .map(|(_, p)| p)
    }

    /// Time span covered by the series in seconds (0 for fewer than 2 points).
    pub fn duration_seconds(&self) -> f64 {
        match (self.start(), self.end()) {
            (Some(start), Some(end)) => (end - start).as_seconds_f64(),
            _ => 0.0,
        }
    }

    /// Observed points per second of span.
    ///
    /// Returns `None` when the span is zero.
    pub fn point_density(&self) -> Option<f64> {
        let span = self.duration_seconds();
        if span > 0.0 {
            Some(self.len() as f64 / span)
        } else {
            None
        }
    }

    /// A copy with every timestamp advanced by `offset_s` seconds.
    pub fn shifted(&self, offset_s: i64) -> GeoSeries {
        let delta = Duration::seconds(offset_s);
        self.iter()
            .map(|p| p.at(p.timestamp + delta))
            .collect()
    }

    /// Bounding box of all points.
    pub fn bounds(&self) -> Option<Bounds> {
        let multi: MultiPoint<f64> = self.iter().map(|p| Point::from(*p)).collect();
        let rect = multi.bounding_rect()?;
        Some(Bounds {
            min_lat: rect.min().y,
            max_lat: rect.max().y,
            min_lng: rect.min().x,
            max_lng: rect.max().x,
        })
    }
}

impl FromIterator<GeoPoint> for GeoSeries {
    fn from_iter<I: IntoIterator<Item = GeoPoint>>(iter: I) -> Self {
        let mut series = GeoSeries::new();
        for point in iter {
            series.insert(point);
        }
        series
    }
}

impl<'a> IntoIterator for &'a GeoSeries {
    type Item = &'a GeoPoint;
    type IntoIter = btree_map::Values<'a, OffsetDateTime, GeoPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.values()
    }
}
