//! # Point Extraction
//!
//! Adapters that turn photo collections and track files into [`GeoSeries`].
//!
//! - [`photos::LocalPhotos`] - EXIF tags of photos in a local directory
//! - [`drive::DrivePhotos`] - photo metadata from a cloud folder
//! - [`track_file::TrackFile`] - an existing GPX track
//!
//! Every adapter recovers from a bad item by skipping it. The item is logged
//! and counted in the [`ExtractionReport`], and the batch continues.

pub mod drive;
pub mod photos;
pub mod track_file;

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::{Result, SampleError, TrailError};
use crate::{GeoPoint, GeoSeries};

/// Something that can produce a series of geo points.
pub trait PointSource {
    /// Human readable name of the input, used in logs and reports.
    fn describe(&self) -> String;

    /// Extract all usable points.
    fn extract(&self) -> Result<Extraction>;
}

/// Points extracted from a source together with the skip accounting.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub series: GeoSeries,
    pub report: ExtractionReport,
}

/// Counts of used and skipped inputs for one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub source: String,
    /// Inputs that produced a point
    pub used: usize,
    /// Inputs skipped for missing or invalid data
    pub skipped: usize,
}

impl ExtractionReport {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            used: 0,
            skipped: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.used + self.skipped
    }

    /// Percentage of inputs skipped (0 when nothing was analyzed).
    pub fn skip_percentage(&self) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.skipped as f64 / self.total() as f64 * 100.0
        }
    }

    pub fn record_used(&mut self) {
        self.used += 1;
    }

    /// Count a skipped item and log why.
    pub fn record_skip(&mut self, item: &str, error: &SampleError) {
        self.skipped += 1;
        warn!("Skipping {}: {}", item, error);
    }

    /// Fold a per-item result into the series and the counters.
    pub(crate) fn collect(
        &mut self,
        series: &mut GeoSeries,
        item: &str,
        point: std::result::Result<GeoPoint, SampleError>,
    ) {
        match point {
            Ok(point) => {
                if series.insert(point) {
                    self.record_used();
                } else {
                    let error = SampleError::invalid(
                        "coordinates",
                        format!("lat {} lon {}", point.latitude, point.longitude),
                    );
                    self.record_skip(item, &error);
                }
            }
            Err(error) => self.record_skip(item, &error),
        }
    }
}

impl fmt::Display for ExtractionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inputs analyzed in <{}>: {} used, {} skipped ({:.2}%)",
            self.total(),
            self.source,
            self.used,
            self.skipped,
            self.skip_percentage()
        )
    }
}

/// Whole-hour offset of the camera clock from UTC (e.g. -4 for EDT).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcOffsetHours(UtcOffset);

impl UtcOffsetHours {
    pub const UTC: UtcOffsetHours = UtcOffsetHours(UtcOffset::UTC);

    pub fn new(hours: i8) -> Result<Self> {
        UtcOffset::from_hms(hours, 0, 0)
            .map(UtcOffsetHours)
            .map_err(|e| TrailError::InvalidConfig(format!("UTC offset {}h: {}", hours, e)))
    }

    pub fn hours(&self) -> i8 {
        self.0.whole_hours()
    }

    /// Interpret a camera-local wall clock time and convert it to UTC.
    ///
    /// Fails when the UTC instant falls outside the supported date range.
    pub fn to_utc(
        &self,
        local: PrimitiveDateTime,
    ) -> std::result::Result<OffsetDateTime, SampleError> {
        local
            .assume_offset(self.0)
            .checked_to_offset(UtcOffset::UTC)
            .ok_or_else(|| {
                SampleError::invalid(
                    "capture time",
                    format!("{} at UTC{:+} is out of range", local, self.hours()),
                )
            })
    }
}

impl Default for UtcOffsetHours {
    fn default() -> Self {
        Self::UTC
    }
}

/// File extensions treated as photos (compared case-insensitively).
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "gif", "png", "tiff", "raw"];

/// Whether a file name has one of the [`PHOTO_EXTENSIONS`].
pub fn is_photo_name(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, ext)| {
        PHOTO_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
    })
}
