//! Unified error handling for trailsync.
//!
//! Structural failures of the calibration core (`InsufficientData`,
//! `NoOverlap`) and I/O failures are [`TrailError`]s and always propagate.
//! Problems with a single photo or track point are [`SampleError`]s; the
//! extraction adapters recover from them by skipping the item.

use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, TrailError>;

/// Errors that abort an operation.
#[derive(Debug, Error)]
pub enum TrailError {
    /// A series has fewer points than the operation needs.
    #[error("{series} series has {point_count} points, at least {minimum_required} required")]
    InsufficientData {
        series: String,
        point_count: usize,
        minimum_required: usize,
    },

    /// The two series share no whole-second timestamps.
    #[error("no overlapping samples between source and reference ({detail})")]
    NoOverlap { detail: String },

    /// An input location had nothing to extract from.
    #[error("no inputs found in {location}")]
    NoInputs { location: String },

    /// No cloud folder with the requested name.
    #[error("folder not found: {name}")]
    FolderNotFound { name: String },

    /// More than one cloud folder with the requested name.
    #[error("{count} folders named {name}, a unique name is needed")]
    AmbiguousFolder { name: String, count: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GPX error: {0}")]
    Gpx(#[from] gpx::errors::GpxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl TrailError {
    pub fn insufficient_data(series: &str, point_count: usize, minimum_required: usize) -> Self {
        TrailError::InsufficientData {
            series: series.to_string(),
            point_count,
            minimum_required,
        }
    }

    pub fn no_overlap(detail: impl Into<String>) -> Self {
        TrailError::NoOverlap {
            detail: detail.into(),
        }
    }
}

/// Per-item extraction failures. Never abort a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SampleError {
    #[error("missing {field}")]
    MissingField { field: &'static str },

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl SampleError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SampleError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Convenience conversions from `Option` into crate errors.
pub trait OptionExt<T> {
    /// Map `None` to [`TrailError::InsufficientData`].
    fn ok_or_insufficient_data(
        self,
        series: &str,
        point_count: usize,
        minimum_required: usize,
    ) -> Result<T>;

    /// Map `None` to [`SampleError::MissingField`].
    fn ok_or_missing(self, field: &'static str) -> std::result::Result<T, SampleError>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_insufficient_data(
        self,
        series: &str,
        point_count: usize,
        minimum_required: usize,
    ) -> Result<T> {
        self.ok_or_else(|| TrailError::insufficient_data(series, point_count, minimum_required))
    }

    fn ok_or_missing(self, field: &'static str) -> std::result::Result<T, SampleError> {
        self.ok_or(SampleError::MissingField { field })
    }
}
