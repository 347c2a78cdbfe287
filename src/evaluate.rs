//! Positional error between two uniform series.
//!
//! Every source second is compared with the reference sample at the same
//! second (after applying an optional whole-second offset). Seconds the
//! reference does not cover are skipped and counted, never treated as zero.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::error::{Result, TrailError};
use crate::geo_utils::PlanarMetric;
use crate::resample::{UniformSample, UniformSeries};

/// Positional error at one aligned second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorSample {
    /// Aligned instant (source time plus offset)
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Planar distance to the reference sample in meters
    pub distance_m: f64,
    /// How far the source sample is from a real source observation
    pub source_seconds_to_observation: f64,
}

/// Aggregate error of a source series against a reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    /// Mean planar distance over matched samples (L1)
    pub mean_distance_m: f64,
    /// Mean squared planar distance over matched samples (L2)
    pub mean_squared_distance_m2: f64,
    /// Largest single-sample distance
    pub max_distance_m: f64,
    /// Source samples considered
    pub sample_count: usize,
    /// Source samples without a reference counterpart
    pub skipped_count: usize,
}

impl ErrorStats {
    /// Samples that contributed to the mean.
    pub fn matched_count(&self) -> usize {
        self.sample_count - self.skipped_count
    }
}

/// Mean error with the series aligned as they are.
pub fn mean_error(
    source: &UniformSeries,
    reference: &UniformSeries,
    metric: &PlanarMetric,
) -> Result<ErrorStats> {
    mean_error_at_offset(source, reference, metric, 0)
}

/// Mean error with every source second advanced by `offset_s`.
///
/// Fails with [`TrailError::NoOverlap`] when no source second has a
/// reference counterpart.
pub fn mean_error_at_offset(
    source: &UniformSeries,
    reference: &UniformSeries,
    metric: &PlanarMetric,
    offset_s: i64,
) -> Result<ErrorStats> {
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    let mut max: f64 = 0.0;

    let skipped = for_each_match(source, reference, offset_s, |src, reference| {
        let sq = metric.squared_distance(&src.point, &reference.point);
        let d = sq.sqrt();
        sum += d;
        sum_sq += sq;
        max = max.max(d);
    });

    let sample_count = source.len();
    let matched = sample_count - skipped;
    if matched == 0 {
        return Err(TrailError::no_overlap(format!(
            "{} source samples at offset {}s, none covered by reference",
            sample_count, offset_s
        )));
    }

    Ok(ErrorStats {
        mean_distance_m: sum / matched as f64,
        mean_squared_distance_m2: sum_sq / matched as f64,
        max_distance_m: max,
        sample_count,
        skipped_count: skipped,
    })
}

/// Per-second residuals at `offset_s`, plus the number of skipped seconds.
pub fn error_samples(
    source: &UniformSeries,
    reference: &UniformSeries,
    metric: &PlanarMetric,
    offset_s: i64,
) -> (Vec<ErrorSample>, usize) {
    let delta = Duration::seconds(offset_s);
    let mut samples = Vec::with_capacity(source.len());

    let skipped = for_each_match(source, reference, offset_s, |src, reference| {
        samples.push(ErrorSample {
            timestamp: src.point.timestamp + delta,
            distance_m: metric.distance(&src.point, &reference.point),
            source_seconds_to_observation: src.seconds_to_nearest_observation,
        });
    });

    (samples, skipped)
}

/// Call `f` for each source sample whose shifted second exists in the
/// reference. Returns the number of skipped source samples.
fn for_each_match(
    source: &UniformSeries,
    reference: &UniformSeries,
    offset_s: i64,
    mut f: impl FnMut(&UniformSample, &UniformSample),
) -> usize {
    let mut skipped = 0;
    for (second, src) in source.iter() {
        match reference.get(second + offset_s) {
            Some(reference) => f(src, reference),
            None => skipped += 1,
        }
    }
    skipped
}
