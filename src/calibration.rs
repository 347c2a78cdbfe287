//! Time-offset calibration.
//!
//! Finds the whole-second shift that best aligns a source series (for
//! example photo EXIF positions) with a reference track (for example a GPS
//! watch recording).
//!
//! The search is exhaustive over an inclusive integer range. The error
//! surface is neither smooth nor unimodal: terrain and interpolation
//! artifacts produce local minima. Every candidate in the range is therefore
//! scored, and the first strict minimum in ascending offset order wins.
//!
//! Shifting a series by a whole number of seconds moves its resampling grid
//! by the same amount, so "shift, then resample" equals "resample, then
//! re-key". The source is resampled once and each candidate offset is
//! applied to the whole-second keys during evaluation.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{OptionExt, Result, TrailError};
use crate::evaluate::{ErrorStats, mean_error, mean_error_at_offset};
use crate::geo_utils::PlanarMetric;
use crate::resample::{UniformSeries, resample};
use crate::{GeoSeries, unix_seconds};

/// Points needed in each series before calibrating.
pub const MIN_CALIBRATION_POINTS: usize = 2;

/// Configuration for offset calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Clamp the search range to `[-limit, limit]` seconds.
    /// Offset 0 is always searched. Default: None (range set by the series spans)
    pub max_abs_offset_s: Option<i64>,

    /// Matched samples a candidate needs to be scored at all.
    /// Default: 1
    pub min_overlap_samples: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            max_abs_offset_s: None,
            min_overlap_samples: 1,
        }
    }
}

impl CalibrationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_overlap_samples == 0 {
            return Err(TrailError::InvalidConfig(
                "min_overlap_samples must be at least 1".to_string(),
            ));
        }
        if let Some(limit) = self.max_abs_offset_s {
            if limit < 0 {
                return Err(TrailError::InvalidConfig(format!(
                    "max_abs_offset_s must not be negative (got {})",
                    limit
                )));
            }
        }
        Ok(())
    }
}

/// Score of one candidate offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub offset_s: i64,
    /// `None` when the candidate has too little overlap with the reference
    pub stats: Option<ErrorStats>,
}

impl CandidateScore {
    pub fn mean_error_m(&self) -> Option<f64> {
        self.stats.map(|s| s.mean_distance_m)
    }
}

/// Result of a calibration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    /// Seconds to add to the source timestamps
    pub best_offset_s: i64,
    pub best_mean_error_m: f64,
    pub best_stats: ErrorStats,
    /// Mean error with no shift applied, if the series overlap at all
    pub baseline_mean_error_m: Option<f64>,
    pub baseline_stats: Option<ErrorStats>,
    /// Inclusive `(min, max)` offsets searched
    pub search_range: (i64, i64),
    /// Every candidate in ascending offset order
    pub candidates: Vec<CandidateScore>,
    /// Planar metric used for the whole run
    pub metric: PlanarMetric,
}

impl Calibration {
    /// Relative error reduction against the unshifted baseline, in percent.
    ///
    /// `None` when there is no baseline. A zero baseline reports 0%.
    pub fn improvement_percent(&self) -> Option<f64> {
        let baseline = self.baseline_mean_error_m?;
        if baseline > 0.0 {
            Some((baseline - self.best_mean_error_m) / baseline * 100.0)
        } else {
            Some(0.0)
        }
    }

    /// The source series with the calibrated offset applied.
    pub fn apply(&self, source: &GeoSeries) -> GeoSeries {
        source.shifted(self.best_offset_s)
    }
}

/// Find the whole-second offset that minimises mean positional error.
///
/// Fails with [`TrailError::InsufficientData`] if either series has fewer
/// than two points, and with [`TrailError::NoOverlap`] if no candidate offset
/// brings the series into overlap.
pub fn calibrate(
    source: &GeoSeries,
    reference: &GeoSeries,
    config: &CalibrationConfig,
) -> Result<Calibration> {
    config.validate()?;

    if source.len() < MIN_CALIBRATION_POINTS {
        return Err(TrailError::insufficient_data(
            "source",
            source.len(),
            MIN_CALIBRATION_POINTS,
        ));
    }
    if reference.len() < MIN_CALIBRATION_POINTS {
        return Err(TrailError::insufficient_data(
            "reference",
            reference.len(),
            MIN_CALIBRATION_POINTS,
        ));
    }

    let (min_offset, max_offset) = search_range(source, reference, config);

    let reference_uniform = resample(reference);
    let source_uniform = resample(source);

    // Latitude range within one track is narrow; one scale factor per run
    let metric = source
        .first()
        .map(|p| PlanarMetric::at_latitude(p.latitude))
        .ok_or_insufficient_data("source", 0, MIN_CALIBRATION_POINTS)?;

    info!(
        "[Calibration] Testing offsets [{}, {}] ({} source / {} reference samples)",
        min_offset,
        max_offset,
        source_uniform.len(),
        reference_uniform.len()
    );

    let baseline_stats = mean_error(&source_uniform, &reference_uniform, &metric).ok();

    let candidates = score_candidates(
        &source_uniform,
        &reference_uniform,
        &metric,
        (min_offset, max_offset),
        config.min_overlap_samples,
    );

    let (best_offset_s, best_stats) = select_best(&candidates).ok_or_else(|| {
        TrailError::no_overlap(format!(
            "no offset in [{}, {}] aligns the series",
            min_offset, max_offset
        ))
    })?;

    let calibration = Calibration {
        best_offset_s,
        best_mean_error_m: best_stats.mean_distance_m,
        best_stats,
        baseline_mean_error_m: baseline_stats.map(|s| s.mean_distance_m),
        baseline_stats,
        search_range: (min_offset, max_offset),
        candidates,
        metric,
    };

    match (calibration.baseline_mean_error_m, calibration.improvement_percent()) {
        (Some(baseline), Some(pct)) => info!(
            "[Calibration] Calibrated error {:.2}m ({:.2}% reduction from {:.2}m) @ offset {}s",
            calibration.best_mean_error_m, pct, baseline, best_offset_s
        ),
        _ => info!(
            "[Calibration] Calibrated error {:.2}m @ offset {}s (no overlap without shift)",
            calibration.best_mean_error_m, best_offset_s
        ),
    }

    Ok(calibration)
}

/// Inclusive offset range: from aligning the starts to aligning the ends,
/// always including zero.
fn search_range(
    source: &GeoSeries,
    reference: &GeoSeries,
    config: &CalibrationConfig,
) -> (i64, i64) {
    let span = |series: &GeoSeries| match (series.start(), series.end()) {
        (Some(start), Some(end)) => (unix_seconds(start), unix_seconds(end)),
        _ => (0.0, 0.0),
    };
    let (src_start, src_end) = span(source);
    let (ref_start, ref_end) = span(reference);

    let mut min_offset = ((ref_start - src_start).floor() as i64).min(0);
    let mut max_offset = ((ref_end - src_end).ceil() as i64).max(0);

    if let Some(limit) = config.max_abs_offset_s {
        min_offset = min_offset.max(-limit);
        max_offset = max_offset.min(limit);
    }

    (min_offset, max_offset)
}

fn score_candidates(
    source: &UniformSeries,
    reference: &UniformSeries,
    metric: &PlanarMetric,
    (min_offset, max_offset): (i64, i64),
    min_overlap_samples: usize,
) -> Vec<CandidateScore> {
    let score = |offset_s: i64| {
        let stats = mean_error_at_offset(source, reference, metric, offset_s)
            .ok()
            .filter(|s| s.matched_count() >= min_overlap_samples);
        debug!(
            "[Calibration] offset {}s -> {:?}",
            offset_s,
            stats.map(|s| s.mean_distance_m)
        );
        CandidateScore { offset_s, stats }
    };

    // Collect preserves ascending offset order for the tie-break
    #[cfg(feature = "parallel")]
    let candidates: Vec<CandidateScore> = (min_offset..=max_offset)
        .into_par_iter()
        .map(score)
        .collect();

    #[cfg(not(feature = "parallel"))]
    let candidates: Vec<CandidateScore> = (min_offset..=max_offset).map(score).collect();

    candidates
}

/// First strict minimum in ascending offset order.
fn select_best(candidates: &[CandidateScore]) -> Option<(i64, ErrorStats)> {
    let mut best: Option<(i64, ErrorStats)> = None;
    for candidate in candidates {
        let Some(stats) = candidate.stats else {
            continue;
        };
        match best {
            Some((_, current)) if stats.mean_distance_m >= current.mean_distance_m => {}
            _ => best = Some((candidate.offset_s, stats)),
        }
    }
    best
}
