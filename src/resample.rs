//! Uniform one-second resampling.
//!
//! [`resample`] turns an irregular [`GeoSeries`] into a [`UniformSeries`]
//! holding exactly one sample per whole second between the first and last
//! observation. Seconds that coincide with an observation pass it through;
//! all others are linearly interpolated between the bracketing observations.
//! Nothing is extrapolated past either end.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{GeoPoint, GeoSeries};

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// Where a uniform sample came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleKind {
    /// An observation that fell exactly on the whole second
    Observed,
    /// Linearly interpolated between two observations
    Interpolated,
}

/// One sample of a uniform series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformSample {
    pub point: GeoPoint,
    pub kind: SampleKind,
    /// Time distance to the closest real observation (0 for observed samples)
    pub seconds_to_nearest_observation: f64,
}

/// A series with exactly one sample per whole Unix second and no gaps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformSeries {
    samples: BTreeMap<i64, UniformSample>,
}

impl UniformSeries {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sample at a whole Unix second.
    pub fn get(&self, second: i64) -> Option<&UniformSample> {
        self.samples.get(&second)
    }

    pub fn point_at(&self, second: i64) -> Option<&GeoPoint> {
        self.get(second).map(|s| &s.point)
    }

    /// `(unix_second, sample)` pairs in increasing time order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (i64, &UniformSample)> + '_ {
        self.samples.iter().map(|(s, sample)| (*s, sample))
    }

    pub fn first_second(&self) -> Option<i64> {
        self.samples.keys().next().copied()
    }

    pub fn last_second(&self) -> Option<i64> {
        self.samples.keys().next_back().copied()
    }

    pub fn observed_count(&self) -> usize {
        self.samples
            .values()
            .filter(|s| s.kind == SampleKind::Observed)
            .count()
    }

    pub fn interpolated_count(&self) -> usize {
        self.len() - self.observed_count()
    }

    /// A copy with every second advanced by `offset_s`.
    pub fn shifted(&self, offset_s: i64) -> UniformSeries {
        let delta = Duration::seconds(offset_s);
        let samples = self
            .samples
            .iter()
            .map(|(second, sample)| {
                let mut moved = *sample;
                moved.point.timestamp += delta;
                (second + offset_s, moved)
            })
            .collect();
        UniformSeries { samples }
    }

    /// Drop the sample metadata and keep the points.
    pub fn to_geo_series(&self) -> GeoSeries {
        self.samples.values().map(|s| s.point).collect()
    }
}

/// Resample a series to one sample per whole second.
///
/// Covers every second in `[ceil(first), floor(last)]`. An empty series gives
/// an empty result and a single point gives at most one sample; neither is an
/// error here (the calibrator enforces its own minimums).
///
/// # Example
/// ```
/// use time::macros::datetime;
/// use time::Duration;
/// use trailsync::{resample, GeoPoint, GeoSeries};
///
/// let t0 = datetime!(2020-01-01 0:00 UTC);
/// let series = GeoSeries::from_points([
///     GeoPoint::new(t0, 0.0, 0.0),
///     GeoPoint::new(t0 + Duration::seconds(10), 10.0, 20.0),
/// ]);
///
/// let uniform = resample(&series);
/// assert_eq!(uniform.len(), 11);
/// let mid = uniform.point_at(t0.unix_timestamp() + 5).unwrap();
/// assert_eq!((mid.latitude, mid.longitude), (5.0, 10.0));
/// ```
pub fn resample(series: &GeoSeries) -> UniformSeries {
    let points = series.to_vec();
    let nanos: Vec<i128> = points
        .iter()
        .map(|p| p.timestamp.unix_timestamp_nanos())
        .collect();

    let (Some(&first_ns), Some(&last_ns)) = (nanos.first(), nanos.last()) else {
        return UniformSeries::default();
    };

    let first_second = ceil_seconds(first_ns);
    let last_second = last_ns.div_euclid(NANOS_PER_SECOND) as i64;

    let mut samples = BTreeMap::new();
    let mut i = 0usize;

    for second in first_second..=last_second {
        let t_ns = second as i128 * NANOS_PER_SECOND;

        // Advance so that nanos[i] <= t < nanos[i + 1]
        while i + 1 < nanos.len() && nanos[i + 1] <= t_ns {
            i += 1;
        }

        if nanos[i] == t_ns {
            samples.insert(
                second,
                UniformSample {
                    point: points[i],
                    kind: SampleKind::Observed,
                    seconds_to_nearest_observation: 0.0,
                },
            );
            continue;
        }

        if i + 1 >= nanos.len() || nanos[i] > t_ns {
            // No bracketing pair; never extrapolate
            continue;
        }

        let (before, after) = (&points[i], &points[i + 1]);
        let since_before = t_ns - nanos[i];
        let until_after = nanos[i + 1] - t_ns;
        let fraction = since_before as f64 / (nanos[i + 1] - nanos[i]) as f64;

        let point = GeoPoint {
            timestamp: before.timestamp + Duration::nanoseconds(since_before as i64),
            latitude: lerp(before.latitude, after.latitude, fraction),
            longitude: lerp(before.longitude, after.longitude, fraction),
            elevation: lerp_optional(before.elevation, after.elevation, fraction),
            precision: lerp_optional(before.precision, after.precision, fraction),
        };

        samples.insert(
            second,
            UniformSample {
                point,
                kind: SampleKind::Interpolated,
                seconds_to_nearest_observation: since_before.min(until_after) as f64
                    / NANOS_PER_SECOND as f64,
            },
        );
    }

    UniformSeries { samples }
}

fn ceil_seconds(nanos: i128) -> i64 {
    let floor = nanos.div_euclid(NANOS_PER_SECOND);
    if nanos.rem_euclid(NANOS_PER_SECOND) == 0 {
        floor as i64
    } else {
        floor as i64 + 1
    }
}

fn lerp(v1: f64, v2: f64, fraction: f64) -> f64 {
    v1 + fraction * (v2 - v1)
}

fn lerp_optional(v1: Option<f64>, v2: Option<f64>, fraction: f64) -> Option<f64> {
    match (v1, v2) {
        (Some(a), Some(b)) => Some(lerp(a, b, fraction)),
        _ => None,
    }
}
