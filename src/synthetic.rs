//! Synthetic hike generator for testing and benchmarking.
//!
//! Generates a reference GPS recording and a set of geotagged photos taken
//! along the same path, with a known camera clock error. The clock error is
//! the ground truth that calibration should recover.
//!
//! Feature-gated behind `synthetic`, not included in production builds.
//!
//! # Example
//!
//! ```rust
//! use trailsync::synthetic::HikeScenario;
//! use trailsync::{calibrate, CalibrationConfig};
//!
//! let hike = HikeScenario::day_hike().with_clock_offset(-42).generate();
//! let calibration = calibrate(&hike.photos, &hike.reference, &CalibrationConfig::default()).unwrap();
//! assert_eq!(calibration.best_offset_s, hike.clock_offset_s);
//! ```

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

use crate::{GeoPoint, GeoSeries};

// ============================================================================
// Types
// ============================================================================

/// Shape of the generated path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HikePattern {
    /// Constant heading. Linear interpolation reproduces the path exactly.
    Straight,
    /// Random heading drift of a few degrees per second.
    Winding,
}

/// Scenario configuration for generating a synthetic hike.
#[derive(Debug, Clone)]
pub struct HikeScenario {
    /// Trailhead (latitude, longitude)
    pub origin: (f64, f64),
    /// UTC time the recording starts
    pub start: OffsetDateTime,
    /// Length of the hike in seconds
    pub duration_s: i64,
    /// Walking speed in meters per second
    pub speed_mps: f64,
    pub pattern: HikePattern,
    /// Seconds between reference recorder fixes
    pub reference_interval_s: i64,
    /// Number of photos taken during the hike
    pub photo_count: usize,
    /// Seconds the camera clock runs behind the reference clock.
    /// Photo timestamps are `true time - clock_offset_s`.
    pub clock_offset_s: i64,
    /// GPS noise standard deviation in meters
    pub gps_noise_sigma_meters: f64,
    /// RNG seed for deterministic reproduction
    pub seed: u64,
}

/// A generated hike with ground truth.
#[derive(Debug, Clone)]
pub struct SyntheticHike {
    /// Noise-free path at one sample per second
    pub truth: GeoSeries,
    /// Reference recorder track
    pub reference: GeoSeries,
    /// Photo positions stamped by the (offset) camera clock
    pub photos: GeoSeries,
    /// Offset calibration should find
    pub clock_offset_s: i64,
}

// ============================================================================
// Coordinate Helpers
// ============================================================================

const METERS_PER_DEG_LAT: f64 = 111_320.0;

fn meters_to_deg_lat(meters: f64) -> f64 {
    meters / METERS_PER_DEG_LAT
}

fn meters_to_deg_lng(meters: f64, latitude: f64) -> f64 {
    let meters_per_deg_lng = METERS_PER_DEG_LAT * latitude.to_radians().cos();
    if meters_per_deg_lng.abs() < 1e-10 {
        return 0.0;
    }
    meters / meters_per_deg_lng
}

/// Standard normal sample (Box-Muller).
fn gaussian(rng: &mut StdRng) -> (f64, f64) {
    let u1: f64 = rng.gen_range(0.0001..1.0);
    let u2: f64 = rng.r#gen();
    let r = (-2.0 * u1.ln()).sqrt();
    (r * (2.0 * PI * u2).cos(), r * (2.0 * PI * u2).sin())
}

fn add_gps_noise(point: GeoPoint, sigma_meters: f64, rng: &mut StdRng) -> GeoPoint {
    if sigma_meters <= 0.0 {
        return point;
    }
    let (z0, z1) = gaussian(rng);
    GeoPoint {
        latitude: point.latitude + meters_to_deg_lat(z0 * sigma_meters),
        longitude: point.longitude + meters_to_deg_lng(z1 * sigma_meters, point.latitude),
        ..point
    }
}

// ============================================================================
// Path Generation
// ============================================================================

fn generate_path(scenario: &HikeScenario, rng: &mut StdRng) -> GeoSeries {
    let (mut lat, mut lon) = scenario.origin;
    let mut heading: f64 = rng.gen_range(0.0..(2.0 * PI));
    let mut path = GeoSeries::new();

    for second in 0..=scenario.duration_s {
        let elevation = 1800.0 + 120.0 * (second as f64 / 900.0).sin();
        let timestamp = scenario.start + Duration::seconds(second);
        path.insert(GeoPoint::new(timestamp, lat, lon).with_elevation(elevation));

        if scenario.pattern == HikePattern::Winding {
            heading += rng.gen_range(-0.05..0.05);
        }
        lat += meters_to_deg_lat(scenario.speed_mps * heading.sin());
        lon += meters_to_deg_lng(scenario.speed_mps * heading.cos(), lat);
    }

    path
}

// ============================================================================
// Scenario Implementation
// ============================================================================

impl HikeScenario {
    /// Generate the hike.
    pub fn generate(&self) -> SyntheticHike {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let truth = generate_path(self, &mut rng);
        let interval = self.reference_interval_s.max(1);

        let reference: GeoSeries = truth
            .iter()
            .enumerate()
            .filter(|(i, _)| *i as i64 % interval == 0)
            .map(|(_, p)| {
                let hdop = rng.gen_range(0.8..2.5);
                add_gps_noise(*p, self.gps_noise_sigma_meters, &mut rng).with_precision(hdop)
            })
            .collect();

        // Photos are taken away from the ends so every shifted sample can
        // still land inside the reference recording.
        let margin = self.clock_offset_s.abs() + 1;
        let mut photos = GeoSeries::new();
        if self.duration_s > 2 * margin {
            let clock_error = Duration::seconds(self.clock_offset_s);
            while photos.len() < self.photo_count {
                let second = rng.gen_range(margin..=(self.duration_s - margin));
                let Some(actual) = truth.get(self.start + Duration::seconds(second)) else {
                    continue;
                };
                let noisy = add_gps_noise(*actual, self.gps_noise_sigma_meters, &mut rng);
                photos.insert(noisy.at(actual.timestamp - clock_error));
                if photos.len() as i64 >= self.duration_s - 2 * margin + 1 {
                    break;
                }
            }
        }

        SyntheticHike {
            truth,
            reference,
            photos,
            clock_offset_s: self.clock_offset_s,
        }
    }

    pub fn with_clock_offset(mut self, clock_offset_s: i64) -> Self {
        self.clock_offset_s = clock_offset_s;
        self
    }

    pub fn with_noise(mut self, sigma_meters: f64) -> Self {
        self.gps_noise_sigma_meters = sigma_meters;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

// ============================================================================
// Preset Scenarios
// ============================================================================

impl HikeScenario {
    /// One hour straight-line walk with a clean recorder.
    pub fn day_hike() -> Self {
        Self {
            origin: (40.0, -105.0),
            start: datetime!(2020-04-27 14:00:00 UTC),
            duration_s: 3600,
            speed_mps: 1.3,
            pattern: HikePattern::Straight,
            reference_interval_s: 1,
            photo_count: 40,
            clock_offset_s: 17,
            gps_noise_sigma_meters: 0.0,
            seed: 42,
        }
    }

    /// Winding trail, noisy recorder logging every five seconds.
    pub fn noisy_trail() -> Self {
        Self {
            origin: (36.1069, -112.1129),
            start: datetime!(2019-02-14 14:00:00 UTC),
            duration_s: 2 * 3600,
            speed_mps: 1.1,
            pattern: HikePattern::Winding,
            reference_interval_s: 5,
            photo_count: 120,
            clock_offset_s: -95,
            gps_noise_sigma_meters: 3.0,
            seed: 7,
        }
    }

    /// Long recording for benchmarks.
    pub fn long_expedition() -> Self {
        Self {
            origin: (46.5, 8.0),
            start: datetime!(2021-07-01 05:00:00 UTC),
            duration_s: 10 * 3600,
            speed_mps: 1.0,
            pattern: HikePattern::Winding,
            reference_interval_s: 1,
            photo_count: 400,
            clock_offset_s: 600,
            gps_noise_sigma_meters: 2.0,
            seed: 1234,
        }
    }
}
