//! Tests for evaluate module

use time::Duration;
use time::macros::datetime;
use trailsync::{
    GeoPoint, GeoSeries, PlanarMetric, TrailError, error_samples, mean_error,
    mean_error_at_offset, resample,
};

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

fn t0() -> time::OffsetDateTime {
    datetime!(2020-04-27 14:00:00 UTC)
}

/// Straight walk north: `lat_offset` shifts the whole path.
fn walk(start_s: i64, end_s: i64, lat_offset: f64) -> GeoSeries {
    GeoSeries::from_points([
        GeoPoint::new(t0() + Duration::seconds(start_s), 40.0 + lat_offset, -105.0),
        GeoPoint::new(
            t0() + Duration::seconds(end_s),
            40.0 + lat_offset + (end_s - start_s) as f64 * 1e-5,
            -105.0,
        ),
    ])
}

#[test]
fn test_identical_series_have_zero_error() {
    let series = resample(&walk(0, 20, 0.0));
    let metric = PlanarMetric::at_latitude(40.0);
    let stats = mean_error(&series, &series, &metric).unwrap();

    assert_eq!(stats.mean_distance_m, 0.0);
    assert_eq!(stats.max_distance_m, 0.0);
    assert_eq!(stats.sample_count, 21);
    assert_eq!(stats.skipped_count, 0);
    assert_eq!(stats.matched_count(), 21);
}

#[test]
fn test_constant_displacement() {
    let source = resample(&walk(0, 10, 0.0));
    let reference = resample(&walk(0, 10, 0.001));
    let metric = PlanarMetric::at_latitude(40.0);
    let stats = mean_error(&source, &reference, &metric).unwrap();

    assert!(approx_eq(stats.mean_distance_m, 111.0, 1e-6));
    assert!(approx_eq(stats.max_distance_m, 111.0, 1e-6));
    assert!(approx_eq(stats.mean_squared_distance_m2, 12_321.0, 1e-3));
}

#[test]
fn test_uncovered_seconds_are_skipped_not_zero() {
    // Source covers 0..=10, reference 5..=20: seconds 0..=4 have no match
    let source = resample(&walk(0, 10, 0.0));
    let reference = resample(&walk(5, 20, 0.001));
    let metric = PlanarMetric::at_latitude(40.0);
    let stats = mean_error(&source, &reference, &metric).unwrap();

    assert_eq!(stats.sample_count, 11);
    assert_eq!(stats.skipped_count, 5);
    assert_eq!(stats.matched_count(), 6);
    assert!(stats.mean_distance_m > 100.0);
}

#[test]
fn test_no_overlap_is_an_error() {
    let source = resample(&walk(0, 10, 0.0));
    let reference = resample(&walk(100, 110, 0.0));
    let metric = PlanarMetric::at_latitude(40.0);

    let result = mean_error(&source, &reference, &metric);
    assert!(matches!(result, Err(TrailError::NoOverlap { .. })));
}

#[test]
fn test_offset_aligns_shifted_reference() {
    let source_series = walk(0, 20, 0.0);
    let source = resample(&source_series);
    let reference = resample(&source_series.shifted(3));
    let metric = PlanarMetric::at_latitude(40.0);

    let aligned = mean_error_at_offset(&source, &reference, &metric, 3).unwrap();
    assert!(approx_eq(aligned.mean_distance_m, 0.0, 1e-9));
    assert_eq!(aligned.skipped_count, 0);

    let unaligned = mean_error(&source, &reference, &metric).unwrap();
    assert!(unaligned.mean_distance_m > aligned.mean_distance_m);
    assert_eq!(unaligned.skipped_count, 3);
}

#[test]
fn test_error_samples_residuals() {
    let source = resample(&walk(0, 10, 0.0));
    let reference = resample(&walk(2, 20, 0.001));
    let metric = PlanarMetric::at_latitude(40.0);

    let (samples, skipped) = error_samples(&source, &reference, &metric, 4);
    // Source seconds 0..=10 shifted to 4..=14, all inside 2..=20
    assert_eq!(skipped, 0);
    assert_eq!(samples.len(), 11);
    assert_eq!(samples[0].timestamp, t0() + Duration::seconds(4));
    assert_eq!(samples[0].source_seconds_to_observation, 0.0);
    assert_eq!(samples[5].source_seconds_to_observation, 5.0);
    assert!(samples.iter().all(|s| s.distance_m > 0.0));

    let stats = mean_error_at_offset(&source, &reference, &metric, 4).unwrap();
    let mean = samples.iter().map(|s| s.distance_m).sum::<f64>() / samples.len() as f64;
    assert!(approx_eq(stats.mean_distance_m, mean, 1e-9));
}
