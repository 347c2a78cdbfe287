//! Tests for resample module

use time::Duration;
use time::macros::datetime;
use trailsync::{GeoPoint, GeoSeries, SampleKind, resample};

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

fn t0() -> time::OffsetDateTime {
    datetime!(2020-04-27 14:00:00 UTC)
}

fn two_point_series(start_ms: i64, end_ms: i64) -> GeoSeries {
    GeoSeries::from_points([
        GeoPoint::new(t0() + Duration::milliseconds(start_ms), 40.0, -105.0),
        GeoPoint::new(t0() + Duration::milliseconds(end_ms), 40.01, -105.01),
    ])
}

#[test]
fn test_sample_count_whole_seconds() {
    let uniform = resample(&two_point_series(0, 20_000));
    assert_eq!(uniform.len(), 21);
}

#[test]
fn test_sample_count_fractional_endpoints() {
    // ceil(0.3) = 1, floor(10.7) = 10
    let uniform = resample(&two_point_series(300, 10_700));
    assert_eq!(uniform.len(), 10);
    let base = t0().unix_timestamp();
    assert_eq!(uniform.first_second(), Some(base + 1));
    assert_eq!(uniform.last_second(), Some(base + 10));
    assert_eq!(uniform.observed_count(), 0);
}

#[test]
fn test_seconds_distinct_and_increasing() {
    let uniform = resample(&two_point_series(250, 15_500));
    let seconds: Vec<i64> = uniform.iter().map(|(s, _)| s).collect();
    assert!(seconds.windows(2).all(|w| w[1] == w[0] + 1));
    for (second, sample) in uniform.iter() {
        assert_eq!(sample.point.timestamp.unix_timestamp(), second);
        assert_eq!(sample.point.timestamp.nanosecond(), 0);
    }
}

#[test]
fn test_endpoints_are_exact() {
    let series = two_point_series(0, 20_000);
    let uniform = resample(&series);
    let first = uniform.get(uniform.first_second().unwrap()).unwrap();
    let last = uniform.get(uniform.last_second().unwrap()).unwrap();

    assert_eq!(first.kind, SampleKind::Observed);
    assert_eq!(last.kind, SampleKind::Observed);
    assert_eq!(&first.point, series.first().unwrap());
    assert_eq!(&last.point, series.last().unwrap());
    assert_eq!(uniform.observed_count(), 2);
    assert_eq!(uniform.interpolated_count(), 19);
}

#[test]
fn test_linear_interpolation() {
    let series = GeoSeries::from_points([
        GeoPoint::new(t0(), 0.0, 0.0),
        GeoPoint::new(t0() + Duration::seconds(10), 10.0, 20.0),
    ]);
    let uniform = resample(&series);
    let mid = uniform.get(t0().unix_timestamp() + 5).unwrap();

    assert_eq!(mid.kind, SampleKind::Interpolated);
    assert!(approx_eq(mid.point.latitude, 5.0, 1e-12));
    assert!(approx_eq(mid.point.longitude, 10.0, 1e-12));
    assert_eq!(mid.seconds_to_nearest_observation, 5.0);

    let early = uniform.get(t0().unix_timestamp() + 3).unwrap();
    assert_eq!(early.seconds_to_nearest_observation, 3.0);
    let late = uniform.get(t0().unix_timestamp() + 8).unwrap();
    assert_eq!(late.seconds_to_nearest_observation, 2.0);
}

#[test]
fn test_interpolation_across_several_observations() {
    let series = GeoSeries::from_points([
        GeoPoint::new(t0(), 0.0, 0.0),
        GeoPoint::new(t0() + Duration::seconds(2), 2.0, 0.0),
        GeoPoint::new(t0() + Duration::seconds(6), 2.0, 4.0),
    ]);
    let uniform = resample(&series);
    assert_eq!(uniform.len(), 7);

    let at = |s: i64| uniform.point_at(t0().unix_timestamp() + s).unwrap();
    assert!(approx_eq(at(1).latitude, 1.0, 1e-12));
    assert!(approx_eq(at(4).latitude, 2.0, 1e-12));
    assert!(approx_eq(at(4).longitude, 2.0, 1e-12));
}

#[test]
fn test_optional_fields_interpolate_when_both_present() {
    let series = GeoSeries::from_points([
        GeoPoint::new(t0(), 0.0, 0.0)
            .with_elevation(100.0)
            .with_precision(1.0),
        GeoPoint::new(t0() + Duration::seconds(4), 0.0, 0.0)
            .with_elevation(200.0),
    ]);
    let uniform = resample(&series);
    let sample = uniform.point_at(t0().unix_timestamp() + 1).unwrap();
    assert_eq!(sample.elevation, Some(125.0));
    assert_eq!(sample.precision, None);
}

#[test]
fn test_empty_and_single_point() {
    assert!(resample(&GeoSeries::new()).is_empty());

    let single = GeoSeries::from_points([GeoPoint::new(t0(), 40.0, -105.0)]);
    assert_eq!(resample(&single).len(), 1);

    let fractional = GeoSeries::from_points([GeoPoint::new(
        t0() + Duration::milliseconds(500),
        40.0,
        -105.0,
    )]);
    assert!(resample(&fractional).is_empty());
}

#[test]
fn test_sub_second_series_without_whole_second() {
    let uniform = resample(&two_point_series(100, 900));
    assert!(uniform.is_empty());
}

#[test]
fn test_shift_commutes_with_resampling() {
    let series = two_point_series(300, 17_800);
    for offset in [-7, 0, 3, 120] {
        assert_eq!(
            resample(&series.shifted(offset)),
            resample(&series).shifted(offset),
            "offset {}",
            offset
        );
    }
}

#[test]
fn test_resampling_uniform_output_is_stable() {
    let uniform = resample(&two_point_series(0, 5_000));
    let series = uniform.to_geo_series();
    assert_eq!(series.len(), 6);

    let again = resample(&series);
    assert_eq!(again.len(), 6);
    assert_eq!(again.observed_count(), 6);
}
