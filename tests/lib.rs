//! Tests for the core types in lib.rs

use time::Duration;
use time::macros::datetime;
use trailsync::{GeoPoint, GeoSeries};

fn t0() -> time::OffsetDateTime {
    datetime!(2020-04-27 14:00:00 UTC)
}

fn at(seconds: i64, lat: f64, lon: f64) -> GeoPoint {
    GeoPoint::new(t0() + Duration::seconds(seconds), lat, lon)
}

#[test]
fn test_geo_point_validity() {
    assert!(at(0, 40.0, -105.0).is_valid());
    assert!(at(0, 90.0, 180.0).is_valid());
    assert!(!at(0, 91.0, 0.0).is_valid());
    assert!(!at(0, 0.0, -180.5).is_valid());
    assert!(!at(0, f64::NAN, 0.0).is_valid());
}

#[test]
fn test_series_is_ordered() {
    let series = GeoSeries::from_points([at(20, 3.0, 0.0), at(0, 1.0, 0.0), at(10, 2.0, 0.0)]);
    let lats: Vec<f64> = series.iter().map(|p| p.latitude).collect();
    assert_eq!(lats, vec![1.0, 2.0, 3.0]);
    assert_eq!(series.start(), Some(t0()));
    assert_eq!(series.end(), Some(t0() + Duration::seconds(20)));
    assert_eq!(series.duration_seconds(), 20.0);
}

#[test]
fn test_series_duplicate_timestamp_replaces() {
    let series = GeoSeries::from_points([at(0, 1.0, 0.0), at(0, 2.0, 0.0)]);
    assert_eq!(series.len(), 1);
    assert_eq!(series.first().unwrap().latitude, 2.0);
}

#[test]
fn test_series_rejects_invalid_points() {
    let mut series = GeoSeries::new();
    assert!(series.insert(at(0, 40.0, -105.0)));
    assert!(!series.insert(at(1, 123.0, -105.0)));
    assert_eq!(series.len(), 1);
}

#[test]
fn test_series_neighbours() {
    let series = GeoSeries::from_points([at(0, 1.0, 0.0), at(10, 2.0, 0.0)]);
    let mid = t0() + Duration::seconds(4);
    assert_eq!(series.at_or_before(mid).unwrap().latitude, 1.0);
    assert_eq!(series.at_or_after(mid).unwrap().latitude, 2.0);
    assert_eq!(series.at_or_after(t0()).unwrap().latitude, 1.0);
    assert!(series.at_or_before(t0() - Duration::seconds(1)).is_none());
}

#[test]
fn test_series_shifted() {
    let series = GeoSeries::from_points([at(0, 1.0, 0.0), at(10, 2.0, 0.0)]);
    let shifted = series.shifted(-30);
    assert_eq!(shifted.start(), Some(t0() - Duration::seconds(30)));
    assert_eq!(shifted.len(), 2);
    assert_eq!(shifted.shifted(30), series);
}

#[test]
fn test_series_density_and_bounds() {
    let series = GeoSeries::from_points([
        at(0, 40.0, -105.0),
        at(5, 40.02, -105.01),
        at(10, 40.01, -105.03),
    ]);
    assert_eq!(series.point_density(), Some(0.3));

    let bounds = series.bounds().unwrap();
    assert_eq!(bounds.min_lat, 40.0);
    assert_eq!(bounds.max_lat, 40.02);
    assert_eq!(bounds.min_lng, -105.03);
    assert_eq!(bounds.max_lng, -105.0);
    let (lat, lng) = bounds.center();
    assert!((lat - 40.01).abs() < 1e-9);
    assert!((lng + 105.015).abs() < 1e-9);

    assert!(GeoSeries::new().bounds().is_none());
    assert!(GeoSeries::from_points([at(0, 1.0, 1.0)]).point_density().is_none());
}

#[test]
fn test_geo_point_json() {
    let point = at(0, 40.0, -105.0).with_elevation(1600.0);
    let json = serde_json::to_string(&point).unwrap();
    assert!(json.contains("2020-04-27T14:00:00Z"));
    assert!(!json.contains("precision"));

    let back: GeoPoint = serde_json::from_str(&json).unwrap();
    assert_eq!(back, point);
}
