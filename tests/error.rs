//! Tests for error module

use trailsync::error::{OptionExt, SampleError, TrailError};

#[test]
fn test_error_display() {
    let err = TrailError::insufficient_data("source", 1, 2);
    assert_eq!(
        err.to_string(),
        "source series has 1 points, at least 2 required"
    );

    let err = TrailError::AmbiguousFolder {
        name: "Hike".to_string(),
        count: 3,
    };
    assert!(err.to_string().contains("3 folders named Hike"));

    let err = TrailError::no_overlap("offset 0");
    assert!(err.to_string().contains("offset 0"));
}

#[test]
fn test_sample_error_display() {
    let missing = SampleError::MissingField { field: "GPS latitude" };
    assert_eq!(missing.to_string(), "missing GPS latitude");

    let invalid = SampleError::invalid("capture time", "bad month");
    assert_eq!(invalid.to_string(), "invalid capture time: bad month");
}

#[test]
fn test_option_ext_insufficient_data() {
    let none: Option<i32> = None;
    let result = none.ok_or_insufficient_data("reference", 0, 2);
    assert!(matches!(
        result,
        Err(TrailError::InsufficientData { point_count: 0, .. })
    ));

    assert_eq!(Some(5).ok_or_insufficient_data("reference", 1, 2).unwrap(), 5);
}

#[test]
fn test_option_ext_missing() {
    let none: Option<f64> = None;
    assert_eq!(
        none.ok_or_missing("altitude"),
        Err(SampleError::MissingField { field: "altitude" })
    );
    assert_eq!(Some(1.5).ok_or_missing("altitude"), Ok(1.5));
}

#[test]
fn test_io_error_conversion() {
    fn open() -> trailsync::Result<std::fs::File> {
        Ok(std::fs::File::open("/definitely/not/here.gpx")?)
    }
    assert!(matches!(open(), Err(TrailError::Io(_))));
}
