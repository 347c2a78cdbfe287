//! Point extraction from the EXIF tags of local photos.
//!
//! Required tags: GPS latitude and longitude with their N/S and E/W
//! references, and `DateTimeOriginal`. Optional tags: GPS altitude (with its
//! above/below sea level reference) and GPS DOP.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use exif::{In, Rational, Tag, Value};
use log::info;
use time::{Date, Month, PrimitiveDateTime, Time};

use super::{Extraction, ExtractionReport, PointSource, UtcOffsetHours, is_photo_name};
use crate::error::{OptionExt, Result, SampleError, TrailError};
use crate::{GeoPoint, GeoSeries};

/// Photos in a local directory.
#[derive(Debug, Clone)]
pub struct LocalPhotos {
    pub dir: PathBuf,
    /// Offset of the camera clock, used to convert capture time to UTC
    pub utc_offset: UtcOffsetHours,
}

impl LocalPhotos {
    pub fn new(dir: impl Into<PathBuf>, utc_offset: UtcOffsetHours) -> Self {
        Self {
            dir: dir.into(),
            utc_offset,
        }
    }

    /// Photo files in the directory, sorted by name.
    fn photo_paths(&self) -> Result<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(is_photo_name)
            })
            .collect();
        paths.sort();
        Ok(paths)
    }
}

impl PointSource for LocalPhotos {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    fn extract(&self) -> Result<Extraction> {
        info!("Extracting points from local <{}>", self.dir.display());

        let paths = self.photo_paths()?;
        if paths.is_empty() {
            return Err(TrailError::NoInputs {
                location: self.describe(),
            });
        }

        let mut series = GeoSeries::new();
        let mut report = ExtractionReport::new(self.describe());

        for path in &paths {
            let name = path.display().to_string();
            report.collect(&mut series, &name, read_photo(path, self.utc_offset));
        }

        Ok(Extraction { series, report })
    }
}

/// Read one photo's EXIF block and build its point.
pub fn read_photo(path: &Path, utc_offset: UtcOffsetHours) -> std::result::Result<GeoPoint, SampleError> {
    let file = File::open(path).map_err(|e| SampleError::invalid("file", e.to_string()))?;
    let mut reader = BufReader::new(file);
    let exif = exif::Reader::new()
        .read_from_container(&mut reader)
        .map_err(|e| match e {
            exif::Error::NotFound(_) => SampleError::MissingField { field: "EXIF data" },
            other => SampleError::invalid("EXIF data", other.to_string()),
        })?;

    point_from_exif(&exif, utc_offset)
}

/// Build a point from parsed EXIF fields.
pub fn point_from_exif(
    exif: &exif::Exif,
    utc_offset: UtcOffsetHours,
) -> std::result::Result<GeoPoint, SampleError> {
    let value = |tag: Tag| exif.get_field(tag, In::PRIMARY).map(|f| &f.value);

    let latitude = coordinate_degrees(
        value(Tag::GPSLatitude).ok_or_missing("GPS latitude")?,
        value(Tag::GPSLatitudeRef).ok_or_missing("GPS latitude ref")?,
        (b'N', b'S'),
        "GPS latitude",
    )?;
    let longitude = coordinate_degrees(
        value(Tag::GPSLongitude).ok_or_missing("GPS longitude")?,
        value(Tag::GPSLongitudeRef).ok_or_missing("GPS longitude ref")?,
        (b'E', b'W'),
        "GPS longitude",
    )?;
    let local = capture_time(value(Tag::DateTimeOriginal).ok_or_missing("capture time")?)?;

    let elevation = match value(Tag::GPSAltitude) {
        Some(altitude) => Some(altitude_meters(altitude, value(Tag::GPSAltitudeRef))?),
        None => None,
    };
    let precision = match value(Tag::GPSDOP) {
        Some(dop) => Some(first_rational(dop, "GPS DOP")?),
        None => None,
    };

    let point = GeoPoint {
        timestamp: utc_offset.to_utc(local)?,
        latitude,
        longitude,
        elevation,
        precision,
    };
    if !point.is_valid() {
        return Err(SampleError::invalid(
            "coordinates",
            format!("lat {} lon {}", latitude, longitude),
        ));
    }
    Ok(point)
}

/// Degrees/minutes/seconds rationals plus a hemisphere letter to signed degrees.
pub fn coordinate_degrees(
    position: &Value,
    reference: &Value,
    (positive, negative): (u8, u8),
    field: &'static str,
) -> std::result::Result<f64, SampleError> {
    let Value::Rational(parts) = position else {
        return Err(SampleError::invalid(field, "expected rationals"));
    };
    if parts.is_empty() || parts.len() > 3 {
        return Err(SampleError::invalid(
            field,
            format!("expected 1-3 components, got {}", parts.len()),
        ));
    }

    let mut degrees = 0.0;
    for (part, scale) in parts.iter().zip([1.0, 60.0, 3600.0]) {
        degrees += rational_to_f64(part, field)? / scale;
    }

    let hemisphere = match reference {
        Value::Ascii(strings) => strings.first().and_then(|s| s.first()).copied(),
        _ => None,
    }
    .map(|c| c.to_ascii_uppercase());

    match hemisphere {
        Some(c) if c == positive => Ok(degrees),
        Some(c) if c == negative => Ok(-degrees),
        Some(c) => Err(SampleError::invalid(
            field,
            format!("bad reference {:?}", c as char),
        )),
        None => Err(SampleError::invalid(field, "unreadable reference")),
    }
}

/// Parse an EXIF `YYYY:MM:DD HH:MM:SS` timestamp (camera local time).
pub fn capture_time(value: &Value) -> std::result::Result<PrimitiveDateTime, SampleError> {
    const FIELD: &str = "capture time";
    let Value::Ascii(strings) = value else {
        return Err(SampleError::invalid(FIELD, "expected ASCII"));
    };
    let raw = strings.first().ok_or_missing(FIELD)?;
    let dt = exif::DateTime::from_ascii(raw).map_err(|e| SampleError::invalid(FIELD, e.to_string()))?;

    let month = Month::try_from(dt.month).map_err(|e| SampleError::invalid(FIELD, e.to_string()))?;
    let date = Date::from_calendar_date(dt.year as i32, month, dt.day)
        .map_err(|e| SampleError::invalid(FIELD, e.to_string()))?;
    let time = Time::from_hms(dt.hour, dt.minute, dt.second)
        .map_err(|e| SampleError::invalid(FIELD, e.to_string()))?;
    Ok(PrimitiveDateTime::new(date, time))
}

/// Altitude in meters; reference byte 1 means below sea level.
pub fn altitude_meters(
    altitude: &Value,
    reference: Option<&Value>,
) -> std::result::Result<f64, SampleError> {
    const FIELD: &str = "GPS altitude";
    let magnitude = first_rational(altitude, FIELD)?;
    let below_sea_level = match reference {
        // Absent reference defaults to above sea level
        None => false,
        Some(Value::Byte(bytes)) => match bytes.first() {
            Some(0) => false,
            Some(1) => true,
            other => {
                return Err(SampleError::invalid(
                    "GPS altitude ref",
                    format!("expected 0 or 1, got {:?}", other),
                ));
            }
        },
        Some(_) => return Err(SampleError::invalid("GPS altitude ref", "expected a byte")),
    };
    Ok(if below_sea_level { -magnitude } else { magnitude })
}

fn first_rational(value: &Value, field: &'static str) -> std::result::Result<f64, SampleError> {
    match value {
        Value::Rational(parts) => rational_to_f64(parts.first().ok_or_missing(field)?, field),
        _ => Err(SampleError::invalid(field, "expected a rational")),
    }
}

fn rational_to_f64(r: &Rational, field: &'static str) -> std::result::Result<f64, SampleError> {
    if r.denom == 0 {
        return Err(SampleError::invalid(field, "zero denominator"));
    }
    Ok(r.to_f64())
}
