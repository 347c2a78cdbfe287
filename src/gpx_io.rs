//! GPX track reading and writing.
//!
//! Documents are written as a single track with a single segment. When
//! reading, only the first track of a document is used (all of its
//! segments), and the resulting series is ordered by timestamp.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};
use log::{info, warn};
use time::OffsetDateTime;

use crate::error::{OptionExt, Result, SampleError};
use crate::{GeoPoint, GeoSeries};

/// Value of the `creator` attribute on written documents.
pub const GPX_CREATOR: &str = "trailsync";

/// Convert the points of the first track into geo points.
///
/// Points without a timestamp or with out-of-range coordinates come back as
/// [`SampleError`]s so callers can count them.
pub fn track_points(gpx: &Gpx) -> Vec<std::result::Result<GeoPoint, SampleError>> {
    let Some(track) = gpx.tracks.first() else {
        return Vec::new();
    };

    track
        .segments
        .iter()
        .flat_map(|segment| segment.points.iter())
        .map(waypoint_to_point)
        .collect()
}

fn waypoint_to_point(waypoint: &Waypoint) -> std::result::Result<GeoPoint, SampleError> {
    let timestamp: OffsetDateTime = waypoint.time.map(OffsetDateTime::from).ok_or_missing("time")?;
    let location = waypoint.point();

    let point = GeoPoint {
        timestamp,
        latitude: location.y(),
        longitude: location.x(),
        elevation: waypoint.elevation,
        precision: waypoint.pdop.or(waypoint.hdop),
    };

    if !point.is_valid() {
        return Err(SampleError::invalid(
            "coordinates",
            format!("lat {} lon {}", point.latitude, point.longitude),
        ));
    }
    Ok(point)
}

/// Parse a GPX document into a series, skipping unusable points.
pub fn read_gpx<R: Read>(reader: R) -> Result<GeoSeries> {
    let gpx = gpx::read(reader)?;
    let mut series = GeoSeries::new();
    let mut skipped = 0usize;

    for point in track_points(&gpx) {
        match point {
            Ok(point) => {
                series.insert(point);
            }
            Err(e) => {
                skipped += 1;
                warn!("Skipping track point: {}", e);
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} unusable track points", skipped);
    }
    Ok(series)
}

/// Read a GPX file from disk.
pub fn load_gpx_file(path: impl AsRef<Path>) -> Result<GeoSeries> {
    let path = path.as_ref();
    info!("Extracting points from GPX file <{}>", path.display());
    let file = File::open(path)?;
    read_gpx(BufReader::new(file))
}

/// Build the GPX document for a series: one track, one segment.
pub fn to_gpx(series: &GeoSeries) -> Gpx {
    let mut segment = TrackSegment::new();
    for p in series {
        let mut waypoint = Waypoint::new((*p).into());
        waypoint.elevation = p.elevation;
        waypoint.time = Some(p.timestamp.into());
        waypoint.pdop = p.precision;
        segment.points.push(waypoint);
    }

    let mut track = Track::new();
    track.segments.push(segment);

    let mut doc = Gpx::default();
    doc.version = GpxVersion::Gpx11;
    doc.creator = Some(GPX_CREATOR.to_string());
    doc.tracks.push(track);
    doc
}

/// Serialize a series as a GPX 1.1 document.
pub fn write_gpx<W: Write>(series: &GeoSeries, writer: W) -> Result<()> {
    gpx::write(&to_gpx(series), writer)?;
    Ok(())
}

/// Write a series to a GPX file.
pub fn save_gpx_file(path: impl AsRef<Path>, series: &GeoSeries) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_gpx(series, &mut writer)?;
    writer.flush()?;
    info!("GPX file created: {} ({} points)", path.display(), series.len());
    Ok(())
}
