//! Point extraction from an existing GPX track.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use log::info;

use super::{Extraction, ExtractionReport, PointSource};
use crate::GeoSeries;
use crate::error::{Result, TrailError};
use crate::gpx_io::track_points;

/// The first track of a GPX file.
#[derive(Debug, Clone)]
pub struct TrackFile {
    pub path: PathBuf,
}

impl TrackFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PointSource for TrackFile {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn extract(&self) -> Result<Extraction> {
        info!("Extracting points from GPX file <{}>", self.path.display());

        let file = File::open(&self.path)?;
        let gpx = gpx::read(BufReader::new(file))?;
        let points = track_points(&gpx);
        if points.is_empty() {
            return Err(TrailError::NoInputs {
                location: self.describe(),
            });
        }

        let mut series = GeoSeries::new();
        let mut report = ExtractionReport::new(self.describe());
        for (index, point) in points.into_iter().enumerate() {
            report.collect(&mut series, &format!("track point #{}", index + 1), point);
        }

        Ok(Extraction { series, report })
    }
}
