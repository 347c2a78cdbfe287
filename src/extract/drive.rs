//! Point extraction from photo metadata in a cloud folder.
//!
//! Access to the photo store is injected through the [`PhotoCatalog`]
//! capability. [`DrivePhotos`] never reads credentials itself. With the
//! `drive` feature, [`DriveCatalog`] implements the catalog against the
//! Google Drive v3 REST API using a bearer token supplied by the caller.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use time::PrimitiveDateTime;
use time::macros::format_description;

use super::{Extraction, ExtractionReport, PointSource, UtcOffsetHours, is_photo_name};
use crate::error::{OptionExt, Result, SampleError, TrailError};
use crate::{GeoPoint, GeoSeries};

/// One page of a folder listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePage {
    #[serde(default)]
    pub files: Vec<CloudFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// A file entry with the photo metadata the store extracted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudFile {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_media_metadata: Option<ImageMediaMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageMediaMetadata {
    /// Camera-local capture time, `YYYY:MM:DD HH:MM:SS`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<CloudLocation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CloudLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

/// Authenticated access to a cloud photo store.
pub trait PhotoCatalog {
    /// IDs of all folders with exactly this name.
    fn find_folders(&self, name: &str) -> Result<Vec<String>>;

    /// One page of non-folder files inside a folder.
    fn list_files(&self, folder_id: &str, page_token: Option<&str>) -> Result<FilePage>;
}

/// Photos in a uniquely named cloud folder.
pub struct DrivePhotos<C: PhotoCatalog> {
    catalog: C,
    pub folder: String,
    pub utc_offset: UtcOffsetHours,
}

impl<C: PhotoCatalog> DrivePhotos<C> {
    pub fn new(catalog: C, folder: impl Into<String>, utc_offset: UtcOffsetHours) -> Self {
        Self {
            catalog,
            folder: folder.into(),
            utc_offset,
        }
    }

    fn folder_id(&self) -> Result<String> {
        let mut ids = self.catalog.find_folders(&self.folder)?;
        match ids.len() {
            0 => Err(TrailError::FolderNotFound {
                name: self.folder.clone(),
            }),
            1 => Ok(ids.remove(0)),
            count => Err(TrailError::AmbiguousFolder {
                name: self.folder.clone(),
                count,
            }),
        }
    }
}

impl<C: PhotoCatalog> PointSource for DrivePhotos<C> {
    fn describe(&self) -> String {
        self.folder.clone()
    }

    fn extract(&self) -> Result<Extraction> {
        info!("Extracting points from cloud folder <{}>", self.folder);

        let folder_id = self.folder_id()?;
        let mut series = GeoSeries::new();
        let mut report = ExtractionReport::new(self.describe());
        let mut listed = 0usize;
        let mut page_token: Option<String> = None;

        loop {
            let page = self.catalog.list_files(&folder_id, page_token.as_deref())?;
            listed += page.files.len();

            for file in page.files.iter().filter(|f| is_photo_name(&f.name)) {
                report.collect(&mut series, &file.name, point_from_file(file, self.utc_offset));
            }

            match page.next_page_token {
                // A repeated token would list the same page forever
                Some(token) if page_token.as_deref() == Some(token.as_str()) => {
                    warn!("Catalog repeated page token {:?}, stopping", token);
                    break;
                }
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        if listed == 0 {
            return Err(TrailError::NoInputs {
                location: self.describe(),
            });
        }

        Ok(Extraction { series, report })
    }
}

/// Build a point from a file's photo metadata.
pub fn point_from_file(
    file: &CloudFile,
    utc_offset: UtcOffsetHours,
) -> std::result::Result<GeoPoint, SampleError> {
    let metadata = file.image_media_metadata.as_ref();
    let raw_time = metadata
        .and_then(|m| m.time.as_deref())
        .ok_or_missing("capture time")?;
    let local = parse_cloud_time(raw_time)?;

    let location = metadata
        .and_then(|m| m.location.as_ref())
        .ok_or_missing("location")?;
    let latitude = location.latitude.ok_or_missing("latitude")?;
    let longitude = location.longitude.ok_or_missing("longitude")?;
    let altitude = location.altitude.ok_or_missing("altitude")?;

    Ok(GeoPoint::new(utc_offset.to_utc(local)?, latitude, longitude).with_elevation(altitude))
}

/// Parse `YYYY:MM:DD HH:MM:SS` (dashes also accepted in the date, fractional
/// seconds ignored).
pub fn parse_cloud_time(raw: &str) -> std::result::Result<PrimitiveDateTime, SampleError> {
    const FIELD: &str = "capture time";
    let (date, clock) = raw
        .trim()
        .split_once(' ')
        .ok_or_else(|| SampleError::invalid(FIELD, format!("no time part in {:?}", raw)))?;
    let clock = clock.split('.').next().unwrap_or(clock);
    let normalized = format!("{} {}", date.replace('-', ":"), clock);

    PrimitiveDateTime::parse(
        &normalized,
        format_description!("[year]:[month]:[day] [hour]:[minute]:[second]"),
    )
    .map_err(|e| SampleError::invalid(FIELD, format!("{:?}: {}", raw, e)))
}

#[cfg(feature = "drive")]
pub use http::DriveCatalog;

#[cfg(feature = "drive")]
mod http {
    use serde::Deserialize;

    use super::{FilePage, PhotoCatalog};
    use crate::error::{Result, TrailError};

    const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
    const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
    const PAGE_SIZE: &str = "100";

    #[derive(Deserialize)]
    struct FolderList {
        #[serde(default)]
        files: Vec<FolderEntry>,
    }

    #[derive(Deserialize)]
    struct FolderEntry {
        id: String,
    }

    /// Google Drive v3 catalog authenticated with an OAuth access token.
    pub struct DriveCatalog {
        agent: ureq::Agent,
        access_token: String,
        files_url: String,
    }

    impl DriveCatalog {
        pub fn new(access_token: impl Into<String>) -> Self {
            Self {
                agent: ureq::Agent::new_with_defaults(),
                access_token: access_token.into(),
                files_url: FILES_URL.to_string(),
            }
        }

        /// Point the catalog at another endpoint (e.g. a local mock).
        pub fn with_files_url(mut self, url: impl Into<String>) -> Self {
            self.files_url = url.into();
            self
        }

        fn get<T: serde::de::DeserializeOwned>(&self, query: &[(&str, &str)]) -> Result<T> {
            let mut request = self
                .agent
                .get(&self.files_url)
                .header("Authorization", format!("Bearer {}", self.access_token));
            for (key, value) in query {
                request = request.query(*key, *value);
            }
            let mut response = request
                .call()
                .map_err(|e| TrailError::Http(e.to_string()))?;
            response
                .body_mut()
                .read_json::<T>()
                .map_err(|e| TrailError::Http(e.to_string()))
        }
    }

    fn quote(value: &str) -> String {
        value.replace('\\', "\\\\").replace('\'', "\\'")
    }

    impl PhotoCatalog for DriveCatalog {
        fn find_folders(&self, name: &str) -> Result<Vec<String>> {
            let q = format!("name = '{}' and mimeType = '{}'", quote(name), FOLDER_MIME);
            let list: FolderList = self.get(&[("q", q.as_str()), ("fields", "files(id)")])?;
            Ok(list.files.into_iter().map(|f| f.id).collect())
        }

        fn list_files(&self, folder_id: &str, page_token: Option<&str>) -> Result<FilePage> {
            let q = format!(
                "mimeType != '{}' and '{}' in parents",
                FOLDER_MIME,
                quote(folder_id)
            );
            let mut query = vec![
                ("q", q.as_str()),
                ("pageSize", PAGE_SIZE),
                ("fields", "nextPageToken, files(id, name, imageMediaMetadata)"),
            ];
            if let Some(token) = page_token {
                query.push(("pageToken", token));
            }
            self.get(&query)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::quote;

        #[test]
        fn quote_escapes_single_quotes() {
            assert_eq!(quote("bob's hike"), "bob\\'s hike");
        }
    }
}
