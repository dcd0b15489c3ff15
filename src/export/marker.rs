//! Single-point KML / KMZ markers.

use crate::error::Result;
use crate::export::ensure_parent_dir;
use crate::extractor::{parse_latitude, parse_longitude, ObservationRecord};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Entry name of the document inside a KMZ archive.
pub const KMZ_DOCUMENT: &str = "doc.kml";

/// Escapes `&`, `<` and `>`. Quotes are left alone.
pub fn kml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// A placemark whose coordinates are kept as the text they were given.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointMarker {
    pub lat: String,
    pub lon: String,
    pub name: String,
    pub description: String,
}

impl PointMarker {
    pub fn new<C, N, D>(lat: C, lon: C, name: N, description: D) -> Self
    where
        C: Into<String>,
        N: Into<String>,
        D: Into<String>,
    {
        Self {
            lat: lat.into(),
            lon: lon.into(),
            name: name.into(),
            description: description.into(),
        }
    }

    /// Marker at `lat`/`lon` if both are numbers inside the WGS84 ranges.
    /// The trimmed text is written out unchanged.
    pub fn checked<N: Into<String>, D: Into<String>>(
        lat: &str,
        lon: &str,
        name: N,
        description: D,
    ) -> Option<Self> {
        parse_latitude(lat)?;
        parse_longitude(lon)?;
        Some(Self::new(lat.trim(), lon.trim(), name, description))
    }

    /// Marker at the record's corrected coordinates, named by seqno and
    /// described by feature type. `None` if either coordinate is unusable.
    pub fn from_record(record: &ObservationRecord) -> Option<Self> {
        Self::checked(
            &record.lat,
            &record.lon,
            record.seqno.clone(),
            record.featuretype.clone(),
        )
    }

    pub fn to_kml(&self) -> String {
        let name = kml_escape(&self.name);
        let description = kml_escape(&self.description);
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
<Document>
  <name>{name}</name>
  <Placemark>
    <name>{name}</name>
    <description>{description}</description>
    <Point>
      <coordinates>{lon},{lat},0</coordinates>
    </Point>
  </Placemark>
</Document>
</kml>
"#,
            name = name,
            description = description,
            lon = self.lon,
            lat = self.lat,
        )
    }

    /// `<name>.kml` or `<name>.kmz`, with the name made safe for a file system.
    pub fn default_file_name(&self, kmz: bool) -> String {
        let extension = if kmz { "kmz" } else { "kml" };
        format!("{}.{}", sanitize_file_stem(&self.name), extension)
    }

    pub fn save_kml(&self, path: &Path) -> Result<PathBuf> {
        ensure_parent_dir(path)?;
        fs::write(path, self.to_kml())?;
        info!(path = %path.display(), "saved KML marker");
        Ok(path.to_path_buf())
    }

    pub fn save_kmz(&self, path: &Path) -> Result<PathBuf> {
        ensure_parent_dir(path)?;
        let file = File::create(path)?;
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file(KMZ_DOCUMENT, options)?;
        zip.write_all(self.to_kml().as_bytes())?;
        zip.finish()?;

        info!(path = %path.display(), "saved KMZ marker");
        Ok(path.to_path_buf())
    }
}

fn sanitize_file_stem(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|ch| match ch {
            c if c.is_alphanumeric() || c == '-' || c == '.' || c == '_' => c,
            _ => '_',
        })
        .collect();

    let sanitized = sanitized.trim_matches(|c| c == '.' || c == '_');

    if sanitized.is_empty() {
        "marker".to_string()
    } else {
        sanitized.chars().take(100).collect()
    }
}
