//! Walks a survey XML document into [`ObservationRecord`]s.
//!
//! Extraction never fails: unreadable or malformed documents produce a
//! diagnostic string and no records, and every individual field lookup
//! falls back to the empty string.

use crate::extractor::photos::photos_of;
use crate::extractor::record::{ObservationRecord, ParamField};
use roxmltree::{Document, Node, ParsingOptions};
use std::path::Path;
use tracing::{debug, warn};

/// Records and diagnostics produced from one input document.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<ObservationRecord>,
    pub errors: Vec<String>,
}

impl Extraction {
    fn failed(message: String) -> Self {
        warn!("{}", message);
        Self {
            records: Vec::new(),
            errors: vec![message],
        }
    }
}

pub struct FieldExtractor {
    params: Vec<ParamField>,
}

impl FieldExtractor {
    pub fn new() -> Self {
        Self {
            params: ParamField::ALL.to_vec(),
        }
    }

    /// Restrict which named parameters are looked up; the rest stay empty.
    pub fn with_params(mut self, params: &[ParamField]) -> Self {
        self.params = params.to_vec();
        self
    }

    pub fn params(&self) -> &[ParamField] {
        &self.params
    }

    pub fn extract(&self, path: &Path) -> Extraction {
        match std::fs::read_to_string(path) {
            Ok(content) => self.extract_str(&content, path),
            Err(e) => Extraction::failed(format!("{}: XML parse error: {}", path.display(), e)),
        }
    }

    /// Same as [`FieldExtractor::extract`] for a document already in memory.
    /// `path` names the source in records and diagnostics.
    pub fn extract_str(&self, xml: &str, path: &Path) -> Extraction {
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };

        let doc = match Document::parse_with_options(xml, options) {
            Ok(doc) => doc,
            Err(e) => {
                return Extraction::failed(format!("{}: XML parse error: {}", path.display(), e))
            }
        };

        let observations: Vec<Node<'_, '_>> = doc
            .descendants()
            .filter(|n| is_element_named(*n, "observation"))
            .filter(|n| n.parent_element().is_some_and(|p| is_element_named(p, "observations")))
            .collect();

        if observations.is_empty() {
            return Extraction::failed(format!(
                "{}: no <observation> nodes found",
                path.display()
            ));
        }

        let observer = path_text(doc.root_element(), &["projectdetails", "observername"]);
        let source_file = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let records: Vec<ObservationRecord> = observations
            .into_iter()
            .map(|obs| self.observation_record(obs, &source_file, &observer))
            .collect();

        debug!(
            file = %path.display(),
            observations = records.len(),
            "extracted observations"
        );

        Extraction {
            records,
            errors: Vec::new(),
        }
    }

    fn observation_record(
        &self,
        obs: Node<'_, '_>,
        source_file: &str,
        observer: &str,
    ) -> ObservationRecord {
        let featurecoords_raw = path_text(obs, &["gpsdetails", "featurecoords"]);
        let (lat, lon) = split_featurecoords(&featurecoords_raw);

        let mut record = ObservationRecord {
            source_file: source_file.to_string(),
            seqno: path_text(obs, &["seqno"]),
            featuretype: path_text(obs, &["featuretype"]),
            featurecoords_raw,
            lat,
            lon,
            altitude_m: path_text(obs, &["gpsdetails", "altitude"]),
            gps_accuracy: path_text(obs, &["gpsdetails", "accuracy"]),
            gps_speed: path_text(obs, &["gpsdetails", "speed"]),
            event_timestamp: path_text(obs, &["gpsdetails", "timestamp"]),
            gps_type: path_text(obs, &["gpsdetails", "typegps"]),
            observer: observer.to_string(),
            ..ObservationRecord::default()
        };

        for &param in &self.params {
            *record.params.get_mut(param) = param_value(obs, param.param_name());
        }

        record.photos = photos_of(obs);
        record.trim_fields();
        record
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract every observation of `path` with the full parameter table.
pub fn extract(path: &Path) -> Extraction {
    FieldExtractor::new().extract(path)
}

/// Splits a `"LON LAT"` coordinate string and returns `(lat, lon)`.
///
/// Anything other than exactly two whitespace-separated tokens gives two
/// empty strings.
pub fn split_featurecoords(raw: &str) -> (String, String) {
    let parts: Vec<&str> = raw.split_whitespace().collect();
    match parts.as_slice() {
        [lon, lat] => (lat.to_string(), lon.to_string()),
        _ => (String::new(), String::new()),
    }
}

fn is_element_named(node: Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

/// Element children reached by following `path` from `node`, in document order.
pub(crate) fn select<'a, 'input>(
    node: Node<'a, 'input>,
    path: &[&str],
) -> std::vec::IntoIter<Node<'a, 'input>> {
    let mut current = vec![node];
    for &step in path {
        current = current
            .into_iter()
            .flat_map(|n| n.children().filter(move |c| is_element_named(*c, step)))
            .collect();
    }
    current.into_iter()
}

fn first_text<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    node.children().find(|c| c.is_text()).and_then(|c| c.text())
}

/// First text child of the first element along `path` that has one, trimmed.
pub(crate) fn path_text(node: Node<'_, '_>, path: &[&str]) -> String {
    select(node, path)
        .find_map(first_text)
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

fn string_value(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|d| d.is_text())
        .filter_map(|d| d.text())
        .collect()
}

fn param_value(obs: Node<'_, '_>, name: &str) -> String {
    select(obs, &["params", "param"])
        .filter(|param| select(*param, &["paramname"]).any(|n| string_value(n) == name))
        .flat_map(|param| select(param, &["paramvalue"]))
        .find_map(first_text)
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SURVEY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<survey>
  <projectdetails><observername>  R. Menon </observername></projectdetails>
  <observations>
    <observation>
      <seqno> 1 </seqno>
      <featuretype>Landslide</featuretype>
      <gpsdetails>
        <featurecoords>77.5 12.9</featurecoords>
        <accuracy>4.5</accuracy>
        <altitude>910</altitude>
        <speed>0</speed>
        <timestamp>2024-07-30T10:15:00</timestamp>
        <typegps>GPS</typegps>
      </gpsdetails>
      <params>
        <param><paramname>History</paramname><paramvalue> Recurring </paramvalue></param>
        <param><paramname>District</paramname><paramvalue>Wayanad</paramvalue></param>
        <param><paramname>length</paramname><paramvalue>120</paramvalue></param>
        <param><paramname>Casualties</paramname><paramvalue>2</paramvalue></param>
      </params>
      <photos>
        <photo><photoname>p1.jpg</photoname><photolat>12.91</photolat><photolon>77.51</photolon><photoacc>3</photoacc><photodir>N</photodir></photo>
        <photo><photoname>p2.jpg</photoname><photolat>12.92</photolat><photolon>77.52</photolon></photo>
      </photos>
    </observation>
    <observation>
      <seqno>2</seqno>
      <gpsdetails><featurecoords>77.5</featurecoords></gpsdetails>
    </observation>
  </observations>
</survey>"#;

    fn extract_survey(xml: &str) -> Extraction {
        FieldExtractor::new().extract_str(xml, Path::new("/data/site_a.xml"))
    }

    #[test]
    fn test_split_featurecoords_swaps_order() {
        assert_eq!(
            split_featurecoords("77.5 12.9"),
            ("12.9".to_string(), "77.5".to_string())
        );
        assert_eq!(
            split_featurecoords("  -3.2\t\n51.4 "),
            ("51.4".to_string(), "-3.2".to_string())
        );
    }

    #[test]
    fn test_split_featurecoords_requires_two_tokens() {
        for raw in ["", "77.5", "77.5 12.9 0", "   "] {
            assert_eq!(
                split_featurecoords(raw),
                (String::new(), String::new()),
                "raw: {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_extracts_scalar_gps_and_observer_fields() {
        let extraction = extract_survey(SURVEY);

        assert!(extraction.errors.is_empty());
        assert_eq!(extraction.records.len(), 2);

        let first = &extraction.records[0];
        assert_eq!(first.source_file, "site_a.xml");
        assert_eq!(first.seqno, "1");
        assert_eq!(first.featuretype, "Landslide");
        assert_eq!(first.featurecoords_raw, "77.5 12.9");
        assert_eq!(first.lat, "12.9");
        assert_eq!(first.lon, "77.5");
        assert_eq!(first.altitude_m, "910");
        assert_eq!(first.gps_accuracy, "4.5");
        assert_eq!(first.gps_speed, "0");
        assert_eq!(first.event_timestamp, "2024-07-30T10:15:00");
        assert_eq!(first.gps_type, "GPS");
        assert_eq!(first.observer, "R. Menon");
        assert_eq!(extraction.records[1].observer, "R. Menon");
    }

    #[test]
    fn test_extracts_named_params_only() {
        let extraction = extract_survey(SURVEY);
        let first = &extraction.records[0];

        assert_eq!(first.param(ParamField::History), "Recurring");
        assert_eq!(first.param(ParamField::District), "Wayanad");
        assert_eq!(first.param(ParamField::Length), "120");
        assert_eq!(first.param(ParamField::Remedial), "");
    }

    #[test]
    fn test_missing_nodes_yield_empty_strings() {
        let extraction = extract_survey(SURVEY);
        let second = &extraction.records[1];

        assert_eq!(second.seqno, "2");
        assert_eq!(second.featuretype, "");
        assert_eq!(second.featurecoords_raw, "77.5");
        assert_eq!(second.lat, "");
        assert_eq!(second.lon, "");
        assert_eq!(second.altitude_m, "");
        assert_eq!(second.params, Default::default());
        assert!(second.photos.is_empty());
    }

    #[test]
    fn test_two_photo_scenario() {
        let extraction = extract_survey(SURVEY);
        let first = &extraction.records[0];

        assert_eq!(first.photos.len(), 2);
        assert_eq!(first.photos[0].photoname, "p1.jpg");
        assert_eq!(first.photos[0].photodir, "N");
        assert_eq!(first.photos[1].photoname, "p2.jpg");
        assert_eq!(first.photos[1].photoacc, "");
    }

    #[test]
    fn test_restricted_param_table() {
        let extractor = FieldExtractor::new().with_params(&[ParamField::District]);
        let extraction = extractor.extract_str(SURVEY, Path::new("site_a.xml"));
        let first = &extraction.records[0];

        assert_eq!(first.param(ParamField::District), "Wayanad");
        assert_eq!(first.param(ParamField::History), "");
    }

    #[test]
    fn test_param_name_must_match_exactly() {
        let xml = "<r><observations><observation><params>\
                   <param><paramname>history</paramname><paramvalue>x</paramvalue></param>\
                   <param><paramname>History</paramname><paramvalue>y</paramvalue></param>\
                   </params></observation></observations></r>";
        let extraction = extract_survey(xml);

        assert_eq!(extraction.records[0].param(ParamField::History), "y");
    }

    #[test]
    fn test_malformed_document_reports_single_error() {
        let extraction = extract_survey("<survey><observations>");

        assert!(extraction.records.is_empty());
        assert_eq!(extraction.errors.len(), 1);
        assert!(extraction.errors[0].starts_with("/data/site_a.xml: XML parse error"));
    }

    #[test]
    fn test_document_without_observations() {
        let extraction = extract_survey("<survey><observation/></survey>");

        assert!(extraction.records.is_empty());
        assert_eq!(
            extraction.errors,
            vec!["/data/site_a.xml: no <observation> nodes found".to_string()]
        );
    }

    #[test]
    fn test_extract_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("survey.xml");
        fs::write(&path, SURVEY).unwrap();

        let extraction = extract(&path);

        assert_eq!(extraction.records.len(), 2);
        assert_eq!(extraction.records[0].source_file, "survey.xml");
    }

    #[test]
    fn test_missing_file_is_a_diagnostic() {
        let temp_dir = TempDir::new().unwrap();
        let extraction = extract(&temp_dir.path().join("absent.xml"));

        assert!(extraction.records.is_empty());
        assert_eq!(extraction.errors.len(), 1);
        assert!(extraction.errors[0].contains("absent.xml"));
    }
}
