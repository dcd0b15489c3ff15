use crate::error::{Result, SurveyError};
use crate::export::ExportFormat;
use crate::extractor::ExtractionBatch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What an `export` run read and wrote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    pub output: PathBuf,
    pub format: ExportFormat,
    pub summary: ExportSummary,
    pub source_files: Vec<String>,
    pub errors: Vec<String>,
    pub exported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSummary {
    pub files_processed: usize,
    pub observations_loaded: usize,
    pub observations_exported: usize,
    /// Loaded observations with numeric lat/lon inside the valid ranges.
    pub valid_coordinates: usize,
    pub photos: usize,
    pub extraction_duration: Duration,
}

impl ExportReport {
    pub fn new(
        output: PathBuf,
        format: ExportFormat,
        batch: &ExtractionBatch,
        observations_exported: usize,
    ) -> Self {
        Self {
            output,
            format,
            summary: ExportSummary {
                files_processed: batch.files_processed,
                observations_loaded: batch.records.len(),
                observations_exported,
                valid_coordinates: batch.valid_coordinate_count(),
                photos: batch.photo_count(),
                extraction_duration: batch.elapsed(),
            },
            source_files: batch.source_files(),
            errors: batch.errors.clone(),
            exported_at: Utc::now(),
        }
    }

    /// `observations.xlsx` -> `observations.report.json`, next to the workbook.
    pub fn sidecar_path(&self) -> PathBuf {
        let stem = self
            .output
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "export".to_string());
        self.output.with_file_name(format!("{}.report.json", stem))
    }

    pub fn save_json(&self, path: &Path) -> Result<PathBuf> {
        let json_content =
            serde_json::to_string_pretty(self).map_err(|e| SurveyError::Serialization {
                message: format!("Failed to serialize report to JSON: {}", e),
            })?;

        fs::write(path, json_content)?;
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{Extraction, ObservationRecord, PhotoRecord};
    use tempfile::TempDir;

    fn batch() -> ExtractionBatch {
        let mut batch = ExtractionBatch::new(2);
        batch.absorb(
            "day1.xml".to_string(),
            Extraction {
                records: vec![
                    ObservationRecord {
                        source_file: "day1.xml".to_string(),
                        lat: "12.9".to_string(),
                        lon: "77.5".to_string(),
                        photos: vec![PhotoRecord::default(), PhotoRecord::default()],
                        ..ObservationRecord::default()
                    },
                    ObservationRecord {
                        source_file: "day1.xml".to_string(),
                        lat: "95".to_string(),
                        lon: "500".to_string(),
                        ..ObservationRecord::default()
                    },
                ],
                errors: Vec::new(),
            },
        );
        batch.absorb(
            "day2.xml".to_string(),
            Extraction {
                records: Vec::new(),
                errors: vec!["day2.xml: no <observation> nodes found".to_string()],
            },
        );
        batch
    }

    #[test]
    fn test_report_summarizes_batch() {
        let report = ExportReport::new(PathBuf::from("out/obs.xlsx"), ExportFormat::Flat, &batch(), 1);

        assert_eq!(report.summary.files_processed, 2);
        assert_eq!(report.summary.observations_loaded, 2);
        assert_eq!(report.summary.valid_coordinates, 1);
        assert_eq!(report.summary.photos, 2);
        assert_eq!(report.source_files, vec!["day1.xml"]);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.sidecar_path(), PathBuf::from("out/obs.report.json"));
    }

    #[test]
    fn test_save_json() {
        let temp_dir = TempDir::new().unwrap();
        let report = ExportReport::new(
            temp_dir.path().join("obs.xlsx"),
            ExportFormat::Dropdown,
            &batch(),
            1,
        );

        let path = report.save_json(&report.sidecar_path()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["format"], "dropdown");
        assert_eq!(value["summary"]["observations_exported"], 1);
        assert_eq!(value["summary"]["valid_coordinates"], 1);
    }
}
