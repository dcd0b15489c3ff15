use crate::extractor::record::ObservationRecord;
use crate::extractor::xml_extractor::{Extraction, FieldExtractor};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

/// Records and diagnostics accumulated over several input files.
#[derive(Debug, Clone)]
pub struct ExtractionBatch {
    pub files_processed: usize,
    pub total_files: usize,
    pub current_file: Option<String>,
    pub records: Vec<ObservationRecord>,
    pub errors: Vec<String>,
    pub start_time: Instant,
}

impl ExtractionBatch {
    pub fn new(total_files: usize) -> Self {
        Self {
            files_processed: 0,
            total_files,
            current_file: None,
            records: Vec::new(),
            errors: Vec::new(),
            start_time: Instant::now(),
        }
    }

    /// Appends one file's outcome, keeping input order.
    pub fn absorb(&mut self, filename: String, extraction: Extraction) {
        self.files_processed += 1;
        self.current_file = Some(filename);
        self.records.extend(extraction.records);
        self.errors.extend(extraction.errors);
    }

    pub fn photo_count(&self) -> usize {
        self.records.iter().map(|r| r.photos.len()).sum()
    }

    /// Records whose lat/lon are numbers inside the valid ranges.
    pub fn valid_coordinate_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.has_valid_coordinates())
            .count()
    }

    pub fn source_files(&self) -> Vec<String> {
        let mut files: Vec<String> = Vec::new();
        for record in &self.records {
            if !files.contains(&record.source_file) {
                files.push(record.source_file.clone());
            }
        }
        files
    }

    pub fn percentage(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.files_processed as f64 / self.total_files as f64) * 100.0
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn estimated_remaining(&self) -> Duration {
        if self.files_processed == 0 {
            return Duration::from_secs(0);
        }

        let elapsed = self.elapsed();
        let rate = self.files_processed as f64 / elapsed.as_secs_f64();
        let remaining_files = self.total_files.saturating_sub(self.files_processed);

        if rate > 0.0 {
            Duration::from_secs_f64(remaining_files as f64 / rate)
        } else {
            Duration::from_secs(0)
        }
    }
}

/// Runs `extractor` over `files` in order and concatenates the results.
pub fn extract_files(
    extractor: &FieldExtractor,
    files: &[PathBuf],
    progress_callback: Option<&dyn Fn(&ExtractionBatch)>,
) -> ExtractionBatch {
    let mut batch = ExtractionBatch::new(files.len());

    for path in files {
        if let Some(callback) = progress_callback {
            callback(&batch);
        }

        let extraction = extractor.extract(path);
        batch.absorb(display_name(path), extraction);
    }

    if let Some(callback) = progress_callback {
        callback(&batch);
    }

    info!(
        files = batch.files_processed,
        observations = batch.records.len(),
        diagnostics = batch.errors.len(),
        "extraction finished"
    );

    batch
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fs;
    use tempfile::TempDir;

    fn survey(seqnos: &[&str]) -> String {
        let observations: String = seqnos
            .iter()
            .map(|s| {
                format!(
                    "<observation><seqno>{}</seqno><photos><photo><photoname>{}.jpg</photoname></photo></photos></observation>",
                    s, s
                )
            })
            .collect();
        format!("<survey><observations>{}</observations></survey>", observations)
    }

    #[test]
    fn test_batch_concatenates_in_input_order() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.xml");
        let b = temp_dir.path().join("b.xml");
        let broken = temp_dir.path().join("broken.xml");
        let empty = temp_dir.path().join("empty.xml");
        fs::write(&a, survey(&["1", "2"])).unwrap();
        fs::write(&b, survey(&["9"])).unwrap();
        fs::write(&broken, "<survey>").unwrap();
        fs::write(&empty, "<survey/>").unwrap();

        let files = vec![a, broken, b, empty];
        let batch = extract_files(&FieldExtractor::new(), &files, None);

        assert_eq!(batch.files_processed, 4);
        let seqnos: Vec<_> = batch.records.iter().map(|r| r.seqno.as_str()).collect();
        assert_eq!(seqnos, vec!["1", "2", "9"]);
        assert_eq!(batch.errors.len(), 2);
        assert!(batch.errors[0].contains("broken.xml"));
        assert!(batch.errors[1].contains("empty.xml"));
        assert_eq!(batch.photo_count(), 3);
        assert_eq!(batch.source_files(), vec!["a.xml", "b.xml"]);
    }

    #[test]
    fn test_progress_callback_sees_every_file() {
        let temp_dir = TempDir::new().unwrap();
        let a = temp_dir.path().join("a.xml");
        fs::write(&a, survey(&["1"])).unwrap();

        let calls = Cell::new(0);
        let callback = |_: &ExtractionBatch| calls.set(calls.get() + 1);
        let batch = extract_files(&FieldExtractor::new(), &[a.clone(), a], Some(&callback));

        assert_eq!(batch.records.len(), 2);
        assert_eq!(calls.get(), 3);
        assert_eq!(batch.percentage(), 100.0);
    }

    #[test]
    fn test_valid_coordinate_count() {
        let record = |lat: &str, lon: &str| ObservationRecord {
            lat: lat.to_string(),
            lon: lon.to_string(),
            ..ObservationRecord::default()
        };
        let mut batch = ExtractionBatch::new(1);
        batch.absorb(
            "day1.xml".to_string(),
            Extraction {
                records: vec![
                    record("12.9", "77.5"),
                    record("95", "77.5"),
                    record("", ""),
                    record("-1.25", "36.8"),
                ],
                errors: Vec::new(),
            },
        );

        assert_eq!(batch.valid_coordinate_count(), 2);
        assert_eq!(batch.records.len(), 4);
    }

    #[test]
    fn test_empty_batch_percentage() {
        let batch = ExtractionBatch::new(0);
        assert_eq!(batch.percentage(), 0.0);
        assert_eq!(batch.estimated_remaining(), Duration::from_secs(0));
    }
}
