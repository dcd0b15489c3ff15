use crate::error::Result;
use crate::export::schema::{observation_schema, photo_correlation_schema, PhotoRow};
use crate::export::workbook::{SheetPlan, WorkbookPlan};
use crate::export::{OBSERVATIONS_SHEET, PHOTOS_SHEET};
use crate::extractor::ObservationRecord;
use std::path::{Path, PathBuf};

/// "Observations" with one row per record and, when any record has photos,
/// "Photos" with one row per photo keyed by source file and seqno.
pub fn build_multisheet_workbook(records: &[ObservationRecord]) -> WorkbookPlan {
    let mut plan = WorkbookPlan::new();
    plan.push(SheetPlan::new(
        OBSERVATIONS_SHEET,
        observation_schema().project(records),
    ));

    let photo_rows = PhotoRow::expand(records);
    if !photo_rows.is_empty() {
        plan.push(SheetPlan::new(
            PHOTOS_SHEET,
            photo_correlation_schema().project(&photo_rows),
        ));
    }

    plan
}

pub fn export_multisheet(records: &[ObservationRecord], path: &Path) -> Result<PathBuf> {
    build_multisheet_workbook(records).save(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::CellValue;
    use crate::extractor::PhotoRecord;
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use tempfile::TempDir;

    fn record(seqno: &str, photos: &[&str]) -> ObservationRecord {
        ObservationRecord {
            source_file: "day1.xml".to_string(),
            seqno: seqno.to_string(),
            observer: "R. Iyer".to_string(),
            event_timestamp: "2024-07-01T10:00:00".to_string(),
            photos: photos
                .iter()
                .enumerate()
                .map(|(i, name)| PhotoRecord {
                    index: i + 1,
                    photoname: name.to_string(),
                    ..PhotoRecord::default()
                })
                .collect(),
            ..ObservationRecord::default()
        }
    }

    #[test]
    fn test_photos_sheet_omitted_without_photos() {
        let plan = build_multisheet_workbook(&[record("1", &[]), record("2", &[])]);
        assert_eq!(plan.sheet_names(), vec!["Observations"]);
    }

    #[test]
    fn test_photos_sheet_correlates_by_seqno() {
        let records = vec![record("1", &["a.jpg", "b.jpg", "c.jpg"]), record("2", &["d.jpg"])];
        let plan = build_multisheet_workbook(&records);

        assert_eq!(plan.sheet_names(), vec!["Observations", "Photos"]);
        let photos = &plan.sheet("Photos").unwrap().table;
        assert_eq!(
            photos.headers,
            vec![
                "source_file",
                "seqno",
                "observer",
                "event_timestamp",
                "photoname",
                "photolat",
                "photolon",
                "photoacc",
                "photodir"
            ]
        );
        assert_eq!(photos.rows.len(), 4);
        assert_eq!(photos.cell(3, "seqno"), Some(&CellValue::text("2")));
        assert_eq!(photos.cell(3, "photoname"), Some(&CellValue::text("d.jpg")));

        let observations = &plan.sheet("Observations").unwrap().table;
        assert_eq!(observations.rows.len(), 2);
        assert!(observations.column_index("photoname").is_none());
    }

    #[test]
    fn test_export_multisheet_writes_both_sheets() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out").join("multi.xlsx");

        export_multisheet(&[record("7", &["x.jpg"])], &path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(
            workbook.sheet_names(),
            vec!["Observations".to_string(), "Photos".to_string()]
        );
        let photos = workbook.worksheet_range("Photos").unwrap();
        assert_eq!(photos.get_value((1, 2)), Some(&Data::String("R. Iyer".to_string())));
        assert_eq!(photos.get_value((1, 4)), Some(&Data::String("x.jpg".to_string())));
    }
}
