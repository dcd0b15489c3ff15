//! Single-sheet export of a pre-built table.

use crate::error::Result;
use crate::export::schema::{observation_schema, Table};
use crate::export::workbook::{SheetPlan, WorkbookPlan};
use crate::export::OBSERVATIONS_SHEET;
use crate::extractor::ObservationRecord;
use std::path::{Path, PathBuf};

/// Writes `table` as-is to a sheet named "Observations".
pub fn export_flat(table: &Table, path: &Path) -> Result<PathBuf> {
    let mut plan = WorkbookPlan::new();
    plan.push(SheetPlan::new(OBSERVATIONS_SHEET, table.clone()));
    plan.save(path)
}

/// Observation table over the base columns, or over `columns` only (in
/// that order) when the list is not empty.
pub fn observation_table<S: AsRef<str>>(
    records: &[ObservationRecord],
    columns: &[S],
) -> Result<Table> {
    let schema = if columns.is_empty() {
        observation_schema()
    } else {
        observation_schema().select(columns)?
    };
    Ok(schema.project(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SurveyError;
    use crate::export::CellValue;
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use tempfile::TempDir;

    fn records() -> Vec<ObservationRecord> {
        vec![
            ObservationRecord {
                seqno: "1".to_string(),
                lat: "12.9".to_string(),
                lon: "77.5".to_string(),
                ..ObservationRecord::default()
            },
            ObservationRecord {
                seqno: "2".to_string(),
                ..ObservationRecord::default()
            },
        ]
    }

    #[test]
    fn test_observation_table_with_visible_columns() {
        let table = observation_table(&records(), &["seqno", "lat"]).unwrap();
        assert_eq!(table.headers, vec!["seqno", "lat"]);
        assert_eq!(table.cell(0, "lat"), Some(&CellValue::text("12.9")));

        let full = observation_table::<&str>(&records(), &[]).unwrap();
        assert_eq!(full.headers.len(), 28);

        let err = observation_table(&records(), &["photo1_name"]).unwrap_err();
        assert!(matches!(err, SurveyError::UnknownColumn { .. }));
    }

    #[test]
    fn test_export_flat_writes_table_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("flat.xlsx");
        let table = observation_table(&records(), &["seqno", "lon"]).unwrap();

        export_flat(&table, &path).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Observations".to_string()]);
        let range = workbook.worksheet_range("Observations").unwrap();
        assert_eq!(range.get_value((0, 0)), Some(&Data::String("seqno".to_string())));
        assert_eq!(range.get_value((0, 1)), Some(&Data::String("lon".to_string())));
        assert_eq!(range.get_value((1, 1)), Some(&Data::String("77.5".to_string())));
        assert_eq!(range.get_value((2, 0)), Some(&Data::String("2".to_string())));
    }
}
