pub mod dropdown;
pub mod flat;
pub mod marker;
pub mod multisheet;
pub mod report;
pub mod schema;
pub mod workbook;

pub use dropdown::{
    build_dropdown_workbook, export_with_photo_dropdown, select_records, DropdownOption,
    PhotoValueRule, MAX_FLATTENED_PHOTOS, PHOTO_OPTIONS,
};
pub use flat::{export_flat, observation_table};
pub use marker::{kml_escape, PointMarker};
pub use multisheet::{build_multisheet_workbook, export_multisheet};
pub use report::{ExportReport, ExportSummary};
pub use schema::{CellValue, Column, PhotoRow, Schema, Table};
pub use workbook::{CellRef, ListValidation, SheetPlan, WorkbookPlan};

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

pub const OBSERVATIONS_SHEET: &str = "Observations";
pub const PHOTOS_SHEET: &str = "Photos";

/// Workbook layout written by `export`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// One "Observations" sheet, no photo data.
    Flat,
    /// "Observations" plus a "Photos" sheet correlated by seqno.
    Multisheet,
    /// Flattened photo columns with a PhotoChoice dropdown and lookup formula.
    Dropdown,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Flat => "flat",
            ExportFormat::Multisheet => "multisheet",
            ExportFormat::Dropdown => "dropdown",
        };
        f.write_str(name)
    }
}

/// Creates the parent directory of `path` when it does not exist yet.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
