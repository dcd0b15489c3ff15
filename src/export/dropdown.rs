//! Observation workbook with a per-row photo picker.
//!
//! The first [`MAX_FLATTENED_PHOTOS`] photos of every selected record are
//! flattened into `photo{n}_{field}` columns. After the tables are built,
//! a post-processing pass over the [`WorkbookPlan`] appends a `PhotoChoice`
//! column restricted to the labels on a hidden "Lists" sheet and a
//! `PhotoValue` column whose formula looks up the chosen photo field.
//!
//! ```text
//! ... | photo1_name | ... | photo2_dir | PhotoChoice | PhotoValue
//!                                       [photo1 lat]  =IF(AM2="photo1 name",AC2,IF(...))
//! ```

use crate::error::{Result, SurveyError};
use crate::export::schema::{
    observation_schema, photo_index_schema, CellValue, Column, PhotoRow, Schema,
};
use crate::export::workbook::{CellRef, ListValidation, SheetPlan, WorkbookPlan};
use crate::export::{OBSERVATIONS_SHEET, PHOTOS_SHEET};
use crate::extractor::{ObservationRecord, PhotoField};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Photos per record that get their own columns on "Observations".
pub const MAX_FLATTENED_PHOTOS: usize = 2;

pub const LISTS_SHEET: &str = "Lists";
pub const PHOTO_CHOICE_HEADER: &str = "PhotoChoice";
pub const PHOTO_VALUE_HEADER: &str = "PhotoValue";
pub const PHOTO_CHOICE_WIDTH: f64 = 18.0;
pub const PHOTO_VALUE_WIDTH: f64 = 28.0;

/// A dropdown label and the flattened column it selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DropdownOption {
    pub label: &'static str,
    pub column: &'static str,
}

/// Labels offered in the `PhotoChoice` dropdown, in list order.
pub const PHOTO_OPTIONS: [DropdownOption; 6] = [
    DropdownOption {
        label: "photo1 name",
        column: "photo1_name",
    },
    DropdownOption {
        label: "photo1 lat",
        column: "photo1_lat",
    },
    DropdownOption {
        label: "photo1 lon",
        column: "photo1_lon",
    },
    DropdownOption {
        label: "photo2 name",
        column: "photo2_name",
    },
    DropdownOption {
        label: "photo2 lat",
        column: "photo2_lat",
    },
    DropdownOption {
        label: "photo2 lon",
        column: "photo2_lon",
    },
];

/// `photo1_name` .. `photo{MAX}_dir`, photo by photo.
pub fn flattened_photo_columns() -> Vec<String> {
    (1..=MAX_FLATTENED_PHOTOS)
        .flat_map(|n| {
            PhotoField::ALL
                .into_iter()
                .map(move |field| format!("photo{}_{}", n, field.suffix()))
        })
        .collect()
}

/// Flattened photo columns; a missing photo gives empty cells.
pub fn flattened_photo_schema() -> Schema<ObservationRecord> {
    let mut schema = Schema::new();
    for position in 0..MAX_FLATTENED_PHOTOS {
        for field in PhotoField::ALL {
            let name = format!("photo{}_{}", position + 1, field.suffix());
            schema = schema.with_column(Column::new(name, move |r: &ObservationRecord| {
                CellValue::text(r.photo(position).map(|p| p.get(field)).unwrap_or_default())
            }));
        }
    }
    schema
}

/// Base observation columns followed by the flattened photo columns.
pub fn dropdown_observation_schema() -> Schema<ObservationRecord> {
    observation_schema().extend(flattened_photo_schema())
}

/// The cascading lookup behind one row's `PhotoValue` cell.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoValueRule {
    /// The row's `PhotoChoice` cell.
    pub choice: CellRef,
    /// Label and the same row's target cell; `None` when the column is absent.
    pub branches: Vec<(String, Option<CellRef>)>,
}

impl PhotoValueRule {
    pub fn for_row(
        options: &[DropdownOption],
        headers: &[String],
        choice_column: u16,
        excel_row: u32,
    ) -> Self {
        let branches = options
            .iter()
            .map(|option| {
                let target = headers
                    .iter()
                    .position(|h| h == option.column)
                    .map(|col| CellRef::new(col as u16, excel_row));
                (option.label.to_string(), target)
            })
            .collect();

        Self {
            choice: CellRef::new(choice_column, excel_row),
            branches,
        }
    }

    /// `=IF(C="l1",T1,IF(C="l2",T2,...,""))`
    pub fn to_formula(&self) -> String {
        let body = self
            .branches
            .iter()
            .rev()
            .fold(String::from("\"\""), |otherwise, (label, target)| {
                let value = match target {
                    Some(cell) => cell.to_string(),
                    None => String::from("\"\""),
                };
                format!(
                    "IF({}=\"{}\",{},{})",
                    self.choice,
                    label.replace('"', "\"\""),
                    value,
                    otherwise
                )
            });
        format!("={}", body)
    }

    /// Evaluates the formula for `choice`, reading targets through `lookup`.
    /// Labels compare case-insensitively, as the spreadsheet `=` does.
    pub fn resolve<F>(&self, choice: &str, lookup: F) -> String
    where
        F: Fn(CellRef) -> String,
    {
        self.branches
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case(choice))
            .and_then(|(_, target)| target.map(&lookup))
            .unwrap_or_default()
    }
}

/// Appends the picker columns to "Observations" and creates or reuses the
/// hidden "Lists" sheet holding the labels.
pub fn add_photo_dropdown(plan: &mut WorkbookPlan, options: &[DropdownOption]) {
    let lists = plan.sheet_or_insert_with(LISTS_SHEET, || {
        let mut sheet = SheetPlan::bare(LISTS_SHEET);
        sheet.hidden = true;
        sheet
    });
    for (index, option) in options.iter().enumerate() {
        if lists.table.rows.len() <= index {
            lists.table.push_row(Vec::new());
        }
        let row = &mut lists.table.rows[index];
        if row.is_empty() {
            row.push(CellValue::Empty);
        }
        row[0] = CellValue::text(option.label);
    }
    let source = format!(
        "={}!$A${}:$A${}",
        LISTS_SHEET,
        lists.excel_row(0),
        lists.excel_row(options.len().saturating_sub(1))
    );

    let Some(sheet) = plan.sheet_mut(OBSERVATIONS_SHEET) else {
        return;
    };

    let choice_column = sheet.table.headers.len() as u16;
    let value_column = choice_column + 1;
    let formulas: Vec<CellValue> = (0..sheet.table.rows.len())
        .map(|index| {
            let rule = PhotoValueRule::for_row(
                options,
                &sheet.table.headers,
                choice_column,
                sheet.excel_row(index),
            );
            CellValue::Formula(rule.to_formula())
        })
        .collect();
    let row_count = formulas.len();

    sheet.table.push_column(PHOTO_CHOICE_HEADER, Vec::new());
    sheet.table.push_column(PHOTO_VALUE_HEADER, formulas);

    if row_count > 0 {
        let first_row = sheet.excel_row(0) - 1;
        sheet.validations.push(ListValidation {
            column: choice_column,
            first_row,
            last_row: first_row + row_count as u32 - 1,
            source,
            allow_blank: true,
        });
    }
    sheet.column_widths.push((choice_column, PHOTO_CHOICE_WIDTH));
    sheet.column_widths.push((value_column, PHOTO_VALUE_WIDTH));

    debug!(
        rows = row_count,
        choice_column, value_column, "added photo dropdown"
    );
}

/// Records picked by `selection`, in selection order. `None` picks all.
pub fn select_records<'r>(
    records: &'r [ObservationRecord],
    selection: Option<&[usize]>,
) -> Result<Vec<&'r ObservationRecord>> {
    match selection {
        None => Ok(records.iter().collect()),
        Some(indices) => indices
            .iter()
            .map(|&index| {
                records.get(index).ok_or(SurveyError::RowOutOfRange {
                    index,
                    len: records.len(),
                })
            })
            .collect(),
    }
}

pub fn build_dropdown_workbook(
    records: &[ObservationRecord],
    selection: Option<&[usize]>,
    options: &[DropdownOption],
) -> Result<WorkbookPlan> {
    let selected = select_records(records, selection)?;
    let mut plan = WorkbookPlan::new();

    if selected.is_empty() {
        plan.push(SheetPlan::bare(OBSERVATIONS_SHEET));
        return Ok(plan);
    }

    plan.push(SheetPlan::new(
        OBSERVATIONS_SHEET,
        dropdown_observation_schema().project(selected.iter().copied()),
    ));

    let photo_rows = PhotoRow::expand(selected.iter().copied());
    if !photo_rows.is_empty() {
        plan.push(SheetPlan::new(
            PHOTOS_SHEET,
            photo_index_schema().project(&photo_rows),
        ));
    }

    add_photo_dropdown(&mut plan, options);
    Ok(plan)
}

pub fn export_with_photo_dropdown(
    records: &[ObservationRecord],
    selection: Option<&[usize]>,
    path: &Path,
) -> Result<PathBuf> {
    build_dropdown_workbook(records, selection, &PHOTO_OPTIONS)?.save(path)
}
