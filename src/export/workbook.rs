//! In-memory workbook model and its `.xlsx` writer.
//!
//! Exporters assemble a [`WorkbookPlan`], adjust it (extra columns,
//! hidden sheets, validations) and only then write it out in one pass.

use crate::error::Result;
use crate::export::schema::{CellValue, Table};
use crate::export::ensure_parent_dir;
use rust_xlsxwriter::{DataValidation, Formula, Workbook, Worksheet};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Restricts a column's data cells to the values of a list formula.
#[derive(Debug, Clone, PartialEq)]
pub struct ListValidation {
    pub column: u16,
    /// First and last data row, 0-based over the whole sheet.
    pub first_row: u32,
    pub last_row: u32,
    /// Source range such as `=Lists!$A$1:$A$6`.
    pub source: String,
    pub allow_blank: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetPlan {
    pub name: String,
    pub table: Table,
    /// Write `table.headers` as row 0. Off for bare sheets and plain lists.
    pub write_header: bool,
    pub hidden: bool,
    pub column_widths: Vec<(u16, f64)>,
    pub validations: Vec<ListValidation>,
}

impl SheetPlan {
    pub fn new<S: Into<String>>(name: S, table: Table) -> Self {
        Self {
            name: name.into(),
            table,
            write_header: true,
            hidden: false,
            column_widths: Vec::new(),
            validations: Vec::new(),
        }
    }

    /// A sheet with no header and no rows.
    pub fn bare<S: Into<String>>(name: S) -> Self {
        let mut sheet = Self::new(name, Table::default());
        sheet.write_header = false;
        sheet
    }

    /// Excel row number (1-based) of data row `index`.
    pub fn excel_row(&self, index: usize) -> u32 {
        index as u32 + if self.write_header { 2 } else { 1 }
    }

    /// Value stored at `cell`, or `None` outside the table.
    pub fn value_at(&self, cell: CellRef) -> Option<&CellValue> {
        let first_data_row = self.excel_row(0);
        if cell.row < first_data_row {
            return None;
        }
        self.table
            .rows
            .get((cell.row - first_data_row) as usize)
            .and_then(|row| row.get(cell.column as usize))
    }

    fn write_to(&self, worksheet: &mut Worksheet) -> Result<()> {
        worksheet.set_name(&self.name)?;

        let offset: u32 = if self.write_header { 1 } else { 0 };
        if self.write_header {
            for (col, header) in self.table.headers.iter().enumerate() {
                worksheet.write_string(0, col as u16, header)?;
            }
        }

        for (index, row) in self.table.rows.iter().enumerate() {
            let row_number = index as u32 + offset;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                match cell {
                    CellValue::Text(s) if s.is_empty() => {}
                    CellValue::Text(s) => {
                        worksheet.write_string(row_number, col, s)?;
                    }
                    CellValue::Number(n) => {
                        worksheet.write_number(row_number, col, *n)?;
                    }
                    CellValue::Formula(f) => {
                        worksheet.write_formula(row_number, col, Formula::new(f))?;
                    }
                    CellValue::Empty => {}
                }
            }
        }

        for validation in &self.validations {
            // In-cell arrow left visible; Excel's showDropDown flag would hide it.
            let rule = DataValidation::new()
                .allow_list_formula(Formula::new(&validation.source))
                .ignore_blank(validation.allow_blank);
            worksheet.add_data_validation(
                validation.first_row,
                validation.column,
                validation.last_row,
                validation.column,
                &rule,
            )?;
        }

        for &(col, width) in &self.column_widths {
            worksheet.set_column_width(col, width)?;
        }

        if self.hidden {
            worksheet.set_hidden(true);
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkbookPlan {
    pub sheets: Vec<SheetPlan>,
}

impl WorkbookPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sheet: SheetPlan) {
        self.sheets.push(sheet);
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetPlan> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut SheetPlan> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// The sheet called `name`, appended via `create` if it is not there yet.
    pub fn sheet_or_insert_with<F>(&mut self, name: &str, create: F) -> &mut SheetPlan
    where
        F: FnOnce() -> SheetPlan,
    {
        let position = match self.sheets.iter().position(|s| s.name == name) {
            Some(position) => position,
            None => {
                self.sheets.push(create());
                self.sheets.len() - 1
            }
        };
        &mut self.sheets[position]
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Writes every sheet, in order, to `path`.
    pub fn save(&self, path: &Path) -> Result<PathBuf> {
        ensure_parent_dir(path)?;

        let mut workbook = Workbook::new();
        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            sheet.write_to(worksheet)?;
            debug!(
                sheet = %sheet.name,
                rows = sheet.table.rows.len(),
                hidden = sheet.hidden,
                "wrote sheet"
            );
        }

        workbook.save(path)?;
        info!(path = %path.display(), sheets = self.sheets.len(), "saved workbook");
        Ok(path.to_path_buf())
    }
}

/// Spreadsheet column letters for a 0-based column index (`0` is `A`).
pub fn column_letter(index: u16) -> String {
    let mut n = index as u32 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A single cell, 0-based column and 1-based Excel row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub column: u16,
    pub row: u32,
}

impl CellRef {
    pub fn new(column: u16, row: u32) -> Self {
        Self { column, row }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letter(self.column), self.row)
    }
}
