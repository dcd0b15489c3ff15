//! Column schemas that project records into tables.
//!
//! A [`Schema`] is an ordered list of named pure extractors. Exporters
//! build their sheets by projecting records through a schema, so the
//! record layout never dictates column order.

use crate::error::{Result, SurveyError};
use crate::extractor::{ObservationRecord, ParamField, PhotoField, PhotoRecord};
use serde::Serialize;
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    /// Formula text, with or without the leading `=`.
    Formula(String),
    Empty,
}

impl CellValue {
    pub fn text<S: Into<String>>(value: S) -> Self {
        CellValue::Text(value.into())
    }

    /// Rendering used for display and comparisons; formulas show their source.
    pub fn as_display(&self) -> Cow<'_, str> {
        match self {
            CellValue::Text(s) | CellValue::Formula(s) => Cow::Borrowed(s),
            CellValue::Number(n) => Cow::Owned(n.to_string()),
            CellValue::Empty => Cow::Borrowed(""),
        }
    }
}

/// A header row plus data rows, all rows as wide as the header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.headers.len().max(row.len()), CellValue::Empty);
        self.rows.push(row);
    }

    /// Appends a column to the right; `values` is padded with empties.
    pub fn push_column<I>(&mut self, header: &str, values: I)
    where
        I: IntoIterator<Item = CellValue>,
    {
        let width = self.headers.len();
        self.headers.push(header.to_string());
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.resize(width, CellValue::Empty);
            row.push(values.next().unwrap_or(CellValue::Empty));
        }
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

type Extractor<R> = Box<dyn Fn(&R) -> CellValue>;

pub struct Column<R> {
    name: Cow<'static, str>,
    extract: Extractor<R>,
}

impl<R> Column<R> {
    pub fn new<N, F>(name: N, extract: F) -> Self
    where
        N: Into<Cow<'static, str>>,
        F: Fn(&R) -> CellValue + 'static,
    {
        Self {
            name: name.into(),
            extract: Box::new(extract),
        }
    }

    /// Column holding a borrowed string field as text.
    pub fn text<N>(name: N, field: fn(&R) -> &str) -> Self
    where
        N: Into<Cow<'static, str>>,
        R: 'static,
    {
        Self::new(name, move |r| CellValue::text(field(r)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self, row: &R) -> CellValue {
        (self.extract)(row)
    }
}

pub struct Schema<R> {
    columns: Vec<Column<R>>,
}

impl<R> Schema<R> {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: Column<R>) -> Self {
        self.columns.push(column);
        self
    }

    pub fn extend(mut self, other: Schema<R>) -> Self {
        self.columns.extend(other.columns);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Keeps only `names`, in the order given. Unknown names are an error.
    pub fn select<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self> {
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let position = self
                .columns
                .iter()
                .position(|c| c.name() == name)
                .ok_or_else(|| SurveyError::UnknownColumn {
                    name: name.to_string(),
                })?;
            selected.push(self.columns.remove(position));
        }
        self.columns = selected;
        Ok(self)
    }

    pub fn row(&self, record: &R) -> Vec<CellValue> {
        self.columns.iter().map(|c| c.value(record)).collect()
    }

    pub fn project<'r, I>(&self, records: I) -> Table
    where
        I: IntoIterator<Item = &'r R>,
        R: 'r,
    {
        let mut table = Table::new(self.names().into_iter().map(str::to_string).collect());
        for record in records {
            table.push_row(self.row(record));
        }
        table
    }
}

impl<R> Default for Schema<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// A photo together with the observation it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct PhotoRow<'a> {
    pub observation: &'a ObservationRecord,
    pub photo: &'a PhotoRecord,
}

impl<'a> PhotoRow<'a> {
    /// Every photo of `records`, observation by observation.
    pub fn expand<I>(records: I) -> Vec<PhotoRow<'a>>
    where
        I: IntoIterator<Item = &'a ObservationRecord>,
    {
        records
            .into_iter()
            .flat_map(|observation| {
                observation
                    .photos
                    .iter()
                    .map(move |photo| PhotoRow { observation, photo })
            })
            .collect()
    }
}

/// Base observation columns, photos excluded.
pub fn observation_schema() -> Schema<ObservationRecord> {
    let mut schema = Schema::new()
        .with_column(Column::text("source_file", |r: &ObservationRecord| r.source_file.as_str()))
        .with_column(Column::text("seqno", |r: &ObservationRecord| r.seqno.as_str()))
        .with_column(Column::text("featuretype", |r: &ObservationRecord| r.featuretype.as_str()))
        .with_column(Column::text("featurecoords_raw", |r: &ObservationRecord| {
            r.featurecoords_raw.as_str()
        }))
        .with_column(Column::text("lat", |r: &ObservationRecord| r.lat.as_str()))
        .with_column(Column::text("lon", |r: &ObservationRecord| r.lon.as_str()))
        .with_column(Column::text("altitude_m", |r: &ObservationRecord| r.altitude_m.as_str()))
        .with_column(Column::text("gps_accuracy", |r: &ObservationRecord| r.gps_accuracy.as_str()))
        .with_column(Column::text("gps_speed", |r: &ObservationRecord| r.gps_speed.as_str()))
        .with_column(Column::text("event_timestamp", |r: &ObservationRecord| {
            r.event_timestamp.as_str()
        }))
        .with_column(Column::text("gps_type", |r: &ObservationRecord| r.gps_type.as_str()))
        .with_column(Column::text("observer", |r: &ObservationRecord| r.observer.as_str()));

    for param in ParamField::ALL {
        schema = schema.with_column(Column::new(param.column(), move |r: &ObservationRecord| {
            CellValue::text(r.param(param))
        }));
    }

    schema
}

/// Columns of the multi-sheet "Photos" sheet.
pub fn photo_correlation_schema<'a>() -> Schema<PhotoRow<'a>> {
    let schema = Schema::new()
        .with_column(Column::new("source_file", |p: &PhotoRow<'a>| {
            CellValue::text(p.observation.source_file.as_str())
        }))
        .with_column(Column::new("seqno", |p: &PhotoRow<'a>| {
            CellValue::text(p.observation.seqno.as_str())
        }))
        .with_column(Column::new("observer", |p: &PhotoRow<'a>| {
            CellValue::text(p.observation.observer.as_str())
        }))
        .with_column(Column::new("event_timestamp", |p: &PhotoRow<'a>| {
            CellValue::text(p.observation.event_timestamp.as_str())
        }));
    schema.extend(photo_field_schema())
}

/// Columns of the dropdown export's long-form "Photos" sheet.
pub fn photo_index_schema<'a>() -> Schema<PhotoRow<'a>> {
    let schema = Schema::new()
        .with_column(Column::new("source_file", |p: &PhotoRow<'a>| {
            CellValue::text(p.observation.source_file.as_str())
        }))
        .with_column(Column::new("seqno", |p: &PhotoRow<'a>| {
            CellValue::text(p.observation.seqno.as_str())
        }))
        .with_column(Column::new("photo_index", |p: &PhotoRow<'a>| {
            CellValue::Number(p.photo.index as f64)
        }));
    schema.extend(photo_field_schema())
}

fn photo_field_schema<'a>() -> Schema<PhotoRow<'a>> {
    PhotoField::ALL
        .into_iter()
        .fold(Schema::new(), |schema, field| {
            schema.with_column(Column::new(field.element(), move |p: &PhotoRow<'a>| {
                CellValue::text(p.photo.get(field))
            }))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(seqno: &str, photos: usize) -> ObservationRecord {
        ObservationRecord {
            source_file: "a.xml".to_string(),
            seqno: seqno.to_string(),
            observer: "Obs".to_string(),
            photos: (1..=photos)
                .map(|i| PhotoRecord {
                    index: i,
                    photoname: format!("{}_{}.jpg", seqno, i),
                    ..PhotoRecord::default()
                })
                .collect(),
            ..ObservationRecord::default()
        }
    }

    #[test]
    fn test_observation_schema_column_order() {
        let names = observation_schema().names().join(",");
        assert!(names.starts_with("source_file,seqno,featuretype,featurecoords_raw,lat,lon,"));
        assert!(names.ends_with("causes,landslide_category,remedial"));
        assert_eq!(observation_schema().len(), 28);
        assert!(!names.contains("photo"));
    }

    #[test]
    fn test_projection_builds_one_row_per_record() {
        let records = vec![record("1", 0), record("2", 3)];
        let table = observation_schema().project(&records);

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(1, "seqno"), Some(&CellValue::text("2")));
        assert_eq!(table.cell(0, "observer"), Some(&CellValue::text("Obs")));
    }

    #[test]
    fn test_select_reorders_and_rejects_unknown() {
        let schema = observation_schema().select(&["lon", "seqno"]).unwrap();
        assert_eq!(schema.names(), vec!["lon", "seqno"]);

        let result = observation_schema().select(&["seqno", "photos"]);
        assert!(matches!(result, Err(SurveyError::UnknownColumn { name }) if name == "photos"));
    }

    #[test]
    fn test_photo_rows_expand_all_photos() {
        let records = vec![record("1", 3), record("2", 0), record("3", 1)];
        let rows = PhotoRow::expand(&records);
        let table = photo_index_schema().project(&rows);

        assert_eq!(table.rows.len(), 4);
        assert_eq!(table.cell(2, "photo_index"), Some(&CellValue::Number(3.0)));
        assert_eq!(table.cell(3, "photoname"), Some(&CellValue::text("3_1.jpg")));
    }

    #[test]
    fn test_push_column_pads_rows() {
        let mut table = Table::new(vec!["a".to_string()]);
        table.push_row(vec![CellValue::text("x")]);
        table.push_row(vec![CellValue::text("y")]);

        table.push_column("b", vec![CellValue::text("1")]);

        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.rows[0], vec![CellValue::text("x"), CellValue::text("1")]);
        assert_eq!(table.rows[1], vec![CellValue::text("y"), CellValue::Empty]);
    }
}
