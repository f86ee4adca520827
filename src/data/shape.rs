//! External data shapes the table converts to and from

use crate::data::csv_codec::CsvOptions;
use crate::data::datatable::{DataTable, FieldRef, Record, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;

/// Where the field names of a matrix come from
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderSource {
    /// Explicit names supplied by the caller
    Fields(Vec<String>),
    /// Row 0 of the matrix is the header
    FirstRow,
    /// Synthesize "0", "1", ... from the first row's width
    Positional,
}

/// Classification of an incoming JSON document, decided once at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataShape {
    Matrix,
    RecordSequence,
    RecordTable,
    Unknown,
}

impl DataShape {
    pub fn classify(value: &JsonValue) -> Self {
        match value {
            JsonValue::Array(items) => match items.first() {
                None | Some(JsonValue::Array(_)) => DataShape::Matrix,
                Some(JsonValue::Object(_)) => DataShape::RecordSequence,
                Some(_) => DataShape::Unknown,
            },
            JsonValue::Object(map) => {
                let has_fields = map.get("fields").is_some_and(JsonValue::is_array);
                let has_table = map.get("table").is_some_and(JsonValue::is_array);
                if has_fields && has_table {
                    DataShape::RecordTable
                } else {
                    DataShape::Unknown
                }
            }
            _ => DataShape::Unknown,
        }
    }
}

/// The canonical `{ fields, table }` pair in serializable form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordTable {
    pub fields: Vec<String>,
    pub table: Vec<Vec<JsonValue>>,
}

/// Requested output shape for exports and data store queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputShape {
    Matrix,
    #[default]
    Records,
    RecordTable,
    /// Matrix with the field list prepended as row 0
    Spreadsheet,
    Csv,
    Table,
}

impl FromStr for OutputShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "matrix" | "array" => Ok(OutputShape::Matrix),
            "records" | "recordset" => Ok(OutputShape::Records),
            "recordtable" | "record_table" => Ok(OutputShape::RecordTable),
            "spreadsheet" | "sheet" => Ok(OutputShape::Spreadsheet),
            "csv" | "text" => Ok(OutputShape::Csv),
            "table" => Ok(OutputShape::Table),
            other => Err(format!("Unknown output shape: {}", other)),
        }
    }
}

/// Field selection and text options applied on export
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Subset and order of fields; unknown entries are dropped
    pub fields: Option<Vec<FieldRef>>,
    pub csv: CsvOptions,
}

impl ExportOptions {
    pub fn with_fields<T: Into<FieldRef> + Clone>(mut self, fields: &[T]) -> Self {
        self.fields = Some(fields.iter().cloned().map(Into::into).collect());
        self
    }

    pub fn with_csv(mut self, csv: CsvOptions) -> Self {
        self.csv = csv;
        self
    }
}

/// Exported data in one of the output shapes
#[derive(Debug, Clone, PartialEq)]
pub enum Exported {
    Matrix(Vec<Row>),
    Records(Vec<Record>),
    RecordTable(RecordTable),
    Spreadsheet(Vec<Row>),
    /// Delimited text and the number of data rows written into it
    Csv { text: String, rows: usize },
    Table(DataTable),
}

impl Exported {
    /// JSON rendering; delimited text becomes a JSON string
    pub fn to_json(&self) -> JsonValue {
        fn matrix_json(rows: &[Row]) -> JsonValue {
            JsonValue::Array(
                rows.iter()
                    .map(|row| JsonValue::Array(row.iter().map(|v| v.to_json()).collect()))
                    .collect(),
            )
        }

        match self {
            Exported::Matrix(rows) | Exported::Spreadsheet(rows) => matrix_json(rows),
            Exported::Records(records) => JsonValue::Array(
                records.iter().cloned().map(JsonValue::Object).collect(),
            ),
            Exported::RecordTable(rt) => serde_json::to_value(rt).unwrap_or(JsonValue::Null),
            Exported::Csv { text, .. } => JsonValue::String(text.clone()),
            Exported::Table(table) => {
                serde_json::to_value(table.to_record_table(None)).unwrap_or(JsonValue::Null)
            }
        }
    }

    /// Number of data rows, not counting any header.
    pub fn row_count(&self) -> usize {
        match self {
            Exported::Matrix(rows) => rows.len(),
            Exported::Spreadsheet(rows) => rows.len().saturating_sub(1),
            Exported::Records(records) => records.len(),
            Exported::RecordTable(rt) => rt.table.len(),
            Exported::Csv { rows, .. } => *rows,
            Exported::Table(table) => table.row_count(),
        }
    }

    pub fn into_table(self) -> Option<DataTable> {
        match self {
            Exported::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn into_records(self) -> Option<Vec<Record>> {
        match self {
            Exported::Records(records) => Some(records),
            _ => None,
        }
    }

    pub fn into_matrix(self) -> Option<Vec<Row>> {
        match self {
            Exported::Matrix(rows) | Exported::Spreadsheet(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn into_csv(self) -> Option<String> {
        match self {
            Exported::Csv { text, .. } => Some(text),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_shapes() {
        assert_eq!(DataShape::classify(&json!([[1, 2]])), DataShape::Matrix);
        assert_eq!(DataShape::classify(&json!([])), DataShape::Matrix);
        assert_eq!(
            DataShape::classify(&json!([{"a": 1}])),
            DataShape::RecordSequence
        );
        assert_eq!(
            DataShape::classify(&json!({"fields": ["a"], "table": [[1]]})),
            DataShape::RecordTable
        );
        assert_eq!(DataShape::classify(&json!([1, 2])), DataShape::Unknown);
        assert_eq!(DataShape::classify(&json!({"a": 1})), DataShape::Unknown);
        assert_eq!(DataShape::classify(&json!("text")), DataShape::Unknown);
    }

    #[test]
    fn test_output_shape_from_str() {
        assert_eq!("CSV".parse::<OutputShape>(), Ok(OutputShape::Csv));
        assert_eq!("records".parse::<OutputShape>(), Ok(OutputShape::Records));
        assert!("xml".parse::<OutputShape>().is_err());
    }
}
