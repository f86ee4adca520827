//! Conversions between `DataTable` and the external shapes
//!
//! Construction never fails loudly: data that cannot be understood yields a
//! table whose `is_valid()` is false.

use crate::data::csv_codec::{parse_delimited, write_delimited, CsvOptions};
use crate::data::datatable::{DataTable, DataValue, FieldRef, Record, Row};
use crate::data::shape::{DataShape, ExportOptions, Exported, HeaderSource, OutputShape, RecordTable};
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

impl DataTable {
    /// Build a table from a matrix of values
    pub fn from_matrix(mut matrix: Vec<Row>, header: HeaderSource) -> Self {
        let fields = match header {
            HeaderSource::Fields(fields) => fields,
            HeaderSource::FirstRow => {
                if matrix.is_empty() {
                    Vec::new()
                } else {
                    matrix.remove(0).iter().map(|v| v.to_string()).collect()
                }
            }
            HeaderSource::Positional => {
                let width = matrix.first().map(Vec::len).unwrap_or(0);
                (0..width).map(|i| i.to_string()).collect()
            }
        };

        debug!(target: "store", "Built table with {} fields and {} rows", fields.len(), matrix.len());
        DataTable::new(fields, matrix)
    }

    /// Build a table from keyed records; field order follows the first record
    pub fn from_records(records: &[Record]) -> Self {
        let fields: Vec<String> = records
            .first()
            .map(|first| first.keys().cloned().collect())
            .unwrap_or_default();

        let rows = records
            .iter()
            .map(|record| {
                fields
                    .iter()
                    .map(|f| record.get(f).map(DataValue::from_json).unwrap_or(DataValue::Null))
                    .collect()
            })
            .collect();

        DataTable::new(fields, rows)
    }

    /// Build a table from any supported JSON document
    pub fn from_json(value: &JsonValue, header: HeaderSource) -> Self {
        match DataShape::classify(value) {
            DataShape::Matrix => {
                let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
                match json_matrix(items) {
                    Some(matrix) => Self::from_matrix(matrix, header),
                    None => invalid_source("matrix row is not an array"),
                }
            }
            DataShape::RecordSequence => {
                let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
                let records: Option<Vec<Record>> =
                    items.iter().map(|item| item.as_object().cloned()).collect();
                match records {
                    Some(records) => Self::from_records(&records),
                    None => invalid_source("record sequence contains a non-object"),
                }
            }
            DataShape::RecordTable => {
                let fields: Option<Vec<String>> = value["fields"]
                    .as_array()
                    .map(Vec::as_slice)
                    .unwrap_or_default()
                    .iter()
                    .map(|f| match f {
                        JsonValue::String(s) => Some(s.clone()),
                        JsonValue::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect();
                let rows = json_matrix(value["table"].as_array().map(Vec::as_slice).unwrap_or_default());
                match (fields, rows) {
                    (Some(fields), Some(rows)) => DataTable::new(fields, rows),
                    _ => invalid_source("record table has malformed fields or rows"),
                }
            }
            DataShape::Unknown => invalid_source("unrecognised data shape"),
        }
    }

    /// Parse a JSON document; unparseable text yields an invalid table
    pub fn from_json_str(text: &str, header: HeaderSource) -> Self {
        match serde_json::from_str::<JsonValue>(text) {
            Ok(value) => Self::from_json(&value, header),
            Err(e) => invalid_source(&format!("JSON parse error: {}", e)),
        }
    }

    /// Build a table from delimited text; row 0 is the header when
    /// `options.header` is set, otherwise fields are positional
    pub fn from_csv(text: &str, options: &CsvOptions) -> Self {
        let header = if options.header {
            HeaderSource::FirstRow
        } else {
            HeaderSource::Positional
        };
        Self::from_csv_with_header(text, options, header)
    }

    pub fn from_csv_with_header(text: &str, options: &CsvOptions, header: HeaderSource) -> Self {
        let mut raw = parse_delimited(text, options);

        // Field names are never type-inferred
        let header = match header {
            HeaderSource::FirstRow if !raw.is_empty() => HeaderSource::Fields(raw.remove(0)),
            other => other,
        };

        let matrix: Vec<Row> = raw
            .into_iter()
            .map(|cells| {
                cells
                    .into_iter()
                    .map(|cell| {
                        if options.infer_types {
                            DataValue::infer(&cell)
                        } else {
                            DataValue::String(cell)
                        }
                    })
                    .collect()
            })
            .collect();

        Self::from_matrix(matrix, header)
    }

    /// Column positions for an optional field selection
    pub(crate) fn selected_columns(&self, fields: Option<&[FieldRef]>) -> Vec<usize> {
        match fields {
            Some(fields) => self.resolve_all(fields),
            None => (0..self.fields.len()).collect(),
        }
    }

    fn project_row(row: &[DataValue], columns: &[usize]) -> Row {
        columns
            .iter()
            .map(|&c| row.get(c).cloned().unwrap_or(DataValue::Null))
            .collect()
    }

    pub fn to_matrix(&self, fields: Option<&[FieldRef]>) -> Vec<Row> {
        let columns = self.selected_columns(fields);
        self.rows
            .iter()
            .map(|row| Self::project_row(row, &columns))
            .collect()
    }

    pub fn to_records(&self, fields: Option<&[FieldRef]>) -> Vec<Record> {
        let columns = self.selected_columns(fields);
        self.rows
            .iter()
            .map(|row| self.row_to_record(row, &columns))
            .collect()
    }

    pub fn to_record_table(&self, fields: Option<&[FieldRef]>) -> RecordTable {
        let columns = self.selected_columns(fields);
        RecordTable {
            fields: columns.iter().map(|&c| self.fields[c].clone()).collect(),
            table: self
                .rows
                .iter()
                .map(|row| {
                    Self::project_row(row, &columns)
                        .iter()
                        .map(DataValue::to_json)
                        .collect()
                })
                .collect(),
        }
    }

    /// Matrix with the field names as its first row
    pub fn to_spreadsheet(&self, fields: Option<&[FieldRef]>) -> Vec<Row> {
        let columns = self.selected_columns(fields);
        let header: Row = columns
            .iter()
            .map(|&c| DataValue::String(self.fields[c].clone()))
            .collect();
        let mut sheet = Vec::with_capacity(self.rows.len() + 1);
        sheet.push(header);
        sheet.extend(self.rows.iter().map(|row| Self::project_row(row, &columns)));
        sheet
    }

    pub fn to_csv(&self, options: &CsvOptions, fields: Option<&[FieldRef]>) -> String {
        let columns = self.selected_columns(fields);
        let mut lines: Vec<Vec<String>> = Vec::with_capacity(self.rows.len() + 1);
        if options.header {
            lines.push(columns.iter().map(|&c| self.fields[c].clone()).collect());
        }
        for row in &self.rows {
            lines.push(
                Self::project_row(row, &columns)
                    .iter()
                    .map(|v| v.to_string())
                    .collect(),
            );
        }
        write_delimited(&lines, options)
    }

    /// Projected copy of the table as a new `DataTable`
    pub fn to_table(&self, fields: Option<&[FieldRef]>) -> DataTable {
        let columns = self.selected_columns(fields);
        DataTable::new(
            columns.iter().map(|&c| self.fields[c].clone()).collect(),
            self.to_matrix(fields),
        )
    }

    pub fn export(&self, shape: OutputShape, options: &ExportOptions) -> Exported {
        let fields = options.fields.as_deref();
        match shape {
            OutputShape::Matrix => Exported::Matrix(self.to_matrix(fields)),
            OutputShape::Records => Exported::Records(self.to_records(fields)),
            OutputShape::RecordTable => Exported::RecordTable(self.to_record_table(fields)),
            OutputShape::Spreadsheet => Exported::Spreadsheet(self.to_spreadsheet(fields)),
            OutputShape::Csv => Exported::Csv {
                text: self.to_csv(&options.csv, fields),
                rows: self.rows.len(),
            },
            OutputShape::Table => Exported::Table(self.to_table(fields)),
        }
    }
}

fn json_matrix(items: &[JsonValue]) -> Option<Vec<Row>> {
    items
        .iter()
        .map(|item| {
            item.as_array()
                .map(|cells| cells.iter().map(DataValue::from_json).collect())
        })
        .collect()
}

fn invalid_source(reason: &str) -> DataTable {
    warn!(target: "store", "Source data rejected, table marked invalid: {}", reason);
    DataTable::invalid()
}
