use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// A single row of cells, one per field
pub type Row = Vec<DataValue>;

/// A keyed record: field name -> value, in field order
pub type Record = serde_json::Map<String, JsonValue>;

/// Represents the data type of a cell or column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataType {
    String,
    Integer,
    Float,
    Boolean,
    Null,
    Mixed, // For columns with mixed types
}

impl DataType {
    /// Infer type from a string value
    pub fn infer_from_string(value: &str) -> Self {
        if value.is_empty() || value.eq_ignore_ascii_case("null") {
            return DataType::Null;
        }

        if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
            return DataType::Boolean;
        }

        if value.parse::<i64>().is_ok() {
            return DataType::Integer;
        }

        if value.parse::<f64>().is_ok() {
            return DataType::Float;
        }

        DataType::String
    }

    /// Merge two types (for columns with mixed types)
    pub fn merge(&self, other: &DataType) -> DataType {
        if self == other {
            return self.clone();
        }

        match (self, other) {
            (DataType::Null, t) | (t, DataType::Null) => t.clone(),
            (DataType::Integer, DataType::Float) | (DataType::Float, DataType::Integer) => {
                DataType::Float
            }
            _ => DataType::Mixed,
        }
    }
}

/// A single cell value in the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

impl DataValue {
    pub fn from_string(s: &str, data_type: &DataType) -> Self {
        if s.is_empty() || s.eq_ignore_ascii_case("null") {
            return DataValue::Null;
        }

        match data_type {
            DataType::String => DataValue::String(s.to_string()),
            DataType::Integer => s
                .parse::<i64>()
                .map(DataValue::Integer)
                .unwrap_or_else(|_| DataValue::String(s.to_string())),
            DataType::Float => s
                .parse::<f64>()
                .map(DataValue::Float)
                .unwrap_or_else(|_| DataValue::String(s.to_string())),
            DataType::Boolean => DataValue::Boolean(s.eq_ignore_ascii_case("true")),
            DataType::Null => DataValue::Null,
            DataType::Mixed => Self::infer(s),
        }
    }

    /// Build a value from raw text, guessing its type
    pub fn infer(s: &str) -> Self {
        Self::from_string(s, &DataType::infer_from_string(s))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    pub fn data_type(&self) -> DataType {
        match self {
            DataValue::String(_) => DataType::String,
            DataValue::Integer(_) => DataType::Integer,
            DataValue::Float(_) => DataType::Float,
            DataValue::Boolean(_) => DataType::Boolean,
            DataValue::Null => DataType::Null,
        }
    }

    /// Numeric coercion used by aggregates and loose comparisons.
    /// Empty strings, nulls and non-numeric text have no numeric value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            DataValue::Integer(i) => Some(*i as f64),
            DataValue::Float(f) if f.is_finite() => Some(*f),
            DataValue::Float(_) => None,
            DataValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            DataValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
                }
            }
            DataValue::Null => None,
        }
    }

    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => DataValue::Null,
            JsonValue::Bool(b) => DataValue::Boolean(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    DataValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    DataValue::Float(f)
                } else {
                    DataValue::String(n.to_string())
                }
            }
            JsonValue::String(s) => DataValue::String(s.clone()),
            // Nested structures are kept as their JSON text
            JsonValue::Array(_) | JsonValue::Object(_) => DataValue::String(json.to_string()),
        }
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            DataValue::String(s) => JsonValue::String(s.clone()),
            DataValue::Integer(i) => JsonValue::from(*i),
            DataValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            DataValue::Boolean(b) => JsonValue::Bool(*b),
            DataValue::Null => JsonValue::Null,
        }
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataValue::String(s) => write!(f, "{}", s),
            DataValue::Integer(i) => write!(f, "{}", i),
            DataValue::Float(fl) => write!(f, "{}", fl),
            DataValue::Boolean(b) => write!(f, "{}", b),
            DataValue::Null => write!(f, ""),
        }
    }
}

impl From<&str> for DataValue {
    fn from(s: &str) -> Self {
        DataValue::String(s.to_string())
    }
}

impl From<String> for DataValue {
    fn from(s: String) -> Self {
        DataValue::String(s)
    }
}

impl From<i64> for DataValue {
    fn from(i: i64) -> Self {
        DataValue::Integer(i)
    }
}

impl From<i32> for DataValue {
    fn from(i: i32) -> Self {
        DataValue::Integer(i as i64)
    }
}

impl From<f64> for DataValue {
    fn from(f: f64) -> Self {
        DataValue::Float(f)
    }
}

impl From<bool> for DataValue {
    fn from(b: bool) -> Self {
        DataValue::Boolean(b)
    }
}

impl<T: Into<DataValue>> From<Option<T>> for DataValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(DataValue::Null)
    }
}

/// Addresses a field either by name or by position
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldRef {
    Name(String),
    Index(usize),
}

impl From<&str> for FieldRef {
    fn from(name: &str) -> Self {
        FieldRef::Name(name.to_string())
    }
}

impl From<String> for FieldRef {
    fn from(name: String) -> Self {
        FieldRef::Name(name)
    }
}

impl From<&String> for FieldRef {
    fn from(name: &String) -> Self {
        FieldRef::Name(name.clone())
    }
}

impl From<usize> for FieldRef {
    fn from(index: usize) -> Self {
        FieldRef::Index(index)
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRef::Name(name) => write!(f, "{}", name),
            FieldRef::Index(index) => write!(f, "#{}", index),
        }
    }
}

/// The canonical record table: an ordered field list plus a row matrix.
///
/// Reads hand out owned copies; the only ways to change a table are the
/// mutation methods, in-place sorting and the data store's commit step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    pub(crate) fields: Vec<String>,
    pub(crate) rows: Vec<Row>,
    #[serde(skip, default = "valid_by_default")]
    pub(crate) valid: bool,
}

fn valid_by_default() -> bool {
    true
}

impl Default for DataTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl DataTable {
    pub fn new(fields: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            fields,
            rows,
            valid: true,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    /// A table whose source data could not be understood
    pub fn invalid() -> Self {
        Self {
            fields: Vec::new(),
            rows: Vec::new(),
            valid: false,
        }
    }

    pub fn with_fields<S: AsRef<str>>(fields: &[S]) -> Self {
        Self::new(
            fields.iter().map(|f| f.as_ref().to_string()).collect(),
            Vec::new(),
        )
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn fields(&self) -> Vec<String> {
        self.fields.clone()
    }

    pub fn rows(&self) -> Vec<Row> {
        self.rows.clone()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first field with this exact name
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    pub fn resolve(&self, field: &FieldRef) -> Option<usize> {
        match field {
            FieldRef::Name(name) => self.field_index(name),
            FieldRef::Index(index) if *index < self.fields.len() => Some(*index),
            FieldRef::Index(_) => None,
        }
    }

    /// Resolve several references, silently dropping the ones that miss
    pub fn resolve_all(&self, fields: &[FieldRef]) -> Vec<usize> {
        fields.iter().filter_map(|f| self.resolve(f)).collect()
    }

    pub fn get_row(&self, index: usize) -> Option<Row> {
        self.rows.get(index).cloned()
    }

    pub fn get_record(&self, index: usize) -> Option<Record> {
        let row = self.rows.get(index)?;
        Some(self.row_to_record(row, &(0..self.fields.len()).collect::<Vec<_>>()))
    }

    pub fn get_column(&self, field: impl Into<FieldRef>) -> Option<Vec<DataValue>> {
        let col = self.resolve(&field.into())?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(col).cloned().unwrap_or(DataValue::Null))
                .collect(),
        )
    }

    pub fn get_cell(&self, row: usize, field: impl Into<FieldRef>) -> Option<DataValue> {
        let col = self.resolve(&field.into())?;
        self.rows.get(row)?.get(col).cloned()
    }

    /// Overwrite one cell; returns false when the row or field is unknown
    pub fn set_cell(
        &mut self,
        row: usize,
        field: impl Into<FieldRef>,
        value: impl Into<DataValue>,
    ) -> bool {
        let Some(col) = self.resolve(&field.into()) else {
            return false;
        };
        match self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(cell) => {
                *cell = value.into();
                true
            }
            None => false,
        }
    }

    pub(crate) fn row_to_record(&self, row: &[DataValue], columns: &[usize]) -> Record {
        let mut record = Record::new();
        for &col in columns {
            let value = row.get(col).map(DataValue::to_json).unwrap_or(JsonValue::Null);
            record.insert(self.fields[col].clone(), value);
        }
        record
    }

    /// Infer the dominant type per column
    pub fn column_types(&self) -> Vec<DataType> {
        (0..self.fields.len())
            .map(|col| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(col))
                    .fold(DataType::Null, |acc, v| acc.merge(&v.data_type()))
            })
            .collect()
    }
}
