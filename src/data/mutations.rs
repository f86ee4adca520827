//! In-place table edits. Every operation returns `&mut Self` so calls chain.

use crate::data::datatable::{DataTable, DataValue, FieldRef, Record, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Row data given either by position or by field name
#[derive(Debug, Clone, PartialEq)]
pub enum RowInput {
    Positional(Vec<DataValue>),
    Keyed(Record),
}

impl From<Vec<DataValue>> for RowInput {
    fn from(values: Vec<DataValue>) -> Self {
        RowInput::Positional(values)
    }
}

impl From<Record> for RowInput {
    fn from(record: Record) -> Self {
        RowInput::Keyed(record)
    }
}

/// Column data given either in row order or keyed by row index
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnInput {
    Positional(Vec<DataValue>),
    Keyed(BTreeMap<usize, DataValue>),
}

impl From<Vec<DataValue>> for ColumnInput {
    fn from(values: Vec<DataValue>) -> Self {
        ColumnInput::Positional(values)
    }
}

impl From<BTreeMap<usize, DataValue>> for ColumnInput {
    fn from(values: BTreeMap<usize, DataValue>) -> Self {
        ColumnInput::Keyed(values)
    }
}

/// How `remove_duplicates` decides two rows match.
///
/// `FirstField` only looks at the first selected field and is the default;
/// `AllFields` requires every selected field to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicateCheck {
    #[default]
    FirstField,
    AllFields,
}

impl DataTable {
    /// Shape any row input to exactly one value per field
    pub(crate) fn normalize_row(&self, input: RowInput) -> Row {
        match input {
            RowInput::Positional(mut values) => {
                values.resize(self.fields.len(), DataValue::Null);
                values
            }
            RowInput::Keyed(record) => self
                .fields
                .iter()
                .map(|f| record.get(f).map(DataValue::from_json).unwrap_or(DataValue::Null))
                .collect(),
        }
    }

    /// Keep only the given fields, in the given order
    pub fn reorder(&mut self, fields: &[FieldRef]) -> &mut Self {
        let columns = self.resolve_all(fields);
        self.fields = columns.iter().map(|&c| self.fields[c].clone()).collect();
        for row in self.rows.iter_mut() {
            *row = columns
                .iter()
                .map(|&c| row.get(c).cloned().unwrap_or(DataValue::Null))
                .collect();
        }
        self
    }

    /// Insert a row at `at` (default: end)
    pub fn add_row(&mut self, input: impl Into<RowInput>, at: Option<usize>) -> &mut Self {
        let row = self.normalize_row(input.into());
        let index = at.unwrap_or(self.rows.len()).min(self.rows.len());
        self.rows.insert(index, row);
        self
    }

    pub fn add_rows(&mut self, inputs: Vec<RowInput>) -> &mut Self {
        for input in inputs {
            self.add_row(input, None);
        }
        self
    }

    /// Insert a column named `name` at `at` (default: end)
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        input: impl Into<ColumnInput>,
        at: Option<usize>,
    ) -> &mut Self {
        let index = at.unwrap_or(self.fields.len()).min(self.fields.len());
        let mut values: Vec<DataValue> = match input.into() {
            ColumnInput::Positional(values) => values,
            ColumnInput::Keyed(map) => (0..self.rows.len())
                .map(|i| map.get(&i).cloned().unwrap_or(DataValue::Null))
                .collect(),
        };
        values.resize(self.rows.len(), DataValue::Null);

        self.fields.insert(index, name.into());
        for (row, value) in self.rows.iter_mut().zip(values) {
            if row.len() < index {
                row.resize(index, DataValue::Null);
            }
            row.insert(index, value);
        }
        self
    }

    pub fn remove_row(&mut self, index: usize) -> &mut Self {
        if index < self.rows.len() {
            self.rows.remove(index);
        }
        self
    }

    /// Remove several rows, highest index first so positions stay valid
    pub fn remove_rows(&mut self, indices: &[usize]) -> &mut Self {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();
        for index in sorted {
            self.remove_row(index);
        }
        self
    }

    pub fn remove_column(&mut self, field: impl Into<FieldRef>) -> &mut Self {
        if let Some(col) = self.resolve(&field.into()) {
            self.fields.remove(col);
            for row in self.rows.iter_mut() {
                if col < row.len() {
                    row.remove(col);
                }
            }
        }
        self
    }

    pub fn replace_row(&mut self, index: usize, input: impl Into<RowInput>) -> &mut Self {
        let row = self.normalize_row(input.into());
        if let Some(slot) = self.rows.get_mut(index) {
            *slot = row;
        }
        self
    }

    pub fn rename_field(&mut self, field: impl Into<FieldRef>, name: impl Into<String>) -> &mut Self {
        if let Some(col) = self.resolve(&field.into()) {
            self.fields[col] = name.into();
        }
        self
    }

    /// Append a row holding each column's sum (or average).
    /// Cells are coerced to numbers; non-numeric cells are skipped.
    pub fn sum_columns(&mut self, average: bool) -> &mut Self {
        let totals: Row = (0..self.fields.len())
            .map(|col| aggregate(self.rows.iter().filter_map(|row| row.get(col)), average))
            .collect();
        self.rows.push(totals);
        self
    }

    /// Append a column named `name` holding each row's sum (or average)
    pub fn sum_rows(&mut self, name: impl Into<String>, average: bool) -> &mut Self {
        let totals: Vec<DataValue> = self
            .rows
            .iter()
            .map(|row| aggregate(row.iter(), average))
            .collect();
        self.add_column(name, totals, None)
    }

    /// Transpose, using the first column as the new header row.
    /// Expects a table whose first column holds row labels.
    pub fn pivot(&mut self) -> &mut Self {
        let Some(first) = self.fields.first().cloned() else {
            return self;
        };

        let mut fields = vec![first];
        fields.extend(
            self.rows
                .iter()
                .map(|row| row.first().map(|v| v.to_string()).unwrap_or_default()),
        );

        let rows: Vec<Row> = self.fields[1..]
            .iter()
            .enumerate()
            .map(|(offset, name)| {
                let col = offset + 1;
                let mut pivoted = vec![DataValue::String(name.clone())];
                pivoted.extend(
                    self.rows
                        .iter()
                        .map(|row| row.get(col).cloned().unwrap_or(DataValue::Null)),
                );
                pivoted
            })
            .collect();

        self.fields = fields;
        self.rows = rows;
        self
    }

    /// Drop rows that match an earlier kept row on the selected fields
    /// (all fields when `fields` is None).
    pub fn remove_duplicates(
        &mut self,
        fields: Option<&[FieldRef]>,
        check: DuplicateCheck,
    ) -> &mut Self {
        let columns = self.selected_columns(fields);
        if columns.is_empty() {
            return self;
        }

        let before = self.rows.len();
        let mut kept: Vec<Row> = Vec::with_capacity(before);
        for row in std::mem::take(&mut self.rows) {
            let duplicate = kept.iter().any(|other| match check {
                DuplicateCheck::FirstField => same_cell(&row, other, columns[0]),
                DuplicateCheck::AllFields => columns.iter().all(|&c| same_cell(&row, other, c)),
            });
            if !duplicate {
                kept.push(row);
            }
        }
        self.rows = kept;

        debug!(target: "store", "remove_duplicates dropped {} rows ({:?})", before - self.rows.len(), check);
        self
    }
}

fn same_cell(a: &[DataValue], b: &[DataValue], col: usize) -> bool {
    a.get(col) == b.get(col)
}

fn aggregate<'a>(values: impl Iterator<Item = &'a DataValue>, average: bool) -> DataValue {
    let mut total = 0.0;
    let mut count = 0usize;
    let mut all_integers = true;

    for value in values {
        if let Some(n) = value.as_number() {
            total += n;
            count += 1;
            all_integers &= matches!(value, DataValue::Integer(_));
        }
    }

    if count == 0 {
        DataValue::Null
    } else if average {
        DataValue::Float(total / count as f64)
    } else if all_integers {
        DataValue::Integer(total as i64)
    } else {
        DataValue::Float(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::shape::HeaderSource;
    use serde_json::json;

    fn table() -> DataTable {
        DataTable::from_matrix(
            vec![
                vec![1.into(), "a".into(), 10.into()],
                vec![2.into(), "b".into(), "x".into()],
                vec![3.into(), "c".into(), 2.5.into()],
            ],
            HeaderSource::Fields(vec!["id".into(), "name".into(), "score".into()]),
        )
    }

    #[test]
    fn test_reorder_drops_unmatched() {
        let mut t = table();
        t.reorder(&[FieldRef::from("score"), FieldRef::from("ghost"), FieldRef::from("id")]);
        assert_eq!(t.fields(), vec!["score", "id"]);
        assert_eq!(t.get_row(0), Some(vec![10.into(), 1.into()]));
    }

    #[test]
    fn test_add_row_pads_and_truncates() {
        let mut t = table();
        t.add_row(vec![DataValue::from(4)], None)
            .add_row(vec![DataValue::from(5), "e".into(), 1.into(), "extra".into()], Some(0));
        assert_eq!(t.row_count(), 5);
        assert_eq!(t.get_row(0), Some(vec![5.into(), "e".into(), 1.into()]));
        assert_eq!(t.get_row(4), Some(vec![4.into(), DataValue::Null, DataValue::Null]));
    }

    #[test]
    fn test_add_keyed_row() {
        let mut t = table();
        let record = json!({"name": "z", "id": 9, "other": 1}).as_object().unwrap().clone();
        t.add_row(record, Some(1));
        assert_eq!(t.get_row(1), Some(vec![9.into(), "z".into(), DataValue::Null]));
    }

    #[test]
    fn test_add_column() {
        let mut t = table();
        t.add_column("flag", vec![DataValue::from(true)], Some(1));
        assert_eq!(t.fields(), vec!["id", "flag", "name", "score"]);
        assert_eq!(t.get_cell(0, "flag"), Some(true.into()));
        assert_eq!(t.get_cell(2, "flag"), Some(DataValue::Null));

        let keyed: BTreeMap<usize, DataValue> = [(2, "last".into())].into_iter().collect();
        t.add_column("note", keyed, None);
        assert_eq!(t.get_cell(2, "note"), Some("last".into()));
        assert_eq!(t.get_cell(0, "note"), Some(DataValue::Null));
    }

    #[test]
    fn test_remove_rows_and_columns() {
        let mut t = table();
        t.remove_rows(&[0, 2, 7]).remove_column("name");
        assert_eq!(t.row_count(), 1);
        assert_eq!(t.get_row(0), Some(vec![2.into(), "x".into()]));
    }

    #[test]
    fn test_sum_columns_and_averages() {
        let mut t = table();
        t.sum_columns(false);
        assert_eq!(
            t.get_row(3),
            Some(vec![6.into(), DataValue::Null, DataValue::Float(12.5)])
        );

        let mut t = table();
        t.sum_columns(true);
        // "x" is not counted
        assert_eq!(t.get_cell(3, "score"), Some(DataValue::Float(6.25)));
        assert_eq!(t.get_cell(3, "id"), Some(DataValue::Float(2.0)));
    }

    #[test]
    fn test_sum_rows() {
        let mut t = table();
        t.sum_rows("total", false);
        assert_eq!(t.get_cell(0, "total"), Some(11.into()));
        assert_eq!(t.get_cell(1, "total"), Some(2.into()));
        assert_eq!(t.get_cell(2, "total"), Some(DataValue::Float(5.5)));
    }

    #[test]
    fn test_pivot() {
        let mut t = DataTable::from_matrix(
            vec![
                vec!["q1".into(), 10.into(), 20.into()],
                vec!["q2".into(), 30.into(), 40.into()],
            ],
            HeaderSource::Fields(vec!["quarter".into(), "north".into(), "south".into()]),
        );
        t.pivot();
        assert_eq!(t.fields(), vec!["quarter", "q1", "q2"]);
        assert_eq!(t.get_row(0), Some(vec!["north".into(), 10.into(), 30.into()]));
        assert_eq!(t.get_row(1), Some(vec!["south".into(), 20.into(), 40.into()]));
    }

    #[test]
    fn test_remove_duplicates_first_field_gate() {
        let rows = vec![
            vec!["a".into(), 1.into()],
            vec!["a".into(), 2.into()],
            vec!["b".into(), 1.into()],
        ];
        let fields = HeaderSource::Fields(vec!["k".into(), "v".into()]);

        let mut t = DataTable::from_matrix(rows.clone(), fields.clone());
        t.remove_duplicates(None, DuplicateCheck::FirstField);
        assert_eq!(t.row_count(), 2);

        let mut t = DataTable::from_matrix(rows, fields);
        t.remove_duplicates(None, DuplicateCheck::AllFields);
        assert_eq!(t.row_count(), 3);
    }
}
