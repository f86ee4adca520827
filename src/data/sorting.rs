//! Multi-key row ordering
//!
//! Keys are compared in priority order; the first key whose (optionally
//! primed) values differ decides. Rows equal on every key keep their input
//! order because `sort_by` is stable.

use crate::data::datatable::{DataTable, DataValue, FieldRef, Row};
use crate::data::datavalue_compare::compare_optional_datavalues;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Transforms a value before it is compared
pub type Primer = Arc<dyn Fn(&DataValue) -> DataValue + Send + Sync>;

#[derive(Clone)]
pub struct SortKey {
    pub field: FieldRef,
    pub descending: bool,
    pub primer: Option<Primer>,
}

impl fmt::Debug for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortKey")
            .field("field", &self.field)
            .field("descending", &self.descending)
            .field("primer", &self.primer.is_some())
            .finish()
    }
}

impl SortKey {
    pub fn asc(field: impl Into<FieldRef>) -> Self {
        Self {
            field: field.into(),
            descending: false,
            primer: None,
        }
    }

    pub fn desc(field: impl Into<FieldRef>) -> Self {
        Self {
            descending: true,
            ..Self::asc(field)
        }
    }

    pub fn with_primer<F>(mut self, primer: F) -> Self
    where
        F: Fn(&DataValue) -> DataValue + Send + Sync + 'static,
    {
        self.primer = Some(Arc::new(primer));
        self
    }

    /// Build keys from parallel field and descending-flag lists.
    /// Missing flags mean ascending.
    pub fn from_parallel(fields: &[FieldRef], descending: &[bool]) -> Vec<SortKey> {
        fields
            .iter()
            .enumerate()
            .map(|(i, field)| SortKey {
                field: field.clone(),
                descending: descending.get(i).copied().unwrap_or(false),
                primer: None,
            })
            .collect()
    }
}

/// Parse an ORDER BY style clause: `name DESC, id, "first name" asc`
pub fn parse_order_by(clause: &str) -> Vec<SortKey> {
    clause
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (name, descending) = match part.rsplit_once(char::is_whitespace) {
                Some((name, dir)) if dir.eq_ignore_ascii_case("desc") => (name.trim(), true),
                Some((name, dir)) if dir.eq_ignore_ascii_case("asc") => (name.trim(), false),
                _ => (part, false),
            };
            let name = name.trim_matches(|c| c == '"' || c == '\'');
            SortKey {
                field: FieldRef::from(name),
                descending,
                primer: None,
            }
        })
        .collect()
}

struct ResolvedKey {
    column: usize,
    descending: bool,
    primer: Option<Primer>,
}

/// Generate a row comparator for the given keys against this table's
/// fields. Keys that do not resolve are dropped.
pub fn row_comparator(table: &DataTable, keys: &[SortKey]) -> impl Fn(&Row, &Row) -> Ordering {
    let resolved: Vec<ResolvedKey> = keys
        .iter()
        .filter_map(|key| {
            let column = table.resolve(&key.field);
            if column.is_none() {
                debug!(target: "sort", "Dropping unknown sort key {}", key.field);
            }
            column.map(|column| ResolvedKey {
                column,
                descending: key.descending,
                primer: key.primer.clone(),
            })
        })
        .collect();

    move |a: &Row, b: &Row| {
        for key in &resolved {
            let ordering = match &key.primer {
                Some(primer) => {
                    let pa = a.get(key.column).map(|v| primer(v));
                    let pb = b.get(key.column).map(|v| primer(v));
                    compare_optional_datavalues(pa.as_ref(), pb.as_ref())
                }
                None => compare_optional_datavalues(a.get(key.column), b.get(key.column)),
            };
            let ordering = if key.descending {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl DataTable {
    /// Stable in-place sort by the given keys
    pub fn sort_by_keys(&mut self, keys: &[SortKey]) -> &mut Self {
        let compare = row_comparator(self, keys);
        self.rows.sort_by(|a, b| compare(a, b));
        self
    }

    /// Sort from parallel field and descending-flag lists
    pub fn sort(&mut self, fields: &[FieldRef], descending: &[bool]) -> &mut Self {
        self.sort_by_keys(&SortKey::from_parallel(fields, descending))
    }

    /// Sort from an ORDER BY style clause
    pub fn order_by(&mut self, clause: &str) -> &mut Self {
        self.sort_by_keys(&parse_order_by(clause))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datavalue_compare::compare_datavalues;
    use crate::data::shape::HeaderSource;

    fn trades() -> DataTable {
        DataTable::from_matrix(
            vec![
                vec![1.into(), "Alice".into(), 100.0.into()],
                vec![2.into(), "Bob".into(), 150.0.into()],
                vec![3.into(), "Alice".into(), 200.0.into()],
                vec![4.into(), "Bob".into(), 120.0.into()],
                vec![5.into(), "Alice".into(), 150.0.into()],
            ],
            HeaderSource::Fields(vec!["id".into(), "trader".into(), "price".into()]),
        )
    }

    fn ids(table: &DataTable) -> Vec<DataValue> {
        table.get_column("id").unwrap()
    }

    #[test]
    fn test_parse_order_by() {
        let keys = parse_order_by("trader DESC, price, \"first name\" asc");
        assert_eq!(keys.len(), 3);
        assert_eq!(keys[0].field, FieldRef::from("trader"));
        assert!(keys[0].descending);
        assert!(!keys[1].descending);
        assert_eq!(keys[2].field, FieldRef::from("first name"));
    }

    #[test]
    fn test_multi_key_sort() {
        let mut table = trades();
        table.order_by("trader, price DESC");
        assert_eq!(
            ids(&table),
            vec![3.into(), 5.into(), 1.into(), 2.into(), 4.into()]
        );
    }

    #[test]
    fn test_stable_for_ties() {
        let mut table = trades();
        table.sort(&[FieldRef::from("trader")], &[]);
        assert_eq!(
            ids(&table),
            vec![1.into(), 3.into(), 5.into(), 2.into(), 4.into()]
        );
    }

    #[test]
    fn test_unknown_keys_are_dropped() {
        let mut table = trades();
        table.sort(
            &[FieldRef::from("nope"), FieldRef::from("price")],
            &[true, false],
        );
        // "nope" is dropped, so its descending flag does not leak onto price
        assert_eq!(
            ids(&table),
            vec![1.into(), 4.into(), 2.into(), 5.into(), 3.into()]
        );
    }

    #[test]
    fn test_primer_applied_before_compare() {
        let mut table = DataTable::from_matrix(
            vec![vec!["b".into()], vec!["C".into()], vec!["a".into()]],
            HeaderSource::Fields(vec!["letter".into()]),
        );
        table.sort_by_keys(&[SortKey::asc("letter")
            .with_primer(|v| DataValue::String(v.to_string().to_lowercase()))]);
        assert_eq!(
            table.get_column("letter").unwrap(),
            vec!["a".into(), "b".into(), "C".into()]
        );
    }

    #[test]
    fn test_numeric_strings_sort_numerically_against_numbers() {
        let mut table = DataTable::from_matrix(
            vec![vec!["10".into()], vec![9.into()], vec![DataValue::Null]],
            HeaderSource::Fields(vec!["n".into()]),
        );
        table.order_by("n");
        assert_eq!(
            table.get_column("n").unwrap(),
            vec![DataValue::Null, 9.into(), "10".into()]
        );
    }

    fn mixed_column(rows: usize) -> DataTable {
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let cells = (0..rows)
            .map(|_| {
                seed = seed
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                let v = (seed >> 33) % 100;
                let cell = match (seed >> 20) % 3 {
                    0 => DataValue::Integer(v as i64),
                    1 => DataValue::String(v.to_string()),
                    _ => DataValue::String(format!("x{}", v)),
                };
                vec![cell]
            })
            .collect();
        DataTable::from_matrix(cells, HeaderSource::Fields(vec!["n".into()]))
    }

    #[test]
    fn test_mixed_column_sorts_both_directions() {
        for clause in ["n", "n DESC"] {
            let mut table = mixed_column(64);
            table.order_by(clause);
            let column = table.get_column("n").unwrap();
            assert_eq!(column.len(), 64);

            let expected = if clause == "n" {
                Ordering::Greater
            } else {
                Ordering::Less
            };
            for pair in column.windows(2) {
                assert_ne!(
                    compare_datavalues(&pair[0], &pair[1]),
                    expected,
                    "{} out of order: {:?}",
                    clause,
                    pair
                );
            }
        }
    }

    #[test]
    fn test_numbers_precede_plain_text() {
        let mut table = DataTable::from_matrix(
            vec![vec!["x1".into()], vec!["20".into()], vec![3.into()]],
            HeaderSource::Fields(vec!["n".into()]),
        );
        table.order_by("n");
        assert_eq!(
            table.get_column("n").unwrap(),
            vec![3.into(), "20".into(), "x1".into()]
        );
    }
}
