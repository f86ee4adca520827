//! Transactional wrapper: a durable backup table and a per-call working copy

use crate::config::config::QueryConfig;
use crate::data::datatable::{DataTable, DataValue, FieldRef};
use crate::data::mutations::{DuplicateCheck, RowInput};
use crate::data::shape::{ExportOptions, Exported, OutputShape};
use crate::query::query_engine::QueryEngine;
use crate::query::set_clause::parse_set_clause;
use tracing::{debug, info};

/// select / where / order-by for `DataStore::query`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    select: Option<String>,
    filter: Option<String>,
    order_by: Option<String>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Comma-separated field names; `*` keeps every field
    pub fn select(mut self, fields: impl Into<String>) -> Self {
        self.select = Some(fields.into());
        self
    }

    pub fn filter(mut self, clause: impl Into<String>) -> Self {
        self.filter = Some(clause.into());
        self
    }

    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.order_by = Some(clause.into());
        self
    }

    pub fn select_fields(&self) -> Option<Vec<FieldRef>> {
        let select = self.select.as_deref()?.trim();
        if select.is_empty() || select == "*" {
            return None;
        }
        Some(
            select
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(FieldRef::from)
                .collect(),
        )
    }

    pub fn filter_clause(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn order_by_clause(&self) -> Option<&str> {
        self.order_by.as_deref()
    }
}

/// Where-clauses are written with double quotes by callers
fn normalize_clause(clause: &str) -> String {
    clause.replace('"', "'")
}

#[derive(Debug, Clone)]
pub struct DataStore {
    backup: DataTable,
    working: DataTable,
    engine: QueryEngine,
    duplicate_check: DuplicateCheck,
}

impl DataStore {
    pub fn new(table: DataTable) -> Self {
        Self {
            working: table.clone(),
            backup: table,
            engine: QueryEngine::new(),
            duplicate_check: DuplicateCheck::default(),
        }
    }

    pub fn with_engine(mut self, engine: QueryEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_duplicate_check(mut self, check: DuplicateCheck) -> Self {
        self.duplicate_check = check;
        self
    }

    /// Apply the `[query]` settings
    pub fn configure(mut self, config: &QueryConfig) -> Self {
        let functions = self.engine.functions().clone();
        self.engine = QueryEngine::from(config).with_functions(functions);
        self.duplicate_check = config.duplicate_check;
        self
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut QueryEngine {
        &mut self.engine
    }

    pub fn backup(&self) -> DataTable {
        self.backup.clone()
    }

    pub fn working(&self) -> DataTable {
        self.working.clone()
    }

    pub fn row_count(&self) -> usize {
        self.backup.row_count()
    }

    pub fn field_count(&self) -> usize {
        self.backup.field_count()
    }

    /// Rebuild the working table from the backup
    pub fn reset(&mut self) -> &mut Self {
        self.working = self.backup.clone();
        self
    }

    fn commit(&mut self) {
        self.backup = self.working.clone();
        info!(target: "store", "Committed {} rows", self.backup.row_count());
    }

    fn matching(&self, clause: &str) -> Vec<usize> {
        self.engine
            .filter_indices(&self.working, &normalize_clause(clause))
    }

    /// Filter, sort and project a fresh copy of the backup, optionally
    /// making the result the new backup.
    pub fn query(
        &mut self,
        query: &Query,
        commit: bool,
        shape: OutputShape,
        options: &ExportOptions,
    ) -> Exported {
        self.reset();

        if let Some(clause) = query.filter_clause() {
            let keep = self.matching(clause);
            let rows = std::mem::take(&mut self.working.rows);
            self.working.rows = keep.into_iter().filter_map(|i| rows.get(i).cloned()).collect();
        }

        if let Some(clause) = query.order_by_clause() {
            self.working.order_by(clause);
        }

        if let Some(fields) = query.select_fields() {
            self.working.reorder(&fields);
        }

        debug!(target: "store", "Query {:?} produced {} rows", query, self.working.row_count());
        if commit {
            self.commit();
        }

        self.working.export(shape, options)
    }

    /// Apply `field='value', ...` to rows matching `clause`; always commits.
    /// Returns how many rows matched.
    pub fn update(&mut self, set: &str, clause: &str) -> usize {
        self.reset();
        let targets = self.matching(clause);
        let assignments = parse_set_clause(set);

        for assignment in &assignments {
            let Some(col) = self.working.field_index(&assignment.field) else {
                debug!(target: "store", "update skipping unknown field '{}'", assignment.field);
                continue;
            };
            for &row in &targets {
                let current = self.working.rows[row].get(col).cloned().unwrap_or(DataValue::Null);
                if let Some(value) = assignment.apply(&current, self.engine.functions()) {
                    self.working.set_cell(row, col, value);
                }
            }
        }

        info!(target: "store", "update touched {} rows", targets.len());
        self.commit();
        targets.len()
    }

    /// Remove rows matching `clause`; always commits. Returns the count removed.
    pub fn delete(&mut self, clause: &str) -> usize {
        self.reset();
        let targets = self.matching(clause);
        self.working.remove_rows(&targets);

        info!(target: "store", "delete removed {} rows", targets.len());
        self.commit();
        targets.len()
    }

    /// Append rows; always commits
    pub fn insert(&mut self, rows: Vec<RowInput>) -> usize {
        self.reset();
        let count = rows.len();
        self.working.add_rows(rows);

        info!(target: "store", "insert appended {} rows", count);
        self.commit();
        count
    }

    /// Drop duplicate rows using the configured check; always commits.
    /// Returns the count removed.
    pub fn distinct(&mut self, fields: Option<&[FieldRef]>) -> usize {
        self.reset();
        let before = self.working.row_count();
        self.working.remove_duplicates(fields, self.duplicate_check);
        let removed = before - self.working.row_count();

        info!(target: "store", "distinct removed {} rows", removed);
        self.commit();
        removed
    }
}
