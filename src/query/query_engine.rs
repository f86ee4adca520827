use std::str::FromStr;

use anyhow::anyhow;
use tracing::{debug, trace};

use crate::config::config::QueryConfig;
use crate::data::datatable::{DataTable, DataValue, Record, Row};
use crate::query::functions::FunctionRegistry;
use crate::query::where_ast::{format_where_ast, WhereExpr};
use crate::query::where_parser::WhereParser;

/// A query compiled against one field list
#[derive(Debug, Clone)]
pub struct Program {
    source: String,
    /// `None` for a blank query, which keeps every row
    expr: Option<WhereExpr>,
}

impl Program {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, row: &[DataValue]) -> bool {
        match &self.expr {
            Some(expr) => expr.evaluate(row),
            None => true,
        }
    }

    pub fn describe(&self) -> String {
        match &self.expr {
            Some(expr) => format_where_ast(expr, 0),
            None => "ALL".to_string(),
        }
    }
}

/// Matching rows alongside their positions in the searched table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub indices: Vec<usize>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStyle {
    #[default]
    Rows,
    Index,
    Table,
    Records,
}

impl FromStr for SearchStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rows" => Ok(SearchStyle::Rows),
            "index" => Ok(SearchStyle::Index),
            "table" => Ok(SearchStyle::Table),
            "records" => Ok(SearchStyle::Records),
            other => Err(anyhow!("Unknown search style: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutput {
    Rows(Vec<Row>),
    Index(Vec<usize>),
    Table(DataTable),
    Records(Vec<Record>),
}

/// Compiles where-clauses and runs them as full scans
#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    case_sensitive: bool,
    functions: FunctionRegistry,
}

impl QueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn with_functions(mut self, functions: FunctionRegistry) -> Self {
        self.functions = functions;
        self
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    /// Compile a query. A query that does not parse yields a program that
    /// matches nothing.
    pub fn compile(&self, query: &str, fields: &[String]) -> Program {
        let parser = WhereParser::new(fields, self.case_sensitive, &self.functions);
        let expr = match parser.parse(query) {
            Ok(expr) => expr,
            Err(e) => {
                debug!(target: "query", "Query {:?} did not parse, matching nothing: {}", query, e);
                Some(WhereExpr::Never(e.to_string()))
            }
        };

        let program = Program {
            source: query.to_string(),
            expr,
        };
        trace!(target: "query", "Compiled {:?}:\n{}", query, program.describe());
        program
    }

    pub fn filter_indices(&self, table: &DataTable, query: &str) -> Vec<usize> {
        let program = self.compile(query, &table.fields);
        table
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| program.matches(row))
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn search(&self, table: &DataTable, query: &str) -> SearchResult {
        let indices = self.filter_indices(table, query);
        let rows = indices.iter().map(|&i| table.rows[i].clone()).collect();
        debug!(
            target: "query",
            "Query {:?} matched {} of {} rows",
            query,
            indices.len(),
            table.row_count()
        );
        SearchResult { indices, rows }
    }
}

impl From<&QueryConfig> for QueryEngine {
    fn from(config: &QueryConfig) -> Self {
        QueryEngine::new().with_case_sensitive(config.case_sensitive)
    }
}

impl DataTable {
    /// Search with a default engine (case-insensitive, no functions)
    pub fn search(&self, query: &str, style: SearchStyle) -> SearchOutput {
        self.search_with(&QueryEngine::new(), query, style)
    }

    pub fn search_with(&self, engine: &QueryEngine, query: &str, style: SearchStyle) -> SearchOutput {
        let result = engine.search(self, query);
        match style {
            SearchStyle::Rows => SearchOutput::Rows(result.rows),
            SearchStyle::Index => SearchOutput::Index(result.indices),
            SearchStyle::Table => SearchOutput::Table(DataTable::new(self.fields(), result.rows)),
            SearchStyle::Records => {
                let columns: Vec<usize> = (0..self.field_count()).collect();
                SearchOutput::Records(
                    result
                        .rows
                        .iter()
                        .map(|row| self.row_to_record(row, &columns))
                        .collect(),
                )
            }
        }
    }
}
