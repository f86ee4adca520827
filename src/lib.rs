//! In-memory record tables with a small where-clause language.
//!
//! Tables convert between matrices, keyed records and delimited text, can be
//! filtered, sorted and edited in place, and can be wrapped in a
//! [`DataStore`] that keeps a restorable baseline.

pub mod config;
pub mod data;
pub mod logging;
pub mod query;
pub mod shell;

pub use data::csv_codec::CsvOptions;
pub use data::data_store::{DataStore, Query};
pub use data::datatable::{DataTable, DataType, DataValue, FieldRef, Record, Row};
pub use data::mutations::{ColumnInput, DuplicateCheck, RowInput};
pub use data::shape::{DataShape, ExportOptions, Exported, HeaderSource, OutputShape, RecordTable};
pub use data::sorting::SortKey;
pub use query::{FunctionRegistry, Program, QueryEngine, SearchOutput, SearchResult, SearchStyle};
