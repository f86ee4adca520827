//! Configuration module
//!
//! TOML settings for the codec, the query engine and logging.

pub mod config;

pub use config::{Config, CsvConfig, LoggingConfig, QueryConfig};
