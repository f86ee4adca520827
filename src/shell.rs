//! Command parsing and execution for the interactive shell

use anyhow::{anyhow, bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::config::Config;
use crate::data::csv_codec::{parse_delimited, CsvOptions};
use crate::data::data_store::{DataStore, Query};
use crate::data::datatable::{DataTable, DataValue, FieldRef};
use crate::data::mutations::RowInput;
use crate::data::shape::{ExportOptions, HeaderSource, OutputShape};
use crate::logging::log_buffer;
use crate::query::functions::FunctionRegistry;
use crate::query::query_engine::QueryEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Records,
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "records" => Ok(ExportFormat::Records),
            other => Err(anyhow!("Unknown export format '{}' (csv, json, records)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load(PathBuf),
    Fields,
    Show,
    Where(String),
    Sort(String),
    Select {
        fields: String,
        clause: Option<String>,
    },
    Update {
        set: String,
        clause: String,
    },
    Delete(String),
    Insert(String),
    Distinct(Option<String>),
    Commit(bool),
    Export {
        format: ExportFormat,
        path: Option<PathBuf>,
    },
    Logs(usize),
    Help,
    Quit,
}

/// Split `text` at the first standalone ` where ` (any case)
fn split_where(text: &str) -> (&str, Option<&str>) {
    let lower = text.to_lowercase();
    match lower.find(" where ") {
        // lower-casing can shift byte offsets for non-ASCII text
        Some(pos) if text.is_char_boundary(pos) && text.is_char_boundary(pos + 7) => {
            (text[..pos].trim(), Some(text[pos + 7..].trim()))
        }
        _ => (text.trim(), None),
    }
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let require = |what: &str| -> Result<String> {
            if rest.is_empty() {
                bail!("Usage: {} {}", verb, what);
            }
            Ok(rest.to_string())
        };

        let command = match verb.to_lowercase().as_str() {
            "load" => Command::Load(PathBuf::from(require("<path>")?)),
            "fields" => Command::Fields,
            "show" => Command::Show,
            "where" => Command::Where(require("<clause>")?),
            "sort" => Command::Sort(require("<field [ASC|DESC], ...>")?),
            "select" => {
                let text = require("<fields> [where <clause>]")?;
                let (fields, clause) = split_where(&text);
                Command::Select {
                    fields: fields.to_string(),
                    clause: clause.map(str::to_string),
                }
            }
            "update" => {
                let text = require("<field=\"value\", ...> where <clause>")?;
                match split_where(&text) {
                    (set, Some(clause)) if !set.is_empty() && !clause.is_empty() => Command::Update {
                        set: set.to_string(),
                        clause: clause.to_string(),
                    },
                    _ => bail!("Usage: update <field=\"value\", ...> where <clause>"),
                }
            }
            "delete" => Command::Delete(require("<clause>")?),
            "insert" => Command::Insert(require("<csv row>")?),
            "distinct" => Command::Distinct((!rest.is_empty()).then(|| rest.to_string())),
            "commit" => match rest.to_lowercase().as_str() {
                "on" | "true" => Command::Commit(true),
                "off" | "false" => Command::Commit(false),
                _ => bail!("Usage: commit on|off"),
            },
            "export" => {
                let mut parts = rest.split_whitespace();
                let format = parts.next().unwrap_or("csv").parse()?;
                Command::Export {
                    format,
                    path: parts.next().map(PathBuf::from),
                }
            }
            "logs" => Command::Logs(if rest.is_empty() {
                20
            } else {
                rest.parse().context("logs takes a number of entries")?
            }),
            "help" | "\\help" | "?" => Command::Help,
            "quit" | "exit" | "\\q" => Command::Quit,
            other => bail!("Unknown command '{}'. Type 'help' for a list.", other),
        };
        Ok(command)
    }
}

/// What a command produced, for the front end to render
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Table(DataTable),
    Text(String),
    Message(String),
    /// Help, with the registered predicate and setter names
    Help {
        predicates: Vec<String>,
        setters: Vec<String>,
    },
    Quit,
}

pub struct Session {
    config: Config,
    functions: FunctionRegistry,
    store: Option<DataStore>,
    commit: bool,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            functions: FunctionRegistry::with_builtins(),
            store: None,
            commit: false,
        }
    }

    pub fn with_table(mut self, table: DataTable) -> Self {
        self.store = Some(self.make_store(table));
        self
    }

    pub fn commit_enabled(&self) -> bool {
        self.commit
    }

    pub fn store(&self) -> Option<&DataStore> {
        self.store.as_ref()
    }

    fn make_store(&self, table: DataTable) -> DataStore {
        let engine = QueryEngine::from(&self.config.query).with_functions(self.functions.clone());
        DataStore::new(table)
            .with_engine(engine)
            .configure(&self.config.query)
    }

    fn store_mut(&mut self) -> Result<&mut DataStore> {
        self.store
            .as_mut()
            .ok_or_else(|| anyhow!("No data loaded. Use 'load <file>' first."))
    }

    fn run_query(&mut self, query: Query) -> Result<Outcome> {
        let commit = self.commit;
        let exported = self.store_mut()?.query(
            &query,
            commit,
            OutputShape::Table,
            &ExportOptions::default(),
        );
        exported
            .into_table()
            .map(Outcome::Table)
            .ok_or_else(|| anyhow!("Query did not produce a table"))
    }

    pub fn execute(&mut self, command: Command) -> Result<Outcome> {
        match command {
            Command::Load(path) => {
                let table = load_table(&path, &self.config.csv_options())?;
                let message = format!(
                    "Loaded {} rows x {} fields from {}",
                    table.row_count(),
                    table.field_count(),
                    path.display()
                );
                info!(target: "store", "{}", message);
                self.store = Some(self.make_store(table));
                Ok(Outcome::Message(message))
            }
            Command::Fields => {
                let table = self.store_mut()?.backup();
                let listing = table
                    .fields()
                    .iter()
                    .zip(table.column_types())
                    .map(|(name, data_type)| format!("{} ({:?})", name, data_type))
                    .collect::<Vec<_>>()
                    .join("\n");
                Ok(Outcome::Text(listing))
            }
            Command::Show => self.run_query(Query::new()),
            Command::Where(clause) => self.run_query(Query::new().filter(clause)),
            Command::Sort(clause) => self.run_query(Query::new().order_by(clause)),
            Command::Select { fields, clause } => {
                let mut query = Query::new().select(fields);
                if let Some(clause) = clause {
                    query = query.filter(clause);
                }
                self.run_query(query)
            }
            Command::Update { set, clause } => {
                let count = self.store_mut()?.update(&set, &clause);
                Ok(Outcome::Message(format!("Updated {} rows", count)))
            }
            Command::Delete(clause) => {
                let count = self.store_mut()?.delete(&clause);
                Ok(Outcome::Message(format!("Deleted {} rows", count)))
            }
            Command::Insert(text) => {
                let options = self.config.csv_options().with_header(false);
                let rows: Vec<RowInput> = parse_delimited(&text, &options)
                    .into_iter()
                    .map(|cells| {
                        RowInput::Positional(
                            cells
                                .iter()
                                .map(|c| {
                                    if options.infer_types {
                                        DataValue::infer(c)
                                    } else {
                                        DataValue::from(c.as_str())
                                    }
                                })
                                .collect(),
                        )
                    })
                    .collect();
                let count = self.store_mut()?.insert(rows);
                Ok(Outcome::Message(format!("Inserted {} rows", count)))
            }
            Command::Distinct(fields) => {
                let fields: Option<Vec<FieldRef>> = fields.map(|f| {
                    f.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(FieldRef::from)
                        .collect()
                });
                let removed = self.store_mut()?.distinct(fields.as_deref());
                Ok(Outcome::Message(format!("Removed {} duplicate rows", removed)))
            }
            Command::Commit(on) => {
                self.commit = on;
                Ok(Outcome::Message(format!(
                    "Query results {} the data",
                    if on { "now replace" } else { "no longer replace" }
                )))
            }
            Command::Export { format, path } => {
                let working = self.store_mut()?.working();
                let text = match format {
                    ExportFormat::Csv => working.to_csv(&self.config.csv_options(), None),
                    ExportFormat::Json => {
                        serde_json::to_string_pretty(&working.to_record_table(None))?
                    }
                    ExportFormat::Records => {
                        serde_json::to_string_pretty(&working.to_records(None))?
                    }
                };
                match path {
                    Some(path) => {
                        fs::write(&path, &text)
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        Ok(Outcome::Message(format!(
                            "Exported {} rows to {}",
                            working.row_count(),
                            path.display()
                        )))
                    }
                    None => Ok(Outcome::Text(text)),
                }
            }
            Command::Logs(count) => Ok(Outcome::Text(
                log_buffer()
                    .get_recent(count)
                    .iter()
                    .map(|e| e.format_for_display())
                    .collect::<Vec<_>>()
                    .join("\n"),
            )),
            Command::Help => Ok(Outcome::Help {
                predicates: self.functions.predicate_names(),
                setters: self.functions.setter_names(),
            }),
            Command::Quit => Ok(Outcome::Quit),
        }
    }
}

/// Read a CSV/TSV or JSON file into a table
pub fn load_table(path: &Path, options: &CsvOptions) -> Result<DataTable> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let table = match extension.as_str() {
        "json" => {
            let header = if options.header {
                HeaderSource::FirstRow
            } else {
                HeaderSource::Positional
            };
            DataTable::from_json_str(&text, header)
        }
        _ => {
            let mut options = options.clone();
            if extension == "tsv" {
                options.separator = "\t".to_string();
            }
            // Follow the file's own line endings
            if !text.contains(options.newline.as_str()) && text.contains('\n') {
                options.newline = "\n".to_string();
            }
            DataTable::from_csv(&text, &options)
        }
    };

    if !table.is_valid() {
        bail!("{} does not contain tabular data", path.display());
    }
    Ok(table)
}
