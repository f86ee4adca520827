use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::data::csv_codec::CsvOptions;
use crate::data::mutations::DuplicateCheck;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub csv: CsvConfig,
    pub query: QueryConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvConfig {
    /// One or two characters; "\t" for TSV
    pub separator: String,

    /// Row terminator written on export and expected on import
    pub newline: String,

    /// Drop embedded line breaks from cells on export
    pub strip_newlines: bool,

    /// Guess integer/float/boolean cells instead of keeping text
    pub infer_types: bool,

    /// Treat the first row as field names
    pub header: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Compare values with exact case
    pub case_sensitive: bool,

    /// "first-field" or "all-fields"
    pub duplicate_check: DuplicateCheck,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is unset
    pub level: String,
}

impl Default for CsvConfig {
    fn default() -> Self {
        let defaults = CsvOptions::default();
        Self {
            separator: defaults.separator,
            newline: defaults.newline,
            strip_newlines: defaults.strip_newlines,
            infer_types: defaults.infer_types,
            header: defaults.header,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl From<&CsvConfig> for CsvOptions {
    fn from(config: &CsvConfig) -> Self {
        CsvOptions::default()
            .with_separator(config.separator.clone())
            .with_newline(config.newline.clone())
            .with_strip_newlines(config.strip_newlines)
            .with_infer_types(config.infer_types)
            .with_header(config.header)
    }
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let width = self.csv.separator.chars().count();
        if !(1..=2).contains(&width) {
            return Err(anyhow!(
                "csv.separator must be one or two characters, got {:?}",
                self.csv.separator
            ));
        }
        if self.csv.newline.is_empty() {
            return Err(anyhow!("csv.newline must not be empty"));
        }
        Ok(())
    }

    /// Load config from the default location; a missing file gives defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&contents)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("tabula").join("config.toml"))
    }

    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions::from(&self.csv)
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# Tabula Configuration File
# Location: ~/.config/tabula/config.toml (Linux)
#           ~/Library/Application Support/tabula/config.toml (macOS)
#           %APPDATA%\tabula\config.toml (Windows)

[csv]
# Cell separator, one or two characters ("\t" for TSV)
separator = ","

# Row terminator
newline = "\r\n"

# Remove line breaks inside cells when exporting
strip_newlines = false

# Turn numeric and boolean looking cells into typed values on load
infer_types = false

# First row holds the field names
header = true

[query]
# Match values with exact case (wildcards are case-insensitive otherwise)
case_sensitive = false

# How duplicates are detected: "first-field" or "all-fields"
duplicate_check = "first-field"

[logging]
# Default filter when RUST_LOG is not set (e.g. "debug", "query=trace")
level = "info"
"#
        .to_string()
    }
}
