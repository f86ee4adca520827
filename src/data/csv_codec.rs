//! Delimited text (CSV/TSV) codec
//!
//! The reader is a small character-level state machine. A cell is either
//! unstarted, started without protection, or started inside quotes. Only a
//! protected cell may contain the separator, the newline token or a quote
//! (written as two quotes). The writer quotes every cell unconditionally.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

const QUOTE: char = '"';

/// Options shared by the reader and the writer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvOptions {
    /// One or two characters; `","` for CSV, `"\t"` for TSV
    pub separator: String,
    /// Row terminator, `"\r\n"` or `"\n"`
    pub newline: String,
    /// Remove embedded line breaks from cells when writing
    pub strip_newlines: bool,
    /// Guess cell types when reading instead of keeping plain strings
    pub infer_types: bool,
    /// First row carries the field names
    pub header: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            separator: ",".to_string(),
            newline: "\r\n".to_string(),
            strip_newlines: false,
            infer_types: false,
            header: true,
        }
    }
}

impl CsvOptions {
    pub fn tsv() -> Self {
        Self {
            separator: "\t".to_string(),
            ..Self::default()
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub fn with_newline(mut self, newline: impl Into<String>) -> Self {
        self.newline = newline.into();
        self
    }

    pub fn with_strip_newlines(mut self, strip: bool) -> Self {
        self.strip_newlines = strip;
        self
    }

    pub fn with_infer_types(mut self, infer: bool) -> Self {
        self.infer_types = infer;
        self
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    fn separator_chars(&self) -> Vec<char> {
        let chars: Vec<char> = self.separator.chars().take(2).collect();
        if chars.is_empty() {
            vec![',']
        } else {
            chars
        }
    }

    fn newline_chars(&self) -> Vec<char> {
        let chars: Vec<char> = self.newline.chars().collect();
        if chars.is_empty() {
            vec!['\r', '\n']
        } else {
            chars
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellState {
    Unstarted,
    Unprotected,
    Protected,
}

/// Character-level reader for delimited text
pub struct CsvTokenizer {
    separator: Vec<char>,
    newline: Vec<char>,
}

impl CsvTokenizer {
    pub fn new(options: &CsvOptions) -> Self {
        Self {
            separator: options.separator_chars(),
            newline: options.newline_chars(),
        }
    }

    /// Split text into rows of raw cell strings
    pub fn tokenize(&self, text: &str) -> Vec<Vec<String>> {
        let chars: Vec<char> = text.chars().collect();
        let mut table: Vec<Vec<String>> = Vec::new();
        let mut row: Vec<String> = Vec::new();
        let mut cell = String::new();
        let mut state = CellState::Unstarted;
        let mut pos = 0;

        while pos < chars.len() {
            let c = chars[pos];

            if state == CellState::Protected {
                if c == QUOTE {
                    if chars.get(pos + 1) == Some(&QUOTE) {
                        cell.push(QUOTE);
                        pos += 2;
                    } else {
                        state = CellState::Unprotected;
                        pos += 1;
                    }
                } else {
                    cell.push(c);
                    pos += 1;
                }
                continue;
            }

            let rest = &chars[pos..];
            if rest.starts_with(&self.separator) {
                row.push(std::mem::take(&mut cell));
                state = CellState::Unstarted;
                pos += self.separator.len();
            } else if rest.starts_with(&self.newline) {
                row.push(std::mem::take(&mut cell));
                table.push(std::mem::take(&mut row));
                state = CellState::Unstarted;
                pos += self.newline.len();
            } else if c == QUOTE && state == CellState::Unstarted {
                state = CellState::Protected;
                pos += 1;
            } else {
                cell.push(c);
                state = CellState::Unprotected;
                pos += 1;
            }
        }

        // Last row without a trailing newline
        if state != CellState::Unstarted || !cell.is_empty() || !row.is_empty() {
            row.push(cell);
            table.push(row);
        }

        debug!(target: "csv", "Tokenized {} rows from {} chars", table.len(), chars.len());
        table
    }
}

/// Parse delimited text into rows of raw strings
pub fn parse_delimited(text: &str, options: &CsvOptions) -> Vec<Vec<String>> {
    CsvTokenizer::new(options).tokenize(text)
}

fn quote_runs() -> &'static Regex {
    static QUOTE_RUNS: OnceLock<Regex> = OnceLock::new();
    QUOTE_RUNS.get_or_init(|| Regex::new("\"{2,}").expect("static pattern"))
}

fn line_breaks() -> &'static Regex {
    static LINE_BREAKS: OnceLock<Regex> = OnceLock::new();
    LINE_BREAKS.get_or_init(|| Regex::new("\r\n|\r|\n").expect("static pattern"))
}

/// Quote one cell for output.
///
/// Runs of quotes collapse to a single quote before every remaining quote
/// is doubled, so `a""b` is written the same as `a"b`.
pub fn escape_cell(value: &str, options: &CsvOptions) -> String {
    let collapsed = quote_runs().replace_all(value, "\"");
    let mut escaped = collapsed.replace(QUOTE, "\"\"");
    if options.strip_newlines {
        escaped = line_breaks().replace_all(&escaped, "").into_owned();
    }
    format!("\"{}\"", escaped)
}

/// Write rows of strings as delimited text (no trailing newline)
pub fn write_delimited(rows: &[Vec<String>], options: &CsvOptions) -> String {
    let separator: String = options.separator_chars().into_iter().collect();
    let newline: String = options.newline_chars().into_iter().collect();

    rows.iter()
        .map(|row| {
            row.iter()
                .map(|cell| escape_cell(cell, options))
                .collect::<Vec<_>>()
                .join(&separator)
        })
        .collect::<Vec<_>>()
        .join(&newline)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Vec<Vec<String>> {
        parse_delimited(text, &CsvOptions::default())
    }

    fn strings(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_plain_rows() {
        assert_eq!(
            parse("a,b\r\n1,2\r\n"),
            strings(&[&["a", "b"], &["1", "2"]])
        );
    }

    #[test]
    fn test_final_row_without_newline() {
        assert_eq!(parse("a,b\r\n1,2"), strings(&[&["a", "b"], &["1", "2"]]));
    }

    #[test]
    fn test_quoted_separator_and_newline() {
        assert_eq!(
            parse("\"x,y\",\"line1\r\nline2\"\r\nz,w"),
            strings(&[&["x,y", "line1\r\nline2"], &["z", "w"]])
        );
    }

    #[test]
    fn test_doubled_quote_inside_protected_cell() {
        assert_eq!(parse("\"a,\"\"b\"\"\""), strings(&[&["a,\"b\""]]));
    }

    #[test]
    fn test_quote_inside_unprotected_cell_is_literal() {
        assert_eq!(parse("ab\"c,d"), strings(&[&["ab\"c", "d"]]));
    }

    #[test]
    fn test_trailing_separator_yields_empty_cell() {
        assert_eq!(parse("a,b,"), strings(&[&["a", "b", ""]]));
        assert_eq!(parse("\"\""), strings(&[&[""]]));
    }

    #[test]
    fn test_tab_and_lf() {
        let options = CsvOptions::tsv().with_newline("\n");
        assert_eq!(
            parse_delimited("a\tb\nc,d\te", &options),
            strings(&[&["a", "b"], &["c,d", "e"]])
        );
    }

    #[test]
    fn test_two_character_separator() {
        let options = CsvOptions::default().with_separator("||");
        assert_eq!(
            parse_delimited("a||b|c||d", &options),
            strings(&[&["a", "b|c", "d"]])
        );
    }

    #[test]
    fn test_escape_cell() {
        let options = CsvOptions::default();
        assert_eq!(escape_cell("plain", &options), "\"plain\"");
        assert_eq!(escape_cell("a,\"b\"", &options), "\"a,\"\"b\"\"\"");
        assert_eq!(escape_cell("a\"\"\"b", &options), "\"a\"\"b\"");
    }

    #[test]
    fn test_strip_newlines() {
        let options = CsvOptions::default().with_strip_newlines(true);
        assert_eq!(escape_cell("one\r\ntwo\nthree", &options), "\"onetwothree\"");
    }

    #[test]
    fn test_write_then_read_special_cell() {
        let options = CsvOptions::default();
        let rows = strings(&[&["id", "text"], &["1", "a,\"b\""]]);
        let text = write_delimited(&rows, &options);
        assert_eq!(parse_delimited(&text, &options), rows);
    }
}
