//! `field='value', other='$fn(args)'` assignment lists for updates

use crate::data::datatable::DataValue;
use crate::query::functions::{FunctionCall, FunctionRegistry};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum AssignedValue {
    Literal(String),
    Call(FunctionCall),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub field: String,
    pub value: AssignedValue,
}

impl Assignment {
    /// New cell value, or `None` when the named setter is unknown
    pub fn apply(&self, current: &DataValue, functions: &FunctionRegistry) -> Option<DataValue> {
        match &self.value {
            AssignedValue::Literal(text) => Some(DataValue::String(text.clone())),
            AssignedValue::Call(call) => match functions.setter(&call.name) {
                Some(setter) => Some(setter(current, &call.args)),
                None => {
                    debug!(target: "query", "No setter named '{}', leaving {} unchanged", call.name, self.field);
                    None
                }
            },
        }
    }
}

/// Parse an assignment list. Pieces without an `=` are skipped.
pub fn parse_set_clause(clause: &str) -> Vec<Assignment> {
    split_top_level(clause)
        .into_iter()
        .filter_map(|part| {
            let (field, value) = part.split_once('=')?;
            let field = field.trim();
            if field.is_empty() {
                return None;
            }
            let value = unquote(value.trim());
            let value = match FunctionCall::parse(value) {
                Some(call) => AssignedValue::Call(call),
                None => AssignedValue::Literal(value.to_string()),
            };
            Some(Assignment {
                field: field.to_string(),
                value,
            })
        })
        .collect()
}

// Commas inside quotes or parentheses do not separate assignments
fn split_top_level(clause: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;

    for c in clause.chars() {
        match (c, quote) {
            ('\'' | '"', None) => quote = Some(c),
            (q, Some(open)) if q == open => quote = None,
            ('(', None) => depth += 1,
            (')', None) => depth = depth.saturating_sub(1),
            (',', None) if depth == 0 => {
                parts.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if !current.trim().is_empty() {
        parts.push(current);
    }
    parts
}

fn unquote(value: &str) -> &str {
    for q in ['\'', '"'] {
        if let Some(inner) = value.strip_prefix(q).and_then(|v| v.strip_suffix(q)) {
            return inner;
        }
    }
    value
}
