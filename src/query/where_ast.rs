use crate::data::datatable::DataValue;
use crate::query::functions::{FunctionCall, Predicate};
use regex::Regex;
use std::fmt;

/// How a condition tests its cell
#[derive(Clone)]
pub enum ValueTest {
    /// Wildcard pattern compiled to an anchored regex
    Wildcard(Regex),
    /// Caller-supplied named predicate
    Function {
        call: FunctionCall,
        predicate: Predicate,
    },
}

impl fmt::Debug for ValueTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueTest::Wildcard(re) => write!(f, "Wildcard({})", re.as_str()),
            ValueTest::Function { call, .. } => write!(f, "Function({:?})", call),
        }
    }
}

/// A single `field=value` / `field!=value` test bound to a column
#[derive(Debug, Clone)]
pub struct Condition {
    pub field: String,
    pub column: usize,
    pub negated: bool,
    pub value: String,
    pub test: ValueTest,
}

impl Condition {
    pub fn evaluate(&self, row: &[DataValue]) -> bool {
        let cell = row.get(self.column).unwrap_or(&DataValue::Null);
        let matched = match &self.test {
            ValueTest::Wildcard(re) => re.is_match(&cell.to_string()),
            ValueTest::Function { call, predicate } => predicate(cell, &call.args),
        };
        matched != self.negated
    }
}

#[derive(Debug, Clone)]
pub enum WhereExpr {
    And(Box<WhereExpr>, Box<WhereExpr>),
    Or(Box<WhereExpr>, Box<WhereExpr>),
    Condition(Condition),
    /// A condition that could not be bound; never true
    Never(String),
}

impl WhereExpr {
    pub fn evaluate(&self, row: &[DataValue]) -> bool {
        match self {
            WhereExpr::And(left, right) => left.evaluate(row) && right.evaluate(row),
            WhereExpr::Or(left, right) => left.evaluate(row) || right.evaluate(row),
            WhereExpr::Condition(condition) => condition.evaluate(row),
            WhereExpr::Never(_) => false,
        }
    }

    /// Fold a list into a left-leaning chain; empty lists never match
    pub fn chain(items: Vec<WhereExpr>, and: bool) -> WhereExpr {
        let mut iter = items.into_iter();
        let Some(first) = iter.next() else {
            return WhereExpr::Never("empty group".to_string());
        };
        iter.fold(first, |acc, next| {
            if and {
                WhereExpr::And(Box::new(acc), Box::new(next))
            } else {
                WhereExpr::Or(Box::new(acc), Box::new(next))
            }
        })
    }
}

pub fn format_where_ast(expr: &WhereExpr, indent: usize) -> String {
    let indent_str = "  ".repeat(indent);
    match expr {
        WhereExpr::And(left, right) => format!(
            "{}AND\n{}\n{}",
            indent_str,
            format_where_ast(left, indent + 1),
            format_where_ast(right, indent + 1)
        ),
        WhereExpr::Or(left, right) => format!(
            "{}OR\n{}\n{}",
            indent_str,
            format_where_ast(left, indent + 1),
            format_where_ast(right, indent + 1)
        ),
        WhereExpr::Condition(c) => format!(
            "{}{}({}#{}, {:?})",
            indent_str,
            if c.negated { "NOT_MATCH" } else { "MATCH" },
            c.field,
            c.column,
            c.value
        ),
        WhereExpr::Never(reason) => format!("{}NEVER({})", indent_str, reason),
    }
}
