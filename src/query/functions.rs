//! Named predicate and setter functions callable as `$name(arg, ...)`

use crate::data::datatable::DataValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Decides whether a cell matches: `(cell, args) -> bool`
pub type Predicate = Arc<dyn Fn(&DataValue, &[String]) -> bool + Send + Sync>;

/// Computes a new cell value: `(current, args) -> new`
pub type Setter = Arc<dyn Fn(&DataValue, &[String]) -> DataValue + Send + Sync>;

/// A parsed `$name(args...)` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<String>,
}

impl FunctionCall {
    /// Parse a value that starts with `$name(a, b)`. Arguments are literal
    /// text split on commas; anything after the closing `)` is ignored.
    pub fn parse(value: &str) -> Option<Self> {
        let body = value.trim_start().strip_prefix('$')?;
        let open = body.find('(')?;
        let rest = &body[open + 1..];
        let inner = &rest[..rest.find(')')?];
        let name = body[..open].trim();
        if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return None;
        }

        let args = if inner.trim().is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(|a| a.trim().to_string()).collect()
        };

        Some(Self {
            name: name.to_string(),
            args,
        })
    }
}

#[derive(Clone, Default)]
pub struct FunctionRegistry {
    predicates: HashMap<String, Predicate>,
    setters: HashMap<String, Setter>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut predicates: Vec<&String> = self.predicates.keys().collect();
        let mut setters: Vec<&String> = self.setters.keys().collect();
        predicates.sort();
        setters.sort();
        f.debug_struct("FunctionRegistry")
            .field("predicates", &predicates)
            .field("setters", &setters)
            .finish()
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_predicate<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&DataValue, &[String]) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(name.into(), Arc::new(f));
        self
    }

    pub fn register_setter<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&DataValue, &[String]) -> DataValue + Send + Sync + 'static,
    {
        self.setters.insert(name.into(), Arc::new(f));
        self
    }

    pub fn with_predicate<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&DataValue, &[String]) -> bool + Send + Sync + 'static,
    {
        self.register_predicate(name, f);
        self
    }

    pub fn with_setter<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&DataValue, &[String]) -> DataValue + Send + Sync + 'static,
    {
        self.register_setter(name, f);
        self
    }

    pub fn predicate(&self, name: &str) -> Option<Predicate> {
        self.predicates.get(name).cloned()
    }

    pub fn setter(&self, name: &str) -> Option<Setter> {
        self.setters.get(name).cloned()
    }

    pub fn predicate_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.predicates.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn setter_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.setters.keys().cloned().collect();
        names.sort();
        names
    }

    /// A registry preloaded with a few general-purpose functions.
    ///
    /// Predicates: `gt`, `gte`, `lt`, `lte`, `between`, `in`, `empty`.
    /// Setters: `add`, `upper`, `lower`, `concat`, `clear`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register_predicate("gt", |cell, args| compare_first(cell, args, |a, b| a > b))
            .register_predicate("gte", |cell, args| compare_first(cell, args, |a, b| a >= b))
            .register_predicate("lt", |cell, args| compare_first(cell, args, |a, b| a < b))
            .register_predicate("lte", |cell, args| compare_first(cell, args, |a, b| a <= b))
            .register_predicate("between", |cell, args| {
                let bounds: Vec<f64> = args.iter().filter_map(|a| a.parse().ok()).collect();
                match (cell.as_number(), bounds.as_slice()) {
                    (Some(n), [lo, hi, ..]) => n >= *lo && n <= *hi,
                    _ => false,
                }
            })
            .register_predicate("in", |cell, args| {
                let text = cell.to_string();
                args.iter().any(|a| a.eq_ignore_ascii_case(&text))
            })
            .register_predicate("empty", |cell, _| cell.to_string().trim().is_empty())
            .register_setter("add", |cell, args| {
                let delta: f64 = args.first().and_then(|a| a.parse().ok()).unwrap_or(0.0);
                let whole = (delta.fract() == 0.0 && delta.abs() < i64::MAX as f64)
                    .then_some(delta as i64);
                match (cell, cell.as_number()) {
                    (DataValue::Integer(i), _) => match whole.and_then(|d| i.checked_add(d)) {
                        Some(sum) => DataValue::Integer(sum),
                        None => DataValue::Float(*i as f64 + delta),
                    },
                    (_, Some(n)) => DataValue::Float(n + delta),
                    _ => cell.clone(),
                }
            })
            .register_setter("upper", |cell, _| match cell {
                DataValue::String(s) => DataValue::String(s.to_uppercase()),
                other => other.clone(),
            })
            .register_setter("lower", |cell, _| match cell {
                DataValue::String(s) => DataValue::String(s.to_lowercase()),
                other => other.clone(),
            })
            .register_setter("concat", |cell, args| {
                DataValue::String(format!("{}{}", cell, args.join(",")))
            })
            .register_setter("clear", |_, _| DataValue::Null);
        registry
    }
}

fn compare_first(cell: &DataValue, args: &[String], op: impl Fn(f64, f64) -> bool) -> bool {
    let bound = args.first().and_then(|a| a.parse::<f64>().ok());
    match (cell.as_number(), bound) {
        (Some(n), Some(b)) => op(n, b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_function_call() {
        assert_eq!(
            FunctionCall::parse("$between(1, 5)"),
            Some(FunctionCall {
                name: "between".to_string(),
                args: vec!["1".to_string(), "5".to_string()],
            })
        );
        assert_eq!(
            FunctionCall::parse("$empty()"),
            Some(FunctionCall {
                name: "empty".to_string(),
                args: vec![],
            })
        );
        assert_eq!(FunctionCall::parse("between(1, 5)"), None);
        assert_eq!(FunctionCall::parse("$between(1, 5"), None);
        assert_eq!(FunctionCall::parse("$(1)"), None);
    }

    #[test]
    fn test_parse_uses_leading_call_only() {
        let expected = Some(FunctionCall {
            name: "gt".to_string(),
            args: vec!["5".to_string()],
        });
        assert_eq!(FunctionCall::parse("$gt(5) "), expected);
        assert_eq!(FunctionCall::parse("$gt(5)x"), expected);
        assert_eq!(FunctionCall::parse("x$gt(5)"), None);
        assert_eq!(FunctionCall::parse("$g t(5)"), None);
    }

    #[test]
    fn test_builtin_predicates() {
        let registry = FunctionRegistry::with_builtins();
        let gt = registry.predicate("gt").unwrap();
        assert!(gt(&DataValue::Integer(10), &["5".to_string()]));
        assert!(!gt(&DataValue::from("abc"), &["5".to_string()]));

        let between = registry.predicate("between").unwrap();
        assert!(between(&DataValue::from("3"), &["1".to_string(), "5".to_string()]));

        let is_in = registry.predicate("in").unwrap();
        assert!(is_in(&DataValue::from("Red"), &["red".to_string(), "blue".to_string()]));
    }

    #[test]
    fn test_builtin_setters() {
        let registry = FunctionRegistry::with_builtins();
        let add = registry.setter("add").unwrap();
        assert_eq!(add(&DataValue::Integer(2), &["3".to_string()]), DataValue::Integer(5));
        assert_eq!(add(&DataValue::from("1.5"), &["1".to_string()]), DataValue::Float(2.5));
        assert_eq!(add(&DataValue::from("x"), &["1".to_string()]), DataValue::from("x"));
        assert_eq!(
            add(&DataValue::Integer(i64::MAX), &["1".to_string()]),
            DataValue::Float(i64::MAX as f64 + 1.0)
        );
        assert_eq!(
            add(&DataValue::Integer(i64::MIN), &["-1".to_string()]),
            DataValue::Float(i64::MIN as f64 - 1.0)
        );
        assert_eq!(add(&DataValue::Integer(1), &["0.5".to_string()]), DataValue::Float(1.5));

        let upper = registry.setter("upper").unwrap();
        assert_eq!(upper(&DataValue::from("ab"), &[]), DataValue::from("AB"));
    }

    #[test]
    fn test_lookup_misses() {
        let registry = FunctionRegistry::new();
        assert!(registry.predicate("gt").is_none());
        assert!(registry.setter("add").is_none());
    }
}
