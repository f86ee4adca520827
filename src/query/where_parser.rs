use crate::query::functions::{FunctionCall, FunctionRegistry};
use crate::query::lexer::{Lexer, Token};
use crate::query::where_ast::{Condition, ValueTest, WhereExpr};
use crate::query::wildcard::compile_wildcard;
use anyhow::{anyhow, Result};

/// Pseudo-fields that expand one condition across every field
const ANY_FIELD: &str = "OR*";
const EVERY_FIELD: &str = "AND*";

/// Recursive-descent parser producing a field-bound `WhereExpr`.
///
/// AND binds tighter than OR; parentheses group. Structural problems are
/// errors; conditions that cannot be bound to a field become `Never`.
pub struct WhereParser<'a> {
    tokens: Vec<Token>,
    current: usize,
    fields: &'a [String],
    case_sensitive: bool,
    functions: &'a FunctionRegistry,
}

impl<'a> WhereParser<'a> {
    pub fn new(
        fields: &'a [String],
        case_sensitive: bool,
        functions: &'a FunctionRegistry,
    ) -> Self {
        Self {
            tokens: Vec::new(),
            current: 0,
            fields,
            case_sensitive,
            functions,
        }
    }

    /// Parse a query. `Ok(None)` means the query had no tokens at all.
    pub fn parse(mut self, query: &str) -> Result<Option<WhereExpr>> {
        self.tokens = Lexer::tokenize(query);
        self.current = 0;
        if self.tokens.is_empty() {
            return Ok(None);
        }

        let expr = self.parse_or_expr()?;
        match self.current_token() {
            None => Ok(Some(expr)),
            Some(token) => Err(anyhow!("Unexpected token after expression: {}", token)),
        }
    }

    fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.current).cloned();
        self.current += 1;
        token
    }

    // Parse OR expressions (lowest precedence)
    fn parse_or_expr(&mut self) -> Result<WhereExpr> {
        let mut left = self.parse_and_expr()?;

        while let Some(Token::Or) = self.current_token() {
            self.advance();
            let right = self.parse_and_expr()?;
            left = WhereExpr::Or(Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<WhereExpr> {
        let mut left = self.parse_primary_expr()?;

        while let Some(Token::And) = self.current_token() {
            self.advance();
            let right = self.parse_primary_expr()?;
            left = WhereExpr::And(Box::new(left), Box::new(right));
        }

        Ok(left)
    }

    fn parse_primary_expr(&mut self) -> Result<WhereExpr> {
        match self.advance() {
            Some(Token::LeftParen) => {
                let expr = self.parse_or_expr()?;
                match self.advance() {
                    Some(Token::RightParen) => Ok(expr),
                    _ => Err(anyhow!("Expected closing parenthesis")),
                }
            }
            Some(Token::Condition {
                field,
                negated,
                value,
            }) => Ok(self.build_condition(&field, negated, &value)),
            Some(Token::Malformed(text)) => Err(anyhow!("Malformed condition: {}", text)),
            Some(token) => Err(anyhow!("Unexpected token: {}", token)),
            None => Err(anyhow!("Unexpected end of query")),
        }
    }

    fn build_condition(&self, field: &str, negated: bool, value: &str) -> WhereExpr {
        match field {
            ANY_FIELD | EVERY_FIELD => {
                let expanded = self
                    .fields
                    .iter()
                    .map(|name| self.bind(name, negated, value))
                    .collect();
                WhereExpr::chain(expanded, field == EVERY_FIELD)
            }
            _ => self.bind(field, negated, value),
        }
    }

    fn bind(&self, field: &str, negated: bool, value: &str) -> WhereExpr {
        let Some(column) = resolve_field(field, self.fields) else {
            return WhereExpr::Never(format!("unresolved field '{}'", field));
        };

        let named = FunctionCall::parse(value)
            .and_then(|call| self.functions.predicate(&call.name).map(|p| (call, p)));
        let test = match named {
            Some((call, predicate)) => ValueTest::Function { call, predicate },
            None => match compile_wildcard(value, self.case_sensitive) {
                Some(re) => ValueTest::Wildcard(re),
                None => return WhereExpr::Never(format!("bad pattern '{}'", value)),
            },
        };

        WhereExpr::Condition(Condition {
            field: field.to_string(),
            column,
            negated,
            value: value.to_string(),
            test,
        })
    }
}

/// Bind a field name to its column.
///
/// Fields are tried in declaration order. A field whose name is a proper
/// suffix of the written name claims it first and spoils the binding, so
/// with fields `["name", "firstname"]` the text `firstname='x'` binds to
/// nothing, while `["firstname", "name"]` binds it to column 0.
pub fn resolve_field(written: &str, fields: &[String]) -> Option<usize> {
    for (index, field) in fields.iter().enumerate() {
        if field.is_empty() {
            continue;
        }
        if written == field {
            return Some(index);
        }
        if written.ends_with(field.as_str()) {
            return None;
        }
    }
    None
}
