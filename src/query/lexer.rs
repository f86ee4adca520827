//! Tokenizer for the where-clause language
//!
//! ```text
//! condition := FIELD ('=' | '!=') 'VALUE'
//! expr      := condition | '(' expr ')' | expr ' AND ' expr | expr ' OR ' expr
//! ```
//!
//! Values are single-quoted and taken verbatim up to the next quote, so
//! parentheses and connectives inside a value are plain text.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LeftParen,
    RightParen,
    And,
    Or,
    Condition {
        field: String,
        negated: bool,
        value: String,
    },
    /// Text that does not form a condition
    Malformed(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::And => write!(f, "AND"),
            Token::Or => write!(f, "OR"),
            Token::Condition {
                field,
                negated,
                value,
            } => write!(f, "{}{}'{}'", field, if *negated { "!=" } else { "=" }, value),
            Token::Malformed(text) => write!(f, "<malformed {}>", text),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Lexer {
    input: Vec<char>,
    position: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    pub fn tokenize(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token() {
            tokens.push(token);
        }
        tokens
    }

    fn current(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.current().is_some_and(char::is_whitespace) {
            self.position += 1;
        }
    }

    fn is_boundary(&self, pos: usize) -> bool {
        match self.input.get(pos) {
            None => true,
            Some(c) => c.is_whitespace() || *c == '(' || *c == ')',
        }
    }

    /// Connectives are upper-case words standing on their own
    fn keyword_at(&self, word: &str) -> bool {
        let len = word.chars().count();
        let matches = self.input[self.position..]
            .iter()
            .take(len)
            .copied()
            .eq(word.chars());
        let preceded = self.position == 0 || self.is_boundary(self.position - 1);
        matches && preceded && self.is_boundary(self.position + len)
    }

    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();
        let c = self.current()?;

        match c {
            '(' => {
                self.position += 1;
                Some(Token::LeftParen)
            }
            ')' => {
                self.position += 1;
                Some(Token::RightParen)
            }
            _ if self.keyword_at("AND") => {
                self.position += 3;
                Some(Token::And)
            }
            _ if self.keyword_at("OR") => {
                self.position += 2;
                Some(Token::Or)
            }
            _ => Some(self.read_condition()),
        }
    }

    fn read_condition(&mut self) -> Token {
        let start = self.position;
        let mut field = String::new();

        // Field runs up to the operator
        let negated = loop {
            match self.current() {
                Some('=') => {
                    self.position += 1;
                    break false;
                }
                Some('!') if self.input.get(self.position + 1) == Some(&'=') => {
                    self.position += 2;
                    break true;
                }
                Some(c) if c == '\'' || c == '(' || c == ')' => {
                    return self.malformed_from(start);
                }
                Some(c) => {
                    field.push(c);
                    self.position += 1;
                }
                None => return self.malformed_from(start),
            }
        };

        if self.current() != Some('\'') {
            return self.malformed_from(start);
        }
        self.position += 1;

        let mut value = String::new();
        loop {
            match self.current() {
                Some('\'') => {
                    self.position += 1;
                    break;
                }
                Some(c) => {
                    value.push(c);
                    self.position += 1;
                }
                None => return self.malformed_from(start),
            }
        }

        Token::Condition {
            field: field.trim().to_string(),
            negated,
            value,
        }
    }

    /// Consume up to the next whitespace or parenthesis, at least one char
    fn malformed_from(&mut self, start: usize) -> Token {
        self.position = start + 1;
        while !self.is_boundary(self.position) {
            self.position += 1;
        }
        let text: String = self.input[start..self.position].iter().collect();
        Token::Malformed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(field: &str, negated: bool, value: &str) -> Token {
        Token::Condition {
            field: field.to_string(),
            negated,
            value: value.to_string(),
        }
    }

    #[test]
    fn test_simple_condition() {
        assert_eq!(Lexer::tokenize("age='30'"), vec![cond("age", false, "30")]);
    }

    #[test]
    fn test_grouped_expression() {
        assert_eq!(
            Lexer::tokenize("(a='x' OR a='y') AND b!='z'"),
            vec![
                Token::LeftParen,
                cond("a", false, "x"),
                Token::Or,
                cond("a", false, "y"),
                Token::RightParen,
                Token::And,
                cond("b", true, "z"),
            ]
        );
    }

    #[test]
    fn test_value_keeps_connectives_and_parens() {
        assert_eq!(
            Lexer::tokenize("note='(this AND that)'"),
            vec![cond("note", false, "(this AND that)")]
        );
    }

    #[test]
    fn test_field_with_spaces_and_function_value() {
        assert_eq!(
            Lexer::tokenize("first name='$gt(3, 4)'"),
            vec![cond("first name", false, "$gt(3, 4)")]
        );
    }

    #[test]
    fn test_keyword_needs_boundaries() {
        assert_eq!(
            Lexer::tokenize("ANDROID='x'"),
            vec![cond("ANDROID", false, "x")]
        );
        assert_eq!(
            Lexer::tokenize("a='1' and b='2'"),
            // lower-case "and" is swallowed into the next field name
            vec![cond("a", false, "1"), cond("and b", false, "2")]
        );
    }

    #[test]
    fn test_malformed_inputs() {
        assert_eq!(
            Lexer::tokenize("age=30"),
            vec![Token::Malformed("age=30".to_string())]
        );
        assert_eq!(
            Lexer::tokenize("name='open"),
            vec![Token::Malformed("name='open".to_string())]
        );
    }

    #[test]
    fn test_macro_field_is_a_plain_token() {
        assert_eq!(
            Lexer::tokenize("OR*='x'"),
            vec![cond("OR*", false, "x")]
        );
    }
}
