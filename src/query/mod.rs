pub mod functions;
pub mod lexer;
pub mod query_engine;
pub mod set_clause;
pub mod where_ast;
pub mod where_parser;
pub mod wildcard;

pub use functions::{FunctionCall, FunctionRegistry, Predicate, Setter};
pub use query_engine::{Program, QueryEngine, SearchOutput, SearchResult, SearchStyle};
