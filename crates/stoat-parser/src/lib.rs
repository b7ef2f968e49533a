//! # Stoat Parser
//!
//! Hand-written lexer and recursive-descent parser producing `stoat-ast`
//! nodes. Covers the ES5 statement/expression subset the Stoat engine
//! evaluates, including `"use strict"` directive detection and restricted
//! automatic semicolon insertion.

#![warn(clippy::all)]
#![warn(missing_docs)]

mod lexer;
mod parser;
mod token;

use thiserror::Error;

pub use parser::Parser;
pub use token::{Token, TokenKind};

/// A syntax error with its source position.
#[derive(Debug, Clone, Error)]
#[error("SyntaxError: {message} (line {line}, column {column})")]
pub struct ParseError {
    /// What went wrong
    pub message: String,
    /// 1-based line
    pub line: u32,
    /// 0-based column
    pub column: u32,
}

/// Result type for parsing operations.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Parse a full program from source text.
pub fn parse(source: &str) -> Result<stoat_ast::Program> {
    Parser::new(source)?.parse_program()
}
