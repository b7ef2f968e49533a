//! Recursive-descent parser

mod expressions;
mod statements;

use stoat_ast::{Program, Span, Statement, StatementKind};

use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};
use crate::{ParseError, Result};

/// Parser over a pre-lexed token stream.
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
}

impl Parser {
    /// Lex `source` and position the parser at its first token.
    pub fn new(source: &str) -> Result<Self> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self { tokens, pos: 0 })
    }

    pub(crate) fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    pub(crate) fn peek_at(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    pub(crate) fn current_token(&self) -> &Token {
        &self.tokens[self.pos]
    }

    pub(crate) fn span(&self) -> Span {
        self.tokens[self.pos].span
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn at(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: &TokenKind) -> Result<Token> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!("expected {:?}, got {:?}", kind, self.peek())))
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<String> {
        match self.peek() {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(self.error(format!("expected identifier, got {other:?}"))),
        }
    }

    /// Restricted automatic semicolon insertion: an explicit `;`, a closing
    /// `}`, end of input, or a preceding line break all terminate a statement.
    pub(crate) fn expect_semicolon(&mut self) -> Result<()> {
        if self.eat(&TokenKind::Semicolon) {
            return Ok(());
        }
        if self.at(&TokenKind::RBrace) || self.at(&TokenKind::Eof) {
            return Ok(());
        }
        if self.current_token().had_line_break_before {
            return Ok(());
        }
        Err(self.error(format!("expected semicolon, got {:?}", self.peek())))
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> ParseError {
        let span = self.span();
        ParseError {
            message: message.into(),
            line: span.line,
            column: span.column,
        }
    }

    /// Parse a complete program.
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut body = Vec::new();
        while !self.at(&TokenKind::Eof) {
            body.push(self.parse_statement()?);
        }
        let strict = has_use_strict_directive(&body);
        Ok(Program { body, strict })
    }
}

/// Check a statement list for a leading `"use strict"` directive.
///
/// Directives are an uninterrupted prefix of string-literal expression
/// statements, per the spec's directive prologue.
pub(crate) fn has_use_strict_directive(body: &[Statement]) -> bool {
    for stmt in body {
        match &stmt.kind {
            StatementKind::Expression(stoat_ast::Expression::String(s)) => {
                if s == "use strict" {
                    return true;
                }
            }
            _ => break,
        }
    }
    false
}
