//! Statement parsing

use stoat_ast::{
    FunctionLiteral, Statement, StatementKind, VarDeclarator,
};

use super::{Parser, has_use_strict_directive};
use crate::token::TokenKind;
use crate::Result;

impl Parser {
    pub(crate) fn parse_statement(&mut self) -> Result<Statement> {
        let span = self.span();
        let kind = match self.peek() {
            TokenKind::Var => self.parse_var_declaration()?,
            TokenKind::Function => self.parse_function_declaration()?,
            TokenKind::LBrace => StatementKind::Block(self.parse_block()?),
            TokenKind::If => self.parse_if()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::Do => self.parse_do_while()?,
            TokenKind::For => self.parse_for()?,
            TokenKind::Return => self.parse_return()?,
            TokenKind::Throw => self.parse_throw()?,
            TokenKind::Try => self.parse_try()?,
            TokenKind::Break => {
                self.advance();
                self.expect_semicolon()?;
                StatementKind::Break
            }
            TokenKind::Continue => {
                self.advance();
                self.expect_semicolon()?;
                StatementKind::Continue
            }
            TokenKind::Semicolon => {
                self.advance();
                StatementKind::Empty
            }
            _ => {
                let expression = self.parse_expression()?;
                self.expect_semicolon()?;
                StatementKind::Expression(expression)
            }
        };
        Ok(Statement { kind, span })
    }

    fn parse_var_declaration(&mut self) -> Result<StatementKind> {
        self.expect(&TokenKind::Var)?;
        let declarators = self.parse_var_declarators()?;
        self.expect_semicolon()?;
        Ok(StatementKind::VarDeclaration(declarators))
    }

    fn parse_var_declarators(&mut self) -> Result<Vec<VarDeclarator>> {
        let mut declarators = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            let init = if self.eat(&TokenKind::Assign) {
                Some(self.parse_assignment_expression()?)
            } else {
                None
            };
            declarators.push(VarDeclarator { name, init });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        Ok(declarators)
    }

    fn parse_function_declaration(&mut self) -> Result<StatementKind> {
        self.expect(&TokenKind::Function)?;
        let name = self.expect_identifier()?;
        let function = self.parse_function_rest(Some(name))?;
        Ok(StatementKind::FunctionDeclaration(function))
    }

    /// Parse `(params) { body }` after the `function` keyword and optional name.
    pub(crate) fn parse_function_rest(&mut self, name: Option<String>) -> Result<FunctionLiteral> {
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                params.push(self.expect_identifier()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;
        let body = self.parse_block()?;
        let strict = has_use_strict_directive(&body);
        Ok(FunctionLiteral {
            name,
            params,
            body,
            strict,
        })
    }

    pub(crate) fn parse_block(&mut self) -> Result<Vec<Statement>> {
        self.expect(&TokenKind::LBrace)?;
        let mut body = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            if self.at(&TokenKind::Eof) {
                return Err(self.error("unexpected end of input in block"));
            }
            body.push(self.parse_statement()?);
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(body)
    }

    fn parse_if(&mut self) -> Result<StatementKind> {
        self.expect(&TokenKind::If)?;
        self.expect(&TokenKind::LParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RParen)?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(StatementKind::If {
            test,
            consequent,
            alternate,
        })
    }

    fn parse_while(&mut self) -> Result<StatementKind> {
        self.expect(&TokenKind::While)?;
        self.expect(&TokenKind::LParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(StatementKind::While { test, body })
    }

    fn parse_do_while(&mut self) -> Result<StatementKind> {
        self.expect(&TokenKind::Do)?;
        let body = Box::new(self.parse_statement()?);
        self.expect(&TokenKind::While)?;
        self.expect(&TokenKind::LParen)?;
        let test = self.parse_expression()?;
        self.expect(&TokenKind::RParen)?;
        self.expect_semicolon()?;
        Ok(StatementKind::DoWhile { body, test })
    }

    fn parse_for(&mut self) -> Result<StatementKind> {
        self.expect(&TokenKind::For)?;
        self.expect(&TokenKind::LParen)?;

        let init = if self.eat(&TokenKind::Semicolon) {
            None
        } else if self.at(&TokenKind::Var) {
            let span = self.span();
            self.advance();
            let declarators = self.parse_var_declarators()?;
            self.expect(&TokenKind::Semicolon)?;
            Some(Box::new(Statement {
                kind: StatementKind::VarDeclaration(declarators),
                span,
            }))
        } else {
            let span = self.span();
            let expression = self.parse_expression()?;
            self.expect(&TokenKind::Semicolon)?;
            Some(Box::new(Statement {
                kind: StatementKind::Expression(expression),
                span,
            }))
        };

        let test = if self.at(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::Semicolon)?;

        let update = if self.at(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(&TokenKind::RParen)?;

        let body = Box::new(self.parse_statement()?);
        Ok(StatementKind::For {
            init,
            test,
            update,
            body,
        })
    }

    fn parse_return(&mut self) -> Result<StatementKind> {
        self.expect(&TokenKind::Return)?;
        // `return` with a line break before the argument returns undefined.
        let argument = if self.at(&TokenKind::Semicolon)
            || self.at(&TokenKind::RBrace)
            || self.at(&TokenKind::Eof)
            || self.current_token().had_line_break_before
        {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_semicolon()?;
        Ok(StatementKind::Return(argument))
    }

    fn parse_throw(&mut self) -> Result<StatementKind> {
        self.expect(&TokenKind::Throw)?;
        if self.current_token().had_line_break_before {
            return Err(self.error("illegal newline after throw"));
        }
        let argument = self.parse_expression()?;
        self.expect_semicolon()?;
        Ok(StatementKind::Throw(argument))
    }

    fn parse_try(&mut self) -> Result<StatementKind> {
        self.expect(&TokenKind::Try)?;
        let block = self.parse_block()?;

        let (param, handler) = if self.eat(&TokenKind::Catch) {
            self.expect(&TokenKind::LParen)?;
            let param = self.expect_identifier()?;
            self.expect(&TokenKind::RParen)?;
            (Some(param), Some(self.parse_block()?))
        } else {
            (None, None)
        };

        let finalizer = if self.eat(&TokenKind::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("missing catch or finally after try"));
        }

        Ok(StatementKind::Try {
            block,
            param,
            handler,
            finalizer,
        })
    }
}
