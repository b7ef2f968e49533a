//! Expression parsing (precedence climbing)

use stoat_ast::{
    BinaryOp, Expression, LogicalOp, MemberProperty, ObjectProperty, ObjectPropertyKind,
    PropertyName, UnaryOp, UpdateOp,
};

use super::Parser;
use crate::token::TokenKind;
use crate::Result;

impl Parser {
    pub(crate) fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_assignment_expression()
    }

    pub(crate) fn parse_assignment_expression(&mut self) -> Result<Expression> {
        let left = self.parse_conditional_expression()?;

        let op = match self.peek() {
            TokenKind::Assign => None,
            TokenKind::PlusAssign => Some(BinaryOp::Add),
            TokenKind::MinusAssign => Some(BinaryOp::Sub),
            TokenKind::StarAssign => Some(BinaryOp::Mul),
            TokenKind::SlashAssign => Some(BinaryOp::Div),
            TokenKind::PercentAssign => Some(BinaryOp::Mod),
            _ => return Ok(left),
        };
        self.advance();

        if !matches!(left, Expression::Identifier(_) | Expression::Member { .. }) {
            return Err(self.error("invalid assignment target"));
        }

        let value = self.parse_assignment_expression()?;
        Ok(Expression::Assign {
            op,
            target: Box::new(left),
            value: Box::new(value),
        })
    }

    fn parse_conditional_expression(&mut self) -> Result<Expression> {
        let test = self.parse_logical_or()?;
        if self.eat(&TokenKind::Question) {
            let consequent = self.parse_assignment_expression()?;
            self.expect(&TokenKind::Colon)?;
            let alternate = self.parse_assignment_expression()?;
            Ok(Expression::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            })
        } else {
            Ok(test)
        }
    }

    fn parse_logical_or(&mut self) -> Result<Expression> {
        let mut left = self.parse_logical_and()?;
        while self.eat(&TokenKind::OrOr) {
            let right = self.parse_logical_and()?;
            left = Expression::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_equality()?;
        while self.eat(&TokenKind::AndAnd) {
            let right = self.parse_equality()?;
            left = Expression::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                TokenKind::EqEqEq => BinaryOp::StrictEq,
                TokenKind::NotEqEq => BinaryOp::StrictNotEq,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expression> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                TokenKind::Instanceof => BinaryOp::InstanceOf,
                TokenKind::In => BinaryOp::In,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expression> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let op = match self.peek() {
            TokenKind::Minus => Some(UnaryOp::Minus),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Typeof => Some(UnaryOp::TypeOf),
            TokenKind::Void => Some(UnaryOp::Void),
            TokenKind::Delete => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expression::Unary {
                op,
                operand: Box::new(operand),
            });
        }

        let update = match self.peek() {
            TokenKind::PlusPlus => Some(UpdateOp::Increment),
            TokenKind::MinusMinus => Some(UpdateOp::Decrement),
            _ => None,
        };
        if let Some(op) = update {
            self.advance();
            let target = self.parse_unary()?;
            if !matches!(target, Expression::Identifier(_) | Expression::Member { .. }) {
                return Err(self.error("invalid increment/decrement target"));
            }
            return Ok(Expression::Update {
                op,
                prefix: true,
                target: Box::new(target),
            });
        }

        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expression> {
        let expr = self.parse_left_hand_side(true)?;

        // No line break is allowed before a postfix operator.
        if self.current_token().had_line_break_before {
            return Ok(expr);
        }
        let op = match self.peek() {
            TokenKind::PlusPlus => UpdateOp::Increment,
            TokenKind::MinusMinus => UpdateOp::Decrement,
            _ => return Ok(expr),
        };
        if !matches!(expr, Expression::Identifier(_) | Expression::Member { .. }) {
            return Err(self.error("invalid increment/decrement target"));
        }
        self.advance();
        Ok(Expression::Update {
            op,
            prefix: false,
            target: Box::new(expr),
        })
    }

    fn parse_left_hand_side(&mut self, allow_call: bool) -> Result<Expression> {
        let mut expr = if self.at(&TokenKind::New) {
            self.parse_new_expression()?
        } else {
            self.parse_primary()?
        };

        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.parse_member_name()?;
                    expr = Expression::Member {
                        object: Box::new(expr),
                        property: MemberProperty::Dot(name),
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(&TokenKind::RBracket)?;
                    expr = Expression::Member {
                        object: Box::new(expr),
                        property: MemberProperty::Computed(Box::new(index)),
                    };
                }
                TokenKind::LParen if allow_call => {
                    let args = self.parse_arguments()?;
                    expr = Expression::Call {
                        callee: Box::new(expr),
                        args,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_new_expression(&mut self) -> Result<Expression> {
        self.expect(&TokenKind::New)?;
        // `new new C()()` nests; arguments bind to the innermost `new`.
        let callee = if self.at(&TokenKind::New) {
            self.parse_new_expression()?
        } else {
            self.parse_left_hand_side(false)?
        };
        let args = if self.at(&TokenKind::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expression::New {
            callee: Box::new(callee),
            args,
        })
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expression>> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.at(&TokenKind::RParen) {
            loop {
                args.push(self.parse_assignment_expression()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(args)
    }

    /// Member names after `.` may be identifiers or reserved words.
    fn parse_member_name(&mut self) -> Result<String> {
        match self.peek().clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            other => {
                if let Some(name) = keyword_name(&other) {
                    self.advance();
                    Ok(name.to_string())
                } else {
                    Err(self.error(format!("expected property name, got {other:?}")))
                }
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let expr = match self.peek().clone() {
            TokenKind::Number(n) => {
                self.advance();
                Expression::Number(n)
            }
            TokenKind::String(s) => {
                self.advance();
                Expression::String(s)
            }
            TokenKind::True => {
                self.advance();
                Expression::Boolean(true)
            }
            TokenKind::False => {
                self.advance();
                Expression::Boolean(false)
            }
            TokenKind::Null => {
                self.advance();
                Expression::Null
            }
            TokenKind::This => {
                self.advance();
                Expression::This
            }
            TokenKind::Identifier(name) => {
                self.advance();
                Expression::Identifier(name)
            }
            TokenKind::Function => {
                self.advance();
                let name = if let TokenKind::Identifier(n) = self.peek() {
                    let n = n.clone();
                    self.advance();
                    Some(n)
                } else {
                    None
                };
                let function = self.parse_function_rest(name)?;
                Expression::Function(Box::new(function))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RParen)?;
                inner
            }
            TokenKind::LBracket => self.parse_array_literal()?,
            TokenKind::LBrace => self.parse_object_literal()?,
            other => return Err(self.error(format!("unexpected token {other:?}"))),
        };
        Ok(expr)
    }

    fn parse_array_literal(&mut self) -> Result<Expression> {
        self.expect(&TokenKind::LBracket)?;
        let mut elements = Vec::new();
        while !self.at(&TokenKind::RBracket) {
            elements.push(self.parse_assignment_expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBracket)?;
        Ok(Expression::Array(elements))
    }

    fn parse_object_literal(&mut self) -> Result<Expression> {
        self.expect(&TokenKind::LBrace)?;
        let mut properties = Vec::new();
        while !self.at(&TokenKind::RBrace) {
            properties.push(self.parse_object_property()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(Expression::Object(properties))
    }

    fn parse_object_property(&mut self) -> Result<ObjectProperty> {
        // `get name() {}` / `set name(v) {}` accessors; `get`/`set` remain
        // usable as plain property names when followed by `:`.
        if let TokenKind::Identifier(word) = self.peek() {
            let is_accessor = (word == "get" || word == "set")
                && !matches!(self.peek_at(1), TokenKind::Colon | TokenKind::Comma | TokenKind::RBrace | TokenKind::LParen);
            if is_accessor {
                let is_get = word == "get";
                self.advance();
                let name = self.parse_property_name()?;
                let function = self.parse_function_rest(None)?;
                let kind = if is_get {
                    if !function.params.is_empty() {
                        return Err(self.error("getter must have no parameters"));
                    }
                    ObjectPropertyKind::Get(function)
                } else {
                    if function.params.len() != 1 {
                        return Err(self.error("setter must have exactly one parameter"));
                    }
                    ObjectPropertyKind::Set(function)
                };
                return Ok(ObjectProperty { name, kind });
            }
        }

        let name = self.parse_property_name()?;
        self.expect(&TokenKind::Colon)?;
        let value = self.parse_assignment_expression()?;
        Ok(ObjectProperty {
            name,
            kind: ObjectPropertyKind::Init(value),
        })
    }

    fn parse_property_name(&mut self) -> Result<PropertyName> {
        let name = match self.peek().clone() {
            TokenKind::Identifier(s) => PropertyName::Identifier(s),
            TokenKind::String(s) => PropertyName::String(s),
            TokenKind::Number(n) => PropertyName::Number(n),
            other => {
                if let Some(word) = keyword_name(&other) {
                    PropertyName::Identifier(word.to_string())
                } else {
                    return Err(self.error(format!("expected property name, got {other:?}")));
                }
            }
        };
        self.advance();
        Ok(name)
    }
}

/// The identifier spelling of a keyword token, for positions where reserved
/// words are valid property names.
fn keyword_name(kind: &TokenKind) -> Option<&'static str> {
    let name = match kind {
        TokenKind::Var => "var",
        TokenKind::Function => "function",
        TokenKind::Return => "return",
        TokenKind::If => "if",
        TokenKind::Else => "else",
        TokenKind::While => "while",
        TokenKind::Do => "do",
        TokenKind::For => "for",
        TokenKind::Break => "break",
        TokenKind::Continue => "continue",
        TokenKind::Throw => "throw",
        TokenKind::Try => "try",
        TokenKind::Catch => "catch",
        TokenKind::Finally => "finally",
        TokenKind::New => "new",
        TokenKind::Delete => "delete",
        TokenKind::Typeof => "typeof",
        TokenKind::Void => "void",
        TokenKind::In => "in",
        TokenKind::Instanceof => "instanceof",
        TokenKind::This => "this",
        TokenKind::True => "true",
        TokenKind::False => "false",
        TokenKind::Null => "null",
        _ => return None,
    };
    Some(name)
}
