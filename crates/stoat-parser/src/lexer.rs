//! Character-level scanner
//!
//! Tracks line/column positions and whether a line terminator preceded each
//! token, which the parser needs for automatic semicolon insertion.

use stoat_ast::Span;

use crate::token::{Token, TokenKind};
use crate::{ParseError, Result};

pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    had_line_break: bool,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 0,
            had_line_break: false,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek_char(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
            self.had_line_break = true;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            line: self.line,
            column: self.column,
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<()> {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_char_at(1) == Some('/') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek_char_at(1) == Some('*') => {
                    self.advance();
                    self.advance();
                    loop {
                        match self.peek_char() {
                            Some('*') if self.peek_char_at(1) == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(_) => {
                                self.advance();
                            }
                            None => return Err(self.error("unterminated block comment")),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments()?;
        let had_line_break = std::mem::take(&mut self.had_line_break);
        let span = self.span();

        let Some(ch) = self.peek_char() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                span,
                had_line_break_before: had_line_break,
            });
        };

        let kind = if ch.is_ascii_digit() {
            self.scan_number()?
        } else if ch == '"' || ch == '\'' {
            self.scan_string(ch)?
        } else if ch == '_' || ch == '$' || ch.is_alphabetic() {
            self.scan_identifier()
        } else {
            self.scan_punctuator()?
        };

        Ok(Token {
            kind,
            span,
            had_line_break_before: had_line_break,
        })
    }

    fn scan_number(&mut self) -> Result<TokenKind> {
        let mut text = String::new();

        // Hex literal
        if self.peek_char() == Some('0')
            && matches!(self.peek_char_at(1), Some('x') | Some('X'))
        {
            self.advance();
            self.advance();
            while let Some(c) = self.peek_char() {
                if c.is_ascii_hexdigit() {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            if text.is_empty() {
                return Err(self.error("missing hexadecimal digits"));
            }
            let value = u64::from_str_radix(&text, 16)
                .map_err(|_| self.error("hexadecimal literal out of range"))?;
            return Ok(TokenKind::Number(value as f64));
        }

        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if self.peek_char() == Some('.')
            && self.peek_char_at(1).is_some_and(|c| c.is_ascii_digit())
        {
            text.push('.');
            self.advance();
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            text.push('e');
            self.advance();
            if matches!(self.peek_char(), Some('+') | Some('-')) {
                text.push(self.advance().unwrap());
            }
            let mut saw_digit = false;
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.advance();
                    saw_digit = true;
                } else {
                    break;
                }
            }
            if !saw_digit {
                return Err(self.error("missing exponent digits"));
            }
        }

        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| self.error(format!("invalid number literal '{text}'")))
    }

    fn scan_string(&mut self, quote: char) -> Result<TokenKind> {
        self.advance(); // opening quote
        let mut text = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => break,
                Some('\\') => match self.advance() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some('b') => text.push('\u{8}'),
                    Some('f') => text.push('\u{c}'),
                    Some('v') => text.push('\u{b}'),
                    Some('0') => text.push('\0'),
                    Some('x') => {
                        let hi = self.advance();
                        let lo = self.advance();
                        let (Some(hi), Some(lo)) = (hi, lo) else {
                            return Err(self.error("unterminated hex escape"));
                        };
                        let code = u32::from_str_radix(&format!("{hi}{lo}"), 16)
                            .map_err(|_| self.error("invalid hex escape"))?;
                        text.push(char::from_u32(code).unwrap_or('\u{fffd}'));
                    }
                    Some('u') => {
                        let mut digits = String::new();
                        for _ in 0..4 {
                            match self.advance() {
                                Some(c) => digits.push(c),
                                None => return Err(self.error("unterminated unicode escape")),
                            }
                        }
                        let code = u32::from_str_radix(&digits, 16)
                            .map_err(|_| self.error("invalid unicode escape"))?;
                        text.push(char::from_u32(code).unwrap_or('\u{fffd}'));
                    }
                    Some('\n') => {} // line continuation
                    Some(c) => text.push(c),
                    None => return Err(self.error("unterminated string literal")),
                },
                Some('\n') | None => return Err(self.error("unterminated string literal")),
                Some(c) => text.push(c),
            }
        }
        Ok(TokenKind::String(text))
    }

    fn scan_identifier(&mut self) -> TokenKind {
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            if c == '_' || c == '$' || c.is_alphanumeric() {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier(text))
    }

    fn scan_punctuator(&mut self) -> Result<TokenKind> {
        let ch = self.advance().expect("caller checked peek_char");
        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ':' => TokenKind::Colon,
            '?' => TokenKind::Question,
            '+' => match self.peek_char() {
                Some('+') => {
                    self.advance();
                    TokenKind::PlusPlus
                }
                Some('=') => {
                    self.advance();
                    TokenKind::PlusAssign
                }
                _ => TokenKind::Plus,
            },
            '-' => match self.peek_char() {
                Some('-') => {
                    self.advance();
                    TokenKind::MinusMinus
                }
                Some('=') => {
                    self.advance();
                    TokenKind::MinusAssign
                }
                _ => TokenKind::Minus,
            },
            '*' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::StarAssign
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::SlashAssign
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::PercentAssign
                } else {
                    TokenKind::Percent
                }
            }
            '=' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        TokenKind::EqEqEq
                    } else {
                        TokenKind::EqEq
                    }
                } else {
                    TokenKind::Assign
                }
            }
            '!' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    if self.peek_char() == Some('=') {
                        self.advance();
                        TokenKind::NotEqEq
                    } else {
                        TokenKind::NotEq
                    }
                } else {
                    TokenKind::Not
                }
            }
            '<' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.peek_char() == Some('&') {
                    self.advance();
                    TokenKind::AndAnd
                } else {
                    return Err(self.error("unexpected character '&'"));
                }
            }
            '|' => {
                if self.peek_char() == Some('|') {
                    self.advance();
                    TokenKind::OrOr
                } else {
                    return Err(self.error("unexpected character '|'"));
                }
            }
            other => return Err(self.error(format!("unexpected character '{other}'"))),
        };
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .expect("lexes")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_scan_basic_tokens() {
        assert_eq!(
            kinds("var x = 1;"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier("x".into()),
                TokenKind::Assign,
                TokenKind::Number(1.0),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_scan_numbers() {
        assert_eq!(kinds("3.25")[0], TokenKind::Number(3.25));
        assert_eq!(kinds("0x10")[0], TokenKind::Number(16.0));
        assert_eq!(kinds("1e3")[0], TokenKind::Number(1000.0));
    }

    #[test]
    fn test_scan_string_escapes() {
        assert_eq!(kinds("'a\\nb'")[0], TokenKind::String("a\nb".into()));
        assert_eq!(kinds("\"\\u0041\"")[0], TokenKind::String("A".into()));
    }

    #[test]
    fn test_line_break_tracking() {
        let tokens = Lexer::new("a\nb").tokenize().expect("lexes");
        assert!(!tokens[0].had_line_break_before);
        assert!(tokens[1].had_line_break_before);
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("1 // one\n/* two */ 2"),
            vec![TokenKind::Number(1.0), TokenKind::Number(2.0), TokenKind::Eof]
        );
    }

    #[test]
    fn test_unterminated_string_errors() {
        assert!(Lexer::new("'abc").tokenize().is_err());
    }
}
