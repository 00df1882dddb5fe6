//! Punctuation and operator scanning: single-character tokens plus the
//! multi-character extensions (`==`, `!=`, `<=`, `>=`, `<<`, `>>`, `<>`,
//! `**`, `//`, `&&`, `||`).
//!
//! `-`, `+` and a leading `.` are handled directly by the main dispatch in
//! `core`, since they may also begin a number.

use super::scanner::Lexer;
use crate::token::{Token, TokenKind, TokenValue};
use layercfg_util::{Location, Result, TokenizerError};

impl<'a> Lexer<'a> {
    pub(crate) fn scan_operator(&mut self, start: Location) -> Result<Token> {
        let (ch, _) = self.bump()?;

        macro_rules! single {
            ($kind:expr) => {{
                let end = self.cursor.location();
                return Ok(Token::new($kind, ch.to_string(), TokenValue::None, start, end));
            }};
        }

        macro_rules! maybe_two {
            ($second:expr, $two_kind:expr, $one_kind:expr) => {{
                let (next, next_loc) = self.bump()?;
                if next == $second {
                    let end = self.cursor.location();
                    let mut text = ch.to_string();
                    text.push(next);
                    return Ok(Token::new($two_kind, text, TokenValue::None, start, end));
                }
                self.push_back(next, next_loc);
                let end = self.cursor.location();
                return Ok(Token::new($one_kind, ch.to_string(), TokenValue::None, start, end));
            }};
        }

        match ch {
            ':' => single!(TokenKind::Colon),
            ',' => single!(TokenKind::Comma),
            '{' => single!(TokenKind::LeftCurly),
            '}' => single!(TokenKind::RightCurly),
            '[' => single!(TokenKind::LeftBracket),
            ']' => single!(TokenKind::RightBracket),
            '(' => single!(TokenKind::LeftParenthesis),
            ')' => single!(TokenKind::RightParenthesis),
            '@' => single!(TokenKind::At),
            '$' => single!(TokenKind::Dollar),
            '~' => single!(TokenKind::BitwiseComplement),
            '^' => single!(TokenKind::BitwiseXor),
            '%' => single!(TokenKind::Modulo),
            '*' => maybe_two!('*', TokenKind::Power, TokenKind::Star),
            '/' => maybe_two!('/', TokenKind::FloorDiv, TokenKind::Slash),
            '=' => maybe_two!('=', TokenKind::EqEq, TokenKind::Assign),
            '!' => maybe_two!('=', TokenKind::NotEq, TokenKind::BangNot),
            '&' => maybe_two!('&', TokenKind::AndAnd, TokenKind::BitwiseAnd),
            '|' => maybe_two!('|', TokenKind::OrOr, TokenKind::BitwiseOr),
            '<' => {
                let (next, next_loc) = self.bump()?;
                match next {
                    '=' => single_two(self, ch, next, TokenKind::LessEq, start),
                    '<' => single_two(self, ch, next, TokenKind::LeftShift, start),
                    '>' => single_two(self, ch, next, TokenKind::LessGreater, start),
                    _ => {
                        self.push_back(next, next_loc);
                        let end = self.cursor.location();
                        Ok(Token::new(TokenKind::LessThan, ch.to_string(), TokenValue::None, start, end))
                    }
                }
            }
            '>' => {
                let (next, next_loc) = self.bump()?;
                match next {
                    '=' => single_two(self, ch, next, TokenKind::GreaterEq, start),
                    '>' => single_two(self, ch, next, TokenKind::RightShift, start),
                    _ => {
                        self.push_back(next, next_loc);
                        let end = self.cursor.location();
                        Ok(Token::new(TokenKind::GreaterThan, ch.to_string(), TokenValue::None, start, end))
                    }
                }
            }
            _ => Err(TokenizerError::UnexpectedCharacter { ch, at: start }.into()),
        }
    }
}

fn single_two(lexer: &mut Lexer<'_>, first: char, second: char, kind: TokenKind, start: Location) -> Result<Token> {
    let end = lexer.cursor.location();
    let mut text = first.to_string();
    text.push(second);
    Ok(Token::new(kind, text, TokenValue::None, start, end))
}
