//! The `Lexer` driver: character-level helpers and the main `next_token`
//! dispatch. The actual scanning routines for each token family live in the
//! sibling `number`, `string`, `identifier` and `operator` modules as `impl
//! Lexer` blocks, matching the token text, location and value they produce.

use crate::cursor::{Cursor, EOF};
use crate::token::{Token, TokenKind, TokenValue};
use layercfg_util::{Location, Result, TokenizerError};

pub struct Lexer<'a> {
    pub(crate) cursor: Cursor<'a>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    /// Consumes and returns the next character and the location it started at.
    pub(crate) fn bump(&mut self) -> Result<(char, Location)> {
        Ok(self.cursor.get_char()?)
    }

    /// Returns the next character without consuming it.
    pub(crate) fn peek(&mut self) -> Result<char> {
        let (ch, loc) = self.bump()?;
        self.cursor.push_back(ch, loc);
        Ok(ch)
    }

    pub(crate) fn push_back(&mut self, ch: char, at: Location) {
        self.cursor.push_back(ch, at);
    }

    /// Scans and returns the next token, skipping whitespace and comments.
    ///
    /// Newlines are significant (they terminate a mapping/list entry) and
    /// are returned as their own `Newline` token rather than swallowed with
    /// the rest of the whitespace.
    pub fn next_token(&mut self) -> Result<Token> {
        loop {
            let (ch, start) = self.bump()?;
            match ch {
                EOF => return Ok(Token::new(TokenKind::Eof, String::new(), TokenValue::None, start, start)),
                ' ' | '\t' | '\x0c' => continue,
                '\r' => {
                    // Bare CR, or the CR of a CRLF pair: both normalize to one Newline.
                    if self.peek()? == '\n' {
                        self.bump()?;
                    }
                    let end = self.cursor.location();
                    return Ok(Token::new(TokenKind::Newline, "\n".into(), TokenValue::None, start, end));
                }
                '\n' => {
                    let end = self.cursor.location();
                    return Ok(Token::new(TokenKind::Newline, "\n".into(), TokenValue::None, start, end));
                }
                '#' => {
                    self.skip_comment()?;
                    continue;
                }
                '\\' => {
                    // Line continuation: backslash immediately followed by a
                    // newline is swallowed along with the newline itself.
                    let (next, next_loc) = self.bump()?;
                    if next == '\r' || next == '\n' {
                        if next == '\r' && self.peek()? == '\n' {
                            self.bump()?;
                        }
                        continue;
                    }
                    self.push_back(next, next_loc);
                    return Err(TokenizerError::UnexpectedCharacter { ch, at: start }.into());
                }
                c if c.is_ascii_digit() => {
                    self.push_back(c, start);
                    return self.scan_number(None, start);
                }
                '.' => {
                    let next = self.peek()?;
                    if next.is_ascii_digit() {
                        self.push_back('.', start);
                        return self.scan_number(None, start);
                    }
                    let end = self.cursor.location();
                    return Ok(Token::new(TokenKind::Dot, ".".into(), TokenValue::None, start, end));
                }
                '-' | '+' => {
                    let next = self.peek()?;
                    if next.is_ascii_digit() || next == '.' {
                        return self.scan_number(Some(ch), start);
                    }
                    let end = self.cursor.location();
                    let kind = if ch == '-' { TokenKind::Minus } else { TokenKind::Plus };
                    return Ok(Token::new(kind, ch.to_string(), TokenValue::None, start, end));
                }
                '\'' | '"' => {
                    self.push_back(ch, start);
                    return self.scan_string(start);
                }
                '`' => return self.scan_back_tick(start),
                c if unicode_ident_start(c) => {
                    self.push_back(c, start);
                    return self.scan_word(start);
                }
                _ => {
                    self.push_back(ch, start);
                    return self.scan_operator(start);
                }
            }
        }
    }

    fn skip_comment(&mut self) -> Result<()> {
        loop {
            let (ch, loc) = self.bump()?;
            match ch {
                EOF => {
                    self.push_back(ch, loc);
                    return Ok(());
                }
                '\n' => {
                    self.push_back(ch, loc);
                    return Ok(());
                }
                '\r' => {
                    self.push_back(ch, loc);
                    return Ok(());
                }
                _ => continue,
            }
        }
    }
}

fn unicode_ident_start(c: char) -> bool {
    crate::unicode::is_ident_start(c)
}
