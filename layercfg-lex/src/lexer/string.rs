//! Quoted-string and back-tick literal scanning, plus shared escape decoding
//! (`\n`, `\xHH`, `\uHHHH`, `\UHHHHHHHH`, ...).

use super::scanner::Lexer;
use crate::cursor::EOF;
use crate::token::{Token, TokenKind, TokenValue};
use crate::unicode::{is_valid_scalar, parse_hex_codepoint};
use layercfg_util::{Location, Result, TokenizerError};

impl<'a> Lexer<'a> {
    pub(crate) fn scan_string(&mut self, start: Location) -> Result<Token> {
        let (quote, _) = self.bump()?;

        let (c1, l1) = self.bump()?;
        let (c2, l2) = self.bump()?;
        let triple = c1 == quote && c2 == quote;
        if !triple {
            self.push_back(c2, l2);
            self.push_back(c1, l1);
        }

        let mut raw = String::new();
        let mut escaped = false;

        if triple {
            loop {
                let (ch, loc) = self.bump()?;
                if ch == EOF {
                    self.push_back(ch, loc);
                    return Err(TokenizerError::UnterminatedString { text: raw, at: start }.into());
                }
                if !escaped && ch == quote {
                    // Closing requires three consecutive, unescaped quotes.
                    let (q2, q2loc) = self.bump()?;
                    if q2 == quote {
                        let (q3, q3loc) = self.bump()?;
                        if q3 == quote {
                            break;
                        }
                        self.push_back(q3, q3loc);
                        raw.push(ch);
                        raw.push(q2);
                        escaped = false;
                        continue;
                    }
                    self.push_back(q2, q2loc);
                    raw.push(ch);
                    escaped = false;
                    continue;
                }
                escaped = !escaped && ch == '\\';
                raw.push(ch);
            }
        } else {
            loop {
                let (ch, loc) = self.bump()?;
                if ch == EOF || (!escaped && (ch == '\n' || ch == '\r')) {
                    self.push_back(ch, loc);
                    return Err(TokenizerError::UnterminatedString { text: raw, at: start }.into());
                }
                if !escaped && ch == quote {
                    break;
                }
                escaped = !escaped && ch == '\\';
                raw.push(ch);
            }
        }

        let decoded = decode_escapes(&raw, start)?;
        let end = self.cursor.location();
        let mut text = String::new();
        text.push(quote);
        text.push_str(&raw);
        text.push(quote);
        Ok(Token::new(TokenKind::StringToken, text, TokenValue::Text(decoded), start, end))
    }

    pub(crate) fn scan_back_tick(&mut self, start: Location) -> Result<Token> {
        let mut raw = String::new();
        loop {
            let (ch, loc) = self.bump()?;
            if ch == EOF || ch == '\n' || ch == '\r' {
                self.push_back(ch, loc);
                return Err(TokenizerError::UnterminatedBackTick { text: raw, at: start }.into());
            }
            if ch == '`' {
                break;
            }
            raw.push(ch);
        }
        let decoded = decode_escapes(&raw, start)?;
        let end = self.cursor.location();
        let mut text = String::from("`");
        text.push_str(&raw);
        text.push('`');
        Ok(Token::new(TokenKind::BackTick, text, TokenValue::Text(decoded), start, end))
    }
}

/// Decodes the escape sequences in a literal's raw (still-escaped) content.
fn decode_escapes(raw: &str, at: Location) -> Result<String> {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        if ch != '\\' {
            out.push(ch);
            i += 1;
            continue;
        }

        let err = || TokenizerError::InvalidEscapeSequence {
            text: raw.to_string(),
            at,
        };

        let Some(&next) = chars.get(i + 1) else {
            return Err(err().into());
        };

        match next {
            'a' => {
                out.push('\u{07}');
                i += 2;
            }
            'b' => {
                out.push('\u{08}');
                i += 2;
            }
            'f' => {
                out.push('\u{0c}');
                i += 2;
            }
            'n' => {
                out.push('\n');
                i += 2;
            }
            'r' => {
                out.push('\r');
                i += 2;
            }
            't' => {
                out.push('\t');
                i += 2;
            }
            'v' => {
                out.push('\u{0b}');
                i += 2;
            }
            '\\' => {
                out.push('\\');
                i += 2;
            }
            '\'' => {
                out.push('\'');
                i += 2;
            }
            '"' => {
                out.push('"');
                i += 2;
            }
            '\n' => {
                i += 2;
            }
            '\r' => {
                i += 2;
                if chars.get(i) == Some(&'\n') {
                    i += 1;
                }
            }
            'x' => {
                let hex: String = chars.get(i + 2..i + 4).map(|s| s.iter().collect()).ok_or_else(err)?;
                let codepoint = parse_hex_codepoint(&hex).ok_or_else(err)?;
                out.push(scalar_or_err(codepoint, err)?);
                i += 4;
            }
            'u' => {
                let hex: String = chars.get(i + 2..i + 6).map(|s| s.iter().collect()).ok_or_else(err)?;
                let codepoint = parse_hex_codepoint(&hex).ok_or_else(err)?;
                out.push(scalar_or_err(codepoint, err)?);
                i += 6;
            }
            'U' => {
                let hex: String = chars.get(i + 2..i + 10).map(|s| s.iter().collect()).ok_or_else(err)?;
                let codepoint = parse_hex_codepoint(&hex).ok_or_else(err)?;
                out.push(scalar_or_err(codepoint, err)?);
                i += 10;
            }
            _ => return Err(err().into()),
        }
    }
    Ok(out)
}

fn scalar_or_err(codepoint: u32, err: impl Fn() -> TokenizerError) -> Result<char> {
    if !is_valid_scalar(codepoint) {
        return Err(err().into());
    }
    char::from_u32(codepoint).ok_or_else(|| err().into())
}
