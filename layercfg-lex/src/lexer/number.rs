//! Number scanning: integers (decimal, legacy octal, and `0x`/`0o`/`0b`
//! radix forms), floats, and the trailing `j`/`J` complex suffix.
//!
//! Underscores may separate digit groups but may not lead, trail, or
//! double up; `consume_digit_run` enforces that uniformly for every radix.

use super::scanner::Lexer;
use crate::token::{Token, TokenKind, TokenValue};
use crate::unicode::is_digit_in_base;
use layercfg_util::{Location, Result, TokenizerError};

impl<'a> Lexer<'a> {
    pub(crate) fn scan_number(&mut self, sign: Option<char>, start: Location) -> Result<Token> {
        let mut text = String::new();
        if let Some(s) = sign {
            text.push(s);
        }

        let (ch, loc) = self.bump()?;
        if ch == '0' {
            let (next_ch, next_loc) = self.bump()?;
            match next_ch {
                'x' | 'X' => return self.finish_radix_integer(text + "0x", 16, start),
                'o' | 'O' => return self.finish_radix_integer(text + "0o", 8, start),
                'b' | 'B' => return self.finish_radix_integer(text + "0b", 2, start),
                _ => {
                    self.push_back(next_ch, next_loc);
                    text.push('0');
                    return self.finish_decimal_number(text, true, start);
                }
            }
        }
        self.push_back(ch, loc);
        self.finish_decimal_number(text, false, start)
    }

    fn consume_digit_run(&mut self, is_digit: impl Fn(char) -> bool) -> Result<String> {
        let mut raw = String::new();
        let mut last_underscore_loc: Option<Location> = None;
        loop {
            let (ch, loc) = self.bump()?;
            if ch == '_' {
                if raw.is_empty() || raw.ends_with('_') {
                    return Err(TokenizerError::InvalidUnderscoreInNumber {
                        text: raw.clone(),
                        at: loc,
                    }
                    .into());
                }
                raw.push(ch);
                last_underscore_loc = Some(loc);
                continue;
            }
            last_underscore_loc = None;
            if is_digit(ch) {
                raw.push(ch);
                continue;
            }
            self.push_back(ch, loc);
            break;
        }
        if let Some(loc) = last_underscore_loc {
            return Err(TokenizerError::TrailingUnderscoreInNumber { text: raw.clone(), at: loc }.into());
        }
        Ok(raw)
    }

    fn finish_radix_integer(&mut self, mut text: String, radix: u32, start: Location) -> Result<Token> {
        let digits = self.consume_digit_run(move |c| is_digit_in_base(c, radix))?;
        text.push_str(&digits);
        let clean: String = digits.chars().filter(|c| *c != '_').collect();
        if clean.is_empty() {
            let (ch, loc) = self.bump()?;
            self.push_back(ch, loc);
            return Err(TokenizerError::InvalidCharacterInNumber { ch, at: loc }.into());
        }
        let magnitude = i64::from_str_radix(&clean, radix).unwrap_or(i64::MAX);
        let value = if text.starts_with('-') { -magnitude } else { magnitude };
        let end = self.cursor.location();
        Ok(Token::new(TokenKind::IntegerNumber, text, TokenValue::Integer(value), start, end))
    }

    fn finish_decimal_number(&mut self, mut text: String, had_leading_zero: bool, start: Location) -> Result<Token> {
        let int_digits = self.consume_digit_run(|c| c.is_ascii_digit())?;
        text.push_str(&int_digits);

        let mut is_float = false;

        let (dot_ch, dot_loc) = self.bump()?;
        if dot_ch == '.' {
            let (after_dot, after_loc) = self.bump()?;
            if after_dot.is_ascii_digit() {
                is_float = true;
                text.push('.');
                self.push_back(after_dot, after_loc);
                let frac_digits = self.consume_digit_run(|c| c.is_ascii_digit())?;
                text.push_str(&frac_digits);
            } else {
                self.push_back(after_dot, after_loc);
                self.push_back(dot_ch, dot_loc);
            }
        } else {
            self.push_back(dot_ch, dot_loc);
        }

        let (exp_ch, exp_loc) = self.bump()?;
        if exp_ch == 'e' || exp_ch == 'E' {
            is_float = true;
            let mut exp_text = String::new();
            exp_text.push(exp_ch);
            let (sign_ch, sign_loc) = self.bump()?;
            if sign_ch == '+' || sign_ch == '-' {
                exp_text.push(sign_ch);
            } else {
                self.push_back(sign_ch, sign_loc);
            }
            let exp_digits = self.consume_digit_run(|c| c.is_ascii_digit())?;
            if exp_digits.is_empty() {
                let (bad_ch, bad_loc) = self.bump()?;
                self.push_back(bad_ch, bad_loc);
                return Err(TokenizerError::InvalidCharacterInNumber { ch: bad_ch, at: bad_loc }.into());
            }
            exp_text.push_str(&exp_digits);
            text.push_str(&exp_text);
        } else {
            self.push_back(exp_ch, exp_loc);
        }

        let (suffix_ch, suffix_loc) = self.bump()?;
        let is_complex = suffix_ch == 'j' || suffix_ch == 'J';
        if !is_complex {
            self.push_back(suffix_ch, suffix_loc);
        }

        let clean: String = text.chars().filter(|c| *c != '_').collect();
        let end = self.cursor.location();

        if is_complex {
            let magnitude: f64 = clean.parse().unwrap_or(0.0);
            let mut full_text = text;
            full_text.push(suffix_ch);
            return Ok(Token::new(
                TokenKind::Complex,
                full_text,
                TokenValue::Complex(0.0, magnitude),
                start,
                end,
            ));
        }

        if is_float {
            let value: f64 = clean.parse().unwrap_or(0.0);
            return Ok(Token::new(TokenKind::FloatNumber, text, TokenValue::Float(value), start, end));
        }

        if had_leading_zero && !int_digits.is_empty() {
            let octal_digits: String = int_digits.chars().filter(|c| *c != '_').collect();
            if octal_digits.bytes().any(|b| b == b'8' || b == b'9') {
                return Err(TokenizerError::BadlyFormedOctalConstant { text: clean, at: start }.into());
            }
            let magnitude = i64::from_str_radix(&octal_digits, 8).unwrap_or(i64::MAX);
            let value = if clean.starts_with('-') { -magnitude } else { magnitude };
            return Ok(Token::new(TokenKind::IntegerNumber, text, TokenValue::Integer(value), start, end));
        }

        let digits_for_parse = clean.trim_start_matches('-');
        let magnitude: i64 = digits_for_parse.parse().unwrap_or(i64::MAX);
        let value = if clean.starts_with('-') { -magnitude } else { magnitude };
        Ok(Token::new(TokenKind::IntegerNumber, text, TokenValue::Integer(value), start, end))
    }
}
