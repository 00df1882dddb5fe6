//! Word scanning: identifiers and the fixed keyword set
//! (`true`, `false`, `null`, `is`, `in`, `not`, `and`, `or`).

use super::scanner::Lexer;
use crate::token::{Token, TokenKind, TokenValue};
use crate::unicode::is_ident_continue;
use layercfg_util::{Location, Result};

impl<'a> Lexer<'a> {
    pub(crate) fn scan_word(&mut self, start: Location) -> Result<Token> {
        let mut text = String::new();
        loop {
            let (ch, loc) = self.bump()?;
            if is_ident_continue(ch) {
                text.push(ch);
                continue;
            }
            self.push_back(ch, loc);
            break;
        }

        let end = self.cursor.location();
        let kind = match text.as_str() {
            "true" => TokenKind::TrueToken,
            "false" => TokenKind::FalseToken,
            "null" => TokenKind::NoneToken,
            "is" => TokenKind::Is,
            "in" => TokenKind::In,
            "not" => TokenKind::Not,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            _ => TokenKind::Word,
        };

        let value = match kind {
            TokenKind::TrueToken => TokenValue::Bool(true),
            TokenKind::FalseToken => TokenValue::Bool(false),
            _ => TokenValue::Text(text.clone()),
        };

        Ok(Token::new(kind, text, value, start, end))
    }
}
