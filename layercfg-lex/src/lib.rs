//! layercfg-lex - UTF-8 decoding and tokenization.
//!
//! Pipeline: [`decoder::Decoder`] turns bytes into Unicode scalar values via
//! the Hoehrmann DFA; [`cursor::Cursor`] layers line/column tracking and
//! one-character push-back on top of that; [`lexer::Lexer`] drives the
//! cursor to produce the [`token::Token`] stream the parser consumes.

pub mod cursor;
pub mod decoder;
mod lexer;
pub mod token;
pub mod unicode;

pub use cursor::Cursor;
pub use decoder::Decoder;
pub use lexer::Lexer;
pub use token::{Token, TokenKind, TokenValue};
