//! Core error types shared across the tokenizer, parser and evaluator.
//!
//! Each phase gets its own enum so a caller can match on where a failure
//! came from; [`Error`] unifies them behind the crate-wide [`Result`] alias
//! the public API returns.

use crate::Location;
use thiserror::Error;

/// Failures from decoding a byte stream as UTF-8.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecoderError {
    #[error("Invalid UTF-8 data: 0x{byte:02x} at 0x{position:x}")]
    InvalidByte { byte: u8, position: usize },

    #[error("Incomplete UTF-8 data")]
    Incomplete,
}

/// Failures from splitting a character stream into tokens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenizerError {
    #[error("invalid character in number: {ch}")]
    InvalidCharacterInNumber { ch: char, at: Location },

    #[error("invalid '_' in number: {text}")]
    InvalidUnderscoreInNumber { text: String, at: Location },

    #[error("invalid '_' at end of number: {text}")]
    TrailingUnderscoreInNumber { text: String, at: Location },

    #[error("badly formed octal constant: {text}")]
    BadlyFormedOctalConstant { text: String, at: Location },

    #[error("unterminated quoted string: {text}")]
    UnterminatedString { text: String, at: Location },

    #[error("unterminated back-tick literal: {text}")]
    UnterminatedBackTick { text: String, at: Location },

    #[error("invalid escape sequence in: {text}")]
    InvalidEscapeSequence { text: String, at: Location },

    #[error("unexpected character: {ch}")]
    UnexpectedCharacter { ch: char, at: Location },
}

impl TokenizerError {
    pub fn location(&self) -> Location {
        match self {
            TokenizerError::InvalidCharacterInNumber { at, .. }
            | TokenizerError::InvalidUnderscoreInNumber { at, .. }
            | TokenizerError::TrailingUnderscoreInNumber { at, .. }
            | TokenizerError::BadlyFormedOctalConstant { at, .. }
            | TokenizerError::UnterminatedString { at, .. }
            | TokenizerError::UnterminatedBackTick { at, .. }
            | TokenizerError::InvalidEscapeSequence { at, .. }
            | TokenizerError::UnexpectedCharacter { at, .. } => *at,
        }
    }
}

/// Failures from building an AST out of a token stream.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParserError {
    #[error("expected {expected} but got {found}")]
    ExpectedButGot {
        expected: String,
        found: String,
        at: Location,
    },

    #[error("expected Word but got EOF")]
    ExpectedWordButGotEof { at: Location },

    #[error("unexpected when looking for value: {found}")]
    UnexpectedLookingForValue { found: String, at: Location },

    #[error("unexpected type for key: {found}")]
    UnexpectedTypeForKey { found: String, at: Location },

    #[error("expected key-value separator, found {found}")]
    ExpectedKeyValueSeparator { found: String, at: Location },

    #[error("unexpected following value: {found}")]
    UnexpectedFollowingValue { found: String, at: Location },

    #[error("unexpected: {found}")]
    Unexpected { found: String, at: Location },

    #[error("unexpected token for container: {found}")]
    UnexpectedTokenForContainer { found: String, at: Location },

    #[error("invalid index at {at}: expected 1 expression, found {count}")]
    InvalidIndexArity { count: usize, at: Location },

    #[error("invalid path: {text}")]
    InvalidPath { text: String },
}

impl ParserError {
    pub fn location(&self) -> Option<Location> {
        match self {
            ParserError::InvalidPath { .. } => None,
            ParserError::ExpectedButGot { at, .. }
            | ParserError::ExpectedWordButGotEof { at }
            | ParserError::UnexpectedLookingForValue { at, .. }
            | ParserError::UnexpectedTypeForKey { at, .. }
            | ParserError::ExpectedKeyValueSeparator { at, .. }
            | ParserError::UnexpectedFollowingValue { at, .. }
            | ParserError::Unexpected { at, .. }
            | ParserError::UnexpectedTokenForContainer { at, .. }
            | ParserError::InvalidIndexArity { at, .. } => Some(*at),
        }
    }
}

/// Failures raised while evaluating a loaded configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("root configuration must be a mapping")]
    RootMustBeMapping,

    #[error("duplicate key {key} seen at {at} (previously at {previous})")]
    DuplicateKey {
        key: String,
        at: Location,
        previous: Location,
    },

    #[error("not found in configuration: {key}")]
    NotFound { key: String },

    #[error("unknown variable: {name}")]
    UnknownVariable { name: String },

    #[error("circular reference: {detail}")]
    CircularReference { detail: String },

    #[error("unable to locate {path}")]
    UnableToLocate { path: String },

    #[error("configuration cannot include itself: {path}")]
    SelfInclude { path: String },

    #[error("index out of range: is {index}, must be between 0 and {max}")]
    IndexOutOfRange { index: i64, max: i64 },

    #[error("invalid container for numeric index: {kind}")]
    InvalidContainerForIndex { kind: String },

    #[error("invalid container for slicing: {kind}")]
    InvalidContainerForSlicing { kind: String },

    #[error("step cannot be zero")]
    StepIsZero,

    #[error("step is not an integer, but {kind}")]
    StepNotInteger { kind: String },

    #[error("cannot {op} {lhs} {connector} {rhs}")]
    OperatorMismatch {
        op: String,
        lhs: String,
        connector: String,
        rhs: String,
    },

    #[error("unable to convert string: {text}")]
    UnableToConvertString { text: String },
}

/// The unified error type returned by the public API.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Decoder(#[from] DecoderError),

    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),

    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias; every fallible public operation returns this.
pub type Result<T> = std::result::Result<T, Error>;
