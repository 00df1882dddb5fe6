//! layercfg-util - Shared foundation types for the layercfg crates.
//!
//! This crate has no dependency on the tokenizer, parser, or evaluator; it
//! only defines the types every other crate in the workspace needs to talk
//! about source positions and report errors: [`Location`] and the error
//! enums in [`error`].

mod error;
mod position;

pub use error::{
    ConfigError, DecoderError, Error, ParserError, Result, TokenizerError,
};
pub use position::Location;
