//! layercfg - hierarchical configuration loading
//!
//! A configuration source is a JSON superset: comments, trailing commas,
//! unquoted keys, triple-quoted strings, and a small expression grammar for
//! values (arithmetic, references, interpolation, file inclusion). Loading
//! goes through the same three stages as compiling a small language:
//!
//! - [`layercfg_lex`] turns UTF-8 source into a lazy token stream.
//! - [`parser`] is a recursive-descent parser over that stream, producing
//!   an AST ([`ast`]) without evaluating anything.
//! - [`config`] walks the AST lazily: a value is only evaluated, and a
//!   `$`-reference only followed, when something asks for it. This is what
//!   lets two mapping entries refer to each other regardless of which one
//!   appears first in the source.
//!
//! [`slice`] and [`backtick`] hold two self-contained pieces of that
//! evaluation: list slicing, and the three back-tick literal conversion
//! rules (ISO date-time, environment lookup, `${...}` interpolation).

mod ast;
mod backtick;
mod config;
mod parser;
mod slice;
mod value;

pub use backtick::{DefaultStringConverter, StringConverter};
pub use config::{Config, ConfigBuilder};
pub use parser::{is_identifier, parse_path, to_source, unpack_path, PathStep};
pub use value::{CfgDateTime, ConfigValue};

pub use layercfg_util::{ConfigError, DecoderError, Error, Location, ParserError, Result, TokenizerError};

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn loads_a_flat_mapping() {
        let mut cfg = Config::from_source("a: 1\nb: 2\n").unwrap();
        assert_eq!(cfg.get("a", None).unwrap().as_i64(), Some(1));
        assert_eq!(cfg.get("b", None).unwrap().as_i64(), Some(2));
    }

    #[test]
    fn missing_key_falls_back_to_default() {
        let mut cfg = Config::from_source("a: 1\n").unwrap();
        let value = cfg.get("missing", Some(ConfigValue::Integer(42))).unwrap();
        assert_eq!(value.as_i64(), Some(42));
    }

    #[test]
    fn dollar_reference_resolves_against_root() {
        let mut cfg = Config::from_source("a: 1\nb: ${a}\n").unwrap();
        assert_eq!(cfg.get("b", None).unwrap().as_i64(), Some(1));
    }

    #[test]
    fn rejects_duplicate_keys_by_default() {
        let err = Config::from_source("a: 1\na: 2\n");
        assert!(err.is_err());
    }

    #[test]
    fn allows_duplicate_keys_when_disabled() {
        let cfg = Config::builder().no_duplicates(false).load_str("a: 1\na: 2\n");
        assert!(cfg.is_ok());
    }

    #[test]
    fn as_dict_flattens_nested_mappings() {
        let mut cfg = Config::from_source("outer: {inner: 1}\n").unwrap();
        let dict = cfg.as_dict().unwrap();
        let outer = dict.get("outer").and_then(ConfigValue::as_mapping).unwrap();
        assert_eq!(outer.get("inner").and_then(ConfigValue::as_i64), Some(1));
    }

    #[test]
    fn load_reader_reads_a_byte_stream() {
        let bytes = b"a: 1\nb: 2\n".as_slice();
        let mut cfg = Config::builder().load_reader(bytes).unwrap();
        assert_eq!(cfg.get("a", None).unwrap().as_i64(), Some(1));
    }

    #[test]
    fn with_cache_false_reevaluates_on_every_get() {
        let mut cfg = Config::builder().with_cache(false).load_str("a: 1\n").unwrap();
        assert_eq!(cfg.get("a", None).unwrap().as_i64(), Some(1));
        assert_eq!(cfg.get("a", None).unwrap().as_i64(), Some(1));
    }

    #[test]
    fn context_supplies_bare_word_lookups() {
        let mut context = IndexMap::new();
        context.insert("env".to_string(), ConfigValue::String("prod".to_string()));
        let mut cfg = Config::builder().context(context).load_str("label: env\n").unwrap();
        assert_eq!(cfg.get("label", None).unwrap().as_str(), Some("prod"));
    }
}
