//! The value model a configuration evaluates to.
//!
//! `ConfigValue` is the public-facing shape returned from `get`/`index`.
//! The two `Internal*` variants never escape the crate: they hold an
//! unevaluated AST container so the evaluator can defer walking a list or
//! mapping until something actually asks for its contents, which is what
//! makes references into as-yet-unvisited siblings work.

use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use indexmap::IndexMap;
use num_complex::Complex64;

use crate::ast::NodeRef;
use crate::config::Config;

/// A date-time literal, either with or without a UTC offset. Kept as two
/// variants rather than always normalizing to `FixedOffset` so a config
/// author's "no offset given" intent survives round-tripping.
#[derive(Debug, Clone, PartialEq)]
pub enum CfgDateTime {
    Naive(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
}

impl fmt::Display for CfgDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CfgDateTime::Naive(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            CfgDateTime::Zoned(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

/// A fully-evaluated configuration value.
#[derive(Debug, Clone)]
pub enum ConfigValue {
    Integer(i64),
    Float(f64),
    Complex(Complex64),
    Bool(bool),
    None,
    String(String),
    DateTime(CfgDateTime),
    List(Vec<ConfigValue>),
    Mapping(IndexMap<String, ConfigValue>),
    /// An `@`-included or `$`-dereferenced sub-config, returned intact by
    /// `get_sub_config` instead of being flattened into a `Mapping`.
    NestedConfig(Box<Config>),

    /// An unevaluated list literal: elements are evaluated lazily, on
    /// first access, by the owning `Config`.
    InternalList(NodeRef),
    /// An unevaluated mapping literal, same deal.
    InternalMapping(NodeRef),
}

impl ConfigValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::Complex(_) => "complex",
            ConfigValue::Bool(_) => "boolean",
            ConfigValue::None => "none",
            ConfigValue::String(_) => "string",
            ConfigValue::DateTime(_) => "date-time",
            ConfigValue::List(_) | ConfigValue::InternalList(_) => "list",
            ConfigValue::Mapping(_) | ConfigValue::InternalMapping(_) => "mapping",
            ConfigValue::NestedConfig(_) => "config",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ConfigValue::None)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Integer(i) => Some(*i as f64),
            ConfigValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, ConfigValue>> {
        match self {
            ConfigValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// The textual form used for `${...}` interpolation inside back-tick
    /// literals and string coercions: scalars stringify plainly, lists and
    /// mappings render as `[a, b]` / `{k: v, ...}`.
    pub fn textual_form(&self) -> String {
        match self {
            ConfigValue::Integer(i) => i.to_string(),
            ConfigValue::Float(f) => format_float(*f),
            ConfigValue::Complex(c) => format_complex(*c),
            ConfigValue::Bool(b) => b.to_string(),
            ConfigValue::None => "None".to_string(),
            ConfigValue::String(s) => s.clone(),
            ConfigValue::DateTime(dt) => dt.to_string(),
            ConfigValue::List(items) => {
                let body = items.iter().map(ConfigValue::textual_form).collect::<Vec<_>>().join(", ");
                format!("[{}]", body)
            }
            ConfigValue::Mapping(map) => {
                let body = map
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.textual_form()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{{}}}", body)
            }
            // Reached only if a caller stringifies a value before it has
            // gone through `Config::unwrap_value`, which always flattens
            // a nested config into a plain mapping first.
            ConfigValue::NestedConfig(_) => "<config>".to_string(),
            ConfigValue::InternalList(_) | ConfigValue::InternalMapping(_) => {
                "<unevaluated>".to_string()
            }
        }
    }
}

fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.is_finite() {
        format!("{:.1}", f)
    } else {
        f.to_string()
    }
}

fn format_complex(c: Complex64) -> String {
    if c.re == 0.0 {
        format!("{}j", c.im)
    } else {
        format!("({}{}{}j)", c.re, if c.im < 0.0 { "-" } else { "+" }, c.im.abs())
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.textual_form())
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        ConfigValue::Integer(v)
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        ConfigValue::Float(v)
    }
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Bool(v)
    }
}

impl From<String> for ConfigValue {
    fn from(v: String) -> Self {
        ConfigValue::String(v)
    }
}

impl From<Rc<str>> for ConfigValue {
    fn from(v: Rc<str>) -> Self {
        ConfigValue::String(v.to_string())
    }
}
