//! The evaluator and public query surface: loading, path walking, operator
//! semantics, include resolution, and the `get`/`index`/`as_dict` API.

use std::fs;
use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;
use num_complex::Complex64;

use layercfg_lex::{Token, TokenKind, TokenValue};
use layercfg_util::{ConfigError, Error, Location, Result};

use crate::ast::{Node, NodeRef};
use crate::backtick::{DefaultStringConverter, StringConverter};
use crate::parser::{self, Parser};
use crate::slice;
use crate::value::ConfigValue;

/// A loaded configuration: the root mapping keeps its entries as
/// unevaluated AST until something asks for them.
#[derive(Clone)]
pub struct Config {
    root: IndexMap<String, NodeRef>,
    path: Option<PathBuf>,
    include_path: Vec<PathBuf>,
    context: IndexMap<String, ConfigValue>,
    cache: Option<IndexMap<String, ConfigValue>>,
    no_duplicates: bool,
    strict_conversions: bool,
    string_converter: Rc<dyn StringConverter>,
    refs_seen: Vec<(usize, Location)>,
}

/// Builder for load-time options. Defaults match §6: duplicates rejected,
/// conversions strict, caching on, the default back-tick converter.
pub struct ConfigBuilder {
    include_path: Vec<PathBuf>,
    context: IndexMap<String, ConfigValue>,
    no_duplicates: bool,
    strict_conversions: bool,
    string_converter: Rc<dyn StringConverter>,
    cache_enabled: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        ConfigBuilder {
            include_path: Vec::new(),
            context: IndexMap::new(),
            no_duplicates: true,
            strict_conversions: true,
            string_converter: Rc::new(DefaultStringConverter),
            cache_enabled: true,
        }
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_duplicates(mut self, value: bool) -> Self {
        self.no_duplicates = value;
        self
    }

    pub fn strict_conversions(mut self, value: bool) -> Self {
        self.strict_conversions = value;
        self
    }

    pub fn include_path(mut self, paths: Vec<PathBuf>) -> Self {
        self.include_path = paths;
        self
    }

    pub fn context(mut self, context: IndexMap<String, ConfigValue>) -> Self {
        self.context = context;
        self
    }

    pub fn string_converter(mut self, converter: Rc<dyn StringConverter>) -> Self {
        self.string_converter = converter;
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn load_str(self, source: &str) -> Result<Config> {
        Config::build(source, None, self)
    }

    pub fn load_file(self, path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        Config::build(&source, Some(path.to_path_buf()), self)
    }

    pub fn load_reader(self, mut reader: impl std::io::Read) -> Result<Config> {
        let mut source = String::new();
        reader.read_to_string(&mut source)?;
        Config::build(&source, None, self)
    }
}

enum PathBase {
    Root,
    Context,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("path", &self.path)
            .field("keys", &self.root.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn from_source(source: &str) -> Result<Config> {
        ConfigBuilder::new().load_str(source)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Config> {
        ConfigBuilder::new().load_file(path)
    }

    fn build(source: &str, path: Option<PathBuf>, builder: ConfigBuilder) -> Result<Config> {
        let mut parser = Parser::new(source.as_bytes())?;
        let container = parser.parse_container()?;
        parser.expect_eof()?;
        parser::check_duplicates(&container, builder.no_duplicates)?;

        let root = match container.as_ref() {
            Node::Mapping(entries) => {
                let mut map = IndexMap::new();
                for (key, value) in entries {
                    map.insert(key.text_value().to_string(), value.clone());
                }
                map
            }
            _ => return Err(ConfigError::RootMustBeMapping.into()),
        };

        Ok(Config {
            root,
            path,
            include_path: builder.include_path,
            context: builder.context,
            cache: if builder.cache_enabled { Some(IndexMap::new()) } else { None },
            no_duplicates: builder.no_duplicates,
            strict_conversions: builder.strict_conversions,
            string_converter: builder.string_converter,
            refs_seen: Vec::new(),
        })
    }

    pub(crate) fn strict_conversions(&self) -> bool {
        self.strict_conversions
    }

    fn root_dir(&self) -> Option<PathBuf> {
        self.path.as_ref().and_then(|p| p.parent()).map(Path::to_path_buf)
    }

    /// Used by the default back-tick converter to resolve `${path}`.
    pub(crate) fn resolve_interpolation_path(&mut self, path_text: &str) -> Result<String> {
        let node = parser::parse_path(path_text)?;
        let value = self.evaluate_primary(&node, PathBase::Root)?;
        let value = self.unwrap_value(value)?;
        Ok(value.textual_form())
    }

    // ---- Public query surface -------------------------------------------

    pub fn get(&mut self, key: &str, default: Option<ConfigValue>) -> Result<ConfigValue> {
        if let Some(cache) = &self.cache {
            if let Some(value) = cache.get(key) {
                return Ok(value.clone());
            }
        }
        self.refs_seen.clear();

        let outcome: Result<ConfigValue> = if parser::is_identifier(key) {
            match self.root.get(key).cloned() {
                Some(node) => self.fetch_and_evaluate(&node).and_then(|v| self.unwrap_value(v)),
                None => Err(ConfigError::NotFound { key: key.to_string() }.into()),
            }
        } else {
            match parser::parse_path(key) {
                Ok(node) => self.evaluate_primary(&node, PathBase::Root).and_then(|v| self.unwrap_value(v)),
                Err(e) => Err(e),
            }
        };

        match outcome {
            Ok(value) => {
                if let Some(cache) = &mut self.cache {
                    cache.insert(key.to_string(), value.clone());
                }
                Ok(value)
            }
            Err(err) => match default {
                Some(d) => Ok(d),
                None => Err(err),
            },
        }
    }

    pub fn index(&mut self, key: &str) -> Result<ConfigValue> {
        self.get(key, None)
    }

    pub fn get_sub_config(&mut self, key: &str) -> Result<Config> {
        self.refs_seen.clear();
        let value = if parser::is_identifier(key) {
            let node = self
                .root
                .get(key)
                .cloned()
                .ok_or_else(|| ConfigError::NotFound { key: key.to_string() })?;
            self.fetch_and_evaluate(&node)?
        } else {
            let node = parser::parse_path(key)?;
            self.evaluate_primary(&node, PathBase::Root)?
        };
        match value {
            ConfigValue::NestedConfig(cfg) => Ok(*cfg),
            other => Err(ConfigError::InvalidContainerForIndex { kind: other.type_name().to_string() }.into()),
        }
    }

    pub fn as_dict(&mut self) -> Result<IndexMap<String, ConfigValue>> {
        let keys: Vec<String> = self.root.keys().cloned().collect();
        let mut out = IndexMap::new();
        for key in keys {
            let node = self.root.get(&key).cloned().unwrap();
            self.refs_seen.clear();
            let value = self.fetch_and_evaluate(&node)?;
            let value = self.unwrap_value(value)?;
            out.insert(key, value);
        }
        Ok(out)
    }

    // ---- Evaluation -------------------------------------------------------

    fn fetch_and_evaluate(&mut self, node: &NodeRef) -> Result<ConfigValue> {
        let id = Node::identity(node);
        if let Some(pos) = self.refs_seen.iter().position(|(seen, _)| *seen == id) {
            let mut locations: Vec<Location> = self.refs_seen[pos..].iter().map(|(_, loc)| *loc).collect();
            locations.push(node_start_location(node));
            locations.sort();
            let detail = locations.iter().map(|l| l.to_string()).collect::<Vec<_>>().join(", ");
            return Err(ConfigError::CircularReference { detail }.into());
        }
        self.refs_seen.push((id, node_start_location(node)));
        let result = self.evaluate_node(node);
        self.refs_seen.pop();
        result
    }

    fn evaluate_and_unwrap(&mut self, node: &NodeRef) -> Result<ConfigValue> {
        let value = self.evaluate_node(node)?;
        self.unwrap_value(value)
    }

    fn evaluate_node(&mut self, node: &NodeRef) -> Result<ConfigValue> {
        match node.as_ref() {
            Node::Leaf(tok) => self.evaluate_leaf(tok),
            Node::List(_) => Ok(ConfigValue::InternalList(node.clone())),
            Node::Mapping(_) => Ok(ConfigValue::InternalMapping(node.clone())),
            Node::Slice { .. } => unreachable!("slice nodes are only reached through a subscript"),
            Node::Unary { op, operand } => self.evaluate_unary(*op, operand),
            Node::Binary { op: TokenKind::Dot, .. } | Node::Binary { op: TokenKind::LeftBracket, .. } => {
                self.evaluate_primary(node, PathBase::Context)
            }
            Node::Binary { op, lhs, rhs } => self.evaluate_binary(*op, lhs, rhs),
        }
    }

    fn evaluate_leaf(&mut self, tok: &Token) -> Result<ConfigValue> {
        match tok.kind {
            TokenKind::IntegerNumber => match tok.value {
                TokenValue::Integer(i) => Ok(ConfigValue::Integer(i)),
                _ => unreachable!(),
            },
            TokenKind::FloatNumber => match tok.value {
                TokenValue::Float(f) => Ok(ConfigValue::Float(f)),
                _ => unreachable!(),
            },
            TokenKind::Complex => match tok.value {
                TokenValue::Complex(re, im) => Ok(ConfigValue::Complex(Complex64::new(re, im))),
                _ => unreachable!(),
            },
            TokenKind::StringToken => Ok(ConfigValue::String(tok.text_value().to_string())),
            TokenKind::TrueToken => Ok(ConfigValue::Bool(true)),
            TokenKind::FalseToken => Ok(ConfigValue::Bool(false)),
            TokenKind::NoneToken => Ok(ConfigValue::None),
            TokenKind::BackTick => {
                let converter = self.string_converter.clone();
                converter.convert(tok.text_value(), self)
            }
            TokenKind::Word => self
                .context
                .get(tok.text_value())
                .cloned()
                .ok_or_else(|| ConfigError::UnknownVariable { name: tok.text_value().to_string() }.into()),
            _ => unreachable!("the parser never builds a leaf from this token kind"),
        }
    }

    fn evaluate_unary(&mut self, op: TokenKind, operand: &NodeRef) -> Result<ConfigValue> {
        match op {
            TokenKind::Dollar => self.evaluate_primary(operand, PathBase::Root),
            TokenKind::At => {
                let value = self.evaluate_and_unwrap(operand)?;
                match value {
                    ConfigValue::String(path_text) => self.resolve_include(&path_text),
                    other => Err(unary_mismatch("include", &other)),
                }
            }
            TokenKind::Not => match self.evaluate_and_unwrap(operand)? {
                ConfigValue::Bool(b) => Ok(ConfigValue::Bool(!b)),
                other => Err(unary_mismatch("negate", &other)),
            },
            TokenKind::Minus => match self.evaluate_and_unwrap(operand)? {
                ConfigValue::Integer(i) => Ok(ConfigValue::Integer(-i)),
                ConfigValue::Float(f) => Ok(ConfigValue::Float(-f)),
                ConfigValue::Complex(c) => Ok(ConfigValue::Complex(-c)),
                other => Err(unary_mismatch("negate", &other)),
            },
            TokenKind::Plus => match self.evaluate_and_unwrap(operand)? {
                v @ (ConfigValue::Integer(_) | ConfigValue::Float(_) | ConfigValue::Complex(_)) => Ok(v),
                other => Err(unary_mismatch("apply unary plus to", &other)),
            },
            TokenKind::BitwiseComplement => match self.evaluate_and_unwrap(operand)? {
                ConfigValue::Integer(i) => Ok(ConfigValue::Integer(!i)),
                other => Err(unary_mismatch("complement", &other)),
            },
            _ => unreachable!("the parser never builds a unary node with this operator"),
        }
    }

    fn evaluate_binary(&mut self, op: TokenKind, lhs: &NodeRef, rhs: &NodeRef) -> Result<ConfigValue> {
        match op {
            TokenKind::Or => {
                let l = self.evaluate_and_unwrap(lhs)?;
                match l {
                    ConfigValue::Bool(true) => Ok(ConfigValue::Bool(true)),
                    ConfigValue::Bool(false) => match self.evaluate_and_unwrap(rhs)? {
                        ConfigValue::Bool(b) => Ok(ConfigValue::Bool(b)),
                        other => Err(binary_mismatch("or", &ConfigValue::Bool(false), "with", &other)),
                    },
                    other => Err(unary_mismatch("evaluate as a boolean for 'or'", &other)),
                }
            }
            TokenKind::And => {
                let l = self.evaluate_and_unwrap(lhs)?;
                match l {
                    ConfigValue::Bool(false) => Ok(ConfigValue::Bool(false)),
                    ConfigValue::Bool(true) => match self.evaluate_and_unwrap(rhs)? {
                        ConfigValue::Bool(b) => Ok(ConfigValue::Bool(b)),
                        other => Err(binary_mismatch("and", &ConfigValue::Bool(true), "with", &other)),
                    },
                    other => Err(unary_mismatch("evaluate as a boolean for 'and'", &other)),
                }
            }
            TokenKind::Is => {
                let l = self.evaluate_and_unwrap(lhs)?;
                let r = self.evaluate_and_unwrap(rhs)?;
                Ok(ConfigValue::Bool(values_equal(&l, &r)))
            }
            TokenKind::In => {
                let l = self.evaluate_and_unwrap(lhs)?;
                let r = self.evaluate_and_unwrap(rhs)?;
                eval_in(l, r)
            }
            TokenKind::LessThan
            | TokenKind::LessEq
            | TokenKind::GreaterThan
            | TokenKind::GreaterEq
            | TokenKind::EqEq
            | TokenKind::NotEq
            | TokenKind::LessGreater => {
                let l = self.evaluate_and_unwrap(lhs)?;
                let r = self.evaluate_and_unwrap(rhs)?;
                eval_comparison(op, l, r)
            }
            TokenKind::BitwiseAnd
            | TokenKind::BitwiseXor
            | TokenKind::BitwiseOr
            | TokenKind::LeftShift
            | TokenKind::RightShift => {
                let l = self.evaluate_and_unwrap(lhs)?;
                let r = self.evaluate_and_unwrap(rhs)?;
                eval_bitwise(op, l, r)
            }
            TokenKind::Plus => {
                let l = self.evaluate_and_unwrap(lhs)?;
                let r = self.evaluate_and_unwrap(rhs)?;
                eval_add(l, r)
            }
            TokenKind::Minus => {
                let l = self.evaluate_and_unwrap(lhs)?;
                let r = self.evaluate_and_unwrap(rhs)?;
                eval_sub(l, r)
            }
            TokenKind::Star | TokenKind::Slash | TokenKind::FloorDiv | TokenKind::Modulo => {
                let l = self.evaluate_and_unwrap(lhs)?;
                let r = self.evaluate_and_unwrap(rhs)?;
                eval_mul(op, l, r)
            }
            TokenKind::Power => {
                let l = self.evaluate_and_unwrap(lhs)?;
                let r = self.evaluate_and_unwrap(rhs)?;
                eval_pow(l, r)
            }
            _ => unreachable!("the parser never builds a binary node with this operator"),
        }
    }

    /// Walks a primary (Word plus Dot/Subscript/Slice trailers), resolving
    /// the leading Word against `base`: the config's own root for `$`
    /// references and dotted path lookups, or the external `context` for a
    /// bare word used inside an ordinary expression.
    fn evaluate_primary(&mut self, node: &NodeRef, base: PathBase) -> Result<ConfigValue> {
        match node.as_ref() {
            Node::Leaf(tok) if tok.kind == TokenKind::Word => match base {
                PathBase::Root => match self.root.get(tok.text_value()).cloned() {
                    Some(value_node) => self.fetch_and_evaluate(&value_node),
                    None => Err(ConfigError::NotFound { key: tok.text_value().to_string() }.into()),
                },
                PathBase::Context => self
                    .context
                    .get(tok.text_value())
                    .cloned()
                    .ok_or_else(|| ConfigError::UnknownVariable { name: tok.text_value().to_string() }.into()),
            },
            Node::Binary { op: TokenKind::Dot, lhs, rhs } => {
                let container = self.evaluate_primary(lhs, base)?;
                let key = rhs.as_leaf().map(|t| t.text_value().to_string()).unwrap_or_default();
                self.dot_lookup(container, &key)
            }
            Node::Binary { op: TokenKind::LeftBracket, lhs, rhs } => {
                let container = self.evaluate_primary(lhs, base)?;
                match rhs.as_ref() {
                    Node::Slice { start, stop, step } => {
                        let start = self.eval_opt_index(start)?;
                        let stop = self.eval_opt_index(stop)?;
                        let step = self.eval_opt_index(step)?;
                        self.apply_slice(container, start, stop, step)
                    }
                    _ => {
                        let index = self.evaluate_and_unwrap(rhs)?;
                        self.apply_subscript(container, index)
                    }
                }
            }
            _ => self.evaluate_and_unwrap(node),
        }
    }

    fn eval_opt_index(&mut self, node: &Option<NodeRef>) -> Result<Option<ConfigValue>> {
        match node {
            None => Ok(None),
            Some(n) => Ok(Some(self.evaluate_and_unwrap(n)?)),
        }
    }

    fn dot_lookup(&mut self, container: ConfigValue, key: &str) -> Result<ConfigValue> {
        match container {
            ConfigValue::InternalMapping(node) => {
                let entries = match node.as_ref() {
                    Node::Mapping(entries) => entries,
                    _ => unreachable!(),
                };
                match entries.iter().find(|(k, _)| k.text_value() == key) {
                    Some((_, value_node)) => {
                        let value_node = value_node.clone();
                        self.fetch_and_evaluate(&value_node)
                    }
                    None => Err(ConfigError::NotFound { key: key.to_string() }.into()),
                }
            }
            ConfigValue::Mapping(map) => map
                .get(key)
                .cloned()
                .ok_or_else(|| ConfigError::NotFound { key: key.to_string() }.into()),
            ConfigValue::NestedConfig(mut cfg) => match cfg.root.get(key).cloned() {
                Some(value_node) => cfg.fetch_and_evaluate(&value_node),
                None => Err(ConfigError::NotFound { key: key.to_string() }.into()),
            },
            other => Err(ConfigError::InvalidContainerForIndex { kind: other.type_name().to_string() }.into()),
        }
    }

    fn apply_subscript(&mut self, container: ConfigValue, index: ConfigValue) -> Result<ConfigValue> {
        let i = match index {
            ConfigValue::Integer(i) => i,
            other => return Err(ConfigError::InvalidContainerForIndex { kind: other.type_name().to_string() }.into()),
        };
        match container {
            ConfigValue::InternalList(node) => {
                let items = match node.as_ref() {
                    Node::List(items) => items.clone(),
                    _ => unreachable!(),
                };
                let n = items.len() as i64;
                let idx = normalize_single_index(i, n)?;
                self.fetch_and_evaluate(&items[idx as usize])
            }
            ConfigValue::List(items) => {
                let n = items.len() as i64;
                let idx = normalize_single_index(i, n)?;
                Ok(items[idx as usize].clone())
            }
            other => Err(ConfigError::InvalidContainerForIndex { kind: other.type_name().to_string() }.into()),
        }
    }

    fn apply_slice(
        &mut self,
        container: ConfigValue,
        start: Option<ConfigValue>,
        stop: Option<ConfigValue>,
        step: Option<ConfigValue>,
    ) -> Result<ConfigValue> {
        let start = as_slice_bound(start)?;
        let stop = as_slice_bound(stop)?;
        let step = as_slice_bound(step)?;
        match container {
            ConfigValue::InternalList(node) => {
                let items = match node.as_ref() {
                    Node::List(items) => items.clone(),
                    _ => unreachable!(),
                };
                let indices = slice::resolve_slice(items.len() as i64, start, stop, step)?;
                let mut out = Vec::with_capacity(indices.len());
                for idx in indices {
                    let value = self.fetch_and_evaluate(&items[idx as usize])?;
                    out.push(self.unwrap_value(value)?);
                }
                Ok(ConfigValue::List(out))
            }
            ConfigValue::List(items) => {
                let indices = slice::resolve_slice(items.len() as i64, start, stop, step)?;
                Ok(ConfigValue::List(indices.into_iter().map(|i| items[i as usize].clone()).collect()))
            }
            other => Err(ConfigError::InvalidContainerForSlicing { kind: other.type_name().to_string() }.into()),
        }
    }

    /// `InternalList`/`InternalMapping` defer evaluation of their elements;
    /// `NestedConfig` defers to the child's own `asDict`. Everything else
    /// is already a public shape.
    fn unwrap_value(&mut self, value: ConfigValue) -> Result<ConfigValue> {
        match value {
            ConfigValue::InternalList(node) => {
                let items = match node.as_ref() {
                    Node::List(items) => items.clone(),
                    _ => unreachable!(),
                };
                let mut out = Vec::with_capacity(items.len());
                for item in &items {
                    let v = self.fetch_and_evaluate(item)?;
                    out.push(self.unwrap_value(v)?);
                }
                Ok(ConfigValue::List(out))
            }
            ConfigValue::InternalMapping(node) => {
                let entries = match node.as_ref() {
                    Node::Mapping(entries) => entries.clone(),
                    _ => unreachable!(),
                };
                let mut out = IndexMap::new();
                for (key, value_node) in &entries {
                    let v = self.fetch_and_evaluate(value_node)?;
                    out.insert(key.text_value().to_string(), self.unwrap_value(v)?);
                }
                Ok(ConfigValue::Mapping(out))
            }
            ConfigValue::NestedConfig(mut cfg) => {
                let dict = cfg.as_dict()?;
                Ok(ConfigValue::Mapping(dict))
            }
            other => Ok(other),
        }
    }

    fn resolve_include(&mut self, raw_path: &str) -> Result<ConfigValue> {
        let candidate = Path::new(raw_path);
        let resolved = if candidate.is_absolute() && candidate.exists() {
            candidate.to_path_buf()
        } else {
            let mut found = None;
            if let Some(dir) = self.root_dir() {
                let joined = dir.join(raw_path);
                if joined.exists() {
                    found = Some(joined);
                }
            }
            if found.is_none() {
                for dir in &self.include_path {
                    let joined = dir.join(raw_path);
                    if joined.exists() {
                        found = Some(joined);
                        break;
                    }
                }
            }
            found.ok_or_else(|| ConfigError::UnableToLocate { path: raw_path.to_string() })?
        };

        if let Some(own) = &self.path {
            if paths_equal(own, &resolved) {
                return Err(ConfigError::SelfInclude { path: raw_path.to_string() }.into());
            }
        }

        let source = fs::read_to_string(&resolved)?;
        let mut parser = Parser::new(source.as_bytes())?;
        let container = parser.parse_container()?;
        parser.expect_eof()?;
        parser::check_duplicates(&container, self.no_duplicates)?;

        match container.as_ref() {
            Node::List(_) => Ok(ConfigValue::InternalList(container)),
            Node::Mapping(entries) => {
                let mut root = IndexMap::new();
                for (key, value) in entries {
                    root.insert(key.text_value().to_string(), value.clone());
                }
                let child = Config {
                    root,
                    path: Some(resolved),
                    include_path: self.include_path.clone(),
                    context: self.context.clone(),
                    cache: self.cache.as_ref().map(|_| IndexMap::new()),
                    no_duplicates: self.no_duplicates,
                    strict_conversions: self.strict_conversions,
                    string_converter: self.string_converter.clone(),
                    refs_seen: Vec::new(),
                };
                Ok(ConfigValue::NestedConfig(Box::new(child)))
            }
            _ => Err(ConfigError::RootMustBeMapping.into()),
        }
    }
}

fn paths_equal(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn node_start_location(node: &NodeRef) -> Location {
    match node.as_ref() {
        Node::Leaf(tok) => tok.start,
        Node::Unary { operand, .. } => node_start_location(operand),
        Node::Binary { lhs, .. } => node_start_location(lhs),
        Node::Slice { start, stop, step } => start
            .as_ref()
            .or(stop.as_ref())
            .or(step.as_ref())
            .map(node_start_location)
            .unwrap_or(Location::START),
        Node::List(items) => items.first().map(node_start_location).unwrap_or(Location::START),
        Node::Mapping(entries) => entries.first().map(|(k, _)| k.start).unwrap_or(Location::START),
    }
}

fn normalize_single_index(i: i64, n: i64) -> Result<i64> {
    let idx = if i < 0 { i + n } else { i };
    if idx < 0 || idx >= n {
        return Err(ConfigError::IndexOutOfRange { index: i, max: n - 1 }.into());
    }
    Ok(idx)
}

fn as_slice_bound(value: Option<ConfigValue>) -> Result<Option<i64>> {
    match value {
        None => Ok(None),
        Some(ConfigValue::Integer(i)) => Ok(Some(i)),
        Some(other) => Err(ConfigError::StepNotInteger { kind: other.type_name().to_string() }.into()),
    }
}

fn to_complex(value: &ConfigValue) -> Result<Complex64> {
    match value {
        ConfigValue::Integer(i) => Ok(Complex64::new(*i as f64, 0.0)),
        ConfigValue::Float(f) => Ok(Complex64::new(*f, 0.0)),
        ConfigValue::Complex(c) => Ok(*c),
        other => Err(unary_mismatch("convert to complex", other)),
    }
}

fn values_equal(a: &ConfigValue, b: &ConfigValue) -> bool {
    match (a, b) {
        (ConfigValue::Integer(x), ConfigValue::Integer(y)) => x == y,
        (ConfigValue::Integer(x), ConfigValue::Float(y)) | (ConfigValue::Float(y), ConfigValue::Integer(x)) => {
            (*x as f64) == *y
        }
        (ConfigValue::Float(x), ConfigValue::Float(y)) => x == y,
        (ConfigValue::Complex(x), ConfigValue::Complex(y)) => x == y,
        (ConfigValue::Bool(x), ConfigValue::Bool(y)) => x == y,
        (ConfigValue::None, ConfigValue::None) => true,
        (ConfigValue::String(x), ConfigValue::String(y)) => x == y,
        (ConfigValue::DateTime(x), ConfigValue::DateTime(y)) => x == y,
        (ConfigValue::List(x), ConfigValue::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        (ConfigValue::Mapping(x), ConfigValue::Mapping(y)) => {
            x.len() == y.len() && x.iter().all(|(k, v)| y.get(k).is_some_and(|v2| values_equal(v, v2)))
        }
        _ => false,
    }
}

fn eval_in(needle: ConfigValue, haystack: ConfigValue) -> Result<ConfigValue> {
    match haystack {
        ConfigValue::List(items) => Ok(ConfigValue::Bool(items.iter().any(|v| values_equal(v, &needle)))),
        ConfigValue::Mapping(map) => match needle {
            ConfigValue::String(key) => Ok(ConfigValue::Bool(map.contains_key(&key))),
            other => Err(binary_mismatch("test membership of", &other, "in", &ConfigValue::Mapping(map))),
        },
        ConfigValue::String(haystack) => match needle {
            ConfigValue::String(needle) => Ok(ConfigValue::Bool(haystack.contains(needle.as_str()))),
            other => Err(binary_mismatch("test membership of", &other, "in", &ConfigValue::String(haystack))),
        },
        other => Err(binary_mismatch("test membership in", &needle, "within", &other)),
    }
}

fn eval_comparison(op: TokenKind, l: ConfigValue, r: ConfigValue) -> Result<ConfigValue> {
    if op == TokenKind::EqEq {
        return Ok(ConfigValue::Bool(values_equal(&l, &r)));
    }
    if matches!(op, TokenKind::NotEq | TokenKind::LessGreater) {
        return Ok(ConfigValue::Bool(!values_equal(&l, &r)));
    }
    let ordering = match (&l, &r) {
        (ConfigValue::Integer(a), ConfigValue::Integer(b)) => a.partial_cmp(b),
        (ConfigValue::Integer(a), ConfigValue::Float(b)) => (*a as f64).partial_cmp(b),
        (ConfigValue::Float(a), ConfigValue::Integer(b)) => a.partial_cmp(&(*b as f64)),
        (ConfigValue::Float(a), ConfigValue::Float(b)) => a.partial_cmp(b),
        (ConfigValue::String(a), ConfigValue::String(b)) => a.partial_cmp(b),
        _ => None,
    };
    let ordering = ordering.ok_or_else(|| binary_mismatch("compare", &l, "to", &r))?;
    let result = match op {
        TokenKind::LessThan => ordering.is_lt(),
        TokenKind::LessEq => ordering.is_le(),
        TokenKind::GreaterThan => ordering.is_gt(),
        TokenKind::GreaterEq => ordering.is_ge(),
        _ => unreachable!(),
    };
    Ok(ConfigValue::Bool(result))
}

fn eval_bitwise(op: TokenKind, l: ConfigValue, r: ConfigValue) -> Result<ConfigValue> {
    match op {
        TokenKind::BitwiseAnd => match (l, r) {
            (ConfigValue::Integer(a), ConfigValue::Integer(b)) => Ok(ConfigValue::Integer(a & b)),
            (a, b) => Err(binary_mismatch("bitwise-and", &a, "with", &b)),
        },
        TokenKind::BitwiseXor => match (l, r) {
            (ConfigValue::Integer(a), ConfigValue::Integer(b)) => Ok(ConfigValue::Integer(a ^ b)),
            (a, b) => Err(binary_mismatch("bitwise-xor", &a, "with", &b)),
        },
        TokenKind::BitwiseOr => match (l, r) {
            (ConfigValue::Integer(a), ConfigValue::Integer(b)) => Ok(ConfigValue::Integer(a | b)),
            (ConfigValue::Mapping(a), ConfigValue::Mapping(b)) => Ok(ConfigValue::Mapping(merge_mappings(a, b))),
            (a, b) => Err(binary_mismatch("bitwise-or", &a, "with", &b)),
        },
        TokenKind::LeftShift => match (l, r) {
            (ConfigValue::Integer(a), ConfigValue::Integer(b)) => Ok(ConfigValue::Integer(a << b)),
            (a, b) => Err(binary_mismatch("shift", &a, "left by", &b)),
        },
        TokenKind::RightShift => match (l, r) {
            (ConfigValue::Integer(a), ConfigValue::Integer(b)) => Ok(ConfigValue::Integer(a >> b)),
            (a, b) => Err(binary_mismatch("shift", &a, "right by", &b)),
        },
        _ => unreachable!(),
    }
}

fn eval_add(l: ConfigValue, r: ConfigValue) -> Result<ConfigValue> {
    match (l, r) {
        (ConfigValue::String(a), ConfigValue::String(b)) => Ok(ConfigValue::String(a + &b)),
        (ConfigValue::Integer(a), ConfigValue::Integer(b)) => Ok(ConfigValue::Integer(a + b)),
        (ConfigValue::Integer(a), ConfigValue::Float(b)) => Ok(ConfigValue::Float(a as f64 + b)),
        (ConfigValue::Float(a), ConfigValue::Integer(b)) => Ok(ConfigValue::Float(a + b as f64)),
        (ConfigValue::Float(a), ConfigValue::Float(b)) => Ok(ConfigValue::Float(a + b)),
        (ConfigValue::Complex(a), b) => Ok(ConfigValue::Complex(a + to_complex(&b)?)),
        (a, ConfigValue::Complex(b)) => Ok(ConfigValue::Complex(to_complex(&a)? + b)),
        (ConfigValue::List(a), ConfigValue::List(b)) => Ok(ConfigValue::List(a.into_iter().chain(b).collect())),
        (ConfigValue::Mapping(a), ConfigValue::Mapping(b)) => Ok(ConfigValue::Mapping(merge_mappings(a, b))),
        (a, b) => Err(binary_mismatch("add", &a, "to", &b)),
    }
}

fn eval_sub(l: ConfigValue, r: ConfigValue) -> Result<ConfigValue> {
    match (l, r) {
        (ConfigValue::Integer(a), ConfigValue::Integer(b)) => Ok(ConfigValue::Integer(a - b)),
        (ConfigValue::Integer(a), ConfigValue::Float(b)) => Ok(ConfigValue::Float(a as f64 - b)),
        (ConfigValue::Float(a), ConfigValue::Integer(b)) => Ok(ConfigValue::Float(a - b as f64)),
        (ConfigValue::Float(a), ConfigValue::Float(b)) => Ok(ConfigValue::Float(a - b)),
        (ConfigValue::Complex(a), b) => Ok(ConfigValue::Complex(a - to_complex(&b)?)),
        (a, ConfigValue::Complex(b)) => Ok(ConfigValue::Complex(to_complex(&a)? - b)),
        (ConfigValue::Mapping(a), ConfigValue::Mapping(b)) => Ok(ConfigValue::Mapping(subtract_mappings(a, b))),
        (a, b) => Err(binary_mismatch("subtract", &b, "from", &a)),
    }
}

fn eval_mul(op: TokenKind, l: ConfigValue, r: ConfigValue) -> Result<ConfigValue> {
    match op {
        TokenKind::Star => match (l, r) {
            (ConfigValue::Integer(a), ConfigValue::Integer(b)) => Ok(ConfigValue::Integer(a * b)),
            (ConfigValue::Integer(a), ConfigValue::Float(b)) | (ConfigValue::Float(b), ConfigValue::Integer(a)) => {
                Ok(ConfigValue::Float(a as f64 * b))
            }
            (ConfigValue::Float(a), ConfigValue::Float(b)) => Ok(ConfigValue::Float(a * b)),
            (ConfigValue::Complex(a), b) => Ok(ConfigValue::Complex(a * to_complex(&b)?)),
            (a, ConfigValue::Complex(b)) => Ok(ConfigValue::Complex(to_complex(&a)? * b)),
            (a, b) => Err(binary_mismatch("multiply", &a, "by", &b)),
        },
        TokenKind::Slash => match (l, r) {
            (ConfigValue::Complex(a), b) => Ok(ConfigValue::Complex(a / to_complex(&b)?)),
            (a, ConfigValue::Complex(b)) => Ok(ConfigValue::Complex(to_complex(&a)? / b)),
            (a, b) => {
                let fa = a.as_f64().ok_or_else(|| binary_mismatch("divide", &a, "by", &b))?;
                let fb = b.as_f64().ok_or_else(|| binary_mismatch("divide", &a, "by", &b))?;
                Ok(ConfigValue::Float(fa / fb))
            }
        },
        TokenKind::FloorDiv => match (l, r) {
            (ConfigValue::Integer(_), ConfigValue::Integer(0)) => Err(div_by_zero("floor-divide", &ConfigValue::Integer(0))),
            (ConfigValue::Integer(a), ConfigValue::Integer(b)) => Ok(ConfigValue::Integer(a.div_euclid(b))),
            (a, b) => Err(binary_mismatch("floor-divide", &a, "by", &b)),
        },
        TokenKind::Modulo => match (l, r) {
            (ConfigValue::Integer(_), ConfigValue::Integer(0)) => Err(div_by_zero("take the remainder of", &ConfigValue::Integer(0))),
            (ConfigValue::Integer(a), ConfigValue::Integer(b)) => Ok(ConfigValue::Integer(a.rem_euclid(b))),
            (a, b) => Err(binary_mismatch("take the remainder of", &a, "by", &b)),
        },
        _ => unreachable!(),
    }
}

fn eval_pow(l: ConfigValue, r: ConfigValue) -> Result<ConfigValue> {
    match (l, r) {
        (ConfigValue::Integer(a), ConfigValue::Integer(b)) if b >= 0 && b <= u32::MAX as i64 => {
            Ok(ConfigValue::Integer(a.pow(b as u32)))
        }
        (ConfigValue::Integer(a), ConfigValue::Integer(b)) => Ok(ConfigValue::Float((a as f64).powi(b as i32))),
        (ConfigValue::Integer(a), ConfigValue::Float(b)) => Ok(ConfigValue::Float((a as f64).powf(b))),
        (ConfigValue::Float(a), ConfigValue::Integer(b)) => Ok(ConfigValue::Float(a.powi(b as i32))),
        (ConfigValue::Float(a), ConfigValue::Float(b)) => Ok(ConfigValue::Float(a.powf(b))),
        (ConfigValue::Complex(a), b) => Ok(ConfigValue::Complex(a.powc(to_complex(&b)?))),
        (a, ConfigValue::Complex(b)) => Ok(ConfigValue::Complex(to_complex(&a)?.powc(b))),
        (a, b) => Err(binary_mismatch("raise", &a, "to the power of", &b)),
    }
}

/// Deep merge, keeping the left mapping's key order: existing keys are
/// overwritten (recursively, if both sides hold a mapping) in place, and
/// only genuinely new keys from the right side are appended.
fn merge_mappings(
    mut out: IndexMap<String, ConfigValue>,
    incoming: IndexMap<String, ConfigValue>,
) -> IndexMap<String, ConfigValue> {
    for (key, value) in incoming {
        match out.get_mut(&key) {
            Some(existing @ ConfigValue::Mapping(_)) => {
                if let ConfigValue::Mapping(incoming_map) = value {
                    let ConfigValue::Mapping(existing_map) = std::mem::replace(existing, ConfigValue::None) else {
                        unreachable!()
                    };
                    *existing = ConfigValue::Mapping(merge_mappings(existing_map, incoming_map));
                } else {
                    *existing = value;
                }
            }
            Some(existing) => *existing = value,
            None => {
                out.insert(key, value);
            }
        }
    }
    out
}

fn subtract_mappings(
    mut out: IndexMap<String, ConfigValue>,
    remove: IndexMap<String, ConfigValue>,
) -> IndexMap<String, ConfigValue> {
    for key in remove.keys() {
        out.shift_remove(key);
    }
    out
}

fn binary_mismatch(op: &str, lhs: &ConfigValue, connector: &str, rhs: &ConfigValue) -> Error {
    ConfigError::OperatorMismatch {
        op: op.to_string(),
        lhs: lhs.type_name().to_string(),
        connector: connector.to_string(),
        rhs: rhs.type_name().to_string(),
    }
    .into()
}

fn unary_mismatch(op: &str, operand: &ConfigValue) -> Error {
    ConfigError::OperatorMismatch {
        op: op.to_string(),
        lhs: operand.type_name().to_string(),
        connector: String::new(),
        rhs: String::new(),
    }
    .into()
}

fn div_by_zero(op: &str, lhs: &ConfigValue) -> Error {
    ConfigError::OperatorMismatch {
        op: op.to_string(),
        lhs: lhs.type_name().to_string(),
        connector: "by".to_string(),
        rhs: "zero".to_string(),
    }
    .into()
}
