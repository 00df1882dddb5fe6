//! Recursive-descent parser: one function per precedence level, mirroring
//! the grammar directly instead of a Pratt/binding-power table, since the
//! grammar is small, fixed, and the whole point is to read like the table
//! in the component design doc.

use std::rc::Rc;

use layercfg_lex::{Lexer, Token, TokenKind, TokenValue};
use layercfg_util::{ConfigError, Location, ParserError, Result};
use rustc_hash::FxHashMap;

use crate::ast::{Node, NodeRef};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: Option<Token>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a [u8]) -> Result<Self> {
        let mut parser = Parser {
            lexer: Lexer::new(source),
            lookahead: None,
        };
        parser.fill()?;
        Ok(parser)
    }

    fn fill(&mut self) -> Result<()> {
        if self.lookahead.is_none() {
            self.lookahead = Some(self.lexer.next_token()?);
        }
        Ok(())
    }

    fn peek(&mut self) -> Result<&Token> {
        self.fill()?;
        Ok(self.lookahead.as_ref().unwrap())
    }

    fn advance(&mut self) -> Result<Token> {
        self.fill()?;
        let tok = self.lookahead.take().unwrap();
        self.fill()?;
        Ok(tok)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        let tok = self.peek()?.clone();
        if tok.kind != kind {
            return Err(ParserError::ExpectedButGot {
                expected: kind.display_name().into(),
                found: tok.kind.display_name().into(),
                at: tok.start,
            }
            .into());
        }
        self.advance()
    }

    fn skip_newlines(&mut self) -> Result<()> {
        while self.peek()?.kind == TokenKind::Newline {
            self.advance()?;
        }
        Ok(())
    }

    fn skip_newlines_and_commas(&mut self) -> Result<()> {
        while matches!(self.peek()?.kind, TokenKind::Newline | TokenKind::Comma) {
            self.advance()?;
        }
        Ok(())
    }

    /// `container := mapping | list | mappingBody`, with optional leading
    /// newlines and a bare mapping body permitted at the top level.
    pub fn parse_container(&mut self) -> Result<NodeRef> {
        self.skip_newlines()?;
        match self.peek()?.kind {
            TokenKind::LeftCurly => self.parse_mapping(),
            TokenKind::LeftBracket => self.parse_list(),
            _ => self.parse_mapping_body(TokenKind::Eof),
        }
    }

    /// Confirms nothing but newlines/EOF remains after a top-level parse.
    pub fn expect_eof(&mut self) -> Result<()> {
        self.skip_newlines()?;
        let tok = self.peek()?.clone();
        if tok.kind != TokenKind::Eof {
            return Err(ParserError::Unexpected {
                found: tok.kind.display_name().into(),
                at: tok.start,
            }
            .into());
        }
        Ok(())
    }

    pub fn parse_mapping(&mut self) -> Result<NodeRef> {
        self.expect(TokenKind::LeftCurly)?;
        let body = self.parse_mapping_body(TokenKind::RightCurly)?;
        self.expect(TokenKind::RightCurly)?;
        Ok(body)
    }

    pub fn parse_list(&mut self) -> Result<NodeRef> {
        self.expect(TokenKind::LeftBracket)?;
        let body = self.parse_list_body(TokenKind::RightBracket)?;
        self.expect(TokenKind::RightBracket)?;
        Ok(body)
    }

    fn parse_mapping_body(&mut self, terminator: TokenKind) -> Result<NodeRef> {
        let mut entries = Vec::new();
        self.skip_newlines_and_commas()?;
        while self.peek()?.kind != terminator && self.peek()?.kind != TokenKind::Eof {
            let key = self.parse_key()?;
            match self.peek()?.kind {
                TokenKind::Colon | TokenKind::Assign => {
                    self.advance()?;
                }
                other => {
                    let at = self.peek()?.start;
                    return Err(ParserError::ExpectedKeyValueSeparator {
                        found: other.display_name().into(),
                        at,
                    }
                    .into());
                }
            }
            self.skip_newlines()?;
            let value = self.parse_expr()?;
            entries.push((key, value));

            let tok = self.peek()?.clone();
            if tok.kind == terminator || tok.kind == TokenKind::Eof {
                break;
            }
            if matches!(tok.kind, TokenKind::Newline | TokenKind::Comma) {
                self.skip_newlines_and_commas()?;
                continue;
            }
            return Err(ParserError::UnexpectedFollowingValue {
                found: tok.kind.display_name().into(),
                at: tok.start,
            }
            .into());
        }
        Ok(Rc::new(Node::Mapping(entries)))
    }

    fn parse_key(&mut self) -> Result<Token> {
        let tok = self.advance()?;
        match tok.kind {
            TokenKind::Word => Ok(tok),
            TokenKind::StringToken => {
                let mut text = tok.text.clone();
                let mut value = tok.text_value().to_string();
                while self.peek()?.kind == TokenKind::StringToken {
                    let next = self.advance()?;
                    text.push_str(&next.text);
                    value.push_str(next.text_value());
                }
                Ok(Token::new(TokenKind::StringToken, text, TokenValue::Text(value), tok.start, tok.end))
            }
            other => Err(ParserError::UnexpectedTypeForKey {
                found: other.display_name().into(),
                at: tok.start,
            }
            .into()),
        }
    }

    fn parse_list_body(&mut self, terminator: TokenKind) -> Result<NodeRef> {
        let mut items = Vec::new();
        self.skip_newlines_and_commas()?;
        while self.peek()?.kind.starts_expression() && self.peek()?.kind != terminator {
            let value = self.parse_expr()?;
            items.push(value);

            let tok = self.peek()?.clone();
            if tok.kind == terminator || tok.kind == TokenKind::Eof {
                break;
            }
            if matches!(tok.kind, TokenKind::Newline | TokenKind::Comma) {
                self.skip_newlines_and_commas()?;
                continue;
            }
            return Err(ParserError::UnexpectedFollowingValue {
                found: tok.kind.display_name().into(),
                at: tok.start,
            }
            .into());
        }
        Ok(Rc::new(Node::List(items)))
    }

    pub fn parse_expr(&mut self) -> Result<NodeRef> {
        let mut lhs = self.parse_and_expr()?;
        while self.peek()?.kind == TokenKind::Or {
            self.advance()?;
            let rhs = self.parse_and_expr()?;
            lhs = Rc::new(Node::Binary { op: TokenKind::Or, lhs, rhs });
        }
        Ok(lhs)
    }

    fn parse_and_expr(&mut self) -> Result<NodeRef> {
        let mut lhs = self.parse_not_expr()?;
        while self.peek()?.kind == TokenKind::And {
            self.advance()?;
            let rhs = self.parse_not_expr()?;
            lhs = Rc::new(Node::Binary { op: TokenKind::And, lhs, rhs });
        }
        Ok(lhs)
    }

    fn parse_not_expr(&mut self) -> Result<NodeRef> {
        if self.peek()?.kind == TokenKind::Not {
            self.advance()?;
            let operand = self.parse_not_expr()?;
            return Ok(Rc::new(Node::Unary { op: TokenKind::Not, operand }));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<NodeRef> {
        let lhs = self.parse_bit_or()?;
        let kind = self.peek()?.kind;
        match kind {
            TokenKind::LessThan
            | TokenKind::LessEq
            | TokenKind::GreaterThan
            | TokenKind::GreaterEq
            | TokenKind::EqEq
            | TokenKind::NotEq
            | TokenKind::LessGreater => {
                self.advance()?;
                let rhs = self.parse_bit_or()?;
                Ok(Rc::new(Node::Binary { op: kind, lhs, rhs }))
            }
            TokenKind::Is => {
                self.advance()?;
                let negate = if self.peek()?.kind == TokenKind::Not {
                    self.advance()?;
                    true
                } else {
                    false
                };
                let rhs = self.parse_bit_or()?;
                let node = Rc::new(Node::Binary { op: TokenKind::Is, lhs, rhs });
                Ok(if negate {
                    Rc::new(Node::Unary { op: TokenKind::Not, operand: node })
                } else {
                    node
                })
            }
            TokenKind::In => {
                self.advance()?;
                let rhs = self.parse_bit_or()?;
                Ok(Rc::new(Node::Binary { op: TokenKind::In, lhs, rhs }))
            }
            TokenKind::Not => {
                self.advance()?;
                self.expect(TokenKind::In)?;
                let rhs = self.parse_bit_or()?;
                let node = Rc::new(Node::Binary { op: TokenKind::In, lhs, rhs });
                Ok(Rc::new(Node::Unary { op: TokenKind::Not, operand: node }))
            }
            _ => Ok(lhs),
        }
    }

    fn parse_bit_or(&mut self) -> Result<NodeRef> {
        let mut lhs = self.parse_bit_xor()?;
        while self.peek()?.kind == TokenKind::BitwiseOr {
            self.advance()?;
            let rhs = self.parse_bit_xor()?;
            lhs = Rc::new(Node::Binary { op: TokenKind::BitwiseOr, lhs, rhs });
        }
        Ok(lhs)
    }

    fn parse_bit_xor(&mut self) -> Result<NodeRef> {
        let mut lhs = self.parse_bit_and()?;
        while self.peek()?.kind == TokenKind::BitwiseXor {
            self.advance()?;
            let rhs = self.parse_bit_and()?;
            lhs = Rc::new(Node::Binary { op: TokenKind::BitwiseXor, lhs, rhs });
        }
        Ok(lhs)
    }

    fn parse_bit_and(&mut self) -> Result<NodeRef> {
        let mut lhs = self.parse_shift()?;
        while self.peek()?.kind == TokenKind::BitwiseAnd {
            self.advance()?;
            let rhs = self.parse_shift()?;
            lhs = Rc::new(Node::Binary { op: TokenKind::BitwiseAnd, lhs, rhs });
        }
        Ok(lhs)
    }

    fn parse_shift(&mut self) -> Result<NodeRef> {
        let mut lhs = self.parse_add()?;
        loop {
            let kind = self.peek()?.kind;
            if !matches!(kind, TokenKind::LeftShift | TokenKind::RightShift) {
                break;
            }
            self.advance()?;
            let rhs = self.parse_add()?;
            lhs = Rc::new(Node::Binary { op: kind, lhs, rhs });
        }
        Ok(lhs)
    }

    fn parse_add(&mut self) -> Result<NodeRef> {
        let mut lhs = self.parse_mul()?;
        loop {
            let kind = self.peek()?.kind;
            if !matches!(kind, TokenKind::Plus | TokenKind::Minus) {
                break;
            }
            self.advance()?;
            let rhs = self.parse_mul()?;
            lhs = Rc::new(Node::Binary { op: kind, lhs, rhs });
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<NodeRef> {
        let mut lhs = self.parse_unary()?;
        loop {
            let kind = self.peek()?.kind;
            if !matches!(kind, TokenKind::Star | TokenKind::Slash | TokenKind::FloorDiv | TokenKind::Modulo) {
                break;
            }
            self.advance()?;
            let rhs = self.parse_unary()?;
            lhs = Rc::new(Node::Binary { op: kind, lhs, rhs });
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<NodeRef> {
        let kind = self.peek()?.kind;
        if matches!(
            kind,
            TokenKind::Plus | TokenKind::Minus | TokenKind::BitwiseComplement | TokenKind::At
        ) {
            self.advance()?;
            let operand = self.parse_unary()?;
            return Ok(Rc::new(Node::Unary { op: kind, operand }));
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<NodeRef> {
        let base = self.parse_primary()?;
        if self.peek()?.kind == TokenKind::Power {
            self.advance()?;
            let exponent = self.parse_unary()?;
            return Ok(Rc::new(Node::Binary { op: TokenKind::Power, lhs: base, rhs: exponent }));
        }
        Ok(base)
    }

    pub fn parse_primary(&mut self) -> Result<NodeRef> {
        let mut node = self.parse_atom()?;
        loop {
            match self.peek()?.kind {
                TokenKind::Dot => {
                    self.advance()?;
                    let word = self.expect(TokenKind::Word)?;
                    node = Rc::new(Node::Binary { op: TokenKind::Dot, lhs: node, rhs: Node::leaf(word) });
                }
                TokenKind::LeftBracket => {
                    self.advance()?;
                    let rhs = self.parse_index_or_slice()?;
                    self.expect(TokenKind::RightBracket)?;
                    node = Rc::new(Node::Binary { op: TokenKind::LeftBracket, lhs: node, rhs });
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn parse_atom(&mut self) -> Result<NodeRef> {
        let tok = self.peek()?.clone();
        match tok.kind {
            TokenKind::LeftCurly => self.parse_mapping(),
            TokenKind::LeftBracket => self.parse_list(),
            TokenKind::LeftParenthesis => {
                self.advance()?;
                self.skip_newlines()?;
                let inner = self.parse_expr()?;
                self.skip_newlines()?;
                self.expect(TokenKind::RightParenthesis)?;
                Ok(inner)
            }
            TokenKind::Dollar => {
                self.advance()?;
                self.expect(TokenKind::LeftCurly)?;
                let inner = self.parse_primary()?;
                self.expect(TokenKind::RightCurly)?;
                Ok(Rc::new(Node::Unary { op: TokenKind::Dollar, operand: inner }))
            }
            TokenKind::IntegerNumber
            | TokenKind::FloatNumber
            | TokenKind::Complex
            | TokenKind::StringToken
            | TokenKind::TrueToken
            | TokenKind::FalseToken
            | TokenKind::NoneToken
            | TokenKind::BackTick
            | TokenKind::Word => {
                self.advance()?;
                Ok(Node::leaf(tok))
            }
            _ => Err(ParserError::UnexpectedLookingForValue {
                found: tok.kind.display_name().into(),
                at: tok.start,
            }
            .into()),
        }
    }

    fn parse_index_or_slice(&mut self) -> Result<NodeRef> {
        if self.peek()?.kind == TokenKind::Colon {
            return self.parse_slice_tail(None);
        }
        let first = self.parse_expr()?;
        if self.peek()?.kind == TokenKind::Colon {
            return self.parse_slice_tail(Some(first));
        }
        if self.peek()?.kind == TokenKind::Comma {
            let mut count = 1;
            let at = self.peek()?.start;
            while self.peek()?.kind == TokenKind::Comma {
                self.advance()?;
                self.parse_expr()?;
                count += 1;
            }
            return Err(ParserError::InvalidIndexArity { count, at }.into());
        }
        Ok(first)
    }

    fn parse_slice_tail(&mut self, start: Option<NodeRef>) -> Result<NodeRef> {
        self.expect(TokenKind::Colon)?;
        let stop = if matches!(self.peek()?.kind, TokenKind::Colon | TokenKind::RightBracket) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        let step = if self.peek()?.kind == TokenKind::Colon {
            self.advance()?;
            if self.peek()?.kind == TokenKind::RightBracket {
                None
            } else {
                Some(self.parse_expr()?)
            }
        } else {
            None
        };
        Ok(Rc::new(Node::Slice { start, stop, step }))
    }
}

/// `parsePath(s)`: the source must begin with a Word and form a single
/// primary with no trailing tokens.
pub fn parse_path(source: &str) -> Result<NodeRef> {
    let mut parser = Parser::new(source.as_bytes())?;
    parser.skip_newlines()?;
    let first = parser.peek()?.clone();
    if first.kind == TokenKind::Eof {
        return Err(ParserError::ExpectedWordButGotEof { at: first.start }.into());
    }
    if first.kind != TokenKind::Word {
        return Err(ParserError::InvalidPath { text: source.to_string() }.into());
    }
    let node = parser.parse_primary()?;
    parser.skip_newlines()?;
    if parser.peek()?.kind != TokenKind::Eof {
        return Err(ParserError::InvalidPath { text: source.to_string() }.into());
    }
    Ok(node)
}

/// Validates that no mapping literal anywhere in the tree repeats a key,
/// run once over the whole AST right after parsing.
pub fn check_duplicates(root: &NodeRef, enabled: bool) -> Result<()> {
    if !enabled {
        return Ok(());
    }
    walk_duplicates(root)
}

fn walk_duplicates(node: &NodeRef) -> Result<()> {
    match node.as_ref() {
        Node::Mapping(entries) => {
            let mut seen: FxHashMap<String, Location> = FxHashMap::default();
            for (key_tok, value) in entries {
                let key = key_tok.text_value().to_string();
                if let Some(previous) = seen.get(&key) {
                    return Err(ConfigError::DuplicateKey {
                        key,
                        at: key_tok.start,
                        previous: *previous,
                    }
                    .into());
                }
                seen.insert(key, key_tok.start);
                walk_duplicates(value)?;
            }
        }
        Node::List(items) => {
            for item in items {
                walk_duplicates(item)?;
            }
        }
        Node::Unary { operand, .. } => walk_duplicates(operand)?,
        Node::Binary { lhs, rhs, .. } => {
            walk_duplicates(lhs)?;
            walk_duplicates(rhs)?;
        }
        Node::Slice { start, stop, step } => {
            if let Some(n) = start {
                walk_duplicates(n)?;
            }
            if let Some(n) = stop {
                walk_duplicates(n)?;
            }
            if let Some(n) = step {
                walk_duplicates(n)?;
            }
        }
        Node::Leaf(_) => {}
    }
    Ok(())
}

/// One step of a decomposed path, as produced by [`unpack_path`].
#[derive(Debug, Clone)]
pub enum PathStep {
    Root(String),
    Dot(String),
    Index(NodeRef),
    Slice(NodeRef),
}

pub fn unpack_path(node: &NodeRef) -> Vec<PathStep> {
    let mut steps = Vec::new();
    flatten_path(node, &mut steps);
    steps
}

fn flatten_path(node: &NodeRef, out: &mut Vec<PathStep>) {
    match node.as_ref() {
        Node::Leaf(tok) if tok.kind == TokenKind::Word => {
            out.push(PathStep::Root(tok.text_value().to_string()));
        }
        Node::Binary { op: TokenKind::Dot, lhs, rhs } => {
            flatten_path(lhs, out);
            if let Node::Leaf(tok) = rhs.as_ref() {
                out.push(PathStep::Dot(tok.text_value().to_string()));
            }
        }
        Node::Binary { op: TokenKind::LeftBracket, lhs, rhs } => {
            flatten_path(lhs, out);
            match rhs.as_ref() {
                Node::Slice { .. } => out.push(PathStep::Slice(rhs.clone())),
                _ => out.push(PathStep::Index(rhs.clone())),
            }
        }
        _ => {}
    }
}

pub fn to_source(node: &NodeRef) -> String {
    match node.as_ref() {
        Node::Leaf(tok) => tok.text.clone(),
        Node::Unary { op, operand } => format!("{}{}", op_symbol(*op), to_source(operand)),
        Node::Binary { op: TokenKind::Dot, lhs, rhs } => format!("{}.{}", to_source(lhs), to_source(rhs)),
        Node::Binary { op: TokenKind::LeftBracket, lhs, rhs } => format!("{}[{}]", to_source(lhs), to_source(rhs)),
        Node::Binary { op, lhs, rhs } => format!("{} {} {}", to_source(lhs), op_symbol(*op), to_source(rhs)),
        Node::Slice { start, stop, step } => {
            let s = start.as_ref().map(|n| to_source(n)).unwrap_or_default();
            let e = stop.as_ref().map(|n| to_source(n)).unwrap_or_default();
            match step {
                Some(st) => format!("{}:{}:{}", s, e, to_source(st)),
                None => format!("{}:{}", s, e),
            }
        }
        Node::List(items) => format!("[{}]", items.iter().map(to_source).collect::<Vec<_>>().join(", ")),
        Node::Mapping(entries) => {
            let body = entries
                .iter()
                .map(|(k, v)| format!("{}: {}", k.text_value(), to_source(v)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{{}}}", body)
        }
    }
}

fn op_symbol(op: TokenKind) -> &'static str {
    match op {
        TokenKind::Or => "or",
        TokenKind::And => "and",
        TokenKind::Not => "not ",
        TokenKind::Is => "is",
        TokenKind::In => "in",
        TokenKind::LessThan => "<",
        TokenKind::LessEq => "<=",
        TokenKind::GreaterThan => ">",
        TokenKind::GreaterEq => ">=",
        TokenKind::EqEq => "==",
        TokenKind::NotEq => "!=",
        TokenKind::LessGreater => "<>",
        TokenKind::BitwiseOr => "|",
        TokenKind::BitwiseXor => "^",
        TokenKind::BitwiseAnd => "&",
        TokenKind::LeftShift => "<<",
        TokenKind::RightShift => ">>",
        TokenKind::Plus => "+",
        TokenKind::Minus => "-",
        TokenKind::Star => "*",
        TokenKind::Slash => "/",
        TokenKind::FloorDiv => "//",
        TokenKind::Modulo => "%",
        TokenKind::Power => "**",
        TokenKind::BitwiseComplement => "~",
        TokenKind::At => "@",
        TokenKind::Dollar => "$",
        other => other.display_name(),
    }
}

/// `isIdentifier(text)`: non-digit Unicode-aware start, word characters
/// thereafter; rejects `-`, spaces, and trailing punctuation.
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if layercfg_lex::unicode::is_ident_start(c) => {}
        _ => return false,
    }
    chars.all(layercfg_lex::unicode::is_ident_continue)
}
