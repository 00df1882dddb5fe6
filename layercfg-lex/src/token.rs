//! Token and token-kind definitions produced by the tokenizer.

use layercfg_util::Location;

/// The closed set of token kinds the tokenizer can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Eof,
    Newline,
    Word,
    IntegerNumber,
    FloatNumber,
    Complex,
    StringToken,
    BackTick,
    TrueToken,
    FalseToken,
    NoneToken,

    // Keywords that participate in the expression grammar as operators.
    Is,
    In,
    Not,
    And,
    Or,

    // Punctuation / single-character operators.
    Colon,
    Minus,
    Plus,
    Star,
    Slash,
    Modulo,
    Comma,
    Dot,
    LeftCurly,
    RightCurly,
    LeftBracket,
    RightBracket,
    LeftParenthesis,
    RightParenthesis,
    At,
    Assign,
    Dollar,
    LessThan,
    GreaterThan,
    BangNot,
    BitwiseComplement,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,

    // Multi-character operators.
    EqEq,
    NotEq,
    LessEq,
    GreaterEq,
    LeftShift,
    RightShift,
    LessGreater,
    Power,
    FloorDiv,
    AndAnd,
    OrOr,
}

impl TokenKind {
    /// Short name used in error messages ("expected X but got Y").
    pub fn display_name(self) -> &'static str {
        match self {
            TokenKind::Eof => "EOF",
            TokenKind::Newline => "Newline",
            TokenKind::Word => "Word",
            TokenKind::IntegerNumber => "IntegerNumber",
            TokenKind::FloatNumber => "FloatNumber",
            TokenKind::Complex => "Complex",
            TokenKind::StringToken => "StringToken",
            TokenKind::BackTick => "BackTick",
            TokenKind::TrueToken => "TrueToken",
            TokenKind::FalseToken => "FalseToken",
            TokenKind::NoneToken => "NoneToken",
            TokenKind::Is => "Is",
            TokenKind::In => "In",
            TokenKind::Not => "Not",
            TokenKind::And => "And",
            TokenKind::Or => "Or",
            TokenKind::Colon => "Colon",
            TokenKind::Minus => "Minus",
            TokenKind::Plus => "Plus",
            TokenKind::Star => "Star",
            TokenKind::Slash => "Slash",
            TokenKind::Modulo => "Modulo",
            TokenKind::Comma => "Comma",
            TokenKind::Dot => "Dot",
            TokenKind::LeftCurly => "LeftCurly",
            TokenKind::RightCurly => "RightCurly",
            TokenKind::LeftBracket => "LeftBracket",
            TokenKind::RightBracket => "RightBracket",
            TokenKind::LeftParenthesis => "LeftParenthesis",
            TokenKind::RightParenthesis => "RightParenthesis",
            TokenKind::At => "At",
            TokenKind::Assign => "Assign",
            TokenKind::Dollar => "Dollar",
            TokenKind::LessThan => "LessThan",
            TokenKind::GreaterThan => "GreaterThan",
            TokenKind::BangNot => "Not",
            TokenKind::BitwiseComplement => "BitwiseComplement",
            TokenKind::BitwiseAnd => "BitwiseAnd",
            TokenKind::BitwiseOr => "BitwiseOr",
            TokenKind::BitwiseXor => "BitwiseXor",
            TokenKind::EqEq => "Eq",
            TokenKind::NotEq => "NotEq",
            TokenKind::LessEq => "LessEq",
            TokenKind::GreaterEq => "GreaterEq",
            TokenKind::LeftShift => "LeftShift",
            TokenKind::RightShift => "RightShift",
            TokenKind::LessGreater => "AltUnequal",
            TokenKind::Power => "Power",
            TokenKind::FloorDiv => "FloorDiv",
            TokenKind::AndAnd => "AndAnd",
            TokenKind::OrOr => "OrOr",
        }
    }

    /// Whether a token of this kind can begin an expression. Used to decide
    /// when a list/mapping body has run out of elements.
    pub fn starts_expression(self) -> bool {
        !matches!(
            self,
            TokenKind::Eof
                | TokenKind::Newline
                | TokenKind::Comma
                | TokenKind::RightCurly
                | TokenKind::RightBracket
                | TokenKind::RightParenthesis
                | TokenKind::Colon
                | TokenKind::Assign
        )
    }
}

/// The payload carried by a token, selected by `Token::kind`.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenValue {
    None,
    Text(String),
    Integer(i64),
    Float(f64),
    Complex(f64, f64),
    Bool(bool),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub value: TokenValue,
    pub start: Location,
    pub end: Location,
}

impl Token {
    pub fn new(kind: TokenKind, text: String, value: TokenValue, start: Location, end: Location) -> Self {
        Self {
            kind,
            text,
            value,
            start,
            end,
        }
    }

    pub fn text_value(&self) -> &str {
        match &self.value {
            TokenValue::Text(s) => s,
            _ => &self.text,
        }
    }
}
