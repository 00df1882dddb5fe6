//! The tokenizer proper, split by token family the way the scanned
//! character decides which routine to dispatch to.

mod identifier;
mod number;
mod operator;
mod scanner;
mod string;

pub use scanner::Lexer;

#[cfg(test)]
mod tests {
    use super::Lexer;
    use crate::token::{TokenKind, TokenValue};
    use layercfg_util::Error;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src.as_bytes());
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn skips_comments_and_whitespace() {
        assert_eq!(kinds("  # a comment\n"), vec![TokenKind::Newline, TokenKind::Eof]);
    }

    #[test]
    fn scans_keywords_and_words() {
        assert_eq!(
            kinds("true false null is in not and or foo"),
            vec![
                TokenKind::TrueToken,
                TokenKind::FalseToken,
                TokenKind::NoneToken,
                TokenKind::Is,
                TokenKind::In,
                TokenKind::Not,
                TokenKind::And,
                TokenKind::Or,
                TokenKind::Word,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scans_decimal_integer() {
        let mut lexer = Lexer::new(b"123");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::IntegerNumber);
        assert_eq!(tok.value, TokenValue::Integer(123));
    }

    #[test]
    fn scans_negative_integer_fused_with_sign() {
        let mut lexer = Lexer::new(b"-42");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::IntegerNumber);
        assert_eq!(tok.value, TokenValue::Integer(-42));
    }

    #[test]
    fn scans_hex_integer() {
        let mut lexer = Lexer::new(b"0x1A");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.value, TokenValue::Integer(26));
    }

    #[test]
    fn scans_legacy_octal_integer() {
        let mut lexer = Lexer::new(b"0123");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.value, TokenValue::Integer(83));
    }

    #[test]
    fn rejects_badly_formed_octal() {
        let mut lexer = Lexer::new(b"0189");
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, Error::Tokenizer(_)));
    }

    #[test]
    fn scans_float_with_exponent() {
        let mut lexer = Lexer::new(b"1.5e-3");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::FloatNumber);
        match tok.value {
            TokenValue::Float(f) => assert!((f - 1.5e-3).abs() < 1e-12),
            _ => panic!("expected float"),
        }
    }

    #[test]
    fn scans_complex_suffix() {
        let mut lexer = Lexer::new(b"3j");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Complex);
        assert_eq!(tok.value, TokenValue::Complex(0.0, 3.0));
    }

    #[test]
    fn scans_underscore_separated_number() {
        let mut lexer = Lexer::new(b"1_000_000");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.value, TokenValue::Integer(1_000_000));
    }

    #[test]
    fn rejects_trailing_underscore() {
        let mut lexer = Lexer::new(b"1_000_");
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, Error::Tokenizer(_)));
    }

    #[test]
    fn scans_single_quoted_string() {
        let mut lexer = Lexer::new(b"'hello\\nworld'");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::StringToken);
        assert_eq!(tok.value, TokenValue::Text("hello\nworld".into()));
    }

    #[test]
    fn scans_triple_quoted_multiline_string() {
        let mut lexer = Lexer::new(b"\"\"\"line one\nline two\"\"\"");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::StringToken);
        assert_eq!(tok.value, TokenValue::Text("line one\nline two".into()));
    }

    #[test]
    fn rejects_unterminated_string() {
        let mut lexer = Lexer::new(b"'unterminated\n");
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, Error::Tokenizer(_)));
    }

    #[test]
    fn scans_back_tick_literal() {
        let mut lexer = Lexer::new(b"`$HOME`");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::BackTick);
        assert_eq!(tok.value, TokenValue::Text("$HOME".into()));
    }

    #[test]
    fn scans_multi_char_operators() {
        assert_eq!(
            kinds("== != <= >= << >> <> ** // && ||"),
            vec![
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::LessEq,
                TokenKind::GreaterEq,
                TokenKind::LeftShift,
                TokenKind::RightShift,
                TokenKind::LessGreater,
                TokenKind::Power,
                TokenKind::FloorDiv,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn dot_before_digit_starts_number() {
        let mut lexer = Lexer::new(b".5");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::FloatNumber);
    }

    #[test]
    fn dot_alone_is_punctuation() {
        assert_eq!(kinds("a.b"), vec![TokenKind::Word, TokenKind::Dot, TokenKind::Word, TokenKind::Eof]);
    }

    #[test]
    fn rejects_unexpected_character() {
        let mut lexer = Lexer::new(b";");
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err, Error::Tokenizer(_)));
    }
}
