//! Boundary behaviors: numeric literal edge cases, escapes, triple-quoted
//! strings, comments, slicing at the edges, and operator mismatches.

use layercfg::Config;

#[test]
fn legacy_leading_zero_is_octal_unless_it_holds_a_non_octal_digit() {
    let mut cfg = Config::from_source("a: 0123\n").unwrap();
    assert_eq!(cfg.get("a", None).unwrap().as_i64(), Some(83));

    let err = Config::from_source("a: 079\n");
    assert!(err.is_err());
}

#[test]
fn underscore_separators_in_numbers() {
    let mut cfg = Config::from_source("a: 1_000_000\nb: 0xFF_FF\n").unwrap();
    assert_eq!(cfg.get("a", None).unwrap().as_i64(), Some(1_000_000));
    assert_eq!(cfg.get("b", None).unwrap().as_i64(), Some(0xFFFF));

    assert!(Config::from_source("a: 1__000\n").is_err());
    assert!(Config::from_source("a: 1_\n").is_err());
    assert!(Config::from_source("a: _1\n").is_ok()); // `_1` tokenizes as a Word, not a number
}

#[test]
fn float_forms() {
    let mut cfg = Config::from_source("a: -.5\nb: .5\nc: 1e-8\n").unwrap();
    assert_eq!(cfg.get("a", None).unwrap().as_f64(), Some(-0.5));
    assert_eq!(cfg.get("b", None).unwrap().as_f64(), Some(0.5));
    assert_eq!(cfg.get("c", None).unwrap().as_f64(), Some(1e-8));
}

#[test]
fn complex_suffix() {
    let mut cfg = Config::from_source("a: 2j\n").unwrap();
    let value = cfg.get("a", None).unwrap();
    assert_eq!(value.type_name(), "complex");
}

#[test]
fn string_escapes_decode_known_forms() {
    let mut cfg = Config::from_source(r#"a: "line1\nline2\ttabbed\\\"quoted\"""#).unwrap();
    let s = cfg.get("a", None).unwrap();
    assert_eq!(s.as_str(), Some("line1\nline2\ttabbed\\\"quoted\""));
}

#[test]
fn unicode_escapes_decode_to_the_matching_scalar() {
    let mut cfg = Config::from_source(r#"a: "\x41é\U0001F600""#).unwrap();
    let s = cfg.get("a", None).unwrap();
    assert_eq!(s.as_str(), Some("A\u{e9}\u{1F600}"));
}

#[test]
fn invalid_escape_sequence_errors() {
    assert!(Config::from_source(r#"a: "\q""#).is_err());
}

#[test]
fn triple_quoted_strings_span_lines_and_preserve_inner_quotes() {
    let source = "a: '''first line\nhas a \"quote\" and a 'single' too\nsecond line'''\n";
    let mut cfg = Config::from_source(source).unwrap();
    let value = cfg.get("a", None).unwrap();
    let text = value.as_str().unwrap();
    assert!(text.contains("has a \"quote\" and a 'single' too"));
    assert!(text.contains('\n'));
}

#[test]
fn unterminated_string_is_an_error() {
    assert!(Config::from_source("a: \"unterminated\n").is_err());
}

#[test]
fn comments_on_their_own_line_and_trailing_a_value() {
    let source = "# a leading comment\na: 1 # trailing comment\n# another\nb: 2\n";
    let mut cfg = Config::from_source(source).unwrap();
    assert_eq!(cfg.get("a", None).unwrap().as_i64(), Some(1));
    assert_eq!(cfg.get("b", None).unwrap().as_i64(), Some(2));
}

#[test]
fn slicing_at_the_exact_boundaries() {
    let mut cfg = Config::from_source("list: [0, 1, 2, 3]\n").unwrap();
    let ints = |v: layercfg::ConfigValue| -> Vec<i64> {
        v.as_list().unwrap().iter().map(|e| e.as_i64().unwrap()).collect()
    };

    assert_eq!(ints(cfg.get("list[0:4]", None).unwrap()), vec![0, 1, 2, 3]);
    assert_eq!(ints(cfg.get("list[-4:4]", None).unwrap()), vec![0, 1, 2, 3]);
    assert_eq!(ints(cfg.get("list[-5:4]", None).unwrap()), vec![0, 1, 2, 3]);
    assert_eq!(ints(cfg.get("list[0:10]", None).unwrap()), vec![0, 1, 2, 3]);
}

#[test]
fn out_of_range_subscript_is_an_error() {
    let mut cfg = Config::from_source("list: [0, 1, 2]\n").unwrap();
    assert!(cfg.get("list[3]", None).is_err());
    assert!(cfg.get("list[-4]", None).is_err());
    assert!(cfg.get("list[2]", None).is_ok());
    assert!(cfg.get("list[-3]", None).is_ok());
}

#[test]
fn operator_mismatch_reports_both_kinds() {
    let mut cfg = Config::from_source("a: 1 + \"x\"\n").unwrap();
    let err = cfg.get("a", None).unwrap_err().to_string();
    assert!(err.starts_with("cannot "));
    assert!(err.contains("integer"));
    assert!(err.contains("string"));
}

#[test]
fn division_by_zero_is_an_operator_error_not_a_panic() {
    let mut cfg = Config::from_source("a: 1 // 0\n").unwrap();
    assert!(cfg.get("a", None).is_err());

    let mut cfg = Config::from_source("a: 1 % 0\n").unwrap();
    assert!(cfg.get("a", None).is_err());
}

#[test]
fn slicing_an_empty_list_does_not_panic() {
    let mut cfg = Config::from_source("a: []\n").unwrap();
    let full = cfg.get("a[:]", None).unwrap();
    assert_eq!(full.as_list(), Some(&[][..]));
    assert_eq!(cfg.get("a[::-1]", None).unwrap().as_list(), Some(&[][..]));
}

#[test]
fn slash_division_always_returns_float() {
    let mut cfg = Config::from_source("a: 4 / 2\n").unwrap();
    let value = cfg.get("a", None).unwrap();
    assert_eq!(value.type_name(), "float");
    assert_eq!(value.as_f64(), Some(2.0));
}
