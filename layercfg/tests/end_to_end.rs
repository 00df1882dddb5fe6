//! End-to-end scenarios exercising the full pipeline: decode, tokenize,
//! parse, evaluate. Each test below corresponds to one worked example in
//! the format's reference documentation.

use layercfg::{Config, ConfigValue, Error};
use std::io::Write;

#[test]
fn integer_parsing_and_radix() {
    let source = "root: 1\n\
stream: 1.7\n\
neg: -1\n\
posexponent: 2.0999999e-08\n\
hexadecimal_integer: 0x123\n\
binary_integer: 0b000100100011\n\
octal_integer: 0o123\n";
    let mut cfg = Config::from_source(source).unwrap();

    assert_eq!(cfg.get("root", None).unwrap().as_i64(), Some(1));
    assert_eq!(cfg.get("neg", None).unwrap().as_i64(), Some(-1));
    assert_eq!(cfg.get("hexadecimal_integer", None).unwrap().as_i64(), Some(0x123));
    assert_eq!(cfg.get("binary_integer", None).unwrap().as_i64(), Some(0x123));
    assert_eq!(cfg.get("octal_integer", None).unwrap().as_i64(), Some(83));

    let stream = cfg.get("stream", None).unwrap().as_f64().unwrap();
    assert!((stream - 1.7).abs() < 1e-9);
    let posexponent = cfg.get("posexponent", None).unwrap().as_f64().unwrap();
    assert!((posexponent - 2.0999999e-08).abs() < 1e-15);
}

#[test]
fn include_resolves_and_merges_from_search_path() {
    let dir = tempfile::tempdir().unwrap();
    let base_dir = dir.path().join("base");
    std::fs::create_dir(&base_dir).unwrap();

    let mut logging = std::fs::File::create(base_dir.join("logging.cfg")).unwrap();
    writeln!(
        logging,
        "appenders: {{ file: {{ filename: \"run/server.log\" }} }}"
    )
    .unwrap();

    let main_path = dir.path().join("main.cfg");
    std::fs::write(&main_path, "logging: @\"logging.cfg\"\n").unwrap();

    let mut cfg = Config::builder()
        .include_path(vec![base_dir])
        .load_file(&main_path)
        .unwrap();

    let filename = cfg.get("logging.appenders.file.filename", None).unwrap();
    assert_eq!(filename.as_str(), Some("run/server.log"));
}

#[test]
fn reference_and_interpolation_concatenate_strings() {
    let source = "a: 'Hello, '\nb: 'world!'\nc: { greeting: `${a}${b}` }\n";
    let mut cfg = Config::from_source(source).unwrap();

    let greeting = cfg.get("c.greeting", None).unwrap();
    assert_eq!(greeting.as_str(), Some("Hello, world!"));
}

#[test]
fn slicing_matches_the_worked_examples() {
    let source = "test_list: [a, b, c, d, e, f, g]\n";
    let mut cfg = Config::from_source(source).unwrap();

    let as_strings = |v: ConfigValue| -> Vec<String> {
        v.as_list()
            .unwrap()
            .iter()
            .map(|e| e.as_str().unwrap().to_string())
            .collect()
    };

    let full: Vec<String> = vec!["a", "b", "c", "d", "e", "f", "g"].into_iter().map(String::from).collect();

    assert_eq!(as_strings(cfg.get("test_list[:]", None).unwrap()), full);
    assert_eq!(as_strings(cfg.get("test_list[::]", None).unwrap()), full);
    assert_eq!(as_strings(cfg.get("test_list[:20]", None).unwrap()), full);

    assert_eq!(
        as_strings(cfg.get("test_list[-2:2:-1]", None).unwrap()),
        vec!["f", "e", "d"]
    );
    assert_eq!(
        as_strings(cfg.get("test_list[::-1]", None).unwrap()),
        vec!["g", "f", "e", "d", "c", "b", "a"]
    );
    assert_eq!(
        as_strings(cfg.get("test_list[::2][::3]", None).unwrap()),
        vec!["a", "g"]
    );
}

#[test]
fn duplicate_top_level_keys_are_rejected_with_both_locations() {
    let source = "foo: 1\nbar: 2\nbaz: 3\nfoo: 4\n";
    let err = Config::from_source(source).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("duplicate key foo"));
    assert!(message.contains("(4, 1)"));
    assert!(message.contains("(1, 1)"));
}

#[test]
fn circular_references_are_detected_within_a_single_get() {
    let source = "circ_map:\n  a: ${circ_map.b}\n  b: ${circ_map.c}\n  c: ${circ_map.a}\n";
    let mut cfg = Config::from_source(source).unwrap();

    let err = cfg.get("circ_map.a", None).unwrap_err();
    match err {
        Error::Config(config_err) => {
            let message = config_err.to_string();
            assert!(message.starts_with("circular reference:"));
        }
        other => panic!("expected a ConfigError, got {other:?}"),
    }
}

#[test]
fn get_is_idempotent_once_cached() {
    let mut cfg = Config::from_source("a: { b: 1, c: [1, 2, 3] }\n").unwrap();
    let first = cfg.get("a", None).unwrap();
    let second = cfg.get("a", None).unwrap();
    assert_eq!(first.textual_form(), second.textual_form());
}

#[test]
fn deep_merge_is_associative_over_distinct_leaves() {
    let mut ab = Config::from_source("x: { a: 1 } + { b: 2 }\n").unwrap();
    let mut bc = Config::from_source("x: { b: 2 } + { c: 3 }\n").unwrap();
    let left_then_right = {
        let mut cfg = Config::from_source("x: ({ a: 1 } + { b: 2 }) + { c: 3 }\n").unwrap();
        cfg.get("x", None).unwrap().textual_form()
    };
    let right_then_left = {
        let mut cfg = Config::from_source("x: { a: 1 } + ({ b: 2 } + { c: 3 })\n").unwrap();
        cfg.get("x", None).unwrap().textual_form()
    };
    assert_eq!(left_then_right, right_then_left);
    // sanity: the two partial merges above actually parsed and evaluated.
    assert!(ab.get("x", None).is_ok());
    assert!(bc.get("x", None).is_ok());
}

#[test]
fn get_sub_config_returns_a_queryable_child() {
    let source = "outer: { inner: { value: 42 } }\n";
    let mut cfg = Config::from_source(source).unwrap();
    let mut sub = cfg.get_sub_config("outer.inner").unwrap();
    assert_eq!(sub.get("value", None).unwrap().as_i64(), Some(42));
}

#[test]
fn environment_backtick_falls_back_to_default() {
    std::env::remove_var("LAYERCFG_E2E_UNSET");
    let mut cfg = Config::from_source("value: `$LAYERCFG_E2E_UNSET|fallback`\n").unwrap();
    assert_eq!(cfg.get("value", None).unwrap().as_str(), Some("fallback"));
}
