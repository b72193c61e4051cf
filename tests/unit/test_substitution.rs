//! Unit tests for the substitution engine
//!
//! Tests cover:
//! - Key path addressing (case, arrays, nesting)
//! - Type preservation for every leaf kind
//! - All-or-nothing rollback
//! - Output formatting

use json_stamp::errors::{PathError, SubstitutionError, VariableError};
use json_stamp::substitution::{JsonSubstituter, LeafKind, SubstitutionOutcome, TypeDetection};
use json_stamp::variables::Variables;
use serde_json::{json, Value};

fn vars(pairs: &[(&str, &str)]) -> Variables {
    pairs.iter().copied().collect()
}

fn compact() -> JsonSubstituter {
    JsonSubstituter::default().with_pretty(false)
}

fn run(source: &str, pairs: &[(&str, &str)]) -> SubstitutionOutcome {
    compact().substitute(&vars(pairs), source)
}

fn parsed(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}

// ============================================================================
// Addressing
// ============================================================================

mod addressing_tests {
    use super::*;

    #[test]
    fn test_case_insensitive_segments() {
        let out = run(r#"{"Logging": {"LogLevel": {"Default": "Debug"}}}"#, &[(
            "logging.loglevel.DEFAULT",
            "Warning",
        )]);
        assert!(out.was_substituted);
        assert_eq!(out.text, r#"{"Logging":{"LogLevel":{"Default":"Warning"}}}"#);
    }

    #[test]
    fn test_exact_name_wins_over_case_insensitive_match() {
        let out = run(r#"{"foo": 1, "Foo": 2}"#, &[("Foo", "3")]);
        assert_eq!(out.text, r#"{"foo":1,"Foo":3}"#);
    }

    #[test]
    fn test_first_case_insensitive_match_in_document_order() {
        let out = run(r#"{"foo": 1, "Foo": 2}"#, &[("FOO", "3")]);
        assert_eq!(out.text, r#"{"foo":3,"Foo":2}"#);
    }

    #[test]
    fn test_array_element() {
        let out = run(r#"{"Foo":[58,96,15,0]}"#, &[("foo.1", "1259")]);
        assert!(out.was_substituted);
        assert_eq!(parsed(&out.text), json!({"Foo": [58, 1259, 15, 0]}));
    }

    #[test]
    fn test_nested_property() {
        let out = run(
            r#"{"Foo": {"Prop1": "value", "Prop2": 2}}"#,
            &[("foo.prop1", "injected value")],
        );
        assert_eq!(
            parsed(&out.text),
            json!({"Foo": {"Prop1": "injected value", "Prop2": 2}})
        );
    }

    #[test]
    fn test_array_of_objects() {
        let source = r#"{"Foo": [{"Bar": 1}, {"Bar": 2}, {"Bar": 3}]}"#;
        let out = run(source, &[("foo.2.bar", "30")]);
        assert_eq!(
            parsed(&out.text),
            json!({"Foo": [{"Bar": 1}, {"Bar": 2}, {"Bar": 30}]})
        );
    }

    #[test]
    fn test_nested_arrays() {
        let out = run(r#"{"Grid": [[1, 2], [3, 4]]}"#, &[("grid.1.0", "30")]);
        assert_eq!(parsed(&out.text), json!({"Grid": [[1, 2], [30, 4]]}));
    }

    #[test]
    fn test_root_array() {
        let out = run("[1, 2, 3]", &[("2", "30")]);
        assert_eq!(out.text, "[1,2,30]");
    }

    #[test]
    fn test_scalar_root_never_matches() {
        let out = run("42", &[("foo", "1")]);
        assert!(!out.was_substituted);
        assert!(!out.is_failed());
        assert_eq!(out.text, "42");
    }

    #[test]
    fn test_unknown_path_is_skipped() {
        let source = r#"{"Foo": 1}"#;
        let out = run(source, &[("bar", "2"), ("foo.missing", "3"), ("Baz.Qux", "4")]);
        // foo.missing stops at the scalar Foo, trailing segments ignored
        assert!(out.was_substituted);
        assert_eq!(out.text, r#"{"Foo":3}"#);
    }

    #[test]
    fn test_nothing_matched_returns_source() {
        let source = "{ \"Foo\" : 1 }";
        let out = run(source, &[("bar", "2")]);
        assert!(!out.was_substituted);
        assert!(out.failure.is_none());
        assert_eq!(out.text, source);
    }

    #[test]
    fn test_path_ending_on_container_is_skipped() {
        let source = r#"{"Foo": {"Bar": 1}, "List": [1]}"#;
        let out = run(source, &[("foo", "x"), ("list", "y")]);
        assert!(!out.was_substituted);
        assert_eq!(out.text, source);
    }

    #[test]
    fn test_invalid_index_rolls_back() {
        let source = r#"{"Foo": [1, 2]}"#;
        let out = run(source, &[("foo.first", "3")]);
        assert!(!out.was_substituted);
        assert_eq!(out.text, source);
        match out.failure {
            Some(SubstitutionError::Variable {
                key,
                source: VariableError::Path(PathError::InvalidIndex { segment }),
            }) => {
                assert_eq!(key, "foo.first");
                assert_eq!(segment, "first");
            }
            other => panic!("unexpected failure: {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_rolls_back() {
        let source = r#"{"Foo": [1, 2]}"#;
        let out = run(source, &[("foo.0", "5"), ("foo.2", "3")]);
        assert!(!out.was_substituted);
        assert_eq!(out.text, source);
        assert!(matches!(
            out.failure,
            Some(SubstitutionError::Variable {
                source: VariableError::Path(PathError::IndexOutOfRange { index: 2, len: 2 }),
                ..
            })
        ));
    }
}

// ============================================================================
// Type preservation
// ============================================================================

mod conversion_tests {
    use super::*;

    #[test]
    fn test_integer() {
        let out = run(r#"{"Foo": 22}"#, &[("foo", "11")]);
        assert_eq!(out.text, r#"{"Foo":11}"#);
    }

    #[test]
    fn test_negative_integer_with_whitespace() {
        let out = run(r#"{"Foo": 22}"#, &[("foo", " -7 ")]);
        assert_eq!(out.text, r#"{"Foo":-7}"#);
    }

    #[test]
    fn test_boolean() {
        let out = run(r#"{"Foo": true, "Bar": 25}"#, &[("foo", "False")]);
        assert_eq!(out.text, r#"{"Foo":false,"Bar":25}"#);
    }

    #[test]
    fn test_float() {
        let out = run(r#"{"Ratio": 0.5}"#, &[("ratio", "1.25")]);
        assert_eq!(parsed(&out.text), json!({"Ratio": 1.25}));
    }

    #[test]
    fn test_string_stays_string() {
        let out = run(r#"{"Port": "80"}"#, &[("port", "8080")]);
        assert_eq!(out.text, r#"{"Port":"8080"}"#);
    }

    #[test]
    fn test_null_becomes_string() {
        let out = run(r#"{"Name": null}"#, &[("name", "svc")]);
        assert_eq!(out.text, r#"{"Name":"svc"}"#);
    }

    #[test]
    fn test_date_time_is_normalized() {
        let out = run(
            r#"{"Start": "2020-01-01T10:00:00Z"}"#,
            &[("start", "2021-06-15T08:30:00+02:00")],
        );
        assert_eq!(out.text, r#"{"Start":"2021-06-15T08:30:00+02:00"}"#);
    }

    #[test]
    fn test_invalid_date_time_rolls_back() {
        let source = r#"{"Start": "2020-01-01T10:00:00Z"}"#;
        let out = run(source, &[("start", "tomorrow")]);
        assert_eq!(out.text, source);
        assert!(out.is_failed());
    }

    #[test]
    fn test_date_detection_can_be_disabled() {
        let substituter = compact().with_detection(TypeDetection::none());
        let out = substituter.substitute(
            &vars(&[("start", "tomorrow")]),
            r#"{"Start": "2020-01-01T10:00:00Z"}"#,
        );
        assert_eq!(out.text, r#"{"Start":"tomorrow"}"#);
    }

    #[test]
    fn test_uuid_with_detection() {
        let substituter = compact().with_detection(TypeDetection::all());
        let out = substituter.substitute(
            &vars(&[("id", "{6F9619FF-8B86-D011-B42D-00CF4FC964FF}")]),
            r#"{"Id": "00000000-0000-0000-0000-000000000000"}"#,
        );
        assert_eq!(out.text, r#"{"Id":"6f9619ff-8b86-d011-b42d-00cf4fc964ff"}"#);
    }

    #[test]
    fn test_uuid_rejects_garbage() {
        let substituter = compact().with_detection(TypeDetection::all());
        let source = r#"{"Id": "00000000-0000-0000-0000-000000000000"}"#;
        let out = substituter.substitute(&vars(&[("id", "not-a-guid")]), source);
        assert_eq!(out.text, source);
        assert!(out.is_failed());
    }

    #[test]
    fn test_duration_with_detection() {
        let substituter = compact().with_detection(TypeDetection::all());
        let out = substituter.substitute(
            &vars(&[("timeout", "1.2:3:4")]),
            r#"{"Timeout": "00:00:30"}"#,
        );
        assert_eq!(out.text, r#"{"Timeout":"1.02:03:04"}"#);
    }

    #[test]
    fn test_numeric_string_is_not_a_duration() {
        let substituter = compact().with_detection(TypeDetection::all());
        let out = substituter.substitute(&vars(&[("port", "abc")]), r#"{"Port": "8080"}"#);
        assert!(out.was_substituted);
        assert!(!out.is_failed());
        assert_eq!(out.text, r#"{"Port":"abc"}"#);
    }

    #[test]
    fn test_nested_array_element_is_never_replaced() {
        let source = r#"{"Grid": [[1, 2], [3]]}"#;
        let out = run(source, &[("grid.0", "flat")]);
        assert!(!out.was_substituted);
        assert!(!out.is_failed());
        assert_eq!(out.text, source);

        let out = run(source, &[("grid.0", "flat"), ("grid.1.0", "30")]);
        assert_eq!(out.text, r#"{"Grid":[[1,2],[30]]}"#);
    }

    #[test]
    fn test_leaf_kind_table() {
        assert!(LeafKind::Integer.converter().is_some());
        assert!(LeafKind::Null.converter().is_some());
        assert!(LeafKind::Object.converter().is_none());
        assert!(LeafKind::Array.converter().is_none());
    }
}

// ============================================================================
// Atomicity and formatting
// ============================================================================

mod atomicity_tests {
    use super::*;

    #[test]
    fn test_conversion_failure_returns_source() {
        let source = r#"{"Foo":22}"#;
        let out = run(source, &[("foo", "notAnInt")]);
        assert!(!out.was_substituted);
        assert_eq!(out.text, source);
        let failure = out.failure.expect("failure recorded");
        assert_eq!(failure.key(), Some("foo"));
        assert!(matches!(
            failure,
            SubstitutionError::Variable {
                source: VariableError::Conversion(_),
                ..
            }
        ));
    }

    #[test]
    fn test_earlier_entries_are_rolled_back() {
        let source = r#"{"Name": "a", "Port": 80}"#;
        let out = run(source, &[("name", "b"), ("port", "eighty")]);
        assert!(!out.was_substituted);
        assert_eq!(out.text, source);
    }

    #[test]
    fn test_malformed_input() {
        let source = r#"{"Foo": "#;
        let out = run(source, &[("foo", "1")]);
        assert!(!out.was_substituted);
        assert_eq!(out.text, source);
        assert!(matches!(out.failure, Some(SubstitutionError::Parse(_))));
    }

    #[test]
    fn test_try_substitute_reports_no_match() {
        let result = compact()
            .try_substitute(&vars(&[("bar", "1")]), r#"{"Foo": 1}"#)
            .unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_multiple_entries_in_one_pass() {
        let out = run(
            r#"{"A": 1, "B": {"C": false}, "D": ["x", "y"]}"#,
            &[("a", "2"), ("b.c", "true"), ("d.1", "z")],
        );
        assert_eq!(out.text, r#"{"A":2,"B":{"C":true},"D":["x","z"]}"#);
    }

    #[test]
    fn test_reapplying_equal_values_reports_substituted() {
        let first = run(r#"{"Foo": 22}"#, &[("foo", "11")]);
        let second = run(&first.text, &[("foo", "11")]);
        assert!(second.was_substituted);
        assert_eq!(second.text, first.text);
    }

    #[test]
    fn test_deterministic() {
        let source = r#"{"Z": 1, "A": {"M": [1, 2]}, "B": "x"}"#;
        let pairs = [("a.m.0", "5"), ("b", "y")];
        let first = run(source, &pairs);
        let second = run(source, &pairs);
        assert_eq!(first.text, second.text);
        // Property order is preserved
        assert_eq!(first.text, r#"{"Z":1,"A":{"M":[5,2]},"B":"y"}"#);
    }

    #[test]
    fn test_pretty_output_by_default() {
        let out = JsonSubstituter::default().substitute(&vars(&[("foo", "2")]), r#"{"Foo":1}"#);
        assert_eq!(out.text, "{\n  \"Foo\": 2\n}");
    }

    #[test]
    fn test_bom_and_trailing_newline_preserved() {
        let source = "\u{feff}{\"Foo\": 1}\n";
        let out = run(source, &[("foo", "2")]);
        assert_eq!(out.text, "\u{feff}{\"Foo\":2}\n");
    }

    #[test]
    fn test_substituter_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<JsonSubstituter>();
    }
}
