//! Integration tests for objects, records and tuples.

use serde_json::json;
use shapeguard::prelude::*;
use shapeguard::{IssueCode, IssueKind, ObjectSchema, SchemaError, UnknownKeys};

fn person() -> ObjectSchema {
    object()
        .field("id", string().uuid())
        .field("name", string().min(1))
        .field("age", int().non_negative())
}

// === Unknown Keys ===

mod unknown_keys {
    use super::*;

    #[test]
    fn strip_is_the_default() {
        assert!(matches!(person().unknown_keys(), UnknownKeys::Strip));
        let out = object()
            .field("a", number())
            .parse(json!({ "a": 1, "b": 2 }))
            .unwrap();
        assert_eq!(out.to_json(), json!({ "a": 1 }));
    }

    #[test]
    fn passthrough_keeps_unknown_keys() {
        let out = object()
            .field("a", number())
            .passthrough()
            .parse(json!({ "a": 1, "b": "x" }))
            .unwrap();
        assert_eq!(out.to_json(), json!({ "a": 1, "b": "x" }));
    }

    #[test]
    fn catchall_parses_unknown_keys() {
        let s = object().field("a", number()).catchall(boolean());
        assert!(s.parse(json!({ "a": 1, "flag": true })).is_ok());
        let err = s.parse(json!({ "a": 1, "flag": "yes" })).unwrap_err();
        assert_eq!(err.first().pointer(), "/flag");
        assert_eq!(err.first().code(), IssueCode::InvalidType);
    }

    #[test]
    fn strict_lists_every_extra_key() {
        let err = object()
            .field("a", number())
            .strict()
            .parse(json!({ "a": 1, "x": 1, "y": 2 }))
            .unwrap_err();
        match &err.first().kind {
            IssueKind::UnrecognisedKeys { keys } => assert_eq!(keys, &["x", "y"]),
            other => panic!("unexpected kind: {:?}", other),
        }
    }
}

// === Operators ===

mod operators {
    use super::*;

    #[test]
    fn pick_and_omit() {
        let picked = person().pick(["name"]).unwrap();
        assert_eq!(picked.keys(), vec!["name"]);

        let omitted = person().omit(["id", "age"]).unwrap();
        assert_eq!(omitted.keys(), vec!["name"]);
        assert!(omitted.parse(json!({ "name": "Ann" })).is_ok());
    }

    #[test]
    fn unknown_key_is_a_schema_error() {
        assert_eq!(
            person().pick(["missing"]).unwrap_err(),
            SchemaError::UnknownKey {
                key: "missing".into()
            }
        );
        assert!(person().omit(["nope"]).is_err());
        assert!(person().partial_keys(["nope"]).is_err());
    }

    #[test]
    fn partial_and_required() {
        let partial = person().partial();
        assert_eq!(partial.parse(json!({})).unwrap().to_json(), json!({}));

        let required = partial.required();
        let err = required.parse(json!({})).unwrap_err();
        assert_eq!(err.len(), 3);

        let some = person().partial_keys(["age"]).unwrap();
        let err = some.parse(json!({ "name": "Ann" })).unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err.first().pointer(), "/id");
    }

    #[test]
    fn extend_and_merge() {
        let extended = person().extend([("email", string().email())]);
        assert_eq!(extended.keys(), vec!["id", "name", "age", "email"]);

        let other = object().field("age", string()).strict();
        let merged = person().merge(&other);
        assert!(matches!(merged.unknown_keys(), UnknownKeys::Strict));
        assert_eq!(merged.shape()["age"].kind(), shapeguard::SchemaKind::String);
    }

    #[test]
    fn key_of_enumerates_fields() {
        let keys = person().key_of();
        assert!(keys.parse("name").is_ok());
        assert_eq!(
            keys.parse("email").unwrap_err().first().code(),
            IssueCode::InvalidValue
        );
    }

    #[test]
    fn operators_leave_the_source_untouched() {
        let base = person();
        let _ = base.partial();
        let _ = base.clone().strict();
        let _ = base.clone().field("extra", number());
        assert_eq!(base.keys(), vec!["id", "name", "age"]);
        assert!(matches!(base.unknown_keys(), UnknownKeys::Strip));
    }
}

// === Missing Fields ===

mod missing_fields {
    use super::*;

    #[test]
    fn optional_fields_are_omitted() {
        let s = object().field("a", number().optional());
        let out = s.parse(json!({})).unwrap();
        assert!(out.get("a").is_none());
    }

    #[test]
    fn nilable_fields_become_null() {
        let s = object().field("a", number().nilable());
        let out = s.parse(json!({})).unwrap();
        assert_eq!(out.get("a"), Some(&Value::Null));
    }

    #[test]
    fn default_fields_are_filled() {
        let s = object().field("a", number().default(5));
        assert_eq!(s.parse(json!({})).unwrap().to_json(), json!({ "a": 5 }));
    }

    #[test]
    fn any_and_unknown_fields_stay_absent() {
        let s = object()
            .field("a", any())
            .field("b", unknown().readonly())
            .field("c", number());
        let out = s.parse(json!({ "c": 1 })).unwrap();
        assert_eq!(out.to_json(), json!({ "c": 1 }));
        let out = s.parse(json!({ "a": null, "c": 1 })).unwrap();
        assert_eq!(out.to_json(), json!({ "a": null, "c": 1 }));
    }
}

// === Records ===

mod records {
    use super::*;

    #[test]
    fn key_schema_validates_keys() {
        let s = record(string().min(2), number());
        let err = s.parse(json!({ "ok": 1, "x": 2 })).unwrap_err();
        assert_eq!(err.first().code(), IssueCode::InvalidKey);
        assert_eq!(err.first().pointer(), "/x");
    }

    #[test]
    fn enum_keys_are_exhaustive() {
        let s = record(enumeration(["a", "b"]), number());
        assert!(s.parse(json!({ "a": 1, "b": 2 })).is_ok());

        let err = s.parse(json!({ "a": 1 })).unwrap_err();
        assert_eq!(err.first().pointer(), "/b");

        let err = s.parse(json!({ "a": 1, "b": 2, "c": 3 })).unwrap_err();
        assert_eq!(err.first().code(), IssueCode::UnrecognisedKeys);
    }
}

// === Tuples ===

mod tuples {
    use super::*;

    #[test]
    fn fixed_length() {
        let s = tuple([Schema::from(string()), number().into()]);
        assert!(s.parse(json!(["a", 1])).is_ok());
        assert_eq!(
            s.parse(json!(["a"])).unwrap_err().first().code(),
            IssueCode::TooSmall
        );
        assert_eq!(
            s.parse(json!(["a", 1, 2])).unwrap_err().first().code(),
            IssueCode::TooBig
        );
        assert_eq!(s.parse(json!([1, 1])).unwrap_err().first().pointer(), "/0");
    }

    #[test]
    fn rest_and_optional_tail() {
        let s = tuple([Schema::from(string()), number().optional()]).rest(boolean());
        assert!(s.parse(json!(["a"])).is_ok());
        assert!(s.parse(json!(["a", 1, true, false])).is_ok());
        assert_eq!(
            s.parse(json!(["a", 1, "x"])).unwrap_err().first().pointer(),
            "/2"
        );
    }

    #[test]
    fn missing_fallback_items_are_filled() {
        let s = tuple([
            Schema::from(string()),
            number().optional().into(),
            number().default(0),
        ]);
        let parsed = |input: serde_json::Value| s.parse(input).unwrap().to_json();
        assert_eq!(parsed(json!(["a"])), json!(["a", null, 0]));
        assert_eq!(parsed(json!(["a", 2])), json!(["a", 2, 0]));
        assert_eq!(parsed(json!(["a", 2, 3])), json!(["a", 2, 3]));
        assert_eq!(
            s.parse(json!([])).unwrap_err().first().code(),
            IssueCode::TooSmall
        );

        let prefaulted = tuple([Schema::from(string()), string().min(2).prefault("x")]);
        let err = prefaulted.parse(json!(["a"])).unwrap_err();
        assert_eq!(err.first().code(), IssueCode::TooSmall);
        assert_eq!(err.first().pointer(), "/1");
    }
}
