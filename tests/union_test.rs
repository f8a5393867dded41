//! Integration tests for unions and intersections.

use serde_json::json;
use shapeguard::prelude::*;
use shapeguard::{IssueCode, IssueKind, SchemaError, SchemaKind};

fn shapes() -> Schema {
    discriminated_union(
        "type",
        [
            object()
                .field("type", literal("circle"))
                .field("radius", number().positive()),
            object()
                .field("type", literal("square"))
                .field("side", number().positive()),
        ],
    )
    .unwrap()
}

// === Ordered Unions ===

mod ordered {
    use super::*;

    #[test]
    fn first_matching_branch_wins() {
        let s = union([Schema::from(string().trim()), string().into()]);
        assert_eq!(s.parse(" a ").unwrap(), Value::from("a"));
    }

    #[test]
    fn failure_collects_branch_issues() {
        let s = union([Schema::from(string()), number().into()]);
        let err = s.parse(true).unwrap_err();
        assert_eq!(err.len(), 1);
        match &err.first().kind {
            IssueKind::InvalidUnion { branches, .. } => {
                assert_eq!(branches.len(), 2);
                assert_eq!(branches[0][0].code(), IssueCode::InvalidType);
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn branch_issue_paths_are_absolute() {
        let s = object().field(
            "value",
            union([Schema::from(object().field("x", string())), number().into()]),
        );
        let err = s.parse(json!({ "value": { "x": 1 } })).unwrap_err();
        assert_eq!(err.first().pointer(), "/value");
        let IssueKind::InvalidUnion { branches, .. } = &err.first().kind else {
            panic!("expected invalid_union");
        };
        assert_eq!(branches[0][0].pointer(), "/value/x");
    }

    #[test]
    fn or_shorthand() {
        let s = string().or(number());
        assert!(s.parse("a").is_ok());
        assert!(s.parse(1).is_ok());
        assert!(s.parse(true).is_err());
    }
}

// === Exclusive Unions ===

mod exclusive {
    use super::*;

    #[test]
    fn exactly_one_branch_must_match() {
        let s = exclusive_union([Schema::from(string().min(3)), string().max(5).into()]);
        assert!(s.parse("ab").is_ok());
        assert!(s.parse("abcdefg").is_ok());

        let both = s.parse("abcd").unwrap_err();
        assert_eq!(both.first().code(), IssueCode::InvalidUnion);

        let neither = s.parse(1).unwrap_err();
        assert_eq!(neither.first().code(), IssueCode::InvalidUnion);
    }
}

// === Discriminated Unions ===

mod discriminated {
    use super::*;

    #[test]
    fn selects_branch_by_tag() {
        let s = shapes();
        assert!(s.parse(json!({ "type": "circle", "radius": 1 })).is_ok());
        let err = s
            .parse(json!({ "type": "square", "radius": 1 }))
            .unwrap_err();
        assert_eq!(err.first().pointer(), "/side");
    }

    #[test]
    fn unknown_tag_points_at_discriminator() {
        let err = shapes()
            .parse(json!({ "type": "hexagon" }))
            .unwrap_err();
        assert_eq!(err.first().code(), IssueCode::InvalidUnion);
        assert_eq!(err.first().pointer(), "/type");
    }

    #[test]
    fn non_object_input_is_invalid_type() {
        let err = shapes().parse("circle").unwrap_err();
        assert_eq!(err.first().code(), IssueCode::InvalidType);
    }

    #[test]
    fn construction_errors() {
        let missing = discriminated_union("type", [object().field("radius", number())]);
        assert!(matches!(
            missing.unwrap_err(),
            SchemaError::MissingDiscriminator { index: 0, .. }
        ));

        let duplicate = discriminated_union(
            "type",
            [
                object().field("type", literal("a")),
                object().field("type", literal("a")),
            ],
        );
        assert!(matches!(
            duplicate.unwrap_err(),
            SchemaError::DuplicateDiscriminator { .. }
        ));

        let not_object = discriminated_union("type", [string()]);
        assert_eq!(
            not_object.unwrap_err(),
            SchemaError::NotAnObject {
                index: 0,
                kind: SchemaKind::String
            }
        );
    }

    #[test]
    fn nested_discriminated_unions_flatten() {
        let triangle = object()
            .field("type", literal("triangle"))
            .field("base", number());
        let s = discriminated_union("type", [shapes(), triangle.into()]).unwrap();
        assert!(s.parse(json!({ "type": "circle", "radius": 2 })).is_ok());
        assert!(s.parse(json!({ "type": "triangle", "base": 2 })).is_ok());
    }
}

// === Intersections ===

mod intersections {
    use super::*;

    #[test]
    fn disjoint_keys_merge() {
        let s = intersection(object().field("a", number()), object().field("b", string()));
        let out = s.parse(json!({ "a": 1, "b": "x" })).unwrap();
        assert_eq!(out.to_json(), json!({ "a": 1, "b": "x" }));
    }

    #[test]
    fn conflicting_scalars_fail() {
        let s = object()
            .field("a", string())
            .and(object().field("a", string().to_upper()));
        let err = s.parse(json!({ "a": "x" })).unwrap_err();
        assert_eq!(err.first().code(), IssueCode::InvalidIntersection);
        let IssueKind::InvalidIntersection { merge_path, .. } = &err.first().kind else {
            panic!("expected invalid_intersection");
        };
        assert_eq!(merge_path, &vec![shapeguard::PathSegment::from("a")]);
    }

    #[test]
    fn issues_from_both_sides_are_kept() {
        let s = intersection(object().field("a", number()), object().field("b", number()));
        let err = s.parse(json!({ "a": "x", "b": "y" })).unwrap_err();
        let pointers: Vec<String> = err.issues().iter().map(|i| i.pointer()).collect();
        assert_eq!(pointers, vec!["/a", "/b"]);
    }
}
