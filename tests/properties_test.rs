//! Property tests for parse invariants.

use proptest::prelude::*;
use serde_json::json;
use shapeguard::prelude::*;
use shapeguard::{IssueCode, ObjectSchema};

fn profile() -> ObjectSchema {
    object()
        .field("name", string().trim().to_lower().min(1))
        .field("tags", array(string().max(8)))
        .field("count", int().non_negative().optional())
        .field("score", number().finite())
}

fn profile_input() -> impl Strategy<Value = serde_json::Value> {
    (
        "[ a-zA-Z]{0,12}",
        prop::collection::vec("[a-z]{0,10}", 0..5),
        prop::option::of(-5i64..1000),
        -1e6f64..1e6,
        prop::option::of("[a-z]{1,6}"),
    )
        .prop_map(|(name, tags, count, score, extra)| {
            let mut input = json!({ "name": name, "tags": tags, "score": score });
            if let Some(count) = count {
                input["count"] = json!(count);
            }
            if let Some(extra) = extra {
                input["x_".to_string() + &extra] = json!(true);
            }
            input
        })
}

proptest! {
    /// Re-parsing an output yields the same output.
    #[test]
    fn outputs_revalidate_unchanged(input in profile_input()) {
        let schema = profile();
        if let Ok(output) = schema.parse(input) {
            let again = schema.parse(output.clone());
            prop_assert!(again.is_ok(), "output failed to re-parse: {:?}", again.err());
            prop_assert_eq!(again.unwrap(), output);
        }
    }

    /// Deriving a schema never changes how the original parses.
    #[test]
    fn modifiers_leave_the_original_alone(s in "[a-z]{0,10}") {
        let base = string().max(5);
        let _stricter = base.clone().min(3).regex(regex::Regex::new("^x").unwrap());
        let _wrapped = base.clone().optional().default("fallback");
        prop_assert_eq!(base.parse(s.as_str()).is_ok(), s.chars().count() <= 5);
    }

    /// Issues arrive in the order the checks were installed.
    #[test]
    fn issues_follow_check_order(n in -50i64..50) {
        let schema = number().gt(10).multiple_of(3).lt(5);
        let mut expected = Vec::new();
        if n <= 10 {
            expected.push(IssueCode::TooSmall);
        }
        if n % 3 != 0 {
            expected.push(IssueCode::NotMultipleOf);
        }
        if n >= 5 {
            expected.push(IssueCode::TooBig);
        }
        let codes: Vec<IssueCode> = match schema.parse(n) {
            Ok(_) => Vec::new(),
            Err(err) => err.issues().iter().map(|i| i.code()).collect(),
        };
        prop_assert_eq!(codes, expected);
    }

    /// A bad element is reported at its exact index.
    #[test]
    fn paths_locate_the_failing_element(len in 1usize..8, bad in 0usize..8) {
        let bad = bad % len;
        let items: Vec<serde_json::Value> = (0..len)
            .map(|i| if i == bad { json!({ "v": "x" }) } else { json!({ "v": i }) })
            .collect();
        let schema = object().field("items", array(object().field("v", number())));
        let err = schema.parse(json!({ "items": items })).unwrap_err();
        prop_assert_eq!(err.len(), 1);
        prop_assert_eq!(err.first().pointer(), format!("/items/{}/v", bad));
    }

    /// An exclusive union accepts exactly the inputs one branch accepts.
    #[test]
    fn exclusive_union_selection(n in -20i64..20) {
        let schema = exclusive_union([Schema::from(number().gte(0)), number().lte(5).into()]);
        let matches = usize::from(n >= 0) + usize::from(n <= 5);
        let result = schema.parse(n);
        if matches == 1 {
            prop_assert!(result.is_ok());
        } else {
            prop_assert_eq!(result.unwrap_err().first().code(), IssueCode::InvalidUnion);
        }
    }
}
