use proptest::prelude::*;
use schemata::Target;
use schemata::fragment::{Fragment, and_merge, or_merge};
use serde_json::{Value, json};

const TOKENS: [&str; 6] = ["string", "integer", "number", "object", "array", "null"];

/// Tokens without the `integer` within `number` overlap.
const DISJOINT: [&str; 5] = ["string", "number", "object", "array", "boolean"];

fn fragment() -> impl Strategy<Value = Fragment> {
    prop_oneof![
        prop::sample::subsequence(TOKENS.to_vec(), 1..3)
            .prop_map(|t| Fragment::Types(t.into_iter().map(str::to_string).collect())),
        "[a-c]".prop_map(|s| Fragment::Const(Value::from(s))),
        (0i64..5).prop_map(|n| Fragment::Const(Value::from(n))),
        (1u64..4).prop_map(|n| Fragment::from_value(json!({"type": "string", "minLength": n}))),
        Just(Fragment::Const(Value::Bool(true))),
    ]
}

fn target() -> impl Strategy<Value = Target> {
    prop_oneof![Just(Target::Default), Just(Target::JsonSchema), Just(Target::OpenApi)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // A union with itself adds nothing.
    #[test]
    fn or_merge_is_idempotent(f in fragment(), target in target()) {
        let once = or_merge([f.clone()], target);
        let twice = or_merge([f.clone(), f], target);
        prop_assert_eq!(once.clone(), twice);
        prop_assert_eq!(or_merge([once.clone(), once.clone()], target), once);
    }

    // String literals pool into the same sorted enum in either order.
    #[test]
    fn or_merge_of_string_literals_commutes(a in "[a-e]", b in "[a-e]", target in target()) {
        let a = Fragment::Const(Value::from(a));
        let b = Fragment::Const(Value::from(b));
        prop_assert_eq!(
            or_merge([a.clone(), b.clone()], target),
            or_merge([b, a], target)
        );
    }

    // Intersecting a type set with a superset keeps the smaller set.
    #[test]
    fn and_merge_keeps_the_narrower_types(
        narrow in prop::sample::subsequence(DISJOINT.to_vec(), 1..3),
        extra in prop::sample::subsequence(DISJOINT.to_vec(), 0..3),
    ) {
        let to_types = |t: &[&str]| Fragment::Types(t.iter().map(|s| s.to_string()).collect());
        let mut wide: Vec<&str> = narrow.clone();
        wide.extend(extra.iter().filter(|t| !narrow.contains(*t)));
        let merged = and_merge([to_types(narrow.as_slice()), to_types(wide.as_slice())], Target::JsonSchema);
        let mut expected: Vec<&str> = narrow.clone();
        expected.sort_unstable();
        prop_assert_eq!(merged, to_types(expected.as_slice()));
    }
}
