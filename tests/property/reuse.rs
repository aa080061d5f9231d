use super::strategies::json_value;
use proptest::prelude::*;
use schemata::{Expr, Schema, ValueType};
use serde_json::Value;

fn record() -> Schema {
    Schema::new(Expr::map([
        (Expr::optional(Expr::only_one(["a", "b"])), Expr::from(ValueType::Integer)),
        (Expr::optional_default("n", 0), Expr::from(ValueType::Integer)),
        (Expr::clean("_note"), Expr::any()),
    ]))
    .unwrap()
}

fn outcome(schema: &Schema, data: &Value) -> Result<Value, String> {
    schema.validate(data).map_err(|e| e.code())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // Validating equal inputs against one tree gives equal outcomes.
    #[test]
    fn reuse_is_idempotent(data in json_value()) {
        let schema = record();
        let first = outcome(&schema, &data);
        let second = outcome(&schema, &data);
        prop_assert_eq!(first, second);
    }

    // A run never leaks state into the next, whatever it validated.
    #[test]
    fn state_does_not_leak(noise in json_value(), a in -50i64..50) {
        let schema = record();
        let _ = schema.validate(&noise);
        let _ = schema.validate(&serde_json::json!({"a": 1, "b": 2}));
        let data = serde_json::json!({"a": a});
        prop_assert_eq!(outcome(&schema, &data), Ok(serde_json::json!({"a": a, "n": 0})));
    }

    // Validation output is itself valid and unchanged by a second pass.
    #[test]
    fn output_is_a_fixed_point(a in -50i64..50, note in "[a-z]{0,4}") {
        let schema = record();
        let data = serde_json::json!({"b": a, "_note": note});
        let once = schema.validate(&data).unwrap();
        let twice = schema.validate(&once).unwrap();
        prop_assert_eq!(once, twice);
    }
}
