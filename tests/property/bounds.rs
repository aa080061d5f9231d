use proptest::prelude::*;
use schemata::{ErrorKind, MapExpr, Schema, SeqExpr, ValueType};
use serde_json::{Map, Value};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // A sequence is valid exactly when its length is within the inclusive bounds.
    #[test]
    fn sequence_length_bounds(min in 0usize..4, span in 0usize..4, len in 0usize..10) {
        let max = min + span;
        let schema = Schema::new(SeqExpr::new([ValueType::Integer]).min_length(min).max_length(max)).unwrap();
        let data = Value::Array((0..len).map(|i| Value::from(i as i64)).collect());
        match schema.validate(&data) {
            Ok(out) => {
                prop_assert!(min <= len && len <= max);
                prop_assert_eq!(out, data);
            }
            Err(err) => {
                prop_assert!(len < min || len > max);
                prop_assert_eq!(err.kind, ErrorKind::WrongLength);
            }
        }
    }

    // Same for mappings, counted in keys.
    #[test]
    fn mapping_length_bounds(min in 0usize..4, span in 0usize..4, len in 0usize..10) {
        let max = min + span;
        let schema = Schema::new(
            MapExpr::new()
                .entry(ValueType::String, ValueType::Integer)
                .min_length(min)
                .max_length(max),
        )
        .unwrap();
        let data: Map<String, Value> = (0..len).map(|i| (format!("k{i}"), Value::from(i as i64))).collect();
        let valid = schema.is_valid(&Value::Object(data));
        prop_assert_eq!(valid, min <= len && len <= max);
    }
}
