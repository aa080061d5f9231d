use super::strategies::{VALIDATORS, json_value, validator};
use proptest::prelude::*;
use schemata::{Expr, Schema};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // Exactly one of V and Not(V) accepts any input.
    #[test]
    fn negation_is_exclusive(choice in 0..VALIDATORS, data in json_value()) {
        let plain = Schema::new(validator(choice)).unwrap();
        let negated = Schema::new(Expr::not(validator(choice))).unwrap();
        prop_assert_ne!(plain.is_valid(&data), negated.is_valid(&data));
    }

    // Not returns its input untouched.
    #[test]
    fn negation_returns_input(choice in 0..VALIDATORS, data in json_value()) {
        let negated = Schema::new(Expr::not(validator(choice))).unwrap();
        if let Ok(out) = negated.validate(&data) {
            prop_assert_eq!(out, data);
        }
    }
}
