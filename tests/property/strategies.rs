use proptest::prelude::*;
use schemata::{Expr, SeqExpr, ValueType};
use serde_json::Value;

/// Small JSON documents: scalars nested at most three levels deep.
pub fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        (-1000i64..1000).prop_map(Value::from),
        (-10.0f64..10.0).prop_map(Value::from),
        "[a-z0-9]{0,6}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,3}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Number of distinct expressions [`validator`] builds.
pub const VALIDATORS: usize = 9;

/// A fresh validator expression, chosen by index.
pub fn validator(choice: usize) -> Expr {
    match choice % VALIDATORS {
        0 => Expr::from(ValueType::Integer),
        1 => Expr::from(ValueType::String),
        2 => Expr::from("a"),
        3 => Expr::regex("^[a-z]+$"),
        4 => Expr::seq([ValueType::Integer]),
        5 => Expr::map([(Expr::from("k"), Expr::from(ValueType::Integer))]),
        6 => Expr::or([Expr::from(ValueType::Boolean), Expr::from(ValueType::Null)]),
        7 => Expr::from(SeqExpr::new(Vec::<Expr>::new()).max_length(2)),
        _ => Expr::predicate("positive", |v| v.as_f64().is_some_and(|n| n > 0.0)),
    }
}
