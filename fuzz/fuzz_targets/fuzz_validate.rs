#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use schemata::{Expr, Schema, ValueType};
use serde_json::{Map, Value};

const TYPES: [ValueType; 8] = [
    ValueType::Any,
    ValueType::Null,
    ValueType::Boolean,
    ValueType::Integer,
    ValueType::Number,
    ValueType::String,
    ValueType::Array,
    ValueType::Object,
];

/// Generate a simple arbitrary JSON value from fuzzer bytes.
fn arbitrary_value(u: &mut Unstructured<'_>, depth: u8) -> arbitrary::Result<Value> {
    let top = if depth == 0 { 3 } else { 5 };
    match u.int_in_range(0..=top)? {
        0 => Ok(Value::Null),
        1 => Ok(Value::Bool(bool::arbitrary(u)?)),
        2 => Ok(Value::from(i64::arbitrary(u)?)),
        3 => Ok(Value::String(String::arbitrary(u)?)),
        4 => {
            let len = u.int_in_range(0..=3)?;
            let mut items = Vec::with_capacity(len);
            for _ in 0..len {
                items.push(arbitrary_value(u, depth - 1)?);
            }
            Ok(Value::Array(items))
        }
        _ => {
            let len = u.int_in_range(0..=3)?;
            let mut map = Map::new();
            for _ in 0..len {
                map.insert(String::arbitrary(u)?, arbitrary_value(u, depth - 1)?);
            }
            Ok(Value::Object(map))
        }
    }
}

/// Generate an arbitrary schema expression from fuzzer bytes.
fn arbitrary_expr(u: &mut Unstructured<'_>, depth: u8) -> arbitrary::Result<Expr> {
    let top = if depth == 0 { 2 } else { 8 };
    Ok(match u.int_in_range(0..=top)? {
        0 => Expr::literal(arbitrary_value(u, 0)?),
        1 => Expr::from(*u.choose(&TYPES)?),
        2 => Expr::regex(String::arbitrary(u)?),
        3 => Expr::and([arbitrary_expr(u, depth - 1)?, arbitrary_expr(u, depth - 1)?]),
        4 => Expr::or([arbitrary_expr(u, depth - 1)?, arbitrary_expr(u, depth - 1)?]),
        5 => Expr::not(arbitrary_expr(u, depth - 1)?),
        6 => Expr::seq([arbitrary_expr(u, depth - 1)?]),
        7 => Expr::map([(arbitrary_key(u, depth - 1)?, arbitrary_expr(u, depth - 1)?)]),
        _ => Expr::map([
            (arbitrary_key(u, depth - 1)?, arbitrary_expr(u, depth - 1)?),
            (arbitrary_key(u, depth - 1)?, arbitrary_expr(u, depth - 1)?),
        ]),
    })
}

fn arbitrary_key(u: &mut Unstructured<'_>, depth: u8) -> arbitrary::Result<Expr> {
    let name = String::arbitrary(u)?;
    Ok(match u.int_in_range(0..=5)? {
        0 => Expr::optional(name),
        1 => Expr::optional_default(name, arbitrary_value(u, 0)?),
        2 => Expr::forbidden(name),
        3 => Expr::clean(name),
        4 => Expr::optional(Expr::only_one([name, String::arbitrary(u)?])),
        _ => arbitrary_expr(u, depth)?,
    })
}

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);
    let Ok(expr) = arbitrary_expr(&mut u, 3) else {
        return;
    };
    let Ok(input) = arbitrary_value(&mut u, 3) else {
        return;
    };
    let Ok(schema) = Schema::new(expr) else {
        return;
    };

    let first = schema.validate(&input).map_err(|e| e.code());
    let second = schema.validate(&input).map_err(|e| e.code());
    if first != second {
        panic!("validation is not repeatable for {schema} on {input}: {first:?} vs {second:?}");
    }
});
