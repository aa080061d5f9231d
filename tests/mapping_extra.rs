use schemata::{ErrorKind, Expr, HookAction, HookExpr, KeyHook, MapExpr, Options, Schema, SchemaError, ValueType};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

fn user_schema() -> Schema {
    let age = Expr::and([
        Expr::from(ValueType::Integer),
        Expr::predicate("non_negative", |v| v.as_i64().is_some_and(|n| n >= 0)),
    ]);
    Schema::new(Expr::map([
        (Expr::from("name"), Expr::regex("^[A-Za-z]+$")),
        (Expr::optional_default("age", 0), age),
    ]))
    .unwrap()
}

// ─── Required keys and defaults ─────────────────────────────────────────────

#[test]
fn default_fills_absent_optional_key() {
    let schema = user_schema();
    assert_eq!(
        schema.validate(&json!({"name": "Ada"})).unwrap(),
        json!({"name": "Ada", "age": 0})
    );
    assert_eq!(
        schema.validate(&json!({"name": "Ada", "age": 36})).unwrap(),
        json!({"name": "Ada", "age": 36})
    );
}

#[test]
fn regex_mismatch_names_the_key() {
    let err = user_schema().validate(&json!({"name": "A1"})).unwrap_err();
    let code = err.code();
    assert!(code.starts_with("Key 'name' error:"), "{code}");
    assert!(code.contains("does not match \"A1\""), "{code}");
}

#[test]
fn undeclared_key_is_wrong_key() {
    let err = user_schema()
        .validate(&json!({"name": "Ada", "extra": 1}))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::WrongKey);
    assert_eq!(err.code(), "Wrong key 'extra' in {\"name\":\"Ada\",\"extra\":1}");
}

#[test]
fn invalid_optional_value_is_reported() {
    let err = user_schema()
        .validate(&json!({"name": "Ada", "age": -1}))
        .unwrap_err();
    assert!(err.code().contains("non_negative(-1) should evaluate to true"));
}

#[test]
fn missing_required_keys_are_listed() {
    let schema = Schema::new(json!({"b": 1, "a": 2})).unwrap();
    let err = schema.validate(&json!({})).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MissingKey);
    assert_eq!(err.code(), "Missing keys: 'a', 'b'");
}

#[test]
fn default_factory_runs_per_validation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let schema = Schema::new(Expr::map([(
        Expr::optional_default_with("tags", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            json!([])
        }),
        Expr::seq([ValueType::String]),
    )]))
    .unwrap();

    assert_eq!(schema.validate(&json!({})).unwrap(), json!({"tags": []}));
    assert_eq!(schema.validate(&json!({})).unwrap(), json!({"tags": []}));
    assert_eq!(schema.validate(&json!({"tags": ["x"]})).unwrap(), json!({"tags": ["x"]}));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn optional_key_without_default_stays_absent() {
    let schema = Schema::new(Expr::map([(Expr::optional("nick"), ValueType::String)])).unwrap();
    assert_eq!(schema.validate(&json!({})).unwrap(), json!({}));
}

// ─── Dispatch order ─────────────────────────────────────────────────────────

#[test]
fn literal_key_wins_over_type_key() {
    let schema = Schema::new(Expr::map([
        (Expr::from(ValueType::String), Expr::from(ValueType::Integer)),
        (Expr::from("label"), Expr::from(ValueType::String)),
    ]))
    .unwrap();
    assert_eq!(
        schema.validate(&json!({"label": "x", "count": 3})).unwrap(),
        json!({"label": "x", "count": 3})
    );
    assert!(!schema.is_valid(&json!({"count": "x"})));
}

#[test]
fn any_key_is_tried_last() {
    let schema = Schema::new(Expr::map([
        (Expr::any(), Expr::from(ValueType::Boolean)),
        (Expr::from(ValueType::String), Expr::from(ValueType::Integer)),
    ]))
    .unwrap();
    // The typed key matches first and its value failure is raised.
    let err = schema.validate(&json!({"flag": true})).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedType);
    assert!(schema.is_valid(&json!({"n": 1})));
}

#[test]
fn predicate_keys_join_every_bucket() {
    let short = Expr::predicate("short", |v| v.as_str().is_some_and(|s| s.len() <= 2));
    let schema = Schema::new(Expr::map([(short, ValueType::Integer)])).unwrap();
    assert!(schema.is_valid(&json!({"ab": 1, "c": 2})));
    assert_eq!(
        schema.validate(&json!({"abc": 1})).unwrap_err().kind,
        ErrorKind::WrongKey
    );
}

#[test]
fn nested_mappings_validate_recursively() {
    let schema = Schema::new(json!({"user": {"id": 7}})).unwrap();
    assert!(schema.is_valid(&json!({"user": {"id": 7}})));
    let err = schema.validate(&json!({"user": {"id": 8}})).unwrap_err();
    assert_eq!(
        err.autos().collect::<Vec<_>>(),
        vec!["Key 'user' error:", "Key 'id' error:", "7 does not match 8"]
    );
}

// ─── Extra keys ─────────────────────────────────────────────────────────────

#[test]
fn extra_keys_dropped_when_ignored() {
    let map = MapExpr::new().entry("a", ValueType::Integer).ignore_extra_keys(true);
    let schema = Schema::new(map).unwrap();
    assert_eq!(schema.validate(&json!({"a": 1, "b": 2})).unwrap(), json!({"a": 1}));
}

#[test]
fn mapping_override_beats_options() {
    let options = Options::default().ignore_extra_keys(true);
    let strict = MapExpr::new().entry("a", 1).ignore_extra_keys(false);
    let schema = Schema::with_options(strict, &options).unwrap();
    assert_eq!(
        schema.validate(&json!({"a": 1, "b": 2})).unwrap_err().kind,
        ErrorKind::WrongKey
    );
}

// ─── Only-one groups ────────────────────────────────────────────────────────

fn only_one_schema() -> Schema {
    Schema::new(Expr::map([(Expr::optional(Expr::only_one(["a", "b"])), Expr::any())])).unwrap()
}

#[test]
fn only_one_rejects_both_keys() {
    let schema = only_one_schema();
    let err = schema.validate(&json!({"a": 1, "b": 2})).unwrap_err();
    assert_eq!(err.kind, ErrorKind::OnlyOneAllowed);
    assert!(err.code().starts_with("There are multiple keys present from the Or("));
}

#[test]
fn only_one_accepts_one_or_none() {
    let schema = only_one_schema();
    assert_eq!(schema.validate(&json!({"a": 1})).unwrap(), json!({"a": 1}));
    assert_eq!(schema.validate(&json!({"b": 2})).unwrap(), json!({"b": 2}));
    assert_eq!(schema.validate(&json!({})).unwrap(), json!({}));
}

#[test]
fn only_one_state_is_cleared_between_runs() {
    let schema = only_one_schema();
    assert!(schema.validate(&json!({"a": 1, "b": 2})).is_err());
    // A failed run must not leak its counter into the next one.
    assert!(schema.is_valid(&json!({"a": 1})));
    assert!(schema.is_valid(&json!({"b": 1})));
}

#[test]
fn only_one_key_without_optional_is_required() {
    let schema = Schema::new(Expr::map([(Expr::only_one(["a", "b"]), Expr::any())])).unwrap();
    assert_eq!(schema.validate(&json!({})).unwrap_err().kind, ErrorKind::MissingKey);
}

#[test]
fn key_errors_supersede_only_one_errors() {
    let schema = Schema::new(Expr::map([(
        Expr::optional(Expr::only_one(["a", "b"])),
        Expr::from(ValueType::Integer),
    )]))
    .unwrap();
    let err = schema.validate(&json!({"a": 1, "b": "x"})).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedType);
}

// ─── Forbidden and Clean ────────────────────────────────────────────────────

#[test]
fn forbidden_key_raises() {
    let schema = Schema::new(Expr::map([
        (Expr::forbidden("password"), Expr::any()),
        (Expr::from(ValueType::String), Expr::from(ValueType::String)),
    ]))
    .unwrap();
    assert!(schema.is_valid(&json!({"user": "ada"})));
    let err = schema.validate(&json!({"password": "x"})).unwrap_err();
    assert_eq!(err.kind, ErrorKind::ForbiddenKey);
    assert_eq!(
        err.code(),
        "Forbidden key encountered: 'password' in {\"password\":\"x\"}"
    );
}

#[test]
fn forbidden_only_for_matching_values() {
    let schema = Schema::new(Expr::map([
        (Expr::forbidden("mode"), Expr::from("debug")),
        (Expr::from(ValueType::String), Expr::from(ValueType::String)),
    ]))
    .unwrap();
    assert!(schema.is_valid(&json!({"mode": "release"})));
    assert_eq!(
        schema.validate(&json!({"mode": "debug"})).unwrap_err().kind,
        ErrorKind::ForbiddenKey
    );
}

#[test]
fn clean_key_is_dropped() {
    let schema = Schema::new(Expr::map([
        (Expr::clean("_comment"), Expr::any()),
        (Expr::from("id"), Expr::from(ValueType::Integer)),
    ]))
    .unwrap();
    assert_eq!(
        schema.validate(&json!({"id": 1, "_comment": "drop me"})).unwrap(),
        json!({"id": 1})
    );
    assert_eq!(schema.validate(&json!({"id": 1})).unwrap(), json!({"id": 1}));
}

// ─── Custom hooks ───────────────────────────────────────────────────────────

/// Stores every matched key upper-cased.
#[derive(Debug)]
struct Uppercase;

impl KeyHook for Uppercase {
    fn handle(
        &self,
        key: &Value,
        value: &Value,
        new: &mut Map<String, Value>,
        _data: &Map<String, Value>,
    ) -> Result<HookAction, SchemaError> {
        let key = key.as_str().unwrap_or_default().to_uppercase();
        new.insert(key, value.clone());
        Ok(HookAction::Discard)
    }

    fn catch(
        &self,
        _key: &Value,
        _error: &SchemaError,
        _new: &mut Map<String, Value>,
        _data: &Map<String, Value>,
    ) -> Result<HookAction, SchemaError> {
        Ok(HookAction::Continue)
    }
}

#[test]
fn custom_hook_rewrites_output() {
    let schema = Schema::new(Expr::map([(
        HookExpr::new(ValueType::String, Uppercase),
        Expr::from(ValueType::Integer),
    )]))
    .unwrap();
    assert_eq!(
        schema.validate(&json!({"a": 1, "b": 2})).unwrap(),
        json!({"A": 1, "B": 2})
    );
    // `catch` continues, so a bad value leaves the key unmatched.
    assert_eq!(
        schema.validate(&json!({"a": "x"})).unwrap_err().kind,
        ErrorKind::WrongKey
    );
}

#[test]
fn required_custom_hook_must_be_present() {
    let schema = Schema::new(Expr::map([(
        HookExpr::new("id", Uppercase).required(true),
        Expr::any(),
    )]))
    .unwrap();
    assert_eq!(schema.validate(&json!({"id": 1})).unwrap(), json!({"ID": 1}));
    assert_eq!(schema.validate(&json!({})).unwrap_err().kind, ErrorKind::MissingKey);
}

#[test]
fn custom_hook_priority_override() {
    let schema = Schema::new(Expr::map([
        (Expr::from(ValueType::String), Expr::any()),
        (Expr::from(HookExpr::new(ValueType::String, Uppercase).priority(0)), Expr::any()),
    ]))
    .unwrap();
    assert_eq!(schema.validate(&json!({"k": 1})).unwrap(), json!({"K": 1}));
}

// ─── Custom errors ──────────────────────────────────────────────────────────

#[test]
fn custom_error_replaces_rendering() {
    let schema = Schema::new(Expr::map([(
        "age",
        Expr::from(ValueType::Integer).error("bad age {}"),
    )]))
    .unwrap();
    let err = schema.validate(&json!({"age": "x"})).unwrap_err();
    assert_eq!(err.code(), "bad age x");
    assert!(err.autos().any(|m| m == "\"x\" should be instance of 'integer'"));
}

#[test]
fn mapping_error_reaches_values() {
    let map = Expr::from(MapExpr::new().entry("n", ValueType::Integer)).error("invalid record");
    let schema = Schema::new(map).unwrap();
    assert_eq!(schema.validate(&json!({"n": "x"})).unwrap_err().code(), "invalid record");
    assert_eq!(schema.validate(&json!([])).unwrap_err().code(), "invalid record");
}

#[test]
fn only_one_counts_are_per_run_across_threads() {
    let slow_integer = Expr::and([
        Expr::from(ValueType::Integer),
        Expr::predicate("slow", |_| {
            thread::sleep(Duration::from_millis(1));
            true
        }),
    ]);
    let schema = Schema::new(Expr::map([(Expr::optional(Expr::only_one(["a", "b"])), slow_integer)])).unwrap();
    thread::scope(|s| {
        let runs: Vec<_> = ["a", "b"]
            .into_iter()
            .map(|key| {
                let schema = &schema;
                s.spawn(move || {
                    let data = json!({ key: 1 });
                    (0..40)
                        .map(|_| schema.validate(&data))
                        .filter(Result::is_err)
                        .count()
                })
            })
            .collect();
        for run in runs {
            assert_eq!(run.join().unwrap(), 0);
        }
    });
    assert_eq!(
        schema.validate(&json!({"a": 1, "b": 2})).unwrap_err().kind,
        ErrorKind::OnlyOneAllowed
    );
}
