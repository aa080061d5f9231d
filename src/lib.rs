//! Declarative validation of JSON-like data, with JSON Schema derivation.
//!
//! A schema is written as an [`Expr`]: bare values compare by equality,
//! [`ValueType`]s check types, arrays and objects validate element-wise and
//! key-wise, and combinators (`And`, `Or`, `Not`, `Use`, `Regex`, ...)
//! compose them. The expression is compiled once into a [`Schema`]:
//!
//! ```text
//! Expr → Schema::new → Schema → validate(data) → Value
//!                             → json_schema(options) → Value
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use schemata::{Expr, Schema, ValueType};
//! use serde_json::json;
//!
//! let schema = Schema::new(Expr::map([
//!     (Expr::from("name"), Expr::regex("^[A-Za-z]+$")),
//!     (Expr::optional_default("age", 0), Expr::from(ValueType::Integer)),
//! ]))
//! .expect("valid schema");
//!
//! let user = schema.validate(&json!({"name": "Ada"})).expect("valid data");
//! assert_eq!(user, json!({"name": "Ada", "age": 0}));
//! assert!(!schema.is_valid(&json!({"name": "A1"})));
//! ```
//!
//! # Mapping dispatch
//!
//! Every key of a validated object is matched against the schema's keys in
//! priority order: literal keys (10) before predicates (20), validators
//! (30), types (40), mappings (50), sequences (60) and [`Expr::any`] (100).
//! The first schema key whose key validator accepts the data key decides
//! its value; only when its value validator fails is the next candidate
//! tried. [`Expr::optional`] keys rank just before their flavor,
//! [`Expr::forbidden`] and [`Expr::clean`] just after.
//!
//! # Feature Flags
//!
//! | Feature    | Default | Description |
//! |------------|---------|-------------|
//! | `cel-eval` | yes     | CEL predicates via the [`cel`] crate. Enables [`Predicate::cel`]. |

pub mod combinator;
pub mod error;
pub mod expr;
pub mod fragment;
pub mod hook;
pub mod json_schema;
pub mod leaf;
pub mod mapping;
pub mod node;
pub mod options;
pub mod pattern;
pub mod predicate;
pub mod schema;
pub mod sequence;
pub mod serialize;
pub mod types;

pub(crate) mod compile;

pub use error::*;
pub use types::*;

pub use expr::{Expr, HookExpr, MapExpr, SeqExpr};
pub use hook::{DefaultValue, HookAction, KeyHook};
pub use json_schema::{JsonSchemaOptions, Target};
pub use node::{Bucket, Reset, SchemaNode};
pub use options::{Options, OptionsConfig, Resolver};
pub use pattern::RegexFlags;
pub use predicate::{Predicate, Transform};
pub use schema::Schema;

/// Convenience entry point composing compile → validate.
///
/// # Errors
///
/// Returns [`Error::Build`] if the expression does not compile and
/// [`Error::Validation`] if `data` does not match it.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
///
/// let expr = schemata::Expr::or(["red", "green"]);
/// match schemata::validate(expr, &json!("blue")) {
///     Ok(value) => println!("valid: {value}"),
///     Err(err) => eprintln!("{err}"),
/// }
/// ```
pub fn validate(expr: impl Into<Expr>, data: &serde_json::Value) -> Result<serde_json::Value, Error> {
    let schema = Schema::new(expr)?;
    Ok(schema.validate(data)?)
}
