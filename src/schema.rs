//! The compiled [`Schema`] entry point.

use crate::compile::Compiler;
use crate::error::{BuildError, DeriveError, SchemaError};
use crate::expr::Expr;
use crate::json_schema::{self, JsonSchemaOptions};
use crate::node::{Meta, SchemaNode};
use crate::options::Options;
use serde_json::Value;
use std::fmt;

/// A validator compiled from an [`Expr`].
///
/// Compilation happens once; validation never mutates the schema apart from
/// the per-run counters of only-one groups, which are reset at the end of
/// every mapping run. A schema can be shared across threads: a mapping with
/// only-one keys runs one validation at a time, every other node runs
/// concurrently.
#[derive(Debug)]
pub struct Schema {
    root: Box<dyn SchemaNode>,
}

impl Schema {
    /// Compiles `expr` with default [`Options`].
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] for invalid regex patterns, defaults on
    /// non-literal keys and unparseable CEL expressions.
    pub fn new(expr: impl Into<Expr>) -> Result<Self, BuildError> {
        Self::with_options(expr, &Options::default())
    }

    pub fn with_options(expr: impl Into<Expr>, options: &Options) -> Result<Self, BuildError> {
        let root = Compiler::new(options).compile(expr.into(), &Meta::default())?;
        tracing::debug!(schema = %root, "compiled schema");
        Ok(Self { root })
    }

    /// Validates `data`, returning the (possibly transformed) value.
    pub fn validate(&self, data: &Value) -> Result<Value, SchemaError> {
        self.root.validate(data)
    }

    pub fn is_valid(&self, data: &Value) -> bool {
        self.root.is_valid(data)
    }

    /// Derives the JSON Schema of this schema. `Ok(None)` means the schema
    /// places no constraint that can be expressed.
    pub fn json_schema(&self, options: &JsonSchemaOptions) -> Result<Option<Value>, DeriveError> {
        json_schema::derive(self.root.as_ref(), options)
    }

    pub fn root(&self) -> &dyn SchemaNode {
        self.root.as_ref()
    }

    /// Releases the compiled root, e.g. to nest it in another expression.
    pub fn into_node(self) -> Box<dyn SchemaNode> {
        self.root
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::ValueType;
    use serde_json::json;

    #[test]
    fn literal_object_compiles_to_mapping() {
        let schema = Schema::new(json!({"a": 1})).unwrap();
        assert_eq!(schema.validate(&json!({"a": 1})).unwrap(), json!({"a": 1}));
        assert_eq!(
            schema.validate(&json!({"a": 1, "b": 2})).unwrap_err().kind,
            ErrorKind::WrongKey
        );
    }

    #[test]
    fn ignore_extra_keys_option_applies_to_nested_mappings() {
        let options = Options::default().ignore_extra_keys(true);
        let schema = Schema::with_options(Expr::map([("a", Expr::map([("b", ValueType::Integer)]))]), &options).unwrap();
        assert_eq!(
            schema.validate(&json!({"a": {"b": 1, "c": 2}, "d": 3})).unwrap(),
            json!({"a": {"b": 1}})
        );
    }

    #[test]
    fn nested_schema_is_a_validator() {
        let inner = Schema::new(ValueType::Integer).unwrap();
        let outer = Schema::new(Expr::seq([inner])).unwrap();
        assert!(outer.is_valid(&json!([1, 2])));
        assert!(!outer.is_valid(&json!([1, "2"])));
    }

    #[test]
    fn default_on_complex_key_is_rejected() {
        let err = Schema::new(Expr::map([(Expr::optional_default(ValueType::String, 1), Expr::any())])).unwrap_err();
        assert!(matches!(err, BuildError::ComplexDefault { .. }));
    }

    #[test]
    fn invalid_regex_is_a_build_error() {
        assert!(matches!(Schema::new(Expr::regex("(")), Err(BuildError::Regex { .. })));
    }
}
