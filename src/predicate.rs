//! Named user callables: predicates (checked for truth) and transforms
//! (whose result replaces the value).

use crate::error::TransformError;
#[cfg(feature = "cel-eval")]
use crate::error::BuildError;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type CheckFn = dyn Fn(&Value) -> Result<bool, TransformError> + Send + Sync;
type ApplyFn = dyn Fn(&Value) -> Result<Value, TransformError> + Send + Sync;

/// A named check. Validation succeeds when it returns `true`.
#[derive(Clone)]
pub struct Predicate {
    name: String,
    check: Arc<CheckFn>,
    json_schema: Option<Value>,
}

impl Predicate {
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::fallible(name, move |value| Ok(check(value)))
    }

    /// A check that may fail. A returned [`TransformError::Schema`] is
    /// re-raised as is; any other error is reported as raised by the check.
    pub fn fallible<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> Result<bool, TransformError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
            json_schema: None,
        }
    }

    /// Schema fragment reported for this check during derivation.
    pub fn with_json_schema(mut self, schema: Value) -> Self {
        self.json_schema = Some(schema);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn call(&self, data: &Value) -> Result<bool, TransformError> {
        (self.check)(data)
    }

    pub(crate) fn json_schema(&self) -> Option<&Value> {
        self.json_schema.as_ref()
    }

    /// A predicate written in CEL. The data is bound to `value`.
    ///
    /// Missing fields evaluate to `false`; a non-boolean result is `false`.
    #[cfg(feature = "cel-eval")]
    pub fn cel(expression: impl Into<String>) -> Result<Self, BuildError> {
        let expression = expression.into();
        let program = cel::Program::compile(&expression).map_err(|e| BuildError::Cel {
            expression: expression.clone(),
            message: e.to_string(),
        })?;
        let program = Arc::new(program);
        Ok(Self::fallible(expression, move |value| evaluate_cel(&program, value)))
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A named conversion. Its output replaces the validated value.
#[derive(Clone)]
pub struct Transform {
    name: String,
    apply: Arc<ApplyFn>,
}

impl Transform {
    pub fn new<F>(name: impl Into<String>, apply: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, TransformError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            apply: Arc::new(apply),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn apply(&self, data: &Value) -> Result<Value, TransformError> {
        (self.apply)(data)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transform")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// ─── CEL (behind `cel-eval` feature) ────────────────────────────────────────

#[cfg(feature = "cel-eval")]
fn evaluate_cel(program: &cel::Program, value: &Value) -> Result<bool, TransformError> {
    let mut context = cel::Context::default();
    context.add_variable_from_value("value", json_to_cel(value));

    match program.execute(&context) {
        Ok(cel::Value::Bool(result)) => Ok(result),
        Ok(_) => Ok(false),
        Err(cel::ExecutionError::NoSuchKey(_)) => Ok(false),
        Err(e) => Err(TransformError::other(format!("CEL execution error: {}", e))),
    }
}

/// Convert serde_json::Value → cel::Value.
#[cfg(feature = "cel-eval")]
fn json_to_cel(value: &Value) -> cel::Value {
    use std::collections::HashMap;

    match value {
        Value::Null => cel::Value::Null,
        Value::Bool(b) => cel::Value::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                cel::Value::Int(i)
            } else if let Some(u) = n.as_u64() {
                cel::Value::UInt(u)
            } else if let Some(f) = n.as_f64() {
                cel::Value::Float(f)
            } else {
                cel::Value::Null
            }
        }
        Value::String(s) => cel::Value::String(Arc::new(s.clone())),
        Value::Array(items) => cel::Value::List(Arc::new(items.iter().map(json_to_cel).collect())),
        Value::Object(map) => {
            let entries: HashMap<String, cel::Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), json_to_cel(v)))
                .collect();
            entries.into()
        }
    }
}
