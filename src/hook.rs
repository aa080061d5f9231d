//! Key hooks: per-key policies that run when a mapping key matches.

use crate::error::{ErrorKind, SchemaError};
use crate::fragment::Fragment;
use crate::json_schema::Target;
use crate::node::{Bucket, Meta, Reset, SchemaNode};
use crate::types::key_text;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// What the mapping engine does after a hook ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HookAction {
    /// Try the next candidate key schema.
    Continue,
    /// Stop processing this key without keeping it.
    Discard,
    /// On success keep the pair; on failure re-raise the error.
    Accept,
}

/// Key-handling policy queried by the mapping engine.
///
/// `handle` runs when the value validated, `catch` when it failed. Both may
/// add entries to `new`, the output being built; `data` is the input mapping.
pub trait KeyHook: fmt::Debug + Send + Sync {
    /// Whether the key must be present.
    fn required(&self) -> bool {
        false
    }

    fn handle(
        &self,
        _key: &Value,
        _value: &Value,
        _new: &mut Map<String, Value>,
        _data: &Map<String, Value>,
    ) -> Result<HookAction, SchemaError> {
        Ok(HookAction::Continue)
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

    /// Entry inserted when no input key matched.
    fn default_value(&self) -> Option<(String, Value)> {
        None
    }

    /// Whether derivation should treat the key's value schema as excluded.
    fn forbids(&self) -> bool {
        false
    }
}

/// Default of an optional key: a fixed value or a factory invoked afresh
/// for each validation.
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            DefaultValue::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

impl From<Value> for DefaultValue {
    fn from(value: Value) -> Self {
        DefaultValue::Value(value)
    }
}

/// Built-in policies plus user-supplied ones.
#[derive(Clone, Debug)]
pub enum HookKind {
    /// Key may be absent; a default is inserted when given.
    Optional { default: Option<DefaultValue> },
    /// Key must not appear with a value matching the value schema.
    Forbidden,
    /// Key is accepted and dropped from the output.
    Clean,
    Custom(Arc<dyn KeyHook>),
}

/// A key schema carrying a [`HookKind`] policy.
#[derive(Debug)]
pub struct Hook {
    inner: Box<dyn SchemaNode>,
    kind: HookKind,
    key: Option<Value>,
    required: bool,
    priority: i32,
    meta: Meta,
}

impl Hook {
    pub(crate) fn new(
        inner: Box<dyn SchemaNode>,
        kind: HookKind,
        key: Option<Value>,
        required: bool,
        priority: i32,
        meta: Meta,
    ) -> Self {
        Self {
            inner,
            kind,
            key,
            required,
            priority,
            meta,
        }
    }

    pub fn kind(&self) -> &HookKind {
        &self.kind
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.kind {
            HookKind::Optional { .. } => "Optional",
            HookKind::Forbidden => "Forbidden",
            HookKind::Clean => "Clean",
            HookKind::Custom(_) => "Hook",
        };
        write!(f, "{name}({})", self.inner)
    }
}

impl SchemaNode for Hook {
    fn validate(&self, data: &Value) -> Result<Value, SchemaError> {
        self.inner
            .validate(data)
            .map_err(|err| self.meta.wrap(err, data))
    }

    fn json_schema(&self, target: Target) -> Fragment {
        self.meta.derive_or(|| match self.kind {
            HookKind::Custom(_) => Fragment::Nothing,
            _ => self.inner.json_schema(target),
        })
    }

    fn priority(&self) -> Option<i32> {
        Some(self.priority)
    }

    fn bucket(&self) -> Bucket {
        self.inner.bucket()
    }

    fn resettable(&self) -> Option<&dyn Reset> {
        self.inner.resettable()
    }

    fn key_hook(&self) -> Option<&dyn KeyHook> {
        Some(self)
    }
}

impl KeyHook for Hook {
    fn required(&self) -> bool {
        self.required
    }

    fn handle(
        &self,
        key: &Value,
        value: &Value,
        new: &mut Map<String, Value>,
        data: &Map<String, Value>,
    ) -> Result<HookAction, SchemaError> {
        match &self.kind {
            HookKind::Optional { .. } => Ok(HookAction::Accept),
            HookKind::Clean => Ok(HookAction::Discard),
            HookKind::Forbidden => {
                let whole = Value::Object(data.clone());
                Err(self.meta.fail(
                    ErrorKind::ForbiddenKey,
                    format!("Forbidden key encountered: '{}' in {whole}", key_text(key)),
                    &whole,
                ))
            }
            HookKind::Custom(hook) => hook.handle(key, value, new, data),
        }
    }

    fn catch(
        &self,
        key: &Value,
        error: &SchemaError,
        new: &mut Map<String, Value>,
        data: &Map<String, Value>,
    ) -> Result<HookAction, SchemaError> {
        match &self.kind {
            HookKind::Optional { .. } => Ok(HookAction::Accept),
            HookKind::Forbidden => Ok(HookAction::Continue),
            HookKind::Clean => Ok(HookAction::Discard),
            HookKind::Custom(hook) => hook.catch(key, error, new, data),
        }
    }

    fn default_value(&self) -> Option<(String, Value)> {
        match (&self.kind, &self.key) {
            (HookKind::Optional { default: Some(default) }, Some(key)) => {
                Some((key_text(key), default.produce()))
            }
            _ => None,
        }
    }

    fn forbids(&self) -> bool {
        matches!(self.kind, HookKind::Forbidden)
    }
}
