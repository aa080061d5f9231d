//! The validator node interface and its optional capabilities.

use crate::error::{ErrorKind, SchemaError};
use crate::fragment::Fragment;
use crate::hook::KeyHook;
use crate::json_schema::Target;
use crate::types::{ValueType, key_text};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A compiled validator.
///
/// Every node validates and derives a schema fragment. The remaining methods
/// are capabilities that the mapping engine queries; the defaults describe a
/// node that has none of them.
pub trait SchemaNode: fmt::Debug + fmt::Display + Send + Sync {
    /// Returns the validated (possibly transformed) value. Never mutates `data`.
    fn validate(&self, data: &Value) -> Result<Value, SchemaError>;

    fn is_valid(&self, data: &Value) -> bool {
        self.validate(data).is_ok()
    }

    fn json_schema(&self, _target: Target) -> Fragment {
        Fragment::Nothing
    }

    /// Dispatch priority when used as a mapping key; lower is tried first.
    fn priority(&self) -> Option<i32> {
        None
    }

    /// Which bucket of a mapping this node lands in when used as a key.
    fn bucket(&self) -> Bucket {
        Bucket::Catchall
    }

    /// Per-episode state that the enclosing mapping resets after each run.
    fn resettable(&self) -> Option<&dyn Reset> {
        None
    }

    /// Key-handling policy when used as a mapping key.
    fn key_hook(&self) -> Option<&dyn KeyHook> {
        None
    }
}

/// End-of-episode hook for nodes that carry state across a mapping run.
pub trait Reset {
    fn reset(&self) -> Result<(), SchemaError>;
}

/// Where a key schema is indexed inside a mapping.
#[derive(Clone, Debug, PartialEq)]
pub enum Bucket {
    /// Tried only for keys equal to the literal.
    Exact(Value),
    /// Tried for keys whose type refines one of these.
    Types(Vec<ValueType>),
    /// Tried for every key.
    Catchall,
}

/// Runs every reset in order and reports the first failure.
pub(crate) fn reset_all<'a>(resets: impl IntoIterator<Item = &'a dyn Reset>) -> Result<(), SchemaError> {
    let mut first = None;
    for reset in resets {
        if let Err(err) = reset.reset() {
            first.get_or_insert(err);
        }
    }
    first.map_or(Ok(()), Err)
}

/// Resets registered for one mapping run. [`ResetScope::finish`] runs them
/// and reports failures; if the scope is dropped unfinished (a panic in a
/// child), they still run and failures are discarded.
pub(crate) struct ResetScope<'a> {
    pending: Vec<&'a dyn Reset>,
}

impl<'a> ResetScope<'a> {
    pub(crate) fn new(resets: impl IntoIterator<Item = &'a dyn Reset>) -> Self {
        Self {
            pending: resets.into_iter().collect(),
        }
    }

    pub(crate) fn finish(mut self) -> Result<(), SchemaError> {
        reset_all(std::mem::take(&mut self.pending))
    }
}

impl Drop for ResetScope<'_> {
    fn drop(&mut self) {
        let _ = reset_all(self.pending.drain(..));
    }
}

// ─── Metadata ──────────────────────────────────────────────────────────────

/// User-supplied error message: a template where `{}` is replaced with the
/// offending data, or a formatter.
#[derive(Clone)]
pub enum ErrorFormat {
    Template(String),
    Custom(Arc<dyn Fn(&Value) -> String + Send + Sync>),
}

impl ErrorFormat {
    pub fn format(&self, data: &Value) -> String {
        match self {
            ErrorFormat::Template(template) => template.replace("{}", &key_text(data)),
            ErrorFormat::Custom(format) => format(data),
        }
    }
}

impl fmt::Debug for ErrorFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorFormat::Template(template) => f.debug_tuple("Template").field(template).finish(),
            ErrorFormat::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Name, custom error and schema override attached to a node.
#[derive(Clone, Debug, Default)]
pub struct Meta {
    pub(crate) name: Option<String>,
    pub(crate) error: Option<ErrorFormat>,
    pub(crate) json_schema: Option<Value>,
}

impl Meta {
    /// Fills the name and error this node lacks from `parent`. The schema
    /// override is never inherited.
    pub(crate) fn inherit(self, parent: &Meta) -> Meta {
        Meta {
            name: self.name.or_else(|| parent.name.clone()),
            error: self.error.or_else(|| parent.error.clone()),
            json_schema: self.json_schema,
        }
    }

    /// The part of this metadata that generated children receive.
    pub(crate) fn inheritable(&self) -> Meta {
        Meta {
            name: self.name.clone(),
            error: self.error.clone(),
            json_schema: None,
        }
    }

    /// What mapping keys and values receive: the error only.
    pub(crate) fn errors_only(&self) -> Meta {
        Meta {
            error: self.error.clone(),
            ..Meta::default()
        }
    }

    /// `other`'s fields where set, this node's otherwise.
    pub(crate) fn overlay(self, other: Meta) -> Meta {
        Meta {
            name: other.name.or(self.name),
            error: other.error.or(self.error),
            json_schema: other.json_schema.or(self.json_schema),
        }
    }

    pub(crate) fn custom(&self, data: &Value) -> Option<String> {
        self.error.as_ref().map(|e| e.format(data))
    }

    pub(crate) fn label(&self, message: String) -> String {
        match &self.name {
            Some(name) => format!("'{name}' {message}"),
            None => message,
        }
    }

    pub(crate) fn fail(&self, kind: ErrorKind, message: String, data: &Value) -> SchemaError {
        SchemaError::new(kind, self.label(message), self.custom(data))
    }

    /// Adds this node's custom message to a child failure.
    pub(crate) fn wrap(&self, mut err: SchemaError, data: &Value) -> SchemaError {
        err.prepend(None, self.custom(data));
        err
    }

    pub(crate) fn derive_or(&self, derive: impl FnOnce() -> Fragment) -> Fragment {
        match &self.json_schema {
            Some(schema) => Fragment::from_value(schema.clone()),
            None => derive(),
        }
    }
}
