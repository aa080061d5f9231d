//! Leaf validators: literals, type checks, predicates and wrapped nodes,
//! plus the `Any`, `Const` and `Not` wrappers.

use crate::error::{ErrorKind, SchemaError, TransformError};
use crate::expr::{ANY_PRIORITY, Flavor};
use crate::fragment::Fragment;
use crate::hook::KeyHook;
use crate::json_schema::Target;
use crate::node::{Bucket, Meta, Reset, SchemaNode};
use crate::predicate::Predicate;
use crate::types::{ValueType, values_equal};
use serde_json::Value;
use std::fmt;

/// What a [`Wrapper`] checks.
#[derive(Debug)]
pub enum Leaf {
    Comparable(Value),
    Callable(Predicate),
    Type(ValueType),
    Validator(Box<dyn SchemaNode>),
}

impl Leaf {
    pub fn flavor(&self) -> Flavor {
        match self {
            Leaf::Comparable(_) => Flavor::Comparable,
            Leaf::Callable(_) => Flavor::Callable,
            Leaf::Type(_) => Flavor::Type,
            Leaf::Validator(_) => Flavor::Validator,
        }
    }
}

/// The validator generated for a bare literal, type, predicate or node.
#[derive(Debug)]
pub struct Wrapper {
    leaf: Leaf,
    priority: i32,
    meta: Meta,
}

impl Wrapper {
    pub(crate) fn new(leaf: Leaf, meta: Meta) -> Self {
        let priority = match &leaf {
            Leaf::Validator(node) => node.priority().unwrap_or(Flavor::Validator.rank()),
            other => other.flavor().rank(),
        };
        Self {
            leaf,
            priority,
            meta,
        }
    }

    pub fn leaf(&self) -> &Leaf {
        &self.leaf
    }
}

impl fmt::Display for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.leaf {
            Leaf::Comparable(value) => write!(f, "{value}"),
            Leaf::Callable(predicate) => f.write_str(predicate.name()),
            Leaf::Type(value_type) => write!(f, "{value_type}"),
            Leaf::Validator(node) => write!(f, "{node}"),
        }
    }
}

impl SchemaNode for Wrapper {
    fn validate(&self, data: &Value) -> Result<Value, SchemaError> {
        match &self.leaf {
            Leaf::Validator(node) => node.validate(data).map_err(|err| self.meta.wrap(err, data)),
            Leaf::Type(value_type) => {
                if value_type.matches(data) {
                    Ok(data.clone())
                } else {
                    Err(self.meta.fail(
                        ErrorKind::UnexpectedType,
                        format!("{data} should be instance of '{value_type}'"),
                        data,
                    ))
                }
            }
            Leaf::Callable(predicate) => match predicate.call(data) {
                Ok(true) => Ok(data.clone()),
                Ok(false) => Err(self.meta.fail(
                    ErrorKind::Generic,
                    format!("{}({data}) should evaluate to true", predicate.name()),
                    data,
                )),
                Err(TransformError::Schema(err)) => Err(self.meta.wrap(err, data)),
                Err(TransformError::Other(err)) => Err(self.meta.fail(
                    ErrorKind::Generic,
                    format!("{}({data}) raised {err}", predicate.name()),
                    data,
                )),
            },
            Leaf::Comparable(expected) => {
                if values_equal(expected, data) {
                    Ok(data.clone())
                } else {
                    Err(self.meta.fail(
                        ErrorKind::Generic,
                        format!("{expected} does not match {data}"),
                        data,
                    ))
                }
            }
        }
    }

    fn json_schema(&self, target: Target) -> Fragment {
        self.meta.derive_or(|| match &self.leaf {
            Leaf::Validator(node) => node.json_schema(target),
            Leaf::Type(value_type) => match value_type.json_name() {
                Some(name) => Fragment::Types(vec![name.to_string()]),
                None => Fragment::Everything,
            },
            Leaf::Comparable(value) => match target {
                Target::JsonSchema => Fragment::Const(value.clone()),
                Target::Default | Target::OpenApi => Fragment::Enum(vec![value.clone()]),
            },
            Leaf::Callable(predicate) => predicate
                .json_schema()
                .map_or(Fragment::Nothing, |schema| Fragment::from_value(schema.clone())),
        })
    }

    fn priority(&self) -> Option<i32> {
        Some(self.priority)
    }

    fn bucket(&self) -> Bucket {
        match &self.leaf {
            Leaf::Comparable(value) => Bucket::Exact(value.clone()),
            Leaf::Type(value_type) => Bucket::Types(vec![*value_type]),
            Leaf::Validator(node) => node.bucket(),
            Leaf::Callable(_) => Bucket::Catchall,
        }
    }

    fn resettable(&self) -> Option<&dyn Reset> {
        match &self.leaf {
            Leaf::Validator(node) => node.resettable(),
            _ => None,
        }
    }

    fn key_hook(&self) -> Option<&dyn KeyHook> {
        match &self.leaf {
            Leaf::Validator(node) => node.key_hook(),
            _ => None,
        }
    }
}

/// Accepts every value unchanged. Tried last when used as a mapping key.
#[derive(Debug, Default)]
pub struct Any {
    meta: Meta,
}

impl Any {
    pub(crate) fn new(meta: Meta) -> Self {
        Self { meta }
    }
}

impl fmt::Display for Any {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Any")
    }
}

impl SchemaNode for Any {
    fn validate(&self, data: &Value) -> Result<Value, SchemaError> {
        Ok(data.clone())
    }

    fn json_schema(&self, _target: Target) -> Fragment {
        self.meta.derive_or(|| Fragment::Everything)
    }

    fn priority(&self) -> Option<i32> {
        Some(ANY_PRIORITY)
    }
}

/// Validates with the wrapped node but returns the input unchanged.
#[derive(Debug)]
pub struct Const {
    inner: Box<dyn SchemaNode>,
    meta: Meta,
}

impl Const {
    pub(crate) fn new(inner: Box<dyn SchemaNode>, meta: Meta) -> Self {
        Self { inner, meta }
    }
}

impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Const({})", self.inner)
    }
}

impl SchemaNode for Const {
    fn validate(&self, data: &Value) -> Result<Value, SchemaError> {
        self.inner
            .validate(data)
            .map_err(|err| self.meta.wrap(err, data))?;
        Ok(data.clone())
    }

    fn json_schema(&self, target: Target) -> Fragment {
        self.meta.derive_or(|| self.inner.json_schema(target))
    }

    fn priority(&self) -> Option<i32> {
        self.inner.priority()
    }

    fn bucket(&self) -> Bucket {
        self.inner.bucket()
    }

    fn resettable(&self) -> Option<&dyn Reset> {
        self.inner.resettable()
    }
}

/// Succeeds exactly when the wrapped node fails; returns the input unchanged.
#[derive(Debug)]
pub struct Not {
    inner: Box<dyn SchemaNode>,
    meta: Meta,
}

impl Not {
    pub(crate) fn new(inner: Box<dyn SchemaNode>, meta: Meta) -> Self {
        Self { inner, meta }
    }
}

impl fmt::Display for Not {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Not({})", self.inner)
    }
}

impl SchemaNode for Not {
    fn validate(&self, data: &Value) -> Result<Value, SchemaError> {
        match self.inner.validate(data) {
            Err(_) => Ok(data.clone()),
            Ok(_) => Err(self.meta.fail(
                ErrorKind::ForbiddenValue,
                format!("{data} matches forbidden value {}", self.inner),
                data,
            )),
        }
    }

    fn json_schema(&self, target: Target) -> Fragment {
        self.meta.derive_or(|| self.inner.json_schema(target).negate())
    }

    fn priority(&self) -> Option<i32> {
        self.inner.priority()
    }
}
