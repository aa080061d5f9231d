use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Category of a validation failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Generic,
    WrongKey,
    MissingKey,
    OnlyOneAllowed,
    ForbiddenKey,
    UnexpectedType,
    WrongLength,
    ForbiddenValue,
}

/// One level of context in a [`SchemaError`]: the automatically generated
/// message and the user-supplied one, either of which may be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
}

/// Produced by `validate` when data does not conform.
///
/// Layers are ordered outermost context first. Rendering prefers custom
/// messages: when any layer carries one, only custom messages are shown;
/// otherwise the automatic ones are. Duplicates are dropped in both cases.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaError {
    pub kind: ErrorKind,
    pub layers: Vec<Layer>,
}

impl SchemaError {
    pub fn new(kind: ErrorKind, auto: impl Into<String>, custom: Option<String>) -> Self {
        Self {
            kind,
            layers: vec![Layer {
                auto: Some(auto.into()),
                custom,
            }],
        }
    }

    /// A [`ErrorKind::Generic`] failure with a single message.
    pub fn generic(auto: impl Into<String>) -> Self {
        Self::new(ErrorKind::Generic, auto, None)
    }

    /// Adds an outer layer of context.
    pub fn prepend(&mut self, auto: Option<String>, custom: Option<String>) {
        self.layers.insert(0, Layer { auto, custom });
    }

    /// Builder form of [`SchemaError::prepend`].
    pub fn with_context(mut self, auto: Option<String>, custom: Option<String>) -> Self {
        self.prepend(auto, custom);
        self
    }

    /// Automatic messages, outermost first, without deduplication.
    pub fn autos(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().filter_map(|l| l.auto.as_deref())
    }

    /// Custom messages, outermost first, without deduplication.
    pub fn customs(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().filter_map(|l| l.custom.as_deref())
    }

    /// The rendered, newline-joined message.
    pub fn code(&self) -> String {
        let customs = unique(self.customs());
        if !customs.is_empty() {
            return customs.join("\n");
        }
        unique(self.autos()).join("\n")
    }

    /// Concatenates the layers of several failures into one. The kind of the
    /// last failure wins. Returns `None` for an empty input.
    pub(crate) fn merge(errors: Vec<SchemaError>) -> Option<SchemaError> {
        let kind = errors.last()?.kind;
        let layers = errors.into_iter().flat_map(|e| e.layers).collect();
        Some(SchemaError { kind, layers })
    }
}

fn unique<'a>(messages: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    messages.filter(|m| seen.insert(*m)).collect()
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::error::Error for SchemaError {}

/// Error returned by user predicates and transforms.
///
/// A [`SchemaError`] is re-raised with the caller's context; anything else
/// is reported as "`name(data)` raised `error`".
#[derive(Debug, Error)]
pub enum TransformError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl TransformError {
    pub fn other(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        TransformError::Other(error.into())
    }
}

/// Produced when a schema expression cannot be compiled.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("invalid regular expression {pattern:?}: {message}")]
    Regex { pattern: String, message: String },
    #[error(
        "optional keys with defaults must have simple, predictable values, like literal strings or ints; {key} is too complex"
    )]
    ComplexDefault { key: String },
    #[cfg(feature = "cel-eval")]
    #[error("CEL compile error in {expression:?}: {message}")]
    Cel { expression: String, message: String },
}

/// Produced when a schema cannot be rendered as a JSON Schema document.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DeriveError {
    #[error("{schema} cannot be converted to a JSON schema object")]
    NotAnObject { schema: String },
}

/// Serialization error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SerializeError {
    pub message: String,
}

/// Combined error type for the [`validate`](crate::validate) entry point.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Build error: {0}")]
    Build(#[from] BuildError),
    #[error("Validation error: {0}")]
    Validation(#[from] SchemaError),
}
