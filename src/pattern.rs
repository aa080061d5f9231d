//! Regular-expression validation and the pluggable regex engine.

use crate::error::{BuildError, ErrorKind, SchemaError};
use crate::fragment::Fragment;
use crate::json_schema::Target;
use crate::node::{Bucket, Meta, SchemaNode};
use crate::types::ValueType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Compilation flags for [`RegexEngine::compile`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegexFlags {
    pub case_insensitive: bool,
    pub multi_line: bool,
    pub dot_matches_new_line: bool,
    pub ignore_whitespace: bool,
}

/// A compiled pattern. `search` matches anywhere in the text.
pub trait Pattern: fmt::Debug + Send + Sync {
    fn search(&self, text: &str) -> bool;
    fn as_str(&self) -> &str;
}

impl Pattern for regex::Regex {
    fn search(&self, text: &str) -> bool {
        self.is_match(text)
    }

    fn as_str(&self) -> &str {
        regex::Regex::as_str(self)
    }
}

/// Turns pattern source into a [`Pattern`].
pub trait RegexEngine: fmt::Debug + Send + Sync {
    fn compile(&self, pattern: &str, flags: RegexFlags) -> Result<Box<dyn Pattern>, BuildError>;
}

/// Engine backed by the `regex` crate.
#[derive(Clone, Debug, Default)]
pub struct StdRegexEngine {
    size_limit: Option<usize>,
}

impl StdRegexEngine {
    /// Caps the compiled program size, rejecting larger patterns at build time.
    pub fn with_size_limit(size_limit: usize) -> Self {
        Self {
            size_limit: Some(size_limit),
        }
    }
}

impl RegexEngine for StdRegexEngine {
    fn compile(&self, pattern: &str, flags: RegexFlags) -> Result<Box<dyn Pattern>, BuildError> {
        let mut builder = regex::RegexBuilder::new(pattern);
        builder
            .case_insensitive(flags.case_insensitive)
            .multi_line(flags.multi_line)
            .dot_matches_new_line(flags.dot_matches_new_line)
            .ignore_whitespace(flags.ignore_whitespace);
        if let Some(limit) = self.size_limit {
            builder.size_limit(limit);
        }
        let compiled = builder.build().map_err(|e| BuildError::Regex {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Box::new(compiled))
    }
}

/// Accepts strings in which the pattern matches somewhere.
#[derive(Debug)]
pub struct Regex {
    pattern: Box<dyn Pattern>,
    meta: Meta,
}

impl Regex {
    pub(crate) fn new(pattern: Box<dyn Pattern>, meta: Meta) -> Self {
        Self { pattern, meta }
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Regex({:?})", self.pattern.as_str())
    }
}

impl SchemaNode for Regex {
    fn validate(&self, data: &Value) -> Result<Value, SchemaError> {
        match data.as_str() {
            None => Err(self.meta.fail(
                ErrorKind::UnexpectedType,
                format!("{data} is not a string and can't match {self}"),
                data,
            )),
            Some(text) if self.pattern.search(text) => Ok(data.clone()),
            Some(_) => Err(self.meta.fail(
                ErrorKind::Generic,
                format!("{self} does not match {data}"),
                data,
            )),
        }
    }

    fn json_schema(&self, _target: Target) -> Fragment {
        self.meta.derive_or(|| {
            let mut map = Map::new();
            map.insert("type".into(), Value::from("string"));
            map.insert("pattern".into(), Value::from(self.pattern.as_str()));
            Fragment::Document(map)
        })
    }

    fn bucket(&self) -> Bucket {
        Bucket::Types(vec![ValueType::String])
    }
}
