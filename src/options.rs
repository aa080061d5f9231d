//! Build-time options: extra-key policy, regex engine, and the resolver that
//! chooses the node for each validator role.

use crate::combinator::{And, Or, Use};
use crate::hook::Hook;
use crate::leaf::{Any, Const, Not, Wrapper};
use crate::mapping::Mapping;
use crate::node::SchemaNode;
use crate::pattern::{Regex, RegexEngine, StdRegexEngine};
use crate::sequence::Sequence;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Chooses the node built for each validator role.
///
/// Every method receives the default node and returns what the compiled tree
/// should hold instead. A replacement used as a mapping key should forward
/// the capabilities of the node it wraps.
pub trait Resolver: fmt::Debug + Send + Sync {
    fn wrapper(&self, node: Wrapper) -> Box<dyn SchemaNode> {
        Box::new(node)
    }

    fn mapping(&self, node: Mapping) -> Box<dyn SchemaNode> {
        Box::new(node)
    }

    fn sequence(&self, node: Sequence) -> Box<dyn SchemaNode> {
        Box::new(node)
    }

    fn and(&self, node: And) -> Box<dyn SchemaNode> {
        Box::new(node)
    }

    fn or(&self, node: Or) -> Box<dyn SchemaNode> {
        Box::new(node)
    }

    fn not(&self, node: Not) -> Box<dyn SchemaNode> {
        Box::new(node)
    }

    fn constant(&self, node: Const) -> Box<dyn SchemaNode> {
        Box::new(node)
    }

    fn transform(&self, node: Use) -> Box<dyn SchemaNode> {
        Box::new(node)
    }

    fn regex(&self, node: Regex) -> Box<dyn SchemaNode> {
        Box::new(node)
    }

    fn any(&self, node: Any) -> Box<dyn SchemaNode> {
        Box::new(node)
    }

    fn optional(&self, node: Hook) -> Box<dyn SchemaNode> {
        Box::new(node)
    }

    fn forbidden(&self, node: Hook) -> Box<dyn SchemaNode> {
        Box::new(node)
    }

    fn clean(&self, node: Hook) -> Box<dyn SchemaNode> {
        Box::new(node)
    }

    fn hook(&self, node: Hook) -> Box<dyn SchemaNode> {
        Box::new(node)
    }
}

/// Resolver that keeps every default node.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultResolver;

impl Resolver for DefaultResolver {}

/// Serializable options, e.g. read from a configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptionsConfig {
    pub ignore_extra_keys: bool,
    /// Compiled size limit for regex patterns, in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex_size_limit: Option<usize>,
}

/// Options applied while compiling a schema.
#[derive(Clone, Debug)]
pub struct Options {
    /// Whether mappings tolerate unmatched keys (they are dropped from the output).
    pub ignore_extra_keys: bool,
    pub regex: Arc<dyn RegexEngine>,
    pub resolver: Arc<dyn Resolver>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            ignore_extra_keys: false,
            regex: Arc::new(StdRegexEngine::default()),
            resolver: Arc::new(DefaultResolver),
        }
    }
}

impl Options {
    pub fn from_config(config: &OptionsConfig) -> Self {
        let regex = match config.regex_size_limit {
            Some(limit) => StdRegexEngine::with_size_limit(limit),
            None => StdRegexEngine::default(),
        };
        Self {
            ignore_extra_keys: config.ignore_extra_keys,
            regex: Arc::new(regex),
            ..Self::default()
        }
    }

    pub fn ignore_extra_keys(mut self, ignore: bool) -> Self {
        self.ignore_extra_keys = ignore;
        self
    }

    pub fn with_regex_engine(mut self, engine: Arc<dyn RegexEngine>) -> Self {
        self.regex = engine;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }
}
