//! Schema expressions: the uncompiled description of a validator tree.
//!
//! Bare values become validators by [flavor](Flavor): JSON scalars compare by
//! equality, arrays become sequence validators and objects mapping
//! validators. Combinators wrap other expressions.

use crate::hook::{DefaultValue, KeyHook};
use crate::node::{ErrorFormat, Meta, SchemaNode};
use crate::pattern::{Pattern, RegexFlags};
use crate::predicate::{Predicate, Transform};
use crate::schema::Schema;
use crate::types::ValueType;
use serde_json::Value;
use std::sync::Arc;

/// Classification of a schema expression. Its rank is the default dispatch
/// priority of a mapping key of that flavor; lower ranks are tried first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Flavor {
    Comparable,
    Callable,
    Validator,
    Type,
    Mapping,
    Iterable,
}

impl Flavor {
    pub const fn rank(self) -> i32 {
        match self {
            Flavor::Comparable => 10,
            Flavor::Callable => 20,
            Flavor::Validator => 30,
            Flavor::Type => 40,
            Flavor::Mapping => 50,
            Flavor::Iterable => 60,
        }
    }
}

/// Priority of [`Expr::Any`] keys: after every other flavor.
pub const ANY_PRIORITY: i32 = 100;

/// The flavor of an expression. Annotations are transparent.
pub fn classify(expr: &Expr) -> Flavor {
    match expr {
        Expr::Literal(Value::Array(_)) | Expr::Seq(_) => Flavor::Iterable,
        Expr::Literal(Value::Object(_)) | Expr::Map(_) => Flavor::Mapping,
        Expr::Literal(_) => Flavor::Comparable,
        Expr::Type(_) => Flavor::Type,
        Expr::Predicate(_) => Flavor::Callable,
        Expr::Annotated { expr, .. } => classify(expr),
        _ => Flavor::Validator,
    }
}

/// Source of an [`Expr::Regex`].
#[derive(Debug)]
pub enum RegexSource {
    Text { pattern: String, flags: RegexFlags },
    Compiled(Box<dyn Pattern>),
}

/// A schema expression, compiled by [`Schema::new`].
#[derive(Debug)]
pub enum Expr {
    Literal(Value),
    Type(ValueType),
    Predicate(Predicate),
    Node(Box<dyn SchemaNode>),
    Map(MapExpr),
    Seq(SeqExpr),
    And(Vec<Expr>),
    Or { items: Vec<Expr>, only_one: bool },
    Not(Box<Expr>),
    Const(Box<Expr>),
    Use(Transform),
    Regex(RegexSource),
    Any,
    Optional {
        key: Box<Expr>,
        default: Option<DefaultValue>,
    },
    Forbidden(Box<Expr>),
    Clean(Box<Expr>),
    Hook(HookExpr),
    Annotated { expr: Box<Expr>, meta: Meta },
}

fn exprs<I, E>(items: I) -> Vec<Expr>
where
    I: IntoIterator<Item = E>,
    E: Into<Expr>,
{
    items.into_iter().map(Into::into).collect()
}

impl Expr {
    pub fn literal(value: impl Into<Value>) -> Expr {
        Expr::Literal(value.into())
    }

    pub fn any() -> Expr {
        Expr::Any
    }

    pub fn node(node: impl SchemaNode + 'static) -> Expr {
        Expr::Node(Box::new(node))
    }

    pub fn predicate<F>(name: impl Into<String>, check: F) -> Expr
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Expr::Predicate(Predicate::new(name, check))
    }

    pub fn transform<F>(name: impl Into<String>, apply: F) -> Expr
    where
        F: Fn(&Value) -> Result<Value, crate::error::TransformError> + Send + Sync + 'static,
    {
        Expr::Use(Transform::new(name, apply))
    }

    pub fn map<K, V, I>(entries: I) -> Expr
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Expr>,
        V: Into<Expr>,
    {
        Expr::Map(entries.into_iter().collect())
    }

    pub fn seq<I, E>(items: I) -> Expr
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Expr::Seq(SeqExpr::new(items))
    }

    pub fn and<I, E>(items: I) -> Expr
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Expr::And(exprs(items))
    }

    pub fn or<I, E>(items: I) -> Expr
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Expr::Or {
            items: exprs(items),
            only_one: false,
        }
    }

    /// An `Or` that fails the enclosing mapping run when more than one
    /// alternative matched during it.
    pub fn only_one<I, E>(items: I) -> Expr
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Expr::Or {
            items: exprs(items),
            only_one: true,
        }
    }

    pub fn not(expr: impl Into<Expr>) -> Expr {
        Expr::Not(Box::new(expr.into()))
    }

    pub fn constant(expr: impl Into<Expr>) -> Expr {
        Expr::Const(Box::new(expr.into()))
    }

    pub fn regex(pattern: impl Into<String>) -> Expr {
        Expr::regex_with_flags(pattern, RegexFlags::default())
    }

    pub fn regex_with_flags(pattern: impl Into<String>, flags: RegexFlags) -> Expr {
        Expr::Regex(RegexSource::Text {
            pattern: pattern.into(),
            flags,
        })
    }

    /// A regex from an already compiled pattern.
    pub fn compiled_regex(pattern: impl Pattern + 'static) -> Expr {
        Expr::Regex(RegexSource::Compiled(Box::new(pattern)))
    }

    pub fn optional(key: impl Into<Expr>) -> Expr {
        Expr::Optional {
            key: Box::new(key.into()),
            default: None,
        }
    }

    /// An optional key whose value is `default` when absent. The key must be
    /// a scalar literal.
    pub fn optional_default(key: impl Into<Expr>, default: impl Into<Value>) -> Expr {
        Expr::Optional {
            key: Box::new(key.into()),
            default: Some(DefaultValue::Value(default.into())),
        }
    }

    /// Like [`Expr::optional_default`], calling `factory` for every
    /// validation that needs the default.
    pub fn optional_default_with<F>(key: impl Into<Expr>, factory: F) -> Expr
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Expr::Optional {
            key: Box::new(key.into()),
            default: Some(DefaultValue::Factory(Arc::new(factory))),
        }
    }

    pub fn forbidden(key: impl Into<Expr>) -> Expr {
        Expr::Forbidden(Box::new(key.into()))
    }

    pub fn clean(key: impl Into<Expr>) -> Expr {
        Expr::Clean(Box::new(key.into()))
    }

    pub fn hook(hook: HookExpr) -> Expr {
        Expr::Hook(hook)
    }

    fn annotate(self, update: impl FnOnce(&mut Meta)) -> Expr {
        match self {
            Expr::Annotated { expr, mut meta } => {
                update(&mut meta);
                Expr::Annotated { expr, meta }
            }
            other => {
                let mut meta = Meta::default();
                update(&mut meta);
                Expr::Annotated {
                    expr: Box::new(other),
                    meta,
                }
            }
        }
    }

    /// Prefixes automatic error messages with `'name'`.
    pub fn named(self, name: impl Into<String>) -> Expr {
        let name = name.into();
        self.annotate(|meta| meta.name = Some(name))
    }

    /// Custom error message; `{}` is replaced with the offending data.
    pub fn error(self, template: impl Into<String>) -> Expr {
        let template = template.into();
        self.annotate(|meta| meta.error = Some(ErrorFormat::Template(template)))
    }

    pub fn error_with<F>(self, format: F) -> Expr
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.annotate(|meta| meta.error = Some(ErrorFormat::Custom(Arc::new(format))))
    }

    /// Replaces the derived schema of this node.
    pub fn with_json_schema(self, schema: Value) -> Expr {
        self.annotate(|meta| meta.json_schema = Some(schema))
    }
}

/// Entries and bounds of a mapping validator.
#[derive(Debug, Default)]
pub struct MapExpr {
    pub(crate) entries: Vec<(Expr, Expr)>,
    pub(crate) min_length: usize,
    pub(crate) max_length: Option<usize>,
    pub(crate) ignore_extra_keys: Option<bool>,
}

impl MapExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, key: impl Into<Expr>, value: impl Into<Expr>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = min;
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Exact number of keys.
    pub fn length(self, length: usize) -> Self {
        self.min_length(length).max_length(length)
    }

    /// Overrides [`Options::ignore_extra_keys`](crate::Options) for this mapping.
    pub fn ignore_extra_keys(mut self, ignore: bool) -> Self {
        self.ignore_extra_keys = Some(ignore);
        self
    }

    pub(crate) fn from_literal(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter()
            .map(|(k, v)| (Expr::Literal(Value::String(k)), Expr::Literal(v)))
            .collect()
    }
}

impl<K: Into<Expr>, V: Into<Expr>> FromIterator<(K, V)> for MapExpr {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            ..Self::default()
        }
    }
}

/// Element alternatives and bounds of a sequence validator.
///
/// Elements must match one of `items`; no items means any element.
#[derive(Debug, Default)]
pub struct SeqExpr {
    pub(crate) items: Vec<Expr>,
    pub(crate) min_length: usize,
    pub(crate) max_length: Option<usize>,
}

impl SeqExpr {
    pub fn new<I, E>(items: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Self {
            items: exprs(items),
            ..Self::default()
        }
    }

    pub fn min_length(mut self, min: usize) -> Self {
        self.min_length = min;
        self
    }

    pub fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    pub fn length(self, length: usize) -> Self {
        self.min_length(length).max_length(length)
    }
}

/// A key with a user-defined [`KeyHook`] policy.
#[derive(Debug)]
pub struct HookExpr {
    pub(crate) key: Box<Expr>,
    pub(crate) policy: Arc<dyn KeyHook>,
    pub(crate) required: bool,
    pub(crate) priority: Option<i32>,
}

impl HookExpr {
    pub fn new(key: impl Into<Expr>, policy: impl KeyHook + 'static) -> Self {
        Self {
            key: Box::new(key.into()),
            policy: Arc::new(policy),
            required: false,
            priority: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Overrides the default priority (one after the key's flavor).
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }
}

// ─── Conversions ────────────────────────────────────────────────────────────

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Literal(value)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::Literal(Value::from(value))
    }
}

impl From<String> for Expr {
    fn from(value: String) -> Self {
        Expr::Literal(Value::String(value))
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Expr::Literal(Value::Bool(value))
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Expr::Literal(Value::from(value))
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Expr::Literal(Value::from(value))
    }
}

impl From<u64> for Expr {
    fn from(value: u64) -> Self {
        Expr::Literal(Value::from(value))
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Literal(Value::from(value))
    }
}

impl From<ValueType> for Expr {
    fn from(value: ValueType) -> Self {
        Expr::Type(value)
    }
}

impl From<Predicate> for Expr {
    fn from(value: Predicate) -> Self {
        Expr::Predicate(value)
    }
}

impl From<Transform> for Expr {
    fn from(value: Transform) -> Self {
        Expr::Use(value)
    }
}

impl From<MapExpr> for Expr {
    fn from(value: MapExpr) -> Self {
        Expr::Map(value)
    }
}

impl From<SeqExpr> for Expr {
    fn from(value: SeqExpr) -> Self {
        Expr::Seq(value)
    }
}

impl From<HookExpr> for Expr {
    fn from(value: HookExpr) -> Self {
        Expr::Hook(value)
    }
}

impl From<Box<dyn SchemaNode>> for Expr {
    fn from(value: Box<dyn SchemaNode>) -> Self {
        Expr::Node(value)
    }
}

impl From<Schema> for Expr {
    fn from(value: Schema) -> Self {
        Expr::Node(value.into_node())
    }
}
