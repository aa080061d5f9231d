//! Expression → node compilation.

use crate::combinator::{And, Or, Use};
use crate::error::BuildError;
use crate::expr::{Expr, Flavor, HookExpr, MapExpr, RegexSource, SeqExpr, classify};
use crate::hook::{Hook, HookKind};
use crate::leaf::{Any, Const, Leaf, Not, Wrapper};
use crate::mapping::{Mapping, MappingEntry};
use crate::node::{Meta, SchemaNode};
use crate::options::Options;
use crate::pattern::Regex;
use crate::sequence::Sequence;
use serde_json::Value;

/// The literal a key expression was written as, if it is a bare scalar.
fn literal_of(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Literal(value) if !value.is_array() && !value.is_object() => Some(value.clone()),
        Expr::Annotated { expr, .. } => literal_of(expr),
        _ => None,
    }
}

pub(crate) struct Compiler<'a> {
    options: &'a Options,
}

impl<'a> Compiler<'a> {
    pub(crate) fn new(options: &'a Options) -> Self {
        Self { options }
    }

    /// Compiles `expr`. `inherited` is the name and error of the nearest
    /// enclosing node; validators generated for bare values adopt whatever
    /// they do not set themselves.
    pub(crate) fn compile(&self, expr: Expr, inherited: &Meta) -> Result<Box<dyn SchemaNode>, BuildError> {
        self.compile_with(expr, Meta::default(), inherited)
    }

    fn compile_all(&self, items: Vec<Expr>, inherited: &Meta) -> Result<Vec<Box<dyn SchemaNode>>, BuildError> {
        items
            .into_iter()
            .map(|item| self.compile(item, inherited))
            .collect()
    }

    fn compile_with(&self, expr: Expr, explicit: Meta, inherited: &Meta) -> Result<Box<dyn SchemaNode>, BuildError> {
        let resolver = &self.options.resolver;
        let node = match expr {
            Expr::Annotated { expr, meta } => return self.compile_with(*expr, meta.overlay(explicit), inherited),
            Expr::Literal(Value::Array(items)) => {
                let seq = SeqExpr::new(items);
                self.sequence(seq, explicit.inherit(inherited))?
            }
            Expr::Seq(seq) => self.sequence(seq, explicit.inherit(inherited))?,
            Expr::Literal(Value::Object(map)) => {
                self.mapping(MapExpr::from_literal(map), explicit.inherit(inherited))?
            }
            Expr::Map(map) => self.mapping(map, explicit.inherit(inherited))?,
            Expr::Literal(value) => resolver.wrapper(Wrapper::new(Leaf::Comparable(value), explicit.inherit(inherited))),
            Expr::Type(value_type) => resolver.wrapper(Wrapper::new(Leaf::Type(value_type), explicit.inherit(inherited))),
            Expr::Predicate(predicate) => {
                resolver.wrapper(Wrapper::new(Leaf::Callable(predicate), explicit.inherit(inherited)))
            }
            Expr::Node(node) => resolver.wrapper(Wrapper::new(Leaf::Validator(node), explicit.inherit(inherited))),
            Expr::Any => resolver.any(Any::new(explicit)),
            Expr::And(items) => {
                let items = self.compile_all(items, &explicit.inheritable())?;
                resolver.and(And::new(items, explicit))
            }
            Expr::Or { items, only_one } => {
                let items = self.compile_all(items, &explicit.inheritable())?;
                resolver.or(Or::new(items, only_one, explicit))
            }
            Expr::Not(inner) => {
                let inner = self.compile(*inner, &explicit.inheritable())?;
                resolver.not(Not::new(inner, explicit))
            }
            Expr::Const(inner) => {
                let inner = self.compile(*inner, &explicit.inheritable())?;
                resolver.constant(Const::new(inner, explicit))
            }
            Expr::Use(transform) => resolver.transform(Use::new(transform, explicit)),
            Expr::Regex(source) => {
                let pattern = match source {
                    RegexSource::Text { pattern, flags } => self.options.regex.compile(&pattern, flags)?,
                    RegexSource::Compiled(pattern) => pattern,
                };
                resolver.regex(Regex::new(pattern, explicit))
            }
            Expr::Optional { key, default } => {
                let hook = self.hook(*key, HookKind::Optional { default }, false, None, explicit)?;
                resolver.optional(hook)
            }
            Expr::Forbidden(key) => resolver.forbidden(self.hook(*key, HookKind::Forbidden, false, None, explicit)?),
            Expr::Clean(key) => resolver.clean(self.hook(*key, HookKind::Clean, false, None, explicit)?),
            Expr::Hook(HookExpr {
                key,
                policy,
                required,
                priority,
            }) => resolver.hook(self.hook(*key, HookKind::Custom(policy), required, priority, explicit)?),
        };
        Ok(node)
    }

    fn sequence(&self, seq: SeqExpr, meta: Meta) -> Result<Box<dyn SchemaNode>, BuildError> {
        let SeqExpr {
            mut items,
            min_length,
            max_length,
        } = seq;
        let resolver = &self.options.resolver;
        let item = match items.len() {
            0 => resolver.any(Any::new(Meta::default())),
            1 => self.compile(items.swap_remove(0), &meta)?,
            _ => {
                let alternatives = self.compile_all(items, &meta)?;
                resolver.or(Or::new(alternatives, false, meta.inheritable()))
            }
        };
        Ok(resolver.sequence(Sequence::new(item, min_length, max_length, meta)))
    }

    fn mapping(&self, map: MapExpr, meta: Meta) -> Result<Box<dyn SchemaNode>, BuildError> {
        let MapExpr {
            entries,
            min_length,
            max_length,
            ignore_extra_keys,
        } = map;
        let child = meta.errors_only();
        let entries = entries
            .into_iter()
            .map(|(key, value)| {
                let name = literal_of(&key);
                Ok(MappingEntry {
                    key: self.compile(key, &child)?,
                    value: self.compile(value, &child)?,
                    name,
                })
            })
            .collect::<Result<Vec<_>, BuildError>>()?;
        let ignore_extra_keys = ignore_extra_keys.unwrap_or(self.options.ignore_extra_keys);
        let mapping = Mapping::new(entries, min_length, max_length, ignore_extra_keys, meta);
        Ok(self.options.resolver.mapping(mapping))
    }

    fn hook(
        &self,
        key: Expr,
        kind: HookKind,
        required: bool,
        priority: Option<i32>,
        meta: Meta,
    ) -> Result<Hook, BuildError> {
        let flavor = classify(&key);
        let literal = literal_of(&key);
        let default_priority = match kind {
            HookKind::Optional { .. } => flavor.rank() - 1,
            _ => flavor.rank() + 1,
        };
        let inner = self.compile(key, &meta.inheritable())?;
        let has_default = matches!(kind, HookKind::Optional { default: Some(_) });
        if has_default && (flavor != Flavor::Comparable || literal.is_none()) {
            return Err(BuildError::ComplexDefault {
                key: inner.to_string(),
            });
        }
        Ok(Hook::new(
            inner,
            kind,
            literal,
            required,
            priority.unwrap_or(default_priority),
            meta,
        ))
    }
}
