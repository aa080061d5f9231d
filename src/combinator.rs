//! `And`, `Or` and `Use`.

use crate::error::{ErrorKind, SchemaError, TransformError};
use crate::fragment::{Fragment, and_merge, or_merge};
use crate::json_schema::Target;
use crate::node::{Meta, Reset, SchemaNode, reset_all};
use crate::predicate::Transform;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

fn write_items(f: &mut fmt::Formatter<'_>, name: &str, items: &[Box<dyn SchemaNode>]) -> fmt::Result {
    write!(f, "{name}(")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(")")
}

/// Threads the value through every child in order.
#[derive(Debug)]
pub struct And {
    items: Vec<Box<dyn SchemaNode>>,
    meta: Meta,
}

impl And {
    pub(crate) fn new(items: Vec<Box<dyn SchemaNode>>, meta: Meta) -> Self {
        Self { items, meta }
    }
}

impl fmt::Display for And {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_items(f, "And", &self.items)
    }
}

impl SchemaNode for And {
    fn validate(&self, data: &Value) -> Result<Value, SchemaError> {
        let mut current = data.clone();
        for item in &self.items {
            current = item
                .validate(&current)
                .map_err(|err| self.meta.wrap(err, data))?;
        }
        Ok(current)
    }

    fn json_schema(&self, target: Target) -> Fragment {
        self.meta.derive_or(|| {
            and_merge(self.items.iter().map(|item| item.json_schema(target)), target)
        })
    }

    fn resettable(&self) -> Option<&dyn Reset> {
        if self.items.iter().any(|item| item.resettable().is_some()) {
            Some(self)
        } else {
            None
        }
    }
}

impl Reset for And {
    fn reset(&self) -> Result<(), SchemaError> {
        reset_all(self.items.iter().filter_map(|item| item.resettable()))
    }
}

/// Returns the first child's success.
///
/// In only-one mode every success within a mapping run is counted, and the
/// end-of-run reset fails when more than one alternative matched. The count
/// belongs to one run at a time: the owning mapping holds its run lock while
/// it validates keys and resets. Outside a mapping key the count is never
/// checked.
#[derive(Debug)]
pub struct Or {
    items: Vec<Box<dyn SchemaNode>>,
    only_one: bool,
    matches: AtomicUsize,
    meta: Meta,
}

impl Or {
    pub(crate) fn new(items: Vec<Box<dyn SchemaNode>>, only_one: bool, meta: Meta) -> Self {
        Self {
            items,
            only_one,
            matches: AtomicUsize::new(0),
            meta,
        }
    }

    /// Successes recorded since the last reset.
    pub fn match_count(&self) -> usize {
        self.matches.load(Ordering::SeqCst)
    }
}

impl fmt::Display for Or {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_items(f, "Or", &self.items)
    }
}

impl SchemaNode for Or {
    fn validate(&self, data: &Value) -> Result<Value, SchemaError> {
        let mut failures = Vec::with_capacity(self.items.len());
        for item in &self.items {
            match item.validate(data) {
                Ok(value) => {
                    self.matches.fetch_add(1, Ordering::SeqCst);
                    return Ok(value);
                }
                Err(err) => failures.push(err),
            }
        }
        let summary = self.meta.label(format!("{self} did not validate {data}"));
        let custom = self.meta.custom(data);
        Err(match SchemaError::merge(failures) {
            Some(err) => err.with_context(Some(summary), custom),
            None => SchemaError::new(ErrorKind::Generic, summary, custom),
        })
    }

    fn json_schema(&self, target: Target) -> Fragment {
        self.meta.derive_or(|| {
            or_merge(self.items.iter().map(|item| item.json_schema(target)), target)
        })
    }

    fn resettable(&self) -> Option<&dyn Reset> {
        Some(self)
    }
}

impl Reset for Or {
    fn reset(&self) -> Result<(), SchemaError> {
        let count = self.matches.swap(0, Ordering::SeqCst);
        let children = reset_all(self.items.iter().filter_map(|item| item.resettable()));
        if self.only_one && count > 1 {
            debug!(matches = count, condition = %self, "only-one condition violated");
            return Err(SchemaError::new(
                ErrorKind::OnlyOneAllowed,
                format!("There are multiple keys present from the {self} condition"),
                None,
            ));
        }
        children
    }
}

/// Replaces the value with a transform's result.
#[derive(Debug)]
pub struct Use {
    transform: Transform,
    meta: Meta,
}

impl Use {
    pub(crate) fn new(transform: Transform, meta: Meta) -> Self {
        Self { transform, meta }
    }
}

impl fmt::Display for Use {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Use({})", self.transform.name())
    }
}

impl SchemaNode for Use {
    fn validate(&self, data: &Value) -> Result<Value, SchemaError> {
        match self.transform.apply(data) {
            Ok(value) => Ok(value),
            Err(TransformError::Schema(err)) => Err(self.meta.wrap(err, data)),
            Err(TransformError::Other(err)) => Err(self.meta.fail(
                ErrorKind::Generic,
                format!("{}({data}) raised {err}", self.transform.name()),
                data,
            )),
        }
    }

    fn json_schema(&self, _target: Target) -> Fragment {
        self.meta.derive_or(|| Fragment::Nothing)
    }
}
