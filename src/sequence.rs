//! Sequence validation.

use crate::error::{ErrorKind, SchemaError};
use crate::expr::Flavor;
use crate::fragment::Fragment;
use crate::json_schema::Target;
use crate::node::{Bucket, Meta, SchemaNode};
use crate::types::ValueType;
use serde_json::{Map, Value};
use std::fmt;

/// Validates arrays element by element, with optional length bounds.
#[derive(Debug)]
pub struct Sequence {
    item: Box<dyn SchemaNode>,
    min_length: usize,
    max_length: Option<usize>,
    meta: Meta,
}

impl Sequence {
    pub(crate) fn new(
        item: Box<dyn SchemaNode>,
        min_length: usize,
        max_length: Option<usize>,
        meta: Meta,
    ) -> Self {
        Self {
            item,
            min_length,
            max_length,
            meta,
        }
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.item)
    }
}

impl SchemaNode for Sequence {
    fn validate(&self, data: &Value) -> Result<Value, SchemaError> {
        let Some(items) = data.as_array() else {
            return Err(self.meta.fail(
                ErrorKind::UnexpectedType,
                format!("{data} should be instance of 'array'"),
                data,
            ));
        };
        let len = items.len();
        if len < self.min_length || self.max_length.is_some_and(|max| len > max) {
            let max = self
                .max_length
                .map_or_else(|| "inf".to_string(), |m| m.to_string());
            return Err(self.meta.fail(
                ErrorKind::WrongLength,
                format!(
                    "{data} should have a length between {} and {max} (is {len})",
                    self.min_length
                ),
                data,
            ));
        }
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                self.item.validate(item).map_err(|err| {
                    err.with_context(
                        Some(self.meta.label(format!("Element {index} ({item}) error:"))),
                        self.meta.custom(data),
                    )
                })
            })
            .collect::<Result<Vec<Value>, SchemaError>>()
            .map(Value::Array)
    }

    fn json_schema(&self, target: Target) -> Fragment {
        self.meta.derive_or(|| {
            let items = self.item.json_schema(target);
            if items == Fragment::Nothing {
                return Fragment::Nothing;
            }
            let mut doc = Map::new();
            doc.insert("type".into(), Value::from("array"));
            if items != Fragment::Everything {
                if let Some(items) = items.to_value() {
                    doc.insert("items".into(), items);
                }
            }
            if self.min_length > 0 {
                doc.insert("minItems".into(), Value::from(self.min_length));
            }
            if let Some(max) = self.max_length {
                doc.insert("maxItems".into(), Value::from(max));
            }
            Fragment::Document(doc)
        })
    }

    fn priority(&self) -> Option<i32> {
        Some(Flavor::Iterable.rank())
    }

    fn bucket(&self) -> Bucket {
        Bucket::Types(vec![ValueType::Array])
    }
}
