//! Schema fragments and the And/Or merge algebra.
//!
//! Derivation produces a [`Fragment`] per node; combinators fold their
//! children's fragments with [`and_merge`] and [`or_merge`]. Fragments are
//! rendered to JSON only at the outer boundary.

use crate::json_schema::Target;
use serde_json::{Map, Value, json};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::trace;

/// A derived schema fragment.
#[derive(Clone, Debug, PartialEq)]
pub enum Fragment {
    /// Contributes no information; dropped by both merges.
    Nothing,
    /// Matches every value (`true` / `{}`).
    Everything,
    /// Matches no value (`false`).
    Nowhere,
    /// `{"type": ...}` and nothing else.
    Types(Vec<String>),
    Const(Value),
    Enum(Vec<Value>),
    AllOf {
        all_of: Vec<Fragment>,
        not: Option<Box<Fragment>>,
    },
    AnyOf(Vec<Fragment>),
    Not(Box<Fragment>),
    /// OpenAPI `nullable: true` added to the wrapped fragment.
    Nullable(Box<Fragment>),
    /// Any other schema object, kept opaque.
    Document(Map<String, Value>),
}

impl Fragment {
    /// Reads a JSON Schema value. `null` is [`Fragment::Nothing`]; `{}` is
    /// [`Fragment::Everything`].
    pub fn from_value(value: Value) -> Fragment {
        match value {
            Value::Bool(true) => Fragment::Everything,
            Value::Bool(false) => Fragment::Nowhere,
            Value::Object(map) => Fragment::from_map(map),
            _ => Fragment::Nothing,
        }
    }

    fn from_map(mut map: Map<String, Value>) -> Fragment {
        if map.is_empty() {
            return Fragment::Everything;
        }
        if map.get("nullable") == Some(&Value::Bool(true)) {
            map.remove("nullable");
            return match Fragment::from_map(map) {
                Fragment::Everything => Fragment::Everything,
                inner => Fragment::Nullable(Box::new(inner)),
            };
        }
        if has_only(&map, "type") {
            if let Some(types) = map.get("type").and_then(parse_types) {
                return Fragment::Types(types);
            }
        }
        if has_only(&map, "const") {
            if let Some(value) = map.remove("const") {
                return Fragment::Const(value);
            }
        }
        if has_only(&map, "enum") && map.get("enum").is_some_and(Value::is_array) {
            if let Some(Value::Array(values)) = map.remove("enum") {
                return Fragment::Enum(values);
            }
        }
        if has_only(&map, "anyOf") && map.get("anyOf").is_some_and(Value::is_array) {
            if let Some(Value::Array(items)) = map.remove("anyOf") {
                return Fragment::AnyOf(items.into_iter().map(Fragment::from_value).collect());
            }
        }
        if map.keys().all(|k| k == "allOf" || k == "not")
            && map.get("allOf").is_none_or(Value::is_array)
        {
            let not = map
                .remove("not")
                .map(|v| Box::new(Fragment::from_value(v)));
            let all_of: Vec<Fragment> = match map.remove("allOf") {
                Some(Value::Array(items)) => items.into_iter().map(Fragment::from_value).collect(),
                _ => Vec::new(),
            };
            return match (all_of.is_empty(), not) {
                (true, Some(not)) => Fragment::Not(not),
                (_, not) => Fragment::AllOf { all_of, not },
            };
        }
        Fragment::Document(map)
    }

    /// Renders the fragment. [`Fragment::Nothing`] renders as `None`.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Fragment::Nothing => None,
            Fragment::Everything => Some(Value::Bool(true)),
            Fragment::Nowhere => Some(Value::Bool(false)),
            Fragment::Types(types) => Some(json!({ "type": types_value(types) })),
            Fragment::Const(value) => Some(json!({ "const": value })),
            Fragment::Enum(values) => Some(json!({ "enum": values })),
            Fragment::AllOf { all_of, not } => {
                let mut map = Map::new();
                if !all_of.is_empty() {
                    let items = all_of.iter().filter_map(Fragment::to_value).collect();
                    map.insert("allOf".into(), Value::Array(items));
                }
                if let Some(not) = not.as_ref().and_then(|n| n.to_value()) {
                    map.insert("not".into(), not);
                }
                Some(Value::Object(map))
            }
            Fragment::AnyOf(items) => {
                let items: Vec<Value> = items.iter().filter_map(Fragment::to_value).collect();
                Some(json!({ "anyOf": items }))
            }
            Fragment::Not(inner) => inner.to_value().map(|v| json!({ "not": v })),
            Fragment::Nullable(inner) => match inner.to_value() {
                Some(Value::Object(mut map)) => {
                    map.insert("nullable".into(), Value::Bool(true));
                    Some(Value::Object(map))
                }
                Some(other) => Some(json!({ "allOf": [other], "nullable": true })),
                None => Some(json!({ "nullable": true })),
            },
            Fragment::Document(map) => Some(Value::Object(map.clone())),
        }
    }

    /// Logical negation. Double negation collapses.
    pub fn negate(self) -> Fragment {
        match self {
            Fragment::Nothing => Fragment::Nothing,
            Fragment::Everything => Fragment::Nowhere,
            Fragment::Nowhere => Fragment::Everything,
            Fragment::Not(inner) => *inner,
            other => Fragment::Not(Box::new(other)),
        }
    }

    /// The `type` tokens this fragment constrains to, if any.
    pub fn type_tokens(&self) -> Option<Vec<String>> {
        match self {
            Fragment::Types(types) => Some(types.clone()),
            Fragment::Nullable(inner) => inner.type_tokens(),
            Fragment::Document(map) => map.get("type").and_then(parse_types),
            _ => None,
        }
    }

    /// A keyword of an opaque schema object.
    pub fn keyword(&self, name: &str) -> Option<&Value> {
        match self {
            Fragment::Document(map) => map.get(name),
            Fragment::Nullable(inner) => inner.keyword(name),
            _ => None,
        }
    }

    /// Whether the fragment matches nothing or says nothing.
    pub(crate) fn is_void(&self) -> bool {
        matches!(self, Fragment::Nothing | Fragment::Nowhere)
    }
}

fn has_only(map: &Map<String, Value>, key: &str) -> bool {
    map.len() == 1 && map.contains_key(key)
}

fn parse_types(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => None,
    }
}

fn types_value(types: &[String]) -> Value {
    match types {
        [single] => Value::String(single.clone()),
        many => Value::from(many.to_vec()),
    }
}

// ─── And ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Intersection {
    all_of: Vec<Fragment>,
    simple: Option<BTreeSet<String>>,
    typed: Vec<BTreeSet<String>>,
    negated: Vec<Fragment>,
    nowhere: bool,
}

impl Intersection {
    fn absorb(&mut self, fragment: Fragment) {
        match fragment {
            Fragment::Nothing | Fragment::Everything => {}
            Fragment::Nowhere => self.nowhere = true,
            Fragment::AllOf { all_of, not } => {
                for member in all_of {
                    self.absorb(member);
                }
                if let Some(not) = not {
                    self.negated.push(*not);
                }
            }
            Fragment::Not(inner) => self.negated.push(*inner),
            Fragment::Types(types) => {
                if types.is_empty() {
                    return;
                }
                let types: BTreeSet<String> = types.into_iter().collect();
                self.simple = Some(match self.simple.take() {
                    Some(current) => intersect_types(&current, &types),
                    None => types,
                });
            }
            other => {
                if let Some(types) = other.type_tokens() {
                    self.typed.push(types.into_iter().collect());
                }
                if !self.all_of.contains(&other) {
                    self.all_of.push(other);
                }
            }
        }
    }
}

fn intersect_types(a: &BTreeSet<String>, b: &BTreeSet<String>) -> BTreeSet<String> {
    let mut meet: BTreeSet<String> = a.intersection(b).cloned().collect();
    let integral = |s: &BTreeSet<String>| s.contains("integer");
    let numeric = |s: &BTreeSet<String>| s.contains("number");
    if (integral(a) && numeric(b)) || (numeric(a) && integral(b)) {
        meet.insert("integer".to_string());
    }
    meet
}

/// Intersection of fragments.
///
/// Nested `allOf` members are flattened and `not` parts collected into one
/// negated union. Type-only fragments intersect into a single type set, which
/// is dropped when an opaque fragment already constrains to a subset of it.
pub fn and_merge(fragments: impl IntoIterator<Item = Fragment>, target: Target) -> Fragment {
    let mut meet = Intersection::default();
    for fragment in fragments {
        meet.absorb(fragment);
    }
    if meet.nowhere {
        return Fragment::Nowhere;
    }
    if let Some(simple) = meet.simple {
        if simple.is_empty() {
            trace!("disjoint type constraints, intersection is empty");
            return Fragment::Nowhere;
        }
        if !meet.typed.iter().any(|t| t.is_subset(&simple)) {
            meet.all_of.push(Fragment::Types(simple.into_iter().collect()));
        }
    }
    let mut all_of = meet.all_of;
    match (all_of.len(), or_merge(meet.negated, target)) {
        (_, Fragment::Everything) => Fragment::Nowhere,
        (0, Fragment::Nowhere) => Fragment::Everything,
        (0, Fragment::Nothing) => Fragment::Nothing,
        (0, negated) => Fragment::Not(Box::new(negated)),
        (1, Fragment::Nothing | Fragment::Nowhere) => all_of.swap_remove(0),
        (_, Fragment::Nothing | Fragment::Nowhere) => Fragment::AllOf { all_of, not: None },
        (_, negated) => Fragment::AllOf {
            all_of,
            not: Some(Box::new(negated)),
        },
    }
}

// ─── Or ────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Union {
    any_of: Vec<Fragment>,
    values: Vec<Value>,
    types: BTreeSet<String>,
    truthy: bool,
    falsy: bool,
    null: bool,
    everything: bool,
}

impl Union {
    fn absorb(&mut self, fragment: Fragment) {
        match fragment {
            Fragment::Nothing | Fragment::Nowhere => {}
            Fragment::Everything => self.everything = true,
            Fragment::Nullable(inner) => {
                self.null = true;
                self.absorb(*inner);
            }
            Fragment::Const(value) => self.push_value(value),
            Fragment::Enum(values) => values.into_iter().for_each(|v| self.push_value(v)),
            Fragment::Types(types) => self.types.extend(types),
            Fragment::AnyOf(items) => items.into_iter().for_each(|f| self.absorb(f)),
            other => {
                if !self.any_of.contains(&other) {
                    self.any_of.push(other);
                }
            }
        }
    }

    fn push_value(&mut self, value: Value) {
        match value {
            Value::Bool(true) => self.truthy = true,
            Value::Bool(false) => self.falsy = true,
            Value::Null => self.null = true,
            other => self.values.push(other),
        }
    }

    fn push_flags(&mut self, null: bool) {
        if self.truthy {
            self.values.push(Value::Bool(true));
        }
        if self.falsy {
            self.values.push(Value::Bool(false));
        }
        if null {
            self.values.push(Value::Null);
        }
    }
}

/// Deduplicates literal values and sorts them when they are all strings or
/// all numbers. Mixed literals keep their first-seen order.
fn normalize_values(values: &mut Vec<Value>) {
    let mut unique: Vec<Value> = Vec::with_capacity(values.len());
    for value in values.drain(..) {
        if !unique.contains(&value) {
            unique.push(value);
        }
    }
    if unique.iter().all(Value::is_string) {
        unique.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
    } else if unique.iter().all(Value::is_number) {
        unique.sort_by(|a, b| {
            a.as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(Ordering::Equal)
        });
    }
    *values = unique;
}

/// Union of fragments.
///
/// Nested `anyOf` is flattened, literals are pooled into one `enum`, and
/// type tokens into one set. `boolean` and `null` tokens become the literals
/// they stand for; how those are rendered back depends on `target`.
pub fn or_merge(fragments: impl IntoIterator<Item = Fragment>, target: Target) -> Fragment {
    let mut union = Union::default();
    for fragment in fragments {
        union.absorb(fragment);
    }
    if union.everything {
        trace!("union contains an unconstrained member");
        return Fragment::Everything;
    }
    normalize_values(&mut union.values);
    if union.types.remove("boolean") {
        union.truthy = true;
        union.falsy = true;
    }
    if union.types.remove("null") {
        union.null = true;
    }
    render_union(union, target)
}

fn render_union(mut union: Union, target: Target) -> Fragment {
    let untouched = union.values.is_empty();
    match target {
        Target::JsonSchema => {
            if union.truthy == union.falsy && untouched {
                if union.truthy {
                    union.types.insert("boolean".into());
                }
                if union.null {
                    union.types.insert("null".into());
                }
            } else {
                union.push_flags(union.null);
            }
            let Union {
                mut any_of,
                mut values,
                types,
                ..
            } = union;
            if !types.is_empty() {
                any_of.push(Fragment::Types(types.into_iter().collect()));
            }
            match values.len() {
                0 => {}
                1 => any_of.push(Fragment::Const(values.swap_remove(0))),
                _ => any_of.push(Fragment::Enum(values)),
            }
            collapse(any_of)
        }
        Target::OpenApi => {
            if union.truthy && union.falsy && untouched {
                union.types.insert("boolean".into());
            } else {
                union.push_flags(false);
            }
            let null = union.null;
            let any_of = split_types(union);
            if !null {
                return collapse(any_of);
            }
            match collapse(any_of) {
                Fragment::Nothing => Fragment::Enum(vec![Value::Null]),
                single => Fragment::Nullable(Box::new(single)),
            }
        }
        Target::Default => {
            if union.truthy && union.falsy && !union.null && untouched {
                union.types.insert("boolean".into());
            } else {
                union.push_flags(union.null);
            }
            collapse(split_types(union))
        }
    }
}

/// One `{type: t}` member per token, followed by the pooled `enum`.
fn split_types(union: Union) -> Vec<Fragment> {
    let Union {
        mut any_of,
        values,
        types,
        ..
    } = union;
    any_of.extend(types.into_iter().map(|t| Fragment::Types(vec![t])));
    if !values.is_empty() {
        any_of.push(Fragment::Enum(values));
    }
    any_of
}

fn collapse(mut any_of: Vec<Fragment>) -> Fragment {
    match any_of.len() {
        0 => Fragment::Nothing,
        1 => any_of.swap_remove(0),
        _ => Fragment::AnyOf(any_of),
    }
}
