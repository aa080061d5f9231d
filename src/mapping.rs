//! Mapping validation: priority-ordered key dispatch, hooks, coverage,
//! defaults, and the mapping's derived schema.

use crate::error::{ErrorKind, SchemaError};
use crate::expr::Flavor;
use crate::fragment::{Fragment, or_merge};
use crate::hook::HookAction;
use crate::json_schema::Target;
use crate::node::{Bucket, Meta, ResetScope, SchemaNode};
use crate::types::{ValueType, key_text};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use tracing::{debug, trace};

/// A compiled key/value pair as handed to [`Mapping::new`].
pub(crate) struct MappingEntry {
    pub(crate) key: Box<dyn SchemaNode>,
    pub(crate) value: Box<dyn SchemaNode>,
    /// The literal the key was written as, if it was a bare scalar.
    pub(crate) name: Option<Value>,
}

#[derive(Debug)]
struct Entry {
    key: Box<dyn SchemaNode>,
    value: Box<dyn SchemaNode>,
    name: Option<Value>,
    priority: i32,
}

impl Entry {
    fn required(&self) -> bool {
        self.key.key_hook().is_none_or(|hook| hook.required())
    }

    fn display_name(&self) -> String {
        match &self.name {
            Some(Value::String(s)) => format!("'{s}'"),
            Some(other) => other.to_string(),
            None => self.key.to_string(),
        }
    }
}

/// Validates objects against key/value schema pairs.
///
/// Key schemas are indexed once at build time: literal keys by their value,
/// typed keys by the type and every type it refines, the rest in a catch-all
/// list appended to every bucket. Within a bucket candidates are tried in
/// ascending priority.
///
/// Key schemas with per-run state (an only-one `Or`) share it across every
/// caller of the same tree, so runs of such a mapping are serialized by
/// `run`. Mappings without stateful keys validate concurrently.
#[derive(Debug)]
pub struct Mapping {
    entries: Vec<Entry>,
    exact: HashMap<String, Vec<usize>>,
    typed: HashMap<ValueType, Vec<usize>>,
    catchall: Vec<usize>,
    min_length: usize,
    max_length: Option<usize>,
    ignore_extra_keys: bool,
    stateful: bool,
    run: Mutex<()>,
    meta: Meta,
}

fn dedup(ids: &mut Vec<usize>) {
    let mut seen = HashSet::new();
    ids.retain(|id| seen.insert(*id));
}

fn sort_by_priority(ids: &mut [usize], entries: &[Entry]) {
    ids.sort_by_key(|&id| entries[id].priority);
}

impl Mapping {
    pub(crate) fn new(
        entries: Vec<MappingEntry>,
        min_length: usize,
        max_length: Option<usize>,
        ignore_extra_keys: bool,
        meta: Meta,
    ) -> Self {
        let entries: Vec<Entry> = entries
            .into_iter()
            .map(|e| Entry {
                priority: e.key.priority().unwrap_or(Flavor::Validator.rank()),
                key: e.key,
                value: e.value,
                name: e.name,
            })
            .collect();

        let mut literal: Vec<(Value, Vec<usize>)> = Vec::new();
        let mut by_type: HashMap<ValueType, Vec<usize>> = HashMap::new();
        let mut catchall = Vec::new();
        for (id, entry) in entries.iter().enumerate() {
            match entry.key.bucket() {
                Bucket::Exact(value) => match literal.iter_mut().find(|(v, _)| *v == value) {
                    Some((_, ids)) => ids.push(id),
                    None => literal.push((value, vec![id])),
                },
                Bucket::Types(types) => {
                    for value_type in types {
                        by_type.entry(value_type).or_default().push(id);
                    }
                }
                Bucket::Catchall => catchall.push(id),
            }
        }
        sort_by_priority(&mut catchall, &entries);

        let mut typed = HashMap::new();
        for &value_type in by_type.keys() {
            let mut ids: Vec<usize> = value_type
                .ancestry()
                .iter()
                .filter_map(|t| by_type.get(t))
                .flatten()
                .chain(&catchall)
                .copied()
                .collect();
            dedup(&mut ids);
            sort_by_priority(&mut ids, &entries);
            typed.insert(value_type, ids);
        }

        let mut exact = HashMap::new();
        for (value, mut ids) in literal {
            let fallback = ValueType::of(&value)
                .ancestry()
                .iter()
                .find_map(|t| typed.get(t))
                .unwrap_or(&catchall);
            ids.extend(fallback);
            dedup(&mut ids);
            sort_by_priority(&mut ids, &entries);
            exact.insert(value.to_string(), ids);
        }

        let stateful = entries.iter().any(|e| e.key.resettable().is_some());
        Self {
            entries,
            exact,
            typed,
            catchall,
            min_length,
            max_length,
            ignore_extra_keys,
            stateful,
            run: Mutex::new(()),
            meta,
        }
    }

    /// Candidate entries for an input key, in trial order.
    fn candidates(&self, key: &Value) -> &[usize] {
        if let Some(ids) = self.exact.get(&key.to_string()) {
            return ids;
        }
        ValueType::of(key)
            .ancestry()
            .iter()
            .find_map(|t| self.typed.get(t))
            .unwrap_or(&self.catchall)
    }

    fn check_length(&self, data: &Value, len: usize) -> Result<(), SchemaError> {
        let too_long = self.max_length.is_some_and(|max| len > max);
        if len < self.min_length || too_long {
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
        Ok(())
    }

    fn match_keys(&self, data: &Value, map: &Map<String, Value>) -> Result<Map<String, Value>, SchemaError> {
        let mut new = Map::new();
        let mut covered: HashSet<usize> = HashSet::new();
        let mut wrong_keys: Vec<&str> = Vec::new();

        let mut items: Vec<(&String, &Value)> = map.iter().collect();
        items.sort_by_key(|(_, value)| value.is_array() || value.is_object());

        'keys: for (key, value) in items {
            let key_value = Value::String(key.clone());
            for &id in self.candidates(&key_value) {
                let entry = &self.entries[id];
                let Ok(new_key) = entry.key.validate(&key_value) else {
                    trace!(key = %key, candidate = %entry.key, "key schema rejected key");
                    continue;
                };
                let hook = entry.key.key_hook();
                let action = match entry.value.validate(value) {
                    Ok(new_value) => {
                        covered.insert(id);
                        let action = match hook {
                            Some(hook) => hook.handle(&new_key, &new_value, &mut new, map)?,
                            None => HookAction::Accept,
                        };
                        if action == HookAction::Accept {
                            new.insert(key_text(&new_key), new_value);
                        }
                        action
                    }
                    Err(mut err) => {
                        let action = match hook {
                            Some(hook) => hook.catch(&new_key, &err, &mut new, map)?,
                            None => HookAction::Accept,
                        };
                        if action == HookAction::Accept {
                            err.prepend(
                                Some(self.meta.label(format!("Key '{}' error:", key_text(&new_key)))),
                                self.meta.custom(data),
                            );
                            return Err(err);
                        }
                        action
                    }
                };
                match action {
                    HookAction::Continue => continue,
                    HookAction::Accept | HookAction::Discard => continue 'keys,
                }
            }
            wrong_keys.push(key);
        }

        let mut missing: Vec<String> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(id, entry)| !covered.contains(id) && entry.required())
            .map(|(_, entry)| entry.display_name())
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(self.meta.fail(
                ErrorKind::MissingKey,
                format!("Missing key{}: {}", plural(missing.len()), missing.join(", ")),
                data,
            ));
        }

        if !self.ignore_extra_keys && !wrong_keys.is_empty() {
            let mut names: Vec<String> = wrong_keys.iter().map(|k| format!("'{k}'")).collect();
            names.sort();
            return Err(self.meta.fail(
                ErrorKind::WrongKey,
                format!("Wrong key{} {} in {data}", plural(names.len()), names.join(", ")),
                data,
            ));
        }

        for (id, entry) in self.entries.iter().enumerate() {
            if covered.contains(&id) {
                continue;
            }
            if let Some((key, value)) = entry.key.key_hook().and_then(|hook| hook.default_value()) {
                new.insert(key, value);
            }
        }

        Ok(new)
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", entry.key, entry.value)?;
        }
        f.write_str("}")
    }
}

impl SchemaNode for Mapping {
    fn validate(&self, data: &Value) -> Result<Value, SchemaError> {
        let Some(map) = data.as_object() else {
            return Err(self.meta.fail(
                ErrorKind::UnexpectedType,
                format!("{data} should be instance of 'object'"),
                data,
            ));
        };
        self.check_length(data, map.len())?;
        debug!(keys = map.len(), entries = self.entries.len(), "validating mapping");

        let _run = self.stateful.then(|| self.run.lock());
        let scope = ResetScope::new(self.entries.iter().filter_map(|e| e.key.resettable()));
        let outcome = self.match_keys(data, map);
        let reset = scope.finish();
        debug!(ok = outcome.is_ok(), reset_ok = reset.is_ok(), "mapping validated");
        let new = outcome?;
        reset?;
        Ok(Value::Object(new))
    }

    fn json_schema(&self, target: Target) -> Fragment {
        self.meta.derive_or(|| self.derive(target))
    }

    fn priority(&self) -> Option<i32> {
        Some(Flavor::Mapping.rank())
    }
}

// ─── Derivation ─────────────────────────────────────────────────────────────

#[derive(Clone)]
struct Slot {
    forbids: bool,
    schema: Fragment,
}

#[derive(Default)]
struct Layout {
    properties: Vec<(String, Vec<Slot>)>,
    patterns: Vec<(String, Vec<Slot>)>,
    additional: Vec<Slot>,
    required: BTreeSet<String>,
}

fn push_slot(list: &mut Vec<(String, Vec<Slot>)>, name: String, slot: Slot) {
    match list.iter_mut().find(|(n, _)| *n == name) {
        Some((_, slots)) => slots.push(slot),
        None => list.push((name, vec![slot])),
    }
}

/// Text a literal key takes in a JSON document, if it can be a key at all.
fn literal_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

fn integer_pattern(key: &Fragment) -> &'static str {
    let minimum = key
        .keyword("minimum")
        .and_then(Value::as_i64)
        .or_else(|| key.keyword("exclusiveMinimum").and_then(Value::as_i64).and_then(|m| m.checked_add(1)));
    match minimum {
        Some(0) => "^([1-9][0-9]*|0)$",
        Some(1) => "^([1-9][0-9]*)$",
        _ => "^(-?[1-9][0-9]*|0)$",
    }
}

impl Layout {
    fn place(&mut self, key: &Fragment, slot: Slot, required: bool) {
        match key {
            Fragment::Everything => self.additional.push(slot),
            Fragment::Nothing | Fragment::Nowhere => {}
            Fragment::Nullable(inner) => self.place(inner, slot, required),
            Fragment::AnyOf(members) => {
                for member in members {
                    self.place(member, slot.clone(), false);
                }
            }
            Fragment::Const(value) => self.place_literals(std::slice::from_ref(value), slot, required),
            Fragment::Enum(values) => self.place_literals(values, slot, required),
            other => {
                let Some(types) = other.type_tokens() else {
                    return;
                };
                if types.len() != 1 {
                    for token in types {
                        self.place(&Fragment::Types(vec![token]), slot.clone(), false);
                    }
                    return;
                }
                match types[0].as_str() {
                    "string" => match other.keyword("pattern").and_then(Value::as_str) {
                        Some(pattern) => push_slot(&mut self.patterns, pattern.to_string(), slot),
                        None => self.additional.push(slot),
                    },
                    "boolean" => push_slot(&mut self.patterns, "^(true|false)$".into(), slot),
                    "integer" => push_slot(&mut self.patterns, integer_pattern(other).into(), slot),
                    _ => {}
                }
            }
        }
    }

    fn place_literals(&mut self, values: &[Value], slot: Slot, required: bool) {
        for value in values {
            let Some(name) = literal_key(value) else {
                continue;
            };
            if required && values.len() == 1 {
                self.required.insert(name.clone());
            }
            push_slot(&mut self.properties, name, slot.clone());
        }
    }
}

/// The schema admitted for one key: the union of its value schemas minus
/// the union of the values its forbidden entries exclude.
fn merge_slots(slots: Vec<Slot>, target: Target) -> Fragment {
    let (excluded, allowed): (Vec<Slot>, Vec<Slot>) = slots.into_iter().partition(|s| s.forbids);
    let allowed = or_merge(allowed.into_iter().map(|s| s.schema), target);
    let excluded = or_merge(excluded.into_iter().map(|s| s.schema), target);
    if excluded == Fragment::Everything || allowed.is_void() {
        return Fragment::Nowhere;
    }
    if excluded.is_void() {
        return allowed;
    }
    Fragment::AllOf {
        all_of: vec![allowed],
        not: Some(Box::new(excluded)),
    }
}

fn render_slots(list: Vec<(String, Vec<Slot>)>, target: Target) -> Map<String, Value> {
    let mut out = Map::new();
    for (name, slots) in list {
        let merged = merge_slots(slots, target);
        if merged == Fragment::Nowhere {
            continue;
        }
        if let Some(schema) = merged.to_value() {
            out.insert(name, schema);
        }
    }
    out
}

impl Mapping {
    fn derive(&self, target: Target) -> Fragment {
        let mut layout = Layout::default();
        for entry in &self.entries {
            let schema = entry.value.json_schema(target);
            if schema.is_void() {
                continue;
            }
            let hook = entry.key.key_hook();
            let slot = Slot {
                forbids: hook.is_some_and(|h| h.forbids()),
                schema,
            };
            layout.place(&entry.key.json_schema(target), slot, entry.required());
        }

        let mut doc = Map::new();
        doc.insert("type".into(), Value::from("object"));
        if !layout.required.is_empty() {
            let required: Vec<Value> = layout.required.into_iter().map(Value::String).collect();
            doc.insert("required".into(), Value::Array(required));
        }
        let properties = render_slots(layout.properties, target);
        if !properties.is_empty() {
            doc.insert("properties".into(), Value::Object(properties));
        }
        let patterns = render_slots(layout.patterns, target);
        if !patterns.is_empty() {
            doc.insert("patternProperties".into(), Value::Object(patterns));
        }
        let additional = if self.ignore_extra_keys {
            Value::Bool(true)
        } else {
            merge_slots(layout.additional, target)
                .to_value()
                .unwrap_or(Value::Bool(false))
        };
        doc.insert("additionalProperties".into(), additional);
        if self.min_length > 0 {
            doc.insert("minProperties".into(), Value::from(self.min_length));
        }
        if let Some(max) = self.max_length {
            doc.insert("maxProperties".into(), Value::from(max));
        }
        Fragment::Document(doc)
    }
}
