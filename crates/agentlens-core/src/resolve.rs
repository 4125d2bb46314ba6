//! Dotted field-path resolution over nested records.
//!
//! A record is an arbitrary `serde_json::Value` tree. A path like
//! `"order.items"` walks nested mappings key by key. When a segment lands on
//! a sequence of mappings, the next segment projects that key across every
//! element — `"store_search_results.ingredient"` yields the `ingredient`
//! value of each element, skipping elements that lack the key.
//!
//! Resolution never fails: shape mismatches and missing keys yield
//! [`Resolved::Absent`], and an empty-but-present sequence yields
//! `Resolved::Many(vec![])`, so callers can tell "not there" from
//! "there, but empty".

use serde_json::Value;

/// Outcome of resolving a field path against a record.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// A key was missing or a segment was applied to an incompatible shape.
    Absent,

    /// The path landed on a single value (scalar, sequence, or mapping).
    One(Value),

    /// The path projected a key across a sequence of mappings.
    Many(Vec<Value>),
}

impl Resolved {
    pub fn is_absent(&self) -> bool {
        matches!(self, Resolved::Absent)
    }

    /// Truthiness used by `derive_path` and the `exists` predicate:
    /// present **and** non-empty. `null`, `false`, `0`, `""`, `[]` and `{}`
    /// all count as "no signal".
    pub fn is_present_non_empty(&self) -> bool {
        match self {
            Resolved::Absent => false,
            Resolved::One(v) => value_non_empty(v),
            Resolved::Many(vs) => !vs.is_empty(),
        }
    }
}

fn value_non_empty(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Resolve a dotted `path` against `record`.
///
/// An empty path resolves to the whole record. A projection segment ends the
/// walk: once a sequence is projected, any further segments are ignored (the
/// projected values are the leaves).
pub fn resolve(record: &Value, path: &str) -> Resolved {
    if path.is_empty() {
        return Resolved::One(record.clone());
    }

    let mut current = record;
    for segment in path.split('.') {
        match current {
            Value::Object(map) => match map.get(segment) {
                Some(next) => current = next,
                None => return Resolved::Absent,
            },
            Value::Array(items) => return project(items, segment),
            // Scalar hit before the path was consumed.
            _ => return Resolved::Absent,
        }
    }
    Resolved::One(current.clone())
}

/// Project `key` across every mapping element of a sequence.
///
/// Non-mapping elements and elements missing the key are skipped rather than
/// erroring; the result length can therefore be shorter than the sequence.
fn project(items: &[Value], key: &str) -> Resolved {
    let values = items
        .iter()
        .filter_map(|item| item.as_object())
        .filter_map(|obj| obj.get(key))
        .cloned()
        .collect();
    Resolved::Many(values)
}
