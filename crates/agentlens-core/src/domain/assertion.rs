//! Assertion definition model and verdicts.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison predicate applied by an assertion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Equals,
    NotEquals,
    Exists,
    NotExists,
    GreaterThan,
    LessThan,
    Contains,
}

impl Predicate {
    /// Whether this predicate compares against an `expected` value.
    ///
    /// `exists`/`not_exists` only inspect presence; the rest require
    /// `expected` at load time.
    pub fn requires_expected(&self) -> bool {
        !matches!(self, Predicate::Exists | Predicate::NotExists)
    }

    /// Name as written in definition files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Predicate::Equals => "equals",
            Predicate::NotEquals => "not_equals",
            Predicate::Exists => "exists",
            Predicate::NotExists => "not_exists",
            Predicate::GreaterThan => "greater_than",
            Predicate::LessThan => "less_than",
            Predicate::Contains => "contains",
        }
    }
}

/// One named pass/fail check in a definition set.
///
/// Targets either a record field (dotted path, same resolution semantics as
/// the metric calculators) or a metric computed earlier for the same record.
/// Exactly one of `field`/`metric` must be set; validated at load time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssertionDefinition {
    /// Unique name within the definition set.
    pub name: String,

    /// Dotted path into the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Name of a metric from the same definition set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,

    pub predicate: Predicate,

    /// Comparison operand, required by value predicates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
}

/// The outcome of one assertion on one record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    pub name: String,
    pub passed: bool,

    /// Resolved actual value, `None` when the target was absent.
    pub actual: Option<Value>,

    pub expected: Option<Value>,

    /// Human-readable explanation built from the predicate and actual value.
    pub reason: String,
}
