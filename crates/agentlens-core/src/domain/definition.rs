//! Metric definition model.
//!
//! A metric definition is a name plus a [`CalcSpec`] — the recursive
//! calculator configuration that `ratio` reuses for its numerator and
//! denominator, so composed calculators flow through the same registry
//! lookup as top-level ones.
//!
//! `calc_type` is an open string rather than a closed enum: custom
//! calculators registered at startup are referenced by the same field as the
//! built-ins, and validation (not deserialization) rejects unknown types.

use serde::{Deserialize, Serialize};

/// One named metric in a definition set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricDefinition {
    /// Unique name within the definition set; keys the per-record results.
    pub name: String,

    #[serde(flatten)]
    pub spec: CalcSpec,
}

/// Calculator configuration — the recursive node of a definition tree.
///
/// Parameters are type-specific: `field` for the counting calculators,
/// `paths` for `derive_path`, `numerator`/`denominator`/`options` for
/// `ratio`. Each calculator validates the parameters it needs at load time;
/// extraneous ones are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalcSpec {
    /// Registered calculator type name (`count_list`, `ratio`, or a custom).
    #[serde(rename = "type")]
    pub calc_type: String,

    /// Dotted field path, for calculators that read one location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Ordered first-match rules, for `derive_path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<PathRule>>,

    /// Nested calculator producing the numerator, for `ratio`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numerator: Option<Box<CalcSpec>>,

    /// Nested calculator producing the denominator, for `ratio`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denominator: Option<Box<CalcSpec>>,

    /// Recognized option flags.
    #[serde(default)]
    pub options: CalcOptions,
}

impl CalcSpec {
    /// A bare spec with only a type name; parameters via struct update.
    pub fn of_type(calc_type: impl Into<String>) -> Self {
        Self {
            calc_type: calc_type.into(),
            field: None,
            paths: None,
            numerator: None,
            denominator: None,
            options: CalcOptions::default(),
        }
    }
}

/// Option flags recognized by built-in calculators.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CalcOptions {
    /// Substitute result when a ratio denominator is zero. The author gives
    /// it in final units; `format_as_percent` is not applied on top of it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_zero_denominator: Option<f64>,

    /// Multiply a ratio result by 100 after the zero-denominator check.
    #[serde(default)]
    pub format_as_percent: bool,
}

/// One rule in a `derive_path` chain.
///
/// A rule without `if_field_exists` is a catch-all and must be the last rule
/// in the chain (checked at load time).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathRule {
    /// Label this rule assigns when it matches.
    pub name: String,

    /// Field that must be present and non-empty for the rule to match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub if_field_exists: Option<String>,
}

impl PathRule {
    pub fn is_catch_all(&self) -> bool {
        self.if_field_exists.is_none()
    }
}
