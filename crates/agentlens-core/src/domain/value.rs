//! The value a calculator produces for one metric on one record.

use serde::{Deserialize, Serialize};

/// Result of one calculator invocation.
///
/// `Absent` is a first-class outcome, not an error: it means the computation
/// could not proceed for this record (a required field was missing, no
/// `derive_path` rule matched) and the aggregate layer should account for it
/// explicitly rather than coerce it to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MetricValue {
    /// Computation could not produce a value for this record.
    Absent,

    /// A numeric metric (counts, ratios, latencies).
    Number(f64),

    /// A categorical metric (e.g. a derived path name).
    Label(String),
}

impl MetricValue {
    /// Numeric view, `None` for labels and absent values.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Label view, `None` for numbers and absent values.
    pub fn as_label(&self) -> Option<&str> {
        match self {
            MetricValue::Label(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, MetricValue::Absent)
    }
}

impl From<f64> for MetricValue {
    fn from(n: f64) -> Self {
        MetricValue::Number(n)
    }
}

impl From<usize> for MetricValue {
    fn from(n: usize) -> Self {
        MetricValue::Number(n as f64)
    }
}
