//! Calculator capability and implementations.
//!
//! Every metric type — built-in or custom — is a [`Calculator`] resolved
//! through one [`registry::CalculatorRegistry`] lookup. Calculators are pure:
//! `(record, spec) -> MetricValue`, no shared state, no I/O.

pub mod builtin;
pub mod registry;

use serde_json::Value;

use crate::domain::{CalcSpec, CalculatorFault, ConfigError, MetricValue};
use registry::CalculatorRegistry;

/// The calculator capability.
///
/// `validate` runs once at load time against each definition that names this
/// calculator; it is the place to reject missing parameters or malformed
/// rule chains with a [`ConfigError`] before any record is processed.
///
/// `calculate` runs per record. Expected data irregularities (absent fields,
/// empty sequences) must degrade to a defined [`MetricValue`] — usually
/// `Number(0.0)` or `Absent` — per the calculator's documented policy.
/// A [`CalculatorFault`] is reserved for genuinely unexpected failures and
/// is caught, logged, and recorded as `Absent` at the evaluator boundary.
pub trait Calculator: Send + Sync {
    /// Type name referenced by `type:` in definition files.
    fn name(&self) -> &str;

    /// Human-readable description of what the calculator measures.
    fn description(&self) -> &str;

    /// Load-time parameter validation for one definition.
    ///
    /// `registry` is available so composing calculators can validate their
    /// children through the same lookup.
    fn validate(
        &self,
        registry: &CalculatorRegistry,
        metric: &str,
        spec: &CalcSpec,
    ) -> Result<(), ConfigError> {
        let _ = (registry, metric, spec);
        Ok(())
    }

    /// Compute the metric value for one record.
    fn calculate(
        &self,
        registry: &CalculatorRegistry,
        record: &Value,
        spec: &CalcSpec,
    ) -> Result<MetricValue, CalculatorFault>;

    /// Whether results are labels rather than numbers.
    ///
    /// Drives report aggregation (frequency table vs. mean) and lets `ratio`
    /// reject label-producing operands at load time.
    fn is_categorical(&self) -> bool {
        false
    }
}
