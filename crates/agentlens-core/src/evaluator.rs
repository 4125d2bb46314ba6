//! Per-record metric evaluation.
//!
//! A [`MetricEvaluator`] pairs a validated definition set with a calculator
//! registry. Validation happens once, at construction — unknown types,
//! duplicate names, and malformed parameters fail fast with the offending
//! definition name, before any record is touched.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde_json::Value;

use crate::calc::registry::CalculatorRegistry;
use crate::domain::{ConfigError, MetricDefinition, MetricValue};
use crate::metrics::METRICS;
use crate::obs;

/// Evaluates a fixed metric definition set against individual records.
pub struct MetricEvaluator {
    registry: CalculatorRegistry,
    definitions: Vec<MetricDefinition>,
}

impl std::fmt::Debug for MetricEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricEvaluator")
            .field("definitions", &self.definitions)
            .finish_non_exhaustive()
    }
}

impl MetricEvaluator {
    /// Validate `definitions` against `registry` and build an evaluator.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] on a duplicate metric name, an unknown calculator
    /// type, or calculator-specific parameter problems (missing `field`,
    /// malformed `derive_path` chain, ratio without a zero-denominator
    /// substitute).
    pub fn new(
        registry: CalculatorRegistry,
        definitions: Vec<MetricDefinition>,
    ) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for definition in &definitions {
            if !seen.insert(definition.name.as_str()) {
                return Err(ConfigError::DuplicateMetricName(definition.name.clone()));
            }
            registry.validate_spec(&definition.name, &definition.spec)?;
        }
        Ok(Self {
            registry,
            definitions,
        })
    }

    /// Evaluate every metric for one record, in definition order.
    ///
    /// A calculator fault is caught here: it is logged with the metric name
    /// (record identity comes from the caller's span), counted, and recorded
    /// as [`MetricValue::Absent`] so sibling metrics still evaluate.
    pub fn evaluate(&self, record: &Value) -> HashMap<String, MetricValue> {
        let mut results = HashMap::with_capacity(self.definitions.len());
        for definition in &self.definitions {
            let value = match self.registry.calculate_spec(record, &definition.spec) {
                Ok(value) => value,
                Err(fault) => {
                    obs::emit_calculator_fault(&definition.name, &fault);
                    METRICS.inc_calculator_faults();
                    MetricValue::Absent
                }
            };
            results.insert(definition.name.clone(), value);
        }
        results
    }

    /// The validated definitions, in author order.
    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.definitions
    }

    /// Names of metrics whose calculator produces labels; the aggregator
    /// builds frequency tables for these instead of means.
    pub fn categorical_metrics(&self) -> BTreeSet<String> {
        self.definitions
            .iter()
            .filter(|d| self.registry.is_categorical(&d.spec.calc_type))
            .map(|d| d.name.clone())
            .collect()
    }

    /// Whether a metric with this name is defined.
    pub fn has_metric(&self, name: &str) -> bool {
        self.definitions.iter().any(|d| d.name == name)
    }
}
