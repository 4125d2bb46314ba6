//! Per-record assertion evaluation.
//!
//! Assertions share the metric engine's field resolution but produce
//! boolean verdicts with human-readable reasons instead of numeric values.
//! An assertion may also target a metric computed for the same record, so
//! pass/fail checks can be layered on derived values (ratios, path labels).

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::domain::{AssertionDefinition, ConfigError, MetricValue, Predicate, Verdict};
use crate::metrics::METRICS;
use crate::resolve::{self, Resolved};

/// Evaluates a fixed assertion definition set against individual records.
#[derive(Debug)]
pub struct AssertionEvaluator {
    definitions: Vec<AssertionDefinition>,
}

impl AssertionEvaluator {
    /// Validate `definitions` and build an evaluator.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] on a duplicate assertion name, an assertion targeting
    /// neither or both of `field`/`metric`, or a value predicate without an
    /// `expected` operand.
    pub fn new(definitions: Vec<AssertionDefinition>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for definition in &definitions {
            if !seen.insert(definition.name.as_str()) {
                return Err(ConfigError::DuplicateAssertionName(definition.name.clone()));
            }
            if definition.field.is_some() == definition.metric.is_some() {
                return Err(ConfigError::AmbiguousAssertionTarget {
                    assertion: definition.name.clone(),
                });
            }
            if definition.predicate.requires_expected() && definition.expected.is_none() {
                return Err(ConfigError::MissingExpected {
                    assertion: definition.name.clone(),
                    predicate: definition.predicate.as_str().to_string(),
                });
            }
        }
        Ok(Self { definitions })
    }

    /// Evaluate every assertion for one record, in definition order.
    ///
    /// `metrics` is the metric map already computed for the same record,
    /// consulted by metric-targeted assertions.
    pub fn evaluate(
        &self,
        record: &Value,
        metrics: &HashMap<String, MetricValue>,
    ) -> Vec<Verdict> {
        self.definitions
            .iter()
            .map(|definition| {
                let verdict = check(definition, record, metrics);
                if !verdict.passed {
                    METRICS.inc_assertion_failures();
                }
                verdict
            })
            .collect()
    }

    /// The validated definitions, in author order.
    pub fn definitions(&self) -> &[AssertionDefinition] {
        &self.definitions
    }

    /// Metric names referenced by metric-targeted assertions, for
    /// cross-validation against the metric definition set.
    pub fn metric_references(&self) -> impl Iterator<Item = (&str, &str)> {
        self.definitions
            .iter()
            .filter_map(|d| d.metric.as_deref().map(|m| (d.name.as_str(), m)))
    }
}

/// Resolve the assertion target to an actual value, `None` when absent.
fn resolve_target(
    definition: &AssertionDefinition,
    record: &Value,
    metrics: &HashMap<String, MetricValue>,
) -> (String, Option<Value>) {
    if let Some(field) = definition.field.as_deref() {
        let actual = match resolve::resolve(record, field) {
            Resolved::Absent => None,
            Resolved::One(v) => Some(v),
            Resolved::Many(vs) => Some(Value::Array(vs)),
        };
        return (format!("field '{field}'"), actual);
    }

    let metric = definition.metric.as_deref().unwrap_or_default();
    let actual = match metrics.get(metric) {
        Some(MetricValue::Number(n)) => serde_json::Number::from_f64(*n).map(Value::Number),
        Some(MetricValue::Label(s)) => Some(Value::String(s.clone())),
        Some(MetricValue::Absent) | None => None,
    };
    (format!("metric '{metric}'"), actual)
}

fn check(
    definition: &AssertionDefinition,
    record: &Value,
    metrics: &HashMap<String, MetricValue>,
) -> Verdict {
    let (target, actual) = resolve_target(definition, record, metrics);
    let expected = definition.expected.as_ref();

    let (passed, reason) = match (definition.predicate, &actual, expected) {
        (Predicate::Exists, Some(_), _) => (true, format!("{target} is present")),
        (Predicate::Exists, None, _) => (false, format!("{target} is absent")),
        (Predicate::NotExists, None, _) => (true, format!("{target} is absent")),
        (Predicate::NotExists, Some(v), _) => {
            (false, format!("{target} is present with value {v}"))
        }

        // Value predicates never crash on an absent target.
        (_, None, _) => (false, "field absent".to_string()),

        (Predicate::Equals, Some(v), Some(e)) => {
            if values_equal(v, e) {
                (true, format!("{target} = {v}"))
            } else {
                (false, format!("{target} = {v}, expected {e}"))
            }
        }
        (Predicate::NotEquals, Some(v), Some(e)) => {
            if values_equal(v, e) {
                (false, format!("{target} = {v}, expected anything else"))
            } else {
                (true, format!("{target} = {v}, differs from {e}"))
            }
        }
        (Predicate::GreaterThan, Some(v), Some(e)) => {
            compare_numeric(&target, v, e, |a, e| a > e)
        }
        (Predicate::LessThan, Some(v), Some(e)) => {
            compare_numeric(&target, v, e, |a, e| a < e)
        }
        (Predicate::Contains, Some(v), Some(e)) => check_contains(&target, v, e),

        // Unreachable after load-time validation; fail the check, not the run.
        (_, Some(_), None) => (false, "no expected value configured".to_string()),
    };

    Verdict {
        name: definition.name.clone(),
        passed,
        actual,
        expected: definition.expected.clone(),
        reason,
    }
}

/// Structural equality with numeric widening, so `42` equals `42.0`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare_numeric(
    target: &str,
    actual: &Value,
    expected: &Value,
    cmp: impl Fn(f64, f64) -> bool,
) -> (bool, String) {
    let Some(a) = actual.as_f64() else {
        return (false, format!("{target} = {actual} is not numeric"));
    };
    let Some(e) = expected.as_f64() else {
        return (false, format!("expected value {expected} is not numeric"));
    };
    if cmp(a, e) {
        (true, format!("{target} = {a}"))
    } else {
        (false, format!("{target} = {a}, expected bound {e} not met"))
    }
}

fn check_contains(target: &str, actual: &Value, expected: &Value) -> (bool, String) {
    match actual {
        Value::String(s) => {
            let Some(needle) = expected.as_str() else {
                return (
                    false,
                    format!("{target} is a string but expected value {expected} is not"),
                );
            };
            if s.contains(needle) {
                (true, format!("{target} contains \"{needle}\""))
            } else {
                (false, format!("{target} = \"{s}\" does not contain \"{needle}\""))
            }
        }
        Value::Array(items) => {
            if items.iter().any(|item| values_equal(item, expected)) {
                (true, format!("{target} contains {expected}"))
            } else {
                (false, format!("{target} does not contain {expected}"))
            }
        }
        other => (
            false,
            format!("{target} = {other} is neither a string nor a sequence"),
        ),
    }
}
