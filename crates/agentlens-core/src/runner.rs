//! Batch evaluation over a sequence of records.
//!
//! The runner owns one validated [`MetricEvaluator`] and one
//! [`AssertionEvaluator`] and applies both to every record, independently
//! and synchronously. Records arrive as an in-memory iterable of parsed
//! `serde_json::Value`s — acquiring them (log files, streams) is the
//! caller's job.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::assertions::AssertionEvaluator;
use crate::calc::registry::CalculatorRegistry;
use crate::config::EvalConfig;
use crate::domain::{ConfigError, MetricValue, Verdict};
use crate::evaluator::MetricEvaluator;
use crate::metrics::METRICS;
use crate::obs::{self, RecordSpan};
use crate::report::{AggregateReport, ReportBuilder};

/// One record's full evaluation detail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordResult {
    /// The record's own `record_id` when present, else its batch index.
    pub record_id: String,

    pub metrics: HashMap<String, MetricValue>,
    pub verdicts: Vec<Verdict>,
}

/// Everything a batch run produces: the aggregate plus per-record detail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchOutput {
    pub report: AggregateReport,
    pub records: Vec<RecordResult>,
}

/// Applies a validated definition set to batches of records.
pub struct BatchRunner {
    metrics: MetricEvaluator,
    assertions: AssertionEvaluator,
}

impl std::fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner").finish_non_exhaustive()
    }
}

impl BatchRunner {
    /// Validate `config` against `registry` and build a runner.
    ///
    /// Cross-set check: an assertion targeting a metric must name one that
    /// the metric definitions actually define.
    pub fn new(registry: CalculatorRegistry, config: EvalConfig) -> Result<Self, ConfigError> {
        let metrics = MetricEvaluator::new(registry, config.metrics)?;
        let assertions = AssertionEvaluator::new(config.assertions)?;

        for (assertion, metric) in assertions.metric_references() {
            if !metrics.has_metric(metric) {
                return Err(ConfigError::UnknownMetricReference {
                    assertion: assertion.to_string(),
                    metric: metric.to_string(),
                });
            }
        }

        Ok(Self {
            metrics,
            assertions,
        })
    }

    /// Evaluate one record: metrics first, then assertions (which may read
    /// the computed metrics).
    pub fn evaluate_record(&self, record: &Value) -> (HashMap<String, MetricValue>, Vec<Verdict>) {
        let metric_values = self.metrics.evaluate(record);
        let verdicts = self.assertions.evaluate(record, &metric_values);
        (metric_values, verdicts)
    }

    /// Evaluate a whole batch and aggregate the results.
    ///
    /// Per-record faults are logged and counted, never fatal; an empty batch
    /// yields a well-formed zero report.
    pub fn run<'a>(&self, records: impl IntoIterator<Item = &'a Value>) -> BatchOutput {
        let mut builder = ReportBuilder::new(self.metrics.categorical_metrics());
        let mut details = Vec::new();
        let faults_before = METRICS.calculator_faults();

        obs::emit_batch_started(
            self.metrics.definitions().len(),
            self.assertions.definitions().len(),
        );

        for (index, record) in records.into_iter().enumerate() {
            let record_id = record
                .get("record_id")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| index.to_string());
            let _span = RecordSpan::enter(&record_id);

            let (metric_values, verdicts) = self.evaluate_record(record);
            builder.add_record(&metric_values, &verdicts);
            METRICS.inc_records_evaluated();

            details.push(RecordResult {
                record_id,
                metrics: metric_values,
                verdicts,
            });
        }

        obs::emit_batch_finished(
            details.len(),
            METRICS.calculator_faults() - faults_before,
        );

        BatchOutput {
            report: builder.finish(),
            records: details,
        }
    }
}
