//! Batch aggregation of per-record results.
//!
//! [`ReportBuilder`] is a pure fold: feed it per-record metric maps and
//! verdict lists with [`ReportBuilder::add_record`], or combine builders
//! from independent partitions with [`ReportBuilder::merge`], then call
//! [`ReportBuilder::finish`]. No shared state, no ordering requirements
//! beyond definition names, so batches can be split across workers and
//! reduced in one step.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::{MetricValue, Verdict};

/// Bucket label under which absent categorical values are counted, so
/// unclassified records stay visible in the distribution.
pub const ABSENT_BUCKET: &str = "(absent)";

/// Summary of a numeric metric across a batch.
///
/// Absent values are excluded from `count` and every statistic — an absent
/// ratio is not a zero ratio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NumericSummary {
    /// Records that produced a number for this metric.
    pub count: usize,
    pub sum: f64,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Frequency distribution of a categorical metric across a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoricalSummary {
    /// Label → occurrence count, absent values under [`ABSENT_BUCKET`].
    pub buckets: BTreeMap<String, usize>,
}

/// Pass-rate summary of one assertion across a batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssertionSummary {
    pub passed: usize,
    pub total: usize,
    /// `passed / total`; `0.0` when nothing was evaluated.
    pub pass_rate: f64,
}

/// Batch-level summary combining per-record metric and assertion results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateReport {
    /// Total records processed, including ones that produced only absent
    /// values.
    pub records_processed: usize,

    pub numeric_metrics: BTreeMap<String, NumericSummary>,
    pub categorical_metrics: BTreeMap<String, CategoricalSummary>,
    pub assertions: BTreeMap<String, AssertionSummary>,

    /// Records where every assertion passed.
    pub records_all_assertions_passed: usize,
}

// ---------------------------------------------------------------------------
// Builder (the fold)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
struct NumericAcc {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl NumericAcc {
    fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }

    fn merge(&mut self, other: &NumericAcc) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.count += other.count;
        self.sum += other.sum;
    }

    fn finish(&self) -> NumericSummary {
        NumericSummary {
            count: self.count,
            sum: self.sum,
            mean: (self.count > 0).then(|| self.sum / self.count as f64),
            min: (self.count > 0).then_some(self.min),
            max: (self.count > 0).then_some(self.max),
        }
    }
}

/// Incremental, mergeable aggregation state.
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    categorical_names: BTreeSet<String>,
    records: usize,
    numeric: BTreeMap<String, NumericAcc>,
    categorical: BTreeMap<String, BTreeMap<String, usize>>,
    assertions: BTreeMap<String, (usize, usize)>,
    all_passed: usize,
}

impl ReportBuilder {
    /// `categorical_names` decides which metrics get frequency tables;
    /// everything else is summarized numerically (see
    /// [`crate::evaluator::MetricEvaluator::categorical_metrics`]).
    pub fn new(categorical_names: BTreeSet<String>) -> Self {
        Self {
            categorical_names,
            ..Self::default()
        }
    }

    /// Fold in one record's results.
    pub fn add_record(&mut self, metrics: &HashMap<String, MetricValue>, verdicts: &[Verdict]) {
        self.records += 1;

        for (name, value) in metrics {
            if self.categorical_names.contains(name) {
                let bucket = match value {
                    MetricValue::Label(label) => label.clone(),
                    MetricValue::Number(n) => n.to_string(),
                    MetricValue::Absent => ABSENT_BUCKET.to_string(),
                };
                *self
                    .categorical
                    .entry(name.clone())
                    .or_default()
                    .entry(bucket)
                    .or_insert(0) += 1;
            } else if let Some(n) = value.as_number() {
                self.numeric.entry(name.clone()).or_default().add(n);
            }
            // Absent numeric values are excluded entirely, not zeroed.
        }

        for verdict in verdicts {
            let (passed, total) = self.assertions.entry(verdict.name.clone()).or_insert((0, 0));
            *total += 1;
            if verdict.passed {
                *passed += 1;
            }
        }
        if verdicts.iter().all(|v| v.passed) {
            self.all_passed += 1;
        }
    }

    /// Combine with a builder from an independent partition of the batch.
    pub fn merge(&mut self, other: ReportBuilder) {
        self.records += other.records;
        self.all_passed += other.all_passed;
        self.categorical_names.extend(other.categorical_names);

        for (name, acc) in other.numeric {
            self.numeric.entry(name).or_default().merge(&acc);
        }
        for (name, buckets) in other.categorical {
            let mine = self.categorical.entry(name).or_default();
            for (bucket, count) in buckets {
                *mine.entry(bucket).or_insert(0) += count;
            }
        }
        for (name, (passed, total)) in other.assertions {
            let mine = self.assertions.entry(name).or_insert((0, 0));
            mine.0 += passed;
            mine.1 += total;
        }
    }

    /// Produce the final report.
    pub fn finish(self) -> AggregateReport {
        AggregateReport {
            records_processed: self.records,
            numeric_metrics: self
                .numeric
                .iter()
                .map(|(name, acc)| (name.clone(), acc.finish()))
                .collect(),
            categorical_metrics: self
                .categorical
                .into_iter()
                .map(|(name, buckets)| (name, CategoricalSummary { buckets }))
                .collect(),
            assertions: self
                .assertions
                .into_iter()
                .map(|(name, (passed, total))| {
                    let pass_rate = if total == 0 {
                        0.0
                    } else {
                        passed as f64 / total as f64
                    };
                    (
                        name,
                        AssertionSummary {
                            passed,
                            total,
                            pass_rate,
                        },
                    )
                })
                .collect(),
            records_all_assertions_passed: self.all_passed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(entries: &[(&str, MetricValue)]) -> HashMap<String, MetricValue> {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    fn verdict(name: &str, passed: bool) -> Verdict {
        Verdict {
            name: name.to_string(),
            passed,
            actual: None,
            expected: None,
            reason: String::new(),
        }
    }

    #[test]
    fn empty_batch_yields_well_formed_zero_report() {
        let report = ReportBuilder::new(BTreeSet::new()).finish();
        assert_eq!(report.records_processed, 0);
        assert!(report.numeric_metrics.is_empty());
        assert!(report.categorical_metrics.is_empty());
        assert!(report.assertions.is_empty());
        assert_eq!(report.records_all_assertions_passed, 0);
    }

    #[test]
    fn absent_values_excluded_from_mean_denominator() {
        let mut builder = ReportBuilder::new(BTreeSet::new());
        builder.add_record(&metrics(&[("rate", MetricValue::Number(50.0))]), &[]);
        builder.add_record(&metrics(&[("rate", MetricValue::Absent)]), &[]);
        builder.add_record(&metrics(&[("rate", MetricValue::Number(100.0))]), &[]);

        let report = builder.finish();
        let summary = &report.numeric_metrics["rate"];
        assert_eq!(summary.count, 2);
        assert_eq!(summary.mean, Some(75.0));
        assert_eq!(summary.min, Some(50.0));
        assert_eq!(summary.max, Some(100.0));
        assert_eq!(report.records_processed, 3);
    }

    #[test]
    fn absent_categorical_values_get_their_own_bucket() {
        let categorical = BTreeSet::from(["agent_path".to_string()]);
        let mut builder = ReportBuilder::new(categorical);
        builder.add_record(
            &metrics(&[("agent_path", MetricValue::Label("happy_path".to_string()))]),
            &[],
        );
        builder.add_record(&metrics(&[("agent_path", MetricValue::Absent)]), &[]);

        let report = builder.finish();
        let buckets = &report.categorical_metrics["agent_path"].buckets;
        assert_eq!(buckets["happy_path"], 1);
        assert_eq!(buckets[ABSENT_BUCKET], 1);
    }

    #[test]
    fn assertion_pass_rates_and_all_passed_count() {
        let mut builder = ReportBuilder::new(BTreeSet::new());
        builder.add_record(
            &HashMap::new(),
            &[verdict("a", true), verdict("b", true)],
        );
        builder.add_record(
            &HashMap::new(),
            &[verdict("a", true), verdict("b", false)],
        );

        let report = builder.finish();
        assert_eq!(report.assertions["a"].pass_rate, 1.0);
        assert_eq!(report.assertions["b"].pass_rate, 0.5);
        assert_eq!(report.records_all_assertions_passed, 1);
    }

    #[test]
    fn merge_equals_sequential_fold() {
        let categorical = BTreeSet::from(["path".to_string()]);

        let records = [
            metrics(&[
                ("n", MetricValue::Number(1.0)),
                ("path", MetricValue::Label("a".to_string())),
            ]),
            metrics(&[("n", MetricValue::Number(3.0)), ("path", MetricValue::Absent)]),
            metrics(&[
                ("n", MetricValue::Absent),
                ("path", MetricValue::Label("a".to_string())),
            ]),
        ];

        let mut sequential = ReportBuilder::new(categorical.clone());
        for m in &records {
            sequential.add_record(m, &[verdict("ok", true)]);
        }

        let mut left = ReportBuilder::new(categorical.clone());
        left.add_record(&records[0], &[verdict("ok", true)]);
        let mut right = ReportBuilder::new(categorical);
        right.add_record(&records[1], &[verdict("ok", true)]);
        right.add_record(&records[2], &[verdict("ok", true)]);
        left.merge(right);

        assert_eq!(left.finish(), sequential.finish());
    }
}
