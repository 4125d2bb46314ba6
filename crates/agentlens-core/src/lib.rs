//! AgentLens Core Library
//!
//! A declarative evaluation engine that turns rule definitions into numeric
//! metrics and pass/fail judgments over logged agent execution records.
//! Records are nested JSON values; metric and assertion definitions are
//! authored as YAML; results come back as per-record detail plus a batch
//! aggregate report.

pub mod assertions;
pub mod calc;
pub mod config;
pub mod domain;
pub mod evaluator;
pub mod metrics;
pub mod obs;
pub mod report;
pub mod reporting;
pub mod resolve;
pub mod runner;
pub mod telemetry;

pub use domain::{
    AssertionDefinition, CalcOptions, CalcSpec, CalculatorFault, ConfigError, MetricDefinition,
    MetricValue, PathRule, Predicate, Verdict,
};

pub use assertions::AssertionEvaluator;
pub use calc::registry::CalculatorRegistry;
pub use calc::Calculator;
pub use config::EvalConfig;
pub use evaluator::MetricEvaluator;
pub use report::{
    AggregateReport, AssertionSummary, CategoricalSummary, NumericSummary, ReportBuilder,
    ABSENT_BUCKET,
};
pub use reporting::{
    render_report_md, write_report_json, write_report_md, ReportArtifact,
};
pub use resolve::{resolve, Resolved};
pub use runner::{BatchOutput, BatchRunner, RecordResult};

pub use metrics::METRICS;
pub use obs::{
    emit_batch_finished, emit_batch_started, emit_calculator_fault, RecordSpan,
};
pub use telemetry::init_tracing;

/// AgentLens version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
