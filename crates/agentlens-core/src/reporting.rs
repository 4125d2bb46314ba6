//! Report artifact rendering and persistence.
//!
//! The engine returns structured results; this module turns them into the
//! two artifacts callers usually want — a schema-versioned JSON file for
//! machines and a markdown summary for humans — without the engine itself
//! doing any printing.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::report::AggregateReport;

/// Canonical report artifact written after a batch run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportArtifact {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,

    /// Digest of the definition set that produced this report
    /// (see [`crate::config::EvalConfig::digest`]).
    pub config_digest: String,

    pub report: AggregateReport,
}

impl ReportArtifact {
    /// Wrap an aggregate report with provenance metadata.
    pub fn new(config_digest: String, report: AggregateReport) -> Self {
        Self {
            schema_version: "1.0".to_string(),
            generated_at: Utc::now(),
            config_digest,
            report,
        }
    }
}

/// Write the artifact as pretty JSON.
pub fn write_report_json(path: &Path, artifact: &ReportArtifact) -> Result<()> {
    let content = serde_json::to_string_pretty(artifact).context("serialize report artifact")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Render the human-readable markdown summary.
pub fn render_report_md(artifact: &ReportArtifact) -> String {
    let report = &artifact.report;
    let mut out = String::new();

    out.push_str("# Batch Evaluation Summary\n\n");
    out.push_str(&format!(
        "- records processed: {}\n- records with all assertions passed: {}\n- definitions digest: `{}`\n\n",
        report.records_processed, report.records_all_assertions_passed, artifact.config_digest,
    ));

    out.push_str("## Numeric Metrics\n");
    if report.numeric_metrics.is_empty() {
        out.push_str("none\n\n");
    } else {
        out.push_str("| metric | count | mean | min | max |\n");
        out.push_str("|---|---|---|---|---|\n");
        for (name, summary) in &report.numeric_metrics {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                name,
                summary.count,
                fmt_opt(summary.mean),
                fmt_opt(summary.min),
                fmt_opt(summary.max),
            ));
        }
        out.push('\n');
    }

    out.push_str("## Categorical Metrics\n");
    if report.categorical_metrics.is_empty() {
        out.push_str("none\n\n");
    } else {
        for (name, summary) in &report.categorical_metrics {
            out.push_str(&format!("### {}\n", name));
            for (bucket, count) in &summary.buckets {
                out.push_str(&format!("- {}: {}\n", bucket, count));
            }
            out.push('\n');
        }
    }

    out.push_str("## Assertions\n");
    if report.assertions.is_empty() {
        out.push_str("none\n");
    } else {
        out.push_str("| assertion | passed | total | pass rate |\n");
        out.push_str("|---|---|---|---|\n");
        for (name, summary) in &report.assertions {
            out.push_str(&format!(
                "| {} | {} | {} | {:.1}% |\n",
                name,
                summary.passed,
                summary.total,
                summary.pass_rate * 100.0,
            ));
        }
    }
    out
}

/// Write the markdown summary.
pub fn write_report_md(path: &Path, artifact: &ReportArtifact) -> Result<()> {
    let md = render_report_md(artifact);
    std::fs::write(path, md).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}
