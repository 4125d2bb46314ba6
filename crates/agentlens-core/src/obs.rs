//! Structured observability hooks for batch evaluation.
//!
//! Record-scoped spans via the [`RecordSpan`] RAII guard plus emission
//! functions for batch lifecycle events. Events are emitted at `info!`
//! (faults at `warn!`); filter with `RUST_LOG`.

use tracing::{info, warn};

/// RAII guard that enters a record-scoped tracing span for the duration of
/// one record's evaluation, so fault logs carry the record identity.
pub struct RecordSpan {
    _span: tracing::span::EnteredSpan,
}

impl RecordSpan {
    /// Create and enter a span tagged with the record id.
    pub fn enter(record_id: &str) -> Self {
        let span = tracing::info_span!("agentlens.record", record_id = %record_id);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: batch evaluation started.
pub fn emit_batch_started(metrics: usize, assertions: usize) {
    info!(event = "batch.started", metrics, assertions);
}

/// Emit event: batch evaluation finished.
pub fn emit_batch_finished(records: usize, calculator_faults: u64) {
    info!(
        event = "batch.finished",
        records, calculator_faults
    );
}

/// Emit event: a calculator faulted for one metric on the current record.
///
/// Record identity comes from the surrounding [`RecordSpan`].
pub fn emit_calculator_fault(metric: &str, error: &dyn std::fmt::Display) {
    warn!(event = "calculator.fault", metric = %metric, error = %error);
}
