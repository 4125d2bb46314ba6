//! Global atomic counters for engine observability.
//!
//! Per-record faults never interrupt a batch; they land here instead and
//! surface as one `tracing::info!` line when [`EngineMetrics::flush`] is
//! called at the end of a run.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: EngineMetrics = EngineMetrics::new();

/// Lightweight atomic counters — no allocations, no locking.
pub struct EngineMetrics {
    records_evaluated: AtomicU64,
    calculator_faults: AtomicU64,
    assertion_failures: AtomicU64,
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    pub const fn new() -> Self {
        Self {
            records_evaluated: AtomicU64::new(0),
            calculator_faults: AtomicU64::new(0),
            assertion_failures: AtomicU64::new(0),
        }
    }

    /// Increment the records-evaluated counter by one.
    pub fn inc_records_evaluated(&self) {
        self.records_evaluated.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the calculator-fault counter by one.
    pub fn inc_calculator_faults(&self) {
        self.calculator_faults.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the assertion-failure counter by one.
    pub fn inc_assertion_failures(&self) {
        self.assertion_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Emit all current counter values as a single `info!` event.
    ///
    /// Call at natural boundaries (end of a batch) rather than per record.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            records_evaluated = self.records_evaluated(),
            calculator_faults = self.calculator_faults(),
            assertion_failures = self.assertion_failures(),
        );
    }

    /// Read the current records-evaluated count.
    pub fn records_evaluated(&self) -> u64 {
        self.records_evaluated.load(Ordering::Relaxed)
    }

    /// Read the current calculator-fault count.
    pub fn calculator_faults(&self) -> u64 {
        self.calculator_faults.load(Ordering::Relaxed)
    }

    /// Read the current assertion-failure count.
    pub fn assertion_failures(&self) -> u64 {
        self.assertion_failures.load(Ordering::Relaxed)
    }
}
