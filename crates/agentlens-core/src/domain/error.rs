//! Domain-level error taxonomy for AgentLens.
//!
//! Two families, deliberately kept apart:
//!
//! - [`ConfigError`] — fatal, raised while validating a definition set,
//!   always before the first record is touched. Every variant names the
//!   offending metric or assertion so the author can find it.
//! - [`CalculatorFault`] — non-fatal, raised inside a calculator for one
//!   metric on one record. Caught at the evaluator boundary, logged, and
//!   recorded as an absent value; never aborts sibling metrics or the batch.
//!
//! A missing field is neither of these: resolution gaps are an expected data
//! irregularity and travel as [`crate::resolve::Resolved::Absent`].

/// Errors produced by definition-set validation at load time.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("metric '{metric}' references unknown calculator type: {calc_type}")]
    UnknownCalculatorType { metric: String, calc_type: String },

    #[error("duplicate metric name: {0}")]
    DuplicateMetricName(String),

    #[error("duplicate assertion name: {0}")]
    DuplicateAssertionName(String),

    #[error("a calculator named '{0}' is already registered")]
    DuplicateCalculator(String),

    #[error("cannot register a calculator with an empty name")]
    EmptyCalculatorName,

    #[error("metric '{metric}' ({calc_type}) missing required parameter: {param}")]
    MissingParameter {
        metric: String,
        calc_type: String,
        param: String,
    },

    #[error("metric '{metric}': derive_path requires at least one rule")]
    EmptyPathRules { metric: String },

    #[error("metric '{metric}': derive_path catch-all rule '{rule}' must be the last rule")]
    CatchAllNotLast { metric: String, rule: String },

    #[error("metric '{metric}': derive_path has more than one catch-all rule")]
    MultipleCatchAll { metric: String },

    #[error("metric '{metric}': ratio requires options.on_zero_denominator (a count denominator can be zero)")]
    MissingZeroDenominatorFallback { metric: String },

    #[error("metric '{metric}': ratio {operand} must be a numeric calculator, got '{calc_type}'")]
    NonNumericRatioOperand {
        metric: String,
        operand: String,
        calc_type: String,
    },

    #[error("assertion '{assertion}': predicate {predicate} requires an expected value")]
    MissingExpected {
        assertion: String,
        predicate: String,
    },

    #[error("assertion '{assertion}' must target exactly one of 'field' or 'metric'")]
    AmbiguousAssertionTarget { assertion: String },

    #[error("assertion '{assertion}' references unknown metric: {metric}")]
    UnknownMetricReference { assertion: String, metric: String },

    #[error("invalid YAML definition file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid JSON definition file: {0}")]
    Json(#[from] serde_json::Error),
}

/// An unexpected failure inside one calculator for one record.
#[derive(Debug, thiserror::Error)]
pub enum CalculatorFault {
    #[error("calculator '{calculator}' expected a numeric value, got {got}")]
    NotNumeric { calculator: String, got: String },

    #[error("calculator '{calculator}' invoked with no registered implementation")]
    UnknownCalculator { calculator: String },

    #[error("custom calculator '{calculator}' failed: {message}")]
    Custom {
        calculator: String,
        message: String,
    },
}

/// Result type for definition-set loading and validation.
pub type Result<T> = std::result::Result<T, ConfigError>;
