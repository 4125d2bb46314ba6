//! Pure domain types for the evaluation engine: definitions, values,
//! verdicts, and the error taxonomy.

pub mod assertion;
pub mod definition;
pub mod error;
pub mod value;

pub use assertion::{AssertionDefinition, Predicate, Verdict};
pub use definition::{CalcOptions, CalcSpec, MetricDefinition, PathRule};
pub use error::{CalculatorFault, ConfigError, Result};
pub use value::MetricValue;
