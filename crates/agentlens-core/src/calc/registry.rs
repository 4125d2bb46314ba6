//! Calculator registry and best-effort custom-calculator loading.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{info, warn};

use crate::domain::{CalcSpec, CalculatorFault, ConfigError, MetricValue};

use super::builtin::{CountList, CountUniqueInList, DerivePath, Ratio};
use super::Calculator;

/// Maps a `type:` name to its calculator implementation.
///
/// One lookup resolves built-ins and operator-registered customs alike;
/// composing calculators (`ratio`) recurse through the same table.
pub struct CalculatorRegistry {
    calculators: HashMap<String, Box<dyn Calculator>>,
}

impl Default for CalculatorRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl CalculatorRegistry {
    /// An empty registry with no calculators at all.
    pub fn empty() -> Self {
        Self {
            calculators: HashMap::new(),
        }
    }

    /// A registry seeded with the built-in calculator set.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        // Built-in names cannot collide; unwrap-free registration.
        for calculator in [
            Box::new(CountList) as Box<dyn Calculator>,
            Box::new(CountUniqueInList),
            Box::new(DerivePath),
            Box::new(Ratio),
        ] {
            let name = calculator.name().to_string();
            registry.calculators.insert(name, calculator);
        }
        registry
    }

    /// Register one calculator, failing on an empty or duplicate name.
    pub fn register(&mut self, calculator: Box<dyn Calculator>) -> Result<(), ConfigError> {
        let name = calculator.name().to_string();
        if name.is_empty() {
            return Err(ConfigError::EmptyCalculatorName);
        }
        if self.calculators.contains_key(&name) {
            return Err(ConfigError::DuplicateCalculator(name));
        }
        self.calculators.insert(name, calculator);
        Ok(())
    }

    /// Register operator-supplied calculators, best-effort.
    ///
    /// A calculator violating the contract (empty name, name collision with a
    /// built-in or an earlier custom) is skipped with a warning rather than
    /// aborting startup; the batch then proceeds with whatever registered.
    /// Returns the number actually registered.
    ///
    /// The loaded code runs with the full privilege of the evaluating
    /// process — this is a trust boundary, not a sandbox.
    pub fn load_custom(
        &mut self,
        calculators: impl IntoIterator<Item = Box<dyn Calculator>>,
    ) -> usize {
        let mut registered = 0;
        for calculator in calculators {
            let name = calculator.name().to_string();
            match self.register(calculator) {
                Ok(()) => {
                    info!(calculator = %name, "custom calculator registered");
                    registered += 1;
                }
                Err(err) => {
                    warn!(calculator = %name, error = %err, "skipping custom calculator");
                }
            }
        }
        registered
    }

    /// Look up a calculator by type name.
    pub fn get(&self, calc_type: &str) -> Option<&dyn Calculator> {
        self.calculators.get(calc_type).map(|c| c.as_ref())
    }

    /// Whether a registered type produces labels rather than numbers.
    /// Unknown types are reported as non-categorical; validation rejects
    /// them separately.
    pub fn is_categorical(&self, calc_type: &str) -> bool {
        self.get(calc_type).map(|c| c.is_categorical()).unwrap_or(false)
    }

    /// Validate one definition node: the type must be registered and its
    /// parameters must satisfy the calculator's own checks.
    pub fn validate_spec(&self, metric: &str, spec: &CalcSpec) -> Result<(), ConfigError> {
        let calculator =
            self.get(&spec.calc_type)
                .ok_or_else(|| ConfigError::UnknownCalculatorType {
                    metric: metric.to_string(),
                    calc_type: spec.calc_type.clone(),
                })?;
        calculator.validate(self, metric, spec)
    }

    /// Evaluate one definition node against a record.
    ///
    /// An unknown type here means the spec was never validated; surfaced as
    /// a fault rather than a panic so one bad node cannot take down a batch.
    pub fn calculate_spec(
        &self,
        record: &Value,
        spec: &CalcSpec,
    ) -> Result<MetricValue, CalculatorFault> {
        let calculator =
            self.get(&spec.calc_type)
                .ok_or_else(|| CalculatorFault::UnknownCalculator {
                    calculator: spec.calc_type.clone(),
                })?;
        calculator.calculate(self, record, spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedNumber {
        name: &'static str,
        value: f64,
    }

    impl Calculator for FixedNumber {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Always returns a fixed number"
        }

        fn calculate(
            &self,
            _registry: &CalculatorRegistry,
            _record: &Value,
            _spec: &CalcSpec,
        ) -> Result<MetricValue, CalculatorFault> {
            Ok(MetricValue::Number(self.value))
        }
    }

    #[test]
    fn builtins_are_registered() {
        let registry = CalculatorRegistry::with_builtins();
        for name in ["count_list", "count_unique_in_list", "derive_path", "ratio"] {
            assert!(registry.get(name).is_some(), "missing builtin {name}");
        }
        assert!(registry.is_categorical("derive_path"));
        assert!(!registry.is_categorical("count_list"));
    }

    #[test]
    fn custom_calculator_resolves_like_a_builtin() {
        let mut registry = CalculatorRegistry::with_builtins();
        let loaded = registry.load_custom(vec![Box::new(FixedNumber {
            name: "answer",
            value: 42.0,
        }) as Box<dyn Calculator>]);
        assert_eq!(loaded, 1);

        let spec = CalcSpec::of_type("answer");
        let value = registry
            .calculate_spec(&json!({}), &spec)
            .expect("calculate");
        assert_eq!(value, MetricValue::Number(42.0));
    }

    #[test]
    fn load_custom_skips_contract_violations() {
        let mut registry = CalculatorRegistry::with_builtins();
        let loaded = registry.load_custom(vec![
            // Collides with a built-in.
            Box::new(FixedNumber {
                name: "count_list",
                value: 1.0,
            }) as Box<dyn Calculator>,
            // Empty name violates the contract.
            Box::new(FixedNumber {
                name: "",
                value: 2.0,
            }),
            // Fine.
            Box::new(FixedNumber {
                name: "ok",
                value: 3.0,
            }),
            // Duplicate of the one just registered.
            Box::new(FixedNumber {
                name: "ok",
                value: 4.0,
            }),
        ]);
        assert_eq!(loaded, 1);
        assert!(registry.get("ok").is_some());
    }

    #[test]
    fn unknown_type_is_a_load_time_error() {
        let registry = CalculatorRegistry::with_builtins();
        let spec = CalcSpec::of_type("no_such_calc");
        let err = registry
            .validate_spec("my_metric", &spec)
            .expect_err("unknown type must fail validation");
        assert!(matches!(err, ConfigError::UnknownCalculatorType { .. }));
    }
}
