//! Built-in calculators: `count_list`, `count_unique_in_list`,
//! `derive_path`, and the composing `ratio`.

use serde_json::Value;

use crate::domain::{CalcSpec, CalculatorFault, ConfigError, MetricValue};
use crate::resolve::{self, Resolved};

use super::registry::CalculatorRegistry;
use super::Calculator;

fn required_field<'a>(
    metric: &str,
    calc_type: &str,
    spec: &'a CalcSpec,
) -> Result<&'a str, ConfigError> {
    spec.field
        .as_deref()
        .ok_or_else(|| ConfigError::MissingParameter {
            metric: metric.to_string(),
            calc_type: calc_type.to_string(),
            param: "field".to_string(),
        })
}

// ---------------------------------------------------------------------------
// count_list
// ---------------------------------------------------------------------------

/// Length of the sequence at `field`; `0` when absent or not a sequence.
pub struct CountList;

impl Calculator for CountList {
    fn name(&self) -> &str {
        "count_list"
    }

    fn description(&self) -> &str {
        "Number of elements in the sequence at `field` (0 if absent)"
    }

    fn validate(
        &self,
        _registry: &CalculatorRegistry,
        metric: &str,
        spec: &CalcSpec,
    ) -> Result<(), ConfigError> {
        required_field(metric, self.name(), spec).map(|_| ())
    }

    fn calculate(
        &self,
        _registry: &CalculatorRegistry,
        record: &Value,
        spec: &CalcSpec,
    ) -> Result<MetricValue, CalculatorFault> {
        let field = spec.field.as_deref().unwrap_or_default();
        let count = match resolve::resolve(record, field) {
            Resolved::One(Value::Array(items)) => items.len(),
            Resolved::Many(values) => values.len(),
            // Absent field or non-sequence value both count as zero.
            _ => 0,
        };
        Ok(MetricValue::from(count))
    }
}

// ---------------------------------------------------------------------------
// count_unique_in_list
// ---------------------------------------------------------------------------

/// Distinct non-null values at `field` (typically a `<list>.<key>`
/// projection); `0` when the list is absent or empty.
pub struct CountUniqueInList;

impl Calculator for CountUniqueInList {
    fn name(&self) -> &str {
        "count_unique_in_list"
    }

    fn description(&self) -> &str {
        "Number of distinct non-null values projected from a list"
    }

    fn validate(
        &self,
        _registry: &CalculatorRegistry,
        metric: &str,
        spec: &CalcSpec,
    ) -> Result<(), ConfigError> {
        required_field(metric, self.name(), spec).map(|_| ())
    }

    fn calculate(
        &self,
        _registry: &CalculatorRegistry,
        record: &Value,
        spec: &CalcSpec,
    ) -> Result<MetricValue, CalculatorFault> {
        let field = spec.field.as_deref().unwrap_or_default();
        let values = match resolve::resolve(record, field) {
            Resolved::Many(values) => values,
            Resolved::One(Value::Array(items)) => items,
            _ => return Ok(MetricValue::from(0usize)),
        };

        // Values are compared by structural equality; a linear scan keeps
        // non-hashable JSON values (floats, nested maps) comparable.
        let mut distinct: Vec<&Value> = Vec::new();
        for value in values.iter().filter(|v| !v.is_null()) {
            if !distinct.contains(&value) {
                distinct.push(value);
            }
        }
        Ok(MetricValue::from(distinct.len()))
    }
}

// ---------------------------------------------------------------------------
// derive_path
// ---------------------------------------------------------------------------

/// First-match rule chain classifying which branch of behavior a record
/// represents. A rule matches when its field is present and non-empty; a
/// catch-all rule (no condition) always matches and must be terminal.
pub struct DerivePath;

impl Calculator for DerivePath {
    fn name(&self) -> &str {
        "derive_path"
    }

    fn description(&self) -> &str {
        "Label of the first rule whose field is present and non-empty"
    }

    fn validate(
        &self,
        _registry: &CalculatorRegistry,
        metric: &str,
        spec: &CalcSpec,
    ) -> Result<(), ConfigError> {
        let rules = spec
            .paths
            .as_deref()
            .ok_or_else(|| ConfigError::MissingParameter {
                metric: metric.to_string(),
                calc_type: self.name().to_string(),
                param: "paths".to_string(),
            })?;
        if rules.is_empty() {
            return Err(ConfigError::EmptyPathRules {
                metric: metric.to_string(),
            });
        }

        let catch_alls = rules.iter().filter(|r| r.is_catch_all()).count();
        if catch_alls > 1 {
            return Err(ConfigError::MultipleCatchAll {
                metric: metric.to_string(),
            });
        }
        if let Some(rule) = rules[..rules.len() - 1].iter().find(|r| r.is_catch_all()) {
            return Err(ConfigError::CatchAllNotLast {
                metric: metric.to_string(),
                rule: rule.name.clone(),
            });
        }
        Ok(())
    }

    fn calculate(
        &self,
        _registry: &CalculatorRegistry,
        record: &Value,
        spec: &CalcSpec,
    ) -> Result<MetricValue, CalculatorFault> {
        let rules = spec.paths.as_deref().unwrap_or_default();
        for rule in rules {
            match rule.if_field_exists.as_deref() {
                Some(field) => {
                    if resolve::resolve(record, field).is_present_non_empty() {
                        return Ok(MetricValue::Label(rule.name.clone()));
                    }
                }
                // Terminal catch-all.
                None => return Ok(MetricValue::Label(rule.name.clone())),
            }
        }
        // No rule matched and the author gave no catch-all: the record is
        // unclassified, surfaced as a distinct bucket by the aggregator.
        Ok(MetricValue::Absent)
    }

    fn is_categorical(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// ratio
// ---------------------------------------------------------------------------

/// Quotient of two nested calculator results, evaluated through the same
/// registry the parent was resolved from.
pub struct Ratio;

impl Ratio {
    fn operand<'a>(
        metric: &str,
        name: &'static str,
        spec: Option<&'a CalcSpec>,
    ) -> Result<&'a CalcSpec, ConfigError> {
        spec.ok_or_else(|| ConfigError::MissingParameter {
            metric: metric.to_string(),
            calc_type: "ratio".to_string(),
            param: name.to_string(),
        })
    }

    fn evaluate_operand(
        registry: &CalculatorRegistry,
        record: &Value,
        spec: &CalcSpec,
    ) -> Result<Option<f64>, CalculatorFault> {
        match registry.calculate_spec(record, spec)? {
            MetricValue::Number(n) => Ok(Some(n)),
            MetricValue::Absent => Ok(None),
            MetricValue::Label(label) => Err(CalculatorFault::NotNumeric {
                calculator: spec.calc_type.clone(),
                got: format!("label '{label}'"),
            }),
        }
    }
}

impl Calculator for Ratio {
    fn name(&self) -> &str {
        "ratio"
    }

    fn description(&self) -> &str {
        "Numerator divided by denominator, both nested calculators"
    }

    fn validate(
        &self,
        registry: &CalculatorRegistry,
        metric: &str,
        spec: &CalcSpec,
    ) -> Result<(), ConfigError> {
        let numerator = Self::operand(metric, "numerator", spec.numerator.as_deref())?;
        let denominator = Self::operand(metric, "denominator", spec.denominator.as_deref())?;

        for (operand, child) in [("numerator", numerator), ("denominator", denominator)] {
            registry.validate_spec(metric, child)?;
            if registry.is_categorical(&child.calc_type) {
                return Err(ConfigError::NonNumericRatioOperand {
                    metric: metric.to_string(),
                    operand: operand.to_string(),
                    calc_type: child.calc_type.clone(),
                });
            }
        }

        // Count denominators hit zero in practice; require the substitute up
        // front so the gap surfaces at load time, not mid-batch.
        if spec.options.on_zero_denominator.is_none() {
            return Err(ConfigError::MissingZeroDenominatorFallback {
                metric: metric.to_string(),
            });
        }
        Ok(())
    }

    fn calculate(
        &self,
        registry: &CalculatorRegistry,
        record: &Value,
        spec: &CalcSpec,
    ) -> Result<MetricValue, CalculatorFault> {
        let numerator = match spec.numerator.as_deref() {
            Some(child) => Self::evaluate_operand(registry, record, child)?,
            None => None,
        };
        let denominator = match spec.denominator.as_deref() {
            Some(child) => Self::evaluate_operand(registry, record, child)?,
            None => None,
        };

        let (num, den) = match (numerator, denominator) {
            (Some(n), Some(d)) => (n, d),
            // An absent operand makes the whole ratio absent.
            _ => return Ok(MetricValue::Absent),
        };

        if den == 0.0 {
            // The substitute is authored in final units; format_as_percent
            // does not apply on top of it.
            return match spec.options.on_zero_denominator {
                Some(fallback) => Ok(MetricValue::Number(fallback)),
                None => Ok(MetricValue::Absent),
            };
        }

        let mut result = num / den;
        if spec.options.format_as_percent {
            result *= 100.0;
        }
        Ok(MetricValue::Number(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PathRule;
    use serde_json::json;

    fn registry() -> CalculatorRegistry {
        CalculatorRegistry::with_builtins()
    }

    fn spec_with_field(calc_type: &str, field: &str) -> CalcSpec {
        CalcSpec {
            field: Some(field.to_string()),
            ..CalcSpec::of_type(calc_type)
        }
    }

    #[test]
    fn count_list_counts_sequence_length() {
        let record = json!({"ingredients_list": ["a", "b", "c", "d"]});
        let spec = spec_with_field("count_list", "ingredients_list");
        let value = CountList
            .calculate(&registry(), &record, &spec)
            .expect("calculate");
        assert_eq!(value, MetricValue::Number(4.0));
    }

    #[test]
    fn count_list_absent_or_scalar_is_zero() {
        let spec = spec_with_field("count_list", "ingredients_list");
        let reg = registry();

        let absent = json!({});
        assert_eq!(
            CountList.calculate(&reg, &absent, &spec).expect("calculate"),
            MetricValue::Number(0.0),
        );

        let scalar = json!({"ingredients_list": "not a list"});
        assert_eq!(
            CountList.calculate(&reg, &scalar, &spec).expect("calculate"),
            MetricValue::Number(0.0),
        );
    }

    #[test]
    fn count_unique_collapses_duplicates_and_skips_nulls() {
        let record = json!({
            "store_search_results": [
                {"ingredient": "lime"},
                {"ingredient": "lime"},
                {"ingredient": null},
                {"ingredient": "salt"},
                {"aisle": 2},
            ]
        });
        let spec = spec_with_field("count_unique_in_list", "store_search_results.ingredient");
        let value = CountUniqueInList
            .calculate(&registry(), &record, &spec)
            .expect("calculate");
        assert_eq!(value, MetricValue::Number(2.0));
    }

    #[test]
    fn count_unique_on_absent_list_is_zero() {
        let spec = spec_with_field("count_unique_in_list", "store_search_results.ingredient");
        let value = CountUniqueInList
            .calculate(&registry(), &json!({}), &spec)
            .expect("calculate");
        assert_eq!(value, MetricValue::Number(0.0));
    }

    fn derive_path_spec(rules: Vec<PathRule>) -> CalcSpec {
        CalcSpec {
            paths: Some(rules),
            ..CalcSpec::of_type("derive_path")
        }
    }

    fn rule(name: &str, field: Option<&str>) -> PathRule {
        PathRule {
            name: name.to_string(),
            if_field_exists: field.map(str::to_string),
        }
    }

    #[test]
    fn derive_path_first_match_wins() {
        let spec = derive_path_spec(vec![
            rule("a", Some("x")),
            rule("b", Some("y")),
            rule("default", None),
        ]);
        let record = json!({"x": "set", "y": "also set"});
        let value = DerivePath
            .calculate(&registry(), &record, &spec)
            .expect("calculate");
        assert_eq!(value, MetricValue::Label("a".to_string()));
    }

    #[test]
    fn derive_path_empty_field_does_not_match() {
        let spec = derive_path_spec(vec![rule("a", Some("x")), rule("b", Some("y"))]);
        let record = json!({"x": [], "y": "signal"});
        let value = DerivePath
            .calculate(&registry(), &record, &spec)
            .expect("calculate");
        assert_eq!(value, MetricValue::Label("b".to_string()));
    }

    #[test]
    fn derive_path_without_catch_all_yields_absent() {
        let spec = derive_path_spec(vec![
            rule("clarification", Some("clarification_question")),
            rule("happy_path", Some("shopping_list")),
        ]);
        let value = DerivePath
            .calculate(&registry(), &json!({}), &spec)
            .expect("calculate");
        assert_eq!(value, MetricValue::Absent);
    }

    #[test]
    fn derive_path_rejects_non_terminal_catch_all() {
        let spec = derive_path_spec(vec![rule("default", None), rule("a", Some("x"))]);
        let err = DerivePath
            .validate(&registry(), "agent_path", &spec)
            .expect_err("catch-all first must be rejected");
        assert!(matches!(err, ConfigError::CatchAllNotLast { .. }));
    }

    #[test]
    fn derive_path_rejects_multiple_catch_alls() {
        let spec = derive_path_spec(vec![rule("d1", None), rule("d2", None)]);
        let err = DerivePath
            .validate(&registry(), "agent_path", &spec)
            .expect_err("two catch-alls must be rejected");
        assert!(matches!(err, ConfigError::MultipleCatchAll { .. }));
    }

    fn find_rate_spec() -> CalcSpec {
        CalcSpec {
            numerator: Some(Box::new(spec_with_field(
                "count_unique_in_list",
                "store_search_results.ingredient",
            ))),
            denominator: Some(Box::new(spec_with_field("count_list", "ingredients_list"))),
            options: crate::domain::CalcOptions {
                on_zero_denominator: Some(0.0),
                format_as_percent: true,
            },
            ..CalcSpec::of_type("ratio")
        }
    }

    #[test]
    fn ratio_formats_as_percent() {
        let record = json!({
            "ingredients_list": ["a", "b", "c", "d"],
            "store_search_results": [
                {"ingredient": "a"},
                {"ingredient": "b"},
                {"ingredient": "c"},
            ]
        });
        let value = Ratio
            .calculate(&registry(), &record, &find_rate_spec())
            .expect("calculate");
        assert_eq!(value, MetricValue::Number(75.0));
    }

    #[test]
    fn ratio_zero_denominator_substitute_is_used_as_is() {
        let mut spec = find_rate_spec();
        spec.options.on_zero_denominator = Some(100.0);
        let record = json!({"ingredients_list": [], "store_search_results": []});
        let value = Ratio
            .calculate(&registry(), &record, &spec)
            .expect("calculate");
        // Not re-multiplied by format_as_percent.
        assert_eq!(value, MetricValue::Number(100.0));
    }

    #[test]
    fn ratio_validation_requires_zero_denominator_fallback() {
        let mut spec = find_rate_spec();
        spec.options.on_zero_denominator = None;
        let err = Ratio
            .validate(&registry(), "find_rate", &spec)
            .expect_err("missing fallback must be rejected");
        assert!(matches!(
            err,
            ConfigError::MissingZeroDenominatorFallback { .. }
        ));
    }

    #[test]
    fn ratio_rejects_categorical_operand() {
        let mut spec = find_rate_spec();
        spec.numerator = Some(Box::new(derive_path_spec(vec![rule("a", Some("x"))])));
        let err = Ratio
            .validate(&registry(), "find_rate", &spec)
            .expect_err("derive_path operand must be rejected");
        assert!(matches!(err, ConfigError::NonNumericRatioOperand { .. }));
    }
}
