//! Custom calculators registered through the plugin contract.
//!
//! An operator crate implements [`Calculator`] and hands instances to
//! [`CalculatorRegistry::load_custom`]; definitions then reference them by
//! `type:` exactly like a built-in, including as ratio operands.

use serde_json::{json, Value};

use agentlens_core::{
    BatchRunner, CalcSpec, Calculator, CalculatorFault, CalculatorRegistry, EvalConfig,
    MetricValue,
};

/// Counts words in the agent's final reply.
struct ReplyWordCount;

impl Calculator for ReplyWordCount {
    fn name(&self) -> &str {
        "reply_word_count"
    }

    fn description(&self) -> &str {
        "Number of whitespace-separated words in reply_text"
    }

    fn calculate(
        &self,
        _registry: &CalculatorRegistry,
        record: &Value,
        _spec: &CalcSpec,
    ) -> Result<MetricValue, CalculatorFault> {
        match record.get("reply_text").and_then(|v| v.as_str()) {
            Some(text) => Ok(MetricValue::Number(text.split_whitespace().count() as f64)),
            None => Ok(MetricValue::Absent),
        }
    }
}

/// A misbehaving plugin that faults on every record.
struct Unstable;

impl Calculator for Unstable {
    fn name(&self) -> &str {
        "unstable"
    }

    fn description(&self) -> &str {
        "Faults unconditionally"
    }

    fn calculate(
        &self,
        _registry: &CalculatorRegistry,
        _record: &Value,
        _spec: &CalcSpec,
    ) -> Result<MetricValue, CalculatorFault> {
        Err(CalculatorFault::Custom {
            calculator: "unstable".to_string(),
            message: "simulated plugin failure".to_string(),
        })
    }
}

fn registry_with_customs() -> CalculatorRegistry {
    let mut registry = CalculatorRegistry::with_builtins();
    let loaded = registry.load_custom(vec![
        Box::new(ReplyWordCount) as Box<dyn Calculator>,
        Box::new(Unstable),
    ]);
    assert_eq!(loaded, 2);
    registry
}

#[test]
fn custom_calculator_is_referenced_like_a_builtin() {
    let config = EvalConfig::from_yaml_str(
        r#"
metrics:
  - name: reply_words
    type: reply_word_count
"#,
    )
    .expect("parse");
    let runner = BatchRunner::new(registry_with_customs(), config).expect("valid config");

    let records = vec![json!({"reply_text": "here is your shopping list"})];
    let output = runner.run(&records);
    assert_eq!(output.records[0].metrics["reply_words"], MetricValue::Number(5.0));
}

#[test]
fn custom_calculator_composes_into_a_ratio() {
    let config = EvalConfig::from_yaml_str(
        r#"
metrics:
  - name: words_per_item
    type: ratio
    numerator:
      type: reply_word_count
    denominator:
      type: count_list
      field: shopping_list
    options:
      on_zero_denominator: 0.0
"#,
    )
    .expect("parse");
    let runner = BatchRunner::new(registry_with_customs(), config).expect("valid config");

    let records = vec![json!({
        "reply_text": "one two three four five six",
        "shopping_list": ["a", "b", "c"],
    })];
    let output = runner.run(&records);
    assert_eq!(
        output.records[0].metrics["words_per_item"],
        MetricValue::Number(2.0)
    );
}

#[test]
fn faulting_custom_never_aborts_the_batch() {
    let config = EvalConfig::from_yaml_str(
        r#"
metrics:
  - name: will_fault
    type: unstable
  - name: items
    type: count_list
    field: shopping_list
"#,
    )
    .expect("parse");
    let runner = BatchRunner::new(registry_with_customs(), config).expect("valid config");

    let records = vec![
        json!({"shopping_list": ["a"]}),
        json!({"shopping_list": ["a", "b"]}),
    ];
    let output = runner.run(&records);

    // The faulting metric records as absent on every record.
    assert_eq!(output.records[0].metrics["will_fault"], MetricValue::Absent);
    assert_eq!(output.records[1].metrics["will_fault"], MetricValue::Absent);

    // Sibling metrics and the aggregate are unaffected.
    assert_eq!(output.records[1].metrics["items"], MetricValue::Number(2.0));
    assert_eq!(output.report.records_processed, 2);
    let items = &output.report.numeric_metrics["items"];
    assert_eq!(items.count, 2);
    assert_eq!(items.mean, Some(1.5));
    assert!(!output.report.numeric_metrics.contains_key("will_fault"));
}

#[test]
fn colliding_custom_is_skipped_and_builtin_wins() {
    struct ShadowCountList;
    impl Calculator for ShadowCountList {
        fn name(&self) -> &str {
            "count_list"
        }
        fn description(&self) -> &str {
            "Tries to shadow the builtin"
        }
        fn calculate(
            &self,
            _registry: &CalculatorRegistry,
            _record: &Value,
            _spec: &CalcSpec,
        ) -> Result<MetricValue, CalculatorFault> {
            Ok(MetricValue::Number(-1.0))
        }
    }

    let mut registry = CalculatorRegistry::with_builtins();
    let loaded = registry.load_custom(vec![Box::new(ShadowCountList) as Box<dyn Calculator>]);
    assert_eq!(loaded, 0);

    let config = EvalConfig::from_yaml_str(
        r#"
metrics:
  - name: items
    type: count_list
    field: shopping_list
"#,
    )
    .expect("parse");
    let runner = BatchRunner::new(registry, config).expect("valid config");
    let records = vec![json!({"shopping_list": ["a", "b"]})];
    let output = runner.run(&records);
    assert_eq!(output.records[0].metrics["items"], MetricValue::Number(2.0));
}
