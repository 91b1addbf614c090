use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::record::Record;

/// Per-field reduction applied when below-threshold records are merged into
/// one aggregate.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    #[default]
    Sum,
    Mean,
    Min,
    Max,
    First,
    Last,
    Count,
    Concat,
    Skip,
}

#[derive(Clone, Debug)]
pub struct MergeConfig {
    /// Explicit per-field overrides; fields not listed fall back to the
    /// numeric or text default depending on their values.
    pub strategies: HashMap<String, MergeStrategy>,
    pub default_numeric: MergeStrategy,
    pub default_text: MergeStrategy,
    pub concat_separator: String,
    /// When set, the aggregator writes a human summary label into this field.
    pub summary_field: Option<String>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        MergeConfig {
            strategies: HashMap::new(),
            default_numeric: MergeStrategy::Sum,
            default_text: MergeStrategy::First,
            concat_separator: " + ".to_string(),
            summary_field: None,
        }
    }
}

impl MergeConfig {
    fn strategy_for(&self, field: &str, values: &[&Value]) -> MergeStrategy {
        if let Some(&strategy) = self.strategies.get(field) {
            return strategy;
        }
        if values.iter().all(|v| v.is_number()) {
            self.default_numeric
        } else {
            self.default_text
        }
    }
}

/// Reduces the given records into one synthetic record, field by field.
/// Field order follows first appearance across the inputs. The caller is
/// responsible for stamping aggregate metadata on the result.
pub fn merge_records(sources: &[&Record], config: &MergeConfig) -> Record {
    let mut merged = Record::default();

    let mut field_order: Vec<&str> = Vec::new();
    for source in sources {
        for field in source.fields.keys() {
            if !field_order.iter().any(|f| f == field) {
                field_order.push(field);
            }
        }
    }

    for field in field_order {
        let values: Vec<&Value> = sources.iter().filter_map(|s| s.get(field)).collect();
        if values.is_empty() {
            continue;
        }
        let strategy = config.strategy_for(field, &values);
        if let Some(value) = reduce(&values, strategy, &config.concat_separator) {
            merged.set(field, value);
        }
    }

    merged
}

fn reduce(values: &[&Value], strategy: MergeStrategy, separator: &str) -> Option<Value> {
    let numbers = || values.iter().filter_map(|v| v.as_f64());
    match strategy {
        MergeStrategy::Sum => Some(Value::from(numbers().sum::<f64>())),
        MergeStrategy::Mean => {
            let count = numbers().count();
            if count == 0 {
                None
            } else {
                Some(Value::from(numbers().sum::<f64>() / count as f64))
            }
        }
        MergeStrategy::Min => numbers().reduce(f64::min).map(Value::from),
        MergeStrategy::Max => numbers().reduce(f64::max).map(Value::from),
        MergeStrategy::First => values.first().map(|&v| v.clone()),
        MergeStrategy::Last => values.last().map(|&v| v.clone()),
        MergeStrategy::Count => Some(Value::from(values.len() as u64)),
        MergeStrategy::Concat => {
            let parts: Vec<String> = values
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            Some(Value::from(parts.join(separator)))
        }
        MergeStrategy::Skip => None,
    }
}
