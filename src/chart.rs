use color_eyre::Result;
use color_eyre::eyre::eyre;
use tracing::debug_span;

use crate::aggregate::{Aggregation, collapse_below_threshold};
use crate::config::Config;
use crate::hierarchy::build_branches;
use crate::layout::node::{LayoutCell, LayoutRect};
use crate::layout::treemap::{TreemapOptions, layout_hierarchy};
use crate::merge::MergeConfig;
use crate::record::{KeyFn, Record, WeightFn, field_key, field_weight, fixed_threshold};

/// Everything needed to turn flat records into positioned cells:
/// aggregate (optional) → rebuild hierarchy → treemap layout.
pub struct ChartSpec {
    pub group_by: Vec<String>,
    pub weight_field: String,
    pub label_field: Option<String>,
    /// Fraction of the dataset's total weight; `None` or 0 disables
    /// threshold collapsing.
    pub threshold: Option<f64>,
    pub bounds: LayoutRect,
    pub padding: f64,
    pub merge: MergeConfig,
}

impl ChartSpec {
    /// Spec seeded from the config file; `group_by` and `weight_field` still
    /// have to be filled in by the caller.
    pub fn from_config(config: &Config) -> ChartSpec {
        let threshold = (config.aggregation.threshold > 0.0).then_some(config.aggregation.threshold);
        ChartSpec {
            group_by: Vec::new(),
            weight_field: "value".to_string(),
            label_field: None,
            threshold,
            bounds: LayoutRect::new(0.0, 0.0, config.layout.width, config.layout.height),
            padding: config.layout.padding,
            merge: MergeConfig {
                strategies: config.aggregation.strategies.clone(),
                concat_separator: config.aggregation.concat_separator.clone(),
                summary_field: Some(config.aggregation.summary_field.clone()),
                ..MergeConfig::default()
            },
        }
    }

    pub fn compute(&self, records: &[Record]) -> Result<Vec<LayoutCell>> {
        if self.group_by.is_empty() {
            return Err(eyre!("at least one group-by field is required"));
        }

        let keys: Vec<KeyFn> = self.group_by.iter().map(|field| field_key(field)).collect();
        let weight: WeightFn = field_weight(&self.weight_field);
        let draw_depth = self.group_by.len();

        let aggregated = match self.threshold.filter(|&fraction| fraction > 0.0) {
            Some(fraction) => {
                let _span = debug_span!("chart.aggregate", fraction).entered();
                let tree = build_branches(records, &keys, draw_depth, &weight);
                let threshold = fixed_threshold(fraction);
                let aggregation = Aggregation {
                    threshold: Some(&threshold),
                    weight: Some(&weight),
                    merge: &self.merge,
                    draw_depth,
                };
                collapse_below_threshold(records, &tree, &keys, &aggregation)
            }
            None => records.to_vec(),
        };

        let forest = {
            let _span = debug_span!("chart.hierarchy", records = aggregated.len()).entered();
            build_branches(&aggregated, &keys, draw_depth, &weight)
        };

        let _span = debug_span!("chart.layout").entered();
        let label = self.label_field.as_deref().map(field_key);
        let options = TreemapOptions {
            padding: self.padding,
            weight: &weight,
            label: label.as_ref(),
        };
        Ok(layout_hierarchy(&forest, &aggregated, &self.bounds, &options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(values: &[serde_json::Value]) -> Vec<Record> {
        values
            .iter()
            .map(|v| Record::from_value(v.clone()).unwrap())
            .collect()
    }

    fn base_spec() -> ChartSpec {
        ChartSpec {
            group_by: vec!["k".to_string()],
            weight_field: "v".to_string(),
            label_field: Some("name".to_string()),
            threshold: None,
            bounds: LayoutRect::new(0.0, 0.0, 100.0, 100.0),
            padding: 0.0,
            merge: MergeConfig {
                summary_field: Some("name".to_string()),
                ..MergeConfig::default()
            },
        }
    }

    #[test]
    fn empty_group_by_is_rejected() {
        let mut spec = base_spec();
        spec.group_by.clear();
        let data = records(&[json!({"k": "a", "v": 1})]);
        assert!(spec.compute(&data).is_err());
    }

    #[test]
    fn pipeline_without_threshold_keeps_every_record() {
        let spec = base_spec();
        let data = records(&[
            json!({"k": "a", "v": 10.0, "name": "first"}),
            json!({"k": "b", "v": 30.0, "name": "second"}),
        ]);
        let cells = spec.compute(&data).unwrap();

        // 2 branch cells + 2 leaves.
        assert_eq!(cells.len(), 4);
        assert!(cells.iter().all(|c| !c.aggregate));
        let leaf_labels: Vec<&str> = cells
            .iter()
            .filter(|c| c.depth == 1)
            .map(|c| c.label.as_str())
            .collect();
        assert!(leaf_labels.contains(&"first"));
        assert!(leaf_labels.contains(&"second"));
    }

    #[test]
    fn pipeline_with_threshold_emits_aggregate_cell() {
        let mut spec = base_spec();
        spec.threshold = Some(0.5);
        let data = records(&[
            json!({"k": "a", "v": 10.0, "name": "small"}),
            json!({"k": "a", "v": 1.0, "name": "tiny"}),
            json!({"k": "b", "v": 50.0, "name": "big"}),
        ]);
        let cells = spec.compute(&data).unwrap();

        let aggregate = cells.iter().find(|c| c.aggregate).expect("aggregate cell");
        assert_eq!(aggregate.weight, 11.0);
        assert_eq!(aggregate.label, "Other (2 items, 11)");
        assert_eq!(aggregate.path, vec!["a".to_string()]);

        let big = cells
            .iter()
            .find(|c| c.depth == 1 && c.label == "big")
            .expect("surviving leaf");
        assert!(!big.aggregate);
    }

    #[test]
    fn from_config_seeds_bounds_and_merge() {
        let config = Config::default();
        let spec = ChartSpec::from_config(&config);
        assert_eq!(spec.bounds.width, 960.0);
        assert_eq!(spec.threshold, None);
        assert_eq!(spec.merge.summary_field.as_deref(), Some("label"));
    }
}
