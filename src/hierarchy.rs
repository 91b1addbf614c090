use std::collections::HashMap;

use crate::record::{KeyFn, Record, WeightFn};

/// One group-by node. `total` is the subtree weight sum; `records` holds the
/// member record indices and is populated only at the leaf-adjacent depth.
#[derive(Clone, Debug)]
pub struct Branch {
    pub key: String,
    pub total: f64,
    pub children: Vec<Branch>,
    pub records: Vec<usize>,
}

impl Branch {
    pub fn is_terminal(&self) -> bool {
        self.children.is_empty()
    }
}

/// Groups records by the accessor chain, one level per depth up to
/// `draw_depth`. Sibling order is first-seen record order, so the forest is
/// deterministic for a given input order.
pub fn build_branches(
    records: &[Record],
    keys: &[KeyFn],
    draw_depth: usize,
    weight: &WeightFn,
) -> Vec<Branch> {
    if draw_depth == 0 || keys.len() < draw_depth || records.is_empty() {
        return Vec::new();
    }
    let indices: Vec<usize> = (0..records.len()).collect();
    group_level(records, keys, weight, draw_depth, 0, &indices)
}

fn group_level(
    records: &[Record],
    keys: &[KeyFn],
    weight: &WeightFn,
    draw_depth: usize,
    depth: usize,
    indices: &[usize],
) -> Vec<Branch> {
    let mut order: Vec<String> = Vec::new();
    let mut buckets: HashMap<String, Vec<usize>> = HashMap::new();
    for &index in indices {
        let key = keys[depth](&records[index]);
        match buckets.get_mut(&key) {
            Some(bucket) => bucket.push(index),
            None => {
                order.push(key.clone());
                buckets.insert(key, vec![index]);
            }
        }
    }

    order
        .into_iter()
        .map(|key| {
            let bucket = buckets.remove(&key).unwrap_or_default();
            let total = bucket.iter().map(|&index| weight(&records[index])).sum();
            if depth + 1 == draw_depth {
                Branch {
                    key,
                    total,
                    children: Vec::new(),
                    records: bucket,
                }
            } else {
                let children = group_level(records, keys, weight, draw_depth, depth + 1, &bucket);
                Branch {
                    key,
                    total,
                    children,
                    records: Vec::new(),
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{field_key, field_weight};
    use serde_json::json;

    fn records(values: &[serde_json::Value]) -> Vec<Record> {
        values
            .iter()
            .map(|v| Record::from_value(v.clone()).unwrap())
            .collect()
    }

    #[test]
    fn single_level_groups_in_first_seen_order() {
        let data = records(&[
            json!({"k": "b", "v": 10}),
            json!({"k": "a", "v": 1}),
            json!({"k": "b", "v": 5}),
        ]);
        let keys = vec![field_key("k")];
        let forest = build_branches(&data, &keys, 1, &field_weight("v"));

        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].key, "b");
        assert_eq!(forest[0].total, 15.0);
        assert_eq!(forest[0].records, vec![0, 2]);
        assert_eq!(forest[1].key, "a");
        assert_eq!(forest[1].records, vec![1]);
    }

    #[test]
    fn two_levels_nest_and_sum() {
        let data = records(&[
            json!({"region": "east", "city": "nyc", "v": 10}),
            json!({"region": "east", "city": "bos", "v": 4}),
            json!({"region": "west", "city": "sf", "v": 6}),
            json!({"region": "east", "city": "nyc", "v": 2}),
        ]);
        let keys = vec![field_key("region"), field_key("city")];
        let forest = build_branches(&data, &keys, 2, &field_weight("v"));

        assert_eq!(forest.len(), 2);
        let east = &forest[0];
        assert_eq!(east.key, "east");
        assert_eq!(east.total, 16.0);
        assert_eq!(east.children.len(), 2);
        assert!(east.records.is_empty());
        assert_eq!(east.children[0].key, "nyc");
        assert_eq!(east.children[0].total, 12.0);
        assert_eq!(east.children[0].records, vec![0, 3]);
    }

    #[test]
    fn zero_depth_or_short_chain_yields_empty_forest() {
        let data = records(&[json!({"k": "a", "v": 1})]);
        let keys = vec![field_key("k")];
        assert!(build_branches(&data, &keys, 0, &field_weight("v")).is_empty());
        assert!(build_branches(&data, &keys, 2, &field_weight("v")).is_empty());
        assert!(build_branches(&[], &keys, 1, &field_weight("v")).is_empty());
    }
}
