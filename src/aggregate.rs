use serde_json::Value;
use tracing::debug_span;

use crate::format::aggregate_label;
use crate::hierarchy::Branch;
use crate::merge::{MergeConfig, merge_records};
use crate::record::{AggregateMeta, KeyFn, Record, ThresholdFn, WeightFn};

/// Threshold-collapse configuration for one aggregation pass. All state is
/// explicit so concurrent passes over independent inputs cannot interfere.
pub struct Aggregation<'a> {
    pub threshold: Option<&'a ThresholdFn>,
    pub weight: Option<&'a WeightFn>,
    pub merge: &'a MergeConfig,
    pub draw_depth: usize,
}

/// Collapses below-threshold leaves, branch by branch.
///
/// For every branch at the leaf-adjacent depth, the threshold function is
/// asked for a fraction of the whole dataset's weight; members of that branch
/// weighing strictly less than the resulting cutoff are removed and merged
/// into a single synthetic aggregate. Survivors keep their input order and
/// aggregates are appended after them in branch traversal order.
///
/// Without a threshold or weight accessor this is a pass-through clone.
/// A non-finite threshold result leaves the affected branch untouched;
/// out-of-range results are clamped to [0, 1].
pub fn collapse_below_threshold(
    data: &[Record],
    tree: &[Branch],
    keys: &[KeyFn],
    aggregation: &Aggregation,
) -> Vec<Record> {
    let (Some(threshold), Some(weight)) = (aggregation.threshold, aggregation.weight) else {
        return data.to_vec();
    };
    if keys.len() < aggregation.draw_depth {
        return data.to_vec();
    }

    let _span = debug_span!("aggregate.collapse", records = data.len()).entered();

    let walk = Walk {
        data,
        keys,
        threshold,
        weight,
        merge: aggregation.merge,
        draw_depth: aggregation.draw_depth,
        total_sum: data.iter().map(|record| weight(record)).sum(),
    };

    // Removal is mark-then-filter over record indices, so duplicate-valued
    // records are removed by identity and never by accident.
    let mut removed = vec![false; data.len()];
    let mut aggregates: Vec<Record> = Vec::new();
    let all: Vec<usize> = (0..data.len()).collect();
    for branch in tree {
        walk.visit(branch, 0, &all, &mut removed, &mut aggregates);
    }

    let mut output: Vec<Record> = data
        .iter()
        .enumerate()
        .filter(|(index, _)| !removed[*index])
        .map(|(_, record)| record.clone())
        .collect();
    output.extend(aggregates);
    output
}

struct Walk<'a> {
    data: &'a [Record],
    keys: &'a [KeyFn],
    threshold: &'a ThresholdFn,
    weight: &'a WeightFn,
    merge: &'a MergeConfig,
    draw_depth: usize,
    total_sum: f64,
}

impl Walk<'_> {
    fn visit(
        &self,
        branch: &Branch,
        depth: usize,
        current: &[usize],
        removed: &mut [bool],
        aggregates: &mut Vec<Record>,
    ) {
        // Malformed trees deeper than the draw depth are ignored.
        if depth >= self.draw_depth {
            return;
        }

        let key = &self.keys[depth];
        let next: Vec<usize> = current
            .iter()
            .copied()
            .filter(|&index| key(&self.data[index]) == branch.key)
            .collect();

        if depth + 1 < self.draw_depth {
            for child in &branch.children {
                self.visit(child, depth + 1, &next, removed, aggregates);
            }
            return;
        }

        let candidates: Vec<&Record> = next.iter().map(|&index| &self.data[index]).collect();
        let fraction = (self.threshold)(&candidates);
        if !fraction.is_finite() {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        let cutoff = fraction * self.total_sum;

        let mut removed_here: Vec<usize> = Vec::new();
        for &index in &next {
            if (self.weight)(&self.data[index]) < cutoff {
                removed[index] = true;
                removed_here.push(index);
            }
        }
        if removed_here.is_empty() {
            return;
        }

        let sources: Vec<&Record> = removed_here.iter().map(|&index| &self.data[index]).collect();
        let mut aggregate = merge_records(&sources, self.merge);
        if let Some(field) = &self.merge.summary_field {
            let removed_total: f64 = sources.iter().map(|record| (self.weight)(record)).sum();
            aggregate.set(
                field,
                Value::from(aggregate_label(sources.len(), removed_total)),
            );
        }
        aggregate.aggregate = Some(AggregateMeta {
            threshold: fraction,
            merged: removed_here.len(),
        });
        aggregates.push(aggregate);
    }
}
