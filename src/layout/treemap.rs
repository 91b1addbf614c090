use std::cmp::Ordering;

use super::node::{LayoutCell, LayoutRect};
use crate::hierarchy::Branch;
use crate::record::{KeyFn, Record, WeightFn};

pub struct TreemapOptions<'a> {
    pub padding: f64,
    pub weight: &'a WeightFn,
    /// Leaf label accessor; falls back to the enclosing branch key.
    pub label: Option<&'a KeyFn>,
}

/// Positions every branch and leaf record of the forest inside `bounds`,
/// recursing into each branch rect inset by the configured padding. Emits one
/// cell per branch at every depth plus one cell per leaf record.
pub fn layout_hierarchy(
    branches: &[Branch],
    records: &[Record],
    bounds: &LayoutRect,
    options: &TreemapOptions,
) -> Vec<LayoutCell> {
    let mut cells = Vec::new();
    let mut path = Vec::new();
    place_branches(branches, records, bounds, 0, &mut path, options, &mut cells);
    cells
}

fn place_branches(
    branches: &[Branch],
    records: &[Record],
    bounds: &LayoutRect,
    depth: usize,
    path: &mut Vec<String>,
    options: &TreemapOptions,
    cells: &mut Vec<LayoutCell>,
) {
    if branches.is_empty() || bounds.area() <= 0.0 {
        return;
    }

    let mut order: Vec<usize> = (0..branches.len()).collect();
    order.sort_by(|&a, &b| {
        branches[b]
            .total
            .partial_cmp(&branches[a].total)
            .unwrap_or(Ordering::Equal)
    });
    let weights: Vec<f64> = order.iter().map(|&i| branches[i].total.max(0.0)).collect();
    let rects = squarify(&weights, bounds);
    if rects.len() != order.len() {
        return;
    }

    for (slot, &index) in order.iter().enumerate() {
        let branch = &branches[index];
        let rect = rects[slot].clone();
        path.push(branch.key.clone());
        cells.push(LayoutCell {
            rect: rect.clone(),
            path: path.clone(),
            label: branch.key.clone(),
            weight: branch.total,
            depth,
            aggregate: false,
        });
        let inner = rect.inset(options.padding);
        if branch.is_terminal() {
            place_records(&branch.records, records, &inner, depth + 1, path, options, cells);
        } else {
            place_branches(
                &branch.children,
                records,
                &inner,
                depth + 1,
                path,
                options,
                cells,
            );
        }
        path.pop();
    }
}

fn place_records(
    indices: &[usize],
    records: &[Record],
    bounds: &LayoutRect,
    depth: usize,
    path: &mut Vec<String>,
    options: &TreemapOptions,
    cells: &mut Vec<LayoutCell>,
) {
    if indices.is_empty() || bounds.area() <= 0.0 {
        return;
    }

    let mut order = indices.to_vec();
    order.sort_by(|&a, &b| {
        let wa = (options.weight)(&records[a]);
        let wb = (options.weight)(&records[b]);
        wb.partial_cmp(&wa).unwrap_or(Ordering::Equal)
    });
    let weights: Vec<f64> = order
        .iter()
        .map(|&i| (options.weight)(&records[i]).max(0.0))
        .collect();
    let rects = squarify(&weights, bounds);
    if rects.len() != order.len() {
        return;
    }

    for (slot, &index) in order.iter().enumerate() {
        let record = &records[index];
        let label = match options.label {
            Some(label) => label(record),
            None => path.last().cloned().unwrap_or_default(),
        };
        cells.push(LayoutCell {
            rect: rects[slot].clone(),
            path: path.clone(),
            label,
            weight: (options.weight)(record),
            depth,
            aggregate: record.is_aggregate(),
        });
    }
}

/// Row-based squarified layout. Weights are expected in descending order for
/// good aspect ratios; output rects align with input order. Degenerate input
/// (zero total weight or zero-area bounds) yields no rects.
pub fn squarify(weights: &[f64], bounds: &LayoutRect) -> Vec<LayoutRect> {
    if weights.is_empty() || bounds.area() <= 0.0 {
        return Vec::new();
    }
    let total_weight: f64 = weights.iter().sum();
    if total_weight <= 0.0 {
        return Vec::new();
    }

    let total_area = bounds.area();
    let mut results = Vec::with_capacity(weights.len());
    let mut remaining = bounds.clone();

    let mut row: Vec<f64> = Vec::new();
    let mut row_area = 0.0;

    for &weight in weights {
        let item_area = (weight / total_weight) * total_area;

        if row.is_empty() {
            row.push(weight);
            row_area = item_area;
            continue;
        }

        let side = remaining.shorter_side();
        let worst_without = worst_aspect_ratio(&row, row_area, side);

        row.push(weight);
        let new_row_area = row_area + item_area;
        let worst_with = worst_aspect_ratio(&row, new_row_area, side);

        if worst_with <= worst_without {
            row_area = new_row_area;
        } else {
            row.pop();
            layout_row(&row, row_area, &mut remaining, &mut results);
            row.clear();
            row.push(weight);
            row_area = item_area;
        }
    }

    if !row.is_empty() {
        layout_row(&row, row_area, &mut remaining, &mut results);
    }

    results
}

fn worst_aspect_ratio(row: &[f64], row_area: f64, side: f64) -> f64 {
    if side <= 0.0 || row_area <= 0.0 {
        return f64::MAX;
    }

    let row_weight: f64 = row.iter().sum();
    if row_weight <= 0.0 {
        return f64::MAX;
    }

    let mut worst = 0.0_f64;
    for &weight in row {
        let item_area = (weight / row_weight) * row_area;
        if item_area <= 0.0 {
            continue;
        }
        let strip_thickness = row_area / side;
        let item_length = item_area / strip_thickness;
        let aspect = if strip_thickness > item_length {
            strip_thickness / item_length
        } else {
            item_length / strip_thickness
        };
        worst = worst.max(aspect);
    }
    worst
}

fn layout_row(row: &[f64], row_area: f64, remaining: &mut LayoutRect, results: &mut Vec<LayoutRect>) {
    if row.is_empty() || remaining.area() <= 0.0 {
        return;
    }

    let row_weight: f64 = row.iter().sum();
    if row_weight <= 0.0 {
        return;
    }

    let vertical = remaining.width >= remaining.height;

    if vertical {
        let strip_width = row_area / remaining.height;
        let mut y = remaining.y;

        for &weight in row {
            let item_height = (weight / row_weight) * remaining.height;
            results.push(LayoutRect::new(remaining.x, y, strip_width, item_height));
            y += item_height;
        }

        remaining.x += strip_width;
        remaining.width -= strip_width;
    } else {
        let strip_height = row_area / remaining.width;
        let mut x = remaining.x;

        for &weight in row {
            let item_width = (weight / row_weight) * remaining.width;
            results.push(LayoutRect::new(x, remaining.y, item_width, strip_height));
            x += item_width;
        }

        remaining.y += strip_height;
        remaining.height -= strip_height;
    }
}
