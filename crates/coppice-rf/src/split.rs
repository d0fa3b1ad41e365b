//! Weighted best-split search for a single tree node.

use rand::Rng;

use crate::node::FeatureId;

/// Gini impurity of a node from its per-class sample masses.
///
/// `1 - Σ(p_c²)` with `p_c = mass_c / total`. Masses rather than counts so
/// that class weighting flows through every impurity computation. Returns
/// 0.0 for an empty node.
#[must_use]
pub(crate) fn gini(class_masses: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    let sum_sq: f64 = class_masses
        .iter()
        .map(|&m| {
            let p = m / total;
            p * p
        })
        .sum();
    1.0 - sum_sq
}

/// Result of finding the best split for a node.
#[derive(Debug, Clone)]
pub(crate) struct BestSplit {
    /// Feature used for the split.
    pub(crate) feature: FeatureId,
    /// Threshold value.
    pub(crate) threshold: f64,
    /// Weighted impurity decrease, the tree's contribution to MDI.
    pub(crate) decrease: f64,
    /// Rows going to the left child.
    pub(crate) left_rows: Vec<usize>,
    /// Rows going to the right child.
    pub(crate) right_rows: Vec<usize>,
}

/// Find the best split among a random subset of features.
///
/// For each of up to `max_features` randomly chosen columns, sorts the
/// node's `(value, row)` pairs, scans left-to-right with incremental class
/// mass updates, and keeps the candidate with the largest weighted impurity
/// decrease:
///
/// `mass_total · gini_parent - mass_left · gini_left - mass_right · gini_right`
///
/// The mass of a row is `class_weights[labels[row]]`, so uniform weights
/// reduce to the familiar count-based formula.
///
/// Returns `None` when no valid split exists (all values identical, or every
/// boundary would violate `min_samples_leaf`).
///
/// # Column-major layout
///
/// `columns` is column-major: `columns[feature][row]`. `rows` holds indices
/// into the inner Vecs and may contain duplicates (bootstrap draws).
#[allow(clippy::too_many_arguments)]
pub(crate) fn find_best_split(
    columns: &[Vec<f64>],
    labels: &[usize],
    class_weights: &[f64],
    rows: &[usize],
    n_classes: usize,
    max_features: usize,
    min_samples_leaf: usize,
    rng: &mut impl Rng,
) -> Option<BestSplit> {
    let n_features = columns.len();
    let n_rows = rows.len();

    if n_rows < 2 || n_features == 0 {
        return None;
    }

    // Parent class masses.
    let mut parent_masses = vec![0.0f64; n_classes];
    for &r in rows {
        parent_masses[labels[r]] += class_weights[labels[r]];
    }
    let parent_mass: f64 = parent_masses.iter().sum();
    let parent_impurity = gini(&parent_masses, parent_mass);

    // Partial Fisher-Yates: shuffle only the first `take` positions.
    let mut feature_order: Vec<usize> = (0..n_features).collect();
    let take = max_features.min(n_features);
    for i in 0..take {
        let j = rng.gen_range(i..n_features);
        feature_order.swap(i, j);
    }
    let selected = &feature_order[..take];

    let mut best_decrease = f64::NEG_INFINITY;
    let mut best: Option<(FeatureId, f64)> = None;

    for &feat_idx in selected {
        let col = &columns[feat_idx];

        let mut sorted: Vec<(f64, usize)> = rows.iter().map(|&r| (col[r], r)).collect();
        sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        // Incremental scan: left grows from empty, right shrinks from full.
        let mut left_masses = vec![0.0f64; n_classes];
        let mut right_masses = parent_masses.clone();
        let mut left_mass = 0.0f64;

        for i in 0..(n_rows - 1) {
            let (val_i, row_i) = sorted[i];
            let class_i = labels[row_i];
            let w = class_weights[class_i];

            // Move row i from right to left.
            left_masses[class_i] += w;
            right_masses[class_i] -= w;
            left_mass += w;

            // No valid boundary between identical values.
            let val_next = sorted[i + 1].0;
            if val_i == val_next {
                continue;
            }

            let n_left = i + 1;
            let n_right = n_rows - n_left;
            if n_left < min_samples_leaf || n_right < min_samples_leaf {
                continue;
            }

            let right_mass = parent_mass - left_mass;
            let decrease = parent_mass * parent_impurity
                - left_mass * gini(&left_masses, left_mass)
                - right_mass * gini(&right_masses, right_mass);

            if decrease > best_decrease {
                best_decrease = decrease;
                let threshold = (val_i + val_next) / 2.0;
                best = Some((FeatureId::new(feat_idx), threshold));
            }
        }
    }

    let (feature, threshold) = best?;

    // Partition rows into left/right.
    let col = &columns[feature.index()];
    let mut left_rows = Vec::with_capacity(n_rows / 2);
    let mut right_rows = Vec::with_capacity(n_rows / 2);
    for &r in rows {
        if col[r] <= threshold {
            left_rows.push(r);
        } else {
            right_rows.push(r);
        }
    }

    Some(BestSplit {
        feature,
        threshold,
        decrease: best_decrease,
        left_rows,
        right_rows,
    })
}
