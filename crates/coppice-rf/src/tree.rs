//! Single CART tree growth over a bootstrap sample.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::node::{Node, NodeId};
use crate::split::find_best_split;

/// Growth limits for one tree, resolved by the forest before training.
#[derive(Debug, Clone)]
pub(crate) struct TreeSettings {
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: usize,
    pub(crate) seed: u64,
}

/// A grown decision tree: a node arena rooted at index 0.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub(crate) struct Tree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
}

/// Pending work while growing the tree: the arena slot to fill, the rows
/// that reached it, and its depth.
struct WorkItem {
    slot: usize,
    rows: Vec<usize>,
    depth: usize,
}

/// Grow a tree on the given rows.
///
/// `columns` is the full column-major training matrix; `rows` are the
/// bootstrap draws for this tree (duplicates expected). Row mass is
/// `class_weights[labels[row]]`, which weights both leaf distributions and
/// split quality.
pub(crate) fn grow(
    settings: &TreeSettings,
    columns: &[Vec<f64>],
    labels: &[usize],
    class_weights: &[f64],
    rows: Vec<usize>,
    n_classes: usize,
) -> Tree {
    let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
    let mut nodes: Vec<Node> = Vec::new();

    nodes.push(placeholder());
    let mut stack = vec![WorkItem {
        slot: 0,
        rows,
        depth: 0,
    }];

    while let Some(WorkItem { slot, rows, depth }) = stack.pop() {
        let mut masses = vec![0.0f64; n_classes];
        for &r in &rows {
            masses[labels[r]] += class_weights[labels[r]];
        }
        let total: f64 = masses.iter().sum();
        let is_pure = masses.iter().filter(|&&m| m > 0.0).count() <= 1;

        let may_split = rows.len() >= settings.min_samples_split
            && !is_pure
            && settings.max_depth.is_none_or(|d| depth < d);

        let split = if may_split {
            find_best_split(
                columns,
                labels,
                class_weights,
                &rows,
                n_classes,
                settings.max_features,
                settings.min_samples_leaf,
                &mut rng,
            )
        } else {
            None
        };

        match split {
            Some(best) => {
                let left = NodeId::new(nodes.len());
                nodes.push(placeholder());
                let right = NodeId::new(nodes.len());
                nodes.push(placeholder());

                nodes[slot] = Node::Split {
                    feature: best.feature,
                    threshold: best.threshold,
                    left,
                    right,
                    decrease: best.decrease,
                    n_samples: rows.len(),
                };

                stack.push(WorkItem {
                    slot: left.index(),
                    rows: best.left_rows,
                    depth: depth + 1,
                });
                stack.push(WorkItem {
                    slot: right.index(),
                    rows: best.right_rows,
                    depth: depth + 1,
                });
            }
            None => {
                let distribution: Vec<f64> = if total > 0.0 {
                    masses.iter().map(|&m| m / total).collect()
                } else {
                    vec![0.0; n_classes]
                };
                let prediction = argmax(&distribution);
                nodes[slot] = Node::Leaf {
                    prediction,
                    distribution,
                    n_samples: rows.len(),
                };
            }
        }
    }

    Tree {
        nodes,
        n_features: columns.len(),
    }
}

fn placeholder() -> Node {
    Node::Leaf {
        prediction: 0,
        distribution: Vec::new(),
        n_samples: 0,
    }
}

/// Index of the largest value; ties go to the lower class id.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0usize;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

impl Tree {
    /// Walk from the root to the leaf this row falls into.
    ///
    /// The caller guarantees `row.len() == n_features`.
    pub(crate) fn leaf_for(&self, row: &[f64]) -> &Node {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                leaf @ Node::Leaf { .. } => return leaf,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if row[feature.index()] <= *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }

    /// Accumulate this tree's normalized impurity decreases into `totals`.
    ///
    /// Per-tree normalization: each tree contributes a vector summing to 1,
    /// or nothing at all when it never split.
    pub(crate) fn accumulate_importances(&self, totals: &mut [f64]) {
        let mut own = vec![0.0f64; self.n_features];
        for node in &self.nodes {
            if let Node::Split {
                feature, decrease, ..
            } = node
            {
                own[feature.index()] += decrease;
            }
        }
        let sum: f64 = own.iter().sum();
        if sum > 0.0 {
            for (t, o) in totals.iter_mut().zip(&own) {
                *t += o / sum;
            }
        }
    }

    /// Number of nodes in the arena.
    #[cfg(test)]
    pub(crate) fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaf nodes.
    #[cfg(test)]
    pub(crate) fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Maximum depth; a lone root leaf has depth 0.
    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        let mut max_depth = 0usize;
        let mut queue = std::collections::VecDeque::new();
        queue.push_back((0usize, 0usize));
        while let Some((idx, d)) = queue.pop_front() {
            match &self.nodes[idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    queue.push_back((left.index(), d + 1));
                    queue.push_back((right.index(), d + 1));
                }
            }
        }
        max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::{Tree, TreeSettings, grow};
    use crate::node::Node;

    fn settings(seed: u64) -> TreeSettings {
        TreeSettings {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: 2,
            seed,
        }
    }

    /// Column-major transpose of a small row-major fixture.
    fn columns_of(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        let width = rows[0].len();
        (0..width)
            .map(|c| rows.iter().map(|r| r[c]).collect())
            .collect()
    }

    fn predict(tree: &Tree, row: &[f64]) -> usize {
        match tree.leaf_for(row) {
            Node::Leaf { prediction, .. } => *prediction,
            Node::Split { .. } => unreachable!("leaf_for always returns a leaf"),
        }
    }

    #[test]
    fn pure_rows_make_single_leaf() {
        let columns = columns_of(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]);
        let tree = grow(&settings(42), &columns, &[0, 0, 0], &[1.0], vec![0, 1, 2], 1);
        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(predict(&tree, &[2.0, 3.0]), 0);
    }

    #[test]
    fn linearly_separable_correct_split() {
        let rows: Vec<Vec<f64>> = [1.0, 2.0, 3.0, 10.0, 11.0, 12.0]
            .iter()
            .map(|&v| vec![v, 0.0])
            .collect();
        let columns = columns_of(&rows);
        let labels = vec![0, 0, 0, 1, 1, 1];
        let tree = grow(
            &settings(42),
            &columns,
            &labels,
            &[1.0, 1.0],
            (0..6).collect(),
            2,
        );
        assert_eq!(predict(&tree, &[2.0, 0.0]), 0);
        assert_eq!(predict(&tree, &[11.0, 0.0]), 1);
    }

    #[test]
    fn xor_needs_depth_at_least_2() {
        let rows = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ];
        let columns = columns_of(&rows);
        let labels = vec![0, 1, 1, 0];
        let tree = grow(
            &settings(42),
            &columns,
            &labels,
            &[1.0, 1.0],
            (0..4).collect(),
            2,
        );
        assert!(tree.depth() >= 2);
        for (row, &label) in rows.iter().zip(&labels) {
            assert_eq!(predict(&tree, row), label);
        }
    }

    #[test]
    fn max_depth_limits_tree() {
        let rows = vec![
            vec![0.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ];
        let columns = columns_of(&rows);
        let labels = vec![0, 1, 1, 0];
        let mut s = settings(42);
        s.max_depth = Some(1);
        let tree = grow(&settings(42), &columns, &labels, &[1.0, 1.0], (0..4).collect(), 2);
        let shallow = grow(&s, &columns, &labels, &[1.0, 1.0], (0..4).collect(), 2);
        assert!(shallow.depth() <= 1);
        assert!(tree.depth() >= shallow.depth());
    }

    #[test]
    fn leaf_distribution_sums_to_one() {
        let rows: Vec<Vec<f64>> = [1.0, 2.0, 3.0, 10.0, 11.0, 12.0]
            .iter()
            .map(|&v| vec![v])
            .collect();
        let columns = columns_of(&rows);
        let labels = vec![0, 0, 0, 1, 1, 1];
        let tree = grow(
            &settings(42),
            &columns,
            &labels,
            &[1.0, 1.0],
            (0..6).collect(),
            2,
        );
        match tree.leaf_for(&[5.0]) {
            Node::Leaf { distribution, .. } => {
                let sum: f64 = distribution.iter().sum();
                assert!((sum - 1.0).abs() < 1e-10);
            }
            Node::Split { .. } => unreachable!(),
        }
    }

    #[test]
    fn importances_normalized_per_tree() {
        let rows = vec![
            vec![1.0, 100.0],
            vec![2.0, 200.0],
            vec![3.0, 300.0],
            vec![10.0, 100.0],
            vec![11.0, 200.0],
            vec![12.0, 300.0],
        ];
        let columns = columns_of(&rows);
        let labels = vec![0, 0, 0, 1, 1, 1];
        let tree = grow(
            &settings(42),
            &columns,
            &labels,
            &[1.0, 1.0],
            (0..6).collect(),
            2,
        );
        let mut totals = vec![0.0; 2];
        tree.accumulate_importances(&mut totals);
        let sum: f64 = totals.iter().sum();
        assert!((sum - 1.0).abs() < 1e-10, "sum = {sum}");
    }

    #[test]
    fn balanced_weights_flip_minority_leaf() {
        // Nine class-0 rows and one class-1 row share a single leaf
        // (constant column, no split possible). Unweighted, the leaf
        // predicts 0; with balanced-style weights the lone class-1 row
        // carries mass 9 and wins.
        let columns = vec![vec![1.0; 10]];
        let mut labels = vec![0usize; 10];
        labels[9] = 1;
        let rows: Vec<usize> = (0..10).collect();

        let plain = grow(&settings(1), &columns, &labels, &[1.0, 1.0], rows.clone(), 2);
        assert_eq!(predict(&plain, &[1.0]), 0);

        let weighted = grow(&settings(1), &columns, &labels, &[1.0, 18.0], rows, 2);
        assert_eq!(predict(&weighted, &[1.0]), 1);
    }

    #[test]
    fn deterministic_with_same_seed() {
        let rows = vec![
            vec![1.0, 5.0],
            vec![2.0, 6.0],
            vec![3.0, 7.0],
            vec![10.0, 15.0],
            vec![11.0, 16.0],
            vec![12.0, 17.0],
        ];
        let columns = columns_of(&rows);
        let labels = vec![0, 0, 0, 1, 1, 1];
        let mut s = settings(123);
        s.max_features = 1;
        let t1 = grow(&s, &columns, &labels, &[1.0, 1.0], (0..6).collect(), 2);
        let t2 = grow(&s, &columns, &labels, &[1.0, 1.0], (0..6).collect(), 2);
        for row in &rows {
            assert_eq!(predict(&t1, row), predict(&t2, row));
        }
    }
}
