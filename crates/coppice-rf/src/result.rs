//! Training result types.

use crate::forest::Forest;

/// Metadata about a training run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TrainMetadata {
    /// Number of trees trained.
    pub n_trees: usize,
    /// Number of feature columns in the dataset.
    pub n_features: usize,
    /// Number of distinct classes.
    pub n_classes: usize,
    /// Number of training rows.
    pub n_samples: usize,
    /// Resolved max_features value used at each split.
    pub max_features_resolved: usize,
}

/// Result of forest training: the fitted ensemble plus its importances.
///
/// `importances` is column-aligned with the training matrix: entry `i` is
/// the mean decrease in impurity attributed to column `i`, non-negative,
/// summing to 1.0 unless no tree ever split (then all zeros).
#[derive(Debug)]
pub struct ForestFit {
    forest: Forest,
    importances: Vec<f64>,
    metadata: TrainMetadata,
}

impl ForestFit {
    pub(crate) fn new(forest: Forest, importances: Vec<f64>, metadata: TrainMetadata) -> Self {
        Self {
            forest,
            importances,
            metadata,
        }
    }

    /// Borrow the fitted forest.
    #[must_use]
    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    /// Consume the result and return the fitted forest.
    #[must_use]
    pub fn into_forest(self) -> Forest {
        self.forest
    }

    /// Column-aligned mean-decrease-in-impurity scores.
    #[must_use]
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    /// Training metadata.
    #[must_use]
    pub fn metadata(&self) -> &TrainMetadata {
        &self.metadata
    }

    /// Consume the result and return the forest together with its
    /// importance vector.
    #[must_use]
    pub fn into_parts(self) -> (Forest, Vec<f64>) {
        (self.forest, self.importances)
    }
}
