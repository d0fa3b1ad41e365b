//! Forest configuration builder.

use crate::error::ForestError;
use crate::result::ForestFit;

/// How many feature columns each split considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MaxFeatures {
    /// `ceil(sqrt(n_features))` — the usual classification default.
    Sqrt,
    /// A fixed column count.
    Fixed(usize),
    /// Every column, at every split.
    All,
}

/// Per-tree class weighting scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ClassWeight {
    /// Every row carries mass 1.
    Uniform,
    /// Rows are reweighted per tree so each class carries equal total mass
    /// within that tree's bootstrap sample: `n_boot / (n_classes * count_c)`.
    /// Rare classes stop being drowned out on skewed label distributions.
    BalancedSubsample,
}

/// Configuration for training a random forest.
///
/// Construct via [`ForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default               |
/// |---------------------|-----------------------|
/// | `max_depth`         | `None` (unlimited)    |
/// | `min_samples_split` | 2                     |
/// | `min_samples_leaf`  | 1                     |
/// | `max_features`      | `Sqrt`                |
/// | `class_weight`      | `Uniform`             |
/// | `seed`              | 42                    |
/// | `jobs`              | `None` (shared pool)  |
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) class_weight: ClassWeight,
    pub(crate) seed: u64,
    pub(crate) jobs: Option<usize>,
}

impl ForestConfig {
    /// Create a new config with `n_trees` trees and default parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::InvalidTreeCount`] when `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, ForestError> {
        if n_trees == 0 {
            return Err(ForestError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            class_weight: ClassWeight::Uniform,
            seed: 42,
            jobs: None,
        })
    }

    /// Set the maximum tree depth.
    ///
    /// `None` grows until leaves are pure or stopping conditions are met.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the minimum number of rows required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the minimum number of rows required in each leaf after a split.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Set how many columns each split considers.
    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the per-tree class weighting scheme.
    #[must_use]
    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    /// Set the random seed for reproducibility.
    ///
    /// Tree seeds derive from this master seed, so results do not depend on
    /// the worker count.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the worker-parallelism degree for this fit.
    ///
    /// `None` uses whatever rayon pool is current; `Some(k)` trains inside a
    /// dedicated pool of `k` workers.
    #[must_use]
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Number of trees to train.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Maximum tree depth, if limited.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Column budget per split.
    #[must_use]
    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    /// Class weighting scheme.
    #[must_use]
    pub fn class_weight(&self) -> ClassWeight {
        self.class_weight
    }

    /// Master random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Explicit worker count, if any.
    #[must_use]
    pub fn jobs(&self) -> Option<usize> {
        self.jobs
    }

    /// Train a forest on row-major features and dense class labels.
    ///
    /// Labels are class ids `0..n_classes`; the class count is inferred as
    /// `max(labels) + 1`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ForestError::EmptyDataset`] | `x` has no rows |
    /// | [`ForestError::ZeroFeatures`] | rows have no columns |
    /// | [`ForestError::RaggedRow`] | a row differs in width from the first |
    /// | [`ForestError::LabelCountMismatch`] | `x.len() != y.len()` |
    /// | [`ForestError::NonFiniteValue`] | a cell is NaN or infinite |
    /// | [`ForestError::InvalidMaxFeatures`] | the column budget resolves outside `[1, n_features]` |
    /// | [`ForestError::InvalidMaxDepth`] | `max_depth` is `Some(0)` |
    /// | [`ForestError::InvalidMinSamplesSplit`] | `min_samples_split < 2` |
    /// | [`ForestError::InvalidMinSamplesLeaf`] | `min_samples_leaf == 0` |
    /// | [`ForestError::InvalidJobCount`] | `jobs` is `Some(0)` |
    /// | [`ForestError::ThreadPool`] | the dedicated worker pool cannot be built |
    pub fn fit(&self, x: &[Vec<f64>], y: &[usize]) -> Result<ForestFit, ForestError> {
        crate::forest::train(self, x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::{ClassWeight, ForestConfig, MaxFeatures};

    #[test]
    fn zero_trees_rejected() {
        assert!(ForestConfig::new(0).is_err());
    }

    #[test]
    fn defaults() {
        let config = ForestConfig::new(10).unwrap();
        assert_eq!(config.n_trees(), 10);
        assert_eq!(config.max_depth(), None);
        assert_eq!(config.max_features(), MaxFeatures::Sqrt);
        assert_eq!(config.class_weight(), ClassWeight::Uniform);
        assert_eq!(config.jobs(), None);
        assert_eq!(config.seed(), 42);
    }

    #[test]
    fn builder_chains() {
        let config = ForestConfig::new(5)
            .unwrap()
            .with_max_depth(Some(3))
            .with_max_features(MaxFeatures::Fixed(2))
            .with_class_weight(ClassWeight::BalancedSubsample)
            .with_seed(7)
            .with_jobs(Some(2));
        assert_eq!(config.max_depth(), Some(3));
        assert_eq!(config.max_features(), MaxFeatures::Fixed(2));
        assert_eq!(config.class_weight(), ClassWeight::BalancedSubsample);
        assert_eq!(config.seed(), 7);
        assert_eq!(config.jobs(), Some(2));
    }
}
