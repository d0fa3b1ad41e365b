//! Stepwise sweep over feature-count budgets.
//!
//! For each candidate count the sweep selects that many top columns from a
//! precomputed importance vector, trains a fresh forest on the restricted
//! training matrix, and scores it on the held-out split. Every point in the
//! range is visited; there is no early stopping, so the report always shows
//! the full accuracy curve.

use coppice_rf::{ClassWeight, ForestConfig};
use tracing::{info, instrument, warn};

use crate::error::TrimError;
use crate::pipeline::fraction_correct;
use crate::select::FeatureSet;

/// Configuration for [`tune`].
///
/// # Defaults
///
/// | Parameter      | Default              |
/// |----------------|----------------------|
/// | `min_features` | 1                    |
/// | `max_features` | 200                  |
/// | `jobs`         | `None` (shared pool) |
/// | `seed`         | 42                   |
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TuneConfig {
    n_trees: usize,
    min_features: usize,
    max_features: usize,
    jobs: Option<usize>,
    seed: u64,
}

impl TuneConfig {
    /// Create a new config with `n_trees` trees per sweep point.
    ///
    /// # Errors
    ///
    /// Returns [`TrimError::InvalidTreeCount`] when `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, TrimError> {
        if n_trees == 0 {
            return Err(TrimError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            min_features: 1,
            max_features: 200,
            jobs: None,
            seed: 42,
        })
    }

    /// Set the inclusive sweep range. Validated when [`tune`] runs.
    #[must_use]
    pub fn with_range(mut self, min_features: usize, max_features: usize) -> Self {
        self.min_features = min_features;
        self.max_features = max_features;
        self
    }

    /// Set the worker-parallelism degree for every sweep fit.
    #[must_use]
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Set the base seed. Each sweep point derives its own stream from it.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Trees per sweep point.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Inclusive lower bound of the sweep.
    #[must_use]
    pub fn min_features(&self) -> usize {
        self.min_features
    }

    /// Inclusive upper bound of the sweep.
    #[must_use]
    pub fn max_features(&self) -> usize {
        self.max_features
    }

    /// Explicit worker count, if any.
    #[must_use]
    pub fn jobs(&self) -> Option<usize> {
        self.jobs
    }

    /// Base randomness seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// One sweep point: a feature budget and the accuracy it achieved.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TunePoint {
    /// Requested feature count for this point.
    pub n_features: usize,
    /// Held-out accuracy of the forest trained on that many columns.
    pub accuracy: f64,
}

/// Full accuracy curve from one sweep.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TuningReport {
    points: Vec<TunePoint>,
}

impl TuningReport {
    /// Every sweep point, in ascending feature-count order.
    #[must_use]
    pub fn points(&self) -> &[TunePoint] {
        &self.points
    }

    /// The best point: highest accuracy, ties resolved toward fewer
    /// features. `None` only for an empty report.
    #[must_use]
    pub fn best(&self) -> Option<&TunePoint> {
        let mut best: Option<&TunePoint> = None;
        for point in &self.points {
            match best {
                Some(current) if point.accuracy <= current.accuracy => {}
                _ => best = Some(point),
            }
        }
        best
    }

    /// Number of sweep points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// `true` when the sweep produced no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl std::fmt::Display for TuningReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:>10}  {:>10}", "features", "accuracy")?;
        for point in &self.points {
            writeln!(f, "{:>10}  {:>10.4}", point.n_features, point.accuracy)?;
        }
        Ok(())
    }
}

/// Sweep feature budgets from `min_features` to `max_features` inclusive.
///
/// `importances` is a full-width importance vector, usually taken from a
/// fitted [`TrimmedForest`](crate::TrimmedForest) via
/// [`importances`](crate::TrimmedForest::importances). Budgets beyond its
/// length are not an error; the selection just keeps every column, so the
/// tail of the curve flattens.
///
/// Each point trains from scratch with its own derived seed. Points are
/// reported for every requested budget, even where the accuracy curve has
/// clearly plateaued.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`TrimError::InvalidFeatureBounds`] | `min_features` is zero or exceeds `max_features` |
/// | [`TrimError::DimensionMismatch`] | rows and labels disagree in either split |
/// | [`TrimError::InsufficientColumns`] | rows narrower than a selection needs |
/// | [`TrimError::Forest`] | training-internal failure, unchanged |
#[instrument(skip_all, fields(min = config.min_features, max = config.max_features))]
pub fn tune(
    config: &TuneConfig,
    importances: &[f64],
    train_x: &[Vec<f64>],
    train_y: &[usize],
    test_x: &[Vec<f64>],
    test_y: &[usize],
) -> Result<TuningReport, TrimError> {
    if config.min_features == 0 || config.min_features > config.max_features {
        return Err(TrimError::InvalidFeatureBounds {
            min_features: config.min_features,
            max_features: config.max_features,
        });
    }
    if train_x.len() != train_y.len() {
        return Err(TrimError::DimensionMismatch {
            rows: train_x.len(),
            labels: train_y.len(),
        });
    }
    if test_x.len() != test_y.len() {
        return Err(TrimError::DimensionMismatch {
            rows: test_x.len(),
            labels: test_y.len(),
        });
    }

    let mut points = Vec::with_capacity(config.max_features - config.min_features + 1);
    let mut warned_cap = false;
    for budget in config.min_features..=config.max_features {
        if budget > importances.len() && !warned_cap {
            warn!(
                budget,
                width = importances.len(),
                "budget exceeds column count, curve flattens from here"
            );
            warned_cap = true;
        }
        let features = FeatureSet::top_k(importances, budget);
        let trimmed_train = features.restrict(train_x)?;
        let trimmed_test = features.restrict(test_x)?;

        let seed = config.seed.wrapping_add(budget as u64);
        let fit = ForestConfig::new(config.n_trees)?
            .with_class_weight(ClassWeight::BalancedSubsample)
            .with_seed(seed)
            .with_jobs(config.jobs)
            .fit(&trimmed_train, train_y)?;

        let predictions = fit.forest().predict_batch(&trimmed_test)?;
        let accuracy = fraction_correct(&predictions, test_y);
        info!(budget, accuracy, "sweep point done");
        points.push(TunePoint {
            n_features: budget,
            accuracy,
        });
    }

    Ok(TuningReport { points })
}
