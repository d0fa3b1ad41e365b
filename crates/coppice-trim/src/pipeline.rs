//! Importance-trimmed forest pipeline.
//!
//! The pipeline trains a full-width forest, reads its importance vector,
//! keeps the top-k columns, and retrains a fresh forest on the restricted
//! matrix. Everything downstream (scoring, prediction, reporting) routes
//! through the stored [`FeatureSet`], so callers keep handing in full-width
//! matrices and never re-project anything themselves.

use coppice_rf::{ClassWeight, Forest, ForestConfig};
use tracing::{info, instrument, warn};

use crate::error::TrimError;
use crate::report::FeatureRanking;
use crate::select::FeatureSet;

/// Configuration for [`TrimmedForest`].
///
/// Construct via [`TrimConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter | Default              |
/// |-----------|----------------------|
/// | `top`     | 100                  |
/// | `prune`   | `true`               |
/// | `jobs`    | `None` (shared pool) |
/// | `seed`    | 42                   |
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TrimConfig {
    n_trees: usize,
    top: usize,
    prune: bool,
    jobs: Option<usize>,
    seed: u64,
}

impl TrimConfig {
    /// Create a new config with `n_trees` trees per forest.
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
            top: 100,
            prune: true,
            jobs: None,
            seed: 42,
        })
    }

    /// Set how many columns to keep after the full fit.
    ///
    /// Validated when `fit` runs: zero is rejected there, while a value
    /// beyond the actual column count degrades to keeping every column.
    #[must_use]
    pub fn with_top(mut self, top: usize) -> Self {
        self.top = top;
        self
    }

    /// Enable or disable pruning. With `false`, the fitted model keeps the
    /// full feature range and no retrain happens.
    #[must_use]
    pub fn with_prune(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }

    /// Set the worker-parallelism degree for both forest fits.
    #[must_use]
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Set the training randomness seed. The full fit uses it as-is; the
    /// retrain derives its own stream from it.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Trees per forest.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Columns to keep.
    #[must_use]
    pub fn top(&self) -> usize {
        self.top
    }

    /// Whether pruning is enabled.
    #[must_use]
    pub fn prune(&self) -> bool {
        self.prune
    }

    /// Explicit worker count, if any.
    #[must_use]
    pub fn jobs(&self) -> Option<usize> {
        self.jobs
    }

    /// Training randomness seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Forest config shared by both fits, seeded per phase.
    fn forest_config(&self, seed: u64) -> Result<ForestConfig, TrimError> {
        Ok(ForestConfig::new(self.n_trees)?
            .with_class_weight(ClassWeight::BalancedSubsample)
            .with_seed(seed)
            .with_jobs(self.jobs))
    }
}

/// Everything a successful fit leaves behind.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct FittedModel {
    /// The forest in use: retrained on the kept columns when pruning,
    /// otherwise the full-width model.
    forest: Forest,
    /// Kept column indices, in selection order.
    features: FeatureSet,
    /// Full-width importance vector from the initial fit. The retrain
    /// never overwrites it.
    importances: Vec<f64>,
    /// Column-aligned names captured at fit time for reporting.
    feature_names: Vec<String>,
}

/// Fit state: explicit, so an unfitted model cannot be mistaken for a
/// fitted one holding empty data.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
enum ModelState {
    Unfitted,
    Fitted(Box<FittedModel>),
}

/// Summary of one fit, for logs and CLI echoes.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FitReport {
    /// Training rows.
    pub n_rows: usize,
    /// Full feature-universe width.
    pub n_features: usize,
    /// Columns kept after selection.
    pub n_kept: usize,
    /// Distinct classes.
    pub n_classes: usize,
    /// Whether a trimmed retrain happened.
    pub pruned: bool,
}

/// A forest classifier that trims its own feature space.
///
/// `fit` runs the full-train / select / retrain procedure; `score`,
/// `predict`, and `predict_proba` accept full-width matrices and project
/// them through the stored selection. Serializable as a whole, so a fitted
/// pipeline can be persisted and reloaded.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TrimmedForest {
    config: TrimConfig,
    state: ModelState,
}

impl TrimmedForest {
    /// Create an unfitted pipeline.
    #[must_use]
    pub fn new(config: TrimConfig) -> Self {
        Self {
            config,
            state: ModelState::Unfitted,
        }
    }

    /// The configuration this pipeline was built with.
    #[must_use]
    pub fn config(&self) -> &TrimConfig {
        &self.config
    }

    /// `true` once a fit has succeeded.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        matches!(self.state, ModelState::Fitted(_))
    }

    /// Train on all columns, select the most important, retrain trimmed.
    ///
    /// `feature_names` must be column-aligned with `x`; they are captured
    /// for [`ranking`](Self::ranking) so reporting never needs another
    /// pass over the data. A failed fit leaves any previous fitted state
    /// untouched. Refitting replaces the state wholesale.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TrimError::InvalidFeatureCount`] | configured `top` is zero |
    /// | [`TrimError::DimensionMismatch`] | `x.len() != y.len()` |
    /// | [`TrimError::NameCountMismatch`] | names not aligned with columns |
    /// | [`TrimError::Forest`] | training-internal failure, unchanged |
    #[instrument(skip_all, fields(rows = x.len(), top = self.config.top, prune = self.config.prune))]
    pub fn fit(
        &mut self,
        x: &[Vec<f64>],
        y: &[usize],
        feature_names: &[String],
    ) -> Result<FitReport, TrimError> {
        if self.config.top == 0 {
            return Err(TrimError::InvalidFeatureCount { requested: 0 });
        }
        if x.len() != y.len() {
            return Err(TrimError::DimensionMismatch {
                rows: x.len(),
                labels: y.len(),
            });
        }
        let width = x.first().map_or(0, Vec::len);
        if feature_names.len() != width {
            return Err(TrimError::NameCountMismatch {
                names: feature_names.len(),
                columns: width,
            });
        }

        info!(width, "fitting full forest");
        let full = self.config.forest_config(self.config.seed)?.fit(x, y)?;
        let (full_forest, importances) = full.into_parts();

        let (forest, features) = if self.config.prune {
            if self.config.top > width {
                warn!(
                    top = self.config.top,
                    width, "top exceeds column count, keeping all columns"
                );
            }
            let features = FeatureSet::top_k(&importances, self.config.top);
            let trimmed_x = features.restrict(x)?;

            info!(kept = features.len(), "retraining on kept columns");
            let retrain_seed = self.config.seed.wrapping_add(1);
            let trimmed = self
                .config
                .forest_config(retrain_seed)?
                .fit(&trimmed_x, y)?;
            (trimmed.into_forest(), features)
        } else {
            (full_forest, FeatureSet::identity(width))
        };

        let report = FitReport {
            n_rows: x.len(),
            n_features: width,
            n_kept: features.len(),
            n_classes: forest.n_classes(),
            pruned: self.config.prune,
        };

        self.state = ModelState::Fitted(Box::new(FittedModel {
            forest,
            features,
            importances,
            feature_names: feature_names.to_vec(),
        }));

        info!(kept = report.n_kept, "fit complete");
        Ok(report)
    }

    /// Mean accuracy on `x` against `y`.
    ///
    /// Exactly the fraction of rows where [`predict`](Self::predict)
    /// agrees with `y`. Scoring zero rows yields 0.0.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TrimError::NotFitted`] | called before a successful fit |
    /// | [`TrimError::DimensionMismatch`] | `x.len() != y.len()` |
    /// | [`TrimError::InsufficientColumns`] | rows narrower than the selection needs |
    pub fn score(&self, x: &[Vec<f64>], y: &[usize]) -> Result<f64, TrimError> {
        let fitted = self.fitted()?;
        if x.len() != y.len() {
            return Err(TrimError::DimensionMismatch {
                rows: x.len(),
                labels: y.len(),
            });
        }
        let projected = fitted.features.restrict(x)?;
        let predictions = fitted.forest.predict_batch(&projected)?;
        Ok(fraction_correct(&predictions, y))
    }

    /// Predict a class label per row.
    ///
    /// The label slice is accepted but never read; predictions depend only
    /// on `x`. It stays in the signature so train and evaluation call
    /// sites can hand the same `(x, y)` pair to every method.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TrimError::NotFitted`] | called before a successful fit |
    /// | [`TrimError::InsufficientColumns`] | rows narrower than the selection needs |
    pub fn predict(&self, x: &[Vec<f64>], _y: &[usize]) -> Result<Vec<usize>, TrimError> {
        let fitted = self.fitted()?;
        let projected = fitted.features.restrict(x)?;
        Ok(fitted.forest.predict_batch(&projected)?)
    }

    /// Per-row class probability distributions.
    ///
    /// As with [`predict`](Self::predict), the label slice is dead input:
    /// accepted, never read.
    ///
    /// # Errors
    ///
    /// Same as [`predict`](Self::predict).
    pub fn predict_proba(&self, x: &[Vec<f64>], _y: &[usize]) -> Result<Vec<Vec<f64>>, TrimError> {
        let fitted = self.fitted()?;
        let projected = fitted.features.restrict(x)?;
        Ok(fitted.forest.predict_proba_batch(&projected)?)
    }

    /// Kept column indices, in selection order.
    ///
    /// # Errors
    ///
    /// Returns [`TrimError::NotFitted`] before a successful fit.
    pub fn features(&self) -> Result<&FeatureSet, TrimError> {
        Ok(&self.fitted()?.features)
    }

    /// Full-width importance vector from the initial fit.
    ///
    /// # Errors
    ///
    /// Returns [`TrimError::NotFitted`] before a successful fit.
    pub fn importances(&self) -> Result<&[f64], TrimError> {
        Ok(&self.fitted()?.importances)
    }

    /// Column-aligned feature names captured at fit time.
    ///
    /// # Errors
    ///
    /// Returns [`TrimError::NotFitted`] before a successful fit.
    pub fn feature_names(&self) -> Result<&[String], TrimError> {
        Ok(&self.fitted()?.feature_names)
    }

    /// Rank the full feature universe by importance.
    ///
    /// # Errors
    ///
    /// Returns [`TrimError::NotFitted`] before a successful fit.
    pub fn ranking(&self) -> Result<FeatureRanking, TrimError> {
        let fitted = self.fitted()?;
        Ok(FeatureRanking::new(
            &fitted.feature_names,
            &fitted.importances,
        ))
    }

    /// Number of classes the fitted forest distinguishes.
    ///
    /// # Errors
    ///
    /// Returns [`TrimError::NotFitted`] before a successful fit.
    pub fn n_classes(&self) -> Result<usize, TrimError> {
        Ok(self.fitted()?.forest.n_classes())
    }

    fn fitted(&self) -> Result<&FittedModel, TrimError> {
        match &self.state {
            ModelState::Fitted(fitted) => Ok(fitted),
            ModelState::Unfitted => Err(TrimError::NotFitted),
        }
    }
}

/// Fraction of predictions matching labels; 0.0 for zero rows.
pub(crate) fn fraction_correct(predictions: &[usize], labels: &[usize]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let correct = predictions
        .iter()
        .zip(labels)
        .filter(|&(&p, &l)| p == l)
        .count();
    correct as f64 / labels.len() as f64
}

#[cfg(test)]
mod tests {
    use super::{TrimConfig, TrimmedForest, fraction_correct};
    use crate::error::TrimError;

    /// Two informative columns (0 and 3) among six; the rest are constant.
    fn fixture() -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..30 {
            let class = i % 2;
            let v = if class == 0 { 0.0 } else { 10.0 };
            x.push(vec![
                v + i as f64 * 0.01,
                1.0,
                2.0,
                -v + i as f64 * 0.01,
                3.0,
                4.0,
            ]);
            y.push(class);
        }
        let names = (0..6).map(|c| format!("f{c}")).collect();
        (x, y, names)
    }

    #[test]
    fn fit_keeps_requested_count() {
        let (x, y, names) = fixture();
        let mut model = TrimmedForest::new(TrimConfig::new(20).unwrap().with_top(2).with_seed(9));
        let report = model.fit(&x, &y, &names).unwrap();
        assert_eq!(report.n_kept, 2);
        assert_eq!(report.n_features, 6);
        assert!(report.pruned);
        assert_eq!(model.features().unwrap().len(), 2);
    }

    #[test]
    fn selection_finds_informative_columns() {
        let (x, y, names) = fixture();
        let mut model = TrimmedForest::new(TrimConfig::new(30).unwrap().with_top(2).with_seed(9));
        model.fit(&x, &y, &names).unwrap();
        let mut kept: Vec<usize> = model.features().unwrap().indices().to_vec();
        kept.sort_unstable();
        assert_eq!(kept, vec![0, 3]);
    }

    #[test]
    fn trimmed_model_still_scores_well() {
        let (x, y, names) = fixture();
        let mut model = TrimmedForest::new(TrimConfig::new(30).unwrap().with_top(2).with_seed(9));
        model.fit(&x, &y, &names).unwrap();
        let acc = model.score(&x, &y).unwrap();
        assert!(acc > 0.9, "accuracy = {acc}");
    }

    #[test]
    fn no_prune_keeps_identity_and_importances() {
        let (x, y, names) = fixture();
        let mut pruned = TrimmedForest::new(TrimConfig::new(20).unwrap().with_top(2).with_seed(9));
        pruned.fit(&x, &y, &names).unwrap();

        let mut plain = TrimmedForest::new(
            TrimConfig::new(20)
                .unwrap()
                .with_top(2)
                .with_prune(false)
                .with_seed(9),
        );
        let report = plain.fit(&x, &y, &names).unwrap();

        assert!(!report.pruned);
        assert_eq!(report.n_kept, 6);
        assert_eq!(plain.features().unwrap().indices(), &[0, 1, 2, 3, 4, 5]);
        // Same seed, same full fit: the retained importances agree and are
        // unaffected by the pruned run's retrain.
        assert_eq!(plain.importances().unwrap(), pruned.importances().unwrap());
    }

    #[test]
    fn score_agrees_with_predict() {
        let (x, y, names) = fixture();
        let mut model = TrimmedForest::new(TrimConfig::new(20).unwrap().with_top(3).with_seed(4));
        model.fit(&x, &y, &names).unwrap();

        let predictions = model.predict(&x, &y).unwrap();
        let expected = fraction_correct(&predictions, &y);
        let score = model.score(&x, &y).unwrap();
        assert!((score - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn proba_rows_sum_to_one() {
        let (x, y, names) = fixture();
        let mut model = TrimmedForest::new(TrimConfig::new(20).unwrap().with_top(2).with_seed(4));
        model.fit(&x, &y, &names).unwrap();
        let probas = model.predict_proba(&x, &y).unwrap();
        assert_eq!(probas.len(), x.len());
        for row in &probas {
            assert_eq!(row.len(), 2);
            let sum: f64 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn unfitted_everything_errors() {
        let (x, y, _) = fixture();
        let model = TrimmedForest::new(TrimConfig::new(10).unwrap());
        assert!(!model.is_fitted());
        assert!(matches!(model.score(&x, &y), Err(TrimError::NotFitted)));
        assert!(matches!(model.predict(&x, &y), Err(TrimError::NotFitted)));
        assert!(matches!(
            model.predict_proba(&x, &y),
            Err(TrimError::NotFitted)
        ));
        assert!(matches!(model.features(), Err(TrimError::NotFitted)));
        assert!(matches!(model.importances(), Err(TrimError::NotFitted)));
        assert!(matches!(model.ranking(), Err(TrimError::NotFitted)));
    }

    #[test]
    fn zero_top_rejected_eagerly() {
        let (x, y, names) = fixture();
        let mut model = TrimmedForest::new(TrimConfig::new(10).unwrap().with_top(0));
        let err = model.fit(&x, &y, &names).unwrap_err();
        assert!(matches!(
            err,
            TrimError::InvalidFeatureCount { requested: 0 }
        ));
        assert!(!model.is_fitted());
    }

    #[test]
    fn row_label_mismatch_rejected() {
        let (x, _, names) = fixture();
        let mut model = TrimmedForest::new(TrimConfig::new(10).unwrap());
        let err = model.fit(&x, &[0, 1], &names).unwrap_err();
        assert!(matches!(err, TrimError::DimensionMismatch { rows: 30, labels: 2 }));
    }

    #[test]
    fn name_mismatch_rejected() {
        let (x, y, _) = fixture();
        let mut model = TrimmedForest::new(TrimConfig::new(10).unwrap());
        let err = model.fit(&x, &y, &["only".to_string()]).unwrap_err();
        assert!(matches!(
            err,
            TrimError::NameCountMismatch { names: 1, columns: 6 }
        ));
    }

    #[test]
    fn failed_fit_preserves_previous_state() {
        let (x, y, names) = fixture();
        let mut model = TrimmedForest::new(TrimConfig::new(15).unwrap().with_top(2).with_seed(1));
        model.fit(&x, &y, &names).unwrap();
        let kept_before = model.features().unwrap().indices().to_vec();

        // Mismatched labels must fail without touching the fitted state.
        let err = model.fit(&x, &[0], &names).unwrap_err();
        assert!(matches!(err, TrimError::DimensionMismatch { .. }));
        assert!(model.is_fitted());
        assert_eq!(model.features().unwrap().indices(), kept_before.as_slice());
    }

    #[test]
    fn oversized_top_keeps_every_column() {
        let (x, y, names) = fixture();
        let mut model = TrimmedForest::new(TrimConfig::new(15).unwrap().with_top(1000));
        let report = model.fit(&x, &y, &names).unwrap();
        assert_eq!(report.n_kept, 6);
        let mut kept: Vec<usize> = model.features().unwrap().indices().to_vec();
        kept.sort_unstable();
        assert_eq!(kept, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn refit_replaces_state() {
        let (x, y, names) = fixture();
        let mut model = TrimmedForest::new(TrimConfig::new(15).unwrap().with_top(2).with_seed(1));
        model.fit(&x, &y, &names).unwrap();
        assert_eq!(model.features().unwrap().len(), 2);

        // Narrower data on a refit: the selection must now cover exactly
        // the new universe.
        let narrow_x: Vec<Vec<f64>> = x.iter().map(|r| r[..2].to_vec()).collect();
        let narrow_names: Vec<String> = names[..2].to_vec();
        model.fit(&narrow_x, &y, &narrow_names).unwrap();
        assert_eq!(model.importances().unwrap().len(), 2);
        assert!(model.features().unwrap().required_width() <= 2);
    }

    #[test]
    fn wider_inference_rows_are_accepted() {
        let (x, y, names) = fixture();
        let mut model = TrimmedForest::new(TrimConfig::new(15).unwrap().with_top(2).with_seed(1));
        model.fit(&x, &y, &names).unwrap();

        let wide: Vec<Vec<f64>> = x
            .iter()
            .map(|r| {
                let mut row = r.clone();
                row.push(99.0);
                row
            })
            .collect();
        let narrow_score = model.score(&x, &y).unwrap();
        let wide_score = model.score(&wide, &y).unwrap();
        assert!((narrow_score - wide_score).abs() < f64::EPSILON);
    }

    #[test]
    fn too_narrow_inference_rows_rejected() {
        let (x, y, names) = fixture();
        let mut model = TrimmedForest::new(TrimConfig::new(15).unwrap().with_seed(1));
        model.fit(&x, &y, &names).unwrap();

        let narrow: Vec<Vec<f64>> = x.iter().map(|r| r[..1].to_vec()).collect();
        let err = model.score(&narrow, &y).unwrap_err();
        assert!(matches!(err, TrimError::InsufficientColumns { .. }));
    }

    #[test]
    fn same_seed_reproduces_selection() {
        let (x, y, names) = fixture();
        let config = TrimConfig::new(20).unwrap().with_top(2).with_seed(77);
        let mut a = TrimmedForest::new(config.clone());
        let mut b = TrimmedForest::new(config);
        a.fit(&x, &y, &names).unwrap();
        b.fit(&x, &y, &names).unwrap();
        assert_eq!(
            a.features().unwrap().indices(),
            b.features().unwrap().indices()
        );
        assert_eq!(a.importances().unwrap(), b.importances().unwrap());
    }

    #[test]
    fn fraction_correct_empty_is_zero() {
        assert_eq!(fraction_correct(&[], &[]), 0.0);
    }
}
