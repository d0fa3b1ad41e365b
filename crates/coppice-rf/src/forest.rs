//! Forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::{ClassWeight, ForestConfig, MaxFeatures};
use crate::error::ForestError;
use crate::result::{ForestFit, TrainMetadata};
use crate::tree::{Tree, TreeSettings, grow};

/// A fitted random forest ensemble.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Forest {
    pub(crate) trees: Vec<Tree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

/// Resolve `MaxFeatures` to a concrete column count.
pub(crate) fn resolve_max_features(
    max_features: MaxFeatures,
    n_features: usize,
) -> Result<usize, ForestError> {
    let resolved = match max_features {
        MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
        MaxFeatures::Fixed(n) => n,
        MaxFeatures::All => n_features,
    };
    if resolved == 0 || resolved > n_features {
        return Err(ForestError::InvalidMaxFeatures {
            max_features: resolved,
            n_features,
        });
    }
    Ok(resolved)
}

/// Draw `n_samples` row indices with replacement.
fn bootstrap_rows(n_samples: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// Per-class weights for one tree's bootstrap sample.
///
/// `Uniform` gives every class mass 1. `BalancedSubsample` computes
/// `n_boot / (n_classes * count_c)` from the bootstrap label counts, so
/// every class present carries equal total mass inside this tree. Classes
/// absent from the bootstrap get weight 0 — no row can carry it anyway.
fn class_weights_for(
    scheme: ClassWeight,
    labels: &[usize],
    rows: &[usize],
    n_classes: usize,
) -> Vec<f64> {
    match scheme {
        ClassWeight::Uniform => vec![1.0; n_classes],
        ClassWeight::BalancedSubsample => {
            let mut counts = vec![0usize; n_classes];
            for &r in rows {
                counts[labels[r]] += 1;
            }
            let n_boot = rows.len() as f64;
            let k = n_classes as f64;
            counts
                .iter()
                .map(|&c| if c == 0 { 0.0 } else { n_boot / (k * c as f64) })
                .collect()
        }
    }
}

/// Train the forest.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = x.len()))]
pub(crate) fn train(
    config: &ForestConfig,
    x: &[Vec<f64>],
    y: &[usize],
) -> Result<ForestFit, ForestError> {
    // --- Validate inputs ---
    if x.is_empty() {
        return Err(ForestError::EmptyDataset);
    }
    let n_samples = x.len();
    let n_features = x[0].len();
    if n_features == 0 {
        return Err(ForestError::ZeroFeatures);
    }
    if y.len() != n_samples {
        return Err(ForestError::LabelCountMismatch {
            rows: n_samples,
            labels: y.len(),
        });
    }
    for (row_index, row) in x.iter().enumerate() {
        if row.len() != n_features {
            return Err(ForestError::RaggedRow {
                expected: n_features,
                got: row.len(),
                row_index,
            });
        }
        for (feature_index, &val) in row.iter().enumerate() {
            if !val.is_finite() {
                return Err(ForestError::NonFiniteValue {
                    row_index,
                    feature_index,
                });
            }
        }
    }

    // --- Validate config ---
    let max_features_resolved = resolve_max_features(config.max_features, n_features)?;
    if config.max_depth == Some(0) {
        return Err(ForestError::InvalidMaxDepth { max_depth: 0 });
    }
    if config.min_samples_split < 2 {
        return Err(ForestError::InvalidMinSamplesSplit {
            min_samples_split: config.min_samples_split,
        });
    }
    if config.min_samples_leaf == 0 {
        return Err(ForestError::InvalidMinSamplesLeaf {
            min_samples_leaf: 0,
        });
    }
    if config.jobs == Some(0) {
        return Err(ForestError::InvalidJobCount);
    }

    let n_classes = y.iter().max().copied().unwrap_or(0) + 1;

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes,
        max_features = max_features_resolved,
        class_weight = ?config.class_weight,
        "training forest"
    );

    match config.jobs {
        None => Ok(train_pooled(
            config,
            x,
            y,
            n_classes,
            max_features_resolved,
        )),
        Some(k) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(k)
                .build()
                .map_err(|source| ForestError::ThreadPool { source })?;
            Ok(pool.install(|| train_pooled(config, x, y, n_classes, max_features_resolved)))
        }
    }
}

/// Train all trees on the current rayon pool. Inputs are pre-validated.
fn train_pooled(
    config: &ForestConfig,
    x: &[Vec<f64>],
    y: &[usize],
    n_classes: usize,
    max_features_resolved: usize,
) -> ForestFit {
    let n_samples = x.len();
    let n_features = x[0].len();

    // Column-major copy shared by every tree; bootstrap draws are index
    // vectors, so no per-tree clone of the matrix is needed.
    let mut columns: Vec<Vec<f64>> = (0..n_features)
        .map(|_| Vec::with_capacity(n_samples))
        .collect();
    for row in x {
        for (c, &v) in row.iter().enumerate() {
            columns[c].push(v);
        }
    }

    // Per-tree seeds from the master RNG: reproducible and independent of
    // the worker count.
    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master_rng.r#gen()).collect();

    let class_weight = config.class_weight;
    let max_depth = config.max_depth;
    let min_samples_split = config.min_samples_split;
    let min_samples_leaf = config.min_samples_leaf;

    let trees: Vec<Tree> = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let rows = bootstrap_rows(n_samples, &mut rng);
            let weights = class_weights_for(class_weight, y, &rows, n_classes);
            let settings = TreeSettings {
                max_depth,
                min_samples_split,
                min_samples_leaf,
                max_features: max_features_resolved,
                seed: rng.r#gen(),
            };
            grow(&settings, &columns, y, &weights, rows, n_classes)
        })
        .collect();

    // Sum per-tree normalized importances, then renormalize the total.
    let mut importances = vec![0.0f64; n_features];
    for tree in &trees {
        tree.accumulate_importances(&mut importances);
    }
    let sum: f64 = importances.iter().sum();
    if sum > 0.0 {
        importances.iter_mut().for_each(|v| *v /= sum);
    }

    debug!(n_trees_trained = trees.len(), "tree training complete");

    let forest = Forest {
        trees,
        n_features,
        n_classes,
    };
    let metadata = TrainMetadata {
        n_trees: config.n_trees,
        n_features,
        n_classes,
        n_samples,
        max_features_resolved,
    };

    info!("forest training complete");

    ForestFit::new(forest, importances, metadata)
}

#[cfg(test)]
mod tests {
    use crate::config::{ClassWeight, ForestConfig, MaxFeatures};
    use crate::error::ForestError;

    /// Simple 3-class separable dataset.
    fn make_separable_data() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..20 {
            x.push(vec![i as f64 * 0.15, 0.5]);
            y.push(0);
        }
        for i in 0..20 {
            x.push(vec![10.0 + i as f64 * 0.15, 0.5]);
            y.push(1);
        }
        for i in 0..20 {
            x.push(vec![20.0 + i as f64 * 0.15, 0.5]);
            y.push(2);
        }
        (x, y)
    }

    #[test]
    fn three_class_separable_accuracy() {
        let (x, y) = make_separable_data();
        let fit = ForestConfig::new(50)
            .unwrap()
            .with_max_features(MaxFeatures::All)
            .with_seed(42)
            .fit(&x, &y)
            .unwrap();

        let predictions = fit.forest().predict_batch(&x).unwrap();
        let correct = predictions.iter().zip(&y).filter(|&(&p, &l)| p == l).count();
        let accuracy = correct as f64 / y.len() as f64;
        assert!(accuracy > 0.9, "accuracy = {accuracy}");
    }

    #[test]
    fn importances_sum_to_one() {
        let (x, y) = make_separable_data();
        let fit = ForestConfig::new(20).unwrap().with_seed(42).fit(&x, &y).unwrap();
        let total: f64 = fit.importances().iter().sum();
        assert!((total - 1.0).abs() < 1e-10, "total = {total}");
        assert!(fit.importances().iter().all(|&v| v >= 0.0));
        assert_eq!(fit.importances().len(), 2);
    }

    #[test]
    fn informative_column_dominates() {
        let (x, y) = make_separable_data();
        // Column 0 separates the classes; column 1 is constant.
        let fit = ForestConfig::new(20).unwrap().with_seed(42).fit(&x, &y).unwrap();
        assert!(fit.importances()[0] > fit.importances()[1]);
    }

    #[test]
    fn deterministic_with_same_seed() {
        let (x, y) = make_separable_data();
        let fit1 = ForestConfig::new(10).unwrap().with_seed(99).fit(&x, &y).unwrap();
        let fit2 = ForestConfig::new(10).unwrap().with_seed(99).fit(&x, &y).unwrap();
        assert_eq!(
            fit1.forest().predict_batch(&x).unwrap(),
            fit2.forest().predict_batch(&x).unwrap()
        );
        assert_eq!(fit1.importances(), fit2.importances());
    }

    #[test]
    fn explicit_jobs_matches_shared_pool() {
        let (x, y) = make_separable_data();
        let shared = ForestConfig::new(10).unwrap().with_seed(5).fit(&x, &y).unwrap();
        let pooled = ForestConfig::new(10)
            .unwrap()
            .with_seed(5)
            .with_jobs(Some(2))
            .fit(&x, &y)
            .unwrap();
        assert_eq!(shared.importances(), pooled.importances());
        assert_eq!(
            shared.forest().predict_batch(&x).unwrap(),
            pooled.forest().predict_batch(&x).unwrap()
        );
    }

    #[test]
    fn balanced_subsample_recovers_minority() {
        // Four contested feature values, each carrying five class-0 rows
        // and two class-1 rows at the exact same value, so no split can
        // separate them and only leaf masses decide. Uniform weighting
        // votes with the 5:2 counts; balanced weighting gives each class-1
        // row mass n_boot / (2 * 8) and flips those leaves.
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..40 {
            x.push(vec![i as f64 * 0.1]);
            y.push(0);
        }
        let contested: Vec<f64> = (40..44).map(|i| i as f64 * 0.1).collect();
        for &v in &contested {
            for _ in 0..5 {
                x.push(vec![v]);
                y.push(0);
            }
            for _ in 0..2 {
                x.push(vec![v]);
                y.push(1);
            }
        }

        let uniform = ForestConfig::new(150).unwrap().with_seed(42).fit(&x, &y).unwrap();
        let balanced = ForestConfig::new(150)
            .unwrap()
            .with_class_weight(ClassWeight::BalancedSubsample)
            .with_seed(42)
            .fit(&x, &y)
            .unwrap();

        let hits = |fit: &crate::result::ForestFit| {
            contested
                .iter()
                .filter(|&&v| fit.forest().predict(&[v]).unwrap() == 1)
                .count()
        };
        assert!(hits(&uniform) <= 1, "uniform hits = {}", hits(&uniform));
        assert!(hits(&balanced) >= 3, "balanced hits = {}", hits(&balanced));
    }

    #[test]
    fn zero_jobs_rejected() {
        let (x, y) = make_separable_data();
        let err = ForestConfig::new(5)
            .unwrap()
            .with_jobs(Some(0))
            .fit(&x, &y)
            .unwrap_err();
        assert!(matches!(err, ForestError::InvalidJobCount));
    }

    #[test]
    fn empty_dataset_error() {
        let err = ForestConfig::new(10).unwrap().fit(&[], &[]).unwrap_err();
        assert!(matches!(err, ForestError::EmptyDataset));
    }

    #[test]
    fn zero_features_error() {
        let err = ForestConfig::new(10)
            .unwrap()
            .fit(&[vec![], vec![]], &[0, 1])
            .unwrap_err();
        assert!(matches!(err, ForestError::ZeroFeatures));
    }

    #[test]
    fn ragged_row_error() {
        let err = ForestConfig::new(10)
            .unwrap()
            .fit(&[vec![1.0, 2.0], vec![3.0]], &[0, 1])
            .unwrap_err();
        assert!(matches!(
            err,
            ForestError::RaggedRow {
                expected: 2,
                got: 1,
                row_index: 1
            }
        ));
    }

    #[test]
    fn label_count_mismatch_error() {
        let err = ForestConfig::new(10)
            .unwrap()
            .fit(&[vec![1.0], vec![2.0]], &[0])
            .unwrap_err();
        assert!(matches!(
            err,
            ForestError::LabelCountMismatch { rows: 2, labels: 1 }
        ));
    }

    #[test]
    fn non_finite_value_error() {
        let err = ForestConfig::new(10)
            .unwrap()
            .fit(&[vec![1.0], vec![f64::NAN]], &[0, 1])
            .unwrap_err();
        assert!(matches!(
            err,
            ForestError::NonFiniteValue {
                row_index: 1,
                feature_index: 0
            }
        ));
    }

    #[test]
    fn fixed_max_features_beyond_width_rejected() {
        let err = ForestConfig::new(5)
            .unwrap()
            .with_max_features(MaxFeatures::Fixed(3))
            .fit(&[vec![1.0, 2.0], vec![3.0, 4.0]], &[0, 1])
            .unwrap_err();
        assert!(matches!(err, ForestError::InvalidMaxFeatures { .. }));
    }
}
