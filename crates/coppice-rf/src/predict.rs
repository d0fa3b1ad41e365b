//! Prediction methods for the fitted ensemble.

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::error::ForestError;
use crate::forest::Forest;
use crate::node::Node;

impl Forest {
    /// Predict the class label for a single row.
    ///
    /// Argmax of the averaged probability distribution; ties go to the
    /// lower class id.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::PredictionFeatureMismatch`] when
    /// `row.len() != n_features`.
    pub fn predict(&self, row: &[f64]) -> Result<usize, ForestError> {
        let proba = self.predict_proba(row)?;
        let mut best = 0usize;
        for (i, &p) in proba.iter().enumerate() {
            if p > proba[best] {
                best = i;
            }
        }
        Ok(best)
    }

    /// Return the averaged class probability distribution for a single row.
    ///
    /// Averages the leaf distributions of all trees; the result has length
    /// `n_classes` and sums to 1.0.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::PredictionFeatureMismatch`] when
    /// `row.len() != n_features`.
    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ForestError> {
        if row.len() != self.n_features {
            return Err(ForestError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: row.len(),
            });
        }

        let mut avg = vec![0.0f64; self.n_classes];
        for tree in &self.trees {
            if let Node::Leaf { distribution, .. } = tree.leaf_for(row) {
                for (a, p) in avg.iter_mut().zip(distribution) {
                    *a += p;
                }
            }
        }
        let n = self.trees.len() as f64;
        avg.iter_mut().for_each(|v| *v /= n);
        Ok(avg)
    }

    /// Predict class labels for a batch of rows in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::PredictionFeatureMismatch`] if any row has
    /// the wrong column count.
    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<usize>, ForestError> {
        rows.into_par_iter().map(|row| self.predict(row)).collect()
    }

    /// Return probability distributions for a batch of rows in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::PredictionFeatureMismatch`] if any row has
    /// the wrong column count.
    pub fn predict_proba_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ForestError> {
        rows.into_par_iter()
            .map(|row| self.predict_proba(row))
            .collect()
    }

    /// Number of columns this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
