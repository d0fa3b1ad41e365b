//! Top-k feature selection over an importance vector.

use crate::error::TrimError;

/// An ordered set of original column indices.
///
/// Produced by [`FeatureSet::top_k`], which sorts columns by ascending
/// importance and keeps the tail, so iteration order runs from the least
/// to the most important kept column. Consumers preserve this order when
/// projecting matrices, which keeps every downstream artifact aligned with
/// the set.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FeatureSet {
    indices: Vec<usize>,
}

impl FeatureSet {
    /// Select the `k` highest-scoring columns.
    ///
    /// Columns are stably sorted by ascending score and the last
    /// `min(k, n)` survive. Two consequences worth relying on:
    ///
    /// - the result is ordered by ascending importance;
    /// - among equal scores at the cutoff, the larger original column
    ///   index survives (the stable sort keeps smaller indices earlier,
    ///   and the tail slice drops them first).
    ///
    /// `k` larger than the vector is capped, never an error.
    #[must_use]
    pub fn top_k(scores: &[f64], k: usize) -> Self {
        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));
        let keep = k.min(scores.len());
        Self {
            indices: order[scores.len() - keep..].to_vec(),
        }
    }

    /// The full index range `0..n` in natural order, the no-prune set.
    #[must_use]
    pub fn identity(n: usize) -> Self {
        Self {
            indices: (0..n).collect(),
        }
    }

    /// Selected indices, in selection order.
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Number of selected columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// `true` when nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Minimum row width needed to project through this set.
    #[must_use]
    pub fn required_width(&self) -> usize {
        self.indices.iter().max().map_or(0, |&m| m + 1)
    }

    /// Project row-major data onto the selected columns, in set order.
    ///
    /// Rows wider than required are fine; the extra columns are ignored.
    /// Row order is never changed.
    ///
    /// # Errors
    ///
    /// Returns [`TrimError::InsufficientColumns`] if any row is narrower
    /// than [`required_width`](Self::required_width).
    pub fn restrict(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, TrimError> {
        let required = self.required_width();
        for row in rows {
            if row.len() < required {
                return Err(TrimError::InsufficientColumns {
                    required,
                    actual: row.len(),
                });
            }
        }
        Ok(rows
            .iter()
            .map(|row| self.indices.iter().map(|&i| row[i]).collect())
            .collect())
    }
}
