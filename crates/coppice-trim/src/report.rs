//! Ranked feature reporting.

use std::fmt;

/// A ranked feature with name, importance score, and rank.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RankedFeature {
    /// Feature name.
    pub name: String,
    /// Importance score as produced by training (non-negative; sums to 1.0
    /// across all features unless no tree ever split).
    pub importance: f64,
    /// 1-based rank (1 = most important).
    pub rank: usize,
}

/// The full importance ranking of a fitted model's feature universe.
///
/// Sorted descending by importance; among equal scores the smaller column
/// index ranks first. Rendering via [`fmt::Display`] produces the top-n
/// table the CLI prints.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FeatureRanking {
    entries: Vec<RankedFeature>,
}

impl FeatureRanking {
    /// Pair column-aligned names and scores, sort, and assign ranks.
    #[must_use]
    pub fn new(names: &[String], importances: &[f64]) -> Self {
        debug_assert_eq!(names.len(), importances.len());

        let mut entries: Vec<RankedFeature> = names
            .iter()
            .zip(importances.iter())
            .map(|(name, &importance)| RankedFeature {
                name: name.clone(),
                importance,
                rank: 0,
            })
            .collect();

        // Stable sort: equal importances keep column order.
        entries.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        for (i, entry) in entries.iter_mut().enumerate() {
            entry.rank = i + 1;
        }

        Self { entries }
    }

    /// All entries, best first.
    #[must_use]
    pub fn entries(&self) -> &[RankedFeature] {
        &self.entries
    }

    /// The first `min(n, len)` entries.
    #[must_use]
    pub fn top(&self, n: usize) -> &[RankedFeature] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// A copy of this ranking cut down to its top `n` entries, for
    /// rendering a bounded table.
    #[must_use]
    pub fn truncated(&self, n: usize) -> FeatureRanking {
        FeatureRanking {
            entries: self.top(n).to_vec(),
        }
    }

    /// Number of ranked features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the ranking is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for FeatureRanking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>5}  {:>12}  feature", "rank", "importance")?;
        for entry in &self.entries {
            writeln!(
                f,
                "{:>5}  {:>12.6}  {}",
                entry.rank, entry.importance, entry.name
            )?;
        }
        Ok(())
    }
}
