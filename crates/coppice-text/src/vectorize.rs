//! Bag-of-words and tf-idf document vectorization.
//!
//! Documents are lowercased and split into alphanumeric runs; runs shorter
//! than two characters are dropped. Terms are word n-grams joined by single
//! spaces. The fitted vocabulary is ordered lexicographically, so column
//! indices are reproducible for a given corpus and configuration.

use std::collections::HashMap;

use tracing::{info, instrument};

use crate::TextError;

/// Term weighting scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Weighting {
    /// Raw term counts.
    Count,
    /// Term counts scaled by smoothed inverse document frequency, rows
    /// L2-normalized.
    TfIdf,
}

/// Configuration for fitting a [`Vectorizer`].
///
/// # Defaults
///
/// | Parameter   | Default        |
/// |-------------|----------------|
/// | `weighting` | [`Weighting::TfIdf`] |
/// | `ngram_max` | 2              |
/// | `max_vocab` | `Some(10_000)` |
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct VectorizerConfig {
    weighting: Weighting,
    ngram_max: usize,
    max_vocab: Option<usize>,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            weighting: Weighting::TfIdf,
            ngram_max: 2,
            max_vocab: Some(10_000),
        }
    }
}

impl VectorizerConfig {
    /// Create a config with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the term weighting scheme.
    #[must_use]
    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Set the largest n-gram size. Terms cover `1..=ngram_max`.
    #[must_use]
    pub fn with_ngram_max(mut self, ngram_max: usize) -> Self {
        self.ngram_max = ngram_max;
        self
    }

    /// Cap the vocabulary to the given number of most frequent terms, or
    /// lift the cap with `None`.
    #[must_use]
    pub fn with_max_vocab(mut self, max_vocab: Option<usize>) -> Self {
        self.max_vocab = max_vocab;
        self
    }

    /// Term weighting scheme.
    #[must_use]
    pub fn weighting(&self) -> Weighting {
        self.weighting
    }

    /// Largest n-gram size.
    #[must_use]
    pub fn ngram_max(&self) -> usize {
        self.ngram_max
    }

    /// Vocabulary cap, if any.
    #[must_use]
    pub fn max_vocab(&self) -> Option<usize> {
        self.max_vocab
    }

    /// Learn a vocabulary (and idf weights, for tf-idf) from a corpus.
    ///
    /// When the vocabulary exceeds `max_vocab`, the most frequent terms by
    /// total corpus count are kept; ties go to the lexicographically
    /// smaller term.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TextError::InvalidNgram`] | `ngram_max` is zero |
    /// | [`TextError::EmptyVocabulary`] | no document yields a single term |
    #[instrument(skip_all, fields(n_documents = documents.len(), ngram_max = self.ngram_max))]
    pub fn fit(&self, documents: &[String]) -> Result<Vectorizer, TextError> {
        if self.ngram_max == 0 {
            return Err(TextError::InvalidNgram { ngram_max: 0 });
        }

        let mut term_count: HashMap<String, u64> = HashMap::new();
        let mut doc_freq: HashMap<String, u64> = HashMap::new();
        for doc in documents {
            let mut terms = terms_of(doc, self.ngram_max);
            terms.sort_unstable();
            // Walk runs of equal terms: run length feeds the corpus count,
            // each run bumps the document frequency once.
            let mut i = 0;
            while i < terms.len() {
                let mut j = i + 1;
                while j < terms.len() && terms[j] == terms[i] {
                    j += 1;
                }
                *term_count.entry(terms[i].clone()).or_insert(0) += (j - i) as u64;
                *doc_freq.entry(terms[i].clone()).or_insert(0) += 1;
                i = j;
            }
        }

        if term_count.is_empty() {
            return Err(TextError::EmptyVocabulary);
        }
        let n_terms_seen = term_count.len();

        let mut vocabulary: Vec<String> = match self.max_vocab {
            Some(cap) if term_count.len() > cap => {
                let mut pairs: Vec<(String, u64)> = term_count.into_iter().collect();
                pairs.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
                pairs.truncate(cap);
                pairs.into_iter().map(|(term, _)| term).collect()
            }
            _ => term_count.into_keys().collect(),
        };
        vocabulary.sort_unstable();

        let idf = match self.weighting {
            Weighting::Count => None,
            Weighting::TfIdf => {
                let n = documents.len() as f64;
                Some(
                    vocabulary
                        .iter()
                        .map(|term| {
                            let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
                            ((1.0 + n) / (1.0 + df)).ln() + 1.0
                        })
                        .collect(),
                )
            }
        };

        info!(n_terms_seen, n_kept = vocabulary.len(), "vocabulary fitted");
        Ok(Vectorizer {
            weighting: self.weighting,
            ngram_max: self.ngram_max,
            vocabulary,
            idf,
        })
    }
}

/// A fitted text vectorizer.
///
/// Maps documents onto a fixed vocabulary learned by
/// [`VectorizerConfig::fit`]. Serializable, so a fitted vectorizer rides
/// along in a persisted model bundle and unseen documents get the exact
/// training-time columns.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Vectorizer {
    weighting: Weighting,
    ngram_max: usize,
    /// Lexicographically sorted; index equals column.
    vocabulary: Vec<String>,
    /// Aligned with `vocabulary`; `None` in count mode.
    idf: Option<Vec<f64>>,
}

impl Vectorizer {
    /// Map documents onto the fitted vocabulary.
    ///
    /// Never fails: unknown terms are dropped, and a document with no
    /// known terms becomes an all-zero row.
    #[must_use]
    pub fn transform(&self, documents: &[String]) -> Vec<Vec<f64>> {
        documents.iter().map(|doc| self.transform_one(doc)).collect()
    }

    fn transform_one(&self, doc: &str) -> Vec<f64> {
        let mut row = vec![0.0; self.vocabulary.len()];
        for term in terms_of(doc, self.ngram_max) {
            if let Ok(idx) = self.vocabulary.binary_search(&term) {
                row[idx] += 1.0;
            }
        }
        if let Some(idf) = &self.idf {
            for (value, weight) in row.iter_mut().zip(idf) {
                *value *= weight;
            }
            let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for value in &mut row {
                    *value /= norm;
                }
            }
        }
        row
    }

    /// Column-aligned vocabulary terms.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.vocabulary
    }

    /// Number of vocabulary columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    /// Term weighting scheme this vectorizer was fitted with.
    #[must_use]
    pub fn weighting(&self) -> Weighting {
        self.weighting
    }
}

/// All word n-grams of a document, sizes `1..=ngram_max`.
fn terms_of(text: &str, ngram_max: usize) -> Vec<String> {
    let tokens = tokenize(text);
    let mut terms = Vec::new();
    for n in 1..=ngram_max {
        if n > tokens.len() {
            break;
        }
        for window in tokens.windows(n) {
            terms.push(window.join(" "));
        }
    }
    terms
}

/// Lowercase alphanumeric runs of at least two characters.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= 2)
        .map(ToString::to_string)
        .collect()
}
