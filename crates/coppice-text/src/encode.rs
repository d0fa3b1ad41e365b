//! String label to class id mapping.

use crate::TextError;

/// Maps string labels to dense class ids and back.
///
/// Classes are the sorted distinct labels seen at fit time, so class ids
/// are stable across runs on the same label set regardless of row order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LabelEncoder {
    /// Sorted distinct classes; the index of a class is its id.
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Learn the class set from a label column.
    #[must_use]
    pub fn fit(labels: &[String]) -> Self {
        let mut classes: Vec<String> = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        Self { classes }
    }

    /// Map labels to class ids.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::UnknownLabel`] for any label not seen at fit
    /// time.
    pub fn encode(&self, labels: &[String]) -> Result<Vec<usize>, TextError> {
        labels
            .iter()
            .map(|label| {
                self.classes
                    .binary_search(label)
                    .map_err(|_| TextError::UnknownLabel {
                        label: label.clone(),
                    })
            })
            .collect()
    }

    /// Map class ids back to labels.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::UnknownClassId`] for any id outside the fitted
    /// class range.
    pub fn decode(&self, ids: &[usize]) -> Result<Vec<String>, TextError> {
        ids.iter()
            .map(|&id| {
                self.classes
                    .get(id)
                    .cloned()
                    .ok_or(TextError::UnknownClassId {
                        id,
                        n_classes: self.classes.len(),
                    })
            })
            .collect()
    }

    /// The sorted class labels; index equals class id.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of distinct classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}
