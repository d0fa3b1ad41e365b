use coppice_rf::ForestError;

/// Errors from the trimming pipeline and the stepwise tuner.
///
/// Validation is eager: every variant below is raised before any training
/// starts and before any fitted state is replaced.
#[derive(Debug, thiserror::Error)]
pub enum TrimError {
    /// Returned when the feature matrix and label slice disagree in length.
    #[error("feature matrix has {rows} rows but {labels} labels were provided")]
    DimensionMismatch {
        /// Number of rows in the feature matrix.
        rows: usize,
        /// Number of labels provided.
        labels: usize,
    },

    /// Returned at inference when a row is too narrow for the selected
    /// feature indices.
    #[error("input rows need at least {required} columns to cover the selected features, got {actual}")]
    InsufficientColumns {
        /// Minimum column count the selected indices require.
        required: usize,
        /// Column count of the offending row.
        actual: usize,
    },

    /// Returned when the feature-name slice is not aligned with the matrix.
    #[error("{names} feature names provided for {columns} columns")]
    NameCountMismatch {
        /// Number of names provided.
        names: usize,
        /// Number of columns in the feature matrix.
        columns: usize,
    },

    /// Returned when scoring, predicting, or reading fitted state before a
    /// successful fit.
    #[error("model has not been fitted")]
    NotFitted,

    /// Returned when the requested number of features to keep is zero.
    #[error("top must be at least 1, got {requested}")]
    InvalidFeatureCount {
        /// The invalid feature count requested.
        requested: usize,
    },

    /// Returned when the sweep bounds are empty or inverted.
    #[error("feature bounds must satisfy 1 <= min <= max, got {min_features}..={max_features}")]
    InvalidFeatureBounds {
        /// Lower bound of the sweep.
        min_features: usize,
        /// Upper bound of the sweep.
        max_features: usize,
    },

    /// Returned when a tree count of zero is requested.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid tree count requested.
        n_trees: usize,
    },

    /// A failure inside forest training or prediction, passed through
    /// unchanged.
    #[error(transparent)]
    Forest(#[from] ForestError),
}
