/// Errors from forest construction, training, and prediction.
#[derive(Debug, thiserror::Error)]
pub enum ForestError {
    /// Returned when n_trees is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid n_trees value provided.
        n_trees: usize,
    },

    /// Returned when max_depth is zero.
    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth {
        /// The invalid max_depth value provided.
        max_depth: usize,
    },

    /// Returned when min_samples_split is less than 2.
    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit {
        /// The invalid min_samples_split value provided.
        min_samples_split: usize,
    },

    /// Returned when min_samples_leaf is zero.
    #[error("min_samples_leaf must be at least 1, got {min_samples_leaf}")]
    InvalidMinSamplesLeaf {
        /// The invalid min_samples_leaf value provided.
        min_samples_leaf: usize,
    },

    /// Returned when max_features resolves to 0 or exceeds the column count.
    #[error("max_features resolved to {max_features}, but must be in [1, {n_features}]")]
    InvalidMaxFeatures {
        /// The resolved max_features value.
        max_features: usize,
        /// The number of feature columns in the dataset.
        n_features: usize,
    },

    /// Returned when an explicit worker count of zero is requested.
    #[error("jobs must be at least 1 when set explicitly")]
    InvalidJobCount,

    /// Returned when the training dataset has zero rows.
    #[error("training dataset has zero rows")]
    EmptyDataset,

    /// Returned when the training dataset has zero feature columns.
    #[error("training dataset has zero feature columns")]
    ZeroFeatures,

    /// Returned when a row has a different number of columns than the first row.
    #[error("row {row_index} has {got} columns, expected {expected}")]
    RaggedRow {
        /// The expected number of columns.
        expected: usize,
        /// The actual number of columns in the row.
        got: usize,
        /// The zero-based index of the offending row.
        row_index: usize,
    },

    /// Returned when the label slice and the feature matrix disagree in length.
    #[error("feature matrix has {rows} rows but {labels} labels were provided")]
    LabelCountMismatch {
        /// Number of rows in the feature matrix.
        rows: usize,
        /// Number of labels provided.
        labels: usize,
    },

    /// Returned when a training value is NaN or infinite.
    #[error("non-finite value at row {row_index}, column {feature_index}")]
    NonFiniteValue {
        /// The zero-based index of the offending row.
        row_index: usize,
        /// The zero-based index of the offending feature column.
        feature_index: usize,
    },

    /// Returned when a prediction input has the wrong number of columns.
    #[error("prediction input has {got} columns, expected {expected}")]
    PredictionFeatureMismatch {
        /// The number of columns the forest was trained on.
        expected: usize,
        /// The actual number of columns in the prediction input.
        got: usize,
    },

    /// Returned when the dedicated worker pool cannot be built.
    #[error("failed to build worker pool")]
    ThreadPool {
        /// The underlying rayon error.
        source: rayon::ThreadPoolBuildError,
    },
}
