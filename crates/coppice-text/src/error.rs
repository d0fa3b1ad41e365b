//! Error types for corpus loading, vectorization, and artifact writing.

use std::path::PathBuf;

/// Errors from CSV parsing, text processing, splitting, and persistence.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when a named column is absent from the CSV header.
    #[error("column \"{column}\" not found in {path}")]
    MissingColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// The column name that was requested.
        column: String,
    },

    /// Returned when a required cell is empty or the row is too short to
    /// contain it.
    #[error("missing value in {path}: row {row_index}, column \"{column}\"")]
    MissingValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// The column the value was expected in.
        column: String,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty corpus (no data rows) in {path}")]
    EmptyCorpus {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when the n-gram ceiling is zero.
    #[error("invalid n-gram ceiling {ngram_max}: must be at least 1")]
    InvalidNgram {
        /// The rejected ceiling.
        ngram_max: usize,
    },

    /// Returned when fitting a vectorizer yields no vocabulary terms.
    #[error("vocabulary is empty: no token of length >= 2 in any document")]
    EmptyVocabulary,

    /// Returned when a label at encode time was never seen during fitting.
    #[error("unknown label \"{label}\": not present in the fitted classes")]
    UnknownLabel {
        /// The unseen label.
        label: String,
    },

    /// Returned when a class id at decode time is out of range.
    #[error("unknown class id {id}: encoder holds {n_classes} classes")]
    UnknownClassId {
        /// The out-of-range id.
        id: usize,
        /// Number of classes the encoder was fitted with.
        n_classes: usize,
    },

    /// Returned when rows and labels disagree in length before a split.
    #[error("matrix has {rows} rows but {labels} labels")]
    SplitSizeMismatch {
        /// Number of feature rows.
        rows: usize,
        /// Number of labels.
        labels: usize,
    },

    /// Returned when rows and split values disagree in length.
    #[error("matrix has {rows} rows but {values} split values")]
    SplitValueMismatch {
        /// Number of feature rows.
        rows: usize,
        /// Number of split values.
        values: usize,
    },

    /// Returned when the test fraction is not strictly between 0 and 1.
    #[error("invalid test fraction {fraction}: must be in (0, 1)")]
    InvalidTestFraction {
        /// The rejected fraction.
        fraction: f64,
    },

    /// Returned when a split would leave one side without any rows.
    #[error("degenerate split: {train_rows} train rows, {test_rows} test rows")]
    DegenerateSplit {
        /// Rows on the training side.
        train_rows: usize,
        /// Rows on the test side.
        test_rows: usize,
    },

    /// Returned when the experiment name is empty, too long, or contains
    /// characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]{{1,64}}")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a CSV artifact cannot be written.
    #[error("cannot write CSV file {path}")]
    CsvWrite {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when a model file cannot be encoded or written.
    #[error("cannot encode model to {path}")]
    EncodeModel {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying bincode error.
        source: bincode::Error,
    },

    /// Returned when a model file cannot be read back into a bundle.
    #[error("cannot decode model from {path}")]
    DecodeModel {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying bincode error.
        source: bincode::Error,
    },

    /// Returned when a model file carries an unsupported format version.
    #[error("model {path} has format version {found}, expected {expected}")]
    ModelFormatVersion {
        /// Path to the model file.
        path: PathBuf,
        /// Version found in the file.
        found: u32,
        /// Version this build understands.
        expected: u32,
    },
}
