//! Corpus loading, text vectorization, splitting, and artifact writing
//! for the coppice pipeline.
//!
//! The data path runs: [`CorpusReader`] loads labelled documents from CSV,
//! [`LabelEncoder`] maps labels to class ids, [`VectorizerConfig`] fits a
//! [`Vectorizer`] that turns documents into feature rows, and
//! [`train_test_split`] (or [`split_by_value`]) cuts the matrix for
//! evaluation. [`ResultWriter`] persists run artifacts; [`save_model`] and
//! [`load_model`] persist the fitted bundle itself.

mod corpus;
mod domain;
mod encode;
mod error;
mod split;
mod store;
mod vectorize;
mod writer;

pub use corpus::{Corpus, CorpusReader, read_documents};
pub use domain::ExperimentName;
pub use encode::LabelEncoder;
pub use error::TextError;
pub use split::{SplitData, split_by_value, train_test_split};
pub use store::{FORMAT_VERSION, ModelBundle, load_model, save_model};
pub use vectorize::{Vectorizer, VectorizerConfig, Weighting};
pub use writer::ResultWriter;
