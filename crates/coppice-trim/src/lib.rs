//! Importance-based feature trimming around a random-forest classifier.
//!
//! Wide feature matrices (bag-of-words text, one-hot blowups) usually carry
//! a small informative core. This crate fits a full-width forest once,
//! reads its importance vector, keeps the strongest columns, and retrains a
//! compact forest on just those. Callers keep passing full-width rows; the
//! fitted model projects them itself.
//!
//! Two entry points:
//!
//! * [`TrimmedForest`] is the end-to-end pipeline: fit, score, predict.
//! * [`tune`] sweeps feature budgets against a held-out split to show
//!   where the accuracy curve flattens.
//!
//! # Example
//!
//! ```
//! use coppice_trim::{TrimConfig, TrimmedForest};
//!
//! // Column 0 separates the classes; columns 1 and 2 are constant.
//! let x: Vec<Vec<f64>> = (0..20)
//!     .map(|i| vec![if i % 2 == 0 { 0.0 } else { 5.0 }, 1.0, 2.0])
//!     .collect();
//! let y: Vec<usize> = (0..20).map(|i| i % 2).collect();
//! let names: Vec<String> = ["signal", "noise_a", "noise_b"]
//!     .iter()
//!     .map(ToString::to_string)
//!     .collect();
//!
//! let config = TrimConfig::new(25)?.with_top(1).with_seed(7);
//! let mut model = TrimmedForest::new(config);
//! model.fit(&x, &y, &names)?;
//!
//! assert_eq!(model.features()?.indices(), &[0]);
//! assert!(model.score(&x, &y)? > 0.95);
//! # Ok::<(), coppice_trim::TrimError>(())
//! ```

mod error;
mod pipeline;
mod report;
mod select;
mod tune;

pub use error::TrimError;
pub use pipeline::{FitReport, TrimConfig, TrimmedForest};
pub use report::{FeatureRanking, RankedFeature};
pub use select::FeatureSet;
pub use tune::{TuneConfig, TunePoint, TuningReport, tune};
