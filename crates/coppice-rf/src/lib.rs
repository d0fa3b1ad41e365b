//! Random forest classification with impurity-based feature importances.
//!
//! Trees are CART: binary splits on `feature <= threshold` chosen by
//! weighted Gini impurity over a random feature subset, grown on bootstrap
//! samples. The fit result carries a column-aligned importance vector
//! (mean decrease in impurity) alongside the ensemble, which is what the
//! feature-trimming layer consumes.
//!
//! Seeding is hierarchical: one master `ChaCha8` stream per fit hands a
//! seed to every tree, so results are reproducible and do not depend on
//! the worker count.
//!
//! ```
//! use coppice_rf::{ForestConfig, MaxFeatures};
//!
//! # fn main() -> Result<(), coppice_rf::ForestError> {
//! let x = vec![
//!     vec![0.1], vec![0.3], vec![0.5], vec![0.7],
//!     vec![5.1], vec![5.3], vec![5.5], vec![5.7],
//! ];
//! let y = vec![0, 0, 0, 0, 1, 1, 1, 1];
//!
//! let fit = ForestConfig::new(25)?
//!     .with_max_features(MaxFeatures::All)
//!     .with_seed(7)
//!     .fit(&x, &y)?;
//!
//! assert_eq!(fit.forest().predict(&[5.0])?, 1);
//! assert_eq!(fit.importances().len(), 1);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod forest;
mod node;
mod predict;
mod result;
mod split;
mod tree;

pub use config::{ClassWeight, ForestConfig, MaxFeatures};
pub use error::ForestError;
pub use forest::Forest;
pub use result::{ForestFit, TrainMetadata};
