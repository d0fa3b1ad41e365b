//! JSON and CSV artifact writer for evaluation, tuning, and prediction runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use coppice_trim::TuningReport;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::TextError;
use crate::domain::ExperimentName;

/// Writes run artifacts under one output directory.
///
/// Creates the output directory on construction if it does not exist.
/// Artifacts are named `{experiment}_evaluate.json`, `{experiment}_tune.csv`,
/// and `{experiment}_predict.json`. The writer accepts primitives plus
/// [`TuningReport`], so it carries no model-side dependency.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::OutputDirCreate`] if the directory cannot be
    /// created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, TextError> {
        fs::create_dir_all(output_dir).map_err(|e| TextError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write holdout evaluation results to `{experiment}_evaluate.json`.
    ///
    /// `feature_names`, `feature_importances`, and `feature_ranks` are
    /// parallel slices describing the reported features.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::WriteFile`] if the file cannot be written.
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip_all)]
    pub fn write_evaluation(
        &self,
        accuracy: f64,
        n_train_rows: usize,
        n_test_rows: usize,
        n_features_total: usize,
        n_features_kept: usize,
        n_trees: usize,
        feature_names: &[String],
        feature_importances: &[f64],
        feature_ranks: &[usize],
    ) -> Result<(), TextError> {
        let path = self.evaluation_path();

        let top_features: Vec<FeatureEntry> = feature_names
            .iter()
            .zip(feature_importances.iter())
            .zip(feature_ranks.iter())
            .map(|((name, &importance), &rank)| FeatureEntry {
                name: name.as_str(),
                importance,
                rank,
            })
            .collect();

        let artifact = EvaluateArtifact {
            experiment: self.experiment.as_str(),
            accuracy,
            n_train_rows,
            n_test_rows,
            n_features_total,
            n_features_kept,
            n_trees,
            top_features,
        };

        let json = serde_json::to_string_pretty(&artifact).expect("serialization cannot fail");
        fs::write(&path, &json).map_err(|e| TextError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "evaluation result written");
        Ok(())
    }

    /// Write a sweep's accuracy curve to `{experiment}_tune.csv`.
    ///
    /// Two columns, `n_features` and `accuracy`, one row per sweep point.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::CsvWrite`] if the file cannot be written, or
    /// [`TextError::WriteFile`] if the final flush fails.
    #[instrument(skip_all)]
    pub fn write_tuning(&self, report: &TuningReport) -> Result<(), TextError> {
        let path = self.tuning_path();
        let csv_err = |e| TextError::CsvWrite {
            path: path.clone(),
            source: e,
        };

        let mut wtr = csv::Writer::from_path(&path).map_err(csv_err)?;
        wtr.write_record(["n_features", "accuracy"]).map_err(csv_err)?;
        for point in report.points() {
            wtr.write_record([point.n_features.to_string(), point.accuracy.to_string()])
                .map_err(csv_err)?;
        }
        wtr.flush().map_err(|e| TextError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), n_points = report.len(), "tuning curve written");
        Ok(())
    }

    /// Write per-row predictions to `{experiment}_predict.json`.
    ///
    /// `labels[i]` is the predicted label of row `i`. When `probabilities`
    /// is given, each row also carries a class-to-probability map keyed by
    /// `classes`.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_predictions(
        &self,
        labels: &[String],
        classes: &[String],
        probabilities: Option<&[Vec<f64>]>,
    ) -> Result<(), TextError> {
        let path = self.predictions_path();

        let predictions: Vec<PredictionEntry> = labels
            .iter()
            .enumerate()
            .map(|(row, label)| {
                let row_probs = probabilities.and_then(|all| all.get(row)).map(|dist| {
                    classes
                        .iter()
                        .map(String::as_str)
                        .zip(dist.iter().copied())
                        .collect::<BTreeMap<&str, f64>>()
                });
                PredictionEntry {
                    row,
                    label: label.as_str(),
                    probabilities: row_probs,
                }
            })
            .collect();

        let artifact = PredictArtifact {
            experiment: self.experiment.as_str(),
            n_rows: labels.len(),
            classes,
            predictions,
        };

        let json = serde_json::to_string_pretty(&artifact).expect("serialization cannot fail");
        fs::write(&path, &json).map_err(|e| TextError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), n_rows = labels.len(), "predictions written");
        Ok(())
    }

    /// `{output_dir}/{experiment}_evaluate.json`.
    #[must_use]
    pub fn evaluation_path(&self) -> PathBuf {
        self.artifact_path("evaluate.json")
    }

    /// `{output_dir}/{experiment}_tune.csv`.
    #[must_use]
    pub fn tuning_path(&self) -> PathBuf {
        self.artifact_path("tune.csv")
    }

    /// `{output_dir}/{experiment}_predict.json`.
    #[must_use]
    pub fn predictions_path(&self) -> PathBuf {
        self.artifact_path("predict.json")
    }

    /// Path where the model bundle should be saved.
    ///
    /// Does not write anything, just computes
    /// `{output_dir}/{experiment}_model.bin`.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.artifact_path("model.bin")
    }

    fn artifact_path(&self, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{suffix}", self.experiment.as_str()))
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct EvaluateArtifact<'a> {
    experiment: &'a str,
    accuracy: f64,
    n_train_rows: usize,
    n_test_rows: usize,
    n_features_total: usize,
    n_features_kept: usize,
    n_trees: usize,
    top_features: Vec<FeatureEntry<'a>>,
}

#[derive(Serialize)]
struct FeatureEntry<'a> {
    name: &'a str,
    importance: f64,
    rank: usize,
}

#[derive(Serialize)]
struct PredictArtifact<'a> {
    experiment: &'a str,
    n_rows: usize,
    classes: &'a [String],
    predictions: Vec<PredictionEntry<'a>>,
}

#[derive(Serialize)]
struct PredictionEntry<'a> {
    row: usize,
    label: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    probabilities: Option<BTreeMap<&'a str, f64>>,
}
