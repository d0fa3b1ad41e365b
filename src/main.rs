use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use coppice_text::{
    CorpusReader, ExperimentName, LabelEncoder, ModelBundle, ResultWriter, SplitData, Vectorizer,
    VectorizerConfig, Weighting, load_model, read_documents, save_model, split_by_value,
    train_test_split,
};
use coppice_trim::{TrimConfig, TrimmedForest, TuneConfig, tune};

#[derive(Parser)]
#[command(name = "coppice")]
#[command(about = "Text classification with importance-trimmed random forests")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of worker threads for training (defaults to all cores)
    #[arg(long, global = true)]
    jobs: Option<usize>,
}

/// Text vectorization parameters shared by train and tune.
#[derive(Args, Debug, Clone)]
struct VectorizeArgs {
    /// Term weighting: "tfidf" or "count"
    #[arg(long, default_value = "tfidf")]
    vectorizer: String,

    /// Largest word n-gram size
    #[arg(long, default_value_t = 2)]
    ngram_max: usize,

    /// Keep only this many most frequent vocabulary terms
    #[arg(long, default_value_t = 10_000)]
    max_vocab: usize,

    /// Lift the vocabulary cap entirely
    #[arg(long, default_value_t = false)]
    no_vocab_limit: bool,
}

/// Holdout selection shared by train and tune.
#[derive(Args, Debug, Clone)]
struct SplitArgs {
    /// Fraction of rows held out for testing
    #[arg(long, default_value_t = 0.25)]
    test_fraction: f64,

    /// Column whose value decides the holdout (use with --holdout)
    #[arg(long)]
    split_column: Option<String>,

    /// Rows with this split-column value become the test side
    #[arg(long)]
    holdout: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Train a trimmed forest on a labelled corpus and score the holdout
    Train {
        /// Path to the corpus CSV file
        data: PathBuf,

        /// Name of the column holding the text
        text_column: String,

        /// Name of the column holding the target label
        label_column: String,

        /// Number of trees per forest
        #[arg(long, default_value_t = 1000)]
        trees: usize,

        /// How many features to keep after the full fit
        #[arg(long, default_value_t = 100)]
        top: usize,

        /// Skip trimming: keep the full-width model
        #[arg(long, default_value_t = false)]
        no_prune: bool,

        /// How many ranked features to print and record
        #[arg(long, default_value_t = 10)]
        top_n: usize,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Also persist the fitted model bundle
        #[arg(long, default_value_t = false)]
        save_model: bool,

        #[command(flatten)]
        vectorize: VectorizeArgs,

        #[command(flatten)]
        split: SplitArgs,
    },

    /// Sweep feature budgets to find where the accuracy curve flattens
    Tune {
        /// Path to the corpus CSV file
        data: PathBuf,

        /// Name of the column holding the text
        text_column: String,

        /// Name of the column holding the target label
        label_column: String,

        /// Number of trees per sweep point
        #[arg(long, default_value_t = 100)]
        trees: usize,

        /// Smallest feature budget to try
        #[arg(long, default_value_t = 1)]
        min_features: usize,

        /// Largest feature budget to try
        #[arg(long, default_value_t = 200)]
        max_features: usize,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        vectorize: VectorizeArgs,

        #[command(flatten)]
        split: SplitArgs,
    },

    /// Print the top features of a saved model
    TopFeatures {
        /// Path to the saved model bundle
        model: PathBuf,

        /// How many ranked features to print
        #[arg(long, default_value_t = 10)]
        top_n: usize,
    },

    /// Classify unlabelled documents with a saved model
    Predict {
        /// Path to the saved model bundle
        model: PathBuf,

        /// Path to the CSV file with documents to classify
        data: PathBuf,

        /// Name of the column holding the text
        text_column: String,

        /// Also record per-class probabilities
        #[arg(long, default_value_t = false)]
        proba: bool,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TrainOutput {
    experiment: String,
    n_documents: usize,
    n_train_rows: usize,
    n_test_rows: usize,
    n_classes: usize,
    n_features_total: usize,
    n_features_kept: usize,
    n_trees: usize,
    pruned: bool,
    test_accuracy: f64,
    model_saved: Option<PathBuf>,
}

#[derive(Serialize)]
struct TuneOutput {
    experiment: String,
    n_documents: usize,
    n_points: usize,
    best_n_features: Option<usize>,
    best_accuracy: Option<f64>,
}

#[derive(Serialize)]
struct PredictOutput {
    experiment: String,
    n_documents: usize,
    n_classes: usize,
    wrote_probabilities: bool,
}

fn parse_weighting(s: &str) -> Result<Weighting> {
    match s {
        "tfidf" => Ok(Weighting::TfIdf),
        "count" => Ok(Weighting::Count),
        other => anyhow::bail!("unknown vectorizer: {other} (expected tfidf or count)"),
    }
}

fn build_vectorizer_config(args: &VectorizeArgs) -> Result<VectorizerConfig> {
    let max_vocab = if args.no_vocab_limit {
        None
    } else {
        Some(args.max_vocab)
    };
    Ok(VectorizerConfig::new()
        .with_weighting(parse_weighting(&args.vectorizer)?)
        .with_ngram_max(args.ngram_max)
        .with_max_vocab(max_vocab))
}

/// Load, encode, and vectorize a corpus, then cut it into train and test.
fn prepare_data(
    data: &PathBuf,
    text_column: &str,
    label_column: &str,
    vectorize: &VectorizeArgs,
    split: &SplitArgs,
    seed: u64,
) -> Result<(SplitData, Vec<String>, Vectorizer, LabelEncoder, usize)> {
    let mut reader = CorpusReader::new(data, text_column, label_column);
    if let Some(column) = &split.split_column {
        reader = reader.with_split_column(column);
    }
    let corpus = reader.read().context("failed to read corpus CSV")?;
    let n_documents = corpus.len();

    let encoder = LabelEncoder::fit(&corpus.labels);
    let y = encoder
        .encode(&corpus.labels)
        .context("failed to encode labels")?;
    info!(n_classes = encoder.n_classes(), "labels encoded");

    let vectorizer = build_vectorizer_config(vectorize)?
        .fit(&corpus.documents)
        .context("failed to fit vectorizer")?;
    let x = vectorizer.transform(&corpus.documents);
    let feature_names = vectorizer.feature_names().to_vec();
    info!(n_features = feature_names.len(), "corpus vectorized");

    let split_data = match (&split.split_column, &split.holdout) {
        (Some(_), Some(holdout)) => {
            let values = corpus
                .split_values
                .as_deref()
                .context("split column requested but no values were read")?;
            split_by_value(&x, &y, values, holdout).context("value split failed")?
        }
        (None, None) => train_test_split(&x, &y, split.test_fraction, seed)
            .context("random split failed")?,
        _ => anyhow::bail!("--split-column and --holdout must be used together"),
    };

    Ok((split_data, feature_names, vectorizer, encoder, n_documents))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Train {
            data,
            text_column,
            label_column,
            trees,
            top,
            no_prune,
            top_n,
            experiment,
            output_dir,
            save_model: persist,
            vectorize,
            split,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            let (split_data, feature_names, vectorizer, encoder, n_documents) = prepare_data(
                &data,
                &text_column,
                &label_column,
                &vectorize,
                &split,
                cli.seed,
            )?;

            // Fit the trimmed pipeline on the training side.
            let config = TrimConfig::new(trees)?
                .with_top(top)
                .with_prune(!no_prune)
                .with_jobs(cli.jobs)
                .with_seed(cli.seed);
            let mut model = TrimmedForest::new(config);
            let report = model
                .fit(&split_data.train_x, &split_data.train_y, &feature_names)
                .context("training failed")?;

            let accuracy = model
                .score(&split_data.test_x, &split_data.test_y)
                .context("holdout scoring failed")?;
            info!(accuracy, "holdout scored");

            // Print the ranked-feature table.
            let ranking = model.ranking()?;
            print!("{}", ranking.truncated(top_n));

            // Write the evaluation artifact.
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            let top_entries = ranking.top(top_n);
            let names: Vec<String> = top_entries.iter().map(|e| e.name.clone()).collect();
            let importances: Vec<f64> = top_entries.iter().map(|e| e.importance).collect();
            let ranks: Vec<usize> = top_entries.iter().map(|e| e.rank).collect();
            writer.write_evaluation(
                accuracy,
                split_data.train_x.len(),
                split_data.test_x.len(),
                report.n_features,
                report.n_kept,
                trees,
                &names,
                &importances,
                &ranks,
            )?;

            // Optionally persist the whole bundle.
            let model_saved = if persist {
                let path = writer.model_path();
                let bundle = ModelBundle {
                    vectorizer,
                    encoder,
                    pipeline: model,
                };
                save_model(&path, &bundle).context("failed to save model bundle")?;
                Some(path)
            } else {
                None
            };

            let output = TrainOutput {
                experiment,
                n_documents,
                n_train_rows: split_data.train_x.len(),
                n_test_rows: split_data.test_x.len(),
                n_classes: report.n_classes,
                n_features_total: report.n_features,
                n_features_kept: report.n_kept,
                n_trees: trees,
                pruned: report.pruned,
                test_accuracy: accuracy,
                model_saved,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Tune {
            data,
            text_column,
            label_column,
            trees,
            min_features,
            max_features,
            experiment,
            output_dir,
            vectorize,
            split,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            let (split_data, feature_names, _, _, n_documents) = prepare_data(
                &data,
                &text_column,
                &label_column,
                &vectorize,
                &split,
                cli.seed,
            )?;

            // One full-width fit on the training side supplies the
            // importance ordering for every sweep point.
            let config = TrimConfig::new(trees)?
                .with_prune(false)
                .with_jobs(cli.jobs)
                .with_seed(cli.seed);
            let mut full = TrimmedForest::new(config);
            full.fit(&split_data.train_x, &split_data.train_y, &feature_names)
                .context("full-width training failed")?;

            let tune_config = TuneConfig::new(trees)?
                .with_range(min_features, max_features)
                .with_jobs(cli.jobs)
                .with_seed(cli.seed);
            let report = tune(
                &tune_config,
                full.importances()?,
                &split_data.train_x,
                &split_data.train_y,
                &split_data.test_x,
                &split_data.test_y,
            )
            .context("sweep failed")?;

            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            writer.write_tuning(&report)?;

            print!("{report}");
            let best = report.best();
            let output = TuneOutput {
                experiment,
                n_documents,
                n_points: report.len(),
                best_n_features: best.map(|p| p.n_features),
                best_accuracy: best.map(|p| p.accuracy),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::TopFeatures { model, top_n } => {
            let bundle = load_model(&model).context("failed to load model bundle")?;
            let ranking = bundle.pipeline.ranking()?;
            print!("{}", ranking.truncated(top_n));
        }

        Command::Predict {
            model,
            data,
            text_column,
            proba,
            experiment,
            output_dir,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            let bundle = load_model(&model).context("failed to load model bundle")?;
            info!(
                n_classes = bundle.encoder.n_classes(),
                n_features = bundle.vectorizer.n_features(),
                "model loaded"
            );

            let documents =
                read_documents(&data, &text_column).context("failed to read documents CSV")?;
            let x = bundle.vectorizer.transform(&documents);

            // The pipeline's inference methods take a label slice they
            // never read; hand them an all-zero one.
            let unused_labels = vec![0usize; x.len()];
            let ids = bundle
                .pipeline
                .predict(&x, &unused_labels)
                .context("prediction failed")?;
            let labels = bundle.encoder.decode(&ids)?;

            let probabilities = if proba {
                Some(
                    bundle
                        .pipeline
                        .predict_proba(&x, &unused_labels)
                        .context("probability prediction failed")?,
                )
            } else {
                None
            };

            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            writer.write_predictions(
                &labels,
                bundle.encoder.classes(),
                probabilities.as_deref(),
            )?;

            let output = PredictOutput {
                experiment,
                n_documents: documents.len(),
                n_classes: bundle.encoder.n_classes(),
                wrote_probabilities: proba,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
