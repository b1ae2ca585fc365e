use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use warpsearch_dtw::TimeSeries;
use warpsearch_io::{ExperimentName, LabeledDataset, LabeledReader, ModelFile, ResultWriter};
use warpsearch_search::{ConfusionMatrix, Direction, SearchConfig, SequenceStore, Strategy};

#[derive(Parser)]
#[command(name = "warpsearch")]
#[command(about = "Best warping window search for 1-NN DTW classification")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel classification (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// How labelled CSV files are read and transformed.
#[derive(Args, Debug, Clone)]
struct InputArgs {
    /// Field delimiter of the input files
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Input files start with a header row
    #[arg(long, default_value_t = false)]
    header: bool,

    /// Z-normalize every series before DTW computation
    #[arg(long, default_value_t = false)]
    normalize: bool,

    /// Use derivative DTW (Keogh-Pazzani first derivative)
    #[arg(long, default_value_t = false)]
    derivative: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Find the warping window with the fewest leave-one-out errors
    Search {
        /// Path to the labelled training CSV
        #[arg(long)]
        train: PathBuf,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Largest window to evaluate (defaults to the longest series)
        #[arg(long)]
        max_window: Option<usize>,

        /// Search strategy: "naive", "cascading", "early-abandon" or "propagation"
        #[arg(long, default_value = "propagation")]
        strategy: String,

        /// Sweep direction: "asc" or "desc"
        #[arg(long, default_value = "desc")]
        direction: String,

        /// Stop as soon as the error count gets worse
        #[arg(long, default_value_t = false)]
        greedy: bool,

        /// Stop the sweep after this many seconds and report what was evaluated
        #[arg(long)]
        time_limit_secs: Option<f64>,

        /// Save the classifier at the best window to this path
        #[arg(long)]
        model: Option<PathBuf>,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Classify a labelled test set with a saved classifier
    Evaluate {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Path to the labelled test CSV
        #[arg(long)]
        test: PathBuf,

        /// Experiment name for output files
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        input: InputArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct SearchOutput {
    experiment: String,
    strategy: &'static str,
    n_series: usize,
    n_classes: usize,
    best_window: usize,
    best_errors: usize,
    best_error_rate: f64,
    windows_evaluated: usize,
    completed: bool,
    elapsed_secs: f64,
}

#[derive(Serialize)]
struct EvaluateOutput {
    experiment: String,
    window: usize,
    n_train: usize,
    n_test: usize,
    accuracy: f64,
}

fn read_dataset(path: &Path, input: &InputArgs) -> Result<LabeledDataset> {
    let delimiter = u8::try_from(input.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .with_context(|| format!("delimiter must be a single ASCII character, got {:?}", input.delimiter))?;
    LabeledReader::new(path)
        .with_delimiter(delimiter)
        .with_headers(input.header)
        .read()
        .with_context(|| format!("failed to read {}", path.display()))
}

fn preprocess_series(series: Vec<TimeSeries>, input: &InputArgs) -> Result<Vec<TimeSeries>> {
    let mut result = series;
    if input.normalize {
        result = warpsearch_dtw::z_normalize_batch(&result).context("z-normalization failed")?;
        info!(n = result.len(), "z-normalized series");
    }
    if input.derivative {
        result = warpsearch_dtw::derivative_batch(&result)
            .context("derivative computation failed")?;
        info!(n = result.len(), "computed derivative series");
    }
    Ok(result)
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

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Search {
            train,
            experiment,
            max_window,
            strategy,
            direction,
            greedy,
            time_limit_secs,
            model,
            output_dir,
            input,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;
            let strategy: Strategy = strategy.parse()?;
            let direction: Direction = direction.parse()?;
            let time_limit = time_limit_secs
                .map(Duration::try_from_secs_f64)
                .transpose()
                .context("time limit must be a non-negative number of seconds")?;

            // 1. Read and encode the training set
            let dataset = read_dataset(&train, &input)?;
            let classes = dataset.class_index();
            let labels = dataset.labels(&classes)?;
            let series = preprocess_series(dataset.series, &input)?;
            let store = SequenceStore::new(series, labels).context("invalid training set")?;
            info!(n_series = store.len(), n_classes = classes.len(), "training set ready");

            // 2. Search
            let config = SearchConfig::new()
                .with_strategy(strategy)
                .with_direction(direction)
                .with_greedy(greedy)
                .with_max_window(max_window)
                .with_time_limit(time_limit);
            let resolved = config.resolved_max_window(&store);
            let fitted = config.fit(store).context("window search failed")?;
            let result = fitted.result;

            // 3. Write artifacts
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            writer.write_search(&config, resolved, &result)?;

            let n_series = fitted.classifier.store().len();
            if let Some(path) = model {
                ModelFile::new(fitted.classifier, classes.clone())
                    .save(&path)
                    .context("failed to save model")?;
            }

            // 4. Print summary
            let output = SearchOutput {
                experiment,
                strategy: strategy.name(),
                n_series,
                n_classes: classes.len(),
                best_window: result.best_window.radius(),
                best_errors: result.best_errors,
                best_error_rate: result.best_error_rate,
                windows_evaluated: result.scores.len(),
                completed: result.completed,
                elapsed_secs: result.elapsed().as_secs_f64(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Evaluate {
            model,
            test,
            experiment,
            output_dir,
            input,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            // 1. Load model
            let ModelFile {
                classifier,
                classes,
            } = ModelFile::load(&model).context("failed to load model")?;
            info!(
                n_train = classifier.store().len(),
                window = %classifier.window(),
                "classifier loaded"
            );

            // 2. Read the test set with the training class names
            let dataset = read_dataset(&test, &input)?;
            let truth = dataset
                .labels(&classes)
                .context("test set has a class the model was not trained on")?;
            let series = preprocess_series(dataset.series, &input)?;

            // 3. Classify
            let predicted = classifier
                .classify_batch(&series)
                .context("classification failed")?;
            let confusion = ConfusionMatrix::from_labels(&truth, &predicted, classes.len())?;
            info!(accuracy = confusion.accuracy(), "evaluation complete");

            // 4. Write evaluation JSON
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            writer.write_evaluation(classifier.window(), &confusion, &classes)?;

            // 5. Print summary
            let output = EvaluateOutput {
                experiment,
                window: classifier.window().radius(),
                n_train: classifier.store().len(),
                n_test: confusion.total(),
                accuracy: confusion.accuracy(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
