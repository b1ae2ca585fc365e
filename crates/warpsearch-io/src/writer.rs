//! JSON result writer for window searches and held-out evaluations.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};
use warpsearch_dtw::Window;
use warpsearch_search::{ConfusionMatrix, SearchConfig, SearchResult};

use crate::IoError;
use crate::domain::{ClassIndex, ExperimentName};

/// Writes search and evaluation results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_search.json` and
/// `{experiment}_evaluate.json`.
#[derive(Debug)]
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write a search result to `{experiment}_search.json` and return its path.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_search(
        &self,
        config: &SearchConfig,
        max_window: Window,
        result: &SearchResult,
    ) -> Result<PathBuf, IoError> {
        let scores = result
            .scores
            .iter()
            .map(|s| ScoreEntry {
                window: s.window.radius(),
                errors: s.errors,
                error_rate: s.error_rate,
                elapsed_ms: s.elapsed.as_secs_f64() * 1e3,
            })
            .collect();

        let artifact = SearchArtifact {
            experiment: self.experiment.as_str(),
            strategy: config.strategy().name(),
            direction: config.direction().name(),
            greedy: config.greedy(),
            max_window: max_window.radius(),
            n_series: result.n,
            best_window: result.best_window.radius(),
            best_errors: result.best_errors,
            best_error_rate: result.best_error_rate,
            completed: result.completed,
            stop: result.stop.to_string(),
            elapsed_ms: result.elapsed().as_secs_f64() * 1e3,
            scores,
        };

        let path = self.path_for("search");
        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "search result written");
        Ok(path)
    }

    /// Write a held-out evaluation to `{experiment}_evaluate.json` and return its path.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_evaluation(
        &self,
        window: Window,
        confusion: &ConfusionMatrix,
        classes: &ClassIndex,
    ) -> Result<PathBuf, IoError> {
        let class_metrics = confusion
            .class_metrics()
            .into_iter()
            .map(|m| ClassEntry {
                class: classes.name(m.class).unwrap_or("?").to_string(),
                precision: m.precision,
                recall: m.recall,
                f1: m.f1,
                support: m.support,
            })
            .collect();

        let accuracy = confusion.accuracy();
        let artifact = EvaluateArtifact {
            experiment: self.experiment.as_str(),
            window: window.radius(),
            n_test: confusion.total(),
            accuracy,
            error_rate: 1.0 - accuracy,
            classes: classes.names(),
            confusion_matrix: confusion.as_rows(),
            class_metrics,
        };

        let path = self.path_for("evaluate");
        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "evaluation result written");
        Ok(path)
    }

    fn path_for(&self, kind: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{kind}.json", self.experiment.as_str()))
    }

    fn write_json(&self, path: &Path, artifact: &impl Serialize) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(artifact).expect("serialization cannot fail");
        fs::write(path, &json).map_err(|e| IoError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

// ── JSON artifacts ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct SearchArtifact<'a> {
    experiment: &'a str,
    strategy: &'static str,
    direction: &'static str,
    greedy: bool,
    max_window: usize,
    n_series: usize,
    best_window: usize,
    best_errors: usize,
    best_error_rate: f64,
    completed: bool,
    stop: String,
    elapsed_ms: f64,
    scores: Vec<ScoreEntry>,
}

#[derive(Serialize)]
struct ScoreEntry {
    window: usize,
    errors: usize,
    error_rate: f64,
    elapsed_ms: f64,
}

#[derive(Serialize)]
struct EvaluateArtifact<'a> {
    experiment: &'a str,
    window: usize,
    n_test: usize,
    accuracy: f64,
    error_rate: f64,
    classes: &'a [String],
    confusion_matrix: &'a [Vec<usize>],
    class_metrics: Vec<ClassEntry>,
}

#[derive(Serialize)]
struct ClassEntry {
    class: String,
    precision: f64,
    recall: f64,
    f1: f64,
    support: usize,
}
