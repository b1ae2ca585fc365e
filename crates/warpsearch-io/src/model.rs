//! Trained classifier files via bincode.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use warpsearch_dtw::{TimeSeries, Window};
use warpsearch_search::{ClassLabel, NearestNeighbor, SearchError, SequenceStore};

use crate::IoError;
use crate::domain::ClassIndex;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Versioned envelope for the serialized classifier.
#[derive(Serialize, Deserialize)]
struct ModelEnvelope {
    format_version: u32,
    window: usize,
    class_names: Vec<String>,
    labels: Vec<usize>,
    series: Vec<Vec<f64>>,
}

/// A 1-NN DTW classifier together with the names of its classes.
#[derive(Debug, Clone)]
pub struct ModelFile {
    /// The classifier at its chosen window.
    pub classifier: NearestNeighbor,
    /// Class names, indexed by label.
    pub classes: ClassIndex,
}

impl ModelFile {
    /// Bundle a classifier with its class names.
    #[must_use]
    pub fn new(classifier: NearestNeighbor, classes: ClassIndex) -> Self {
        Self {
            classifier,
            classes,
        }
    }

    /// Save the model to a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeModel`] | bincode encoding failed |
    /// | [`IoError::WriteModel`] | file write failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let path = path.as_ref();
        let store = self.classifier.store();

        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            window: self.classifier.window().radius(),
            class_names: self.classes.names().to_vec(),
            labels: store.labels().iter().map(|l| l.index()).collect(),
            series: store.series().iter().map(|s| s.as_slice().to_vec()).collect(),
        };

        let bytes =
            bincode::serialize(&envelope).map_err(|e| IoError::SerializeModel { source: e })?;

        std::fs::write(path, &bytes).map_err(|e| IoError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(
            size_bytes = bytes.len(),
            n_series = store.len(),
            window = envelope.window,
            "model saved"
        );
        Ok(())
    }

    /// Load a model from a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::ReadModel`] | file read failed |
    /// | [`IoError::DeserializeModel`] | bincode decoding failed |
    /// | [`IoError::UnsupportedVersion`] | format version mismatch |
    /// | [`IoError::InvalidModel`] | decoded series or labels are not a valid training set |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| IoError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        let envelope: ModelEnvelope =
            bincode::deserialize(&bytes).map_err(|e| IoError::DeserializeModel {
                path: path.to_path_buf(),
                source: e,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(IoError::UnsupportedVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        let invalid = |source: SearchError| IoError::InvalidModel {
            path: path.to_path_buf(),
            source,
        };
        let series = envelope
            .series
            .into_iter()
            .map(TimeSeries::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| invalid(e.into()))?;
        let labels = envelope.labels.into_iter().map(ClassLabel::new).collect();
        let store = SequenceStore::new(series, labels).map_err(invalid)?;

        debug!(
            n_series = store.len(),
            n_classes = envelope.class_names.len(),
            window = envelope.window,
            "model loaded"
        );

        let classes = ClassIndex::from_names(envelope.class_names.iter().map(String::as_str));
        let classifier = NearestNeighbor::new(store, Window::new(envelope.window));
        Ok(Self::new(classifier, classes))
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn model() -> ModelFile {
        let series = vec![
            TimeSeries::new(vec![0.0, 1.0, 0.0]).unwrap(),
            TimeSeries::new(vec![5.0, 5.0]).unwrap(),
        ];
        let labels = vec![ClassLabel::new(0), ClassLabel::new(1)];
        let store = SequenceStore::new(series, labels).unwrap();
        ModelFile::new(
            NearestNeighbor::new(store, Window::new(2)),
            ClassIndex::from_names(["low", "high"]),
        )
    }

    #[test]
    fn save_then_load_restores_classifier() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.bin");
        let original = model();
        original.save(&path).unwrap();

        let loaded = ModelFile::load(&path).unwrap();
        assert_eq!(loaded.classes, original.classes);
        assert_eq!(loaded.classifier.window(), Window::new(2));
        assert_eq!(loaded.classifier.store().labels(), original.classifier.store().labels());
        assert_eq!(loaded.classifier.store().series(), original.classifier.store().series());
    }

    #[test]
    fn load_nonexistent_file_error() {
        let err = ModelFile::load("/nonexistent/model.bin").unwrap_err();
        assert!(matches!(err, IoError::ReadModel { .. }));
    }

    #[test]
    fn load_corrupt_file_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.bin");
        std::fs::write(&path, b"not a model").unwrap();
        let err = ModelFile::load(&path).unwrap_err();
        assert!(matches!(err, IoError::DeserializeModel { .. }));
    }

    #[test]
    fn load_rejects_other_format_versions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("future.bin");
        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION + 1,
            window: 0,
            class_names: vec![],
            labels: vec![],
            series: vec![],
        };
        std::fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();
        let err = ModelFile::load(&path).unwrap_err();
        assert!(matches!(err, IoError::UnsupportedVersion { found: 2, expected: 1, .. }));
    }

    #[test]
    fn load_rejects_an_empty_training_set() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.bin");
        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            window: 0,
            class_names: vec![],
            labels: vec![],
            series: vec![],
        };
        std::fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();
        let err = ModelFile::load(&path).unwrap_err();
        assert!(matches!(err, IoError::InvalidModel { .. }));
    }
}
