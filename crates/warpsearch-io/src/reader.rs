//! Labelled CSV reader with full input validation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};
use warpsearch_dtw::TimeSeries;

use crate::IoError;
use crate::domain::LabeledDataset;

/// Reads labelled series, one per row: `label,v0,v1,...`.
///
/// Rows may differ in length. Trailing empty cells are ignored, so files padded
/// to a common width load as variable-length series.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::EmptyDataset`] | Zero data rows |
/// | [`IoError::EmptyRow`] | A row has a label but no values |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
#[derive(Debug, Clone)]
pub struct LabeledReader {
    path: PathBuf,
    delimiter: u8,
    has_headers: bool,
}

impl LabeledReader {
    /// Create a reader for a comma-separated file without a header row.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            delimiter: b',',
            has_headers: false,
        }
    }

    /// Set the field delimiter (for example `b'\t'` for the UCR archive).
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Skip a header row.
    #[must_use]
    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    /// Read and validate the file.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<LabeledDataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // Rows are allowed to differ in width; emptiness is checked per row below.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(self.has_headers)
            .delimiter(self.delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut class_names = Vec::new();
        let mut series = Vec::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| IoError::CsvParse {
                path: self.path.clone(),
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?;

            let Some(label) = record.get(0).filter(|l| !l.is_empty()) else {
                // Blank line.
                continue;
            };

            let cells: Vec<&str> = record.iter().skip(1).collect();
            let width = cells.iter().rposition(|c| !c.is_empty()).map_or(0, |i| i + 1);
            if width == 0 {
                return Err(IoError::EmptyRow {
                    path: self.path.clone(),
                    row_index,
                });
            }

            let mut values = Vec::with_capacity(width);
            for (col_index, raw) in cells[..width].iter().enumerate() {
                let value = raw
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| IoError::NonFiniteValue {
                        path: self.path.clone(),
                        row_index,
                        col_index,
                        raw: (*raw).to_string(),
                    })?;
                values.push(value);
            }

            // Values are non-empty and finite at this point.
            let ts = TimeSeries::new(values).map_err(|_| IoError::EmptyRow {
                path: self.path.clone(),
                row_index,
            })?;
            class_names.push(label.to_string());
            series.push(ts);
        }

        if series.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let min_len = series.iter().map(TimeSeries::len).min().unwrap_or(0);
        let max_len = series.iter().map(TimeSeries::len).max().unwrap_or(0);
        debug!(min_len, max_len, "series lengths");
        info!(n_series = series.len(), max_len, "dataset loaded");

        Ok(LabeledDataset {
            class_names,
            series,
        })
    }
}
