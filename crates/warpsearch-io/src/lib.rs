//! File I/O, validation, and serialization for the warpsearch pipeline.

mod domain;
mod error;
mod model;
mod reader;
mod writer;

pub use domain::{ClassIndex, ExperimentName, LabeledDataset};
pub use error::IoError;
pub use model::ModelFile;
pub use reader::LabeledReader;
pub use writer::ResultWriter;
