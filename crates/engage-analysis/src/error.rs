use std::path::PathBuf;

use engage_core::LabelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Label(#[from] LabelError),

    #[error("column view has no column '{0}'")]
    MissingColumn(String),
}
