use std::path::PathBuf;

use thiserror::Error;

/// Failures reading labels or required fields out of a traced record.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("code id '{code_id}' not found in code scheme '{scheme_id}'")]
    UnknownCode { scheme_id: String, code_id: String },

    #[error("record is missing required field '{0}'")]
    MissingField(String),

    #[error("malformed labels in field '{field}': {source}")]
    Malformed {
        field: String,
        source: serde_json::Error,
    },
}

/// Failures loading the pipeline configuration or one of its code schemes.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid pipeline configuration {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid code scheme {}: {source}", path.display())]
    Scheme {
        path: PathBuf,
        source: serde_json::Error,
    },
}
