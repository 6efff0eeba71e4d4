use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolutionError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("uuid table has no entry for participant {0}")]
    Missing(String),
    #[error("uuid table kind '{0}' needs engage-sync's `{0}` feature")]
    Unsupported(&'static str),
}

impl ResolutionError {
    /// Whether retrying the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            #[cfg(feature = "http")]
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Server { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
