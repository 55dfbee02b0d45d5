//! Error types for dataset loading.

use std::path::PathBuf;
use thiserror::Error;

/// Why a dataset could not be supplied.
///
/// Every variant means the dataset is unavailable; aggregation problems
/// never surface here.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download of {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No CSV file found in {0}")]
    NoCsvInArchive(String),

    #[error("KAGGLE_USERNAME and KAGGLE_KEY environment variables are required to download {0}")]
    MissingCredentials(String),

    #[error("Unsupported dataset source: {0}")]
    UnsupportedSource(String),

    #[error("Dataset loading task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl DatasetError {
    /// Whether a download attempt is worth repeating.
    pub fn is_retryable(&self) -> bool {
        match self {
            DatasetError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            DatasetError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Result type alias for dataset loading.
pub type Result<T> = std::result::Result<T, DatasetError>;
