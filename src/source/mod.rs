//! Dataset sources.
//!
//! This module locates and loads the nominations dataset from a local
//! file or directory, an http(s) URL, or a Kaggle dataset slug, and keeps
//! the loaded snapshot cached for the lifetime of the process.

pub mod cache;
pub mod decode;
pub mod error;
pub mod fetch;

pub use cache::DatasetCache;
pub use error::DatasetError;

use crate::config::SourceConfig;
use crate::models::Dataset;
use error::Result;
use fetch::{Credentials, FetchOptions};
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const KAGGLE_PREFIX: &str = "kaggle:";
const KAGGLE_DOWNLOAD_URL: &str = "https://www.kaggle.com/api/v1/datasets/download";

/// Upper bound on buffer space reserved from a claimed length.
const MAX_PREALLOCATION: u64 = 64 << 20;

/// Where a dataset lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    /// Local `.csv`, `.zip` or `.json` file, or a directory holding a CSV.
    Local(PathBuf),
    /// Plain http(s) URL.
    Remote(String),
    /// Kaggle dataset, downloaded with `KAGGLE_USERNAME` / `KAGGLE_KEY`.
    Kaggle { owner: String, slug: String },
}

impl DatasetSource {
    /// Parse a location string.
    pub fn parse(location: &str) -> Result<Self> {
        let location = location.trim();

        if let Some(rest) = location.strip_prefix(KAGGLE_PREFIX) {
            return match rest.split_once('/') {
                Some((owner, slug)) if !owner.is_empty() && !slug.is_empty() && !slug.contains('/') => {
                    Ok(DatasetSource::Kaggle {
                        owner: owner.to_string(),
                        slug: slug.to_string(),
                    })
                }
                _ => Err(DatasetError::UnsupportedSource(location.to_string())),
            };
        }

        if location.starts_with("http://") || location.starts_with("https://") {
            return Ok(DatasetSource::Remote(location.to_string()));
        }

        if location.is_empty() || location.contains("://") {
            return Err(DatasetError::UnsupportedSource(location.to_string()));
        }

        Ok(DatasetSource::Local(PathBuf::from(location)))
    }

    /// Download URL for remote sources.
    pub fn url(&self) -> Option<String> {
        match self {
            DatasetSource::Local(_) => None,
            DatasetSource::Remote(url) => Some(url.clone()),
            DatasetSource::Kaggle { owner, slug } => {
                Some(format!("{}/{}/{}", KAGGLE_DOWNLOAD_URL, owner, slug))
            }
        }
    }
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSource::Local(path) => write!(f, "{}", path.display()),
            DatasetSource::Remote(url) => write!(f, "{}", url),
            DatasetSource::Kaggle { owner, slug } => write!(f, "{}{}/{}", KAGGLE_PREFIX, owner, slug),
        }
    }
}

/// Returns true if `location` names a network source.
pub fn is_remote(location: &str) -> bool {
    let location = location.trim();
    location.starts_with("http://")
        || location.starts_with("https://")
        || location.starts_with(KAGGLE_PREFIX)
}

/// How to load a dataset.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub fetch: FetchOptions,
}

impl From<&SourceConfig> for LoadOptions {
    fn from(config: &SourceConfig) -> Self {
        Self {
            fetch: FetchOptions {
                timeout: Duration::from_secs(config.timeout_seconds),
                retries: config.retries,
                show_progress: false,
            },
        }
    }
}

impl LoadOptions {
    /// Enable or disable the download progress bar.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.fetch.show_progress = show_progress;
        self
    }
}

/// Load a dataset from its source.
pub async fn load_dataset(source: &DatasetSource, options: &LoadOptions) -> Result<Dataset> {
    let start = Instant::now();

    let dataset = match source {
        DatasetSource::Local(path) => {
            let path = path.clone();
            tokio::task::spawn_blocking(move || decode::load_path(&path)).await??
        }
        DatasetSource::Remote(url) => {
            let bytes = fetch::download_with_retries(url, None, &options.fetch).await?;
            decode_downloaded(bytes, url.clone()).await?
        }
        DatasetSource::Kaggle { .. } => {
            let url = source.url().unwrap_or_default();
            let credentials = Credentials::from_env()
                .ok_or_else(|| DatasetError::MissingCredentials(source.to_string()))?;
            let bytes = fetch::download_with_retries(&url, Some(&credentials), &options.fetch).await?;
            decode_downloaded(bytes, url).await?
        }
    };

    info!(
        "Loaded {} rows with {} columns from {} in {:.1}s",
        dataset.row_count(),
        dataset.columns().len(),
        source,
        start.elapsed().as_secs_f64()
    );
    debug!("Columns: {:?}", dataset.columns());

    Ok(dataset)
}

/// Initial buffer capacity for a payload claiming `claimed` bytes.
///
/// Claimed lengths come from headers and are not trusted; the buffer grows
/// past the cap as data actually arrives.
pub(crate) fn buffer_capacity(claimed: u64) -> usize {
    claimed.min(MAX_PREALLOCATION) as usize
}

async fn decode_downloaded(bytes: Vec<u8>, name: String) -> Result<Dataset> {
    tokio::task::spawn_blocking(move || decode::decode_bytes(&bytes, &name)).await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local() {
        assert_eq!(
            DatasetSource::parse("data/grammys.csv").unwrap(),
            DatasetSource::Local(PathBuf::from("data/grammys.csv"))
        );
    }

    #[test]
    fn test_parse_remote() {
        let source = DatasetSource::parse("https://example.com/grammys.zip").unwrap();
        assert_eq!(source, DatasetSource::Remote("https://example.com/grammys.zip".to_string()));
        assert_eq!(source.url().as_deref(), Some("https://example.com/grammys.zip"));
    }

    #[test]
    fn test_parse_kaggle() {
        let source =
            DatasetSource::parse("kaggle:johnpendenque/grammy-winners-and-nominees-from-1965-to-2024")
                .unwrap();
        assert_eq!(
            source.url().as_deref(),
            Some("https://www.kaggle.com/api/v1/datasets/download/johnpendenque/grammy-winners-and-nominees-from-1965-to-2024")
        );
        assert!(source.to_string().starts_with("kaggle:johnpendenque/"));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(DatasetSource::parse("kaggle:onlyowner").is_err());
        assert!(DatasetSource::parse("kaggle:/slug").is_err());
        assert!(DatasetSource::parse("ftp://example.com/data.csv").is_err());
        assert!(DatasetSource::parse("  ").is_err());
    }

    #[test]
    fn test_buffer_capacity_is_capped() {
        assert_eq!(buffer_capacity(0), 0);
        assert_eq!(buffer_capacity(1024), 1024);
        assert_eq!(buffer_capacity(1_099_511_627_776_000), 64 << 20);
        assert_eq!(buffer_capacity(u64::MAX), 64 << 20);
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/a.csv"));
        assert!(is_remote("kaggle:a/b"));
        assert!(!is_remote("./a.csv"));
    }

    #[tokio::test]
    async fn test_load_local_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grammys.csv");
        std::fs::write(&path, "year,category\n1999,Pop\n2001,Rock\n").unwrap();

        let dataset = load_dataset(&DatasetSource::Local(path), &LoadOptions::default())
            .await
            .unwrap();
        assert_eq!(dataset.row_count(), 2);
    }

    #[tokio::test]
    async fn test_kaggle_requires_credentials() {
        if Credentials::from_env().is_some() {
            return;
        }
        let source = DatasetSource::parse("kaggle:owner/slug").unwrap();
        let err = load_dataset(&source, &LoadOptions::default()).await.unwrap_err();
        assert!(matches!(err, DatasetError::MissingCredentials(_)));
    }
}
