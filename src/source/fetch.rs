//! HTTP download of remote datasets.

use crate::source::buffer_capacity;
use crate::source::error::{DatasetError, Result};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

/// HTTP basic-auth credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read `KAGGLE_USERNAME` / `KAGGLE_KEY` from the environment.
    pub fn from_env() -> Option<Self> {
        let username = std::env::var("KAGGLE_USERNAME").ok()?;
        let key = std::env::var("KAGGLE_KEY").ok()?;
        if username.is_empty() || key.is_empty() {
            return None;
        }
        Some(Self { username, key })
    }
}

/// Download behaviour.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub retries: usize,
    pub show_progress: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            retries: 3,
            show_progress: false,
        }
    }
}

/// Download `url`, retrying transient failures with linear backoff.
pub async fn download_with_retries(
    url: &str,
    credentials: Option<&Credentials>,
    options: &FetchOptions,
) -> Result<Vec<u8>> {
    let client = Client::builder().timeout(options.timeout).build()?;

    let mut attempt = 0;
    loop {
        match download(&client, url, credentials, options.show_progress).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) if attempt < options.retries && e.is_retryable() => {
                attempt += 1;
                let backoff = Duration::from_secs(attempt as u64);
                warn!(
                    "Download attempt {} of {} failed: {}. Retrying in {}s",
                    attempt,
                    options.retries + 1,
                    e,
                    backoff.as_secs()
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Stream a single download into memory.
pub async fn download(
    client: &Client,
    url: &str,
    credentials: Option<&Credentials>,
    show_progress: bool,
) -> Result<Vec<u8>> {
    info!("Downloading dataset: {}", url);

    let mut request = client.get(url);
    if let Some(creds) = credentials {
        request = request.basic_auth(&creds.username, Some(&creds.key));
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DatasetError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let total = response.content_length();
    let progress = show_progress.then(|| progress_bar(total));

    let mut data = Vec::with_capacity(buffer_capacity(total.unwrap_or(0)));
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        data.extend_from_slice(&chunk);
        if let Some(ref pb) = progress {
            pb.set_position(data.len() as u64);
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message("Download complete");
    }

    debug!("Downloaded {} bytes from {}", data.len(), url);
    Ok(data)
}

fn progress_bar(total: Option<u64>) -> ProgressBar {
    let pb = ProgressBar::new(total.unwrap_or(0));
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_key() {
        let creds = Credentials {
            username: "grammy".to_string(),
            key: "secret-key".to_string(),
        };
        let debug = format!("{:?}", creds);
        assert!(debug.contains("grammy"));
        assert!(!debug.contains("secret-key"));
    }

    #[test]
    fn test_status_retryability() {
        let server_error = DatasetError::Status {
            url: "https://example.com".to_string(),
            status: 503,
        };
        let not_found = DatasetError::Status {
            url: "https://example.com".to_string(),
            status: 404,
        };
        assert!(server_error.is_retryable());
        assert!(!not_found.is_retryable());
        assert!(!DatasetError::MissingCredentials("x".to_string()).is_retryable());
    }

    #[tokio::test]
    async fn test_oversized_content_length_is_an_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1099511627776000\r\n\r\nyear\n")
                .await;
            let _ = socket.shutdown().await;
        });

        let options = FetchOptions {
            timeout: Duration::from_secs(5),
            retries: 0,
            show_progress: false,
        };
        let result =
            download_with_retries(&format!("http://{}/grammys.csv", addr), None, &options).await;
        assert!(matches!(result, Err(DatasetError::Http(_))));
    }

    #[tokio::test]
    async fn test_download_connection_refused_is_http_error() {
        let options = FetchOptions {
            timeout: Duration::from_secs(2),
            retries: 0,
            show_progress: false,
        };
        let err = download_with_retries("http://127.0.0.1:9/grammys.csv", None, &options)
            .await
            .unwrap_err();
        assert!(matches!(err, DatasetError::Http(_)));
    }
}
