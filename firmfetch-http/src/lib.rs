//! Minimal HTTP download client with safe logging and an optional retry budget.
//!
//! - Streams response bodies straight to disk (`<dest>.part`, renamed on success)
//! - Reports progress as `(downloaded, total)` where `total` comes from `Content-Length`
//! - Retries 429/5xx and network failures with exponential backoff and
//!   `Retry-After` support, but only when a retry budget is configured
//!
//! Example (no_run):
//! ```rust,no_run
//! # async fn demo() -> Result<(), firmfetch_http::HttpError> {
//! use std::path::Path;
//!
//! let client = firmfetch_http::HttpClient::new()?;
//! let bytes = client
//!     .download_to("https://dl.example.com/fw.BIN", Path::new("downloads/fw.BIN"), &mut |p| {
//!         if let Some(pct) = p.percent() {
//!             eprint!("\r{pct:.1}%");
//!         }
//!     })
//!     .await?;
//! # let _ = bytes;
//! # Ok(()) }
//! ```
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, retries, and final errors. Query values of well-known
//! secret parameters are redacted.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Url};

pub use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::time::sleep;

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("client build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned error {status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),
}

impl HttpError {
    fn is_retriable(&self) -> bool {
        match self {
            HttpError::Network(_) => true,
            HttpError::Api { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}

// ==============================
// Progress
// ==============================

/// Snapshot handed to the progress callback after every chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub downloaded: u64,
    pub total: Option<u64>,
}

impl Progress {
    /// Percentage complete, when the server announced a non-zero length.
    ///
    /// ```
    /// use firmfetch_http::Progress;
    ///
    /// let p = Progress { downloaded: 512, total: Some(2048) };
    /// assert_eq!(p.percent(), Some(25.0));
    /// assert_eq!(Progress { downloaded: 1, total: None }.percent(), None);
    /// ```
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(total) if total > 0 => Some(self.downloaded as f64 / total as f64 * 100.0),
            _ => None,
        }
    }
}

/// Something that can fetch a URL into a local file.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url` into `dest`, returning the number of bytes written.
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut (dyn FnMut(Progress) + Send),
    ) -> Result<u64, HttpError>;
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    /// Longest the socket may sit idle while connecting or reading.
    pub read_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client with a 30s read timeout and no retries.
    ///
    /// ```no_run
    /// use firmfetch_http::{HttpClient, HttpError};
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new()?;
    /// assert_eq!(client.read_timeout, Duration::from_secs(30));
    /// assert_eq!(client.max_retries, 0);
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new() -> Result<Self, HttpError> {
        Self::with_read_timeout(Duration::from_secs(30))
    }

    /// Construct a client whose connect and per-read timeout is `dur`.
    ///
    /// The timeout bounds each wait for bytes, not the whole transfer, so a
    /// large package keeps streaming as long as data keeps arriving.
    pub fn with_read_timeout(dur: Duration) -> Result<Self, HttpError> {
        let inner = Client::builder()
            .connect_timeout(dur.min(Duration::from_secs(10)))
            .read_timeout(dur)
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            inner,
            read_timeout: dur,
            max_retries: 0,
        })
    }

    /// Override the retry budget (0 = fail on first error).
    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    /// Stream `url` into `dest`.
    ///
    /// Bytes land in `<dest>.part` first; the file is renamed to `dest` only
    /// after the body completed, so a failed download never leaves a file at
    /// `dest`.
    pub async fn download_to(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut (dyn FnMut(Progress) + Send),
    ) -> Result<u64, HttpError> {
        let url = Url::parse(url).map_err(|e| HttpError::Url(e.to_string()))?;
        let part = part_path(dest);

        let mut attempt = 0usize;
        loop {
            match self.download_once(&url, &part, progress).await {
                Ok(bytes) => {
                    tokio::fs::rename(&part, dest).await?;
                    return Ok(bytes);
                }
                Err((err, retry_after)) => {
                    let _ = tokio::fs::remove_file(&part).await;
                    if err.is_retriable() && attempt < self.max_retries {
                        attempt += 1;
                        let exp = Duration::from_millis(200u64.saturating_mul(1 << (attempt - 1)));
                        let delay = retry_after.map(Duration::from_secs).unwrap_or(exp);
                        tracing::warn!(
                            host_path = %host_path(&url),
                            attempt,
                            max_retries = self.max_retries,
                            backoff_ms = delay.as_millis() as u64,
                            error = %err,
                            "http.retrying"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    tracing::warn!(
                        host_path = %host_path(&url),
                        attempt,
                        error = %err,
                        "http.error"
                    );
                    return Err(err);
                }
            }
        }
    }

    /// One request; on failure also returns the `Retry-After` hint, if any.
    async fn download_once(
        &self,
        url: &Url,
        part: &Path,
        progress: &mut (dyn FnMut(Progress) + Send),
    ) -> Result<u64, (HttpError, Option<u64>)> {
        tracing::debug!(
            host_path = %host_path(url),
            query = ?redact_query(url),
            read_timeout_ms = self.read_timeout.as_millis() as u64,
            "http.request.start"
        );

        let t0 = std::time::Instant::now();
        let resp = self
            .inner
            .get(url.clone())
            .send()
            .await
            .map_err(|e| (HttpError::Network(e.to_string()), None))?;

        let status = resp.status();
        let total = resp.content_length();
        tracing::debug!(
            %status,
            content_length = ?total,
            duration_ms = t0.elapsed().as_millis() as u64,
            "http.response.headers"
        );

        if !status.is_success() {
            let retry_after = retry_after_delay_secs(resp.headers());
            let body = resp.bytes().await.unwrap_or_default();
            return Err((
                HttpError::Api {
                    status,
                    message: snip_body(&body),
                },
                retry_after,
            ));
        }

        let mut file = tokio::fs::File::create(part)
            .await
            .map_err(|e| (HttpError::Io(e), None))?;
        let mut stream = resp.bytes_stream();
        let mut downloaded = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| (HttpError::Network(e.to_string()), None))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| (HttpError::Io(e), None))?;
            downloaded += chunk.len() as u64;
            progress(Progress { downloaded, total });
        }
        file.flush().await.map_err(|e| (HttpError::Io(e), None))?;

        tracing::debug!(
            bytes = downloaded,
            duration_ms = t0.elapsed().as_millis() as u64,
            "http.response.complete"
        );
        Ok(downloaded)
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut (dyn FnMut(Progress) + Send),
    ) -> Result<u64, HttpError> {
        self.download_to(url, dest, progress).await
    }
}

// ==============================
// Helpers
// ==============================

/// Temporary sibling of `dest` that receives bytes while downloading.
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

fn host_path(url: &Url) -> String {
    format!("{}{}", url.host_str().unwrap_or("-"), url.path())
}

fn redact_query(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .map(|(k, v)| {
            let k = k.to_string();
            let is_secret = matches!(
                k.to_ascii_lowercase().as_str(),
                "access_token"
                    | "authorization"
                    | "auth"
                    | "key"
                    | "api_key"
                    | "token"
                    | "secret"
                    | "signature"
            );
            let v = if is_secret {
                "<redacted>".to_string()
            } else {
                v.to_string()
            };
            (k, v)
        })
        .collect()
}

fn retry_after_delay_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .parse()
        .ok()
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > 200 {
        let mut cut = 200;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}
