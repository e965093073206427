//! HTTP fetching with exponential backoff retry logic.
//!
//! The producers never talk to `reqwest` directly; they go through this
//! module so that retries, timeouts and the User-Agent are handled in one
//! place.
//!
//! # Architecture
//!
//! - [`FetchAsync`]: Core trait defining "give me the body of this URL"
//! - [`HttpFetch`]: `reqwest`-backed implementation
//! - [`RetryFetch`]: Decorator that adds retry logic to any `FetchAsync` implementation
//!
//! # Retry Strategy
//!
//! - Configurable number of retry attempts
//! - Exponential backoff starting at the configured base delay
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use rand::{Rng, rng};
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderValue};
use std::fmt;
use std::ops::RangeInclusive;
use std::time::{Duration as StdDuration, Instant};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
}

/// What the caller expects back; sets the `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    Html,
    Json,
    Feed,
}

impl Accept {
    fn header(&self) -> HeaderValue {
        HeaderValue::from_static(match self {
            Accept::Html => "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            Accept::Json => "application/json",
            Accept::Feed => "application/rss+xml,application/xml;q=0.9,text/xml;q=0.8",
        })
    }
}

/// Trait for async body fetching.
///
/// Implementors download a URL and return its body as text. This abstraction
/// allows decorators (like retry logic) and alternative transports.
pub trait FetchAsync {
    async fn fetch(&self, url: &str, accept: Accept) -> Result<String, FetchError>;
}

/// `reqwest`-backed fetcher. Any non-2xx status is an error.
#[derive(Debug, Clone)]
pub struct HttpFetch {
    client: Client,
}

impl HttpFetch {
    pub fn new(user_agent: &str, timeout: StdDuration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl FetchAsync for HttpFetch {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str, accept: Accept) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let request_error = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .header(ACCEPT, accept.header())
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(request_error)?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            bytes = body.len(),
            "Fetched body"
        );
        Ok(body)
    }
}

/// Wrapper that adds exponential backoff retry logic to any [`FetchAsync`] implementation.
///
/// # Backoff Strategy
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryFetch<T> {
    /// The underlying fetcher to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryFetch<T>
where
    T: FetchAsync,
{
    /// Create a new retry wrapper around an existing [`FetchAsync`] implementation.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let http = HttpFetch::new("fato_ou_fake/0.1", Duration::from_secs(20))?;
    /// let fetcher = RetryFetch::new(http, 3, Duration::from_secs(1));
    /// ```
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> FetchAsync for RetryFetch<T>
where
    T: FetchAsync,
{
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str, accept: Accept) -> Result<String, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.fetch(url, accept).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries || !is_retryable(&e) {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "fetch() giving up"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let shift = (attempt - 1).min(16) as u32;
                    let delay = self
                        .base_delay
                        .saturating_mul(1 << shift)
                        .min(self.max_delay);
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "fetch() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Client errors other than rate limiting will not change on retry.
fn is_retryable(e: &FetchError) -> bool {
    match e {
        FetchError::Client(_) => false,
        FetchError::Request { .. } => true,
        FetchError::Status { status, .. } => *status == 429 || *status >= 500,
    }
}

/// Sleep a random duration in `range_ms` between two article requests.
pub async fn polite_pause(range_ms: &RangeInclusive<u64>) {
    if range_ms.is_empty() || *range_ms.end() == 0 {
        return;
    }
    let ms = rng().random_range(range_ms.clone());
    sleep(StdDuration::from_millis(ms)).await;
}
