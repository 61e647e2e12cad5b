//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made against the WordPress API:
//! - Building HTTP clients with a proper user agent and timeouts
//! - Single request attempts with error classification
//! - Retrying transient failures with exponential backoff
//! - Recognizing the end-of-range status that terminates pagination

use crate::config::Config;
use crate::crawler::retry::RetryPolicy;
use crate::{FetchError, FetchResult, TransientError};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Header carrying the total number of items of a collection
pub const TOTAL_ITEMS_HEADER: &str = "X-WP-Total";

/// Header carrying the total number of pages of a collection
pub const TOTAL_PAGES_HEADER: &str = "X-WP-TotalPages";

/// WordPress answers requests past the last page with this status
pub const END_OF_RANGE_STATUS: StatusCode = StatusCode::BAD_REQUEST;

/// A successful response, fully read within the attempt's timeout
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// The requested URL
    pub url: String,

    /// HTTP status code
    pub status: u16,

    /// Value of `X-WP-Total`, if present and numeric
    pub total_items: Option<u64>,

    /// Value of `X-WP-TotalPages`, if present and numeric
    pub total_pages: Option<u32>,

    /// Response body
    pub body: String,
}

impl FetchedResponse {
    /// Decodes the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> FetchResult<T> {
        serde_json::from_str(&self.body).map_err(|source| FetchError::Decode {
            url: self.url.clone(),
            source,
        })
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use photofeed::config::Config;
/// use photofeed::crawler::build_http_client;
///
/// let config = Config::for_base_url("https://example.com/wp-json/wp/v2");
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    let timeout = config.fetch.timeout();

    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP client that retries transient failures
///
/// Stateless apart from its configuration; cloning is cheap.
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: Client,
    policy: RetryPolicy,
}

impl FetchClient {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Builds a client and retry policy from the configuration
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            build_http_client(config)?,
            RetryPolicy::from_config(&config.fetch),
        ))
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches a URL, retrying per the policy
    ///
    /// # Returns
    ///
    /// * `Ok(Some(response))` - A 2xx response
    /// * `Ok(None)` - The upstream signalled the end of a paginated range
    /// * `Err(TransientError)` - Every allowed attempt failed
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 400 | Immediate → end of range |
    /// | Other non-2xx | Retry with backoff |
    /// | Timeout | Retry with backoff |
    /// | Connection error | Retry with backoff |
    pub async fn fetch(&self, url: &Url) -> Result<Option<FetchedResponse>, TransientError> {
        let mut attempt = 1;

        loop {
            tracing::debug!(
                "Fetching {} (attempt {}/{})",
                url,
                attempt,
                self.policy.max_attempts
            );

            let error = match self.fetch_once(url).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            if !self.policy.should_retry(attempt, &error) {
                return Err(TransientError {
                    url: url.to_string(),
                    attempts: attempt,
                    source: error,
                });
            }

            tracing::warn!(
                "Attempt {}/{} failed: {}",
                attempt,
                self.policy.max_attempts,
                error
            );

            attempt += 1;
            if let Some(delay) = self.policy.delay_before(attempt) {
                tracing::debug!("Retrying {} in {:?}", url, delay);
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// Performs exactly one request attempt
    pub async fn fetch_once(&self, url: &Url) -> FetchResult<Option<FetchedResponse>> {
        let url_string = url.to_string();

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(&url_string, e))?;

        let status = response.status();

        if status == END_OF_RANGE_STATUS {
            tracing::debug!("End of range reached at {}", url_string);
            return Ok(None);
        }

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url_string,
                status: status.as_u16(),
            });
        }

        let total_items = header_number(response.headers(), TOTAL_ITEMS_HEADER);
        let total_pages = header_number(response.headers(), TOTAL_PAGES_HEADER);

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url_string.clone(),
                }
            } else {
                FetchError::Body {
                    url: url_string.clone(),
                    source: e,
                }
            }
        })?;

        Ok(Some(FetchedResponse {
            url: url_string,
            status: status.as_u16(),
            total_items,
            total_pages,
            body,
        }))
    }
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            source: error,
        }
    }
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}
