//! Photofeed: a resilient gallery feed over a WordPress REST API
//!
//! This crate crawls a paginated WordPress post listing, resolves one
//! representative image per post, sanitizes the embedded markup and serves
//! the resulting gallery through a time-boxed cache that falls back to stale
//! data when the upstream misbehaves.

pub mod cache;
pub mod config;
pub mod content;
pub mod crawler;
pub mod model;
pub mod output;

use thiserror::Error;

/// Main error type for Photofeed operations
#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// A single failed request attempt
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP error for {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("Unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body from {url}: {source}")]
    Body { url: String, source: reqwest::Error },

    #[error("Failed to decode JSON from {url}: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },

    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] ::url::ParseError),
}

/// Raised once every attempt allowed by the retry policy has failed
#[derive(Debug, Error)]
#[error("Giving up on {url} after {attempts} attempt(s): {source}")]
pub struct TransientError {
    pub url: String,
    pub attempts: u32,
    #[source]
    pub source: FetchError,
}

/// Errors that abort a whole crawl
///
/// Only the first page is allowed to fail the crawl; later pages stop it
/// early and keep what was accumulated.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("First page could not be fetched: {0}")]
    FirstPage(#[source] TransientError),

    #[error("First page could not be decoded: {0}")]
    MalformedFirstPage(#[source] FetchError),

    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(#[from] ::url::ParseError),
}

/// Errors that drop a single item from the aggregate
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("Malformed item: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Item {id} has an unparseable {field}: {value:?}")]
    InvalidDate {
        id: u64,
        field: &'static str,
        value: String,
    },

    #[error("No image found for item {id}")]
    NoImage { id: u64 },
}

/// Result type alias for Photofeed operations
pub type Result<T> = std::result::Result<T, GalleryError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for single request attempts
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use cache::{CacheEntry, CacheState, Clock, ManualClock, ResultCache, SystemClock};
pub use config::Config;
pub use crawler::{Coordinator, FetchClient, ImageResolver, RetryPolicy};
pub use model::{Aggregate, GalleryItem, ImageRef, ImageTier, PageRequest, PageResult};
