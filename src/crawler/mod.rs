//! Crawler module for walking the WordPress post listing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with timeout and retry logic
//! - Representative image resolution
//! - Page walking, de-duplication and aggregate building

mod coordinator;
mod fetcher;
mod resolver;
mod retry;

pub use coordinator::{CrawlReport, Coordinator};
pub use fetcher::{
    build_http_client, FetchClient, FetchedResponse, END_OF_RANGE_STATUS, TOTAL_ITEMS_HEADER,
    TOTAL_PAGES_HEADER,
};
pub use resolver::{inline_image, ImageResolver};
pub use retry::{is_transient, RetryPolicy};

use crate::config::Config;
use crate::model::Aggregate;
use crate::GalleryError;
use url::Url;

/// Runs a complete crawl with the given configuration
///
/// This is the main entry point for build-time snapshots. It will:
/// 1. Build the HTTP client and retry policy
/// 2. Walk every listing page
/// 3. Resolve images and sanitize content per post
/// 4. Return the aggregate, newest first, with the crawl counters
pub async fn crawl(config: &Config) -> Result<(Aggregate, CrawlReport), GalleryError> {
    let coordinator = Coordinator::from_config(config)?;
    Ok(coordinator.crawl_with_report().await?)
}

/// Appends a collection name to the REST namespace URL
///
/// `Url::join` would replace the last segment of a base without a trailing
/// slash, which is how REST bases are usually written.
pub(crate) fn endpoint(base: &Url, collection: &str) -> Result<Url, url::ParseError> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .push(collection);
    Ok(url)
}
