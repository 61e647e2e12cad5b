//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that walks the post listing page by
//! page, including:
//! - Stopping at the end-of-range signal or the advertised page count
//! - Skipping posts already seen on an earlier page
//! - Resolving images and sanitizing content per post
//! - Ordering the final aggregate
//!
//! # Failure policy
//!
//! The first page is special: if it cannot be fetched or decoded the crawl
//! fails with a [`CrawlError`]. Any later page failure only stops the crawl,
//! and everything gathered from earlier pages is returned. A failing post
//! never affects its neighbours.

use crate::config::Config;
use crate::content::{strip_to_plain_text, SanitizedContent};
use crate::crawler::endpoint;
use crate::crawler::fetcher::FetchClient;
use crate::crawler::resolver::ImageResolver;
use crate::model::{parse_timestamp, sort_newest_first, Aggregate, GalleryItem, RawPost};
use crate::{CrawlError, GalleryError, ItemError};
use chrono::Datelike;
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

const UNTITLED: &str = "Untitled";

/// Counters describing one crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Listing pages fetched and decoded
    pub pages_fetched: u32,

    /// Posts turned into gallery items
    pub items_collected: usize,

    /// Posts skipped because an earlier page already had them
    pub duplicates_skipped: usize,

    /// Posts dropped because no tier produced an image
    pub without_image: usize,

    /// Posts dropped because they were malformed
    pub failed_items: usize,

    /// Whether a page after the first failed and cut the crawl short
    pub stopped_early: bool,
}

/// Walks the post listing and builds the gallery aggregate
#[derive(Debug, Clone)]
pub struct Coordinator {
    client: FetchClient,
    resolver: ImageResolver,
    posts_endpoint: Url,
    per_page: u32,
    page_delay: Duration,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `client` - The fetch client shared by listing and attachment requests
    /// * `base_url` - The REST namespace, e.g. `https://example.com/wp-json/wp/v2`
    /// * `per_page` - Posts requested per listing page
    /// * `page_delay` - Pause between two listing pages
    pub fn new(
        client: FetchClient,
        base_url: &Url,
        per_page: u32,
        page_delay: Duration,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            resolver: ImageResolver::new(client.clone(), base_url)?,
            posts_endpoint: endpoint(base_url, "posts")?,
            client,
            per_page: per_page.max(1),
            page_delay,
        })
    }

    /// Creates a coordinator from the configuration
    pub fn from_config(config: &Config) -> Result<Self, GalleryError> {
        let base_url = Url::parse(&config.upstream.base_url).map_err(CrawlError::from)?;
        let client = FetchClient::from_config(config)?;

        Ok(Self::new(
            client,
            &base_url,
            config.upstream.per_page,
            config.crawler.page_delay(),
        )
        .map_err(CrawlError::from)?)
    }

    /// URL of one listing page, with featured media embedded
    pub fn page_url(&self, page: u32) -> Url {
        let mut url = self.posts_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("_embed", "wp:featuredmedia")
            .append_pair("orderby", "date")
            .append_pair("order", "desc")
            .append_pair("per_page", &self.per_page.to_string())
            .append_pair("page", &page.to_string());
        url
    }

    /// Crawls every listing page and returns the aggregate, newest first
    pub async fn crawl_all(&self) -> Result<Aggregate, CrawlError> {
        self.crawl_with_report().await.map(|(aggregate, _)| aggregate)
    }

    /// Same as [`Coordinator::crawl_all`], also returning crawl counters
    pub async fn crawl_with_report(&self) -> Result<(Aggregate, CrawlReport), CrawlError> {
        let start_time = std::time::Instant::now();
        let mut report = CrawlReport::default();
        let mut items: Aggregate = Vec::new();
        let mut seen: HashSet<u64> = HashSet::new();
        let mut total_pages: Option<u32> = None;
        let mut page: u32 = 1;

        tracing::info!("Starting crawl of {}", self.posts_endpoint);

        loop {
            if total_pages.is_some_and(|total| page > total) {
                break;
            }

            let response = match self.client.fetch(&self.page_url(page)).await {
                Ok(Some(response)) => response,
                Ok(None) => {
                    tracing::info!("Reached end of posts at page {}", page);
                    break;
                }
                Err(e) if page == 1 => {
                    tracing::error!("Failed to fetch first page: {}", e);
                    return Err(CrawlError::FirstPage(e));
                }
                Err(e) => {
                    tracing::warn!("Stopping crawl at page {}: {}", page, e);
                    report.stopped_early = true;
                    break;
                }
            };

            if page == 1 {
                total_pages = response.total_pages;
                tracing::info!(
                    "Upstream reports {} posts over {} pages",
                    response
                        .total_items
                        .map_or_else(|| "?".to_string(), |n| n.to_string()),
                    total_pages.map_or_else(|| "?".to_string(), |n| n.to_string())
                );
            }

            let posts: Vec<Value> = match response.json() {
                Ok(posts) => posts,
                Err(e) if page == 1 => {
                    tracing::error!("Failed to decode first page: {}", e);
                    return Err(CrawlError::MalformedFirstPage(e));
                }
                Err(e) => {
                    tracing::warn!("Stopping crawl at undecodable page {}: {}", page, e);
                    report.stopped_early = true;
                    break;
                }
            };

            report.pages_fetched += 1;

            if posts.is_empty() {
                tracing::info!("Page {} is empty, stopping", page);
                break;
            }

            tracing::info!("Processing page {} ({} posts)", page, posts.len());

            for value in posts {
                let post: RawPost = match serde_json::from_value(value) {
                    Ok(post) => post,
                    Err(e) => {
                        tracing::warn!("Skipping malformed post on page {}: {}", page, e);
                        report.failed_items += 1;
                        continue;
                    }
                };

                if !seen.insert(post.id) {
                    tracing::debug!("Skipping duplicate post {}", post.id);
                    report.duplicates_skipped += 1;
                    continue;
                }

                match self.build_item(&post).await {
                    Ok(item) => items.push(item),
                    Err(ItemError::NoImage { .. }) => report.without_image += 1,
                    Err(e) => {
                        tracing::warn!("Error processing post {}: {}", post.id, e);
                        report.failed_items += 1;
                    }
                }
            }

            page += 1;

            let more_pages = total_pages.map_or(true, |total| page <= total);
            if more_pages && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        sort_newest_first(&mut items);
        report.items_collected = items.len();

        tracing::info!(
            "Crawl completed: {} items from {} pages in {:?} ({} duplicates, {} without image, {} failed)",
            report.items_collected,
            report.pages_fetched,
            start_time.elapsed(),
            report.duplicates_skipped,
            report.without_image,
            report.failed_items
        );

        Ok((items, report))
    }

    /// Turns one post into a gallery item
    ///
    /// Dates are checked before resolution so a malformed post never costs
    /// an attachment request.
    async fn build_item(&self, post: &RawPost) -> Result<GalleryItem, ItemError> {
        let raw_date = parse_timestamp(&post.date).ok_or_else(|| ItemError::InvalidDate {
            id: post.id,
            field: "date",
            value: post.date.clone(),
        })?;

        let effective_date = match post.taken_at() {
            Some(taken_at) => parse_timestamp(taken_at).ok_or_else(|| ItemError::InvalidDate {
                id: post.id,
                field: "taken_at",
                value: taken_at.to_string(),
            })?,
            None => raw_date,
        };

        let image = self
            .resolver
            .resolve(post)
            .await
            .ok_or(ItemError::NoImage { id: post.id })?;

        let content = SanitizedContent::from_html(&post.content.rendered);

        let mut title = strip_to_plain_text(&post.title.rendered);
        if title.is_empty() {
            title = UNTITLED.to_string();
        }

        Ok(GalleryItem {
            id: post.id,
            title,
            raw_date,
            effective_date,
            year: raw_date.year(),
            source_url: post.link.clone(),
            image,
            content_html: content.html,
            content_html_no_image: content.html_no_image,
            content_text: content.text,
        })
    }
}
