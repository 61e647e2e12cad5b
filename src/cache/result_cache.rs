//! Result cache implementation
//!
//! The cache holds at most one aggregate together with the instant it was
//! produced. Requests are answered according to the entry's state:
//!
//! | State | Action |
//! |-------|--------|
//! | Empty | Crawl; on failure serve an empty page |
//! | Fresh | Serve from the entry, no network |
//! | Stale | Crawl; on failure keep serving the expired entry |
//!
//! Callers never see an error from [`ResultCache::get_page`].

use crate::cache::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::crawler::Coordinator;
use crate::model::{paginate, Aggregate, PageRequest, PageResult};
use crate::{CrawlError, GalleryError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// A cached aggregate and when it was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The aggregate, newest first
    pub aggregate: Aggregate,

    /// When the crawl that produced it finished
    pub produced_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(aggregate: Aggregate, produced_at: DateTime<Utc>) -> Self {
        Self {
            aggregate,
            produced_at,
        }
    }

    /// Age of the entry at `now`
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.produced_at
    }

    /// An entry is fresh while its age is strictly below the TTL
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) < ttl
    }
}

/// Where the cache currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Fresh,
    Stale,
}

/// Serves gallery pages from a time-boxed aggregate
pub struct ResultCache<C: Clock = SystemClock> {
    coordinator: Coordinator,
    clock: C,
    ttl: Duration,
    default_page_size: u32,
    entry: RwLock<Option<Arc<CacheEntry>>>,
    refresh_lock: Mutex<()>,
}

impl ResultCache<SystemClock> {
    /// Creates a cache backed by the wall clock
    pub fn new(coordinator: Coordinator, ttl: Duration, default_page_size: u32) -> Self {
        Self::with_clock(coordinator, ttl, default_page_size, SystemClock)
    }

    /// Creates a cache and its coordinator from the configuration
    pub fn from_config(config: &Config) -> Result<Self, GalleryError> {
        Ok(Self::new(
            Coordinator::from_config(config)?,
            config.cache.ttl(),
            config.cache.page_size,
        ))
    }
}

impl<C: Clock> ResultCache<C> {
    /// Creates a cache with an explicit time source
    ///
    /// # Arguments
    ///
    /// * `coordinator` - Used to produce a new aggregate when needed
    /// * `ttl` - How long an aggregate is served without refreshing
    /// * `default_page_size` - Page size used by [`ResultCache::get_page_numbered`]
    /// * `clock` - The time source
    pub fn with_clock(
        coordinator: Coordinator,
        ttl: Duration,
        default_page_size: u32,
        clock: C,
    ) -> Self {
        Self {
            coordinator,
            clock,
            ttl,
            default_page_size: default_page_size.max(1),
            entry: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn default_page_size(&self) -> u32 {
        self.default_page_size
    }

    /// The current entry, fresh or not
    pub async fn entry(&self) -> Option<Arc<CacheEntry>> {
        self.entry.read().await.clone()
    }

    /// Reports the state of the cache at the current instant
    pub async fn state(&self) -> CacheState {
        match self.entry().await {
            None => CacheState::Empty,
            Some(entry) if entry.is_fresh(self.clock.now(), self.ttl) => CacheState::Fresh,
            Some(_) => CacheState::Stale,
        }
    }

    /// Replaces the current entry, e.g. with one loaded from a snapshot
    pub async fn seed(&self, entry: CacheEntry) {
        tracing::info!(
            "Seeding cache with {} items produced at {}",
            entry.aggregate.len(),
            entry.produced_at
        );
        *self.entry.write().await = Some(Arc::new(entry));
    }

    /// Serves a page with the given number and optional size
    ///
    /// A missing size falls back to the configured default.
    pub async fn get_page_numbered(&self, page_number: u32, page_size: Option<u32>) -> PageResult {
        let page_size = page_size.unwrap_or(self.default_page_size);
        self.get_page(PageRequest::new(page_number, page_size)).await
    }

    /// Serves one page, refreshing the aggregate when it is missing or expired
    ///
    /// # Returns
    ///
    /// Always a page: from a fresh aggregate, a newly crawled one, the
    /// expired one when the crawl failed, or an empty page when no data was
    /// ever obtained.
    pub async fn get_page(&self, request: PageRequest) -> PageResult {
        let request = PageRequest::new(request.page_number, request.page_size);

        if let Some(entry) = self.fresh_entry().await {
            tracing::debug!("Serving page {} from fresh cache", request.page_number);
            return paginate(&entry.aggregate, request);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while this one waited
        if let Some(entry) = self.fresh_entry().await {
            tracing::debug!("Serving page {} from refreshed cache", request.page_number);
            return paginate(&entry.aggregate, request);
        }

        match self.refresh().await {
            Ok(entry) => paginate(&entry.aggregate, request),
            Err(e) => match self.entry().await {
                Some(stale) => {
                    tracing::warn!(
                        "Refresh failed, serving stale data from {}: {}",
                        stale.produced_at,
                        e
                    );
                    paginate(&stale.aggregate, request)
                }
                None => {
                    tracing::warn!("Refresh failed with no cached data: {}", e);
                    PageResult::empty(request.page_number)
                }
            },
        }
    }

    async fn fresh_entry(&self) -> Option<Arc<CacheEntry>> {
        self.entry()
            .await
            .filter(|entry| entry.is_fresh(self.clock.now(), self.ttl))
    }

    async fn refresh(&self) -> Result<Arc<CacheEntry>, CrawlError> {
        tracing::info!("Refreshing gallery cache");

        let aggregate = self.coordinator.crawl_all().await?;
        let entry = Arc::new(CacheEntry::new(aggregate, self.clock.now()));
        *self.entry.write().await = Some(Arc::clone(&entry));

        tracing::info!("Cache refreshed with {} items", entry.aggregate.len());
        Ok(entry)
    }
}
