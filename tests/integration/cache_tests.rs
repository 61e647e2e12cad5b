//! Result cache scenarios against a mock WordPress API

use crate::common::*;
use chrono::{Duration, TimeZone, Utc};
use photofeed::cache::{CacheEntry, CacheState, Clock, ManualClock, ResultCache};
use photofeed::model::PageRequest;
use serde_json::Value;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manual_clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap())
}

fn cache_with_clock(server: &MockServer, clock: ManualClock) -> ResultCache<ManualClock> {
    let config = create_test_config(server);
    ResultCache::with_clock(
        coordinator(server),
        config.cache.ttl(),
        config.cache.page_size,
        clock,
    )
}

fn numbered_posts(range: std::ops::RangeInclusive<u64>) -> Vec<Value> {
    range
        .map(|id| inline_post(id, &format!("2024-01-{:02}T12:00:00", id)))
        .collect()
}

/// Mounts a single-page listing that answers at most `times` requests
async fn mount_listing_times(server: &MockServer, posts: Vec<Value>, times: u64) {
    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-WP-TotalPages", "1")
                .set_body_json(Value::Array(posts)),
        )
        .up_to_n_times(times)
        .mount(server)
        .await;
}

async fn mount_listing_failure(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_pagination_over_cached_aggregate() {
    let server = MockServer::start().await;
    mount_listing_times(&server, numbered_posts(1..=25), 1).await;

    let cache = cache_with_clock(&server, manual_clock());

    let page = cache.get_page(PageRequest::new(3, 9)).await;
    assert_eq!(page.items.len(), 7);
    assert_eq!(page.total_items, 25);
    assert_eq!(page.total_pages, 3);
    assert!(!page.has_next);
    assert!(page.has_prev);

    // Newest first, so the last page holds the oldest posts
    assert_eq!(page.items[0].id, 7);
    assert_eq!(page.items[6].id, 1);

    let first = cache.get_page_numbered(1, None).await;
    assert_eq!(first.items.len(), 9);
    assert_eq!(first.items[0].id, 25);
    assert!(first.has_next);
    assert!(!first.has_prev);
}

#[tokio::test]
async fn test_fresh_cache_serves_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-WP-TotalPages", "1")
                .set_body_json(Value::Array(numbered_posts(1..=3))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let clock = manual_clock();
    let cache = cache_with_clock(&server, clock.clone());

    assert_eq!(cache.get_page(PageRequest::new(1, 9)).await.total_items, 3);
    clock.advance(Duration::seconds(299));
    assert_eq!(cache.get_page(PageRequest::new(1, 9)).await.total_items, 3);
    assert_eq!(cache.state().await, CacheState::Fresh);
}

#[tokio::test]
async fn test_stale_cache_is_refreshed() {
    let server = MockServer::start().await;
    mount_listing_times(&server, numbered_posts(1..=2), 1).await;
    mount_listing_times(&server, numbered_posts(1..=4), 1).await;

    let clock = manual_clock();
    let cache = cache_with_clock(&server, clock.clone());

    assert_eq!(cache.get_page(PageRequest::new(1, 9)).await.total_items, 2);
    let first_produced = cache.entry().await.unwrap().produced_at;

    clock.advance(Duration::seconds(300));
    assert_eq!(cache.state().await, CacheState::Stale);

    assert_eq!(cache.get_page(PageRequest::new(1, 9)).await.total_items, 4);
    let entry = cache.entry().await.unwrap();
    assert_eq!(entry.produced_at, first_produced + Duration::seconds(300));
    assert_eq!(cache.state().await, CacheState::Fresh);
}

#[tokio::test]
async fn test_stale_fallback_on_refresh_failure() {
    let server = MockServer::start().await;
    mount_listing_times(&server, numbered_posts(1..=5), 1).await;
    mount_listing_failure(&server).await;

    let clock = manual_clock();
    let cache = cache_with_clock(&server, clock.clone());

    let before = cache.get_page(PageRequest::new(1, 9)).await;
    assert_eq!(before.total_items, 5);

    clock.advance(Duration::hours(1));
    let after = cache.get_page(PageRequest::new(1, 9)).await;

    assert_eq!(after, before);
    assert_eq!(cache.state().await, CacheState::Stale);
}

#[tokio::test]
async fn test_empty_cache_failure_serves_empty_page() {
    let server = MockServer::start().await;
    mount_listing_failure(&server).await;

    let cache = cache_with_clock(&server, manual_clock());
    let page = cache.get_page(PageRequest::new(2, 9)).await;

    assert!(page.items.is_empty());
    assert_eq!(page.total_items, 0);
    assert_eq!(page.total_pages, 0);
    assert!(!page.has_next);
    assert!(!page.has_prev);
    assert_eq!(cache.state().await, CacheState::Empty);
}

#[tokio::test]
async fn test_seeded_cache_skips_first_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let clock = manual_clock();
    let cache = cache_with_clock(&server, clock.clone());

    let source = MockServer::start().await;
    mount_listing_times(&source, numbered_posts(1..=3), 1).await;
    let seeded = coordinator(&source).crawl_all().await.unwrap();

    cache.seed(CacheEntry::new(seeded, clock.now())).await;

    let page = cache.get_page(PageRequest::new(1, 2)).await;
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total_pages, 2);
}

#[tokio::test]
async fn test_concurrent_refreshes_are_coalesced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-WP-TotalPages", "1")
                .set_body_json(Value::Array(numbered_posts(1..=3)))
                .set_delay(std::time::Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(ResultCache::new(
        coordinator(&server),
        Duration::seconds(300),
        9,
    ));

    let handles: Vec<_> = (1..=4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_page(PageRequest::new(1, 9)).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().total_items, 3);
    }
}
