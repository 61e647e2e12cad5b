//! Crawl coordinator scenarios against a mock WordPress API

use crate::common::*;
use photofeed::model::ImageTier;
use photofeed::crawler::crawl;
use photofeed::{CrawlError, GalleryError};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_two_page_feed_end_to_end() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        1,
        vec![
            featured_post(1, "2023-04-02T08:00:00"),
            bare_post(2, "2024-01-15T17:45:00"),
        ],
        None,
    )
    .await;
    mount_end_of_range(&server, 2).await;
    mount_attachment(
        &server,
        2,
        vec![json!({
            "id": 21,
            "source_url": "https://cdn.example.com/attached-2.jpg",
            "media_details": { "sizes": {} }
        })],
    )
    .await;

    let aggregate = coordinator(&server).crawl_all().await.unwrap();

    assert_eq!(aggregate.len(), 2);

    // Sorted by effective date, newest first
    assert_eq!(aggregate[0].id, 2);
    assert_eq!(aggregate[0].image.tier, ImageTier::Attachment);
    assert_eq!(aggregate[0].image.url, "https://cdn.example.com/attached-2.jpg");
    assert_eq!(aggregate[0].year, 2024);

    assert_eq!(aggregate[1].id, 1);
    assert_eq!(aggregate[1].image.tier, ImageTier::Featured);
    assert_eq!(aggregate[1].image.url, "https://cdn.example.com/1-1024.jpg");
    assert_eq!(aggregate[1].title, "Featured 1");
    assert_eq!(aggregate[1].content_text, "Shot on film.");
}

#[tokio::test]
async fn test_post_without_any_image_is_dropped() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        1,
        vec![
            featured_post(1, "2023-04-02T08:00:00"),
            bare_post(2, "2024-01-15T17:45:00"),
        ],
        None,
    )
    .await;
    mount_end_of_range(&server, 2).await;
    mount_attachment(&server, 2, vec![]).await;

    let (aggregate, report) = coordinator(&server).crawl_with_report().await.unwrap();

    assert_eq!(aggregate.len(), 1);
    assert_eq!(aggregate[0].id, 1);
    assert_eq!(report.without_image, 1);
}

#[tokio::test]
async fn test_end_of_range_stops_without_retry() {
    let server = MockServer::start().await;

    mount_page(&server, 1, vec![inline_post(1, "2024-03-01T10:00:00")], None).await;
    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let (aggregate, report) = coordinator(&server).crawl_with_report().await.unwrap();

    assert_eq!(aggregate.len(), 1);
    assert_eq!(report.pages_fetched, 1);
    assert!(!report.stopped_early);
}

#[tokio::test]
async fn test_total_pages_header_bounds_the_crawl() {
    let server = MockServer::start().await;

    mount_page(&server, 1, vec![inline_post(1, "2024-03-01T10:00:00")], Some(1)).await;
    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(400))
        .expect(0)
        .mount(&server)
        .await;

    let aggregate = coordinator(&server).crawl_all().await.unwrap();
    assert_eq!(aggregate.len(), 1);
}

#[tokio::test]
async fn test_duplicates_across_pages_are_skipped() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        1,
        vec![
            inline_post(3, "2024-03-03T10:00:00"),
            inline_post(2, "2024-03-02T10:00:00"),
        ],
        Some(2),
    )
    .await;
    // A post published mid-crawl shifts post 2 onto the second page
    mount_page(
        &server,
        2,
        vec![
            inline_post(2, "2024-03-02T10:00:00"),
            inline_post(1, "2024-03-01T10:00:00"),
        ],
        Some(2),
    )
    .await;

    let (aggregate, report) = coordinator(&server).crawl_with_report().await.unwrap();

    let ids: Vec<u64> = aggregate.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
    assert_eq!(report.duplicates_skipped, 1);
    assert_eq!(report.pages_fetched, 2);
}

#[tokio::test]
async fn test_first_page_failure_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let result = coordinator(&server).crawl_all().await;

    match result {
        Err(CrawlError::FirstPage(error)) => assert_eq!(error.attempts, 3),
        other => panic!("expected first page failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_first_page_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let result = coordinator(&server).crawl_all().await;
    assert!(matches!(result, Err(CrawlError::MalformedFirstPage(_))));
}

#[tokio::test]
async fn test_later_page_failure_keeps_results() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        1,
        vec![
            inline_post(2, "2024-03-02T10:00:00"),
            inline_post(1, "2024-03-01T10:00:00"),
        ],
        Some(3),
    )
    .await;
    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let (aggregate, report) = coordinator(&server).crawl_with_report().await.unwrap();

    assert_eq!(aggregate.len(), 2);
    assert!(report.stopped_early);
}

#[tokio::test]
async fn test_transient_page_failure_recovers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, 1, vec![inline_post(1, "2024-03-01T10:00:00")], Some(1)).await;

    let aggregate = coordinator(&server).crawl_all().await.unwrap();
    assert_eq!(aggregate.len(), 1);
}

#[tokio::test]
async fn test_malformed_items_do_not_affect_neighbours() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        1,
        vec![
            json!({ "title": { "rendered": "no id" } }),
            json!({
                "id": 9,
                "date": "not a date",
                "content": { "rendered": "<img src=\"https://cdn.example.com/9.jpg\">" }
            }),
            inline_post(1, "2024-03-01T10:00:00"),
        ],
        Some(1),
    )
    .await;

    let (aggregate, report) = coordinator(&server).crawl_with_report().await.unwrap();

    assert_eq!(aggregate.len(), 1);
    assert_eq!(aggregate[0].id, 1);
    assert_eq!(report.failed_items, 2);
}

#[tokio::test]
async fn test_taken_at_drives_ordering() {
    let server = MockServer::start().await;

    let mut old_capture = inline_post(2, "2024-05-01T09:00:00");
    old_capture["acf"] = json!({ "taken_at": "20190714" });

    mount_page(
        &server,
        1,
        vec![old_capture, inline_post(1, "2023-01-01T09:00:00")],
        Some(1),
    )
    .await;

    let aggregate = coordinator(&server).crawl_all().await.unwrap();

    let ids: Vec<u64> = aggregate.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(aggregate[1].effective_date.to_string(), "2019-07-14 00:00:00");
    assert_eq!(aggregate[1].year, 2024);
}

#[tokio::test]
async fn test_content_is_sanitized() {
    let server = MockServer::start().await;

    let mut post = inline_post(1, "2024-03-01T10:00:00");
    post["content"]["rendered"] = json!(
        "[caption id=\"a\"]<img src=\"https://cdn.example.com/1.jpg\" onclick=\"steal()\" width=\"10\">[/caption]<script>alert(1)</script><p>Hello</p>"
    );
    mount_page(&server, 1, vec![post], Some(1)).await;

    let aggregate = coordinator(&server).crawl_all().await.unwrap();
    let item = &aggregate[0];

    assert!(!item.content_html.contains("script"));
    assert!(!item.content_html.contains("onclick"));
    assert!(!item.content_html.contains("[caption"));
    assert!(!item.content_html.contains("width=\"10\""));
    assert!(item.content_html.contains("max-width:100%"));
    assert_eq!(item.content_html_no_image, "<p>Hello</p>");
    assert!(item.content_text.ends_with("Hello"));
    assert!(!item.content_text.contains('<'));
}

#[tokio::test]
async fn test_crawl_entry_point_uses_config() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        1,
        vec![
            inline_post(1, "2024-03-01T10:00:00"),
            inline_post(2, "2024-03-02T10:00:00"),
        ],
        None,
    )
    .await;
    mount_end_of_range(&server, 2).await;

    let (aggregate, report) = crawl(&create_test_config(&server)).await.unwrap();

    let ids: Vec<u64> = aggregate.iter().map(|item| item.id).collect();
    assert_eq!(ids, vec![2, 1]);
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.items_collected, 2);
}

#[tokio::test]
async fn test_crawl_entry_point_reports_first_page_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(POSTS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = crawl(&create_test_config(&server)).await;
    assert!(matches!(
        result,
        Err(GalleryError::Crawl(CrawlError::FirstPage(_)))
    ));
}
