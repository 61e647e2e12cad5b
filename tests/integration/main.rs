//! Integration tests for Photofeed
//!
//! These tests use wiremock to stand in for a WordPress REST API and
//! exercise the crawl and cache cycles end-to-end.

mod cache_tests;
mod crawl_tests;
