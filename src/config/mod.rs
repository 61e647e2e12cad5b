//! Configuration module for Photofeed
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use photofeed::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("photofeed.toml")).unwrap();
//! println!("Cache TTL: {}s", config.cache.ttl_seconds);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CacheConfig, Config, CrawlerConfig, FetchConfig, OutputConfig, UpstreamConfig,
    UserAgentConfig, MAX_TTL_SECONDS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
