//! Output module for snapshots and crawl summaries
//!
//! This module handles:
//! - Writing the aggregate as a JSON snapshot and reading it back
//! - Summarizing an aggregate per year and per image tier

mod snapshot;
pub mod stats;

pub use snapshot::{load_cache_entry, read_snapshot, write_snapshot};
pub use stats::{compute_statistics, print_statistics, year_counts, GalleryStatistics};
