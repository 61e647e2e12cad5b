//! Time-boxed result cache with stale fallback
//!
//! This module provides:
//! - A pluggable [`Clock`] so expiry can be tested deterministically
//! - [`ResultCache`], which serves pages from the last good aggregate and
//!   refreshes it through the crawl coordinator once it expires

mod clock;
mod result_cache;

pub use clock::{Clock, ManualClock, SystemClock};
pub use result_cache::{CacheEntry, CacheState, ResultCache};
