//! Snapshot files
//!
//! A snapshot is the aggregate written as pretty-printed JSON, produced at
//! build time and optionally used to warm-start a [`ResultCache`].
//!
//! [`ResultCache`]: crate::cache::ResultCache

use crate::cache::CacheEntry;
use crate::model::{Aggregate, GalleryItem};
use crate::GalleryError;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

/// Writes the aggregate to `path`, creating parent directories
///
/// # Arguments
///
/// * `aggregate` - The crawl result to persist
/// * `path` - Destination file, overwritten if it exists
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the snapshot
/// * `Err(GalleryError)` - Failed to serialize or write it
pub fn write_snapshot(aggregate: &[GalleryItem], path: &Path) -> Result<(), GalleryError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(aggregate)?;
    fs::write(path, json)?;

    tracing::info!("Wrote {} items to {}", aggregate.len(), path.display());
    Ok(())
}

/// Reads a snapshot written by [`write_snapshot`]
pub fn read_snapshot(path: &Path) -> Result<Aggregate, GalleryError> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Reads a snapshot as a cache entry
///
/// The file's modification time stands in for the instant the aggregate
/// was produced, so an old snapshot seeds the cache as stale.
pub fn load_cache_entry(path: &Path) -> Result<CacheEntry, GalleryError> {
    let aggregate = read_snapshot(path)?;
    let produced_at: DateTime<Utc> = fs::metadata(path)?.modified()?.into();
    Ok(CacheEntry::new(aggregate, produced_at))
}
