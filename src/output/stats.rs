//! Statistics over a crawl result
//!
//! This module summarizes an aggregate for the command line: how many
//! items it holds, how they spread over the years, and which resolution
//! tier produced their images.

use crate::model::{GalleryItem, ImageTier};
use std::collections::BTreeMap;

/// Aggregate statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryStatistics {
    /// Total number of items
    pub total_items: usize,

    /// Items per publish year, newest year first
    pub by_year: Vec<(i32, usize)>,

    /// Items per image tier, in tier order
    pub by_tier: Vec<(ImageTier, usize)>,
}

/// Counts items per publish year, newest year first
pub fn year_counts(items: &[GalleryItem]) -> Vec<(i32, usize)> {
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for item in items {
        *counts.entry(item.year).or_default() += 1;
    }
    counts.into_iter().rev().collect()
}

/// Builds statistics for an aggregate
pub fn compute_statistics(items: &[GalleryItem]) -> GalleryStatistics {
    let by_tier = [ImageTier::Featured, ImageTier::Inline, ImageTier::Attachment]
        .into_iter()
        .map(|tier| {
            let count = items.iter().filter(|item| item.image.tier == tier).count();
            (tier, count)
        })
        .filter(|(_, count)| *count > 0)
        .collect();

    GalleryStatistics {
        total_items: items.len(),
        by_year: year_counts(items),
        by_tier,
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &GalleryStatistics) {
    println!("=== Gallery Statistics ===\n");

    println!("Total items: {}", stats.total_items);
    println!();

    println!("Posts by Year:");
    for (year, count) in &stats.by_year {
        println!("  {}: {} posts", year, count);
    }
    println!();

    println!("Images by Source:");
    for (tier, count) in &stats.by_tier {
        let percentage = if stats.total_items > 0 {
            (*count as f64 / stats.total_items as f64) * 100.0
        } else {
            0.0
        };
        println!("  {:?}: {} ({:.1}%)", tier, count, percentage);
    }
}
