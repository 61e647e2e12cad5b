//! View-layer pagination over an aggregate

use crate::model::GalleryItem;
use serde::{Deserialize, Serialize};

/// A 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page_number: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Creates a request, lifting a zero page number or size to 1
    pub fn new(page_number: u32, page_size: u32) -> Self {
        Self {
            page_number: page_number.max(1),
            page_size: page_size.max(1),
        }
    }
}

/// One page of gallery items plus navigation metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    pub items: Vec<GalleryItem>,
    pub total_items: usize,
    pub total_pages: u32,
    pub current_page: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageResult {
    /// The result served when no data has ever been obtained
    pub fn empty(page_number: u32) -> Self {
        Self {
            items: Vec::new(),
            total_items: 0,
            total_pages: 0,
            current_page: page_number.max(1),
            has_next: false,
            has_prev: false,
        }
    }
}

/// Slices one page out of an aggregate
///
/// Pages past the end yield no items but keep the totals, so callers can
/// still render navigation.
pub fn paginate(items: &[GalleryItem], request: PageRequest) -> PageResult {
    let request = PageRequest::new(request.page_number, request.page_size);
    let page_size = request.page_size as usize;
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size) as u32;

    let start = (request.page_number as usize - 1)
        .saturating_mul(page_size)
        .min(total_items);
    let end = start.saturating_add(page_size).min(total_items);

    PageResult {
        items: items[start..end].to_vec(),
        total_items,
        total_pages,
        current_page: request.page_number,
        has_next: request.page_number < total_pages,
        has_prev: request.page_number > 1,
    }
}
