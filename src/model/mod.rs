//! Data model for the gallery feed
//!
//! This module contains:
//! - WordPress wire types as received from the REST API
//! - Normalized gallery records and the aggregate ordering
//! - Pagination contracts used by the presentation layer

mod gallery;
mod page;
mod wordpress;

pub use gallery::{parse_timestamp, sort_newest_first, Aggregate, GalleryItem, ImageRef, ImageTier};
pub use page::{paginate, PageRequest, PageResult};
pub use wordpress::{Embedded, MediaDetails, MediaSize, RawMedia, RawPost, Rendered};
