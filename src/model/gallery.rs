//! Normalized gallery records

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// The resolution tier an image was found at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageTier {
    /// Embedded featured media
    Featured,
    /// First `<img>` of the post body
    Inline,
    /// First image attached to the post
    Attachment,
}

/// A resolved representative image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    pub tier: ImageTier,
}

impl ImageRef {
    pub fn new(url: impl Into<String>, tier: ImageTier) -> Self {
        Self {
            url: url.into(),
            tier,
        }
    }
}

/// A post normalized for the gallery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub id: u64,
    pub title: String,

    /// Upstream publish date
    pub raw_date: NaiveDateTime,

    /// Capture date when the post has one, publish date otherwise
    pub effective_date: NaiveDateTime,

    pub year: i32,
    pub source_url: String,
    pub image: ImageRef,
    pub content_html: String,
    pub content_html_no_image: String,
    pub content_text: String,
}

/// A crawl result, newest first
pub type Aggregate = Vec<GalleryItem>;

/// Orders an aggregate by effective date, newest first
///
/// Equal dates fall back to descending id so the order never depends on
/// upstream page order.
pub fn sort_newest_first(items: &mut [GalleryItem]) {
    items.sort_by(|a, b| {
        b.effective_date
            .cmp(&a.effective_date)
            .then_with(|| b.id.cmp(&a.id))
    });
}

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// Parses the timestamp shapes WordPress and ACF produce
///
/// Offsets are dropped after conversion to the wall-clock time they carry,
/// matching the offset-less `date` field of posts.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    // ACF date pickers store `YYYYMMDD`
    if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
        let year = value[0..4].parse().ok()?;
        let month = value[4..6].parse().ok()?;
        let day = value[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0);
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}
