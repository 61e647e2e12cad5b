//! WordPress REST v2 wire types
//!
//! Only the fields the gallery needs are modeled. Relations that WordPress
//! may return in several shapes (custom fields, embedded media) are kept as
//! raw JSON and interpreted lazily, so one odd item cannot poison a page.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Size names tried, in order, before falling back to the original upload
const SIZE_PREFERENCE: [&str; 2] = ["large", "medium_large"];

/// A `{ "rendered": "..." }` field
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: String,
}

/// A post from the `/posts` listing
#[derive(Debug, Clone, Deserialize)]
pub struct RawPost {
    pub id: u64,

    /// Publish date in site-local time, without offset
    pub date: String,

    #[serde(default)]
    pub link: String,

    #[serde(default)]
    pub title: Rendered,

    #[serde(default)]
    pub content: Rendered,

    /// Advanced Custom Fields payload (`false` or `[]` when none are set)
    #[serde(default)]
    pub acf: Value,

    #[serde(rename = "_embedded", default)]
    pub embedded: Option<Embedded>,
}

/// Relations inlined by `_embed`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Embedded {
    #[serde(rename = "wp:featuredmedia", default)]
    pub featured_media: Vec<Value>,
}

/// A media library entry, embedded or fetched from `/media`
#[derive(Debug, Clone, Deserialize)]
pub struct RawMedia {
    #[serde(default)]
    pub id: Option<u64>,

    #[serde(default)]
    pub source_url: Option<String>,

    #[serde(default)]
    pub media_details: Option<MediaDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaDetails {
    #[serde(default)]
    pub sizes: HashMap<String, MediaSize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaSize {
    #[serde(default)]
    pub source_url: Option<String>,
}

impl RawPost {
    /// The domain-specific capture timestamp, if the post carries a usable one
    pub fn taken_at(&self) -> Option<&str> {
        self.acf
            .get("taken_at")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The first embedded featured media object, still undecoded
    pub fn featured_media(&self) -> Option<&Value> {
        self.embedded
            .as_ref()
            .and_then(|embedded| embedded.featured_media.first())
    }
}

impl RawMedia {
    /// Picks the preferred rendition: `large`, then `medium_large`, then the
    /// original upload
    pub fn preferred_url(&self) -> Option<&str> {
        let sized = self.media_details.as_ref().and_then(|details| {
            SIZE_PREFERENCE.iter().find_map(|name| {
                details
                    .sizes
                    .get(*name)
                    .and_then(|size| non_empty(size.source_url.as_deref()))
            })
        });

        sized.or_else(|| non_empty(self.source_url.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
