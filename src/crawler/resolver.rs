//! Representative image resolution
//!
//! Every gallery item needs one image. Posts carry it in different places,
//! so the resolver walks a fixed chain and stops at the first hit:
//!
//! 1. Embedded featured media (no extra request)
//! 2. First `<img>` of the post body (no extra request)
//! 3. First image attached to the post (one request to `/media`)
//!
//! A failure inside a tier only moves resolution on to the next tier.

use crate::crawler::endpoint;
use crate::crawler::fetcher::FetchClient;
use crate::model::{ImageRef, ImageTier, RawMedia, RawPost};
use crate::FetchResult;
use scraper::{Html, Selector};
use url::Url;

/// Resolves the representative image of a post
#[derive(Debug, Clone)]
pub struct ImageResolver {
    client: FetchClient,
    media_endpoint: Url,
}

impl ImageResolver {
    /// Creates a resolver for the REST namespace at `base_url`
    pub fn new(client: FetchClient, base_url: &Url) -> Result<Self, url::ParseError> {
        Ok(Self {
            client,
            media_endpoint: endpoint(base_url, "media")?,
        })
    }

    /// Walks the fallback chain for one post
    ///
    /// # Returns
    ///
    /// * `Some(ImageRef)` - The first tier that produced a URL
    /// * `None` - No tier produced one; the caller drops the post
    pub async fn resolve(&self, post: &RawPost) -> Option<ImageRef> {
        match featured_image(post) {
            Ok(Some(url)) => {
                tracing::debug!("Featured image found for post {}", post.id);
                return Some(ImageRef::new(url, ImageTier::Featured));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!("Featured image tier failed for post {}: {}", post.id, e);
            }
        }

        if let Some(url) = inline_image(&post.content.rendered) {
            tracing::debug!("Content image found for post {}", post.id);
            return Some(ImageRef::new(url, ImageTier::Inline));
        }

        match self.attachment_image(post.id).await {
            Ok(Some(url)) => {
                tracing::debug!("Attachment image found for post {}", post.id);
                return Some(ImageRef::new(url, ImageTier::Attachment));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Attachment lookup failed for post {}: {}", post.id, e);
            }
        }

        tracing::warn!(
            "No image found for post {}: {:?}",
            post.id,
            post.title.rendered
        );
        None
    }

    /// URL of the attachment lookup for a post
    ///
    /// Asks for the single image attachment with the lowest menu order.
    pub fn attachment_url(&self, post_id: u64) -> Url {
        let mut url = self.media_endpoint.clone();
        url.query_pairs_mut()
            .append_pair("parent", &post_id.to_string())
            .append_pair("media_type", "image")
            .append_pair("per_page", "1")
            .append_pair("orderby", "menu_order")
            .append_pair("order", "asc");
        url
    }

    async fn attachment_image(&self, post_id: u64) -> FetchResult<Option<String>> {
        let Some(response) = self.client.fetch_once(&self.attachment_url(post_id)).await? else {
            return Ok(None);
        };

        let attachments: Vec<RawMedia> = response.json()?;
        Ok(attachments
            .first()
            .and_then(RawMedia::preferred_url)
            .map(str::to_string))
    }
}

/// Tier 1: the embedded featured media, if it decodes and has a URL
fn featured_image(post: &RawPost) -> Result<Option<String>, serde_json::Error> {
    let Some(value) = post.featured_media() else {
        return Ok(None);
    };

    let media: RawMedia = serde_json::from_value(value.clone())?;
    Ok(media.preferred_url().map(str::to_string))
}

/// Tier 2: the `src` of the first `<img>` in document order
pub fn inline_image(html: &str) -> Option<String> {
    if html.is_empty() {
        return None;
    }

    let selector = Selector::parse("img[src]").ok()?;
    let fragment = Html::parse_fragment(html);

    fragment
        .select(&selector)
        .filter_map(|element| element.value().attr("src"))
        .map(str::trim)
        .find(|src| !src.is_empty())
        .map(str::to_string)
}
