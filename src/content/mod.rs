//! Post body cleanup
//!
//! Turns the rendered HTML of a post into the variants the gallery shows:
//! sanitized markup, sanitized markup without the leading image, and plain
//! text.

mod sanitizer;

pub use sanitizer::{remove_leading_image, sanitize, strip_to_plain_text, SanitizedContent};
