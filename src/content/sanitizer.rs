//! Regex-based HTML cleanup for post bodies
//!
//! All transforms are pure and deterministic. `sanitize` runs its steps in a
//! fixed order and repeats the whole pass until the output stops changing,
//! so removing one construct can never leave a new dangerous one behind.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Elements removed together with everything they contain
const BLOCKED_ELEMENTS: [&str; 6] = ["script", "style", "iframe", "object", "embed", "form"];

/// URI schemes that must never survive in an attribute value
const BLOCKED_SCHEMES: [&str; 3] = ["javascript:", "data:", "vbscript:"];

const RESPONSIVE_IMAGE_STYLE: &str = "max-width:100%;height:auto;";

static BLOCK_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    BLOCKED_ELEMENTS
        .iter()
        .map(|name| {
            Regex::new(&format!(r"(?is)<{name}\b[^>]*>.*?</{name}\s*>"))
                .expect("hardcoded regex pattern is valid")
        })
        .collect()
});

static STRAY_BLOCKED_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?(?:script|style|iframe|object|embed|form)\b[^>]*>")
        .expect("hardcoded regex pattern is valid")
});

static OPENING_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([a-zA-Z][a-zA-Z0-9:-]*)([^>]*)>").expect("hardcoded regex pattern is valid")
});

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+)))?"#)
        .expect("hardcoded regex pattern is valid")
});

static SHORTCODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[/?(?:caption|gallery)\b[^\]]*\]").expect("hardcoded regex pattern is valid")
});

/// Character references a browser resolves before reading a URI scheme
static CHARACTER_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)&#x([0-9a-f]+);?|&#([0-9]+);?|&(colon|tab|newline|nbsp|lpar|rpar|sol|period);")
        .expect("hardcoded regex pattern is valid")
});

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("hardcoded regex pattern is valid"));

static FIRST_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<img\b[^>]*>").expect("hardcoded regex pattern is valid"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:quot|amp|lt|gt|#0*39|apos|nbsp);").expect("hardcoded regex pattern is valid")
});

/// The three renderable variants of one post body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedContent {
    /// Safe markup, images made responsive
    pub html: String,

    /// Safe markup without its leading image
    pub html_no_image: String,

    /// Plain text
    pub text: String,
}

impl SanitizedContent {
    pub fn from_html(raw: &str) -> Self {
        let html = sanitize(raw);
        let html_no_image = remove_leading_image(&html);
        Self {
            html,
            html_no_image,
            text: strip_to_plain_text(raw),
        }
    }
}

/// Removes every tag and decodes the common entities
///
/// # Example
///
/// ```
/// use photofeed::content::strip_to_plain_text;
///
/// assert_eq!(strip_to_plain_text("<p>Tom &amp; Jerry</p>"), "Tom & Jerry");
/// ```
pub fn strip_to_plain_text(html: &str) -> String {
    let without_tags = ANY_TAG.replace_all(html, "");
    let decoded = ENTITY.replace_all(&without_tags, |caps: &Captures| {
        match &caps[0] {
            "&quot;" => "\"",
            "&amp;" => "&",
            "&lt;" => "<",
            "&gt;" => ">",
            "&nbsp;" => " ",
            _ => "'",
        }
        .to_string()
    });
    decoded.trim().to_string()
}

/// Cleans a post body into markup that is safe to render
///
/// Steps, in order:
/// 1. Remove blocked elements with their content, then any stray blocked tag
/// 2. Drop event-handler attributes and attributes carrying a blocked scheme
/// 3. Remove `[caption]` and `[gallery]` shortcodes
/// 4. Make every `<img>` responsive
pub fn sanitize(html: &str) -> String {
    let mut current = sanitize_pass(html);
    loop {
        let next = sanitize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

/// Removes only the first `<img>` tag
///
/// This is the first `<img>` in document order, with or without a `src`.
/// A lazy-loaded `<img data-src=…>` placed before the representative image
/// is therefore the one removed.
pub fn remove_leading_image(html: &str) -> String {
    FIRST_IMAGE.replacen(html, 1, "").into_owned()
}

fn sanitize_pass(html: &str) -> String {
    let html = remove_blocked_elements(html);
    let html = strip_dangerous_attributes(&html);
    let html = remove_shortcodes(&html);
    let html = rewrite_images(&html);
    html.trim().to_string()
}

fn remove_blocked_elements(html: &str) -> String {
    let mut current = html.to_string();
    loop {
        let mut next = current.clone();
        for block in BLOCK_REGEXES.iter() {
            next = block.replace_all(&next, "").into_owned();
        }
        next = STRAY_BLOCKED_TAG.replace_all(&next, "").into_owned();

        if next == current {
            return current;
        }
        current = next;
    }
}

/// Removing one shortcode can join its neighbours into another
fn remove_shortcodes(html: &str) -> String {
    let mut current = html.to_string();
    loop {
        let next = SHORTCODE.replace_all(&current, "").into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_dangerous_attributes(html: &str) -> String {
    rewrite_opening_tags(html, |_, attributes| {
        attributes.retain(|attr| !attr.is_event_handler() && !attr.has_blocked_scheme());
    })
}

fn rewrite_images(html: &str) -> String {
    rewrite_opening_tags(html, |name, attributes| {
        if !name.eq_ignore_ascii_case("img") {
            return;
        }
        attributes.retain(|attr| {
            !["width", "height", "style"]
                .iter()
                .any(|dropped| attr.name.eq_ignore_ascii_case(dropped))
        });
        attributes.push(Attribute {
            name: "style".to_string(),
            value: Some(RESPONSIVE_IMAGE_STYLE.to_string()),
            text: format!("style=\"{}\"", RESPONSIVE_IMAGE_STYLE),
        });
    })
}

/// One attribute of an opening tag, with its original spelling
struct Attribute {
    name: String,
    value: Option<String>,
    text: String,
}

impl Attribute {
    fn is_event_handler(&self) -> bool {
        let name = self.name.to_ascii_lowercase();
        name.len() > 2 && name.starts_with("on")
    }

    fn has_blocked_scheme(&self) -> bool {
        let Some(value) = &self.value else {
            return false;
        };
        // Browsers decode references and ignore whitespace and control
        // characters before reading the scheme
        let compact: String = decode_character_references(value)
            .chars()
            .filter(|c| !c.is_whitespace() && !c.is_control())
            .collect::<String>()
            .to_ascii_lowercase();
        BLOCKED_SCHEMES
            .iter()
            .any(|scheme| compact.starts_with(scheme))
    }
}

/// Resolves numeric references and the named ones that can hide a scheme
fn decode_character_references(value: &str) -> String {
    CHARACTER_REFERENCE
        .replace_all(value, |caps: &Captures| {
            let code = if let Some(hex) = caps.get(1) {
                u32::from_str_radix(hex.as_str(), 16).ok()
            } else if let Some(decimal) = caps.get(2) {
                decimal.as_str().parse::<u32>().ok()
            } else {
                match caps[3].to_ascii_lowercase().as_str() {
                    "colon" => Some(u32::from(':')),
                    "tab" => Some(u32::from('\t')),
                    "newline" => Some(u32::from('\n')),
                    "nbsp" => Some(0xA0),
                    "lpar" => Some(u32::from('(')),
                    "rpar" => Some(u32::from(')')),
                    "sol" => Some(u32::from('/')),
                    _ => Some(u32::from('.')),
                }
            };
            code.and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER)
                .to_string()
        })
        .into_owned()
}

/// Re-emits every opening tag after letting `edit` change its attributes
fn rewrite_opening_tags<F>(html: &str, edit: F) -> String
where
    F: Fn(&str, &mut Vec<Attribute>),
{
    OPENING_TAG
        .replace_all(html, |caps: &Captures| {
            let name = &caps[1];
            let body = &caps[2];
            let self_closing = body.trim_end().ends_with('/');

            let mut attributes = parse_attributes(body);
            edit(name, &mut attributes);

            let mut tag = String::with_capacity(caps[0].len());
            tag.push('<');
            tag.push_str(name);
            for attr in &attributes {
                tag.push(' ');
                tag.push_str(&attr.text);
            }
            if self_closing {
                tag.push_str(" /");
            }
            tag.push('>');
            tag
        })
        .into_owned()
}

fn parse_attributes(body: &str) -> Vec<Attribute> {
    ATTRIBUTE
        .captures_iter(body)
        .map(|caps| Attribute {
            name: caps[1].to_string(),
            value: caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string()),
            text: caps[0].to_string(),
        })
        .collect()
}
