//! Thin regex extraction over store web pages.
//!
//! None of the chains publish an API for flavors, so providers read a few
//! well-known landmarks (headings, embedded JSON) out of raw HTML.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<[^>]+>").expect("valid regex"));
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(h[1-6]|strong)\b([^>]*)>(.*?)</(?:h[1-6]|strong)\s*>").expect("valid regex")
});
static NEXT_DATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*\bid\s*=\s*["']__NEXT_DATA__["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});
static JSONLD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});
static CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\bclass\s*=\s*["']([^"']*)["']"#).expect("valid regex")
});
static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)\bid\s*=\s*["']([^"']*)["']"#).expect("valid regex"));
static OPEN_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<([a-z][a-z0-9]*)\b([^>]*)>").expect("valid regex"));
static BLOCK_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:br\s*/?|/?(?:p|div|li|ul|ol|tr|td|section|article|h[1-6])\b[^>]*)>")
        .expect("valid regex")
});
static SCRIPT_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(?:script|style)\s*>").expect("valid regex")
});

/// A heading-like element (`h1`..`h6` or `strong`) found in a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Lowercase tag name, e.g. `"h3"`.
    pub tag: String,
    /// Raw attribute text of the opening tag.
    pub attrs: String,
    /// Visible text, tags stripped and entities decoded.
    pub text: String,
    /// Byte offset of the opening `<` in the source page.
    pub start: usize,
}

impl Heading {
    /// `true` when the element's `class` attribute contains `needle`.
    #[must_use]
    pub fn has_class(&self, needle: &str) -> bool {
        class_contains(&self.attrs, needle)
    }
}

/// Every `h1`..`h6` and `strong` element in document order.
#[must_use]
pub fn headings(html: &str) -> Vec<Heading> {
    HEADING_RE
        .captures_iter(html)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            Some(Heading {
                tag: cap.get(1)?.as_str().to_ascii_lowercase(),
                attrs: cap.get(2).map_or("", |m| m.as_str()).to_string(),
                text: clean_text(cap.get(3).map_or("", |m| m.as_str())),
                start: whole.start(),
            })
        })
        .collect()
}

/// Strips tags, decodes common entities and collapses whitespace.
#[must_use]
pub fn clean_text(input: &str) -> String {
    let no_tags = TAG_RE.replace_all(input, " ");
    decode_entities(&no_tags)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[must_use]
pub fn decode_entities(value: &str) -> String {
    value
        .replace("&nbsp;", " ")
        .replace("&#160;", " ")
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&apos;", "'")
        .replace("&rsquo;", "\u{2019}")
        .replace("&#8217;", "\u{2019}")
        .replace("&lsquo;", "\u{2018}")
        .replace("&#8216;", "\u{2018}")
        .replace("&ndash;", "\u{2013}")
        .replace("&#8211;", "\u{2013}")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Folds typographic apostrophes to `'` and lowercases, for label matching.
#[must_use]
pub fn normalize_label(text: &str) -> String {
    text.replace(['\u{2019}', '\u{2018}'], "'").to_lowercase()
}

/// The parsed `__NEXT_DATA__` payload of a Next.js page.
#[must_use]
pub fn next_data(html: &str) -> Option<Value> {
    let raw = NEXT_DATA_RE.captures(html)?.get(1)?.as_str().trim();
    serde_json::from_str(raw).ok()
}

/// Every JSON-LD node on the page, with top-level arrays and `@graph`
/// containers flattened.
#[must_use]
pub fn jsonld_nodes(html: &str) -> Vec<Value> {
    let mut nodes = Vec::new();
    for cap in JSONLD_RE.captures_iter(html) {
        let raw = cap.get(1).map_or("", |m| m.as_str()).trim();
        let Ok(value) = serde_json::from_str::<Value>(raw) else {
            continue;
        };
        let top = match value {
            Value::Array(items) => items,
            other => vec![other],
        };
        for item in top {
            if let Some(graph) = item.get("@graph").and_then(Value::as_array) {
                nodes.extend(graph.iter().cloned());
            }
            nodes.push(item);
        }
    }
    nodes
}

/// `true` when a JSON-LD `@type` (string or array) names one of `types`.
#[must_use]
pub fn jsonld_type_is(node: &Value, types: &[&str]) -> bool {
    let matches = |s: &str| types.iter().any(|t| s.eq_ignore_ascii_case(t));
    match node.get("@type") {
        Some(Value::String(s)) => matches(s),
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).any(matches),
        _ => false,
    }
}

/// Byte offset just past the opening tag of the first element whose class
/// list contains `needle`.
#[must_use]
pub fn find_element_with_class(html: &str, needle: &str) -> Option<usize> {
    OPEN_TAG_RE
        .captures_iter(html)
        .find(|cap| class_contains(cap.get(2).map_or("", |m| m.as_str()), needle))
        .and_then(|cap| cap.get(0))
        .map(|m| m.end())
}

/// Opening tags of `tag` elements that carry an `id`, as
/// `(id, offset of the opening '<')` in document order.
#[must_use]
pub fn elements_with_id<'a>(html: &'a str, tag: &str) -> Vec<(&'a str, usize)> {
    OPEN_TAG_RE
        .captures_iter(html)
        .filter(|cap| cap.get(1).is_some_and(|m| m.as_str().eq_ignore_ascii_case(tag)))
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let attrs: &'a str = cap.get(2)?.as_str();
            let id = ID_RE.captures(attrs)?.get(1)?.as_str();
            Some((id, whole.start()))
        })
        .collect()
}

/// Visible text of the page split into trimmed, non-empty lines at block
/// element boundaries.
#[must_use]
pub fn text_lines(html: &str) -> Vec<String> {
    let without_code = SCRIPT_STYLE_RE.replace_all(html, " ");
    let broken = BLOCK_BREAK_RE.replace_all(&without_code, "\n");
    let no_tags = TAG_RE.replace_all(&broken, " ");
    decode_entities(&no_tags)
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect()
}

fn class_contains(attrs: &str, needle: &str) -> bool {
    CLASS_RE
        .captures(attrs)
        .and_then(|cap| cap.get(1))
        .is_some_and(|m| m.as_str().contains(needle))
}

#[cfg(test)]
#[path = "html_test.rs"]
mod tests;
