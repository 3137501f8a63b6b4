//! Link extraction from free text

use regex::Regex;
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[^\s]+").unwrap_or_else(|e| panic!("invalid URL pattern: {e}"))
});

/// Every http(s) link in `text`, in order of appearance
#[must_use]
pub fn extract_urls(text: &str) -> Vec<&str> {
    URL_PATTERN.find_iter(text).map(|m| m.as_str()).collect()
}

/// The first http(s) link in `text`
#[must_use]
pub fn first_url(text: &str) -> Option<&str> {
    URL_PATTERN.find(text).map(|m| m.as_str())
}
