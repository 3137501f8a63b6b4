//! Snapchat stories scraped from the public story page

use crate::cascade::{Cascade, Strategy};
use crate::error::{MediaError, Result};
use crate::http::HttpClient;
use crate::types::DownloadResult;
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, LazyLock};

/// Finds candidate media links in a fetched page
pub trait MarkupExtractor: Send + Sync {
    /// Candidate URLs in preference order, already unescaped
    fn media_urls(&self, markup: &str) -> Vec<String>;
}

static MEDIA_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#""media_url":"([^"]+)""#,
        r#"source src="([^"]+\.mp4[^"]*)""#,
        r#""url":"(https://[^"]*\.mp4[^"]*)""#,
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("invalid media pattern {p}: {e}")))
    .collect()
});

/// Regex extraction over the page source
///
/// Each pattern contributes its first match, so an embedded `media_url`
/// is tried before a `<source>` tag, which is tried before a bare `.mp4`
/// URL in inline JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexExtractor;

impl MarkupExtractor for RegexExtractor {
    fn media_urls(&self, markup: &str) -> Vec<String> {
        let mut urls: Vec<String> = Vec::new();
        for pattern in MEDIA_PATTERNS.iter() {
            if let Some(found) = pattern.captures(markup).and_then(|c| c.get(1)) {
                let url = unescape_slashes(found.as_str());
                if !urls.contains(&url) {
                    urls.push(url);
                }
            }
        }
        urls
    }
}

/// Undo the JSON escaping of `/` found in inline script data
#[must_use]
pub fn unescape_slashes(raw: &str) -> String {
    raw.replace("\\u002F", "/").replace("\\/", "/")
}

#[derive(Clone)]
pub struct StoryPageScraper {
    http: HttpClient,
    extractor: Arc<dyn MarkupExtractor>,
}

impl StoryPageScraper {
    pub fn new(http: HttpClient) -> Self {
        Self::with_extractor(http, Arc::new(RegexExtractor))
    }

    pub fn with_extractor(http: HttpClient, extractor: Arc<dyn MarkupExtractor>) -> Self {
        Self { http, extractor }
    }
}

impl std::fmt::Debug for StoryPageScraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryPageScraper").finish_non_exhaustive()
    }
}

#[async_trait]
impl Strategy<str, DownloadResult> for StoryPageScraper {
    fn name(&self) -> &str {
        "snapchat-story"
    }

    async fn attempt(&self, url: &str) -> Result<DownloadResult> {
        let page = self.http.get_text(url, "snapchat page").await?;
        let candidates = self.extractor.media_urls(&page);
        if candidates.is_empty() {
            return Err(MediaError::no_match("no media link in snapchat page"));
        }

        let mut last_error = None;
        for candidate in &candidates {
            match self.http.fetch_media(candidate, "snapchat video").await {
                Ok(content) => return Ok(DownloadResult::video(content, "snapchat_video.mp4")),
                Err(e) => {
                    tracing::debug!(candidate, error = %e, "snapchat candidate failed");
                    last_error = Some(e);
                },
            }
        }
        Err(last_error.unwrap_or_else(|| MediaError::no_match("no media link in snapchat page")))
    }
}

pub fn cascade(http: &HttpClient) -> Cascade<str, DownloadResult> {
    Cascade::new("snapchat").with(StoryPageScraper::new(http.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::types::MediaKind;

    fn http() -> HttpClient {
        HttpClient::new(&HttpConfig::default()).unwrap()
    }

    #[test]
    fn test_extraction_order_and_unescaping() {
        let page = r#"<video><source src="https://cdn.example/b.mp4?x=1"></video>
            <script>{"media_url":"https://cdn.example/a.mp4"}</script>
            <script>{"url":"https:\/\/cdn.example\/c.mp4"}</script>"#;
        let urls = RegexExtractor.media_urls(page);
        assert_eq!(
            urls,
            vec![
                "https://cdn.example/a.mp4",
                "https://cdn.example/b.mp4?x=1",
            ]
        );
    }

    #[test]
    fn test_escaped_separators_are_unescaped() {
        let unicode = r#"<script>{"media_url":"https:\u002F\u002Fcdn.example\u002Fa.mp4"}</script>"#;
        assert_eq!(
            RegexExtractor.media_urls(unicode),
            vec!["https://cdn.example/a.mp4"]
        );

        let backslash = r#"<script>{"media_url":"https:\/\/cdn.example\/b.mp4"}</script>"#;
        assert_eq!(
            RegexExtractor.media_urls(backslash),
            vec!["https://cdn.example/b.mp4"]
        );

        assert_eq!(
            unescape_slashes(r"https:\/\/cdn\u002Fstory\/c.mp4"),
            "https://cdn/story/c.mp4"
        );
    }

    #[test]
    fn test_inline_json_url_pattern() {
        let page = r#"{"url":"https://cdn.example/story.mp4"}"#;
        assert_eq!(
            RegexExtractor.media_urls(page),
            vec!["https://cdn.example/story.mp4"]
        );
        assert!(RegexExtractor.media_urls("<html>nothing</html>").is_empty());
    }

    #[tokio::test]
    async fn test_later_candidate_used_when_first_fails() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();
        server
            .mock("GET", "/s/story")
            .with_status(200)
            .with_body(format!(
                r#"{{"media_url":"{base}/gone.mp4"}} <source src="{base}/ok.mp4">"#
            ))
            .create_async()
            .await;
        server
            .mock("GET", "/gone.mp4")
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", "/ok.mp4")
            .with_status(200)
            .with_body("story")
            .create_async()
            .await;

        let result = StoryPageScraper::new(http())
            .attempt(&format!("{base}/s/story"))
            .await
            .unwrap();
        assert_eq!(result.kind, MediaKind::Video);
        assert_eq!(result.content, b"story");
        assert_eq!(result.suggested_name, "snapchat_video.mp4");
    }

    #[tokio::test]
    async fn test_page_without_media_is_no_match() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/s/empty")
            .with_status(200)
            .with_body("<html></html>")
            .create_async()
            .await;

        let err = StoryPageScraper::new(http())
            .attempt(&format!("{}/s/empty", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::NoMatch(_)));
    }

    struct FixedExtractor(Vec<String>);

    impl MarkupExtractor for FixedExtractor {
        fn media_urls(&self, _markup: &str) -> Vec<String> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn test_custom_extractor_is_used() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();
        server
            .mock("GET", "/page")
            .with_status(200)
            .with_body("opaque")
            .create_async()
            .await;
        server
            .mock("GET", "/from-extractor.mp4")
            .with_status(200)
            .with_body("bytes")
            .create_async()
            .await;

        let scraper = StoryPageScraper::with_extractor(
            http(),
            Arc::new(FixedExtractor(vec![format!("{base}/from-extractor.mp4")])),
        );
        let result = scraper.attempt(&format!("{base}/page")).await.unwrap();
        assert_eq!(result.content, b"bytes");
    }
}
