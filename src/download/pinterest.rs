//! Pinterest pins through the public pin-info widget endpoint

use crate::cascade::{Cascade, Strategy};
use crate::config::ProviderEndpoints;
use crate::error::{MediaError, Result};
use crate::http::HttpClient;
use crate::types::DownloadResult;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Image variants from highest to lowest resolution
const RESOLUTIONS: [&str; 4] = ["orig", "736x", "564x", "474x"];

static PIN_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [r"pin/(\d+)", r"pin\.it/(\w+)"]
        .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("invalid pin pattern {p}: {e}")))
});

/// Extract the pin identifier from a full or shortened pin URL
#[must_use]
pub fn pin_id(url: &str) -> Option<&str> {
    PIN_PATTERNS
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[derive(Debug, Deserialize)]
struct PinInfoResponse {
    #[serde(default)]
    data: Vec<PinData>,
}

#[derive(Debug, Deserialize)]
struct PinData {
    #[serde(default)]
    images: HashMap<String, PinImage>,
}

#[derive(Debug, Deserialize)]
struct PinImage {
    url: Option<String>,
}

impl PinData {
    fn best_image_url(&self) -> Option<&str> {
        RESOLUTIONS.iter().find_map(|key| {
            self.images
                .get(*key)
                .and_then(|image| image.url.as_deref())
                .filter(|u| !u.is_empty())
        })
    }
}

#[derive(Debug, Clone)]
pub struct PinInfoProvider {
    http: HttpClient,
    endpoint: String,
}

impl PinInfoProvider {
    pub fn new(http: HttpClient, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Strategy<str, DownloadResult> for PinInfoProvider {
    fn name(&self) -> &str {
        "pinterest"
    }

    async fn attempt(&self, url: &str) -> Result<DownloadResult> {
        let id = pin_id(url)
            .ok_or_else(|| MediaError::no_match(format!("No pin identifier in {url}")))?;

        let info: PinInfoResponse = self
            .http
            .get_json(&self.endpoint, &[("pin_ids", id)], "pinterest pin info")
            .await?;
        let image_url = info
            .data
            .first()
            .and_then(PinData::best_image_url)
            .ok_or_else(|| MediaError::contract(format!("pin {id} has no image URL")))?;

        let content = self.http.fetch_media(image_url, "pinterest image").await?;
        Ok(DownloadResult::photo(content, "pinterest_image.jpg"))
    }
}

pub fn cascade(endpoints: &ProviderEndpoints, http: &HttpClient) -> Cascade<str, DownloadResult> {
    Cascade::new("pinterest")
        .with(PinInfoProvider::new(http.clone(), endpoints.pinterest_api.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::types::MediaKind;
    use mockito::Matcher;

    fn provider(server: &mockito::Server) -> PinInfoProvider {
        PinInfoProvider::new(
            HttpClient::new(&HttpConfig::default()).unwrap(),
            format!("{}/pins/info/", server.url()),
        )
    }

    #[test]
    fn test_pin_id_extraction() {
        assert_eq!(
            pin_id("https://www.pinterest.com/pin/123456789012/"),
            Some("123456789012")
        );
        assert_eq!(pin_id("https://pin.it/4AbCdEf"), Some("4AbCdEf"));
        assert_eq!(pin_id("https://www.pinterest.com/someone/boards/"), None);
    }

    #[tokio::test]
    async fn test_highest_available_resolution_is_fetched() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();
        server
            .mock("GET", "/pins/info/")
            .match_query(Matcher::UrlEncoded("pin_ids".into(), "42".into()))
            .with_status(200)
            .with_body(format!(
                r#"{{"data":[{{"images":{{"237x":{{"url":"{base}/small"}},"564x":{{"url":"{base}/mid"}},"736x":{{"url":"{base}/large"}}}}}}]}}"#
            ))
            .create_async()
            .await;
        server
            .mock("GET", "/large")
            .with_status(200)
            .with_body("large-jpeg")
            .create_async()
            .await;

        let result = provider(&server)
            .attempt("https://www.pinterest.com/pin/42/")
            .await
            .unwrap();
        assert_eq!(result.kind, MediaKind::Photo);
        assert_eq!(result.content, b"large-jpeg");
        assert_eq!(result.suggested_name, "pinterest_image.jpg");
    }

    #[tokio::test]
    async fn test_url_without_pin_id_makes_no_request() {
        let mut server = mockito::Server::new_async().await;
        let info = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = provider(&server)
            .attempt("https://www.pinterest.com/ideas/")
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::NoMatch(_)));
        info.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_images_is_contract_violation() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/pins/info/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"data":[{"images":{}}]}"#)
            .create_async()
            .await;

        let err = provider(&server).attempt("https://pin.it/abc").await.unwrap_err();
        assert!(matches!(err, MediaError::ProviderContract(_)));
    }
}
