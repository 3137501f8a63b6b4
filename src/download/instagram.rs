//! Instagram posts and reels through an igram-style resolver

use crate::cascade::{Cascade, Strategy};
use crate::config::ProviderEndpoints;
use crate::error::{MediaError, Result};
use crate::http::HttpClient;
use crate::types::DownloadResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ResolveRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResolveResponse {
    #[serde(default)]
    items: Vec<ResolvedItem>,
}

#[derive(Debug, Deserialize)]
struct ResolvedItem {
    url: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl ResolvedItem {
    fn is_video(&self) -> bool {
        self.kind
            .as_deref()
            .is_some_and(|k| k.to_lowercase().contains("video"))
    }
}

#[derive(Debug, Clone)]
pub struct IgramProvider {
    http: HttpClient,
    endpoint: String,
}

impl IgramProvider {
    pub fn new(http: HttpClient, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Strategy<str, DownloadResult> for IgramProvider {
    fn name(&self) -> &str {
        "igram"
    }

    async fn attempt(&self, url: &str) -> Result<DownloadResult> {
        let response: ResolveResponse = self
            .http
            .post_json(&self.endpoint, &ResolveRequest { url }, "igram lookup")
            .await?;

        let item = response
            .items
            .into_iter()
            .next()
            .ok_or_else(|| MediaError::contract("igram response has no items"))?;
        let media_url = item
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| MediaError::contract("igram item has no url"))?;

        let content = self.http.fetch_media(media_url, "instagram media").await?;
        Ok(if item.is_video() {
            DownloadResult::video(content, "instagram_video.mp4")
        } else {
            DownloadResult::photo(content, "instagram_photo.jpg")
        })
    }
}

pub fn cascade(endpoints: &ProviderEndpoints, http: &HttpClient) -> Cascade<str, DownloadResult> {
    Cascade::new("instagram").with(IgramProvider::new(http.clone(), endpoints.igram_api.clone()))
}
