//! Remote segmentation providers
//!
//! Every provider uploads the image as multipart field `image_file`
//! (`image.png`, `image/png`). A result only counts when it decodes as an
//! image; non-PNG results are re-encoded to PNG.

use crate::cascade::Strategy;
use crate::error::{MediaError, Result};
use crate::http::HttpClient;
use crate::types::ImageBuffer;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;

fn image_form(image: &ImageBuffer) -> Result<Form> {
    let part = Part::bytes(image.as_bytes().to_vec())
        .file_name("image.png")
        .mime_str("image/png")
        .map_err(|e| MediaError::internal(format!("Invalid multipart mime type: {e}")))?;
    Ok(Form::new().part("image_file", part))
}

/// Decode check and PNG normalization off the async executor
async fn verified_png(bytes: Vec<u8>, provider: &str) -> Result<ImageBuffer> {
    let buffer = ImageBuffer::new(bytes);
    tokio::task::spawn_blocking(move || buffer.into_verified_png())
        .await?
        .map_err(|e| MediaError::contract(format!("{provider} returned an unreadable image: {e}")))
}

#[derive(Debug, Deserialize)]
struct EraseBgResponse {
    result_url: Option<String>,
}

/// Upload, then fetch the PNG from the returned `result_url`
#[derive(Debug, Clone)]
pub struct EraseBgProvider {
    http: HttpClient,
    endpoint: String,
    timeout: Duration,
}

impl EraseBgProvider {
    pub fn new(http: HttpClient, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Strategy<ImageBuffer, ImageBuffer> for EraseBgProvider {
    fn name(&self) -> &str {
        "erase.bg"
    }

    async fn attempt(&self, image: &ImageBuffer) -> Result<ImageBuffer> {
        let request = self
            .http
            .inner()
            .post(&self.endpoint)
            .multipart(image_form(image)?)
            .timeout(self.timeout);
        let response = self.http.send(request, "erase.bg upload").await?;
        let body: EraseBgResponse = HttpClient::read_json(response, "erase.bg upload").await?;

        let result_url = body
            .result_url
            .filter(|url| !url.is_empty())
            .ok_or_else(|| MediaError::contract("erase.bg response has no result_url"))?;

        let bytes = self.http.fetch_media(&result_url, "erase.bg result").await?;
        verified_png(bytes, "erase.bg").await
    }
}

/// Segmentation endpoint answering with the PNG directly
#[derive(Debug, Clone)]
pub struct PhotoRoomProvider {
    http: HttpClient,
    endpoint: String,
    timeout: Duration,
}

impl PhotoRoomProvider {
    pub fn new(http: HttpClient, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Strategy<ImageBuffer, ImageBuffer> for PhotoRoomProvider {
    fn name(&self) -> &str {
        "photoroom"
    }

    async fn attempt(&self, image: &ImageBuffer) -> Result<ImageBuffer> {
        let request = self
            .http
            .inner()
            .post(&self.endpoint)
            .header(reqwest::header::ACCEPT, "image/png")
            .multipart(image_form(image)?)
            .timeout(self.timeout);
        let response = self.http.send(request, "photoroom segment").await?;
        let bytes = HttpClient::read_body(response, "photoroom segment").await?;
        verified_png(bytes, "photoroom").await
    }
}

/// remove.bg preview-size cut-out; only used when an API key is configured
#[derive(Clone)]
pub struct RemoveBgPreviewProvider {
    http: HttpClient,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl RemoveBgPreviewProvider {
    pub fn new(
        http: HttpClient,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout,
        }
    }
}

impl std::fmt::Debug for RemoveBgPreviewProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoveBgPreviewProvider")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Strategy<ImageBuffer, ImageBuffer> for RemoveBgPreviewProvider {
    fn name(&self) -> &str {
        "remove.bg-preview"
    }

    async fn attempt(&self, image: &ImageBuffer) -> Result<ImageBuffer> {
        let form = image_form(image)?.text("size", "preview");
        let request = self
            .http
            .inner()
            .post(&self.endpoint)
            .header("X-Api-Key", &self.api_key)
            .multipart(form)
            .timeout(self.timeout);
        let response = self.http.send(request, "remove.bg preview").await?;
        let bytes = HttpClient::read_body(response, "remove.bg preview").await?;
        verified_png(bytes, "remove.bg").await
    }
}
