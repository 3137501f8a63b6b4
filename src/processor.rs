//! Unified media processor
//!
//! `MediaProcessor` owns one cascade per operation and is the entry point
//! used by the CLI and by embedding applications. Every public operation
//! returns `Option`: `None` means the whole cascade failed, and the reason
//! is only visible in the `tracing` output.

use crate::{
    background::BackgroundRemover,
    cascade::Cascade,
    config::CascadeConfig,
    crop::FrameCropper,
    download::{MediaRouter, Platform},
    error::Result,
    http::HttpClient,
    inpaint::{TextInpainter, WatermarkInpainter},
    links,
    session::ModelSession,
    types::{DownloadRequest, DownloadResult, ImageBuffer, Operation, TransformRequest},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Runs image transforms and media downloads through their cascades
pub struct MediaProcessor {
    config: CascadeConfig,
    background: BackgroundRemover,
    watermark: Cascade<ImageBuffer, ImageBuffer>,
    text: Cascade<ImageBuffer, ImageBuffer>,
    crop: Cascade<ImageBuffer, ImageBuffer>,
    router: MediaRouter,
}

impl MediaProcessor {
    /// Create a processor using the process-wide model session
    ///
    /// # Errors
    ///
    /// Returns `MediaError` for:
    /// - Invalid configuration values
    /// - HTTP client construction failures
    pub fn new(config: CascadeConfig) -> Result<Self> {
        let session = config
            .background
            .local_model
            .enabled
            .then(|| ModelSession::shared(&config.background.local_model));
        Self::with_session(config, session)
    }

    /// Create a processor with an explicit model session
    ///
    /// `None` leaves the local model stage out of the background chain.
    ///
    /// # Errors
    ///
    /// Returns `MediaError` for:
    /// - Invalid configuration values
    /// - HTTP client construction failures
    pub fn with_session(config: CascadeConfig, session: Option<Arc<ModelSession>>) -> Result<Self> {
        config.validate()?;
        let http = HttpClient::new(&config.http)?;

        let background = BackgroundRemover::with_session(&config.background, &http, session);
        let watermark = Cascade::new("watermark").with(WatermarkInpainter::new(config.watermark));
        let text = Cascade::new("text").with(TextInpainter::new(config.text));
        let crop = Cascade::new("crop").with(FrameCropper::new(config.crop));
        let router = MediaRouter::new(&config.providers, &http);

        tracing::debug!(
            background = ?background.stage_names(),
            "media processor ready"
        );

        Ok(Self {
            config,
            background,
            watermark,
            text,
            crop,
            router,
        })
    }

    #[must_use]
    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Stage names of the cascade serving `operation`
    #[must_use]
    pub fn stage_names(&self, operation: Operation) -> Vec<&str> {
        match operation {
            Operation::Background => self.background.stage_names(),
            Operation::Watermark => self.watermark.strategy_names(),
            Operation::Text => self.text.strategy_names(),
            Operation::Crop => self.crop.strategy_names(),
        }
    }

    /// Run the cascade selected by the request
    #[instrument(skip(self, request), fields(operation = %request.operation, bytes = request.input.len()))]
    pub async fn transform(&self, request: &TransformRequest) -> Option<ImageBuffer> {
        let start = Instant::now();
        let result = match request.operation {
            Operation::Background => self.background.remove(&request.input).await,
            Operation::Watermark => self.watermark.run(&request.input).await,
            Operation::Text => self.text.run(&request.input).await,
            Operation::Crop => self.crop.run(&request.input).await,
        };
        tracing::debug!(
            succeeded = result.is_some(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "transform finished"
        );
        result
    }

    pub async fn remove_background(&self, image: &ImageBuffer) -> Option<ImageBuffer> {
        self.background.remove(image).await
    }

    pub async fn remove_watermark(&self, image: &ImageBuffer) -> Option<ImageBuffer> {
        self.watermark.run(image).await
    }

    pub async fn remove_text_from_image(&self, image: &ImageBuffer) -> Option<ImageBuffer> {
        self.text.run(image).await
    }

    pub async fn crop_phone_frame(&self, image: &ImageBuffer) -> Option<ImageBuffer> {
        self.crop.run(image).await
    }

    /// Classify and download a URL
    #[instrument(skip(self))]
    pub async fn download_media(&self, url: &str) -> Option<DownloadResult> {
        self.router.download(url).await
    }

    pub async fn download(&self, request: &DownloadRequest) -> Option<DownloadResult> {
        self.download_media(&request.url).await
    }

    /// Download the first supported link found in free text
    pub async fn download_from_text(&self, text: &str) -> Option<DownloadResult> {
        let url = links::first_url(text)?;
        if !self.is_supported_url(url) {
            tracing::info!(url, "first link is not a supported platform");
            return None;
        }
        self.download_media(url).await
    }

    #[must_use]
    pub fn is_supported_url(&self, url: &str) -> bool {
        Platform::classify(url).is_some()
    }
}

impl std::fmt::Debug for MediaProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaProcessor")
            .field("background", &self.background)
            .field("watermark", &self.watermark)
            .field("text", &self.text)
            .field("crop", &self.crop)
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}
