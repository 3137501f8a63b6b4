#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # Media Cascade
//!
//! Image clean-up and social media download engine. Every operation is an
//! ordered cascade of interchangeable strategies: the first strategy that
//! succeeds wins, and an operation only fails when every strategy failed.
//!
//! ## Operations
//!
//! - **Background removal**: erase.bg, PhotoRoom, an optional remove.bg
//!   preview call, a local U²-Net model (ONNX Runtime), and finally a
//!   near-white threshold fallback
//! - **Watermark removal**: HSV mask of near-white overlays, fast-marching
//!   inpainting
//! - **Text removal**: Canny edge mask, diffusion inpainting
//! - **Frame crop**: drops the status and navigation bars of phone
//!   screenshots
//! - **Downloads**: TikTok, Instagram, Pinterest and Snapchat links, each
//!   with its own provider chain
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use media_cascade::{CascadeConfig, ImageBuffer, MediaProcessor, Operation, TransformRequest};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let processor = MediaProcessor::new(CascadeConfig::default())?;
//!
//! let input = ImageBuffer::new(std::fs::read("screenshot.png")?);
//! let operation = Operation::from_caption("remove the watermark");
//! match processor.transform(&TransformRequest::new(operation, input)).await {
//!     Some(png) => std::fs::write(operation.output_file_name(), png.as_bytes())?,
//!     None => eprintln!("every strategy failed"),
//! }
//!
//! if let Some(media) = processor
//!     .download_from_text("look https://www.tiktok.com/@someone/video/1")
//!     .await
//! {
//!     std::fs::write(&media.suggested_name, &media.content)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `onnx` (default): local U²-Net segmentation stage
//! - `cli` (default): command-line interface, progress bars and tracing setup
//! - `webp-support` (default): WebP decoding
//! - `tracing-json`: JSON log output for the CLI
//!
//! ### Library-Only Usage
//!
//! ```toml
//! [dependencies]
//! media-cascade = { version = "0.1", default-features = false, features = ["onnx"] }
//! ```

pub mod backends;
pub mod background;
pub mod cache;
pub mod cascade;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod crop;
pub mod download;
pub mod error;
pub mod http;
pub mod inference;
pub mod inpaint;
pub mod links;
pub mod model_download;
pub mod processor;
pub mod session;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

use tokio::io::AsyncRead;

// Public API exports
pub use background::BackgroundRemover;
pub use cache::{CachedModelInfo, ModelCache};
pub use cascade::{Cascade, Strategy};
pub use config::{
    BackgroundConfig, CascadeConfig, CascadeConfigBuilder, CropConfig, HttpConfig,
    LocalModelConfig, ProviderEndpoints, TextConfig, WatermarkConfig,
};
pub use download::{is_supported_url, MediaRouter, Platform};
pub use error::{ErrorKind, MediaError, Result};
pub use http::HttpClient;
pub use inference::{ModelLoader, SegmentationModel};
pub use links::{extract_urls, first_url};
pub use model_download::ModelDownloader;
pub use processor::MediaProcessor;
pub use session::ModelSession;
pub use types::{
    DownloadRequest, DownloadResult, ImageBuffer, MediaKind, Operation, TransformRequest,
};

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, TracingConfig, TracingFormat};

/// Run one transform on raw image bytes
///
/// Builds a processor for the call; reuse a [`MediaProcessor`] when
/// handling many requests.
///
/// # Returns
///
/// - `Ok(Some(png))` on success
/// - `Ok(None)` when every strategy of the cascade failed
/// - `Err(..)` for invalid configuration
///
/// ```rust,no_run
/// use media_cascade::{transform_bytes, CascadeConfig, Operation};
///
/// # async fn example(upload: Vec<u8>) -> anyhow::Result<()> {
/// let config = CascadeConfig::builder().local_model_enabled(false).build()?;
/// if let Some(png) = transform_bytes(&upload, Operation::Crop, &config).await? {
///     std::fs::write("cropped.png", png.as_bytes())?;
/// }
/// # Ok(())
/// # }
/// ```
pub async fn transform_bytes(
    image_bytes: &[u8],
    operation: Operation,
    config: &CascadeConfig,
) -> Result<Option<ImageBuffer>> {
    let processor = MediaProcessor::new(config.clone())?;
    let request = TransformRequest::new(operation, ImageBuffer::new(image_bytes));
    Ok(processor.transform(&request).await)
}

/// Run one transform on an async byte stream
pub async fn transform_from_reader<R: AsyncRead + Unpin>(
    mut reader: R,
    operation: Operation,
    config: &CascadeConfig,
) -> Result<Option<ImageBuffer>> {
    let mut buffer = Vec::new();
    tokio::io::AsyncReadExt::read_to_end(&mut reader, &mut buffer).await?;
    transform_bytes(&buffer, operation, config).await
}
