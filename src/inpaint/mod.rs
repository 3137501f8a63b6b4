//! Watermark and text removal
//!
//! Both operations build a binary mask of the artifact and then fill it from
//! the surrounding pixels:
//! - watermarks: HSV mask (low saturation, high value), fast-marching fill
//! - text: Canny edge mask, diffusion fill
//!
//! The result is always an RGB PNG with the input's dimensions.

pub mod diffusion;
pub mod mask;
pub mod telea;

use crate::cascade::Strategy;
use crate::config::{TextConfig, WatermarkConfig};
use crate::error::Result;
use crate::types::ImageBuffer;
use async_trait::async_trait;
use image::{DynamicImage, RgbImage};

pub use diffusion::inpaint_diffusion;
pub use mask::{text_mask, watermark_mask};
pub use telea::inpaint_telea;

/// Remove near-white overlays from decoded pixels
#[must_use]
pub fn clean_watermark(image: &RgbImage, config: &WatermarkConfig) -> RgbImage {
    let mask = watermark_mask(image, config);
    tracing::debug!(
        masked = mask::mask_coverage(&mask),
        "watermark mask built"
    );
    inpaint_telea(image, &mask, config.inpaint_radius)
}

/// Remove edge-dense text regions from decoded pixels
#[must_use]
pub fn clean_text(image: &RgbImage, config: &TextConfig) -> RgbImage {
    let mask = text_mask(image, config);
    tracing::debug!(masked = mask::mask_coverage(&mask), "text mask built");
    inpaint_diffusion(
        image,
        &mask,
        config.inpaint_radius,
        config.diffusion_iterations,
    )
}

/// Decode, remove the watermark and encode as PNG
///
/// # Errors
/// - `MediaError::Decode` for unreadable input
/// - PNG encoding failure
pub fn remove_watermark(input: &ImageBuffer, config: &WatermarkConfig) -> Result<ImageBuffer> {
    let rgb = input.decode()?.to_rgb8();
    ImageBuffer::encode_png(&DynamicImage::ImageRgb8(clean_watermark(&rgb, config)))
}

/// Decode, remove text and encode as PNG
///
/// # Errors
/// - `MediaError::Decode` for unreadable input
/// - PNG encoding failure
pub fn remove_text(input: &ImageBuffer, config: &TextConfig) -> Result<ImageBuffer> {
    let rgb = input.decode()?.to_rgb8();
    ImageBuffer::encode_png(&DynamicImage::ImageRgb8(clean_text(&rgb, config)))
}

/// Watermark removal as a cascade stage
#[derive(Debug, Clone, Copy, Default)]
pub struct WatermarkInpainter {
    config: WatermarkConfig,
}

impl WatermarkInpainter {
    #[must_use]
    pub fn new(config: WatermarkConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Strategy<ImageBuffer, ImageBuffer> for WatermarkInpainter {
    fn name(&self) -> &str {
        "watermark-inpaint"
    }

    async fn attempt(&self, image: &ImageBuffer) -> Result<ImageBuffer> {
        let input = image.clone();
        let config = self.config;
        tokio::task::spawn_blocking(move || remove_watermark(&input, &config)).await?
    }
}

/// Text removal as a cascade stage
#[derive(Debug, Clone, Copy, Default)]
pub struct TextInpainter {
    config: TextConfig,
}

impl TextInpainter {
    #[must_use]
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Strategy<ImageBuffer, ImageBuffer> for TextInpainter {
    fn name(&self) -> &str {
        "text-inpaint"
    }

    async fn attempt(&self, image: &ImageBuffer) -> Result<ImageBuffer> {
        let input = image.clone();
        let config = self.config;
        tokio::task::spawn_blocking(move || remove_text(&input, &config)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;
    use crate::test_utils::{gradient_rgb, png_bytes, solid_rgb};
    use image::{ImageFormat, Rgb};

    #[test]
    fn test_watermark_logo_is_filled_from_background() {
        let mut image = solid_rgb(40, 30, [30, 80, 160]);
        for y in 12..18 {
            for x in 15..25 {
                image.put_pixel(x, y, Rgb([245, 245, 245]));
            }
        }
        let output = clean_watermark(&image, &WatermarkConfig::default());
        assert_eq!(output.dimensions(), (40, 30));
        assert_eq!(output.get_pixel(20, 15).0, [30, 80, 160]);
        assert_eq!(output.get_pixel(0, 0).0, [30, 80, 160]);
    }

    #[test]
    fn test_watermark_output_is_png_with_same_dimensions() {
        let output =
            remove_watermark(&png_bytes(gradient_rgb(17, 9)), &WatermarkConfig::default())
                .unwrap();
        assert_eq!(output.format(), Some(ImageFormat::Png));
        let decoded = output.decode().unwrap();
        assert_eq!((decoded.width(), decoded.height()), (17, 9));
    }

    #[test]
    fn test_all_white_image_does_not_panic() {
        let output = remove_watermark(
            &png_bytes(solid_rgb(12, 12, [255, 255, 255])),
            &WatermarkConfig::default(),
        )
        .unwrap();
        assert_eq!(output.decode().unwrap().to_rgb8(), solid_rgb(12, 12, [255, 255, 255]));
    }

    #[test]
    fn test_text_removal_keeps_dimensions() {
        let mut image = solid_rgb(48, 24, [240, 240, 240]);
        for x in (6..42).step_by(4) {
            for y in 8..16 {
                image.put_pixel(x, y, Rgb([0, 0, 0]));
            }
        }
        let output = remove_text(&png_bytes(image), &TextConfig::default()).unwrap();
        let decoded = output.decode().unwrap();
        assert_eq!((decoded.width(), decoded.height()), (48, 24));
    }

    #[tokio::test]
    async fn test_strategies_reject_undecodable_input() {
        let garbage = ImageBuffer::new(b"\x89PNG broken".to_vec());
        let err = WatermarkInpainter::default().attempt(&garbage).await.unwrap_err();
        assert!(matches!(err, MediaError::Decode(_)));
        let err = TextInpainter::default().attempt(&garbage).await.unwrap_err();
        assert!(matches!(err, MediaError::Decode(_)));
    }
}
