//! Phone-screenshot frame crop
//!
//! Removes fixed top and bottom bands (status bar and navigation bar) and
//! keeps the full width. Rows `[floor(H*top/100), floor(H*(100-bottom)/100))`
//! are kept.

use crate::cascade::Strategy;
use crate::config::CropConfig;
use crate::error::{MediaError, Result};
use crate::types::ImageBuffer;
use async_trait::async_trait;
use std::ops::Range;

/// Row range kept for an image of `height` rows
#[must_use]
pub fn kept_rows(height: u32, config: &CropConfig) -> Range<u32> {
    let height = u64::from(height);
    let start = height * u64::from(config.top_percent) / 100;
    let end = height * u64::from(100u32.saturating_sub(config.bottom_percent)) / 100;
    (start as u32)..(end.max(start) as u32)
}

/// Decode, crop and encode as PNG
///
/// # Errors
/// - `MediaError::Decode` for unreadable input
/// - `MediaError::Decode` when the kept range is empty
pub fn crop_phone_frame(input: &ImageBuffer, config: &CropConfig) -> Result<ImageBuffer> {
    let image = input.decode()?;
    let rows = kept_rows(image.height(), config);
    if rows.is_empty() {
        return Err(MediaError::decode(format!(
            "Image height {} leaves nothing after cropping",
            image.height()
        )));
    }
    let cropped = image.crop_imm(0, rows.start, image.width(), rows.end - rows.start);
    ImageBuffer::encode_png(&cropped)
}

/// Frame crop as a cascade stage
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCropper {
    config: CropConfig,
}

impl FrameCropper {
    #[must_use]
    pub fn new(config: CropConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Strategy<ImageBuffer, ImageBuffer> for FrameCropper {
    fn name(&self) -> &str {
        "frame-crop"
    }

    async fn attempt(&self, image: &ImageBuffer) -> Result<ImageBuffer> {
        let input = image.clone();
        let config = self.config;
        tokio::task::spawn_blocking(move || crop_phone_frame(&input, &config)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{png_bytes, solid_rgb};
    use image::{Rgb, RgbImage};

    #[test]
    fn test_kept_rows_matches_floor_bounds() {
        let config = CropConfig::default();
        assert_eq!(kept_rows(100, &config), 5..95);
        assert_eq!(kept_rows(1920, &config), 96..1824);
        assert_eq!(kept_rows(39, &config), 1..37);
        assert_eq!(kept_rows(19, &config), 0..18);
        assert!(kept_rows(1, &config).is_empty());
        assert!(kept_rows(0, &config).is_empty());
    }

    #[test]
    fn test_crop_keeps_width_and_middle_rows() {
        let image = RgbImage::from_fn(7, 40, |_, y| Rgb([y as u8, 0, 0]));
        let output = crop_phone_frame(&png_bytes(image), &CropConfig::default()).unwrap();
        let decoded = output.decode().unwrap().to_rgb8();

        assert_eq!(decoded.dimensions(), (7, 36));
        assert_eq!(decoded.get_pixel(0, 0)[0], 2);
        assert_eq!(decoded.get_pixel(6, 35)[0], 37);
    }

    #[test]
    fn test_single_row_image_fails() {
        let err = crop_phone_frame(&png_bytes(solid_rgb(5, 1, [1, 1, 1])), &CropConfig::default())
            .unwrap_err();
        assert!(matches!(err, MediaError::Decode(_)));
    }

    #[tokio::test]
    async fn test_strategy_rejects_garbage() {
        let err = FrameCropper::default()
            .attempt(&ImageBuffer::new(vec![1, 2, 3]))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Decode(_)));
    }
}
