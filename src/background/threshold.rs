//! Deterministic near-white background removal
//!
//! A pixel is background when R, G and B all exceed the threshold; such
//! pixels become `(255, 255, 255, 0)`. Every other pixel is left untouched.

use crate::cascade::Strategy;
use crate::error::Result;
use crate::types::ImageBuffer;
use async_trait::async_trait;
use image::{DynamicImage, Rgba, RgbaImage};

/// Make near-white pixels fully transparent in place
pub fn clear_white_pixels(image: &mut RgbaImage, threshold: u8) {
    for pixel in image.pixels_mut() {
        let [r, g, b, _] = pixel.0;
        if r > threshold && g > threshold && b > threshold {
            *pixel = Rgba([255, 255, 255, 0]);
        }
    }
}

/// Decode, clear near-white pixels and encode as PNG
///
/// # Errors
/// - `MediaError::Decode` for unreadable input
/// - PNG encoding failure
pub fn remove_white_background(input: &ImageBuffer, threshold: u8) -> Result<ImageBuffer> {
    let mut rgba = input.decode()?.to_rgba8();
    clear_white_pixels(&mut rgba, threshold);
    ImageBuffer::encode_png(&DynamicImage::ImageRgba8(rgba))
}

/// Terminal stage of the background chain
#[derive(Debug, Clone, Copy)]
pub struct WhiteThresholdStrategy {
    threshold: u8,
}

impl WhiteThresholdStrategy {
    #[must_use]
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }
}

#[async_trait]
impl Strategy<ImageBuffer, ImageBuffer> for WhiteThresholdStrategy {
    fn name(&self) -> &str {
        "white-threshold"
    }

    async fn attempt(&self, image: &ImageBuffer) -> Result<ImageBuffer> {
        let input = image.clone();
        let threshold = self.threshold;
        tokio::task::spawn_blocking(move || remove_white_background(&input, threshold)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;
    use crate::test_utils::png_bytes;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_only_pixels_strictly_above_threshold_are_cleared() {
        let mut image = RgbaImage::new(4, 1);
        image.put_pixel(0, 0, Rgba([241, 241, 241, 255]));
        image.put_pixel(1, 0, Rgba([240, 255, 255, 255]));
        image.put_pixel(2, 0, Rgba([255, 255, 255, 255]));
        image.put_pixel(3, 0, Rgba([12, 200, 250, 255]));

        clear_white_pixels(&mut image, 240);

        assert_eq!(image.get_pixel(0, 0).0, [255, 255, 255, 0]);
        assert_eq!(image.get_pixel(1, 0).0, [240, 255, 255, 255]);
        assert_eq!(image.get_pixel(2, 0).0, [255, 255, 255, 0]);
        assert_eq!(image.get_pixel(3, 0).0, [12, 200, 250, 255]);
    }

    #[test]
    fn test_rgb_input_keeps_full_opacity_for_foreground() {
        let image = RgbImage::from_fn(8, 8, |x, _| {
            if x < 4 {
                Rgb([250, 250, 250])
            } else {
                Rgb([30, 60, 90])
            }
        });
        let output = remove_white_background(&png_bytes(image), 240).unwrap();
        let decoded = output.decode().unwrap().to_rgba8();

        assert_eq!(decoded.dimensions(), (8, 8));
        for (x, _, pixel) in decoded.enumerate_pixels() {
            if x < 4 {
                assert_eq!(pixel[3], 0);
            } else {
                assert_eq!(pixel.0, [30, 60, 90, 255]);
            }
        }
    }

    #[tokio::test]
    async fn test_strategy_rejects_malformed_input() {
        let strategy = WhiteThresholdStrategy::new(240);
        let err = strategy
            .attempt(&ImageBuffer::new(b"not an image".to_vec()))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Decode(_)));
    }
}
