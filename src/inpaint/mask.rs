//! Binary masks of the pixels to reconstruct
//!
//! Mask pixels are 255 (fill) or 0 (keep).

use crate::config::{TextConfig, WatermarkConfig};
use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::morphology::dilate;

/// HSV saturation and value of an RGB pixel on a 0-255 scale
#[must_use]
pub fn saturation_value(rgb: [u8; 3]) -> (u8, u8) {
    let max = rgb.iter().copied().max().unwrap_or(0);
    let min = rgb.iter().copied().min().unwrap_or(0);
    if max == 0 {
        return (0, 0);
    }
    let saturation = (u32::from(max - min) * 255 + u32::from(max) / 2) / u32::from(max);
    (saturation.min(255) as u8, max)
}

/// Dilate with a square kernel of the given radius, `iterations` times
#[must_use]
pub fn dilate_square(mask: &GrayImage, radius: u8, iterations: u32) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }
    (0..iterations).fold(mask.clone(), |acc, _| dilate(&acc, Norm::LInf, radius))
}

/// Low-saturation, high-brightness pixels (near-white overlays), slightly expanded
#[must_use]
pub fn watermark_mask(image: &RgbImage, config: &WatermarkConfig) -> GrayImage {
    let (width, height) = image.dimensions();
    let raw = GrayImage::from_fn(width, height, |x, y| {
        let (saturation, value) = saturation_value(image.get_pixel(x, y).0);
        let hit = saturation <= config.max_saturation && value >= config.min_value;
        Luma([if hit { 255 } else { 0 }])
    });
    dilate_square(&raw, config.dilate_radius, config.dilate_iterations)
}

/// Dual-threshold edges of the grayscale image, dilated to enclose thin strokes
#[must_use]
pub fn text_mask(image: &RgbImage, config: &TextConfig) -> GrayImage {
    let gray = image::DynamicImage::ImageRgb8(image.clone()).to_luma8();
    let edges = canny(&gray, config.canny_low, config.canny_high);
    dilate_square(&edges, config.dilate_radius, config.dilate_iterations)
}

/// Number of pixels selected by a mask
#[must_use]
pub fn mask_coverage(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p[0] > 0).count()
}
