//! Segmentation model abstraction for the local AI fallback

use crate::error::Result;
use async_trait::async_trait;
use image::{GrayImage, RgbImage, RgbaImage};
use std::sync::Arc;

/// A loaded foreground segmentation model
pub trait SegmentationModel: Send + Sync {
    /// Model name for logs
    fn name(&self) -> &str;

    /// Predict a foreground mask with the same dimensions as `image`
    ///
    /// White (255) is foreground, black (0) is background.
    ///
    /// # Errors
    /// - Model inference failures
    /// - Tensor conversion or shape errors
    fn predict(&self, image: &RgbImage) -> Result<GrayImage>;
}

/// Produces a segmentation model on first use
#[async_trait]
pub trait ModelLoader: Send + Sync {
    /// Load (and if needed, fetch) the model
    ///
    /// # Errors
    /// - Model file missing and not downloadable
    /// - Runtime session creation failures
    async fn load(&self) -> Result<Arc<dyn SegmentationModel>>;
}

/// Combine an image with a foreground mask into a cut-out
///
/// The mask value becomes the alpha channel; fully transparent pixels are
/// zeroed.
#[must_use]
pub fn apply_mask(image: &RgbImage, mask: &GrayImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    let mut result = RgbaImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let alpha = mask.get_pixel_checked(x, y).map_or(0, |m| m[0]);
        if alpha > 0 {
            result.put_pixel(x, y, image::Rgba([pixel[0], pixel[1], pixel[2], alpha]));
        } else {
            result.put_pixel(x, y, image::Rgba([0, 0, 0, 0]));
        }
    }

    result
}
