//! Test utilities and mocks for cascade, model and image tests
//!
//! Mocks record how often they were called so tests can verify that
//! cascades short-circuit and that the model is loaded only once.

use crate::cascade::Strategy;
use crate::error::{MediaError, Result};
use crate::inference::{ModelLoader, SegmentationModel};
use crate::types::ImageBuffer;
use async_trait::async_trait;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared call counter handed out before a mock is moved into a cascade
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Strategy that either always fails or always returns a fixed value
#[derive(Debug)]
pub struct MockStrategy<O> {
    name: String,
    output: Option<O>,
    calls: CallCounter,
}

impl<O> MockStrategy<O> {
    pub fn failing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            output: None,
            calls: CallCounter::default(),
        }
    }

    pub fn succeeding(name: &str, output: O) -> Self {
        Self {
            name: name.to_string(),
            output: Some(output),
            calls: CallCounter::default(),
        }
    }

    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }
}

#[async_trait]
impl<I, O> Strategy<I, O> for MockStrategy<O>
where
    I: ?Sized + Sync,
    O: Clone + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(&self, _input: &I) -> Result<O> {
        self.calls.increment();
        self.output
            .clone()
            .ok_or_else(|| MediaError::network(format!("{} unavailable", self.name)))
    }
}

/// Segmenter that marks the central half of the image as foreground
#[derive(Debug, Default)]
pub struct MockSegmenter {
    fail: bool,
}

impl MockSegmenter {
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl SegmentationModel for MockSegmenter {
    fn name(&self) -> &str {
        "mock-segmenter"
    }

    fn predict(&self, image: &RgbImage) -> Result<GrayImage> {
        if self.fail {
            return Err(MediaError::internal("mock inference failure"));
        }
        let (width, height) = image.dimensions();
        Ok(GrayImage::from_fn(width, height, |x, y| {
            let inside = x >= width / 4 && x < width * 3 / 4 && y >= height / 4 && y < height * 3 / 4;
            Luma([if inside { 255 } else { 0 }])
        }))
    }
}

/// Loader returning a [`MockSegmenter`] or a forced failure
#[derive(Debug)]
pub struct MockLoader {
    fail: bool,
    failing_model: bool,
    delay: Duration,
    loads: CallCounter,
}

impl MockLoader {
    pub fn succeeding() -> Self {
        Self {
            fail: false,
            failing_model: false,
            delay: Duration::ZERO,
            loads: CallCounter::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::succeeding()
        }
    }

    /// Loads fine but every prediction fails
    pub fn with_failing_model() -> Self {
        Self {
            failing_model: true,
            ..Self::succeeding()
        }
    }

    pub fn with_delay_ms(mut self, millis: u64) -> Self {
        self.delay = Duration::from_millis(millis);
        self
    }

    pub fn loads(&self) -> CallCounter {
        self.loads.clone()
    }
}

#[async_trait]
impl ModelLoader for MockLoader {
    async fn load(&self) -> Result<Arc<dyn SegmentationModel>> {
        self.loads.increment();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(MediaError::resource_unavailable("mock model missing"));
        }
        if self.failing_model {
            return Ok(Arc::new(MockSegmenter::failing()));
        }
        Ok(Arc::new(MockSegmenter::default()))
    }
}

/// Solid-color RGB image
pub fn solid_rgb(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(color))
}

/// Saturated mid-tone gradient; no watermark or white-threshold pixel
pub fn gradient_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 120 / width.max(1)) as u8 + 20;
        let g = (y * 120 / height.max(1)) as u8 + 20;
        Rgb([r, g, 90])
    })
}

/// Encode an RGB image as PNG bytes
pub fn png_bytes(image: RgbImage) -> ImageBuffer {
    ImageBuffer::encode_png(&DynamicImage::ImageRgb8(image)).unwrap()
}

/// Encode an RGB image as JPEG bytes
pub fn jpeg_bytes(image: RgbImage) -> Vec<u8> {
    let mut out = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut out, image::ImageFormat::Jpeg)
        .unwrap();
    out.into_inner()
}
