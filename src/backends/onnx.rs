//! ONNX Runtime U2-Net segmentation backend
//!
//! The model takes a `[1, 3, S, S]` ImageNet-normalized tensor and returns a
//! saliency map whose first output is min-max normalized into the mask.

use crate::cache::{ModelCache, DEFAULT_MODEL_FILE};
use crate::config::LocalModelConfig;
use crate::error::{MediaError, Result};
use crate::inference::{ModelLoader, SegmentationModel};
use crate::model_download::ModelDownloader;
use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma, RgbImage};
use ndarray::{Array4, ArrayViewD};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::{self, value::Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// U2-Net model loaded into an ONNX Runtime session
pub struct U2NetSegmenter {
    session: Mutex<Session>,
    input_size: u32,
    name: String,
}

impl U2NetSegmenter {
    /// Build a session from a model file
    ///
    /// # Errors
    /// - ONNX Runtime session creation failures
    pub fn from_file(path: &Path, input_size: u32, intra_threads: usize) -> Result<Self> {
        let intra_threads = if intra_threads > 0 {
            intra_threads
        } else {
            std::thread::available_parallelism()
                .map(std::num::NonZero::get)
                .unwrap_or(4)
        };

        let session = Session::builder()
            .map_err(|e| MediaError::internal(format!("Failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| MediaError::internal(format!("Failed to set optimization level: {e}")))?
            .with_intra_threads(intra_threads)
            .map_err(|e| MediaError::internal(format!("Failed to set intra threads: {e}")))?
            .commit_from_file(path)
            .map_err(|e| {
                MediaError::internal(format!(
                    "Failed to create session from '{}': {e}",
                    path.display()
                ))
            })?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("u2net")
            .to_string();

        tracing::debug!(model = %name, input_size, intra_threads, "ONNX session created");

        Ok(Self {
            session: Mutex::new(session),
            input_size,
            name,
        })
    }
}

impl SegmentationModel for U2NetSegmenter {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, image: &RgbImage) -> Result<GrayImage> {
        let start = Instant::now();
        let input = preprocess(image, self.input_size);
        let input_value = Value::from_array(input)
            .map_err(|e| MediaError::internal(format!("Failed to convert input tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| MediaError::internal("ONNX session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|e| MediaError::internal(format!("ONNX inference failed: {e}")))?;

        let keys: Vec<_> = outputs.keys().collect();
        let first_key = keys
            .first()
            .ok_or_else(|| MediaError::internal("No output tensors found"))?;
        let saliency = outputs
            .get(first_key)
            .ok_or_else(|| MediaError::internal("First output tensor not found"))?
            .try_extract_array::<f32>()
            .map_err(|e| MediaError::internal(format!("Failed to extract output tensor: {e}")))?;

        let mask = postprocess(saliency.view(), image.width(), image.height())?;
        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "segmentation inference finished"
        );
        Ok(mask)
    }
}

impl fmt::Debug for U2NetSegmenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("U2NetSegmenter")
            .field("name", &self.name)
            .field("input_size", &self.input_size)
            .finish_non_exhaustive()
    }
}

/// Resize to `size`x`size` and normalize into an NCHW tensor
pub fn preprocess(image: &RgbImage, size: u32) -> Array4<f32> {
    let resized = imageops::resize(image, size, size, FilterType::Triangle);
    let side = size as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, side, side));

    for (x, y, pixel) in resized.enumerate_pixels() {
        for (channel, value) in pixel.0.iter().enumerate() {
            let normalized = (f32::from(*value) / 255.0 - MEAN[channel]) / STD[channel];
            tensor[[0, channel, y as usize, x as usize]] = normalized;
        }
    }

    tensor
}

/// Min-max normalize the first saliency plane and scale it back to `width`x`height`
///
/// # Errors
/// - Output tensor is not `[1, 1, H, W]` or `[1, H, W]`
pub fn postprocess(saliency: ArrayViewD<'_, f32>, width: u32, height: u32) -> Result<GrayImage> {
    let shape = saliency.shape();
    let (map_h, map_w) = match shape {
        [1, 1, h, w] | [1, h, w] => (*h, *w),
        _ => {
            return Err(MediaError::internal(format!(
                "Unexpected saliency shape {shape:?}"
            )))
        },
    };
    if map_h == 0 || map_w == 0 {
        return Err(MediaError::internal("Empty saliency map"));
    }

    let values: Vec<f32> = saliency.iter().copied().collect();
    let (min, max) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let range = max - min;

    let mut small = GrayImage::new(map_w as u32, map_h as u32);
    for (index, value) in values.iter().enumerate() {
        let normalized = if range > f32::EPSILON {
            (value - min) / range
        } else {
            0.0
        };
        let x = (index % map_w) as u32;
        let y = (index / map_w) as u32;
        small.put_pixel(x, y, Luma([(normalized * 255.0).round().clamp(0.0, 255.0) as u8]));
    }

    if small.dimensions() == (width, height) {
        return Ok(small);
    }
    Ok(imageops::resize(&small, width, height, FilterType::Triangle))
}

/// Loader that locates (or downloads) the U2-Net file and opens a session
pub struct OnnxModelLoader {
    config: LocalModelConfig,
    cache: Option<ModelCache>,
}

impl OnnxModelLoader {
    pub fn new(config: LocalModelConfig) -> Self {
        Self {
            config,
            cache: None,
        }
    }

    /// Use a specific cache instead of the default location
    #[must_use]
    pub fn with_cache(config: LocalModelConfig, cache: ModelCache) -> Self {
        Self {
            config,
            cache: Some(cache),
        }
    }

    /// Find the model file, downloading it into the cache when allowed
    ///
    /// # Errors
    /// - `MediaError::ResourceUnavailable` when the file is missing and cannot be fetched
    /// - Download and file system errors
    pub async fn ensure_model_file(&self) -> Result<PathBuf> {
        if let Some(path) = &self.config.model_path {
            if path.is_file() {
                return Ok(path.clone());
            }
            return Err(MediaError::resource_unavailable(format!(
                "Model file '{}' does not exist",
                path.display()
            )));
        }

        let cache = match &self.cache {
            Some(cache) => cache.clone(),
            None => ModelCache::new()?,
        };
        let path = cache.model_path(DEFAULT_MODEL_FILE);
        if cache.is_model_cached(DEFAULT_MODEL_FILE) {
            tracing::debug!(path = %path.display(), "using cached model");
            return Ok(path);
        }

        if !self.config.allow_download {
            return Err(MediaError::resource_unavailable(format!(
                "Model not cached at '{}' and downloads are disabled",
                path.display()
            )));
        }

        ModelDownloader::new(false)?
            .download_to(
                &self.config.model_url,
                &path,
                self.config.model_sha256.as_deref(),
            )
            .await
    }
}

#[async_trait]
impl ModelLoader for OnnxModelLoader {
    async fn load(&self) -> Result<Arc<dyn SegmentationModel>> {
        if !self.config.enabled {
            return Err(MediaError::resource_unavailable("local model disabled"));
        }

        let path = self.ensure_model_file().await?;
        let input_size = self.config.input_size;
        let intra_threads = self.config.intra_threads;

        let segmenter = tokio::task::spawn_blocking(move || {
            U2NetSegmenter::from_file(&path, input_size, intra_threads)
        })
        .await??;

        Ok(Arc::new(segmenter))
    }
}

impl fmt::Debug for OnnxModelLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxModelLoader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
