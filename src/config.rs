//! Configuration types for the image and download cascades
//!
//! Every threshold and kernel size used by the masking heuristics lives here
//! rather than in the algorithms, so they can be tuned per deployment.

use crate::error::{MediaError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default U2-Net model published alongside rembg
pub const DEFAULT_MODEL_URL: &str =
    "https://github.com/danielgatis/rembg/releases/download/v0.0.0/u2net.onnx";

/// HTTP client settings shared by every remote call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Timeout for JSON/HTML lookups, in seconds
    pub metadata_timeout_secs: u64,
    /// Timeout for binary media fetches, in seconds
    pub media_timeout_secs: u64,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            metadata_timeout_secs: 30,
            media_timeout_secs: 60,
            user_agent: concat!("media-cascade/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    #[must_use]
    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    #[must_use]
    pub fn media_timeout(&self) -> Duration {
        Duration::from_secs(self.media_timeout_secs)
    }
}

/// Local segmentation model settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalModelConfig {
    /// Whether the local AI stage takes part in the chain
    pub enabled: bool,
    /// Explicit model file; defaults to the cache location
    pub model_path: Option<PathBuf>,
    /// Where to fetch the model when it is not cached
    pub model_url: String,
    /// Expected SHA-256 of the model file (hex), checked after download
    pub model_sha256: Option<String>,
    /// Download the model on first use when missing
    pub allow_download: bool,
    /// Square input resolution of the model
    pub input_size: u32,
    /// Intra-op threads for inference (0 = auto)
    pub intra_threads: usize,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_path: None,
            model_url: DEFAULT_MODEL_URL.to_string(),
            model_sha256: None,
            allow_download: true,
            input_size: 320,
            intra_threads: 0,
        }
    }
}

/// Background-removal chain settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub erase_bg_url: String,
    pub erase_bg_timeout_secs: u64,
    pub photoroom_url: String,
    pub photoroom_timeout_secs: u64,
    pub remove_bg_url: String,
    /// remove.bg preview provider is only part of the chain when a key is set
    pub remove_bg_api_key: Option<String>,
    pub remove_bg_timeout_secs: u64,
    /// A pixel is background when R, G and B all exceed this value
    pub white_threshold: u8,
    pub local_model: LocalModelConfig,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            erase_bg_url: "https://api.erase.bg/upload".to_string(),
            erase_bg_timeout_secs: 60,
            photoroom_url: "https://sdk.photoroom.com/v1/segment".to_string(),
            photoroom_timeout_secs: 30,
            remove_bg_url: "https://api.remove.bg/v1.0/removebg".to_string(),
            remove_bg_api_key: None,
            remove_bg_timeout_secs: 30,
            white_threshold: 240,
            local_model: LocalModelConfig::default(),
        }
    }
}

/// Watermark mask and fill settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkConfig {
    /// Maximum saturation (0-255) of a watermark pixel
    pub max_saturation: u8,
    /// Minimum value/brightness (0-255) of a watermark pixel
    pub min_value: u8,
    /// Dilation kernel radius (1 = 3x3)
    pub dilate_radius: u8,
    pub dilate_iterations: u32,
    /// Fast-marching fill radius in pixels
    pub inpaint_radius: u32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            max_saturation: 30,
            min_value: 200,
            dilate_radius: 1,
            dilate_iterations: 1,
            inpaint_radius: 3,
        }
    }
}

/// Text mask and fill settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub canny_low: f32,
    pub canny_high: f32,
    /// Dilation kernel radius (1 = 3x3)
    pub dilate_radius: u8,
    pub dilate_iterations: u32,
    /// Diffusion fill radius in pixels
    pub inpaint_radius: u32,
    /// Relaxation passes of the diffusion fill
    pub diffusion_iterations: u32,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            dilate_radius: 1,
            dilate_iterations: 2,
            inpaint_radius: 5,
            diffusion_iterations: 40,
        }
    }
}

/// Phone frame crop settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// Percentage of the height removed from the top (status bar)
    pub top_percent: u32,
    /// Percentage of the height removed from the bottom (navigation bar)
    pub bottom_percent: u32,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            top_percent: 5,
            bottom_percent: 5,
        }
    }
}

/// Endpoints of the per-platform download providers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderEndpoints {
    pub tikwm_api: String,
    pub tikmate_api: String,
    pub igram_api: String,
    pub pinterest_api: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            tikwm_api: "https://www.tikwm.com/api/".to_string(),
            tikmate_api: "https://api.tikmate.app/api/lookup".to_string(),
            igram_api: "https://api.igram.io/api/ig".to_string(),
            pinterest_api: "https://api.pinterest.com/v3/pidgets/pins/info/".to_string(),
        }
    }
}

/// Complete configuration of the media cascades
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    pub http: HttpConfig,
    pub background: BackgroundConfig,
    pub watermark: WatermarkConfig,
    pub text: TextConfig,
    pub crop: CropConfig,
    pub providers: ProviderEndpoints,
}

impl CascadeConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> CascadeConfigBuilder {
        CascadeConfigBuilder::default()
    }

    /// Load a JSON configuration file; missing sections keep their defaults
    ///
    /// # Errors
    /// - File cannot be read
    /// - File is not valid JSON for this schema
    /// - Values fail validation
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| MediaError::file_io_error("read config file", path, &e))?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            MediaError::invalid_config(format!("Failed to parse '{}': {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration parameters
    ///
    /// # Errors
    /// - Zero timeouts
    /// - White threshold of 255 (no pixel could ever match)
    /// - Canny low threshold above the high threshold
    /// - Zero inpaint radius
    /// - Crop bands covering the whole height
    /// - Zero model input size
    pub fn validate(&self) -> Result<()> {
        if self.http.metadata_timeout_secs == 0 {
            return Err(MediaError::config_value_error(
                "metadata timeout",
                0,
                "1-3600 seconds",
                Some(30),
            ));
        }
        if self.http.media_timeout_secs == 0 {
            return Err(MediaError::config_value_error(
                "media timeout",
                0,
                "1-3600 seconds",
                Some(60),
            ));
        }
        if self.background.white_threshold == u8::MAX {
            return Err(MediaError::config_value_error(
                "white threshold",
                self.background.white_threshold,
                "0-254",
                Some(240),
            ));
        }
        if self.text.canny_low < 0.0 || self.text.canny_low > self.text.canny_high {
            return Err(MediaError::invalid_config(format!(
                "Invalid Canny thresholds: low {} must be between 0 and high {}",
                self.text.canny_low, self.text.canny_high
            )));
        }
        if self.watermark.inpaint_radius == 0 {
            return Err(MediaError::config_value_error(
                "watermark inpaint radius",
                0,
                "1-32",
                Some(3),
            ));
        }
        if self.text.inpaint_radius == 0 {
            return Err(MediaError::config_value_error(
                "text inpaint radius",
                0,
                "1-32",
                Some(5),
            ));
        }
        let crop_total = self.crop.top_percent.saturating_add(self.crop.bottom_percent);
        if crop_total >= 100 {
            return Err(MediaError::config_value_error(
                "crop band total",
                crop_total,
                "0-99 percent",
                Some(10),
            ));
        }
        if self.background.local_model.input_size == 0 {
            return Err(MediaError::config_value_error(
                "model input size",
                0,
                "positive pixel size",
                Some(320),
            ));
        }
        Ok(())
    }
}

/// Builder for `CascadeConfig`
#[derive(Debug, Default)]
pub struct CascadeConfigBuilder {
    config: CascadeConfig,
}

impl CascadeConfigBuilder {
    #[must_use]
    pub fn http(mut self, http: HttpConfig) -> Self {
        self.config.http = http;
        self
    }

    #[must_use]
    pub fn metadata_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http.metadata_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn media_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http.media_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn background(mut self, background: BackgroundConfig) -> Self {
        self.config.background = background;
        self
    }

    #[must_use]
    pub fn remove_bg_api_key(mut self, key: Option<String>) -> Self {
        self.config.background.remove_bg_api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    #[must_use]
    pub fn white_threshold(mut self, threshold: u8) -> Self {
        self.config.background.white_threshold = threshold;
        self
    }

    #[must_use]
    pub fn local_model(mut self, local_model: LocalModelConfig) -> Self {
        self.config.background.local_model = local_model;
        self
    }

    #[must_use]
    pub fn model_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.background.local_model.model_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn local_model_enabled(mut self, enabled: bool) -> Self {
        self.config.background.local_model.enabled = enabled;
        self
    }

    #[must_use]
    pub fn watermark(mut self, watermark: WatermarkConfig) -> Self {
        self.config.watermark = watermark;
        self
    }

    #[must_use]
    pub fn text(mut self, text: TextConfig) -> Self {
        self.config.text = text;
        self
    }

    #[must_use]
    pub fn crop(mut self, crop: CropConfig) -> Self {
        self.config.crop = crop;
        self
    }

    #[must_use]
    pub fn providers(mut self, providers: ProviderEndpoints) -> Self {
        self.config.providers = providers;
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// - Any value rejected by [`CascadeConfig::validate`]
    pub fn build(self) -> Result<CascadeConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
