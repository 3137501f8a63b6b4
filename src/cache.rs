//! Model cache management for downloaded segmentation models
//!
//! Models are single ONNX files stored in an XDG-compliant cache directory:
//! - Linux/macOS: `~/.cache/media-cascade/models/`
//! - Windows: `%LOCALAPPDATA%/media-cascade/models/`
//!
//! `MEDIA_CASCADE_CACHE_DIR` overrides the base directory.

use crate::error::{MediaError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the cache base directory
pub const CACHE_DIR_ENV: &str = "MEDIA_CASCADE_CACHE_DIR";

/// File name of the default U2-Net model
pub const DEFAULT_MODEL_FILE: &str = "u2net.onnx";

/// Information about a cached model file
#[derive(Debug, Clone)]
pub struct CachedModelInfo {
    pub file_name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Model cache manager
#[derive(Debug, Clone)]
pub struct ModelCache {
    cache_dir: PathBuf,
}

impl ModelCache {
    /// Create a cache manager rooted at the default location
    ///
    /// # Errors
    /// - Failed to determine cache directory
    /// - Failed to create cache directory
    pub fn new() -> Result<Self> {
        Self::with_dir(Self::default_cache_dir()?)
    }

    /// Create a cache manager rooted at `cache_dir`
    ///
    /// # Errors
    /// - Failed to create cache directory
    pub fn with_dir<P: Into<PathBuf>>(cache_dir: P) -> Result<Self> {
        let cache_dir = cache_dir.into();
        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir).map_err(|e| {
                MediaError::file_io_error("create cache directory", &cache_dir, &e)
            })?;
        }
        Ok(Self { cache_dir })
    }

    /// Resolve the default models directory
    ///
    /// # Errors
    /// - No user cache directory and no override set
    pub fn default_cache_dir() -> Result<PathBuf> {
        if let Ok(cache_override) = std::env::var(CACHE_DIR_ENV) {
            if !cache_override.trim().is_empty() {
                return Ok(PathBuf::from(cache_override).join("models"));
            }
        }

        Ok(dirs::cache_dir()
            .ok_or_else(|| {
                MediaError::invalid_config(format!(
                    "Failed to determine cache directory. Set {CACHE_DIR_ENV} environment variable."
                ))
            })?
            .join("media-cascade")
            .join("models"))
    }

    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of a model file inside the cache (may not exist)
    #[must_use]
    pub fn model_path(&self, file_name: &str) -> PathBuf {
        self.cache_dir.join(file_name)
    }

    /// Whether a non-empty model file is cached
    #[must_use]
    pub fn is_model_cached(&self, file_name: &str) -> bool {
        fs::metadata(self.model_path(file_name))
            .map(|meta| meta.is_file() && meta.len() > 0)
            .unwrap_or(false)
    }

    /// List cached `.onnx` files, sorted by name
    ///
    /// # Errors
    /// - Failed to read the cache directory
    pub fn scan_cached_models(&self) -> Result<Vec<CachedModelInfo>> {
        let mut models = Vec::new();
        if !self.cache_dir.exists() {
            return Ok(models);
        }

        let entries = fs::read_dir(&self.cache_dir).map_err(|e| {
            MediaError::file_io_error("read cache directory", &self.cache_dir, &e)
        })?;

        for entry in entries.flatten() {
            let path = entry.path();
            let is_onnx = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("onnx"));
            if !is_onnx || !path.is_file() {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
                models.push(CachedModelInfo {
                    file_name: file_name.to_string(),
                    size_bytes: entry.metadata().map(|m| m.len()).unwrap_or(0),
                    path: path.clone(),
                });
            }
        }

        models.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(models)
    }

    /// Remove one cached model file
    ///
    /// Returns `false` when the file was not cached.
    ///
    /// # Errors
    /// - Failed to remove the file
    pub fn clear_specific_model(&self, file_name: &str) -> Result<bool> {
        let path = self.model_path(file_name);
        if !path.exists() {
            return Ok(false);
        }
        tracing::info!(model = file_name, "removing cached model");
        fs::remove_file(&path)
            .map_err(|e| MediaError::file_io_error("remove cached model", &path, &e))?;
        Ok(true)
    }
}
