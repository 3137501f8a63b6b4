//! Process-wide, lazily initialized segmentation model handle
//!
//! The model is loaded at most once. Concurrent first callers wait on the
//! same initialization, and a failed load is remembered so every later
//! caller observes the same failure instead of retrying.

use crate::config::LocalModelConfig;
use crate::error::{MediaError, Result};
use crate::inference::{ModelLoader, SegmentationModel};
use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio::sync::OnceCell;

type LoadOutcome = std::result::Result<Arc<dyn SegmentationModel>, String>;

/// Once-initialized holder of the local segmentation model
pub struct ModelSession {
    loader: Arc<dyn ModelLoader>,
    cell: OnceCell<LoadOutcome>,
}

static SHARED_SESSION: OnceLock<Arc<ModelSession>> = OnceLock::new();

impl ModelSession {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            cell: OnceCell::new(),
        }
    }

    /// The process-wide session
    ///
    /// The first call fixes the model configuration; later calls return the
    /// same session regardless of `config`.
    pub fn shared(config: &LocalModelConfig) -> Arc<Self> {
        SHARED_SESSION
            .get_or_init(|| Arc::new(Self::new(default_loader(config))))
            .clone()
    }

    /// Obtain the model, loading it on first use
    ///
    /// # Errors
    /// - `MediaError::ResourceUnavailable` when the (single) load attempt failed
    pub async fn model(&self) -> Result<Arc<dyn SegmentationModel>> {
        let outcome = self
            .cell
            .get_or_init(|| async {
                match self.loader.load().await {
                    Ok(model) => {
                        tracing::info!(model = model.name(), "local segmentation model loaded");
                        Ok(model)
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "local segmentation model unavailable");
                        Err(e.to_string())
                    },
                }
            })
            .await;

        outcome
            .clone()
            .map_err(MediaError::resource_unavailable)
    }

    /// Whether a load attempt has completed (successfully or not)
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}

impl fmt::Debug for ModelSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.cell.get() {
            None => "pending",
            Some(Ok(_)) => "loaded",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("ModelSession").field("state", &state).finish()
    }
}

#[cfg(feature = "onnx")]
fn default_loader(config: &LocalModelConfig) -> Arc<dyn ModelLoader> {
    Arc::new(crate::backends::onnx::OnnxModelLoader::new(config.clone()))
}

#[cfg(not(feature = "onnx"))]
fn default_loader(_config: &LocalModelConfig) -> Arc<dyn ModelLoader> {
    Arc::new(UnavailableLoader)
}

/// Loader used when the crate is built without a model runtime
#[cfg(not(feature = "onnx"))]
struct UnavailableLoader;

#[cfg(not(feature = "onnx"))]
#[async_trait::async_trait]
impl ModelLoader for UnavailableLoader {
    async fn load(&self) -> Result<Arc<dyn SegmentationModel>> {
        Err(MediaError::resource_unavailable(
            "built without the `onnx` feature",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockLoader;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_use_loads_once() {
        let loader = MockLoader::succeeding().with_delay_ms(50);
        let loads = loader.loads();
        let session = Arc::new(ModelSession::new(Arc::new(loader)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let session = Arc::clone(&session);
                tokio::spawn(async move { session.model().await.map(|m| m.name().to_string()) })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "mock-segmenter");
        }
        assert_eq!(loads.get(), 1);
        assert!(session.is_initialized());
    }

    #[tokio::test]
    async fn test_failed_load_is_remembered() {
        let loader = MockLoader::failing();
        let loads = loader.loads();
        let session = ModelSession::new(Arc::new(loader));

        let first = session.model().await.err().unwrap();
        let second = session.model().await.err().unwrap();
        assert!(matches!(first, MediaError::ResourceUnavailable(_)));
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(loads.get(), 1);
        assert!(format!("{session:?}").contains("failed"));
    }

    #[tokio::test]
    async fn test_pending_until_first_use() {
        let session = ModelSession::new(Arc::new(MockLoader::succeeding()));
        assert!(!session.is_initialized());
        assert!(format!("{session:?}").contains("pending"));
        session.model().await.unwrap();
        assert!(format!("{session:?}").contains("loaded"));
    }
}
