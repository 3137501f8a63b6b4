//! Background-removal strategy chain
//!
//! Stages in order: erase.bg, PhotoRoom, remove.bg preview (only with an API
//! key), the local segmentation model, and the near-white threshold
//! fallback. Remote AI-quality providers come first and the naive heuristic
//! last.

pub mod local;
pub mod remote;
pub mod threshold;

use crate::cascade::Cascade;
use crate::config::BackgroundConfig;
use crate::http::HttpClient;
use crate::session::ModelSession;
use crate::types::ImageBuffer;
use std::sync::Arc;
use std::time::Duration;

pub use local::LocalModelStrategy;
pub use remote::{EraseBgProvider, PhotoRoomProvider, RemoveBgPreviewProvider};
pub use threshold::{remove_white_background, WhiteThresholdStrategy};

/// Ordered background-removal cascade
#[derive(Debug)]
pub struct BackgroundRemover {
    cascade: Cascade<ImageBuffer, ImageBuffer>,
}

impl BackgroundRemover {
    /// Build the chain using the process-wide model session
    pub fn new(config: &BackgroundConfig, http: &HttpClient) -> Self {
        let session = config
            .local_model
            .enabled
            .then(|| ModelSession::shared(&config.local_model));
        Self::with_session(config, http, session)
    }

    /// Build the chain with an explicit model session (`None` drops the stage)
    pub fn with_session(
        config: &BackgroundConfig,
        http: &HttpClient,
        session: Option<Arc<ModelSession>>,
    ) -> Self {
        let mut cascade = Cascade::new("background")
            .with(EraseBgProvider::new(
                http.clone(),
                config.erase_bg_url.clone(),
                Duration::from_secs(config.erase_bg_timeout_secs),
            ))
            .with(PhotoRoomProvider::new(
                http.clone(),
                config.photoroom_url.clone(),
                Duration::from_secs(config.photoroom_timeout_secs),
            ));

        let api_key = config
            .remove_bg_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty());
        if let Some(key) = api_key {
            cascade.push(Box::new(RemoveBgPreviewProvider::new(
                http.clone(),
                config.remove_bg_url.clone(),
                key,
                Duration::from_secs(config.remove_bg_timeout_secs),
            )));
        }

        if let Some(session) = session {
            cascade.push(Box::new(LocalModelStrategy::new(session)));
        }

        cascade.push(Box::new(WhiteThresholdStrategy::new(config.white_threshold)));
        Self { cascade }
    }

    /// Build from an already assembled cascade
    #[must_use]
    pub fn from_cascade(cascade: Cascade<ImageBuffer, ImageBuffer>) -> Self {
        Self { cascade }
    }

    /// First successful cut-out, or `None` when every stage failed
    pub async fn remove(&self, image: &ImageBuffer) -> Option<ImageBuffer> {
        self.cascade.run(image).await
    }

    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.cascade.strategy_names()
    }
}
