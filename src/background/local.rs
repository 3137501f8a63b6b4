//! Local AI segmentation stage

use crate::cascade::Strategy;
use crate::error::Result;
use crate::inference::apply_mask;
use crate::session::ModelSession;
use crate::types::ImageBuffer;
use async_trait::async_trait;
use image::DynamicImage;
use std::sync::Arc;

/// Runs the once-loaded segmentation model on a blocking thread
#[derive(Debug, Clone)]
pub struct LocalModelStrategy {
    session: Arc<ModelSession>,
}

impl LocalModelStrategy {
    pub fn new(session: Arc<ModelSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Strategy<ImageBuffer, ImageBuffer> for LocalModelStrategy {
    fn name(&self) -> &str {
        "local-model"
    }

    async fn attempt(&self, image: &ImageBuffer) -> Result<ImageBuffer> {
        let model = self.session.model().await?;
        let input = image.clone();

        tokio::task::spawn_blocking(move || {
            let rgb = input.decode()?.to_rgb8();
            let mask = model.predict(&rgb)?;
            let cutout = apply_mask(&rgb, &mask);
            ImageBuffer::encode_png(&DynamicImage::ImageRgba8(cutout))
        })
        .await?
    }
}
