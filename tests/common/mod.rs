//! Shared fixtures for integration tests

#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use media_cascade::{
    BackgroundConfig, CascadeConfig, ImageBuffer, MediaProcessor, ProviderEndpoints,
};
use std::io::Cursor;

pub const BACKGROUND: [u8; 3] = [30, 80, 160];
pub const LOGO: [u8; 3] = [248, 248, 248];

/// Solid blue frame with a near-white rectangle covering `logo`
pub fn frame_with_logo(width: u32, height: u32, logo: (u32, u32, u32, u32)) -> RgbImage {
    let (x0, y0, x1, y1) = logo;
    RgbImage::from_fn(width, height, |x, y| {
        if (x0..x1).contains(&x) && (y0..y1).contains(&y) {
            Rgb(LOGO)
        } else {
            Rgb(BACKGROUND)
        }
    })
}

pub fn encode(image: &RgbImage, format: ImageFormat) -> ImageBuffer {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image.clone())
        .write_to(&mut Cursor::new(&mut bytes), format)
        .unwrap();
    ImageBuffer::new(bytes)
}

/// Configuration with every remote endpoint pointed at `base` and no local model
pub fn config_for(base: &str) -> CascadeConfig {
    CascadeConfig::builder()
        .background(BackgroundConfig {
            erase_bg_url: format!("{base}/erase/upload"),
            photoroom_url: format!("{base}/photoroom/segment"),
            remove_bg_url: format!("{base}/removebg"),
            ..BackgroundConfig::default()
        })
        .local_model_enabled(false)
        .providers(ProviderEndpoints {
            tikwm_api: format!("{base}/tikwm/api/"),
            tikmate_api: format!("{base}/tikmate/api/lookup"),
            igram_api: format!("{base}/igram/convert"),
            pinterest_api: format!("{base}/pinterest/pins/info/"),
        })
        .build()
        .unwrap()
}

/// Address of a server that accepts connections and never answers
pub async fn silent_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}")
}

pub fn processor_for(base: &str) -> MediaProcessor {
    MediaProcessor::with_session(config_for(base), None).unwrap()
}
