//! Media Cascade CLI Tool
//!
//! Image clean-up (background, watermark, text, frame crop) and social media
//! downloads, each backed by an ordered chain of providers.

#[cfg(feature = "cli")]
use media_cascade::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
