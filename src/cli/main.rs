//! Media Cascade CLI
//!
//! Command-line front end for the image transforms and media downloads.

use super::config::CliConfigBuilder;
use crate::{
    cache::{ModelCache, DEFAULT_MODEL_FILE},
    download::Platform,
    links,
    model_download::ModelDownloader,
    processor::MediaProcessor,
    tracing_config::{init_cli_tracing, spans},
    types::{ImageBuffer, Operation, TransformRequest},
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::Instrument;

/// Image clean-up and social media downloads with provider fallbacks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "media-cascade")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// JSON configuration file
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Local U2-Net ONNX model file
    #[arg(long, value_name = "FILE", global = true)]
    pub model: Option<PathBuf>,

    /// Leave the local model out of the background chain
    #[arg(long, global = true)]
    pub no_local_model: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Remove the background (PNG with transparency)
    Background(TransformArgs),
    /// Remove near-white watermarks
    Watermark(TransformArgs),
    /// Remove overlaid text
    Text(TransformArgs),
    /// Crop the status and navigation bars of a phone screenshot
    Crop(TransformArgs),
    /// Pick the operation from a caption
    Auto {
        #[command(flatten)]
        transform: TransformArgs,

        /// Caption text; no caption means background removal
        #[arg(long)]
        caption: Option<String>,
    },
    /// Download the first supported link found in the text
    Download {
        /// URL or free text containing a URL
        #[arg(value_name = "TEXT_OR_URL")]
        text: String,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },
    /// Print the platform a URL belongs to
    Classify {
        #[arg(value_name = "URL")]
        url: String,
    },
    /// Manage the cached segmentation model
    Models(ModelsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TransformArgs {
    /// Input image (use "-" for stdin)
    #[arg(value_name = "INPUT")]
    pub input: String,

    /// Output file (use "-" for stdout) [default: operation-specific name]
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<String>,
}

#[derive(Args, Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct ModelsArgs {
    /// Download the configured model into the cache
    #[arg(long)]
    pub download: bool,

    /// List cached models
    #[arg(long)]
    pub list: bool,

    /// Remove the default model from the cache
    #[arg(long)]
    pub clear: bool,

    /// Show the cache directory
    #[arg(long)]
    pub show_cache_dir: bool,
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_cli_tracing(cli.verbose).context("Failed to initialize tracing")?;
    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let config = CliConfigBuilder::from_cli(&cli).context("Failed to build configuration")?;

    match &cli.command {
        Command::Classify { url } => {
            match Platform::classify(url) {
                Some(platform) => println!("{platform}"),
                None => println!("unsupported"),
            }
            Ok(())
        },
        Command::Models(args) => manage_models(args, &config).await,
        Command::Download { text, output } => {
            let processor = MediaProcessor::new(config).context("Failed to create processor")?;
            download(&processor, text, output.as_deref()).await
        },
        Command::Background(args) => run_transform(config, Operation::Background, args).await,
        Command::Watermark(args) => run_transform(config, Operation::Watermark, args).await,
        Command::Text(args) => run_transform(config, Operation::Text, args).await,
        Command::Crop(args) => run_transform(config, Operation::Crop, args).await,
        Command::Auto { transform, caption } => {
            let operation = Operation::from_caption(caption.as_deref().unwrap_or_default());
            tracing::info!(%operation, "operation selected from caption");
            run_transform(config, operation, transform).await
        },
    }
}

async fn run_transform(
    config: crate::config::CascadeConfig,
    operation: Operation,
    args: &TransformArgs,
) -> Result<()> {
    let processor = MediaProcessor::new(config).context("Failed to create processor")?;
    let input = read_input(&args.input)?;
    let start = Instant::now();

    let span = spans::transform(&operation.to_string(), Path::new(&args.input));
    let output = processor
        .transform(&TransformRequest::new(operation, input))
        .instrument(span)
        .await
        .with_context(|| format!("{operation} failed: every strategy was exhausted"))?;

    let destination = args
        .output
        .clone()
        .unwrap_or_else(|| operation.output_file_name().to_string());
    write_output(&destination, output.as_bytes())?;

    tracing::info!(
        %operation,
        output = %destination,
        bytes = output.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "transform complete"
    );
    Ok(())
}

async fn download(processor: &MediaProcessor, text: &str, output_dir: Option<&Path>) -> Result<()> {
    let url = links::first_url(text)
        .or_else(|| Some(text.trim()).filter(|t| !t.is_empty()))
        .context("No link found in input")?;
    let platform = Platform::classify(url)
        .with_context(|| format!("Unsupported link: {url}"))?;

    let result = processor
        .download_media(url)
        .instrument(spans::download(url))
        .await
        .with_context(|| format!("{platform} download failed: every provider was exhausted"))?;

    let directory = output_dir.unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create {}", directory.display()))?;
    let destination = directory.join(&result.suggested_name);
    std::fs::write(&destination, &result.content)
        .with_context(|| format!("Failed to write {}", destination.display()))?;

    println!("{} ({}, {} bytes)", destination.display(), result.kind, result.content.len());
    Ok(())
}

async fn manage_models(args: &ModelsArgs, config: &crate::config::CascadeConfig) -> Result<()> {
    let cache = ModelCache::new().context("Failed to initialize model cache")?;
    let local = &config.background.local_model;

    if args.show_cache_dir {
        println!("{}", cache.cache_dir().display());
    }

    if args.download {
        let destination = cache.model_path(DEFAULT_MODEL_FILE);
        let path = ModelDownloader::new(true)
            .context("Failed to create model downloader")?
            .download_to(&local.model_url, &destination, local.model_sha256.as_deref())
            .await
            .context("Failed to download model")?;
        println!("Downloaded {}", path.display());
    }

    if args.clear {
        if cache
            .clear_specific_model(DEFAULT_MODEL_FILE)
            .context("Failed to clear model")?
        {
            println!("Removed {DEFAULT_MODEL_FILE}");
        } else {
            println!("{DEFAULT_MODEL_FILE} is not cached");
        }
    }

    if args.list || !(args.download || args.clear || args.show_cache_dir) {
        let models = cache.scan_cached_models().context("Failed to list cached models")?;
        if models.is_empty() {
            println!("No cached models in {}", cache.cache_dir().display());
        }
        for model in models {
            println!(
                "{}\t{:.2} MB\t{}",
                model.file_name,
                model.size_bytes as f64 / 1_048_576.0,
                model.path.display()
            );
        }
    }

    Ok(())
}

fn read_input(input: &str) -> Result<ImageBuffer> {
    let bytes = if input == "-" {
        let mut buffer = Vec::new();
        io::stdin()
            .read_to_end(&mut buffer)
            .context("Failed to read stdin")?;
        buffer
    } else {
        std::fs::read(input).with_context(|| format!("Failed to read {input}"))?
    };
    if bytes.is_empty() {
        anyhow::bail!("Input {input} is empty");
    }
    Ok(ImageBuffer::new(bytes))
}

fn write_output(destination: &str, bytes: &[u8]) -> Result<()> {
    if destination == "-" {
        let mut stdout = io::stdout().lock();
        stdout.write_all(bytes).context("Failed to write stdout")?;
        stdout.flush().context("Failed to flush stdout")?;
        return Ok(());
    }
    std::fs::write(destination, bytes).with_context(|| format!("Failed to write {destination}"))
}
