//! Model file downloading with progress reporting and integrity checks
//!
//! Downloads stream into a `.part` file next to the destination and are
//! renamed into place only after the optional SHA-256 check passes.

use crate::error::{MediaError, Result};
use futures_util::stream::TryStreamExt;
#[cfg(feature = "cli")]
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;

/// Model downloads are large; allow much longer than provider calls
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Progress bar abstraction that works with and without CLI features
#[derive(Debug)]
pub enum ProgressIndicator {
    #[cfg(feature = "cli")]
    Indicatif(ProgressBar),
    NoOp,
}

impl ProgressIndicator {
    pub fn set_message(&self, msg: String) {
        match self {
            #[cfg(feature = "cli")]
            Self::Indicatif(pb) => pb.set_message(msg),
            Self::NoOp => {},
        }
    }

    pub fn set_length(&self, len: u64) {
        match self {
            #[cfg(feature = "cli")]
            Self::Indicatif(pb) => pb.set_length(len),
            Self::NoOp => {},
        }
    }

    pub fn set_position(&self, pos: u64) {
        match self {
            #[cfg(feature = "cli")]
            Self::Indicatif(pb) => pb.set_position(pos),
            Self::NoOp => {},
        }
    }

    pub fn finish_with_message(&self, msg: String) {
        match self {
            #[cfg(feature = "cli")]
            Self::Indicatif(pb) => pb.finish_with_message(msg),
            Self::NoOp => {},
        }
    }
}

/// Single-file model downloader
#[derive(Debug, Clone)]
pub struct ModelDownloader {
    client: Client,
    show_progress: bool,
}

impl ModelDownloader {
    /// Create a new model downloader
    ///
    /// # Errors
    /// - Failed to create HTTP client
    pub fn new(show_progress: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| MediaError::from_reqwest("Failed to create HTTP client", &e))?;
        Ok(Self {
            client,
            show_progress,
        })
    }

    /// Download `url` to `destination`, verifying `expected_sha256` when given
    ///
    /// # Errors
    /// - `MediaError::Network` on transport failure or non-success status
    /// - `MediaError::ProviderContract` on an empty body or hash mismatch
    /// - File system errors while writing
    pub async fn download_to(
        &self,
        url: &str,
        destination: &Path,
        expected_sha256: Option<&str>,
    ) -> Result<PathBuf> {
        tracing::info!(url, destination = %destination.display(), "downloading model");

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| MediaError::file_io_error("create directory", parent, &e))?;
        }

        let partial = partial_path(destination);
        let progress = self.create_progress_indicator();
        if let Some(name) = destination.file_name() {
            progress.set_message(name.to_string_lossy().into_owned());
        }

        let outcome = self.download_file(url, &partial, &progress).await.and_then(|bytes| {
            if bytes == 0 {
                return Err(MediaError::contract(format!("Empty model download from {url}")));
            }
            if !Self::verify_file_integrity(&partial, expected_sha256)? {
                return Err(MediaError::contract(format!(
                    "Checksum mismatch for model downloaded from {url}"
                )));
            }
            Ok(bytes)
        });

        match outcome {
            Ok(bytes) => {
                fs::rename(&partial, destination).map_err(|e| {
                    MediaError::file_io_error("move downloaded model to cache", destination, &e)
                })?;
                progress.finish_with_message("Model downloaded".to_string());
                tracing::info!(bytes, path = %destination.display(), "model download complete");
                Ok(destination.to_path_buf())
            },
            Err(e) => {
                if partial.exists() {
                    if let Err(cleanup_err) = fs::remove_file(&partial) {
                        tracing::warn!(error = %cleanup_err, "failed to remove partial download");
                    }
                }
                progress.finish_with_message("Model download failed".to_string());
                Err(e)
            },
        }
    }

    fn create_progress_indicator(&self) -> ProgressIndicator {
        if !self.show_progress {
            return ProgressIndicator::NoOp;
        }
        #[cfg(feature = "cli")]
        {
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            let pb = ProgressBar::new(0);
            pb.set_style(style);
            ProgressIndicator::Indicatif(pb)
        }
        #[cfg(not(feature = "cli"))]
        {
            ProgressIndicator::NoOp
        }
    }

    /// Stream a response body to `local_path`, returning the byte count
    async fn download_file(
        &self,
        url: &str,
        local_path: &Path,
        progress: &ProgressIndicator,
    ) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MediaError::from_reqwest(&format!("Failed to download {url}"), &e))?;

        if !response.status().is_success() {
            return Err(MediaError::network(format!(
                "HTTP error {} for {url}",
                response.status()
            )));
        }

        if let Some(total) = response.content_length() {
            progress.set_length(total);
        }

        let mut file = tokio::fs::File::create(local_path)
            .await
            .map_err(|e| MediaError::file_io_error("create file", local_path, &e))?;

        let mut stream = StreamReader::new(
            response
                .bytes_stream()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)),
        );

        let mut downloaded = 0u64;
        let mut buffer = vec![0; 8192];

        loop {
            let bytes_read = tokio::io::AsyncReadExt::read(&mut stream, &mut buffer)
                .await
                .map_err(|e| MediaError::network(format!("Failed to read download stream: {e}")))?;

            if bytes_read == 0 {
                break;
            }

            file.write_all(buffer.get(..bytes_read).unwrap_or(&[]))
                .await
                .map_err(|e| MediaError::file_io_error("write to file", local_path, &e))?;

            downloaded += bytes_read as u64;
            progress.set_position(downloaded);
        }

        file.flush()
            .await
            .map_err(|e| MediaError::file_io_error("flush file", local_path, &e))?;

        tracing::debug!(bytes = downloaded, path = %local_path.display(), "download stream finished");
        Ok(downloaded)
    }

    /// Verify a file against a hex SHA-256 digest; `None` always passes
    ///
    /// # Errors
    /// - Failed to read the file
    pub fn verify_file_integrity(file_path: &Path, expected_hash: Option<&str>) -> Result<bool> {
        let Some(expected) = expected_hash else {
            return Ok(true);
        };

        let contents = fs::read(file_path).map_err(|e| {
            MediaError::file_io_error("read file for verification", file_path, &e)
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let actual_hash = format!("{:x}", hasher.finalize());

        if actual_hash.eq_ignore_ascii_case(expected.trim()) {
            Ok(true)
        } else {
            tracing::warn!(
                path = %file_path.display(),
                expected,
                actual = %actual_hash,
                "file integrity check failed"
            );
            Ok(false)
        }
    }
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}
