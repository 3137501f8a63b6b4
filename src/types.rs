//! Core data types shared by the image and download pipelines

use crate::error::{MediaError, Result};
use image::{DynamicImage, ImageFormat};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

/// Owned, encoded image bytes
///
/// Strategies never mutate a buffer they are handed; each one returns a new
/// buffer or fails.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    bytes: Vec<u8>,
}

impl ImageBuffer {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// Encode an image as PNG
    ///
    /// # Errors
    /// - PNG encoder failure (for example a zero-sized image)
    pub fn encode_png(image: &DynamicImage) -> Result<Self> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(Self { bytes })
    }

    /// Decode the buffer into pixels
    ///
    /// # Errors
    /// - `MediaError::Decode` when the bytes are not a supported image
    pub fn decode(&self) -> Result<DynamicImage> {
        if self.bytes.is_empty() {
            return Err(MediaError::decode("image buffer is empty"));
        }
        image::load_from_memory(&self.bytes)
            .map_err(|e| MediaError::decode(format!("Failed to decode image from bytes: {e}")))
    }

    /// Format sniffed from the magic bytes, if recognised
    #[must_use]
    pub fn format(&self) -> Option<ImageFormat> {
        image::guess_format(&self.bytes).ok()
    }

    /// Validate that the bytes decode, re-encoding to PNG when they are not PNG already
    ///
    /// # Errors
    /// - `MediaError::Decode` for unreadable bytes
    pub fn into_verified_png(self) -> Result<Self> {
        let image = self.decode()?;
        if self.format() == Some(ImageFormat::Png) {
            Ok(self)
        } else {
            Self::encode_png(&image)
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("len", &self.bytes.len())
            .field("format", &self.format())
            .finish()
    }
}

impl From<Vec<u8>> for ImageBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for ImageBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Image transform selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Background,
    Watermark,
    Text,
    Crop,
}

const WATERMARK_KEYWORDS: &[&str] = &["watermark", "علامة", "ووتر", "شعار", "لوقو"];
const TEXT_KEYWORDS: &[&str] = &["text", "كتابة", "نص", "كلام"];
const CROP_KEYWORDS: &[&str] = &["crop", "frame", "قص", "اطار", "شريط"];

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Background,
        Operation::Watermark,
        Operation::Text,
        Operation::Crop,
    ];

    /// Pick an operation from a photo caption
    ///
    /// Keyword groups are checked in order watermark, text, crop; a caption
    /// matching none of them selects background removal.
    #[must_use]
    pub fn from_caption(caption: &str) -> Self {
        let caption = caption.trim().to_lowercase();
        let contains_any = |words: &[&str]| words.iter().any(|w| caption.contains(w));

        if contains_any(WATERMARK_KEYWORDS) {
            Self::Watermark
        } else if contains_any(TEXT_KEYWORDS) {
            Self::Text
        } else if contains_any(CROP_KEYWORDS) {
            Self::Crop
        } else {
            Self::Background
        }
    }

    /// Suggested file name for the processed image
    #[must_use]
    pub fn output_file_name(self) -> &'static str {
        match self {
            Self::Background => "no_background.png",
            Self::Watermark => "no_watermark.png",
            Self::Text => "no_text.png",
            Self::Crop => "cropped.png",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Background => write!(f, "background"),
            Self::Watermark => write!(f, "watermark"),
            Self::Text => write!(f, "text"),
            Self::Crop => write!(f, "crop"),
        }
    }
}

impl FromStr for Operation {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "background" | "bg" => Ok(Self::Background),
            "watermark" => Ok(Self::Watermark),
            "text" => Ok(Self::Text),
            "crop" | "frame" => Ok(Self::Crop),
            other => Err(MediaError::invalid_config(format!(
                "Unknown operation '{other}'. Expected one of: background, watermark, text, crop"
            ))),
        }
    }
}

/// One image transform to run
#[derive(Debug, Clone)]
pub struct TransformRequest {
    pub operation: Operation,
    pub input: ImageBuffer,
}

impl TransformRequest {
    #[must_use]
    pub fn new(operation: Operation, input: ImageBuffer) -> Self {
        Self { operation, input }
    }
}

/// One media download to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Kind of downloaded media
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Photo,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::Photo => write!(f, "photo"),
        }
    }
}

/// Downloaded media with a suggested file name
#[derive(Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub kind: MediaKind,
    pub content: Vec<u8>,
    pub suggested_name: String,
}

impl DownloadResult {
    pub fn video(content: Vec<u8>, suggested_name: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Video,
            content,
            suggested_name: suggested_name.into(),
        }
    }

    pub fn photo(content: Vec<u8>, suggested_name: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Photo,
            content,
            suggested_name: suggested_name.into(),
        }
    }
}

impl fmt::Debug for DownloadResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadResult")
            .field("kind", &self.kind)
            .field("content_len", &self.content.len())
            .field("suggested_name", &self.suggested_name)
            .finish()
    }
}
