//! Video/photo download router
//!
//! A URL is classified by case-insensitive keyword matching (first match
//! wins: tiktok, instagram, pinterest/pin.it, snapchat) and handed to that
//! platform's own cascade. Unsupported URLs are rejected before any network
//! call, and an exhausted platform cascade never falls back to another
//! platform.

pub mod instagram;
pub mod pinterest;
pub mod snapchat;
pub mod tiktok;

use crate::cascade::Cascade;
use crate::config::ProviderEndpoints;
use crate::http::HttpClient;
use crate::types::DownloadResult;
use std::fmt;
use std::str::FromStr;

/// A supported source platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    TikTok,
    Instagram,
    Pinterest,
    Snapchat,
}

/// Ordered keyword table; the first keyword found in the lowercased URL wins
const KEYWORDS: &[(&str, Platform)] = &[
    ("tiktok", Platform::TikTok),
    ("instagram", Platform::Instagram),
    ("pinterest", Platform::Pinterest),
    ("pin.it", Platform::Pinterest),
    ("snapchat", Platform::Snapchat),
];

impl Platform {
    pub const ALL: [Self; 4] = [Self::TikTok, Self::Instagram, Self::Pinterest, Self::Snapchat];

    /// Classify a URL, or `None` when it names no supported platform
    #[must_use]
    pub fn classify(url: &str) -> Option<Self> {
        let lowered = url.to_lowercase();
        KEYWORDS
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword))
            .map(|(_, platform)| *platform)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TikTok => "tiktok",
            Self::Instagram => "instagram",
            Self::Pinterest => "pinterest",
            Self::Snapchat => "snapchat",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = crate::error::MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| crate::error::MediaError::no_match(format!("Unknown platform: {s}")))
    }
}

/// Whether the URL belongs to a supported platform
#[must_use]
pub fn is_supported_url(url: &str) -> bool {
    Platform::classify(url).is_some()
}

/// Dispatches URLs to the matching per-platform cascade
pub struct MediaRouter {
    tiktok: Cascade<str, DownloadResult>,
    instagram: Cascade<str, DownloadResult>,
    pinterest: Cascade<str, DownloadResult>,
    snapchat: Cascade<str, DownloadResult>,
}

impl MediaRouter {
    pub fn new(endpoints: &ProviderEndpoints, http: &HttpClient) -> Self {
        Self {
            tiktok: tiktok::cascade(endpoints, http),
            instagram: instagram::cascade(endpoints, http),
            pinterest: pinterest::cascade(endpoints, http),
            snapchat: snapchat::cascade(http),
        }
    }

    #[must_use]
    pub fn cascade_for(&self, platform: Platform) -> &Cascade<str, DownloadResult> {
        match platform {
            Platform::TikTok => &self.tiktok,
            Platform::Instagram => &self.instagram,
            Platform::Pinterest => &self.pinterest,
            Platform::Snapchat => &self.snapchat,
        }
    }

    /// Download the media behind `url`, or `None` when unsupported or exhausted
    pub async fn download(&self, url: &str) -> Option<DownloadResult> {
        let Some(platform) = Platform::classify(url) else {
            tracing::info!(url, "unsupported URL rejected");
            return None;
        };
        tracing::debug!(url, %platform, "dispatching download");
        self.cascade_for(platform).run(url).await
    }
}

impl fmt::Debug for MediaRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaRouter")
            .field("tiktok", &self.tiktok)
            .field("instagram", &self.instagram)
            .field("pinterest", &self.pinterest)
            .field("snapchat", &self.snapchat)
            .finish()
    }
}
