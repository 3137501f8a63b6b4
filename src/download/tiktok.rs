//! TikTok: tikwm envelope first, tikmate lookup as backup

use crate::cascade::{Cascade, Strategy};
use crate::config::ProviderEndpoints;
use crate::error::{MediaError, Result};
use crate::http::HttpClient;
use crate::types::DownloadResult;
use async_trait::async_trait;
use serde::Deserialize;

const FILE_NAME: &str = "tiktok_video.mp4";

#[derive(Debug, Deserialize)]
struct TikwmEnvelope {
    code: Option<i64>,
    data: Option<TikwmData>,
}

#[derive(Debug, Deserialize)]
struct TikwmData {
    play: Option<String>,
    hdplay: Option<String>,
}

impl TikwmData {
    /// HD link when present, otherwise the standard one
    fn best_url(self) -> Option<String> {
        self.hdplay
            .filter(|u| !u.is_empty())
            .or(self.play.filter(|u| !u.is_empty()))
    }
}

#[derive(Debug, Deserialize)]
struct TikmateLookup {
    video_url: Option<String>,
}

/// Primary provider returning `{code, data: {play, hdplay}}`
#[derive(Debug, Clone)]
pub struct TikwmProvider {
    http: HttpClient,
    endpoint: String,
}

impl TikwmProvider {
    pub fn new(http: HttpClient, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Strategy<str, DownloadResult> for TikwmProvider {
    fn name(&self) -> &str {
        "tikwm"
    }

    async fn attempt(&self, url: &str) -> Result<DownloadResult> {
        let envelope: TikwmEnvelope = self
            .http
            .get_json(&self.endpoint, &[("url", url)], "tikwm lookup")
            .await?;

        if envelope.code != Some(0) {
            return Err(MediaError::contract(format!(
                "tikwm returned status code {:?}",
                envelope.code
            )));
        }
        let video_url = envelope
            .data
            .and_then(TikwmData::best_url)
            .ok_or_else(|| MediaError::contract("tikwm response has no play URL"))?;

        let content = self.http.fetch_media(&video_url, "tikwm video").await?;
        Ok(DownloadResult::video(content, FILE_NAME))
    }
}

/// Backup provider returning `{video_url}`
#[derive(Debug, Clone)]
pub struct TikmateProvider {
    http: HttpClient,
    endpoint: String,
}

impl TikmateProvider {
    pub fn new(http: HttpClient, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Strategy<str, DownloadResult> for TikmateProvider {
    fn name(&self) -> &str {
        "tikmate"
    }

    async fn attempt(&self, url: &str) -> Result<DownloadResult> {
        let lookup: TikmateLookup = self
            .http
            .get_json(&self.endpoint, &[("url", url)], "tikmate lookup")
            .await?;
        let video_url = lookup
            .video_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| MediaError::contract("tikmate response has no video_url"))?;

        let content = self.http.fetch_media(&video_url, "tikmate video").await?;
        Ok(DownloadResult::video(content, FILE_NAME))
    }
}

pub fn cascade(endpoints: &ProviderEndpoints, http: &HttpClient) -> Cascade<str, DownloadResult> {
    Cascade::new("tiktok")
        .with(TikwmProvider::new(http.clone(), endpoints.tikwm_api.clone()))
        .with(TikmateProvider::new(http.clone(), endpoints.tikmate_api.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::types::MediaKind;
    use mockito::Matcher;

    const VIDEO: &str = "https://www.tiktok.com/@someone/video/7300000000000000000";

    fn endpoints(server: &mockito::Server) -> ProviderEndpoints {
        ProviderEndpoints {
            tikwm_api: format!("{}/tikwm/api/", server.url()),
            tikmate_api: format!("{}/tikmate/lookup", server.url()),
            ..ProviderEndpoints::default()
        }
    }

    fn http() -> HttpClient {
        HttpClient::new(&HttpConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_primary_prefers_hd_link() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();
        server
            .mock("GET", "/tikwm/api/")
            .match_query(Matcher::UrlEncoded("url".into(), VIDEO.into()))
            .with_status(200)
            .with_body(format!(
                r#"{{"code":0,"data":{{"play":"{base}/sd.mp4","hdplay":"{base}/hd.mp4"}}}}"#
            ))
            .create_async()
            .await;
        server
            .mock("GET", "/hd.mp4")
            .with_status(200)
            .with_body("hd-bytes")
            .create_async()
            .await;

        let result = cascade(&endpoints(&server), &http()).run(VIDEO).await.unwrap();
        assert_eq!(result.kind, MediaKind::Video);
        assert_eq!(result.content, b"hd-bytes");
        assert_eq!(result.suggested_name, "tiktok_video.mp4");
    }

    #[tokio::test]
    async fn test_primary_falls_back_to_standard_link() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();
        server
            .mock("GET", "/tikwm/api/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(format!(r#"{{"code":0,"data":{{"play":"{base}/sd.mp4","hdplay":""}}}}"#))
            .create_async()
            .await;
        server
            .mock("GET", "/sd.mp4")
            .with_status(200)
            .with_body("sd-bytes")
            .create_async()
            .await;

        let result = cascade(&endpoints(&server), &http()).run(VIDEO).await.unwrap();
        assert_eq!(result.content, b"sd-bytes");
    }

    #[tokio::test]
    async fn test_primary_http_error_uses_backup_video_url() {
        let mut server = mockito::Server::new_async().await;
        let base = server.url();
        server
            .mock("GET", "/tikwm/api/")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;
        let lookup = server
            .mock("GET", "/tikmate/lookup")
            .match_query(Matcher::UrlEncoded("url".into(), VIDEO.into()))
            .with_status(200)
            .with_body(format!(r#"{{"video_url":"{base}/backup.mp4"}}"#))
            .create_async()
            .await;
        server
            .mock("GET", "/backup.mp4")
            .with_status(200)
            .with_body("backup-bytes")
            .create_async()
            .await;

        let result = cascade(&endpoints(&server), &http()).run(VIDEO).await.unwrap();
        assert_eq!(result.kind, MediaKind::Video);
        assert_eq!(result.content, b"backup-bytes");
        lookup.assert_async().await;
    }

    #[tokio::test]
    async fn test_nonzero_code_is_contract_violation() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tikwm/api/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"code":-1,"msg":"Url parsing is failed!"}"#)
            .create_async()
            .await;

        let provider = TikwmProvider::new(http(), endpoints(&server).tikwm_api);
        let err = provider.attempt(VIDEO).await.unwrap_err();
        assert!(matches!(err, MediaError::ProviderContract(_)));
    }

    #[tokio::test]
    async fn test_both_providers_failing_yields_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/tikwm/api/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"code":0,"data":null}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/tikmate/lookup")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"success":false}"#)
            .create_async()
            .await;

        assert!(cascade(&endpoints(&server), &http()).run(VIDEO).await.is_none());
    }
}
