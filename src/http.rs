//! Shared HTTP client for provider calls
//!
//! Wraps one `reqwest::Client` and applies the per-call timeouts. Every
//! helper maps transport errors and non-success statuses to
//! `MediaError::Network`, and unparseable bodies to
//! `MediaError::ProviderContract`.

use crate::config::HttpConfig;
use crate::error::{MediaError, Result};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// HTTP client with metadata and media timeouts
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    metadata_timeout: Duration,
    media_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client
    ///
    /// # Errors
    /// - Failed to create the underlying `reqwest` client
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| MediaError::from_reqwest("Failed to create HTTP client", &e))?;

        Ok(Self {
            client,
            metadata_timeout: config.metadata_timeout(),
            media_timeout: config.media_timeout(),
        })
    }

    #[must_use]
    pub fn metadata_timeout(&self) -> Duration {
        self.metadata_timeout
    }

    #[must_use]
    pub fn media_timeout(&self) -> Duration {
        self.media_timeout
    }

    /// Raw client for building provider-specific requests
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Send a request and require a 2xx status
    ///
    /// # Errors
    /// - `MediaError::Network` on transport failure, timeout or non-success status
    pub async fn send(&self, request: RequestBuilder, context: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| MediaError::from_reqwest(context, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::network(format!("{context}: HTTP {status}")));
        }
        tracing::debug!(context, %status, "provider responded");
        Ok(response)
    }

    /// Read the full body, rejecting empty payloads
    ///
    /// # Errors
    /// - `MediaError::Network` when the body stream fails
    /// - `MediaError::ProviderContract` when the body is empty
    pub async fn read_body(response: Response, context: &str) -> Result<Vec<u8>> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| MediaError::from_reqwest(context, &e))?;
        if bytes.is_empty() {
            return Err(MediaError::contract(format!("{context}: empty response body")));
        }
        Ok(bytes.to_vec())
    }

    /// Decode a JSON body into an optional-field response type
    ///
    /// # Errors
    /// - `MediaError::ProviderContract` when the body is not the expected JSON
    pub async fn read_json<T: DeserializeOwned>(response: Response, context: &str) -> Result<T> {
        let body = Self::read_body(response, context).await?;
        serde_json::from_slice(&body)
            .map_err(|e| MediaError::contract(format!("{context}: malformed JSON ({e})")))
    }

    /// GET a JSON document with the metadata timeout
    ///
    /// # Errors
    /// - See [`HttpClient::send`] and [`HttpClient::read_json`]
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        context: &str,
    ) -> Result<T> {
        let request = self
            .client
            .get(url)
            .query(query)
            .timeout(self.metadata_timeout);
        let response = self.send(request, context).await?;
        Self::read_json(response, context).await
    }

    /// POST a JSON body and decode the JSON answer with the metadata timeout
    ///
    /// # Errors
    /// - See [`HttpClient::send`] and [`HttpClient::read_json`]
    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        context: &str,
    ) -> Result<T> {
        let request = self
            .client
            .post(url)
            .json(body)
            .timeout(self.metadata_timeout);
        let response = self.send(request, context).await?;
        Self::read_json(response, context).await
    }

    /// GET an HTML/text page with the metadata timeout, following redirects
    ///
    /// # Errors
    /// - See [`HttpClient::send`]
    pub async fn get_text(&self, url: &str, context: &str) -> Result<String> {
        let request = self.client.get(url).timeout(self.metadata_timeout);
        let response = self.send(request, context).await?;
        response
            .text()
            .await
            .map_err(|e| MediaError::from_reqwest(context, &e))
    }

    /// GET binary media with the media timeout
    ///
    /// # Errors
    /// - See [`HttpClient::send`] and [`HttpClient::read_body`]
    pub async fn fetch_media(&self, url: &str, context: &str) -> Result<Vec<u8>> {
        let request = self.client.get(url).timeout(self.media_timeout);
        let response = self.send(request, context).await?;
        let body = Self::read_body(response, context).await?;
        tracing::debug!(context, bytes = body.len(), "media fetched");
        Ok(body)
    }
}
