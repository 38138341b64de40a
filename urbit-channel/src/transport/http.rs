//! `reqwest`-backed transport.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use thiserror::Error;
use tracing::trace;

use super::{HttpResponse, HttpTransport, TransportFailure};
use crate::config::ChannelConfig;

/// Reasons an [`HttpClient`] could not be built from a config.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid header {0:?}")]
    InvalidHeader(String),

    #[error("HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// HTTP transport talking to one ship.
///
/// Keeps a cookie store, since the ship's session cookie is set by the
/// auth endpoints and expected on every later request.
#[derive(Debug, Clone)]
pub struct HttpClient {
    http: Client,
    base_url: String,
}

impl HttpClient {
    /// Build a client for `config.url` with the configured timeout,
    /// user agent and extra headers.
    pub fn new(config: &ChannelConfig) -> Result<Self, BuildError> {
        reqwest::Url::parse(&config.url).map_err(|e| BuildError::InvalidUrl {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| BuildError::InvalidHeader(name.clone()))?;
            let value =
                HeaderValue::from_str(value).map_err(|_| BuildError::InvalidHeader(value.clone()))?;
            headers.insert(name, value);
        }

        let http = Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl HttpTransport for HttpClient {
    async fn get(&self, path: &str) -> Result<HttpResponse, TransportFailure> {
        let url = self.url(path);
        trace!(url = %url, "GET");

        let response = self.http.get(&url).send().await.map_err(failure)?;
        read(response).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<HttpResponse, TransportFailure> {
        let url = self.url(path);
        trace!(url = %url, tx = %body, "POST");

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(failure)?;
        read(response).await
    }
}

async fn read(response: reqwest::Response) -> Result<HttpResponse, TransportFailure> {
    let status = response.status().as_u16();
    let body = response.text().await.map_err(failure)?;
    trace!(status, rx = %body, "Response");
    Ok(HttpResponse { status, body })
}

fn failure(e: reqwest::Error) -> TransportFailure {
    if e.is_timeout() {
        TransportFailure::Timeout
    } else if e.is_builder() {
        TransportFailure::BadUrl(e.to_string())
    } else {
        TransportFailure::Network(e.to_string())
    }
}
