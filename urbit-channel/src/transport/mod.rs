//! HTTP capability used by the auth handshake and the channel client.
//!
//! The [`HttpTransport`] trait abstracts the two request shapes the
//! protocol needs, so the client can run over `reqwest` (production) or a
//! scripted mock (tests). Transports report every completed exchange as an
//! [`HttpResponse`], whatever its status; turning non-2xx statuses and
//! undecodable bodies into failures happens here, in one place.

mod http;
#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use http::{BuildError, HttpClient};

/// A completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body of a 2xx response, or [`TransportFailure::BadStatus`].
    pub fn into_success(self) -> Result<String, TransportFailure> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(TransportFailure::BadStatus {
                status: self.status,
                body: self.body,
            })
        }
    }
}

/// Why a request produced no usable body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// The transport gave up waiting.
    Timeout,

    /// Connection refused, reset, DNS failure and the like.
    Network(String),

    /// The request URL could not be built.
    BadUrl(String),

    /// Server answered with a non-2xx status.
    BadStatus { status: u16, body: String },

    /// Server answered 2xx but the body had the wrong shape.
    Decode { body: String, message: String },
}

/// Message-level HTTP I/O.
///
/// Paths are absolute (`/~/auth.json`) and resolved against whatever base
/// URL the implementation was built with.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, path: &str) -> Result<HttpResponse, TransportFailure>;

    async fn post(&self, path: &str, body: &Value) -> Result<HttpResponse, TransportFailure>;
}

/// GET `path` and decode a 2xx JSON body as `T`.
pub(crate) async fn get_json<T: DeserializeOwned>(
    transport: &dyn HttpTransport,
    path: &str,
) -> Result<T, TransportFailure> {
    let body = transport.get(path).await?.into_success()?;
    decode(body)
}

/// GET `path` and return the raw 2xx body.
pub(crate) async fn get_text(
    transport: &dyn HttpTransport,
    path: &str,
) -> Result<String, TransportFailure> {
    transport.get(path).await?.into_success()
}

/// POST `body` to `path`, discarding a 2xx response body.
pub(crate) async fn post_json(
    transport: &dyn HttpTransport,
    path: &str,
    body: &Value,
) -> Result<(), TransportFailure> {
    transport.post(path, body).await?.into_success().map(drop)
}

fn decode<T: DeserializeOwned>(body: String) -> Result<T, TransportFailure> {
    match serde_json::from_str(&body) {
        Ok(value) => Ok(value),
        Err(e) => Err(TransportFailure::Decode {
            message: e.to_string(),
            body,
        }),
    }
}
