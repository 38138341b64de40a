//! Error taxonomy and translation into the shape reported to callers.
//!
//! Everything that can go wrong while talking to a ship is a
//! [`ChannelError`]. Callers see failures as a [`UnifiedError`]: a
//! human-readable description plus, when the ship sent one, its structured
//! `{fail, mess}` body.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ship::ShipError;
use crate::transport::TransportFailure;

/// Structured failure body some endpoints return (`{fail, mess}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FailurePayload {
    /// Failure code.
    pub fail: String,
    /// Human-readable message.
    pub mess: String,
}

impl FailurePayload {
    /// Best-effort parse of a response body.
    pub fn from_body(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}

/// Every failure the client can produce.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Request timed out")]
    TransportTimeout,

    #[error("Network error: {0}")]
    TransportNetworkError(String),

    #[error("Bad status: {status}")]
    TransportBadStatus {
        status: u16,
        payload: Option<FailurePayload>,
    },

    #[error("Invalid URL: {0}")]
    TransportBadUrl(String),

    /// 2xx response whose body could not be decoded.
    #[error("{message}")]
    TransportDecodeFailure {
        message: String,
        payload: Option<FailurePayload>,
    },

    /// Poll body that is neither a heartbeat nor a data event.
    #[error("Protocol error: {0}")]
    ProtocolDecodeError(String),

    #[error("Invalid ship name: {0}")]
    Validation(#[from] ShipError),

    #[error("No decoder found for {0}")]
    NoDecoderFound(String),

    #[error("Decode failed: {0}")]
    DecodeFailed(String),
}

impl ChannelError {
    /// Structured payload carried by this error, if any.
    pub fn payload(&self) -> Option<&FailurePayload> {
        match self {
            ChannelError::TransportBadStatus { payload, .. }
            | ChannelError::TransportDecodeFailure { payload, .. } => payload.as_ref(),
            _ => None,
        }
    }
}

/// Auth endpoints answer a login form submission with
/// `{ok, redirect}` instead of credentials.
#[derive(Debug, Deserialize)]
struct AuthRedirect {
    ok: bool,
}

/// Classify a transport failure.
pub fn classify(failure: &TransportFailure) -> ChannelError {
    match failure {
        TransportFailure::Timeout => ChannelError::TransportTimeout,
        TransportFailure::Network(reason) => ChannelError::TransportNetworkError(reason.clone()),
        TransportFailure::BadUrl(url) => ChannelError::TransportBadUrl(url.clone()),
        TransportFailure::BadStatus { status, body } => ChannelError::TransportBadStatus {
            status: *status,
            payload: FailurePayload::from_body(body),
        },
        TransportFailure::Decode { body, message } => {
            match serde_json::from_str::<AuthRedirect>(body) {
                Ok(AuthRedirect { ok: true }) => ChannelError::TransportDecodeFailure {
                    message: "Redirects are not supported".to_string(),
                    payload: None,
                },
                Ok(AuthRedirect { ok: false }) => ChannelError::TransportDecodeFailure {
                    message: "Authentication was rejected".to_string(),
                    payload: None,
                },
                Err(_) => ChannelError::TransportDecodeFailure {
                    message: format!("Failed to decode response: {}", message),
                    payload: FailurePayload::from_body(body),
                },
            }
        }
    }
}

/// Translate a transport failure into the caller-facing error.
pub fn translate(failure: &TransportFailure) -> UnifiedError {
    classify(failure).into()
}

/// The error shape reported to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnifiedError {
    pub description: String,
    pub payload: Option<FailurePayload>,
}

impl UnifiedError {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            payload: None,
        }
    }
}

impl From<ChannelError> for UnifiedError {
    fn from(error: ChannelError) -> Self {
        Self {
            description: error.to_string(),
            payload: error.payload().cloned(),
        }
    }
}

impl std::fmt::Display for UnifiedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.payload {
            Some(payload) => write!(f, "{} ({}: {})", self.description, payload.fail, payload.mess),
            None => f.write_str(&self.description),
        }
    }
}

impl std::error::Error for UnifiedError {}
