//! Errors surfaced to inbound OpenAI-compatible callers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{CredentialError, UpstreamStreamError};

/// Errors that terminate an inbound request.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ProxyError {
    /// Bad JSON, empty message list, missing prompt.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// No usable upstream credential.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The upstream chat or image stream failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamStreamError),

    /// The image stream completed without a single asset URL.
    #[error("No valid image URLs generated")]
    NoImageProduced,

    /// Non-POST request on an API path.
    #[error("Method {method} not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },

    /// Internal proxy error (serialization bugs, unexpected states)
    #[error("Internal proxy error: {message}")]
    Internal { message: String },
}

impl ProxyError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest { message: message.into() }
    }

    /// Get HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest { .. } => 400,
            Self::MethodNotAllowed { .. } => 405,
            Self::Credential(_) => 500,
            Self::Upstream(_) => 502,
            Self::NoImageProduced => 500,
            Self::Internal { .. } => 500,
        }
    }

    /// OpenAI `error.type` value.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } | Self::MethodNotAllowed { .. } => "invalid_request_error",
            Self::Credential(_) => "authentication_error",
            Self::Upstream(_) | Self::NoImageProduced | Self::Internal { .. } => "server_error",
        }
    }

    /// OpenAI `error.code` value.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::MethodNotAllowed { .. } => "method_not_allowed",
            Self::Credential(CredentialError::NoSecret) => "no_credential_configured",
            Self::Credential(_) => "credential_unavailable",
            Self::Upstream(UpstreamStreamError::ConnectFailed { .. }) => "upstream_connect_failed",
            Self::Upstream(_) => "upstream_stream_error",
            Self::NoImageProduced => "no_image_produced",
            Self::Internal { .. } => "internal_error",
        }
    }

    /// Check if this is a client error (4xx equivalent).
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidRequest { .. } | Self::MethodNotAllowed { .. })
    }
}
