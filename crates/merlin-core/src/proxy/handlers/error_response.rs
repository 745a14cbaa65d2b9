//! OpenAI-style error responses.

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use merlin_types::error::{CredentialError, ProxyError, UpstreamStreamError};
use merlin_types::protocol::openai::ErrorEnvelope;
use serde::de::DeserializeOwned;

/// A [`ProxyError`] rendered as `{ "error": { message, type, code } }`.
#[derive(Debug)]
pub struct ApiError(pub ProxyError);

impl From<ProxyError> for ApiError {
    fn from(error: ProxyError) -> Self {
        Self(error)
    }
}

impl From<CredentialError> for ApiError {
    fn from(error: CredentialError) -> Self {
        Self(error.into())
    }
}

impl From<UpstreamStreamError> for ApiError {
    fn from(error: UpstreamStreamError) -> Self {
        Self(error.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.0.is_client_error() {
            tracing::warn!("Rejecting request ({}): {}", status, self.0);
        } else {
            tracing::error!("Request failed ({}): {}", status, self.0);
        }

        (status, Json(ErrorEnvelope::from(&self.0))).into_response()
    }
}

/// Decode a JSON request body, mapping any failure to a 400 envelope.
pub fn parse_json_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError(ProxyError::invalid_request(format!("Invalid JSON body: {}", e))))
}
