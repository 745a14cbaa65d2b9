use merlin_types::error::UpstreamStreamError;
use merlin_types::models::UpstreamEndpoints;
use merlin_types::protocol::merlin::{ImageThreadRequest, UnifiedThreadRequest};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::event_reader::EventSource;
use super::headers::stream_headers;
use crate::proxy::common::error_body::truncate_error_body;
use crate::proxy::credential::Credential;

const MAX_ERROR_BODY: usize = 512;

/// Opens vendor chat and image streams.
///
/// Cloning is cheap: the reqwest client and endpoints are shared.
#[derive(Clone)]
pub struct UpstreamClient {
    http_client: Client,
    endpoints: Arc<UpstreamEndpoints>,
    idle_timeout: Option<Duration>,
}

impl UpstreamClient {
    /// `idle_timeout` bounds the gap between body chunks; `None` waits forever.
    pub fn new(http_client: Client, endpoints: Arc<UpstreamEndpoints>, idle_timeout: Option<Duration>) -> Self {
        Self { http_client, endpoints, idle_timeout }
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub fn endpoints(&self) -> &Arc<UpstreamEndpoints> {
        &self.endpoints
    }

    pub async fn open_chat_stream(
        &self,
        request: &UnifiedThreadRequest,
        credential: &Credential,
    ) -> Result<EventSource, UpstreamStreamError> {
        self.open_stream(&self.endpoints.chat_url, request, credential).await
    }

    pub async fn open_image_stream(
        &self,
        request: &ImageThreadRequest,
        credential: &Credential,
    ) -> Result<EventSource, UpstreamStreamError> {
        self.open_stream(&self.endpoints.image_url, request, credential).await
    }

    async fn open_stream<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        credential: &Credential,
    ) -> Result<EventSource, UpstreamStreamError> {
        tracing::debug!("Opening upstream stream: POST {} (credential {})", url, credential.redacted());

        let response = self
            .http_client
            .post(url)
            .headers(stream_headers(&self.endpoints, &credential.bearer()))
            .json(body)
            .send()
            .await
            .map_err(|e| UpstreamStreamError::ConnectFailed {
                status: None,
                message: format!("HTTP request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|e| format!("<unreadable body: {}>", e));
            let message = truncate_error_body(&text, MAX_ERROR_BODY);
            tracing::error!("Upstream returned {} for {}: {}", status, url, message);
            return Err(UpstreamStreamError::ConnectFailed { status: Some(status.as_u16()), message });
        }

        Ok(EventSource::from_response(response, self.idle_timeout))
    }
}

/// True when the upstream refused the bearer credential itself.
pub fn is_auth_rejection(error: &UpstreamStreamError) -> bool {
    matches!(
        error,
        UpstreamStreamError::ConnectFailed { status: Some(code), .. }
            if *code == StatusCode::UNAUTHORIZED.as_u16() || *code == StatusCode::FORBIDDEN.as_u16()
    )
}
