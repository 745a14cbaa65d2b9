use async_trait::async_trait;
use merlin_types::error::{CredentialError, CredentialSourceKind};
use merlin_types::models::{CredentialSecrets, UpstreamEndpoints};
use merlin_types::protocol::merlin::{RefreshRequest, RefreshResponse, SessionResponse};
use reqwest::Client;
use std::sync::Arc;

use super::CredentialSource;
use crate::proxy::common::error_body::truncate_error_body;
use crate::proxy::upstream::headers::{refresh_headers, session_headers};

/// Upper bound on exchange error bodies echoed into errors and logs.
const MAX_ERROR_BODY: usize = 256;

fn network_failure(kind: CredentialSourceKind, e: &reqwest::Error) -> CredentialError {
    CredentialError::NetworkFailure { source_kind: kind, message: e.to_string() }
}

fn rejected(kind: CredentialSourceKind, status: u16, message: impl Into<String>) -> CredentialError {
    CredentialError::UpstreamRejected { source_kind: kind, status: Some(status), message: message.into() }
}

/// `MERLIN_SESSION_TOKEN` sent as the auth.js session cookie.
pub struct SessionCookieSource {
    client: Client,
    endpoints: Arc<UpstreamEndpoints>,
    session_token: String,
}

impl SessionCookieSource {
    pub fn new(client: Client, endpoints: Arc<UpstreamEndpoints>, session_token: impl Into<String>) -> Self {
        Self { client, endpoints, session_token: session_token.into() }
    }
}

#[async_trait]
impl CredentialSource for SessionCookieSource {
    fn kind(&self) -> CredentialSourceKind {
        CredentialSourceKind::SessionCookie
    }

    async fn fetch(&self) -> Result<String, CredentialError> {
        let kind = self.kind();
        tracing::debug!("Requesting session at {}", self.endpoints.session_url);

        let response = self
            .client
            .get(&self.endpoints.session_url)
            .headers(session_headers(&self.endpoints, &self.session_token))
            .send()
            .await
            .map_err(|e| network_failure(kind, &e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| network_failure(kind, &e))?;
        if !status.is_success() {
            return Err(rejected(kind, status.as_u16(), truncate_error_body(&body, MAX_ERROR_BODY)));
        }

        let session: SessionResponse = serde_json::from_str(&body).map_err(|e| {
            rejected(kind, status.as_u16(), format!("unreadable session response: {}", e))
        })?;
        if session.user.access_token.is_empty() {
            return Err(rejected(kind, status.as_u16(), "empty access token in response"));
        }
        Ok(session.user.access_token)
    }
}

/// `MERLIN_REFRESH_TOKEN` exchanged at the UAM session endpoint.
pub struct RefreshTokenSource {
    client: Client,
    endpoints: Arc<UpstreamEndpoints>,
    refresh_token: String,
}

impl RefreshTokenSource {
    pub fn new(client: Client, endpoints: Arc<UpstreamEndpoints>, refresh_token: impl Into<String>) -> Self {
        Self { client, endpoints, refresh_token: refresh_token.into() }
    }
}

#[async_trait]
impl CredentialSource for RefreshTokenSource {
    fn kind(&self) -> CredentialSourceKind {
        CredentialSourceKind::RefreshToken
    }

    async fn fetch(&self) -> Result<String, CredentialError> {
        let kind = self.kind();
        tracing::debug!("Exchanging refresh token at {}", self.endpoints.refresh_url);

        let response = self
            .client
            .post(&self.endpoints.refresh_url)
            .headers(refresh_headers(&self.endpoints, &self.refresh_token))
            .json(&RefreshRequest { token: &self.refresh_token })
            .send()
            .await
            .map_err(|e| network_failure(kind, &e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| network_failure(kind, &e))?;
        if !status.is_success() {
            return Err(rejected(kind, status.as_u16(), truncate_error_body(&body, MAX_ERROR_BODY)));
        }

        let refreshed: RefreshResponse = serde_json::from_str(&body).map_err(|e| {
            rejected(kind, status.as_u16(), format!("unreadable refresh response: {}", e))
        })?;
        if refreshed.status == "error" {
            let message = refreshed
                .error
                .map(|e| format!("{}: {}", e.error_type, e.message))
                .unwrap_or_else(|| truncate_error_body(&body, MAX_ERROR_BODY));
            return Err(rejected(kind, status.as_u16(), message));
        }
        if refreshed.data.access_token.is_empty() {
            return Err(rejected(kind, status.as_u16(), "empty access token in response"));
        }
        Ok(refreshed.data.access_token)
    }
}

/// `MERLIN_TOKEN` used as-is.
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl CredentialSource for StaticTokenSource {
    fn kind(&self) -> CredentialSourceKind {
        CredentialSourceKind::Static
    }

    async fn fetch(&self) -> Result<String, CredentialError> {
        Ok(self.token.clone())
    }
}

/// Chat chain: session cookie, then refresh token, then static token.
pub fn chat_sources(
    secrets: &CredentialSecrets,
    client: &Client,
    endpoints: &Arc<UpstreamEndpoints>,
) -> Vec<Arc<dyn CredentialSource>> {
    let mut sources: Vec<Arc<dyn CredentialSource>> = Vec::new();
    if let Some(token) = secrets.session_token() {
        sources.push(Arc::new(SessionCookieSource::new(client.clone(), Arc::clone(endpoints), token)));
    }
    if let Some(token) = secrets.refresh_token() {
        sources.push(Arc::new(RefreshTokenSource::new(client.clone(), Arc::clone(endpoints), token)));
    }
    if let Some(token) = secrets.static_token() {
        sources.push(Arc::new(StaticTokenSource::new(token)));
    }
    sources
}

/// Image chain: the image endpoint accepts the static web token directly, so
/// it is tried first, then the session and refresh exchanges.
pub fn image_sources(
    secrets: &CredentialSecrets,
    client: &Client,
    endpoints: &Arc<UpstreamEndpoints>,
) -> Vec<Arc<dyn CredentialSource>> {
    let mut sources: Vec<Arc<dyn CredentialSource>> = Vec::new();
    if let Some(token) = secrets.static_token() {
        sources.push(Arc::new(StaticTokenSource::new(token)));
    }
    if let Some(token) = secrets.session_token() {
        sources.push(Arc::new(SessionCookieSource::new(client.clone(), Arc::clone(endpoints), token)));
    }
    if let Some(token) = secrets.refresh_token() {
        sources.push(Arc::new(RefreshTokenSource::new(client.clone(), Arc::clone(endpoints), token)));
    }
    sources
}
