//! Gateway configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::{Validate, ValidationError};

use crate::error::ConfigError;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Full gateway configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct MerlinConfig {
    /// Listener settings
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerConfig,
    /// Long-lived secrets used to mint bearer credentials
    #[serde(default)]
    pub secrets: CredentialSecrets,
    /// Vendor endpoints and browser identity
    #[serde(default)]
    #[validate(nested)]
    pub upstream: UpstreamEndpoints,
    /// Optional outbound proxy for every upstream call
    #[serde(default)]
    #[validate(nested)]
    pub upstream_proxy: UpstreamProxyConfig,
    /// Connect, idle-read and lease durations
    #[serde(default)]
    #[validate(nested)]
    pub timeouts: TimeoutConfig,
    /// Defaults applied to every chat thread request
    #[serde(default)]
    pub chat: ChatDefaults,
    /// Defaults applied to every image generation request
    #[serde(default)]
    #[validate(nested)]
    pub image: ImageDefaults,
}

impl MerlinConfig {
    /// Parse a JSON config document and validate it.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(|e| ConfigError::from_json_error(&e))?;
        config.validated()
    }

    /// Run `validator` checks, mapping failures into [`ConfigError`].
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate().map_err(|e| ConfigError::from_validation_errors(&e))?;
        Ok(self)
    }

    /// Copy of this config with every secret masked, for printing.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.secrets = self.secrets.redacted();
        copy
    }
}

/// Listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    #[validate(range(min = 1_u16))]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Secrets supplied out of band (`MERLIN_SESSION_TOKEN`, `MERLIN_REFRESH_TOKEN`, `MERLIN_TOKEN`).
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialSecrets {
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub static_token: Option<String>,
}

impl CredentialSecrets {
    pub const SESSION_TOKEN_ENV: &'static str = "MERLIN_SESSION_TOKEN";
    pub const REFRESH_TOKEN_ENV: &'static str = "MERLIN_REFRESH_TOKEN";
    pub const STATIC_TOKEN_ENV: &'static str = "MERLIN_TOKEN";

    /// Session token, ignoring blank values.
    pub fn session_token(&self) -> Option<&str> {
        non_blank(self.session_token.as_deref())
    }

    /// Refresh token, ignoring blank values.
    pub fn refresh_token(&self) -> Option<&str> {
        non_blank(self.refresh_token.as_deref())
    }

    /// Static bearer token, ignoring blank values.
    pub fn static_token(&self) -> Option<&str> {
        non_blank(self.static_token.as_deref())
    }

    /// True when none of the three secrets is usable.
    pub fn is_empty(&self) -> bool {
        self.session_token().is_none()
            && self.refresh_token().is_none()
            && self.static_token().is_none()
    }

    /// Overlay non-blank values, later sources win.
    pub fn merge(&mut self, other: CredentialSecrets) {
        let CredentialSecrets { session_token, refresh_token, static_token } = other;
        overlay(&mut self.session_token, session_token);
        overlay(&mut self.refresh_token, refresh_token);
        overlay(&mut self.static_token, static_token);
    }

    pub fn redacted(&self) -> Self {
        Self {
            session_token: self.session_token().map(redact),
            refresh_token: self.refresh_token().map(redact),
            static_token: self.static_token().map(redact),
        }
    }
}

impl std::fmt::Debug for CredentialSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSecrets")
            .field("session_token", &self.session_token().map(redact))
            .field("refresh_token", &self.refresh_token().map(redact))
            .field("static_token", &self.static_token().map(redact))
            .finish()
    }
}

fn overlay(slot: &mut Option<String>, value: Option<String>) {
    if non_blank(value.as_deref()).is_some() {
        *slot = value;
    }
}

/// Mask a secret, keeping a short prefix for log correlation.
pub fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(6).collect();
    format!("{}***", prefix)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Vendor endpoints plus the browser identity the vendor expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct UpstreamEndpoints {
    /// Session-cookie exchange (`GET`)
    #[serde(default = "default_session_url")]
    #[validate(custom(function = "validate_http_url"))]
    pub session_url: String,
    /// Refresh-token exchange (`POST`)
    #[serde(default = "default_refresh_url")]
    #[validate(custom(function = "validate_http_url"))]
    pub refresh_url: String,
    /// Unified chat thread stream
    #[serde(default = "default_chat_url")]
    #[validate(custom(function = "validate_http_url"))]
    pub chat_url: String,
    /// Image generation stream
    #[serde(default = "default_image_url")]
    #[validate(custom(function = "validate_http_url"))]
    pub image_url: String,
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default = "default_referer")]
    pub referer: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for UpstreamEndpoints {
    fn default() -> Self {
        Self {
            session_url: default_session_url(),
            refresh_url: default_refresh_url(),
            chat_url: default_chat_url(),
            image_url: default_image_url(),
            origin: default_origin(),
            referer: default_referer(),
            user_agent: default_user_agent(),
        }
    }
}

impl UpstreamEndpoints {
    /// Point every endpoint at one base URL (mock servers, self-hosted relays).
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            session_url: format!("{}/session?from=web", base),
            refresh_url: format!("{}/session/get", base),
            chat_url: format!("{}/v1/thread/unified", base),
            image_url: format!("{}/web/v2/image-generation", base),
            ..Self::default()
        }
    }
}

/// Upstream proxy configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct UpstreamProxyConfig {
    /// Route upstream traffic through `url`
    #[serde(default)]
    pub enabled: bool,
    /// Proxy URL (http, https or socks5)
    #[serde(default)]
    pub url: String,
}

/// Connect, idle-read and credential lease durations, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct TimeoutConfig {
    #[serde(default = "default_connect_secs")]
    #[validate(range(min = 1_u64, max = 300_u64))]
    pub connect_secs: u64,
    /// Max gap between upstream chunks; 0 disables the idle timeout
    #[serde(default = "default_idle_read_secs")]
    pub idle_read_secs: u64,
    /// Lease applied to chat credentials (kept below the vendor's one hour lifetime)
    #[serde(default = "default_lease_secs")]
    #[validate(range(min = 30_u64, max = 86_400_u64))]
    pub credential_lease_secs: u64,
    /// Lease applied to image credentials
    #[serde(default = "default_lease_secs")]
    #[validate(range(min = 30_u64, max = 86_400_u64))]
    pub image_credential_lease_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: default_connect_secs(),
            idle_read_secs: default_idle_read_secs(),
            credential_lease_secs: default_lease_secs(),
            image_credential_lease_secs: default_lease_secs(),
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn idle_read(&self) -> Option<Duration> {
        (self.idle_read_secs > 0).then(|| Duration::from_secs(self.idle_read_secs))
    }

    pub fn credential_lease(&self) -> Duration {
        Duration::from_secs(self.credential_lease_secs)
    }

    pub fn image_credential_lease(&self) -> Duration {
        Duration::from_secs(self.image_credential_lease_secs)
    }
}

/// Defaults applied to every unified chat thread request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[allow(
    clippy::struct_excessive_bools,
    reason = "Configuration struct - bools mirror upstream metadata flags"
)]
pub struct ChatDefaults {
    /// Model used when the caller omits `model`
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Upstream `language` field
    #[serde(default = "default_language")]
    pub language: String,
    /// Upstream `metadata.webAccess`
    #[serde(default)]
    pub web_access: bool,
    /// Upstream `metadata.largeContext`
    #[serde(default)]
    pub large_context: bool,
    /// Upstream `metadata.merlinMagic`
    #[serde(default)]
    pub merlin_magic: bool,
    /// Upstream `metadata.proFinderMode`
    #[serde(default)]
    pub pro_finder_mode: bool,
}

impl Default for ChatDefaults {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            language: default_language(),
            web_access: false,
            large_context: false,
            merlin_magic: false,
            pro_finder_mode: false,
        }
    }
}

/// Defaults applied to every image generation request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct ImageDefaults {
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    /// Fixed number of variations requested per generation
    #[serde(default = "default_variations")]
    #[validate(range(min = 1_u32, max = 4_u32))]
    pub variations: u32,
    /// Text streamed before the image on the chat redirect path
    #[serde(default)]
    pub progress_message: Option<String>,
}

impl Default for ImageDefaults {
    fn default() -> Self {
        Self {
            aspect_ratio: default_aspect_ratio(),
            variations: default_variations(),
            progress_message: None,
        }
    }
}

fn validate_http_url(value: &str) -> Result<(), ValidationError> {
    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::new("http_url")),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8081
}

fn default_session_url() -> String {
    "https://session.getmerlin.in/?from=web".to_string()
}

fn default_refresh_url() -> String {
    "https://uam.getmerlin.in/session/get".to_string()
}

fn default_chat_url() -> String {
    "https://arcane.getmerlin.in/v1/thread/unified".to_string()
}

fn default_image_url() -> String {
    "https://uam.getmerlin.in/web/v2/image-generation".to_string()
}

fn default_origin() -> String {
    "https://www.getmerlin.in".to_string()
}

fn default_referer() -> String {
    "https://www.getmerlin.in/".to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

const fn default_connect_secs() -> u64 {
    10
}

const fn default_idle_read_secs() -> u64 {
    120
}

const fn default_lease_secs() -> u64 {
    55 * 60
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_language() -> String {
    "AUTO".to_string()
}

fn default_aspect_ratio() -> String {
    "1:1".to_string()
}

const fn default_variations() -> u32 {
    2
}
