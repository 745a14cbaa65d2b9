//! Typed error definitions for Merlin Gateway.
//!
//! Every error here is:
//!
//! - **Serializable** for logs and API responses via serde
//! - **Displayable** via the thiserror-derived `Display`
//! - **Matchable** so handlers can pick the HTTP status and envelope

mod config;
mod credential;
mod proxy;
mod upstream;

pub use config::ConfigError;
pub use credential::{CredentialError, CredentialSourceKind};
pub use proxy::ProxyError;
pub use upstream::UpstreamStreamError;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = ProxyError::Credential(CredentialError::UpstreamRejected {
            source_kind: CredentialSourceKind::RefreshToken,
            status: Some(401),
            message: "token revoked".to_string(),
        });

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("UpstreamRejected"));
        assert!(json.contains("token revoked"));

        let deserialized: ProxyError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, deserialized);
    }

    #[test]
    fn test_error_display_mentions_source() {
        let err = CredentialError::NetworkFailure {
            source_kind: CredentialSourceKind::SessionCookie,
            message: "connection reset".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("session cookie"));
        assert!(msg.contains("connection reset"));
    }
}
