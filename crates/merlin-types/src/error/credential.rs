//! Credential acquisition errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which exchange path produced a credential (or failed to).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSourceKind {
    /// `MERLIN_SESSION_TOKEN` sent as a session cookie.
    SessionCookie,
    /// `MERLIN_REFRESH_TOKEN` exchanged at the UAM session endpoint.
    RefreshToken,
    /// `MERLIN_TOKEN` used as-is.
    Static,
}

impl fmt::Display for CredentialSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SessionCookie => "session cookie",
            Self::RefreshToken => "refresh token",
            Self::Static => "static token",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while obtaining an upstream bearer credential.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum CredentialError {
    /// No session token, refresh token or static token is configured.
    #[error("No credential secret configured (set MERLIN_SESSION_TOKEN, MERLIN_REFRESH_TOKEN or MERLIN_TOKEN)")]
    NoSecret,

    /// The upstream session service answered but refused the secret.
    #[error("Upstream rejected {source_kind} secret{}: {message}", status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    UpstreamRejected {
        source_kind: CredentialSourceKind,
        status: Option<u16>,
        message: String,
    },

    /// The session exchange could not reach the upstream service.
    #[error("Network failure during {source_kind} exchange: {message}")]
    NetworkFailure {
        source_kind: CredentialSourceKind,
        message: String,
    },
}

impl CredentialError {
    /// The exchange path this error came from, if any.
    pub fn source_kind(&self) -> Option<CredentialSourceKind> {
        match self {
            Self::NoSecret => None,
            Self::UpstreamRejected { source_kind, .. } | Self::NetworkFailure { source_kind, .. } => {
                Some(*source_kind)
            },
        }
    }
}
