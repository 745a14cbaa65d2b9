//! Upstream stream errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while opening or reading a vendor event stream.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum UpstreamStreamError {
    /// The request never produced a readable stream (transport error or non-2xx status).
    #[error("Upstream connect failed{}: {message}", status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    ConnectFailed { status: Option<u16>, message: String },

    /// The body broke off mid-stream.
    #[error("Upstream stream interrupted: {message}")]
    TransportInterrupted { message: String },

    /// A single record could not be decoded. Recovered locally by the reader.
    #[error("Malformed upstream record: {message}")]
    MalformedRecord { message: String },

    /// No bytes arrived within the configured idle window.
    #[error("Upstream stream idle for more than {secs}s")]
    IdleTimeout { secs: u64 },
}

impl UpstreamStreamError {
    /// True for errors that end the stream (everything except `MalformedRecord`).
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::MalformedRecord { .. })
    }
}
