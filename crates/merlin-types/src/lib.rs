//! # Merlin Types
//!
//! Core types, models, and error definitions for Merlin Gateway.
//!
//! - **`error`** - Typed error hierarchy for credentials, upstream streams and the proxy surface
//! - **`models`** - Configuration models (server, secrets, upstream endpoints, defaults)
//! - **`protocol`** - OpenAI-compatible and Merlin vendor wire schemas
//!
//! ## Architecture Role
//!
//! `merlin-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!        merlin-types (this crate)
//!              │
//!              ▼
//!         merlin-core
//!              │
//!              ▼
//!        merlin-server
//! ```
//!
//! Nothing in this crate performs I/O.

pub mod error;
pub mod models;
pub mod protocol;

pub use error::{ConfigError, CredentialError, ProxyError, UpstreamStreamError};
pub use models::{
    ChatDefaults, CredentialSecrets, ImageDefaults, MerlinConfig, ServerConfig, TimeoutConfig,
    UpstreamEndpoints, UpstreamProxyConfig,
};
