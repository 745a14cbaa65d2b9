//! Configuration models.

pub mod config;

pub use config::{
    ChatDefaults, CredentialSecrets, ImageDefaults, MerlinConfig, ServerConfig, TimeoutConfig,
    UpstreamEndpoints, UpstreamProxyConfig,
};
