//! Proxy module - OpenAI-compatible facade over the Merlin streaming API
//!
//! - Credential caching with single-flight refresh
//! - Vendor SSE decoding (both historical framings)
//! - OpenAI chunk streaming and non-streaming aggregation
//! - Image generation with markdown and Images API outputs

pub mod common;
pub mod credential;
pub mod handlers;
pub mod image_generation;
pub mod mappers;
pub mod server;
pub mod upstream;


pub use credential::{Credential, CredentialStore};
pub use server::{build_proxy_router, AppState, AxumServer, ServerStartConfig};
pub use upstream::{EventSource, UpstreamClient, VendorEvent};
