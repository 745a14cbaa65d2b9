//! # Merlin Core
//!
//! Protocol translation and session management for Merlin Gateway.
//!
//! ```text
//! merlin-core/src/proxy/
//! ├── credential/        # cached bearer credential, single-flight refresh, fallback chain
//! ├── upstream/          # HTTP client, browser headers, line-oriented SSE event reader
//! ├── mappers/merlin/    # vendor request builders + event -> NormalizedEvent translator
//! ├── mappers/openai/    # streaming SSE emitter and aggregating collector
//! ├── image_generation/  # model table + image orchestrator
//! ├── handlers/          # axum handlers (chat, images, liveness)
//! └── server.rs          # AppState, router, AxumServer
//! ```
//!
//! Request flow: handler → `CredentialStore::get_credential` → `UpstreamClient`
//! → `EventSource` → `translate_events` → streaming emitter or collector.

#![allow(
    clippy::significant_drop_tightening,
    reason = "Lock guards in async code require careful lifetime management"
)]
#![allow(clippy::module_name_repetitions, reason = "Type names mirror their modules")]
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::print_stdout,
        clippy::assertions_on_result_states
    )
)]

pub mod proxy;

pub use proxy::credential::{Credential, CredentialStore};
pub use proxy::server::{build_proxy_router, AppState, AxumServer, ServerStartConfig};
pub use proxy::upstream::UpstreamClient;
