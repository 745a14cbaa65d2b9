use axum::{
    extract::DefaultBodyLimit,
    routing::{any, post},
    Router,
};
use merlin_types::error::ProxyError;
use merlin_types::models::MerlinConfig;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::proxy::common::client_builder::build_http_client;
use crate::proxy::credential::{chat_sources, image_sources, CredentialStore};
use crate::proxy::handlers;
use crate::proxy::image_generation::ImageOrchestrator;
use crate::proxy::upstream::UpstreamClient;

/// Chat requests carry a single prompt; 10 MiB leaves room for inline content parts.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Shared request state. Everything is owned here and injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<MerlinConfig>,
    pub chat_credentials: Arc<CredentialStore>,
    pub image_credentials: Arc<CredentialStore>,
    pub upstream: UpstreamClient,
    pub images: ImageOrchestrator,
}

impl AppState {
    /// Build the shared HTTP client (honouring `upstream_proxy`) and both credential stores.
    pub fn from_config(config: MerlinConfig) -> Result<Self, ProxyError> {
        let http_client = build_http_client(Some(&config.upstream_proxy), config.timeouts.connect())
            .map_err(|message| ProxyError::Internal { message })?;
        Ok(Self::with_http_client(config, http_client))
    }

    pub fn with_http_client(config: MerlinConfig, http_client: reqwest::Client) -> Self {
        let endpoints = Arc::new(config.upstream.clone());

        let chat_credentials = Arc::new(CredentialStore::new(
            "chat",
            chat_sources(&config.secrets, &http_client, &endpoints),
            config.timeouts.credential_lease(),
        ));
        let image_credentials = Arc::new(CredentialStore::new(
            "image",
            image_sources(&config.secrets, &http_client, &endpoints),
            config.timeouts.image_credential_lease(),
        ));

        let upstream = UpstreamClient::new(http_client, endpoints, config.timeouts.idle_read());
        let images = ImageOrchestrator::new(
            Arc::clone(&image_credentials),
            upstream.clone(),
            config.image.clone(),
        );

        Self { config: Arc::new(config), chat_credentials, image_credentials, upstream, images }
    }
}

pub fn build_proxy_router(state: AppState) -> Router<()> {
    use crate::proxy::handlers::common::{
        handle_fallback, handle_liveness, handle_method_not_allowed, handle_options,
    };

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        // OpenAI Protocol
        .route(
            "/v1/chat/completions",
            post(handlers::openai::handle_chat_completions)
                .options(handle_options)
                .fallback(handle_method_not_allowed),
        )
        .route(
            "/chat/completions",
            post(handlers::openai::handle_chat_completions)
                .options(handle_options)
                .fallback(handle_method_not_allowed),
        )
        .route(
            "/v1/images/generations",
            post(handlers::openai::handle_images_generations)
                .options(handle_options)
                .fallback(handle_method_not_allowed),
        )
        // Liveness
        .route("/", any(handle_liveness))
        .fallback(handle_fallback)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Configuration for starting the Axum server
pub struct ServerStartConfig {
    pub host: String,
    pub port: u16,
    pub state: AppState,
}

pub struct AxumServer {
    config: ServerStartConfig,
}

impl AxumServer {
    pub fn new(config: ServerStartConfig) -> Self {
        Self { config }
    }

    /// Serve until Ctrl-C, then drain in-flight requests.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let app = build_proxy_router(self.config.state);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("Merlin gateway listening on http://{}", listener.local_addr()?);

        axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
