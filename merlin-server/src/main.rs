//! Merlin Gateway - Headless Daemon
//!
//! Serves the OpenAI-compatible chat and image API on top of Merlin's web
//! endpoints.
//!
//! Access via: http://localhost:8081/v1/chat/completions

use anyhow::{Context, Result};
use clap::Parser;
use merlin_core::proxy::server::{AppState, AxumServer, ServerStartConfig};
use merlin_types::models::MerlinConfig;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod config_loader;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // .env must be loaded before clap reads env-backed flags
    let dotenv_result = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if dotenv_result.is_err() {
        warn!(".env file not found, using process environment only");
    }

    let config = config_loader::load_config(&cli.overrides).context("Invalid configuration")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::CheckCredentials => check_credentials(config).await,
        Commands::PrintConfig => print_config(&config),
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

async fn serve(config: MerlinConfig) -> Result<()> {
    if config.secrets.is_empty() {
        warn!(
            "No MERLIN_SESSION_TOKEN, MERLIN_REFRESH_TOKEN or MERLIN_TOKEN configured; \
             every request will fail until one is set"
        );
    }

    info!("Merlin gateway v{} starting", env!("CARGO_PKG_VERSION"));
    info!("Chat endpoint: {}", config.upstream.chat_url);
    info!("Image endpoint: {}", config.upstream.image_url);
    if config.upstream_proxy.enabled {
        info!("Upstream proxy enabled");
    }

    let host = config.server.host.clone();
    let port = config.server.port;
    let state = AppState::from_config(config).context("Failed to build gateway state")?;

    let server = AxumServer::new(ServerStartConfig { host, port, state });
    server.run().await.map_err(|e| anyhow::anyhow!("Server error: {}", e))
}

async fn check_credentials(config: MerlinConfig) -> Result<()> {
    let state = AppState::from_config(config).context("Failed to build gateway state")?;
    info!("Credential chain: {:?}", state.chat_credentials.source_kinds());

    let credential = state
        .chat_credentials
        .get_credential()
        .await
        .context("Failed to acquire a chat credential")?;

    println!("Credential prefix: {}", credential.redacted());
    println!("Valid until: {}", credential.expires_at().to_rfc3339());
    Ok(())
}

fn print_config(config: &MerlinConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(&config.redacted())?;
    println!("{}", json);
    Ok(())
}
