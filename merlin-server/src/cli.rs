use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "merlin-server",
    about = "Merlin Gateway - OpenAI-compatible chat and image API",
    version = env!("CARGO_PKG_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[arg(short, long, global = true, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

/// Values that win over the JSON config file.
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    #[arg(short, long, global = true, env = "MERLIN_CONFIG", help = "Path to a JSON config file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, env = "MERLIN_HOST")]
    pub host: Option<String>,

    #[arg(short, long, global = true, env = "PORT")]
    pub port: Option<u16>,

    #[arg(long, global = true, env = "MERLIN_SESSION_TOKEN", hide_env_values = true)]
    pub session_token: Option<String>,

    #[arg(long, global = true, env = "MERLIN_REFRESH_TOKEN", hide_env_values = true)]
    pub refresh_token: Option<String>,

    #[arg(long, global = true, env = "MERLIN_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[arg(long, global = true, env = "MERLIN_UPSTREAM_PROXY", help = "http(s) or socks5 proxy for upstream calls")]
    pub upstream_proxy: Option<String>,

    #[arg(long, global = true, env = "MERLIN_IDLE_TIMEOUT_SECS", help = "Max seconds between upstream chunks (0 disables)")]
    pub idle_timeout_secs: Option<u64>,

    #[arg(long, global = true, env = "MERLIN_WEB_ACCESS")]
    pub web_access: Option<bool>,

    #[arg(long, global = true, env = "MERLIN_LANGUAGE")]
    pub language: Option<String>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    #[command(about = "Start the gateway (default if no command specified)")]
    Serve,

    #[command(about = "Acquire one chat credential and print a redacted prefix")]
    CheckCredentials,

    #[command(about = "Print the effective configuration with secrets redacted")]
    PrintConfig,
}
