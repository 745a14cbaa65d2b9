use merlin_types::models::UpstreamProxyConfig;
use std::time::Duration;

/// Build the shared upstream HTTP client.
///
/// No overall request timeout is set: chat streams can legitimately run for
/// minutes. Idle reads are bounded per chunk by the event reader instead.
pub fn build_http_client(
    upstream_proxy: Option<&UpstreamProxyConfig>,
    connect_timeout: Duration,
) -> Result<reqwest::Client, String> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .tcp_nodelay(true);

    if let Some(config) = upstream_proxy {
        if config.enabled && !config.url.is_empty() {
            let proxy = reqwest::Proxy::all(&config.url)
                .map_err(|e| format!("Invalid upstream proxy url: {}", e))?;
            builder = builder.proxy(proxy);
        }
    }

    builder.build().map_err(|e| format!("Failed to build HTTP client: {}", e))
}
