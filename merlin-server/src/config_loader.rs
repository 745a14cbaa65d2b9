//! Effective configuration: defaults, then the JSON file, then flags/env.

use merlin_types::error::ConfigError;
use merlin_types::models::{CredentialSecrets, MerlinConfig};
use std::path::Path;

use crate::cli::Overrides;

pub fn load_config(overrides: &Overrides) -> Result<MerlinConfig, ConfigError> {
    let base = match &overrides.config {
        Some(path) => read_config_file(path)?,
        None => MerlinConfig::default(),
    };
    apply_overrides(base, overrides).validated()
}

fn read_config_file(path: &Path) -> Result<MerlinConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::NotFound { path: path.display().to_string() },
        _ => ConfigError::ParseError { message: format!("{}: {}", path.display(), e) },
    })?;
    tracing::info!("Loaded config file {}", path.display());
    MerlinConfig::from_json_str(&raw)
}

fn apply_overrides(mut config: MerlinConfig, overrides: &Overrides) -> MerlinConfig {
    if let Some(host) = &overrides.host {
        config.server.host = host.clone();
    }
    if let Some(port) = overrides.port {
        config.server.port = port;
    }

    config.secrets.merge(CredentialSecrets {
        session_token: overrides.session_token.clone(),
        refresh_token: overrides.refresh_token.clone(),
        static_token: overrides.token.clone(),
    });

    if let Some(url) = overrides.upstream_proxy.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        config.upstream_proxy.enabled = true;
        config.upstream_proxy.url = url.to_string();
    }
    if let Some(secs) = overrides.idle_timeout_secs {
        config.timeouts.idle_read_secs = secs;
    }
    if let Some(web_access) = overrides.web_access {
        config.chat.web_access = web_access;
    }
    if let Some(language) = &overrides.language {
        config.chat.language = language.clone();
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let config = load_config(&Overrides::default()).unwrap();
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.timeouts.credential_lease_secs, 3300);
    }

    #[test]
    fn test_file_then_overrides() {
        let file = write_config(
            r#"{"server":{"port":9100},"secrets":{"session_token":"from-file","static_token":"file-static"},"chat":{"web_access":true}}"#,
        );
        let overrides = Overrides {
            config: Some(file.path().to_path_buf()),
            session_token: Some("from-env".to_string()),
            port: Some(9200),
            ..Overrides::default()
        };

        let config = load_config(&overrides).unwrap();

        assert_eq!(config.server.port, 9200);
        assert_eq!(config.secrets.session_token(), Some("from-env"));
        assert_eq!(config.secrets.static_token(), Some("file-static"));
        assert!(config.chat.web_access);
    }

    #[test]
    fn test_blank_override_keeps_file_secret() {
        let file = write_config(r#"{"secrets":{"refresh_token":"keep-me"}}"#);
        let overrides = Overrides {
            config: Some(file.path().to_path_buf()),
            refresh_token: Some("   ".to_string()),
            ..Overrides::default()
        };

        let config = load_config(&overrides).unwrap();
        assert_eq!(config.secrets.refresh_token(), Some("keep-me"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let overrides = Overrides {
            config: Some("/definitely/not/here.json".into()),
            ..Overrides::default()
        };
        assert!(matches!(load_config(&overrides), Err(ConfigError::NotFound { .. })));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let file = write_config(r#"{"image":{"variations":9}}"#);
        let overrides = Overrides { config: Some(file.path().to_path_buf()), ..Overrides::default() };
        assert!(matches!(load_config(&overrides), Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn test_upstream_proxy_override_enables_proxy() {
        let overrides = Overrides {
            upstream_proxy: Some("socks5://127.0.0.1:1080".to_string()),
            ..Overrides::default()
        };
        let config = load_config(&overrides).unwrap();
        assert!(config.upstream_proxy.enabled);
        assert_eq!(config.upstream_proxy.url, "socks5://127.0.0.1:1080");
    }
}
