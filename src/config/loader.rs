//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_a_full_config() {
        let path = write_config(
            "gatehouse-loader-full.toml",
            r#"
listen_address = "127.0.0.1:9000"

[tls]
listen_address = "127.0.0.1:9443"
certificate_file = "/etc/tls/tls.crt"
private_key_file = "/etc/tls/tls.key"

[limits]
max_body_bytes = 1048576
request_timeout_secs = 5

[shutdown]
grace_period_ms = 250
drain_timeout_ms = 500
"#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.listen_address, "127.0.0.1:9000");
        let tls = config.tls.unwrap();
        assert_eq!(tls.listen_address, "127.0.0.1:9443");
        assert_eq!(config.limits.max_body_bytes, 1048576);
        assert_eq!(config.shutdown.grace_period_ms, 250);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let path = write_config("gatehouse-loader-min.toml", "");
        let config = load_config(&path).unwrap();
        assert_eq!(config.listen_address, "0.0.0.0:8080");
        assert!(config.tls.is_none());
        assert_eq!(config.limits.max_body_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn invalid_config_fails_validation() {
        let path = write_config("gatehouse-loader-bad.toml", "listen_address = \"nope\"\n");
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
