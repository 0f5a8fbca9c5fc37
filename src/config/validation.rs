//! Configuration validation.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid listen address {address:?}")]
    ListenAddress { address: String },

    #[error("invalid TLS listen address {address:?}")]
    TlsListenAddress { address: String },

    #[error("TLS requires {field} to be set")]
    MissingTlsField { field: &'static str },

    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("limits.request_timeout_secs must be greater than zero")]
    ZeroTimeout,
}

/// Validate a loaded configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listen_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::ListenAddress {
            address: config.listen_address.clone(),
        });
    }

    if let Some(tls) = &config.tls {
        if tls.listen_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::TlsListenAddress {
                address: tls.listen_address.clone(),
            });
        }
        if tls.certificate_file.is_empty() {
            errors.push(ValidationError::MissingTlsField {
                field: "certificate_file",
            });
        }
        if tls.private_key_file.is_empty() {
            errors.push(ValidationError::MissingTlsField {
                field: "private_key_file",
            });
        }
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.limits.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
