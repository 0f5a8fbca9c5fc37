//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Plaintext listen address (serves HTTP/1.1 and h2c).
    pub listen_address: String,

    /// Optional TLS listener. All three fields travel together: TLS is
    /// enabled only when the whole table is present.
    pub tls: Option<TlsConfig>,

    /// Request limits applied uniformly to both listeners.
    pub limits: LimitsConfig,

    /// Shutdown pacing.
    pub shutdown: ShutdownConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:8080".to_string(),
            tls: None,
            limits: LimitsConfig::default(),
            shutdown: ShutdownConfig::default(),
        }
    }
}

/// TLS listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// TLS listen address.
    pub listen_address: String,

    /// Path to the PEM certificate chain.
    pub certificate_file: String,

    /// Path to the PEM private key.
    pub private_key_file: String,
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes, also the maximum RPC message
    /// size.
    pub max_body_bytes: usize,

    /// Whole-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10 * 1024 * 1024,
            request_timeout_secs: 10,
        }
    }
}

impl LimitsConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Shutdown pacing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Pause between marking health NOT_SERVING and stopping listeners,
    /// so upstream balancers can react before traffic is cut.
    pub grace_period_ms: u64,

    /// Bound on draining in-flight connections; whatever is still open
    /// after this is closed forcibly.
    pub drain_timeout_ms: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: 1000,
            drain_timeout_ms: 1000,
        }
    }
}

impl ShutdownConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}
