//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! TOML file → loader.rs → schema.rs structs → validation.rs
//! ```
//!
//! # Design Decisions
//! - Every section has serde defaults; an empty file is a valid config
//! - TLS settings are a single optional table, keeping the
//!   all-or-nothing rule structural
//! - Validation collects every problem instead of stopping at the first

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{GatewayConfig, LimitsConfig, ShutdownConfig, TlsConfig};
pub use validation::{validate_config, ValidationError};
