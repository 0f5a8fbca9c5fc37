//! TLS identity management: loading, hot reload, handshake resolution.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     PEM file pair → ServerIdentity → CertifiedKey → IdentityStore
//!
//! Runtime (source.rs):
//!     file change event → reload → atomic snapshot swap
//!     reload failure → log, keep the last good identity
//!
//! Handshake (identity.rs):
//!     rustls resolver → current snapshot, never a partial pair
//! ```

pub mod identity;
pub mod source;

pub use identity::{IdentityStore, ServerIdentity};
pub use source::CertificateSource;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificate found in {path:?}")]
    NoCertificate { path: PathBuf },

    #[error("invalid certificate in {path:?}")]
    InvalidCertificate { path: PathBuf },

    #[error("no private key found in {path:?}")]
    NoKey { path: PathBuf },

    #[error("invalid private key in {path:?}: {reason}")]
    InvalidKey { path: PathBuf, reason: String },

    #[error("unsupported private key type: {0}")]
    UnsupportedKey(String),

    #[error("failed to build TLS config: {0}")]
    Config(String),
}
