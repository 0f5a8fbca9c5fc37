//! Crate-level error taxonomy.
//!
//! Startup errors surface synchronously from `Gateway::start`; runtime
//! task errors trigger the shared stop signal and surface once every
//! task has wound down. Per-request errors never reach this type; they
//! are mapped onto HTTP statuses or RPC trailers at the request site.

use thiserror::Error;

use crate::config::ConfigError;
use crate::tls::TlsError;
use crate::transcode::route::RouteError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("listener failed: {0}")]
    Serve(#[source] std::io::Error),

    #[error("task failed: {0}")]
    Task(String),
}
