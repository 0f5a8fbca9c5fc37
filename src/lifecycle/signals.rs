//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Translate the first signal into the shared stop signal
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - The gateway's own shutdown path does the rest; this module only
//!   reports that a signal arrived

/// Wait for SIGTERM or SIGINT. Returns the signal name.
#[cfg(unix)]
pub async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm =
        signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to register SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    }
}

/// Wait for ctrl-c on platforms without unix signals.
#[cfg(not(unix))]
pub async fn wait_for_signal() -> &'static str {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    "CTRL_C"
}
