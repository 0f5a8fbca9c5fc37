//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (gateway.rs):
//!     Build engine and routes → bind listeners → spawn serving tasks
//!
//! Shutdown (shutdown.rs):
//!     Signal fires → health NOT_SERVING → grace pause → bounded drain
//!     → join every task
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger the shared stop signal
//! ```
//!
//! # Design Decisions
//! - One stop signal for everything: external cancellation and internal
//!   task failures travel the same idempotent path
//! - Ordered shutdown: health first, then listeners, bounded by the
//!   drain timeout

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
