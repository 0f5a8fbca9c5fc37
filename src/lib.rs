//! Dual-protocol RPC/JSON front door.
//!
//! Serves a binary gRPC-style protocol and its HTTP/JSON transcoded
//! equivalent on the same port(s), with live TLS certificate rotation
//! and coordinated graceful shutdown.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//!                 │                  GATEHOUSE                    │
//!                 │                                               │
//!   client ───────┼─▶ listener ──▶ mux::classify                  │
//!                 │   (plain h2c/http1,     │                     │
//!                 │    optional TLS)        │                     │
//!                 │            HTTP/2 + application/grpc          │
//!                 │                 │              │ otherwise    │
//!                 │                 ▼              ▼              │
//!                 │            rpc engine ◀── transcode router    │
//!                 │                 ▲        (in-process invoke)  │
//!                 │                 │                             │
//!                 │   ┌─────────────┴──────────────────────────┐  │
//!                 │   │ tls::CertificateSource  hot identity   │  │
//!                 │   │ health::HealthRegistry  /healthz, RPC  │  │
//!                 │   │ gateway::Gateway  bind, spawn, drain   │  │
//!                 │   └────────────────────────────────────────┘  │
//!                 └──────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod mux;
pub mod rpc;
pub mod server;
pub mod transcode;

// Shared state
pub mod health;
pub mod tls;

// Cross-cutting concerns
pub mod error;
pub mod gateway;
pub mod lifecycle;

pub use config::GatewayConfig;
pub use error::Error;
pub use gateway::Gateway;
pub use lifecycle::shutdown::Shutdown;
pub use rpc::RpcService;
