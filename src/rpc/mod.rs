//! In-process RPC engine subsystem.
//!
//! # Data Flow
//! ```text
//! Wire surface (engine.rs):
//!     HTTP/2 request → frame decode → dispatch → frame encode + trailers
//!
//! In-process surface (engine.rs):
//!     transcoding router → invoke(service, method, payload) → reply
//!
//! Services (service.rs):
//!     RpcService trait, registered once at startup
//! ```
//!
//! # Design Decisions
//! - Messages are JSON-encoded on both surfaces; the binary part is the
//!   gRPC framing, not the payload codec (the manual-service approach,
//!   no proto codegen)
//! - Unary only; errors become trailers-only responses
//! - `tonic::Status` is the error vocabulary end to end

pub mod engine;
pub mod frame;
pub mod reflection;
pub mod service;

pub use engine::{RpcEngine, ServiceEntry};
pub use service::RpcService;
