//! HTTP/JSON transcoding subsystem.
//!
//! # Data Flow
//! ```text
//! Request (from the multiplexer):
//!     method + path → route table (longest match first)
//!     → bind body, query, and path parameters into a JSON message
//!     → invoke the RPC engine in process
//!     → reply JSON or a mapped HTTP error
//!
//! Health probes:
//!     GET /healthz → registry read, never touches the engine
//! ```

pub mod error;
pub mod route;
pub mod router;

pub use route::{BodyMapping, RouteRule, RouteTable};
pub use router::TranscodingRouter;
