//! Per-request protocol classification.
//!
//! # Responsibilities
//! - Decide, for every inbound request, whether it belongs to the binary
//!   RPC engine or to the JSON transcoding router
//! - Evaluate the transport framing version before trusting any header
//!
//! # Design Decisions
//! - Pure function of (HTTP version, Content-Type); holds no state
//! - The HTTP/2 check short-circuits: a spoofed `application/grpc`
//!   content type over HTTP/1.1 is still JSON-routed
//! - Prefix match on the content type so `application/grpc+json` and
//!   friends stay on the RPC path
//! - Classification happens per request, not per connection, because
//!   both protocols can share one connection across upgrades

use axum::http::{HeaderValue, Version};

/// Content type prefix negotiated by gRPC clients.
pub const GRPC_CONTENT_TYPE: &str = "application/grpc";

/// Where a request is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Binary RPC engine (HTTP/2 framing plus gRPC content type).
    Rpc,
    /// HTTP/JSON transcoding router.
    Transcode,
}

/// Classify a request by transport version and content type.
///
/// The framing-version check is load-bearing and runs first: without
/// HTTP/2 the content type is not consulted at all.
pub fn classify(version: Version, content_type: Option<&HeaderValue>) -> Protocol {
    if version != Version::HTTP_2 {
        return Protocol::Transcode;
    }
    match content_type.and_then(|value| value.to_str().ok()) {
        Some(ct) if ct.starts_with(GRPC_CONTENT_TYPE) => Protocol::Rpc,
        _ => Protocol::Transcode,
    }
}
