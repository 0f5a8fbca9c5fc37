//! Shared request-serving stack for both listeners.
//!
//! # Responsibilities
//! - Build the axum router both listeners serve
//! - Wire the middleware stack (tracing, timeout, body limit)
//! - Dispatch each request per the multiplexer's classification
//!
//! # Design Decisions
//! - One router instance serves plaintext and TLS alike, so limits and
//!   timeouts hold uniformly across both protocol paths
//! - The dispatch handler owns no logic beyond classification; the
//!   engine and the transcoding router each format their own responses

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::LimitsConfig;
use crate::mux::{self, Protocol};
use crate::rpc::RpcEngine;
use crate::transcode::TranscodingRouter;

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RpcEngine>,
    pub transcoder: Arc<TranscodingRouter>,
}

/// Build the shared router with its middleware stack.
pub fn build_app(state: AppState, limits: &LimitsConfig) -> Router {
    Router::new()
        .route("/", any(dispatch))
        .route("/{*path}", any(dispatch))
        .with_state(state)
        .layer(TimeoutLayer::new(limits.request_timeout()))
        .layer(RequestBodyLimitLayer::new(limits.max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

/// Forward one request to the RPC engine or the transcoding router.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    match mux::classify(request.version(), request.headers().get(header::CONTENT_TYPE)) {
        Protocol::Rpc => state.engine.serve(request).await.into_response(),
        Protocol::Transcode => state.transcoder.serve(request).await.into_response(),
    }
}
