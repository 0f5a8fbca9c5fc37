//! RPC engine: registration, dispatch, and the binary wire surface.
//!
//! # Responsibilities
//! - Hold the registered services and route unary calls to them
//! - Speak the gRPC wire surface for requests the multiplexer hands over
//! - Offer the same dispatch path in process for the transcoding router
//!
//! # Design Decisions
//! - Unknown service or method maps to UNIMPLEMENTED, framing problems
//!   to INTERNAL, oversized messages to RESOURCE_EXHAUSTED
//! - Success responses carry the reply frame plus `grpc-status: 0`
//!   trailers; errors are trailers-only responses with the status in the
//!   headers
//! - The response content type echoes the request's `application/grpc*`
//!   variant

use std::collections::HashMap;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Request, Response, StatusCode};
use bytes::Bytes;
use http_body::Frame;
use serde::Serialize;
use tonic::Status;

use crate::mux::GRPC_CONTENT_TYPE;
use crate::rpc::frame::{self, FrameError};
use crate::rpc::RpcService;

/// One row of the engine's service table, also consumed by reflection.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceEntry {
    pub name: String,
    pub methods: Vec<String>,
}

/// In-process unary RPC engine.
pub struct RpcEngine {
    services: HashMap<String, Arc<dyn RpcService>>,
    max_message_bytes: usize,
}

impl RpcEngine {
    pub fn new(max_message_bytes: usize) -> Self {
        Self {
            services: HashMap::new(),
            max_message_bytes,
        }
    }

    /// Register a service under its fully qualified name.
    pub fn register(&mut self, service: Arc<dyn RpcService>) {
        let name = service.name().to_string();
        if self.services.insert(name.clone(), service).is_some() {
            tracing::warn!(service = %name, "service registered twice, keeping the later one");
        }
    }

    /// Snapshot of every registered service, sorted by name.
    pub fn entries(&self) -> Vec<ServiceEntry> {
        let mut entries: Vec<ServiceEntry> = self
            .services
            .values()
            .map(|service| ServiceEntry {
                name: service.name().to_string(),
                methods: service.methods().iter().map(|m| m.to_string()).collect(),
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    /// In-process unary dispatch.
    ///
    /// The transcoding router calls this directly; the wire surface
    /// below funnels into it as well.
    pub async fn invoke(
        &self,
        service: &str,
        method: &str,
        payload: Bytes,
    ) -> Result<Bytes, Status> {
        let handler = self
            .services
            .get(service)
            .ok_or_else(|| Status::unimplemented(format!("unknown service {service}")))?;
        if !handler.methods().iter().any(|m| *m == method) {
            return Err(Status::unimplemented(format!(
                "unknown method {method} on {service}"
            )));
        }
        handler.call(method, payload).await
    }

    /// Serve one request the multiplexer classified as RPC.
    pub async fn serve(&self, request: Request<Body>) -> Response<Body> {
        let content_type = request
            .headers()
            .get(header::CONTENT_TYPE)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(GRPC_CONTENT_TYPE));
        let path = request.uri().path().to_string();

        let Some((service, method)) = split_path(&path) else {
            let status = Status::unimplemented(format!("malformed rpc path {path}"));
            return error_response(&content_type, &status);
        };

        let limit = frame::HEADER_LEN + self.max_message_bytes;
        let body = match axum::body::to_bytes(request.into_body(), limit).await {
            Ok(bytes) => bytes,
            Err(_) => {
                let status = Status::resource_exhausted("request body over the message size limit");
                return error_response(&content_type, &status);
            }
        };

        let payload = match frame::decode(&body, self.max_message_bytes) {
            Ok(payload) => payload,
            Err(err) => return error_response(&content_type, &status_for_frame_error(&err)),
        };

        tracing::debug!(service = %service, method = %method, "rpc dispatch");

        match self.invoke(service, method, payload).await {
            Ok(reply) => reply_response(&content_type, &reply),
            Err(status) => error_response(&content_type, &status),
        }
    }
}

impl std::fmt::Debug for RpcEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcEngine")
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .field("max_message_bytes", &self.max_message_bytes)
            .finish()
    }
}

/// Split `/package.Service/Method` into its two parts.
fn split_path(path: &str) -> Option<(&str, &str)> {
    let (service, method) = path.strip_prefix('/')?.split_once('/')?;
    if service.is_empty() || method.is_empty() || method.contains('/') {
        return None;
    }
    Some((service, method))
}

fn status_for_frame_error(err: &FrameError) -> Status {
    match err {
        FrameError::Compressed => Status::unimplemented(err.to_string()),
        FrameError::Oversize { .. } => Status::resource_exhausted(err.to_string()),
        FrameError::Truncated { .. } | FrameError::Trailing(_) => Status::internal(err.to_string()),
    }
}

fn reply_response(content_type: &HeaderValue, reply: &[u8]) -> Response<Body> {
    let mut trailers = HeaderMap::new();
    trailers.insert("grpc-status", HeaderValue::from_static("0"));
    let body = GrpcBody {
        data: Some(frame::encode(reply)),
        trailers: Some(trailers),
    };
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.clone())
        .body(Body::new(body))
        .unwrap()
}

/// Trailers-only error response: the status travels in the headers.
fn error_response(content_type: &HeaderValue, status: &Status) -> Response<Body> {
    let code = status.code() as i32;
    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.clone())
        .header("grpc-status", code.to_string())
        .body(Body::empty())
        .unwrap();
    if !status.message().is_empty() {
        if let Ok(value) = HeaderValue::from_str(&percent_encode(status.message())) {
            response.headers_mut().insert("grpc-message", value);
        }
    }
    response
}

/// Percent-encode a status message per the gRPC header rules.
fn percent_encode(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    for byte in message.bytes() {
        if byte == b'%' || !(0x20..=0x7e).contains(&byte) {
            out.push_str(&format!("%{byte:02X}"));
        } else {
            out.push(byte as char);
        }
    }
    out
}

/// Unary response body: one data frame followed by the status trailers.
struct GrpcBody {
    data: Option<Bytes>,
    trailers: Option<HeaderMap>,
}

impl http_body::Body for GrpcBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, Infallible>>> {
        let this = self.get_mut();
        if let Some(data) = this.data.take() {
            return Poll::Ready(Some(Ok(Frame::data(data))));
        }
        if let Some(trailers) = this.trailers.take() {
            return Poll::Ready(Some(Ok(Frame::trailers(trailers))));
        }
        Poll::Ready(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use http_body_util::BodyExt;
    use tonic::Code;

    struct UpperService;

    #[async_trait]
    impl RpcService for UpperService {
        fn name(&self) -> &str {
            "text.v1.TextService"
        }

        fn methods(&self) -> &[&str] {
            &["Upper"]
        }

        async fn call(&self, method: &str, payload: Bytes) -> Result<Bytes, Status> {
            match method {
                "Upper" => Ok(Bytes::from(payload.to_ascii_uppercase())),
                other => Err(Status::unimplemented(other.to_string())),
            }
        }
    }

    fn engine() -> RpcEngine {
        let mut engine = RpcEngine::new(1024 * 1024);
        engine.register(Arc::new(UpperService));
        engine
    }

    fn grpc_request(path: &str, payload: &[u8]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/grpc+json")
            .body(Body::from(frame::encode(payload)))
            .unwrap()
    }

    #[tokio::test]
    async fn invoke_dispatches_to_the_service() {
        let reply = engine()
            .invoke("text.v1.TextService", "Upper", Bytes::from_static(b"hi"))
            .await
            .unwrap();
        assert_eq!(&reply[..], b"HI");
    }

    #[tokio::test]
    async fn invoke_unknown_service_is_unimplemented() {
        let err = engine()
            .invoke("nope.v1.Nope", "Upper", Bytes::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::Unimplemented);
    }

    #[tokio::test]
    async fn invoke_undeclared_method_is_unimplemented() {
        let err = engine()
            .invoke("text.v1.TextService", "Lower", Bytes::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::Unimplemented);
    }

    #[tokio::test]
    async fn serve_success_carries_frame_and_trailers() {
        let response = engine()
            .serve(grpc_request("/text.v1.TextService/Upper", b"hi"))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/grpc+json"
        );

        let collected = response.into_body().collect().await.unwrap();
        let trailers = collected.trailers().cloned();
        let payload = frame::decode(&collected.to_bytes(), 1024 * 1024).unwrap();
        assert_eq!(&payload[..], b"HI");
        assert_eq!(trailers.unwrap().get("grpc-status").unwrap(), "0");
    }

    #[tokio::test]
    async fn serve_unknown_method_is_trailers_only() {
        let response = engine()
            .serve(grpc_request("/text.v1.TextService/Lower", b"hi"))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("grpc-status").unwrap(),
            &(Code::Unimplemented as i32).to_string()
        );
        let collected = response.into_body().collect().await.unwrap();
        assert!(collected.to_bytes().is_empty());
    }

    #[tokio::test]
    async fn serve_malformed_frame_is_internal() {
        let request = Request::builder()
            .method("POST")
            .uri("/text.v1.TextService/Upper")
            .header(header::CONTENT_TYPE, "application/grpc")
            .body(Body::from(&b"\x00\x00"[..]))
            .unwrap();
        let response = engine().serve(request).await;
        assert_eq!(
            response.headers().get("grpc-status").unwrap(),
            &(Code::Internal as i32).to_string()
        );
    }

    #[tokio::test]
    async fn serve_malformed_path_is_unimplemented() {
        let response = engine().serve(grpc_request("/justone", b"")).await;
        assert_eq!(
            response.headers().get("grpc-status").unwrap(),
            &(Code::Unimplemented as i32).to_string()
        );
    }

    #[test]
    fn percent_encoding_escapes_control_bytes() {
        assert_eq!(percent_encode("plain text"), "plain text");
        assert_eq!(percent_encode("a%b"), "a%25b");
        assert_eq!(percent_encode("line\nbreak"), "line%0Abreak");
    }

    #[test]
    fn split_path_rejects_bad_shapes() {
        assert_eq!(
            split_path("/svc/Method"),
            Some(("svc", "Method"))
        );
        assert_eq!(split_path("/svc"), None);
        assert_eq!(split_path("/svc/"), None);
        assert_eq!(split_path("//Method"), None);
        assert_eq!(split_path("/svc/a/b"), None);
    }
}
