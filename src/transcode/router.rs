//! HTTP/JSON transcoding onto the RPC engine.
//!
//! # Responsibilities
//! - Match requests against the route table
//! - Bind body, query, and path parameters into a JSON request message
//! - Invoke the engine in process and translate the outcome to HTTP
//! - Answer health probes straight from the registry
//!
//! # Design Decisions
//! - Malformed input is rejected with 400 before the engine is invoked
//! - Path bindings override query parameters, which only fill fields the
//!   body left unset
//! - `/healthz` bypasses the engine entirely so probes keep answering
//!   even when the dispatch path is saturated; SERVING is 200, anything
//!   else is 503 so balancers pull the instance

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use bytes::Bytes;
use serde_json::{Map, Value};
use tonic::Status;

use crate::health::{HealthRegistry, ServingStatus};
use crate::rpc::RpcEngine;
use crate::transcode::error::{http_status, ErrorBody};
use crate::transcode::route::{BodyMapping, RouteTable};

/// Fixed health probe path served straight from the registry.
pub const HEALTH_PATH: &str = "/healthz";

pub struct TranscodingRouter {
    table: RouteTable,
    engine: Arc<RpcEngine>,
    registry: Arc<HealthRegistry>,
    max_body_bytes: usize,
}

impl TranscodingRouter {
    pub fn new(
        table: RouteTable,
        engine: Arc<RpcEngine>,
        registry: Arc<HealthRegistry>,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            table,
            engine,
            registry,
            max_body_bytes,
        }
    }

    /// Serve one request the multiplexer classified as HTTP/JSON.
    pub async fn serve(&self, request: Request<Body>) -> Response<Body> {
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let query = request.uri().query().map(str::to_string);

        if method == Method::GET && path == HEALTH_PATH {
            return self.health_response(query.as_deref());
        }

        let Some((rule, path_params)) = self.table.matches(&method, &path) else {
            return json_error(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("no route for {method} {path}"),
            );
        };

        let body = match axum::body::to_bytes(request.into_body(), self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(_) => {
                return json_error(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    "RESOURCE_EXHAUSTED",
                    "request body over the size limit".to_string(),
                )
            }
        };

        let message = match bind_message(&rule.body, &body, query.as_deref(), &path_params) {
            Ok(message) => message,
            Err(reason) => return json_error(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", reason),
        };

        let payload = match serde_json::to_vec(&message) {
            Ok(payload) => Bytes::from(payload),
            Err(e) => {
                return json_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", e.to_string())
            }
        };

        tracing::debug!(
            method = %method,
            path = %path,
            service = %rule.service,
            rpc_method = %rule.rpc_method,
            "transcoding request"
        );

        match self.engine.invoke(&rule.service, &rule.rpc_method, payload).await {
            Ok(reply) => {
                let body = if reply.is_empty() {
                    Bytes::from_static(b"{}")
                } else {
                    reply
                };
                json_response(StatusCode::OK, body)
            }
            Err(status) => status_response(&status),
        }
    }

    fn health_response(&self, query: Option<&str>) -> Response<Body> {
        let service = query
            .and_then(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .find(|(key, _)| key == "service")
                    .map(|(_, value)| value.into_owned())
            })
            .unwrap_or_default();

        let status = self.registry.get(&service);
        let http_status = if status == ServingStatus::Serving {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        let body = serde_json::json!({ "status": status.as_str() });
        json_response(http_status, Bytes::from(body.to_string()))
    }
}

impl std::fmt::Debug for TranscodingRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscodingRouter")
            .field("routes", &self.table.len())
            .finish_non_exhaustive()
    }
}

/// Build the JSON request message from body, query, and path bindings.
fn bind_message(
    body_mapping: &BodyMapping,
    body: &[u8],
    query: Option<&str>,
    path_params: &[(String, String)],
) -> Result<Value, String> {
    let mut message = match body_mapping {
        BodyMapping::None => Value::Object(Map::new()),
        BodyMapping::Whole => {
            if body.is_empty() {
                Value::Object(Map::new())
            } else {
                serde_json::from_slice(body).map_err(|e| format!("malformed JSON body: {e}"))?
            }
        }
        BodyMapping::Field(field) => {
            let value = if body.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(body).map_err(|e| format!("malformed JSON body: {e}"))?
            };
            let mut map = Map::new();
            map.insert(field.clone(), value);
            Value::Object(map)
        }
    };

    let needs_merge = query.is_some_and(|q| !q.is_empty()) || !path_params.is_empty();
    let Value::Object(fields) = &mut message else {
        if needs_merge {
            return Err("request body must be a JSON object to bind parameters".to_string());
        }
        return Ok(message);
    };

    // Query parameters only fill fields the body left unset.
    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            fields
                .entry(key.into_owned())
                .or_insert_with(|| Value::String(value.into_owned()));
        }
    }
    // Path bindings are authoritative and override everything.
    for (name, value) in path_params {
        fields.insert(name.clone(), Value::String(value.clone()));
    }

    Ok(message)
}

fn json_response(status: StatusCode, body: Bytes) -> Response<Body> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn status_response(status: &Status) -> Response<Body> {
    let body = ErrorBody::from_status(status);
    json_response(
        http_status(status.code()),
        Bytes::from(serde_json::to_vec(&body).unwrap_or_default()),
    )
}

fn json_error(status: StatusCode, code: &'static str, message: String) -> Response<Body> {
    json_response(
        status,
        Bytes::from(serde_json::to_vec(&ErrorBody { code, message }).unwrap_or_default()),
    )
}
