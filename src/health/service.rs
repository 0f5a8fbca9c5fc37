//! RPC health-check service.
//!
//! Implements the standard `grpc.health.v1.Health/Check` shape over the
//! engine's JSON codec. `Watch` is a server stream and stays out of the
//! unary engine.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tonic::Status;

use crate::health::{HealthRegistry, ServingStatus};
use crate::rpc::RpcService;

/// Fully qualified name the health service registers under.
pub const SERVICE_NAME: &str = "grpc.health.v1.Health";

#[derive(Debug, Default, Deserialize)]
struct CheckRequest {
    /// Service to query; empty means the server as a whole.
    #[serde(default)]
    service: String,
}

#[derive(Debug, Serialize)]
struct CheckResponse {
    status: ServingStatus,
}

/// Health service backed by the shared registry.
pub struct HealthService {
    registry: Arc<HealthRegistry>,
}

impl HealthService {
    pub fn new(registry: Arc<HealthRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl RpcService for HealthService {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    fn methods(&self) -> &[&str] {
        &["Check"]
    }

    async fn call(&self, method: &str, payload: Bytes) -> Result<Bytes, Status> {
        match method {
            "Check" => {
                let request: CheckRequest = if payload.is_empty() {
                    CheckRequest::default()
                } else {
                    serde_json::from_slice(&payload).map_err(|e| {
                        Status::invalid_argument(format!("invalid check request: {e}"))
                    })?
                };

                let status = self.registry.get(&request.service);
                // The health protocol distinguishes "not serving" from
                // "never heard of you": unknown names get NOT_FOUND.
                if status == ServingStatus::Unknown && !request.service.is_empty() {
                    return Err(Status::not_found(format!(
                        "unknown service {:?}",
                        request.service
                    )));
                }

                serde_json::to_vec(&CheckResponse { status })
                    .map(Bytes::from)
                    .map_err(|e| Status::internal(e.to_string()))
            }
            other => Err(Status::unimplemented(format!("unknown method {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::SERVER;
    use tonic::Code;

    fn service() -> HealthService {
        let registry = Arc::new(HealthRegistry::new());
        registry.set(SERVER, ServingStatus::Serving);
        registry.set("widgets.v1.WidgetService", ServingStatus::NotServing);
        HealthService::new(registry)
    }

    #[tokio::test]
    async fn empty_payload_checks_the_whole_server() {
        let reply = service().call("Check", Bytes::new()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&reply).unwrap();
        assert_eq!(value["status"], "SERVING");
    }

    #[tokio::test]
    async fn named_service_reports_its_own_status() {
        let reply = service()
            .call(
                "Check",
                Bytes::from(r#"{"service":"widgets.v1.WidgetService"}"#),
            )
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&reply).unwrap();
        assert_eq!(value["status"], "NOT_SERVING");
    }

    #[tokio::test]
    async fn unknown_service_is_not_found() {
        let err = service()
            .call("Check", Bytes::from(r#"{"service":"nope"}"#))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn undeclared_method_is_unimplemented() {
        let err = service().call("Watch", Bytes::new()).await.unwrap_err();
        assert_eq!(err.code(), Code::Unimplemented);
    }
}
