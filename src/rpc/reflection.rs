//! Service and method enumeration for debugging clients.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use tonic::Status;

use crate::rpc::{RpcService, ServiceEntry};

/// Fully qualified name the reflection service registers under.
pub const SERVICE_NAME: &str = "gatehouse.reflection.v1.Reflection";

#[derive(Debug, Serialize)]
struct ListServicesResponse<'a> {
    services: &'a [ServiceEntry],
}

/// Read-only reflection over the engine's service table.
///
/// Registration closes once the gateway starts, so a snapshot taken at
/// startup stays accurate for the life of the process.
pub struct ReflectionService {
    services: Vec<ServiceEntry>,
}

impl ReflectionService {
    pub fn new(mut services: Vec<ServiceEntry>) -> Self {
        services.push(ServiceEntry {
            name: SERVICE_NAME.to_string(),
            methods: vec!["ListServices".to_string()],
        });
        services.sort_by(|a, b| a.name.cmp(&b.name));
        Self { services }
    }
}

#[async_trait]
impl RpcService for ReflectionService {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    fn methods(&self) -> &[&str] {
        &["ListServices"]
    }

    async fn call(&self, method: &str, _payload: Bytes) -> Result<Bytes, Status> {
        match method {
            "ListServices" => serde_json::to_vec(&ListServicesResponse {
                services: &self.services,
            })
            .map(Bytes::from)
            .map_err(|e| Status::internal(e.to_string())),
            other => Err(Status::unimplemented(format!("unknown method {other}"))),
        }
    }
}
