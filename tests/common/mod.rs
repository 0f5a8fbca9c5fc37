//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::Method;
use bytes::Bytes;
use tonic::Status;

use gatehouse::config::{GatewayConfig, TlsConfig};
use gatehouse::transcode::route::{BodyMapping, RouteRule};
use gatehouse::RpcService;

/// Echo service used as stand-in business logic.
pub struct EchoService {
    pub calls: AtomicU32,
}

impl EchoService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl RpcService for EchoService {
    fn name(&self) -> &str {
        "echo.v1.EchoService"
    }

    fn methods(&self) -> &[&str] {
        &["Echo", "Fail"]
    }

    async fn call(&self, method: &str, payload: Bytes) -> Result<Bytes, Status> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match method {
            "Echo" => {
                if payload.is_empty() {
                    Ok(Bytes::from_static(b"{}"))
                } else {
                    Ok(payload)
                }
            }
            "Fail" => Err(Status::not_found("no such widget")),
            other => Err(Status::unimplemented(other.to_string())),
        }
    }
}

/// Transcoding routes for the echo service.
pub fn echo_routes() -> Vec<RouteRule> {
    vec![
        RouteRule::new(
            Method::POST,
            "/v1/echo",
            "echo.v1.EchoService",
            "Echo",
            BodyMapping::Whole,
        )
        .unwrap(),
        RouteRule::new(
            Method::GET,
            "/v1/echo/{message}",
            "echo.v1.EchoService",
            "Echo",
            BodyMapping::None,
        )
        .unwrap(),
        RouteRule::new(
            Method::GET,
            "/v1/fail",
            "echo.v1.EchoService",
            "Fail",
            BodyMapping::None,
        )
        .unwrap(),
    ]
}

/// Plaintext-only config with fast shutdown pacing for tests.
pub fn plaintext_config(addr: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listen_address = addr.to_string();
    config.shutdown.grace_period_ms = 100;
    config.shutdown.drain_timeout_ms = 200;
    config
}

/// Config with a TLS listener on `tls_addr` using the given file pair.
pub fn tls_config(addr: &str, tls_addr: &str, cert: &PathBuf, key: &PathBuf) -> GatewayConfig {
    let mut config = plaintext_config(addr);
    config.tls = Some(TlsConfig {
        listen_address: tls_addr.to_string(),
        certificate_file: cert.display().to_string(),
        private_key_file: key.display().to_string(),
    });
    config
}

/// Self-signed localhost pair written under a fresh temp directory.
pub fn write_cert_pair(dir_name: &str) -> (PathBuf, PathBuf) {
    use rcgen::{CertificateParams, KeyPair};

    let dir = std::env::temp_dir().join(dir_name);
    std::fs::create_dir_all(&dir).unwrap();
    let key = KeyPair::generate().unwrap();
    let cert = CertificateParams::new(vec!["localhost".to_string()])
        .unwrap()
        .self_signed(&key)
        .unwrap();
    let cert_path = dir.join("tls.crt");
    let key_path = dir.join("tls.key");
    std::fs::write(&cert_path, cert.pem()).unwrap();
    std::fs::write(&key_path, key.serialize_pem()).unwrap();
    (cert_path, key_path)
}

/// Client that never routes through a proxy or pools between tests.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
