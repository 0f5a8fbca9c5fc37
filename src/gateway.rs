//! Gateway lifecycle orchestration.
//!
//! # Responsibilities
//! - Wire the engine, route table, and shared serving stack
//! - Bind every listener before anything is spawned; fail startup as a
//!   unit
//! - Run one task per listener plus the certificate watcher and the
//!   shutdown sequencer, joined with first-failure-wins semantics
//!
//! # Design Decisions
//! - Health flips to NOT_SERVING before any listener stops, then a
//!   grace pause lets upstream balancers react, then draining is
//!   bounded by the drain timeout
//! - A task that exits without a stop request is treated as a failure
//! - The stop signal is shared and idempotent; external cancellation
//!   and internal failures travel the same path

use std::net::TcpListener;
use std::path::Path;
use std::sync::Arc;

use axum::http::Method;
use axum_server::Handle;
use tokio::task::JoinSet;

use crate::config::GatewayConfig;
use crate::error::Error;
use crate::health::service::HealthService;
use crate::health::{HealthRegistry, ServingStatus, SERVER};
use crate::lifecycle::shutdown::Shutdown;
use crate::rpc::reflection::{ReflectionService, SERVICE_NAME as REFLECTION_SERVICE};
use crate::rpc::{RpcEngine, RpcService};
use crate::server::{build_app, AppState};
use crate::tls::CertificateSource;
use crate::transcode::route::{BodyMapping, RouteRule, RouteTable};
use crate::transcode::TranscodingRouter;

/// A business service plus the HTTP shapes transcoding onto it.
struct Registration {
    service: Arc<dyn RpcService>,
    routes: Vec<RouteRule>,
}

/// The dual-protocol front door.
pub struct Gateway {
    config: GatewayConfig,
    registrations: Vec<Registration>,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            registrations: Vec::new(),
        }
    }

    /// Register a service and its transcoding routes.
    pub fn register(mut self, service: Arc<dyn RpcService>, routes: Vec<RouteRule>) -> Self {
        self.registrations.push(Registration { service, routes });
        self
    }

    /// Run until the stop signal fires and every task has wound down.
    ///
    /// All listeners are bound before anything is spawned: a bind or
    /// initial certificate failure returns here synchronously with
    /// nothing left running.
    pub async fn start(self, shutdown: Shutdown) -> Result<(), Error> {
        let config = self.config;
        tracing::info!("gateway starting");

        let registry = Arc::new(HealthRegistry::new());
        registry.set(SERVER, ServingStatus::Serving);

        let mut engine = RpcEngine::new(config.limits.max_body_bytes);
        engine.register(Arc::new(HealthService::new(registry.clone())));

        let mut rules = vec![RouteRule::new(
            Method::GET,
            "/v1/reflection/services",
            REFLECTION_SERVICE,
            "ListServices",
            BodyMapping::None,
        )?];
        for registration in self.registrations {
            registry.set(registration.service.name(), ServingStatus::Serving);
            rules.extend(registration.routes);
            engine.register(registration.service);
        }
        engine.register(Arc::new(ReflectionService::new(engine.entries())));
        let engine = Arc::new(engine);

        let table = RouteTable::build(rules);
        let transcoder = Arc::new(TranscodingRouter::new(
            table,
            engine.clone(),
            registry.clone(),
            config.limits.max_body_bytes,
        ));
        let app = build_app(AppState { engine, transcoder }, &config.limits);

        let plain_listener = bind(&config.listen_address)?;
        let tls = match &config.tls {
            Some(tls_config) => {
                let source = CertificateSource::load(
                    Path::new(&tls_config.certificate_file),
                    Path::new(&tls_config.private_key_file),
                )?;
                let rustls_config = axum_server::tls_rustls::RustlsConfig::from_config(Arc::new(
                    source.server_config()?,
                ));
                let listener = bind(&tls_config.listen_address)?;
                Some((source, rustls_config, listener))
            }
            None => None,
        };

        let mut tasks: JoinSet<Result<(), Error>> = JoinSet::new();
        let mut handles = Vec::new();

        let plain_handle = Handle::new();
        handles.push(plain_handle.clone());
        {
            let app = app.clone();
            tasks.spawn(async move {
                axum_server::from_tcp(plain_listener)
                    .handle(plain_handle)
                    .serve(app.into_make_service())
                    .await
                    .map_err(Error::Serve)
            });
        }

        if let Some((source, rustls_config, listener)) = tls {
            let tls_handle = Handle::new();
            handles.push(tls_handle.clone());
            let app = app.clone();
            tasks.spawn(async move {
                axum_server::from_tcp_rustls(listener, rustls_config)
                    .handle(tls_handle)
                    .serve(app.into_make_service())
                    .await
                    .map_err(Error::Serve)
            });

            let signal = shutdown.subscribe();
            tasks.spawn(async move { source.watch(signal).await });
        }

        {
            let mut signal = shutdown.subscribe();
            let registry = registry.clone();
            let pacing = config.shutdown.clone();
            let handles = handles.clone();
            tasks.spawn(async move {
                signal.wait().await;
                tracing::info!("gateway stopping");
                // Health goes first so probes fail before any connection
                // is refused.
                registry.shutdown();
                tokio::time::sleep(pacing.grace_period()).await;
                for handle in &handles {
                    handle.graceful_shutdown(Some(pacing.drain_timeout()));
                }
                tokio::time::sleep(pacing.drain_timeout()).await;
                let remaining: usize = handles.iter().map(Handle::connection_count).sum();
                if remaining > 0 {
                    tracing::warn!(
                        connections = remaining,
                        "drain timeout expired, closing remaining connections"
                    );
                }
                Ok(())
            });
        }

        tracing::info!(
            address = %config.listen_address,
            tls = config.tls.is_some(),
            "gateway running"
        );

        // First failure wins; its error is the overall result once every
        // task has acknowledged the stop signal.
        let mut first_error: Option<Error> = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {
                    if !shutdown.is_triggered() {
                        tracing::warn!("task exited before any stop request, stopping the gateway");
                        shutdown.trigger();
                    }
                }
                Ok(Err(error)) => {
                    tracing::error!(error = %error, "task failed");
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                    shutdown.trigger();
                }
                Err(join_error) => {
                    tracing::error!(error = %join_error, "task panicked");
                    if first_error.is_none() {
                        first_error = Some(Error::Task(join_error.to_string()));
                    }
                    shutdown.trigger();
                }
            }
        }

        tracing::info!("gateway stopped");
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Bind a std listener in non-blocking mode for axum-server.
fn bind(address: &str) -> Result<TcpListener, Error> {
    let listener = TcpListener::bind(address).map_err(|source| Error::Bind {
        addr: address.to_string(),
        source,
    })?;
    listener
        .set_nonblocking(true)
        .map_err(|source| Error::Bind {
            addr: address.to_string(),
            source,
        })?;
    tracing::info!(address = %address, "listener bound");
    Ok(listener)
}
