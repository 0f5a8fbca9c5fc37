//! Certificate file watching and hot reload.
//!
//! # Responsibilities
//! - Load the initial identity (fatal on failure)
//! - Watch both PEM files and swap the identity snapshot on change
//! - Keep the last good identity when a reload fails
//!
//! # Design Decisions
//! - notify with a polling fallback, the same watcher setup as a config
//!   hot-reload path
//! - Reload failures are logged and non-fatal; watcher setup failures
//!   tear the gateway down

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::Error;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::tls::identity::{IdentityStore, ServerIdentity};
use crate::tls::TlsError;

/// Interval for the watcher's polling fallback.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Watches a PEM file pair and keeps the identity store current.
pub struct CertificateSource {
    cert_path: PathBuf,
    key_path: PathBuf,
    store: Arc<IdentityStore>,
}

impl CertificateSource {
    /// Load the initial pair. With TLS enabled the gateway refuses to
    /// start when this fails.
    pub fn load(cert_path: &Path, key_path: &Path) -> Result<Self, TlsError> {
        let identity = ServerIdentity::load(cert_path, key_path)?;
        let store = Arc::new(IdentityStore::new(identity.into_certified_key()?));
        tracing::info!(
            cert = %cert_path.display(),
            key = %key_path.display(),
            "TLS identity loaded"
        );
        Ok(Self {
            cert_path: cert_path.to_path_buf(),
            key_path: key_path.to_path_buf(),
            store,
        })
    }

    pub fn store(&self) -> Arc<IdentityStore> {
        self.store.clone()
    }

    /// Re-read the file pair and swap it in.
    ///
    /// The prior identity stays active when anything about the new pair
    /// is unusable.
    pub fn reload(&self) -> Result<(), TlsError> {
        let identity = ServerIdentity::load(&self.cert_path, &self.key_path)?;
        self.store.swap(identity.into_certified_key()?);
        Ok(())
    }

    /// rustls server config resolving certificates through the store,
    /// with ALPN for HTTP/2 and HTTP/1.1.
    pub fn server_config(&self) -> Result<rustls::ServerConfig, TlsError> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let mut config = rustls::ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| TlsError::Config(e.to_string()))?
            .with_no_client_auth()
            .with_cert_resolver(self.store.clone());
        config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
        Ok(config)
    }

    /// Watch both files until the stop signal fires.
    pub async fn watch(self, mut shutdown: ShutdownSignal) -> Result<(), Error> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| match result {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        let _ = tx.send(());
                    }
                }
                Err(e) => tracing::error!(error = %e, "certificate watch error"),
            },
            NotifyConfig::default().with_poll_interval(POLL_INTERVAL),
        )?;
        watcher.watch(&self.cert_path, RecursiveMode::NonRecursive)?;
        watcher.watch(&self.key_path, RecursiveMode::NonRecursive)?;
        tracing::info!(
            cert = %self.cert_path.display(),
            key = %self.key_path.display(),
            "certificate watcher started"
        );

        loop {
            tokio::select! {
                _ = shutdown.wait() => {
                    tracing::debug!("certificate watcher stopping");
                    return Ok(());
                }
                received = rx.recv() => {
                    if received.is_none() {
                        return Ok(());
                    }
                    match self.reload() {
                        Ok(()) => tracing::info!("TLS identity reloaded"),
                        Err(e) => tracing::error!(
                            error = %e,
                            "certificate reload failed, keeping the previous identity"
                        ),
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for CertificateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateSource")
            .field("cert_path", &self.cert_path)
            .field("key_path", &self.key_path)
            .finish_non_exhaustive()
    }
}
