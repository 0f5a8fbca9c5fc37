//! Certificate identity snapshots.
//!
//! The active (certificate chain, private key) pair lives behind an
//! atomic pointer swap. Handshakes resolve the current snapshot; a
//! reload installs a complete replacement and never mutates in place, so
//! no reader can observe the old certificate with the new key or the
//! reverse.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::{ClientHello, ResolvesServerCert};
use rustls::sign::CertifiedKey;

use crate::tls::TlsError;

/// A complete (certificate chain, private key) pair read from disk.
pub struct ServerIdentity {
    pub cert_chain: Vec<CertificateDer<'static>>,
    pub key: PrivateKeyDer<'static>,
}

impl ServerIdentity {
    /// Parse a PEM file pair.
    ///
    /// Fails on unreadable files, an empty certificate chain, or an
    /// unparsable key; errors name the offending file.
    pub fn load(cert_path: &Path, key_path: &Path) -> Result<Self, TlsError> {
        let cert_file = File::open(cert_path).map_err(|source| TlsError::Read {
            path: cert_path.to_path_buf(),
            source,
        })?;
        let cert_chain: Vec<CertificateDer<'static>> =
            rustls_pemfile::certs(&mut BufReader::new(cert_file))
                .collect::<Result<_, _>>()
                .map_err(|_| TlsError::InvalidCertificate {
                    path: cert_path.to_path_buf(),
                })?;
        if cert_chain.is_empty() {
            return Err(TlsError::NoCertificate {
                path: cert_path.to_path_buf(),
            });
        }

        let key_file = File::open(key_path).map_err(|source| TlsError::Read {
            path: key_path.to_path_buf(),
            source,
        })?;
        let key = rustls_pemfile::private_key(&mut BufReader::new(key_file))
            .map_err(|e| TlsError::InvalidKey {
                path: key_path.to_path_buf(),
                reason: e.to_string(),
            })?
            .ok_or_else(|| TlsError::NoKey {
                path: key_path.to_path_buf(),
            })?;

        Ok(Self { cert_chain, key })
    }

    /// Convert into the form rustls hands to handshakes.
    pub fn into_certified_key(self) -> Result<CertifiedKey, TlsError> {
        let signing_key = rustls::crypto::ring::sign::any_supported_type(&self.key)
            .map_err(|e| TlsError::UnsupportedKey(e.to_string()))?;
        Ok(CertifiedKey::new(self.cert_chain, signing_key))
    }
}

impl fmt::Debug for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerIdentity")
            .field("certs", &self.cert_chain.len())
            .finish_non_exhaustive()
    }
}

/// Lock-free holder of the active identity.
///
/// Readers always get a complete snapshot. A handshake that resolved the
/// old pair keeps it alive through its own Arc even while a swap lands.
pub struct IdentityStore {
    current: ArcSwap<CertifiedKey>,
}

impl IdentityStore {
    pub fn new(initial: CertifiedKey) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Current snapshot; never blocks, never partial.
    pub fn current(&self) -> Arc<CertifiedKey> {
        self.current.load_full()
    }

    /// Install a replacement snapshot.
    pub fn swap(&self, next: CertifiedKey) {
        self.current.store(Arc::new(next));
    }
}

impl fmt::Debug for IdentityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityStore").finish_non_exhaustive()
    }
}

impl ResolvesServerCert for IdentityStore {
    fn resolve(&self, _client_hello: ClientHello<'_>) -> Option<Arc<CertifiedKey>> {
        Some(self.current.load_full())
    }
}
