//! Health reporting subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (gateway startup):
//!     Server entry + one entry per RPC service → SERVING
//!
//! Probes (both protocol surfaces):
//!     GET /healthz            → registry read, no RPC involved
//!     Health/Check over RPC   → registry read via the engine
//!
//! Shutdown (sequencer, before listeners stop):
//!     shutdown() → every entry NOT_SERVING
//! ```
//!
//! # Design Decisions
//! - The status map is an atomically swapped snapshot; writers copy,
//!   mutate, and swap, so readers never see a partial update
//! - Only the gateway writes: registration at startup, the wholesale
//!   NOT_SERVING flip at shutdown start
//! - The empty service name is the whole-server entry, matching the
//!   gRPC health protocol convention

pub mod service;

use std::collections::HashMap;

use arc_swap::ArcSwap;
use serde::Serialize;

/// Service name under which the server as a whole reports health.
pub const SERVER: &str = "";

/// Serving state of one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServingStatus {
    Serving,
    NotServing,
    Unknown,
}

impl ServingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServingStatus::Serving => "SERVING",
            ServingStatus::NotServing => "NOT_SERVING",
            ServingStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Status registry shared by both protocol surfaces.
#[derive(Debug)]
pub struct HealthRegistry {
    services: ArcSwap<HashMap<String, ServingStatus>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self {
            services: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Set the status of one service.
    pub fn set(&self, service: &str, status: ServingStatus) {
        self.services.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(service.to_string(), status);
            next
        });
    }

    /// Status of one service; names never registered are Unknown.
    pub fn get(&self, service: &str) -> ServingStatus {
        self.services
            .load()
            .get(service)
            .copied()
            .unwrap_or(ServingStatus::Unknown)
    }

    /// Flip every known service to NOT_SERVING.
    ///
    /// Called once when shutdown begins, before any listener stops, so
    /// probes fail fast while in-flight traffic is still draining.
    pub fn shutdown(&self) {
        self.services.rcu(|current| {
            current
                .keys()
                .map(|name| (name.clone(), ServingStatus::NotServing))
                .collect::<HashMap<_, _>>()
        });
        tracing::info!("health registry marked NOT_SERVING");
    }
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}
