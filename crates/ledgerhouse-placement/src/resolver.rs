//! Rack resolution.
//!
//! The policy learns where a node lives by resolving its host through a
//! [`RackResolver`]. The resolver is an injected capability: production
//! deployments back it with whatever names their racks (a DNS convention,
//! a cloud metadata service, a config file), and tests inject a
//! [`StaticRackResolver`] with a fixed table.
//!
//! Resolution never fails a cluster update: hosts the resolver does not
//! know about are placed in the default rack.

use ledgerhouse_core::RackPath;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Maps a host name to its rack path.
///
/// Implementations must be cheap: resolution happens on every cluster
/// membership change for each newly-seen host.
pub trait RackResolver: Send + Sync {
    /// Resolve a host to its rack path, or `None` when unknown.
    fn resolve(&self, host: &str) -> Option<RackPath>;
}

/// Resolver that places every host in the default rack.
///
/// Used when no resolver is injected; the resulting single-region topology
/// degrades placement to plain rack-unaware selection.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRackResolver;

impl RackResolver for DefaultRackResolver {
    fn resolve(&self, _host: &str) -> Option<RackPath> {
        Some(RackPath::default_rack())
    }
}

/// Table-backed resolver with a mutable host → rack mapping.
#[derive(Debug, Default)]
pub struct StaticRackResolver {
    mappings: RwLock<HashMap<String, RackPath>>,
}

impl StaticRackResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the mapping for a host.
    pub fn add_mapping(&self, host: impl Into<String>, rack: RackPath) {
        self.mappings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(host.into(), rack);
    }

    /// Drop every mapping.
    pub fn clear(&self) {
        self.mappings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl RackResolver for StaticRackResolver {
    fn resolve(&self, host: &str) -> Option<RackPath> {
        self.mappings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(host)
            .cloned()
    }
}
