//! LedgerHouse Placement - Region- and Rack-Aware Ensemble Placement
//!
//! This crate decides where ledger data lives. Given the cluster's
//! membership and locality topology, it answers three questions for the
//! storage layer:
//!
//! - which nodes form the write ensemble for a new ledger,
//! - which node replaces a failed ensemble member, and
//! - in what order a reader should try the replicas of an entry.
//!
//! It is a synchronous, in-memory library: no I/O, no background tasks,
//! no durable state. The cluster-membership source pushes updates in via
//! [`RegionAwarePlacementPolicy::on_cluster_changed`]; locality comes from
//! an injected [`RackResolver`]; selections read an immutable snapshot and
//! are safe to run from many threads at once.
//!
//! ## Components
//!
//! - **RegionAwarePlacementPolicy**: the public entry point
//! - **MembershipView / ClusterSnapshot**: writable and read-only sets
//!   plus the topology, published atomically
//! - **NetworkTopology**: node → rack → region reverse indices
//! - **RackAwareSelector**: rack-diverse picks within one region
//! - **RackResolver**: injected host → rack mapping
//! - **PlacementReporter**: injected telemetry sink
//!
//! ## Example Usage
//!
//! ```rust
//! use ledgerhouse_core::{NodeId, RackPath};
//! use ledgerhouse_placement::{
//!     PlacementConfig, RegionAwarePlacementPolicy, StaticRackResolver,
//! };
//! use std::collections::HashSet;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = Arc::new(StaticRackResolver::new());
//! resolver.add_mapping("10.0.0.1", RackPath::parse("/region1/rack1")?);
//! resolver.add_mapping("10.0.0.2", RackPath::parse("/region2/rack1")?);
//!
//! let policy = RegionAwarePlacementPolicy::initialize(
//!     PlacementConfig::default(),
//!     Some(resolver),
//!     None,
//! )?;
//!
//! let nodes: HashSet<NodeId> =
//!     [NodeId::new("10.0.0.1", 3181), NodeId::new("10.0.0.2", 3181)]
//!         .into_iter()
//!         .collect();
//! policy.on_cluster_changed(nodes, HashSet::new());
//!
//! let ensemble = policy.new_ensemble(2, 2, 1, &HashSet::new())?;
//! assert_eq!(ensemble.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod membership;
pub mod policy;
pub mod rack_selector;
mod reorder;
pub mod reporter;
pub mod resolver;
pub mod topology;

pub use config::PlacementConfig;
pub use error::{PlacementError, Result};
pub use membership::{ClusterSnapshot, MembershipView, NodeState};
pub use policy::RegionAwarePlacementPolicy;
pub use rack_selector::RackAwareSelector;
pub use reporter::{NoopReporter, PlacementReporter};
pub use resolver::{DefaultRackResolver, RackResolver, StaticRackResolver};
pub use topology::NetworkTopology;
