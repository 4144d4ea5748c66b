//! Cluster membership view.
//!
//! Tracks which nodes are writable and which are read-only, and keeps the
//! topology index in step with the union of both sets. Updates come in
//! through [`MembershipView::on_cluster_changed`]; selection calls take an
//! immutable [`ClusterSnapshot`] once at the start and use it throughout,
//! so a concurrent membership change never affects an in-flight selection.
//!
//! ## Writer Discipline
//!
//! Mutation is serialized by a single write lock. The snapshot behind the
//! lock is an `Arc`: readers clone the handle and drop the lock
//! immediately, writers build a fresh snapshot and swap it in.

use crate::resolver::RackResolver;
use crate::topology::NetworkTopology;
use ledgerhouse_core::{NodeId, RackPath};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info};

/// Liveness state of a node as of one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Writable,
    ReadOnly,
    /// Not present in either membership set.
    Unknown,
}

/// Immutable view of cluster membership plus topology.
///
/// Owned by a single selection call; created on demand and discarded when
/// the call returns.
#[derive(Debug, Clone, Default)]
pub struct ClusterSnapshot {
    writable: BTreeSet<NodeId>,
    read_only: BTreeSet<NodeId>,
    topology: NetworkTopology,
}

impl ClusterSnapshot {
    pub fn writable(&self) -> &BTreeSet<NodeId> {
        &self.writable
    }

    pub fn read_only(&self) -> &BTreeSet<NodeId> {
        &self.read_only
    }

    pub fn topology(&self) -> &NetworkTopology {
        &self.topology
    }

    pub fn is_writable(&self, node: &NodeId) -> bool {
        self.writable.contains(node)
    }

    pub fn is_read_only(&self, node: &NodeId) -> bool {
        self.read_only.contains(node)
    }

    pub fn state_of(&self, node: &NodeId) -> NodeState {
        if self.writable.contains(node) {
            NodeState::Writable
        } else if self.read_only.contains(node) {
            NodeState::ReadOnly
        } else {
            NodeState::Unknown
        }
    }
}

/// Shared membership state with single-writer updates.
pub struct MembershipView {
    resolver: Arc<dyn RackResolver>,
    state: RwLock<Arc<ClusterSnapshot>>,
    resolve_cache: Mutex<HashMap<String, RackPath>>,
}

impl MembershipView {
    pub fn new(resolver: Arc<dyn RackResolver>) -> Self {
        Self {
            resolver,
            state: RwLock::new(Arc::new(ClusterSnapshot::default())),
            resolve_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Current snapshot. Cheap: clones an `Arc` under a read lock.
    pub fn snapshot(&self) -> Arc<ClusterSnapshot> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_writable(&self, node: &NodeId) -> bool {
        self.snapshot().is_writable(node)
    }

    pub fn is_read_only(&self, node: &NodeId) -> bool {
        self.snapshot().is_read_only(node)
    }

    /// Resolve a host to its rack, caching the answer. Hosts the resolver
    /// does not know land in the default rack; resolution never fails.
    pub fn resolve(&self, host: &str) -> RackPath {
        let mut cache = self
            .resolve_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(rack) = cache.get(host) {
            return rack.clone();
        }
        let rack = match self.resolver.resolve(host) {
            Some(rack) => rack,
            None => {
                debug!(host = host, "Host not resolved, using default rack");
                RackPath::default_rack()
            }
        };
        cache.insert(host.to_string(), rack.clone());
        rack
    }

    /// Replace the writable and read-only sets atomically.
    ///
    /// Nodes new to the union are resolved and added to the topology;
    /// nodes that left the union are removed. A node present in both input
    /// sets is treated as read-only.
    pub fn on_cluster_changed(&self, writable: HashSet<NodeId>, read_only: HashSet<NodeId>) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);

        let writable: BTreeSet<NodeId> = writable
            .into_iter()
            .filter(|node| !read_only.contains(node))
            .collect();
        let read_only: BTreeSet<NodeId> = read_only.into_iter().collect();

        let mut topology = guard.topology.clone();
        let departed: Vec<NodeId> = topology
            .nodes()
            .map(|(node, _)| node.clone())
            .filter(|node| !writable.contains(node) && !read_only.contains(node))
            .collect();
        for node in &departed {
            topology.remove_node(node);
        }
        for node in writable.iter().chain(read_only.iter()) {
            if !topology.contains(node) {
                let rack = self.resolve(node.host());
                topology.add_node(node.clone(), rack);
            }
        }

        info!(
            writable = writable.len(),
            read_only = read_only.len(),
            departed = departed.len(),
            "Cluster membership changed"
        );

        *guard = Arc::new(ClusterSnapshot {
            writable,
            read_only,
            topology,
        });
    }

    /// Drop all membership state and cached resolutions.
    pub fn clear(&self) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) =
            Arc::new(ClusterSnapshot::default());
        self.resolve_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::StaticRackResolver;
    use ledgerhouse_core::DEFAULT_REGION;

    fn node(i: u8) -> NodeId {
        NodeId::new(format!("10.0.0.{i}"), 3181)
    }

    fn view_with_racks(racks: &[(u8, &str)]) -> MembershipView {
        let resolver = StaticRackResolver::new();
        for (i, rack) in racks {
            resolver.add_mapping(node(*i).host(), RackPath::parse(rack).unwrap());
        }
        MembershipView::new(Arc::new(resolver))
    }

    #[test]
    fn test_cluster_change_populates_topology() {
        let view = view_with_racks(&[(1, "/region1/r1"), (2, "/region2/r2")]);
        view.on_cluster_changed(
            HashSet::from([node(1), node(2)]),
            HashSet::new(),
        );

        let snapshot = view.snapshot();
        assert!(snapshot.is_writable(&node(1)));
        assert_eq!(snapshot.topology().region_of(&node(2)), Some("region2"));
    }

    #[test]
    fn test_read_only_wins_on_overlap() {
        let view = view_with_racks(&[(1, "/region1/r1")]);
        view.on_cluster_changed(
            HashSet::from([node(1)]),
            HashSet::from([node(1)]),
        );

        let snapshot = view.snapshot();
        assert!(!snapshot.is_writable(&node(1)));
        assert!(snapshot.is_read_only(&node(1)));
        assert_eq!(snapshot.state_of(&node(1)), NodeState::ReadOnly);
    }

    #[test]
    fn test_departed_nodes_leave_topology() {
        let view = view_with_racks(&[(1, "/region1/r1"), (2, "/region1/r2")]);
        view.on_cluster_changed(
            HashSet::from([node(1), node(2)]),
            HashSet::new(),
        );
        view.on_cluster_changed(HashSet::from([node(2)]), HashSet::new());

        let snapshot = view.snapshot();
        assert_eq!(snapshot.state_of(&node(1)), NodeState::Unknown);
        assert!(!snapshot.topology().contains(&node(1)));
        assert!(snapshot.topology().contains(&node(2)));
    }

    #[test]
    fn test_unresolvable_hosts_land_in_default_region() {
        let view = view_with_racks(&[]);
        view.on_cluster_changed(HashSet::from([node(9)]), HashSet::new());

        let snapshot = view.snapshot();
        assert_eq!(
            snapshot.topology().region_of(&node(9)),
            Some(DEFAULT_REGION)
        );
    }

    #[test]
    fn test_snapshots_are_isolated_from_later_updates() {
        let view = view_with_racks(&[(1, "/region1/r1")]);
        view.on_cluster_changed(HashSet::from([node(1)]), HashSet::new());

        let before = view.snapshot();
        view.on_cluster_changed(HashSet::new(), HashSet::new());

        assert!(before.is_writable(&node(1)));
        assert!(!view.snapshot().is_writable(&node(1)));
    }

    #[test]
    fn test_clear_releases_state() {
        let view = view_with_racks(&[(1, "/region1/r1")]);
        view.on_cluster_changed(HashSet::from([node(1)]), HashSet::new());
        view.clear();

        let snapshot = view.snapshot();
        assert!(snapshot.writable().is_empty());
        assert!(snapshot.topology().is_empty());
    }
}
