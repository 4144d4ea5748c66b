//! Network topology index.
//!
//! Maintains the reverse indices between nodes, racks, and regions:
//! node → rack, rack → nodes, region → racks. The index is a plain value
//! type; the membership view clones it, applies a diff, and publishes the
//! result as part of an immutable snapshot.
//!
//! All collections are BTree-based, so iteration order is lexicographic
//! and selections that walk the index are reproducible.

use ledgerhouse_core::{NodeId, RackPath};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct NetworkTopology {
    nodes: BTreeMap<NodeId, RackPath>,
    racks: BTreeMap<RackPath, BTreeSet<NodeId>>,
    regions: BTreeMap<String, BTreeSet<RackPath>>,
}

impl NetworkTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node under a rack. Idempotent; a node re-added under a
    /// different rack is moved, and its region derivation moves with it.
    pub fn add_node(&mut self, node: NodeId, rack: RackPath) {
        if let Some(existing) = self.nodes.get(&node) {
            if *existing == rack {
                return;
            }
            self.remove_node(&node);
        }
        debug!(node = %node, rack = %rack, "Adding node to topology");
        self.racks.entry(rack.clone()).or_default().insert(node.clone());
        self.regions
            .entry(rack.region().to_string())
            .or_default()
            .insert(rack.clone());
        self.nodes.insert(node, rack);
    }

    /// Remove a node, pruning its rack and region once empty. Idempotent.
    pub fn remove_node(&mut self, node: &NodeId) {
        let Some(rack) = self.nodes.remove(node) else {
            return;
        };
        debug!(node = %node, rack = %rack, "Removing node from topology");
        let rack_emptied = match self.racks.get_mut(&rack) {
            Some(members) => {
                members.remove(node);
                members.is_empty()
            }
            None => false,
        };
        if rack_emptied {
            self.racks.remove(&rack);
            let region = rack.region().to_string();
            let region_emptied = match self.regions.get_mut(&region) {
                Some(region_racks) => {
                    region_racks.remove(&rack);
                    region_racks.is_empty()
                }
                None => false,
            };
            if region_emptied {
                self.regions.remove(&region);
            }
        }
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        self.nodes.contains_key(node)
    }

    pub fn rack_of(&self, node: &NodeId) -> Option<&RackPath> {
        self.nodes.get(node)
    }

    pub fn region_of(&self, node: &NodeId) -> Option<&str> {
        self.nodes.get(node).map(RackPath::region)
    }

    /// Nodes registered under a rack, in address order.
    pub fn nodes_in_rack<'a>(&'a self, rack: &RackPath) -> impl Iterator<Item = &'a NodeId> {
        self.racks.get(rack).into_iter().flatten()
    }

    /// Racks registered under a region, in path order.
    pub fn racks_in_region<'a>(&'a self, region: &str) -> impl Iterator<Item = &'a RackPath> {
        self.regions.get(region).into_iter().flatten()
    }

    /// Known regions, in lexicographic order.
    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    /// Every known node with its rack, in address order.
    pub fn nodes(&self) -> impl Iterator<Item = (&NodeId, &RackPath)> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
