//! Rack-aware node selection within a single region.
//!
//! ## Selection Algorithm
//!
//! 1. Group the region's writable, non-excluded nodes by rack
//! 2. Visit racks in a shuffled order (the preferred rack, when given and
//!    populated, is always visited first) taking one node per rack, so the
//!    first picks cover as many distinct racks as possible
//! 3. Once every rack has contributed, keep cycling the racks round-robin
//!    for the remaining picks
//!
//! The shuffle is driven by the caller's seeded RNG and the underlying
//! collections iterate in address order, so the same snapshot, exclusions,
//! and seed always produce the same selection.

use crate::error::{PlacementError, Result};
use crate::membership::ClusterSnapshot;
use ledgerhouse_core::{NodeId, RackPath};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::{HashSet, VecDeque};
use tracing::debug;

/// Picks nodes from one region, spreading them across its racks.
pub struct RackAwareSelector {
    region: String,
}

impl RackAwareSelector {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Pick `count` distinct writable nodes from this region.
    ///
    /// `excluded` nodes are never picked. When `preferred_rack` is given
    /// and still has candidates, the first pick comes from it.
    pub fn pick(
        &self,
        snapshot: &ClusterSnapshot,
        count: usize,
        excluded: &HashSet<NodeId>,
        preferred_rack: Option<&RackPath>,
        rng: &mut StdRng,
    ) -> Result<Vec<NodeId>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let topology = snapshot.topology();
        let mut racks: Vec<(&RackPath, Vec<&NodeId>)> = Vec::new();
        let mut available = 0;
        for rack in topology.racks_in_region(&self.region) {
            let members: Vec<&NodeId> = topology
                .nodes_in_rack(rack)
                .filter(|node| snapshot.is_writable(node) && !excluded.contains(*node))
                .collect();
            if !members.is_empty() {
                available += members.len();
                racks.push((rack, members));
            }
        }

        if available < count {
            return Err(PlacementError::NotEnoughBookies(format!(
                "region {} has {} candidates, {} needed",
                self.region, available, count
            )));
        }

        racks.shuffle(rng);
        if let Some(preferred) = preferred_rack {
            if let Some(position) = racks.iter().position(|(rack, _)| *rack == preferred) {
                let preferred_entry = racks.remove(position);
                racks.insert(0, preferred_entry);
            }
        }

        let mut queues: Vec<VecDeque<&NodeId>> = racks
            .into_iter()
            .map(|(_, mut members)| {
                members.shuffle(rng);
                members.into()
            })
            .collect();

        let mut picked: Vec<NodeId> = Vec::with_capacity(count);
        while picked.len() < count {
            for queue in queues.iter_mut() {
                if picked.len() == count {
                    break;
                }
                if let Some(node) = queue.pop_front() {
                    picked.push((*node).clone());
                }
            }
        }

        debug!(
            region = %self.region,
            count = picked.len(),
            "Picked nodes across racks"
        );
        Ok(picked)
    }
}
