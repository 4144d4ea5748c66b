//! Region-aware ensemble placement policy.
//!
//! The policy answers three questions for the ledger layer:
//!
//! 1. **Which nodes should hold a new ledger?** `new_ensemble` spreads the
//!    ensemble across regions (and racks within each region) so that every
//!    write quorum can span multiple failure domains.
//! 2. **Which node should stand in for a failed one?** `replace_bookie`
//!    finds a substitute that keeps the diversity the ensemble already has.
//! 3. **In what order should a reader try the replicas?** The reorder
//!    entry points move nearby, healthy nodes to the front.
//!
//! ## Placement Model
//!
//! Regions are allocated slots evenly, with the remainder going to
//! higher-priority regions (the configured write list, or lexicographic
//! order). Each region's slots are filled by its own [`RackAwareSelector`],
//! and the per-region picks are interleaved round-robin so consecutive
//! ensemble positions land in different regions.
//!
//! ## Durability
//!
//! With `min_regions_for_durability` above 1, placement refuses clusters
//! that cannot offer that many regions, validates (when enabled) that
//! every write quorum window spans enough of them, and keeps replacements
//! inside the failed node's region so the interleave is not perturbed.
//! Single-region clusters are always allowed; cross-region coverage is
//! unreachable there and is not demanded.
//!
//! ## Concurrency
//!
//! Every operation takes one membership snapshot up front and works
//! against it alone; concurrent cluster updates never affect an in-flight
//! selection. The policy itself holds no per-call state and is shareable
//! across threads.

use crate::config::PlacementConfig;
use crate::error::{PlacementError, Result};
use crate::membership::{ClusterSnapshot, MembershipView};
use crate::rack_selector::RackAwareSelector;
use crate::reorder;
use crate::reporter::{NoopReporter, PlacementReporter};
use crate::resolver::{DefaultRackResolver, RackResolver};
use ledgerhouse_core::{NodeId, RackPath, DEFAULT_REGION};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct RegionAwarePlacementPolicy {
    config: PlacementConfig,
    membership: MembershipView,
    reporter: Arc<dyn PlacementReporter>,
    local_rack: RackPath,
}

impl RegionAwarePlacementPolicy {
    /// Build a policy from configuration plus its injected capabilities.
    ///
    /// When no resolver is given, the built-in default resolver is used
    /// and every node lands in the default region. When no reporter is
    /// given, telemetry is discarded.
    pub fn initialize(
        config: PlacementConfig,
        resolver: Option<Arc<dyn RackResolver>>,
        reporter: Option<Arc<dyn PlacementReporter>>,
    ) -> Result<Self> {
        config.validate()?;
        let resolver = resolver.unwrap_or_else(|| {
            if let Some(class) = &config.dns_resolver_class {
                if class != "default" {
                    warn!(
                        resolver = class.as_str(),
                        "Unrecognized resolver identity, using default resolver"
                    );
                }
            }
            Arc::new(DefaultRackResolver)
        });
        let reporter = reporter.unwrap_or_else(|| Arc::new(NoopReporter));
        let membership = MembershipView::new(resolver);
        let local_rack = match &config.local_node {
            Some(host) => membership.resolve(host),
            None => RackPath::default_rack(),
        };

        info!(local_rack = %local_rack, "Region-aware placement policy initialized");
        Ok(Self {
            config,
            membership,
            reporter,
            local_rack,
        })
    }

    /// Release membership state and resolution caches.
    pub fn uninitialize(&self) {
        self.membership.clear();
        info!("Region-aware placement policy uninitialized");
    }

    /// Region this process reads from, derived from the configured local
    /// node at initialization.
    pub fn local_region(&self) -> &str {
        self.local_rack.region()
    }

    /// Replace the writable and read-only membership sets. See
    /// [`MembershipView::on_cluster_changed`].
    pub fn on_cluster_changed(&self, writable: HashSet<NodeId>, read_only: HashSet<NodeId>) {
        self.membership.on_cluster_changed(writable, read_only);
    }

    pub fn is_writable(&self, node: &NodeId) -> bool {
        self.membership.is_writable(node)
    }

    pub fn is_read_only(&self, node: &NodeId) -> bool {
        self.membership.is_read_only(node)
    }

    /// Region of a known node. Errors with `UnknownNode` for addresses
    /// that have never appeared in a cluster update.
    pub fn region_of(&self, node: &NodeId) -> Result<String> {
        self.membership
            .snapshot()
            .topology()
            .region_of(node)
            .map(str::to_string)
            .ok_or_else(|| PlacementError::UnknownNode(node.clone()))
    }

    /// Choose an ensemble of `ensemble_size` distinct writable nodes.
    pub fn new_ensemble(
        &self,
        ensemble_size: usize,
        write_quorum_size: usize,
        ack_quorum_size: usize,
        excluded: &HashSet<NodeId>,
    ) -> Result<Vec<NodeId>> {
        check_quorum_shape(ensemble_size, write_quorum_size, ack_quorum_size)?;
        let snapshot = self.membership.snapshot();
        let result = self.new_ensemble_inner(&snapshot, ensemble_size, write_quorum_size, excluded);
        match &result {
            Ok(ensemble) => {
                self.reporter.ensemble_created(ensemble.len());
                debug!(size = ensemble.len(), "Placed new ensemble");
            }
            Err(error) => {
                self.reporter.placement_failed();
                warn!(size = ensemble_size, error = %error, "Ensemble placement failed");
            }
        }
        result
    }

    fn new_ensemble_inner(
        &self,
        snapshot: &ClusterSnapshot,
        ensemble_size: usize,
        write_quorum_size: usize,
        excluded: &HashSet<NodeId>,
    ) -> Result<Vec<NodeId>> {
        let regions = self.candidate_regions(snapshot, excluded);
        if regions.is_empty() {
            return Err(PlacementError::NotEnoughBookies(
                "no regions with available bookies".to_string(),
            ));
        }

        let available: usize = regions.iter().map(|(_, capacity)| capacity).sum();
        if available < ensemble_size {
            return Err(PlacementError::NotEnoughBookies(format!(
                "{available} candidates for an ensemble of {ensemble_size}"
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.config.shuffle_seed);

        if regions.len() == 1 {
            // One region: rack diversity is all that can be offered, and
            // cross-region coverage is unreachable, so it is not demanded.
            let region = regions[0].0.as_str();
            let selector = RackAwareSelector::new(region);
            return selector.pick(
                snapshot,
                ensemble_size,
                excluded,
                self.preferred_rack_in(region),
                &mut rng,
            );
        }

        if regions.len() < self.config.min_regions_for_durability {
            return Err(PlacementError::NotEnoughBookies(format!(
                "{} regions available, {} required for durability",
                regions.len(),
                self.config.min_regions_for_durability
            )));
        }

        let allocation = allocate_slots(&regions, ensemble_size)?;

        let mut taken = excluded.clone();
        let mut per_region: Vec<VecDeque<NodeId>> = Vec::with_capacity(regions.len());
        for ((region, _), want) in regions.iter().zip(&allocation) {
            if *want == 0 {
                per_region.push(VecDeque::new());
                continue;
            }
            let selector = RackAwareSelector::new(region.clone());
            let picked = selector.pick(
                snapshot,
                *want,
                &taken,
                self.preferred_rack_in(region),
                &mut rng,
            )?;
            taken.extend(picked.iter().cloned());
            per_region.push(picked.into());
        }

        // interleave so consecutive positions land in different regions
        let mut ensemble = Vec::with_capacity(ensemble_size);
        while ensemble.len() < ensemble_size {
            for queue in per_region.iter_mut() {
                if ensemble.len() == ensemble_size {
                    break;
                }
                if let Some(node) = queue.pop_front() {
                    ensemble.push(node);
                }
            }
        }

        if self.config.enable_validation {
            self.validate_quorum_coverage(snapshot, &ensemble, write_quorum_size)?;
        }
        Ok(ensemble)
    }

    /// Choose a substitute for `victim` in an existing ensemble.
    ///
    /// Preference order: the victim's own rack, another rack in its
    /// region, and (only while durability enforcement is off) another
    /// region. The substitute is never a current ensemble member, never
    /// excluded, and never the victim itself.
    pub fn replace_bookie(
        &self,
        ensemble_size: usize,
        write_quorum_size: usize,
        ack_quorum_size: usize,
        current_ensemble: &[NodeId],
        victim: &NodeId,
        excluded: &HashSet<NodeId>,
    ) -> Result<NodeId> {
        check_quorum_shape(ensemble_size, write_quorum_size, ack_quorum_size)?;
        let snapshot = self.membership.snapshot();
        let result = self.replace_bookie_inner(&snapshot, current_ensemble, victim, excluded);
        match &result {
            Ok(replacement) => {
                self.reporter.bookie_replaced();
                info!(victim = %victim, replacement = %replacement, "Replaced bookie");
            }
            Err(error) => {
                self.reporter.placement_failed();
                warn!(victim = %victim, error = %error, "Bookie replacement failed");
            }
        }
        result
    }

    fn replace_bookie_inner(
        &self,
        snapshot: &ClusterSnapshot,
        current_ensemble: &[NodeId],
        victim: &NodeId,
        excluded: &HashSet<NodeId>,
    ) -> Result<NodeId> {
        let mut taken = excluded.clone();
        taken.extend(current_ensemble.iter().cloned());
        taken.insert(victim.clone());

        let victim_rack = snapshot
            .topology()
            .rack_of(victim)
            .cloned()
            .unwrap_or_else(RackPath::default_rack);
        let victim_region = victim_rack.region().to_string();

        let mut rng = StdRng::seed_from_u64(self.config.shuffle_seed);

        let selector = RackAwareSelector::new(victim_region.clone());
        if let Ok(mut picked) = selector.pick(snapshot, 1, &taken, Some(&victim_rack), &mut rng) {
            return Ok(picked.remove(0));
        }

        // Swapping a slot between regions thins the victim's region in
        // every write quorum that contained it; with enforcement on, the
        // replacement must come from the same region or not at all.
        if self.config.min_regions_for_durability > 1 {
            return Err(PlacementError::NotEnoughBookies(format!(
                "no replacement available in region {victim_region}"
            )));
        }

        for (region, _) in self.candidate_regions(snapshot, &taken) {
            if region == victim_region {
                continue;
            }
            let selector = RackAwareSelector::new(region);
            if let Ok(mut picked) = selector.pick(snapshot, 1, &taken, None, &mut rng) {
                return Ok(picked.remove(0));
            }
        }
        Err(PlacementError::NotEnoughBookies(format!(
            "no replacement available for {victim}"
        )))
    }

    /// Reorder a write set so the reader tries nearby, healthy nodes
    /// first. See the crate-level documentation for the exact shape.
    pub fn reorder_read_sequence(&self, ensemble: &[NodeId], write_set: &[usize]) -> Vec<usize> {
        let snapshot = self.membership.snapshot();
        let reordered = reorder::reorder_read_sequence(
            ensemble,
            write_set,
            &snapshot,
            self.local_region(),
            self.config.remote_node_reorder_threshold,
        );
        self.reporter.read_reordered();
        reordered
    }

    /// Reorder a write set for reading the last-add-confirmed entry.
    ///
    /// LAC reads benefit from exactly the same locality ordering as entry
    /// reads, so this is intentionally identical to
    /// [`reorder_read_sequence`].
    pub fn reorder_read_lac_sequence(
        &self,
        ensemble: &[NodeId],
        write_set: &[usize],
    ) -> Vec<usize> {
        self.reorder_read_sequence(ensemble, write_set)
    }

    /// Regions eligible for placement, in priority order, with the number
    /// of writable non-excluded candidates each can contribute. Regions
    /// with nothing to offer are dropped.
    fn candidate_regions(
        &self,
        snapshot: &ClusterSnapshot,
        excluded: &HashSet<NodeId>,
    ) -> Vec<(String, usize)> {
        let mut capacity: BTreeMap<&str, usize> = BTreeMap::new();
        for node in snapshot.writable() {
            if excluded.contains(node) {
                continue;
            }
            if let Some(region) = snapshot.topology().region_of(node) {
                *capacity.entry(region).or_insert(0) += 1;
            }
        }
        match &self.config.regions_to_write {
            Some(priority) => priority
                .iter()
                .filter_map(|region| {
                    capacity
                        .get(region.as_str())
                        .map(|&count| (region.clone(), count))
                })
                .collect(),
            None => capacity
                .into_iter()
                .map(|(region, count)| (region.to_string(), count))
                .collect(),
        }
    }

    fn preferred_rack_in(&self, region: &str) -> Option<&RackPath> {
        (self.local_rack.region() == region).then_some(&self.local_rack)
    }

    fn validate_quorum_coverage(
        &self,
        snapshot: &ClusterSnapshot,
        ensemble: &[NodeId],
        write_quorum_size: usize,
    ) -> Result<()> {
        let required = self.config.min_regions_for_durability;
        if required <= 1 {
            return Ok(());
        }
        for start in 0..ensemble.len() {
            let mut regions: HashSet<&str> = HashSet::new();
            for offset in 0..write_quorum_size {
                let node = &ensemble[(start + offset) % ensemble.len()];
                regions.insert(
                    snapshot
                        .topology()
                        .region_of(node)
                        .unwrap_or(DEFAULT_REGION),
                );
            }
            if regions.len() < required {
                return Err(PlacementError::NotEnoughBookies(format!(
                    "write set at {start} covers {} regions, {required} required",
                    regions.len()
                )));
            }
        }
        Ok(())
    }
}

fn check_quorum_shape(
    ensemble_size: usize,
    write_quorum_size: usize,
    ack_quorum_size: usize,
) -> Result<()> {
    if ensemble_size == 0 || write_quorum_size == 0 || ack_quorum_size == 0 {
        return Err(PlacementError::InvalidConfiguration(
            "ensemble, write quorum, and ack quorum sizes must be positive".to_string(),
        ));
    }
    if write_quorum_size > ensemble_size {
        return Err(PlacementError::InvalidConfiguration(format!(
            "write quorum {write_quorum_size} exceeds ensemble size {ensemble_size}"
        )));
    }
    if ack_quorum_size > write_quorum_size {
        return Err(PlacementError::InvalidConfiguration(format!(
            "ack quorum {ack_quorum_size} exceeds write quorum {write_quorum_size}"
        )));
    }
    Ok(())
}

/// Split `total` slots across regions: an even share each, remainder to
/// the front of the priority order, allocations capped by what each
/// region can actually contribute and the shortfall spilled to regions
/// with spare capacity.
fn allocate_slots(regions: &[(String, usize)], total: usize) -> Result<Vec<usize>> {
    let count = regions.len();
    let base = total / count;
    let remainder = total % count;
    let mut allocation: Vec<usize> = (0..count)
        .map(|index| base + usize::from(index < remainder))
        .collect();

    let mut deficit = 0;
    for (index, (_, capacity)) in regions.iter().enumerate() {
        if allocation[index] > *capacity {
            deficit += allocation[index] - capacity;
            allocation[index] = *capacity;
        }
    }
    while deficit > 0 {
        let mut moved = false;
        for (index, (_, capacity)) in regions.iter().enumerate() {
            if deficit == 0 {
                break;
            }
            if allocation[index] < *capacity {
                allocation[index] += 1;
                deficit -= 1;
                moved = true;
            }
        }
        if !moved {
            return Err(PlacementError::NotEnoughBookies(
                "insufficient capacity across regions".to_string(),
            ));
        }
    }
    Ok(allocation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quorum_shape_checks() {
        assert!(check_quorum_shape(3, 2, 2).is_ok());
        assert!(matches!(
            check_quorum_shape(3, 4, 2),
            Err(PlacementError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            check_quorum_shape(3, 2, 3),
            Err(PlacementError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            check_quorum_shape(0, 0, 0),
            Err(PlacementError::InvalidConfiguration(_))
        ));
    }

    fn regions(layout: &[(&str, usize)]) -> Vec<(String, usize)> {
        layout.iter()
            .map(|(region, capacity)| (region.to_string(), *capacity))
            .collect()
    }

    #[test]
    fn test_allocation_splits_evenly_with_remainder_to_front() {
        let allocation =
            allocate_slots(&regions(&[("r1", 5), ("r2", 5), ("r3", 5)]), 7).unwrap();
        assert_eq!(allocation, vec![3, 2, 2]);
    }

    #[test]
    fn test_allocation_spills_past_capacity() {
        let allocation =
            allocate_slots(&regions(&[("r1", 4), ("r2", 4), ("r3", 2)]), 9).unwrap();
        assert_eq!(allocation, vec![4, 3, 2]);
    }

    #[test]
    fn test_allocation_fails_when_capacity_short() {
        let result = allocate_slots(&regions(&[("r1", 1), ("r2", 1)]), 3);
        assert!(matches!(result, Err(PlacementError::NotEnoughBookies(_))));
    }
}
