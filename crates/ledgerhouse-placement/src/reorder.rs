//! Read-sequence reordering.
//!
//! Given a write set (ordered indices into an ensemble), produce the order
//! in which a reader should try those nodes. Nodes in the reader's own
//! region come first, but one remote node is interleaved after the first
//! few locals so a wholly-unreachable local region does not serialize the
//! read behind several timeouts. Read-only nodes are tried after every
//! writable one, and nodes missing from the cluster entirely go last.
//!
//! The reordering is a pure function of the write set, the snapshot, and
//! the reader's region, and always returns a permutation of its input.

use crate::membership::{ClusterSnapshot, NodeState};
use ledgerhouse_core::{NodeId, DEFAULT_REGION};

/// Reorder a write set for reading.
///
/// `local_region` is the reader's region; readers in the default region
/// have no usable locality and get the write set back unchanged.
/// `remote_threshold` is the number of local nodes visited before the
/// first remote node is interleaved.
pub(crate) fn reorder_read_sequence(
    ensemble: &[NodeId],
    write_set: &[usize],
    snapshot: &ClusterSnapshot,
    local_region: &str,
    remote_threshold: usize,
) -> Vec<usize> {
    if local_region == DEFAULT_REGION {
        return write_set.to_vec();
    }

    let mut local = Vec::new();
    let mut remote = Vec::new();
    let mut read_only = Vec::new();
    let mut unavailable = Vec::new();

    for &index in write_set {
        let Some(node) = ensemble.get(index) else {
            unavailable.push(index);
            continue;
        };
        match snapshot.state_of(node) {
            NodeState::Writable => {
                let region = snapshot
                    .topology()
                    .region_of(node)
                    .unwrap_or(DEFAULT_REGION);
                if region == local_region {
                    local.push(index);
                } else {
                    remote.push(index);
                }
            }
            NodeState::ReadOnly => read_only.push(index),
            NodeState::Unknown => unavailable.push(index),
        }
    }

    let prefix = local.len().min(remote_threshold);
    let mut local = local.into_iter();
    let mut remote = remote.into_iter();

    let mut result = Vec::with_capacity(write_set.len());
    result.extend(local.by_ref().take(prefix));
    result.extend(remote.next());
    result.extend(local);
    result.extend(remote);
    result.extend(read_only);
    result.extend(unavailable);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::MembershipView;
    use crate::resolver::StaticRackResolver;
    use ledgerhouse_core::RackPath;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn node(i: u8) -> NodeId {
        NodeId::new(format!("10.0.0.{i}"), 3181)
    }

    /// Six-node ensemble: indices 0..3 in region1, 3..6 in region2.
    fn fixture() -> (Vec<NodeId>, MembershipView) {
        let resolver = StaticRackResolver::new();
        let mut ensemble = Vec::new();
        for i in 0..6u8 {
            let region = if i < 3 { "region1" } else { "region2" };
            resolver.add_mapping(
                node(i).host(),
                RackPath::parse(&format!("/{region}/r{i}")).unwrap(),
            );
            ensemble.push(node(i));
        }
        let view = MembershipView::new(Arc::new(resolver));
        view.on_cluster_changed(ensemble.iter().cloned().collect(), HashSet::new());
        (ensemble, view)
    }

    #[test]
    fn test_default_region_reader_gets_input_back() {
        let (ensemble, view) = fixture();
        let write_set = vec![0, 1, 2, 3, 4, 5];
        let result = reorder_read_sequence(
            &ensemble,
            &write_set,
            &view.snapshot(),
            DEFAULT_REGION,
            2,
        );
        assert_eq!(result, write_set);
    }

    #[test]
    fn test_remote_interleaved_after_threshold() {
        let (ensemble, view) = fixture();
        let write_set = vec![0, 1, 2, 3, 4, 5];
        let result =
            reorder_read_sequence(&ensemble, &write_set, &view.snapshot(), "region1", 2);
        // two locals, one remote, remaining local, remaining remotes
        assert_eq!(result, vec![0, 1, 3, 2, 4, 5]);
    }

    #[test]
    fn test_result_is_a_permutation() {
        let (ensemble, view) = fixture();
        let write_set = vec![5, 3, 1, 0, 2, 4];
        let mut result =
            reorder_read_sequence(&ensemble, &write_set, &view.snapshot(), "region2", 2);
        result.sort_unstable();
        let mut expected = write_set.clone();
        expected.sort_unstable();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_read_only_after_writable_and_unknown_last() {
        let (ensemble, view) = fixture();
        // node 0 becomes read-only, node 3 drops out entirely
        let writable: HashSet<NodeId> = ensemble
            .iter()
            .filter(|n| **n != node(0) && **n != node(3))
            .cloned()
            .collect();
        view.on_cluster_changed(writable, HashSet::from([node(0)]));

        let write_set = vec![0, 1, 2, 3, 4, 5];
        let result =
            reorder_read_sequence(&ensemble, &write_set, &view.snapshot(), "region1", 2);
        assert_eq!(result, vec![1, 2, 4, 5, 0, 3]);
    }

    #[test]
    fn test_out_of_range_index_goes_last() {
        let (ensemble, view) = fixture();
        let write_set = vec![0, 9];
        let result =
            reorder_read_sequence(&ensemble, &write_set, &view.snapshot(), "region1", 2);
        assert_eq!(result, vec![0, 9]);
    }
}
