//! Placement configuration.
//!
//! The policy is configured through a small set of `placement.*` options.
//! Host applications usually carry them in a flat string map alongside
//! their other settings; [`PlacementConfig::from_options`] parses that map,
//! and the struct itself derives serde so it can be embedded directly in a
//! structured configuration file instead.
//!
//! ## Recognized Options
//!
//! - `placement.regionsToWrite`: `;`/`,`-separated region labels to place
//!   into, in priority order (default: every known region)
//! - `placement.minRegionsForDurability`: regions every write quorum must
//!   span (default: 1)
//! - `placement.enableValidation`: reject ensembles that miss the
//!   durability coverage (default: true)
//! - `placement.dnsResolverClass`: identity of the rack resolver to use
//!   when none is injected (default: the built-in default resolver)
//! - `placement.remoteNodeReorderThreshold`: local nodes read before the
//!   first remote one in a reordered sequence (default: 2)
//! - `placement.localNode`: host identity used to derive caller locality
//!   (default: none, locality unknown)
//! - `placement.shuffleSeed`: seed for the tie-break shuffle (default: 0)

use crate::error::{PlacementError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Option key: ordered list of region labels to prefer for placement.
pub const REGIONS_TO_WRITE: &str = "placement.regionsToWrite";

/// Option key: minimum number of regions every write quorum must span.
pub const MIN_REGIONS_FOR_DURABILITY: &str = "placement.minRegionsForDurability";

/// Option key: whether ensembles failing durability coverage are rejected.
pub const ENABLE_VALIDATION: &str = "placement.enableValidation";

/// Option key: identity of the rack resolver when none is injected.
pub const DNS_RESOLVER_CLASS: &str = "placement.dnsResolverClass";

/// Option key: number of local nodes read before the first remote one.
pub const REMOTE_NODE_REORDER_THRESHOLD: &str = "placement.remoteNodeReorderThreshold";

/// Option key: host identity used to derive caller locality.
pub const LOCAL_NODE: &str = "placement.localNode";

/// Option key: seed for the deterministic tie-break shuffle.
pub const SHUFFLE_SEED: &str = "placement.shuffleSeed";

pub const DEFAULT_MIN_REGIONS_FOR_DURABILITY: usize = 1;
pub const DEFAULT_REMOTE_NODE_REORDER_THRESHOLD: usize = 2;

/// Configuration for the region-aware placement policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Regions to place into, highest priority first. `None` means every
    /// region currently known to the topology, in lexicographic order.
    pub regions_to_write: Option<Vec<String>>,

    /// Minimum number of distinct regions every write quorum must span.
    /// At 1, durability enforcement is effectively off.
    pub min_regions_for_durability: usize,

    /// Reject ensembles whose write quorums miss the durability coverage.
    pub enable_validation: bool,

    /// Identity of the rack resolver to construct when none is injected.
    pub dns_resolver_class: Option<String>,

    /// How many local-region nodes a reordered read sequence visits before
    /// the first remote node is interleaved.
    pub remote_node_reorder_threshold: usize,

    /// Host identity of the process using this policy. Resolved through
    /// the rack resolver to decide which region counts as "local" when
    /// reordering reads. Absent means locality is unknown and read
    /// sequences are returned unchanged.
    pub local_node: Option<String>,

    /// Seed for the tie-break shuffle. Identical inputs plus an identical
    /// seed yield identical selections.
    pub shuffle_seed: u64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            regions_to_write: None,
            min_regions_for_durability: DEFAULT_MIN_REGIONS_FOR_DURABILITY,
            enable_validation: true,
            dns_resolver_class: None,
            remote_node_reorder_threshold: DEFAULT_REMOTE_NODE_REORDER_THRESHOLD,
            local_node: None,
            shuffle_seed: 0,
        }
    }
}

impl PlacementConfig {
    /// Parse configuration from a flat string map.
    ///
    /// Unrecognized keys are ignored so the map can be shared with other
    /// subsystems. Malformed values fail with `InvalidConfiguration`.
    pub fn from_options(options: &HashMap<String, String>) -> Result<Self> {
        let mut config = Self::default();
        for (key, value) in options {
            match key.as_str() {
                REGIONS_TO_WRITE => {
                    config.regions_to_write = Some(
                        value
                            .split([';', ','])
                            .map(str::trim)
                            .filter(|region| !region.is_empty())
                            .map(str::to_string)
                            .collect(),
                    );
                }
                MIN_REGIONS_FOR_DURABILITY => {
                    config.min_regions_for_durability = parse_option(key, value)?;
                }
                ENABLE_VALIDATION => {
                    config.enable_validation = parse_option(key, value)?;
                }
                DNS_RESOLVER_CLASS => {
                    config.dns_resolver_class = Some(value.clone());
                }
                REMOTE_NODE_REORDER_THRESHOLD => {
                    config.remote_node_reorder_threshold = parse_option(key, value)?;
                }
                LOCAL_NODE => {
                    config.local_node = Some(value.clone());
                }
                SHUFFLE_SEED => {
                    config.shuffle_seed = parse_option(key, value)?;
                }
                _ => {}
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field rules.
    pub fn validate(&self) -> Result<()> {
        if self.min_regions_for_durability < 1 {
            return Err(PlacementError::InvalidConfiguration(
                "minimum regions for durability must be at least 1".to_string(),
            ));
        }
        if let Some(regions) = &self.regions_to_write {
            if regions.is_empty() && self.enable_validation {
                return Err(PlacementError::InvalidConfiguration(
                    "empty region list with validation enabled".to_string(),
                ));
            }
        }
        Ok(())
    }
}

fn parse_option<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        PlacementError::InvalidConfiguration(format!("bad value {value:?} for {key}"))
    })
}
