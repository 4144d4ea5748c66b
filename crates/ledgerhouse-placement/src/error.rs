//! Error types for placement operations.
//!
//! ## Error Categories
//!
//! ### Placement Errors
//! - `NotEnoughBookies`: the cluster cannot satisfy the requested size,
//!   diversity, or exclusion constraints
//!
//! ### Configuration Errors
//! - `InvalidConfiguration`: malformed option values or impossible quorum
//!   shapes (write quorum larger than the ensemble, ack quorum larger than
//!   the write quorum, zero sizes)
//!
//! ### Inspection Errors
//! - `UnknownNode`: an inspection helper was asked about an address that
//!   has never been part of the cluster. Selection paths never raise this;
//!   they treat unknown nodes as members of the default region.
//!
//! ## Usage
//!
//! All placement operations return `Result<T>` which is aliased to
//! `Result<T, PlacementError>`.

use ledgerhouse_core::NodeId;
use thiserror::Error;

/// Convenience type alias for `Result<T, PlacementError>`.
pub type Result<T> = std::result::Result<T, PlacementError>;

#[derive(Debug, Error)]
pub enum PlacementError {
    /// The cluster cannot satisfy the size/diversity/exclusion constraints.
    ///
    /// This is the only error a well-configured caller should ever see from
    /// a selection call: either a well-formed ensemble comes back, or this.
    #[error("not enough bookies: {0}")]
    NotEnoughBookies(String),

    /// An option value or quorum shape is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The address has never been observed in any cluster update.
    #[error("unknown node: {0}")]
    UnknownNode(NodeId),
}
