//! Error types for LedgerHouse core types.
//!
//! Parsing is the only fallible operation at this layer. All functions
//! return `Result<T>` which is aliased to `Result<T, Error>`, allowing
//! `?` propagation into the richer error types of the crates above.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A node address string did not parse as `host:port`.
    #[error("invalid node address: {0}")]
    InvalidAddress(String),

    /// A rack path string did not parse as `/region/rack`.
    #[error("invalid rack path: {0}")]
    InvalidRackPath(String),
}

pub type Result<T> = std::result::Result<T, Error>;
