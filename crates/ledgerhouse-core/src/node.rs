//! Node identity.
//!
//! A storage node is identified by its network address: host plus port.
//! Two nodes with the same host but different ports are distinct (several
//! storage processes may share a machine).

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Network identity of a storage node.
///
/// Ordered lexicographically by host, then numerically by port, so that
/// sorted collections of nodes iterate in a stable, predictable order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    host: String,
    port: u16,
}

impl NodeId {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for NodeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| Error::InvalidAddress(s.to_string()))?;
        if host.is_empty() {
            return Err(Error::InvalidAddress(s.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| Error::InvalidAddress(s.to_string()))?;
        Ok(Self::new(host, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_roundtrip() {
        let node = NodeId::new("10.0.0.1", 3181);
        let parsed: NodeId = node.to_string().parse().unwrap();
        assert_eq!(node, parsed);
    }

    #[test]
    fn test_parse_rejects_missing_port() {
        assert!("10.0.0.1".parse::<NodeId>().is_err());
        assert!(":3181".parse::<NodeId>().is_err());
        assert!("10.0.0.1:notaport".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_ordering_is_host_then_port() {
        let a = NodeId::new("10.0.0.1", 3181);
        let b = NodeId::new("10.0.0.1", 3182);
        let c = NodeId::new("10.0.0.2", 3181);
        assert!(a < b);
        assert!(b < c);
    }
}
