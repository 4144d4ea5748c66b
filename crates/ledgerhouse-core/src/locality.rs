//! Locality paths.
//!
//! Every storage node lives in exactly one rack, and every rack lives in
//! exactly one region. Both are encoded in a single slash-separated path:
//!
//! ```text
//! /region1/rack2
//!  ^^^^^^^ ^^^^^
//!  region  rack within the region
//! ```
//!
//! A path may also name a region alone (`/region1`), which is how caller
//! locality is often expressed: the reader knows which datacenter it is in
//! but not which rack. Nodes whose locality cannot be resolved are placed
//! in [`DEFAULT_RACK`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Region label used for nodes with unknown or unresolvable locality.
pub const DEFAULT_REGION: &str = "default-region";

/// Rack path used for nodes with unknown or unresolvable locality.
pub const DEFAULT_RACK: &str = "/default-region/default-rack";

/// A normalized locality path: `/region/rack` or `/region`.
///
/// Ordered lexicographically on the path string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RackPath(String);

impl RackPath {
    /// Parse and normalize a rack path.
    ///
    /// The path must start with `/` and contain at least one non-empty
    /// segment; a trailing slash is dropped.
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.strip_suffix('/').unwrap_or(s);
        let body = trimmed
            .strip_prefix('/')
            .ok_or_else(|| Error::InvalidRackPath(s.to_string()))?;
        if body.is_empty() || body.split('/').any(|segment| segment.is_empty()) {
            return Err(Error::InvalidRackPath(s.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The rack used for nodes whose locality is unknown.
    pub fn default_rack() -> Self {
        Self(DEFAULT_RACK.to_string())
    }

    /// First segment of the path: the region this rack belongs to.
    pub fn region(&self) -> &str {
        self.0[1..].split('/').next().unwrap_or(DEFAULT_REGION)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RackPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RackPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RackPath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<RackPath> for String {
    fn from(path: RackPath) -> Self {
        path.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_is_first_segment() {
        let rack = RackPath::parse("/region1/rack2").unwrap();
        assert_eq!(rack.region(), "region1");
        assert_eq!(rack.as_str(), "/region1/rack2");
    }

    #[test]
    fn test_region_only_path() {
        let rack = RackPath::parse("/region2").unwrap();
        assert_eq!(rack.region(), "region2");
    }

    #[test]
    fn test_trailing_slash_is_normalized() {
        let rack = RackPath::parse("/region1/rack2/").unwrap();
        assert_eq!(rack.as_str(), "/region1/rack2");
    }

    #[test]
    fn test_default_rack_region() {
        assert_eq!(RackPath::default_rack().region(), DEFAULT_REGION);
    }

    #[test]
    fn test_rejects_malformed_paths() {
        for bad in ["", "/", "region1/rack2", "/region1//rack2"] {
            assert!(RackPath::parse(bad).is_err(), "should reject {bad:?}");
        }
    }
}
