//! IP range matching for access control
//!
//! Ranges are written `a.b.c.d` or `a.b.c.d-e.f.g.h`. An address matches a
//! range when every octet lies between the corresponding octets of the two
//! endpoints. This is a per-octet bounding box, not an integer range:
//! `10.0.0.250-10.0.1.5` does not contain `10.0.0.251`.

use crate::error::ConfigError;
use std::net::Ipv4Addr;

/// Compiled IP range matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpRangeMatcher {
    ranges: Vec<IpRange>,
}

/// A single inclusive range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpRange {
    source: String,
    low: [u8; 4],
    high: [u8; 4],
}

impl IpRange {
    /// Parse a range from its configured form
    pub fn parse(range: &str) -> Result<Self, ConfigError> {
        let (low, high) = match range.split_once('-') {
            Some((low, high)) => (low, high),
            None => (range, range),
        };

        Ok(Self {
            source: range.to_string(),
            low: parse_endpoint(range, low)?,
            high: parse_endpoint(range, high)?,
        })
    }

    /// Check whether `address` falls inside the box
    pub fn contains(&self, address: Ipv4Addr) -> bool {
        let octets = address.octets();
        (0..4).all(|i| self.low[i] <= octets[i] && octets[i] <= self.high[i])
    }

    /// The range as it was configured
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Parse one endpoint octet by octet; zero-padded octets like `001` are fine
fn parse_endpoint(range: &str, endpoint: &str) -> Result<[u8; 4], ConfigError> {
    let endpoint = endpoint.trim();
    let invalid = |reason: String| ConfigError::InvalidIpRange {
        range: range.to_string(),
        reason: format!("'{}': {}", endpoint, reason),
    };

    let parts: Vec<&str> = endpoint.split('.').collect();
    if parts.len() != 4 {
        return Err(invalid(format!("expected 4 octets, found {}", parts.len())));
    }

    let mut octets = [0u8; 4];
    for (octet, part) in octets.iter_mut().zip(parts) {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid(format!("octet '{}' is not a number", part)));
        }
        *octet = part
            .parse::<u8>()
            .map_err(|e| invalid(format!("octet '{}': {}", part, e)))?;
    }

    Ok(octets)
}

impl IpRangeMatcher {
    /// Create a new matcher from a list of configured ranges
    pub fn new(ranges: &[String]) -> Result<Self, ConfigError> {
        let ranges = ranges
            .iter()
            .map(|range| IpRange::parse(range))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { ranges })
    }

    /// Create an empty matcher (matches nothing)
    pub fn empty() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Check if an address falls within any range
    pub fn matches(&self, address: Ipv4Addr) -> bool {
        self.ranges.iter().any(|r| r.contains(address))
    }

    /// Like [`matches`](Self::matches), for a raw address string.
    ///
    /// A malformed address matches nothing.
    pub fn matches_str(&self, address: &str) -> bool {
        address
            .trim()
            .parse::<Ipv4Addr>()
            .is_ok_and(|addr| self.matches(addr))
    }

    /// Check if an address matches, returning the matching range
    pub fn find_match(&self, address: Ipv4Addr) -> Option<&str> {
        self.ranges
            .iter()
            .find(|r| r.contains(address))
            .map(IpRange::as_str)
    }

    /// The configured ranges, in order
    pub fn sources(&self) -> Vec<String> {
        self.ranges.iter().map(|r| r.source.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }
}

impl Default for IpRangeMatcher {
    fn default() -> Self {
        Self::empty()
    }
}
