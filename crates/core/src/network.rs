//! Operator network exclusion.
//!
//! Visits from the operator's own networks are not tracked. Entries are IP
//! addresses or CIDR blocks; client addresses are normalized before matching
//! (port stripped, IPv4-mapped IPv6 unwrapped). Anything that does not parse
//! as an address never matches.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use crate::error::{Error, Result};

/// A single address block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpBlock {
    network: IpAddr,
    prefix: u8,
}

impl IpBlock {
    /// Returns true if `addr` falls inside this block.
    pub fn contains(&self, addr: IpAddr) -> bool {
        match (self.network, addr) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = prefix_mask_u32(self.prefix);
                u32::from(net) & mask == u32::from(ip) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = prefix_mask_u128(self.prefix);
                u128::from(net) & mask == u128::from(ip) & mask
            }
            _ => false,
        }
    }
}

fn prefix_mask_u32(prefix: u8) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - u32::from(prefix.min(32)))
    }
}

fn prefix_mask_u128(prefix: u8) -> u128 {
    if prefix == 0 {
        0
    } else {
        u128::MAX << (128 - u32::from(prefix.min(128)))
    }
}

impl FromStr for IpBlock {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (addr, prefix) = match s.split_once('/') {
            Some((addr, prefix)) => {
                let prefix: u8 = prefix
                    .parse()
                    .map_err(|_| Error::config(format!("invalid prefix length in '{}'", s)))?;
                (addr, Some(prefix))
            }
            None => (s, None),
        };

        let network = normalize_ip(
            addr.parse::<IpAddr>()
                .map_err(|_| Error::config(format!("invalid network address '{}'", s)))?,
        );
        let max = if network.is_ipv4() { 32 } else { 128 };
        let prefix = prefix.unwrap_or(max);
        if prefix > max {
            return Err(Error::config(format!("prefix /{} too long for '{}'", prefix, s)));
        }

        Ok(Self { network, prefix })
    }
}

/// Unwraps IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`).
pub fn normalize_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
        v4 => v4,
    }
}

/// Parses a client address as seen in headers: bare IP, `ip:port` or `[v6]:port`.
pub fn parse_client_ip(raw: &str) -> Option<IpAddr> {
    let raw = raw.trim();
    raw.parse::<IpAddr>()
        .ok()
        .or_else(|| raw.parse::<SocketAddr>().ok().map(|sa| sa.ip()))
        .map(normalize_ip)
}

/// Set of operator networks excluded from tracking.
#[derive(Debug, Clone, Default)]
pub struct ExcludedNetworks {
    blocks: Vec<IpBlock>,
}

impl ExcludedNetworks {
    pub fn new(blocks: Vec<IpBlock>) -> Self {
        Self { blocks }
    }

    /// Parses a list of address or CIDR entries.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
        let blocks = entries
            .iter()
            .map(|e| e.as_ref().trim())
            .filter(|e| !e.is_empty())
            .map(IpBlock::from_str)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { blocks })
    }

    /// Returns true if the client address belongs to an excluded network.
    pub fn is_excluded(&self, client_ip: Option<&str>) -> bool {
        let Some(ip) = client_ip.and_then(parse_client_ip) else {
            return false;
        };
        self.blocks.iter().any(|b| b.contains(ip))
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
