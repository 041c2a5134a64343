use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;

use crate::{Address, IdentifyAddressFamily, IpAddressFamily};

/// A CIDR subnet. Wraps `ipnet::IpNet` (as `forge_network::ip::prefix`
/// does) but exposes the numeric-address operations
/// the allocator and network-model validation need: containment, the v4
/// network/broadcast addresses, and host iteration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Subnet {
    net: IpNet,
}

#[derive(Debug, thiserror::Error)]
pub enum SubnetError {
    #[error("could not parse subnet: {0}")]
    Parse(String),
    #[error("address {address} is not canonical for prefix length {prefix_len} (host bits set)")]
    NonCanonical { address: String, prefix_len: u8 },
}

impl Subnet {
    pub fn family(&self) -> IpAddressFamily {
        match self.net {
            IpNet::V4(_) => IpAddressFamily::Ipv4,
            IpNet::V6(_) => IpAddressFamily::Ipv6,
        }
    }

    pub fn prefix_len(&self) -> u8 {
        self.net.prefix_len()
    }

    /// The network (all-host-bits-zero) address. For IPv4 this is the
    /// reserved "network address" that may never be handed out as a
    /// provisionable host address.
    pub fn network_address(&self) -> Address {
        self.net.network().into()
    }

    /// The IPv4 broadcast address (all-host-bits-one). `None` for IPv6,
    /// which has no broadcast concept.
    pub fn broadcast_address(&self) -> Option<Address> {
        match self.net {
            IpNet::V4(v4) => Some(IpAddr::V4(v4.broadcast()).into()),
            IpNet::V6(_) => None,
        }
    }

    pub fn contains(&self, addr: Address) -> bool {
        let ip: IpAddr = addr.into();
        self.net.contains(&ip)
    }

    /// True iff `other` is fully contained within `self` (used by the
    /// network-overlap check: two networks sharing a nic tag must not
    /// have overlapping subnets).
    pub fn overlaps(&self, other: &Subnet) -> bool {
        if self.family() != other.family() {
            return false;
        }
        self.net.contains(&other.net) || other.net.contains(&self.net)
    }

    /// Iterate every host address in `[start, end]`, both inclusive, as long
    /// as both endpoints lie within this subnet. Used by the allocator's
    /// bounded range scan and by
    /// network-creation bootstrap record seeding.
    pub fn iter_range(&self, start: Address, end: Address) -> Result<SubnetIter, SubnetError> {
        if !self.contains(start) || !self.contains(end) {
            return Err(SubnetError::Parse(format!(
                "range {start}..={end} is not contained in {self}"
            )));
        }
        Ok(SubnetIter {
            next: Some(start),
            end,
        })
    }
}

impl FromStr for Subnet {
    type Err = SubnetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let net: IpNet = s.parse().map_err(|_| SubnetError::Parse(s.to_string()))?;
        if net.addr() != net.network() {
            return Err(SubnetError::NonCanonical {
                address: net.addr().to_string(),
                prefix_len: net.prefix_len(),
            });
        }
        Ok(Subnet { net })
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.net)
    }
}

impl serde::Serialize for Subnet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Subnet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        let s = String::deserialize(deserializer)?;
        Subnet::from_str(&s).map_err(D::Error::custom)
    }
}

pub struct SubnetIter {
    next: Option<Address>,
    end: Address,
}

impl Iterator for SubnetIter {
    type Item = Address;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        if current > self.end {
            self.next = None;
            return None;
        }
        self.next = current.checked_add(1).filter(|n| *n <= self.end);
        Some(current)
    }
}
