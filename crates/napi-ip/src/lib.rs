//! IP address and subnet arithmetic used throughout the provisioning core.
//!
//! This crate owns everything the engine needs to know about addresses as
//! *numbers*: parsing/formatting, ordering, CIDR containment, and iterating
//! the host addresses of a subnet. It does not implement an IP stack -
//! nothing here sends a packet.

mod address_family;
mod subnet;

pub use address_family::{IdentifyAddressFamily, IpAddressFamily};
pub use subnet::{Subnet, SubnetError, SubnetIter};

use std::cmp::Ordering;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// A parsed address, kept numeric so that ordering and gap arithmetic
/// (used by the allocator's next-free search) are plain integer operations.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Address {
    V4(u32),
    V6(u128),
}

#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error("could not parse address: {0}")]
    Parse(String),
    #[error("address family mismatch: expected {expected:?}, got {actual:?}")]
    FamilyMismatch {
        expected: IpAddressFamily,
        actual: IpAddressFamily,
    },
}

impl Address {
    pub fn family(&self) -> IpAddressFamily {
        match self {
            Address::V4(_) => IpAddressFamily::Ipv4,
            Address::V6(_) => IpAddressFamily::Ipv6,
        }
    }

    /// The numeric value, widened to u128 so V4/V6 can be compared or stored
    /// in a single ordered key space (the legacy numeric IP-record key
    /// format uses this directly for v4).
    pub fn to_u128(self) -> u128 {
        match self {
            Address::V4(n) => n as u128,
            Address::V6(n) => n,
        }
    }

    pub fn checked_add(self, delta: u128) -> Option<Self> {
        match self {
            Address::V4(n) => {
                let next = (n as u128).checked_add(delta)?;
                if next > u32::MAX as u128 {
                    None
                } else {
                    Some(Address::V4(next as u32))
                }
            }
            Address::V6(n) => n.checked_add(delta).map(Address::V6),
        }
    }

    pub fn checked_sub(self, delta: u128) -> Option<Self> {
        match self {
            Address::V4(n) => (n as u128)
                .checked_sub(delta)
                .map(|v| Address::V4(v as u32)),
            Address::V6(n) => n.checked_sub(delta).map(Address::V6),
        }
    }
}

impl From<IpAddr> for Address {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) => Address::V4(u32::from_be_bytes(v4.octets())),
            IpAddr::V6(v6) => Address::V6(u128::from_be_bytes(v6.octets())),
        }
    }
}

impl From<Address> for IpAddr {
    fn from(addr: Address) -> Self {
        match addr {
            Address::V4(n) => IpAddr::V4(Ipv4Addr::from(n.to_be_bytes())),
            Address::V6(n) => IpAddr::V6(Ipv6Addr::from(n.to_be_bytes())),
        }
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let addr: IpAddr = s.parse().map_err(|_| AddressError::Parse(s.to_string()))?;
        Ok(addr.into())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let addr: IpAddr = (*self).into();
        // IPv6 formats in RFC-5952 canonical form via std's Display impl.
        write!(f, "{addr}")
    }
}

impl Ord for Address {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Address::V4(_), Address::V6(_)) => Ordering::Less,
            (Address::V6(_), Address::V4(_)) => Ordering::Greater,
            (a, b) => a.to_u128().cmp(&b.to_u128()),
        }
    }
}

impl PartialOrd for Address {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl IdentifyAddressFamily for Address {
    fn address_family(&self) -> IpAddressFamily {
        self.family()
    }
}

impl serde::Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v4_roundtrips_through_display() {
        let addr: Address = "10.99.99.38".parse().unwrap();
        assert_eq!(addr.to_string(), "10.99.99.38");
    }

    #[test]
    fn v4_orders_before_v6() {
        let v4: Address = "10.0.0.1".parse().unwrap();
        let v6: Address = "2001:db8::1".parse().unwrap();
        assert_eq!(v4.cmp(&v6), Ordering::Less);
    }

    #[test]
    fn checked_add_detects_v4_overflow() {
        let top: Address = "255.255.255.255".parse().unwrap();
        assert_eq!(top.checked_add(1), None);
    }

    #[test]
    fn numeric_ordering_matches_natural_ordering() {
        let a: Address = "10.0.0.5".parse().unwrap();
        let b: Address = "10.0.0.10".parse().unwrap();
        assert!(a < b);
    }
}
