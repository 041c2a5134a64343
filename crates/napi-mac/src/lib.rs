//! MAC address parsing, formatting, and OUI-scoped generation.
//!
//! NICs are keyed by a 48-bit MAC in the global NIC bucket.
//! This crate owns the numeric representation and the OUI-constrained
//! random draw used when a caller does not supply a MAC.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

/// A 48-bit MAC address, stored numerically (big-endian value of the six
/// octets) the way the store keys NIC records.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MacAddress(u64);

const MAC_BITS: u32 = 48;
const MAC_MASK: u64 = (1u64 << MAC_BITS) - 1;

#[derive(Debug, thiserror::Error)]
pub enum MacError {
    #[error("could not parse MAC address: {0}")]
    Parse(String),
    #[error("value {0:#x} does not fit in 48 bits")]
    OutOfRange(u64),
    #[error("OUI {oui:#x} is not a valid 24-bit value")]
    InvalidOui { oui: u32 },
}

impl MacAddress {
    pub fn from_u64(value: u64) -> Result<Self, MacError> {
        if value > MAC_MASK {
            return Err(MacError::OutOfRange(value));
        }
        Ok(MacAddress(value))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    fn octets(self) -> [u8; 6] {
        let bytes = self.0.to_be_bytes();
        [bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7]]
    }

    /// The smallest MAC in the given 24-bit OUI (the OUI's three octets
    /// followed by `00:00:00`).
    pub fn min_in_oui(oui: Oui) -> MacAddress {
        MacAddress((oui.0 as u64) << 24)
    }

    /// The largest MAC in the given 24-bit OUI (the OUI's three octets
    /// followed by `ff:ff:ff`), the upper bound a NIC provisioning retry
    /// loop walks down from when probing for a free address.
    pub fn max_in_oui(oui: Oui) -> MacAddress {
        MacAddress(((oui.0 as u64) << 24) | 0x00ff_ffff)
    }

    pub fn is_in_oui(self, oui: Oui) -> bool {
        (self.0 >> 24) as u32 == oui.0
    }

    /// Draw a uniformly random MAC inside `oui`'s address space, used when
    /// a Create request does not supply a MAC.
    pub fn random_in_oui<R: Rng + ?Sized>(rng: &mut R, oui: Oui) -> MacAddress {
        let host_bits: u32 = rng.gen_range(0..=0x00ff_ffff);
        MacAddress(((oui.0 as u64) << 24) | host_bits as u64)
    }
}

/// A 24-bit organizationally unique identifier, configured per deployment.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Oui(u32);

impl Oui {
    pub fn new(value: u32) -> Result<Self, MacError> {
        if value > 0x00ff_ffff {
            return Err(MacError::InvalidOui { oui: value });
        }
        Ok(Oui(value))
    }
}

impl FromStr for MacAddress {
    type Err = MacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace('-', ":");
        let parts: Vec<&str> = normalized.split(':').collect();
        if parts.len() != 6 {
            return Err(MacError::Parse(s.to_string()));
        }
        let mut value: u64 = 0;
        for part in parts {
            let byte =
                u8::from_str_radix(part, 16).map_err(|_| MacError::Parse(s.to_string()))?;
            value = (value << 8) | byte as u64;
        }
        Ok(MacAddress(value))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = self.octets();
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

impl serde::Serialize for MacAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for MacAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        let s = String::deserialize(deserializer)?;
        MacAddress::from_str(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn parses_colon_and_dash_forms() {
        let colon: MacAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        let dash: MacAddress = "aa-bb-cc-dd-ee-ff".parse().unwrap();
        assert_eq!(colon, dash);
        assert_eq!(colon.to_string(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("not-a-mac".parse::<MacAddress>().is_err());
        assert!("aa:bb:cc:dd:ee".parse::<MacAddress>().is_err());
    }

    #[test]
    fn min_and_max_bound_the_oui() {
        let oui = Oui::new(0x90b11c).unwrap();
        let min = MacAddress::min_in_oui(oui);
        let max = MacAddress::max_in_oui(oui);
        assert_eq!(min.to_string(), "90:b1:1c:00:00:00");
        assert_eq!(max.to_string(), "90:b1:1c:ff:ff:ff");
        assert!(min.is_in_oui(oui));
        assert!(max.is_in_oui(oui));
    }

    #[test]
    fn random_in_oui_stays_within_bounds() {
        let oui = Oui::new(0x90b11c).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let mac = MacAddress::random_in_oui(&mut rng, oui);
            assert!(mac.is_in_oui(oui));
        }
    }

    #[test]
    fn oui_rejects_values_wider_than_24_bits() {
        assert!(Oui::new(0x0100_0000).is_err());
    }
}
