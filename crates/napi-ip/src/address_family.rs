//! Address-family tagging, generalized from `forge_network::ip::address_family`:
//! a trait rather than an enum comparison scattered at every call site.

#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpAddressFamily {
    Ipv4,
    Ipv6,
}

pub trait IdentifyAddressFamily {
    fn address_family(&self) -> IpAddressFamily;

    fn is_address_family(&self, family: IpAddressFamily) -> bool {
        family == self.address_family()
    }

    fn require_address_family_or_else<F, E>(self, family: IpAddressFamily, err: F) -> Result<Self, E>
    where
        Self: Sized,
        F: FnOnce(Self) -> E,
    {
        if self.is_address_family(family) {
            Ok(self)
        } else {
            Err(err(self))
        }
    }
}

impl IdentifyAddressFamily for std::net::IpAddr {
    fn address_family(&self) -> IpAddressFamily {
        match self {
            std::net::IpAddr::V4(_) => IpAddressFamily::Ipv4,
            std::net::IpAddr::V6(_) => IpAddressFamily::Ipv6,
        }
    }
}
