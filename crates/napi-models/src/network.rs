use std::collections::HashSet;

use napi_ip::{Address, IpAddressFamily, Subnet};
use napi_uuid::{NetworkId, OwnerId};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::nic_tag::{DEFAULT_MTU, MTU_MAX, MTU_MIN};

/// Cap on `resolvers`.
pub const MAX_RESOLVERS: usize = 2;

/// A static route: traffic to `destination` is sent via `gateway`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub destination: Subnet,
    pub gateway: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub uuid: NetworkId,
    pub name: String,
    pub nic_tag: String,
    pub vlan_id: u16,
    pub subnet: Subnet,
    pub provision_start: Address,
    pub provision_end: Address,
    pub gateway: Option<Address>,
    pub resolvers: Vec<Address>,
    pub routes: Vec<Route>,
    pub owner_uuids: Option<Vec<OwnerId>>,
    pub fabric: bool,
    pub vnet_id: Option<u32>,
    pub internet_nat: bool,
    pub mtu: u32,
    pub family: IpAddressFamily,
    pub gateway_provisioned: bool,
    pub description: Option<String>,
}

pub struct NewNetwork {
    pub name: String,
    pub nic_tag: String,
    pub vlan_id: u16,
    pub subnet: Subnet,
    pub provision_start: Address,
    pub provision_end: Address,
    pub gateway: Option<Address>,
    pub resolvers: Vec<Address>,
    pub routes: Vec<Route>,
    pub owner_uuids: Option<Vec<OwnerId>>,
    pub fabric: bool,
    pub vnet_id: Option<u32>,
    pub internet_nat: bool,
    pub mtu: Option<u32>,
    pub description: Option<String>,
}

impl Network {
    pub fn create(input: NewNetwork) -> Result<Self, ModelError> {
        if input.vlan_id > 4094 || input.vlan_id == 1 {
            return Err(ModelError::invalid("vlan_id", "must be in 0..=4094 and not 1"));
        }

        let family = input.subnet.family();

        if input.provision_start.family() != family || input.provision_end.family() != family {
            return Err(ModelError::invalid("provision_start", "must share the subnet's address family"));
        }
        if !input.subnet.contains(input.provision_start) || !input.subnet.contains(input.provision_end) {
            return Err(ModelError::invalid("provision_start", "must lie within the subnet"));
        }
        if input.provision_start > input.provision_end {
            return Err(ModelError::invalid("provision_start", "must not be greater than provision_end"));
        }

        if let Some(gateway) = input.gateway {
            if gateway.family() != family || !input.subnet.contains(gateway) {
                return Err(ModelError::invalid("gateway", "must lie within the subnet"));
            }
        }

        if input.resolvers.len() > MAX_RESOLVERS {
            return Err(ModelError::invalid("resolvers", format!("at most {MAX_RESOLVERS} resolvers are allowed")));
        }
        for resolver in &input.resolvers {
            if resolver.family() != family {
                return Err(ModelError::invalid("resolvers", "must share the subnet's address family"));
            }
        }

        if input.fabric != input.vnet_id.is_some() {
            return Err(ModelError::invalid("vnet_id", "must be set if and only if fabric is true"));
        }
        if let Some(vnet_id) = input.vnet_id {
            if vnet_id > 0x00ff_ffff {
                return Err(ModelError::invalid("vnet_id", "must fit in 24 bits"));
            }
        }

        let mtu = input.mtu.unwrap_or(DEFAULT_MTU);
        if !(MTU_MIN..=MTU_MAX).contains(&mtu) {
            return Err(ModelError::invalid("mtu", format!("must be between {MTU_MIN} and {MTU_MAX}")));
        }

        for route in &input.routes {
            if route.destination.family() != family || route.gateway.family() != family {
                return Err(ModelError::invalid("routes", "must share the subnet's address family"));
            }
        }

        Ok(Network {
            uuid: NetworkId::new(),
            name: input.name,
            nic_tag: input.nic_tag,
            vlan_id: input.vlan_id,
            subnet: input.subnet,
            provision_start: input.provision_start,
            provision_end: input.provision_end,
            gateway: input.gateway,
            resolvers: input.resolvers,
            routes: input.routes,
            owner_uuids: input.owner_uuids,
            fabric: input.fabric,
            vnet_id: input.vnet_id,
            internet_nat: input.internet_nat,
            mtu,
            family,
            gateway_provisioned: false,
            description: input.description,
        })
    }

    /// True iff `owner` may consume an address on this network. The admin account and an unrestricted network
    /// (`owner_uuids` unset) always pass.
    pub fn permits_owner(&self, owner: OwnerId, check_owner: bool) -> bool {
        if !check_owner {
            return true;
        }
        if owner == napi_uuid::admin_owner() {
            return true;
        }
        match &self.owner_uuids {
            None => true,
            Some(owners) => owners.contains(&owner),
        }
    }

    /// The v4 "reserved by construction" addresses: the network address,
    /// the broadcast address, the gateway, and every resolver. These seed
    /// as `reserved=true, belongs_to_type=other` records on creation.
    pub fn bootstrap_addresses(&self) -> Vec<Address> {
        let mut addrs = HashSet::new();
        addrs.insert(self.subnet.network_address());
        if let Some(broadcast) = self.subnet.broadcast_address() {
            addrs.insert(broadcast);
        }
        if let Some(gateway) = self.gateway {
            addrs.insert(gateway);
        }
        for resolver in &self.resolvers {
            addrs.insert(*resolver);
        }
        addrs.into_iter().collect()
    }

    pub fn ip_bucket_name(&self) -> String {
        crate::bucket::ip_bucket_name(self.uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> NewNetwork {
        NewNetwork {
            name: "test-net".to_string(),
            nic_tag: "external".to_string(),
            vlan_id: 10,
            subnet: "10.99.99.0/24".parse().unwrap(),
            provision_start: "10.99.99.38".parse().unwrap(),
            provision_end: "10.99.99.253".parse().unwrap(),
            gateway: Some("10.99.99.1".parse().unwrap()),
            resolvers: vec!["10.99.99.11".parse().unwrap()],
            routes: vec![],
            owner_uuids: None,
            fabric: false,
            vnet_id: None,
            internet_nat: false,
            mtu: None,
            description: None,
        }
    }

    #[test]
    fn network_creates_successfully_with_valid_input() {
        let network = Network::create(base_input()).unwrap();
        assert_eq!(network.mtu, DEFAULT_MTU);
        let mut bootstrap: Vec<String> = network.bootstrap_addresses().iter().map(|a| a.to_string()).collect();
        bootstrap.sort();
        assert_eq!(bootstrap, vec!["10.99.99.0", "10.99.99.1", "10.99.99.11", "10.99.99.255"]);
    }

    #[test]
    fn rejects_vlan_id_one() {
        let mut input = base_input();
        input.vlan_id = 1;
        assert!(Network::create(input).is_err());
    }

    #[test]
    fn rejects_gateway_outside_subnet() {
        let mut input = base_input();
        input.gateway = Some("10.0.0.1".parse().unwrap());
        assert!(Network::create(input).is_err());
    }

    #[test]
    fn rejects_too_many_resolvers() {
        let mut input = base_input();
        input.resolvers = vec![
            "10.99.99.11".parse().unwrap(),
            "10.99.99.12".parse().unwrap(),
            "10.99.99.13".parse().unwrap(),
        ];
        assert!(Network::create(input).is_err());
    }

    #[test]
    fn rejects_fabric_without_vnet_id() {
        let mut input = base_input();
        input.fabric = true;
        assert!(Network::create(input).is_err());
    }

    #[test]
    fn rejects_inverted_provision_range() {
        let mut input = base_input();
        std::mem::swap(&mut input.provision_start, &mut input.provision_end);
        assert!(Network::create(input).is_err());
    }

    #[test]
    fn admin_owner_bypasses_owner_restriction() {
        let mut input = base_input();
        input.owner_uuids = Some(vec![OwnerId::new()]);
        let network = Network::create(input).unwrap();
        assert!(network.permits_owner(napi_uuid::admin_owner(), true));
        assert!(!network.permits_owner(OwnerId::new(), true));
    }
}
