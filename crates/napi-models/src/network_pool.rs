use napi_ip::IpAddressFamily;
use napi_uuid::{NetworkPoolId, OwnerId};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::network::Network;

/// An ordered set of networks sharing `nic_tag`.
/// `cursor` is the index of the network provisioning should resume from;
/// it advances as members fill up and wraps when a round trip finds no
/// capacity (surfaced to the engine as `PoolFull`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkPool {
    pub uuid: NetworkPoolId,
    pub name: String,
    pub nic_tag: String,
    pub family: IpAddressFamily,
    pub members: Vec<napi_uuid::NetworkId>,
    pub owner_uuids: Option<Vec<OwnerId>>,
    pub cursor: usize,
}

/// A per-NIC filter narrowing a pool's members to the subset that
/// qualify for one provisioning attempt: `nic_tag`/`vlan_id`/`vnet_id`,
/// each optional, each matched against the corresponding field on a
/// candidate member network when present. A caller may supply several
/// intersections; the engine tries each in order, advancing to the next
/// only once every matching member of the current one has failed with
/// `SubnetFull`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Intersection {
    pub nic_tag: Option<String>,
    pub vlan_id: Option<u16>,
    pub vnet_id: Option<u32>,
}

impl Intersection {
    /// The intersection that matches every member: used when a caller
    /// supplies no filters at all, so provisioning still considers the
    /// whole pool.
    pub fn any() -> Self {
        Intersection::default()
    }

    pub fn matches(&self, network: &Network) -> bool {
        if let Some(nic_tag) = &self.nic_tag {
            if &network.nic_tag != nic_tag {
                return false;
            }
        }
        if let Some(vlan_id) = self.vlan_id {
            if network.vlan_id != vlan_id {
                return false;
            }
        }
        if let Some(vnet_id) = self.vnet_id {
            if network.vnet_id != Some(vnet_id) {
                return false;
            }
        }
        true
    }
}

impl NetworkPool {
    pub fn create(
        name: impl Into<String>,
        nic_tag: impl Into<String>,
        family: IpAddressFamily,
        members: Vec<&Network>,
        owner_uuids: Option<Vec<OwnerId>>,
    ) -> Result<Self, ModelError> {
        let nic_tag = nic_tag.into();
        for member in &members {
            if member.nic_tag != nic_tag {
                return Err(ModelError::invalid("members", format!("network {} does not share nic_tag {nic_tag}", member.uuid)));
            }
            if member.family != family {
                return Err(ModelError::invalid("members", format!("network {} does not share the pool's address family", member.uuid)));
            }
        }

        Ok(NetworkPool {
            uuid: NetworkPoolId::new(),
            name: name.into(),
            nic_tag,
            family,
            members: members.iter().map(|m| m.uuid).collect(),
            owner_uuids,
            cursor: 0,
        })
    }

    /// Add a member, enforcing nic_tag/family match.
    pub fn add_member(&mut self, network: &Network) -> Result<(), ModelError> {
        if network.nic_tag != self.nic_tag {
            return Err(ModelError::invalid("members", "new member must share the pool's nic_tag"));
        }
        if network.family != self.family {
            return Err(ModelError::invalid("members", "new member must share the pool's address family"));
        }
        self.members.push(network.uuid);
        Ok(())
    }

    /// Advance the cursor to the next member, wrapping around. Used by
    /// provision-on-pool to move past a full network.
    pub fn advance_cursor(&mut self) {
        if self.members.is_empty() {
            return;
        }
        self.cursor = (self.cursor + 1) % self.members.len();
    }

    /// Iterate members starting at the current cursor, one full round
    /// (used to detect `PoolFull`: every member visited without success).
    pub fn members_from_cursor(&self) -> impl Iterator<Item = napi_uuid::NetworkId> + '_ {
        let len = self.members.len();
        (0..len).map(move |i| self.members[(self.cursor + i) % len])
    }
}
