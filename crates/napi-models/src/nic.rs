use napi_ip::Address;
use napi_mac::MacAddress;
use napi_uuid::{BelongsToId, ComputeNodeId, NetworkId, OwnerId};
use serde::{Deserialize, Serialize};

use crate::belongs_to::BelongsToType;
use crate::error::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NicState {
    Provisioning,
    Stopped,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CapabilityFlags {
    pub allow_ip_spoofing: bool,
    pub allow_mac_spoofing: bool,
    pub allow_dhcp_spoofing: bool,
    pub allow_restricted_traffic: bool,
    pub allow_unfiltered_promisc: bool,
    pub underlay: bool,
}

/// A NIC's denormalized IP attachment: the one IP it currently holds, if
/// any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicAddress {
    pub network_uuid: NetworkId,
    pub address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nic {
    pub mac: MacAddress,
    pub owner_uuid: OwnerId,
    pub belongs_to_uuid: BelongsToId,
    pub belongs_to_type: BelongsToType,
    pub state: NicState,
    pub primary: bool,
    pub ip: Option<NicAddress>,
    pub capabilities: CapabilityFlags,
    pub model: Option<String>,
    pub cn_uuid: Option<ComputeNodeId>,
    pub nic_tags_provided: Vec<String>,
}

pub struct NewNic {
    pub mac: MacAddress,
    pub owner_uuid: OwnerId,
    pub belongs_to_uuid: BelongsToId,
    pub belongs_to_type: BelongsToType,
    pub primary: bool,
    pub ip: Option<NicAddress>,
    pub capabilities: CapabilityFlags,
    pub model: Option<String>,
    pub cn_uuid: Option<ComputeNodeId>,
    pub nic_tags_provided: Vec<String>,
    /// Whether `ip` (if any) lies on a fabric network, used to enforce
    /// "a fabric VNIC requires cn_uuid".
    pub ip_is_on_fabric_network: bool,
}

impl Nic {
    pub fn create(input: NewNic) -> Result<Self, ModelError> {
        if input.capabilities.underlay && input.belongs_to_type != BelongsToType::Server {
            return Err(ModelError::invalid("underlay", "underlay NICs must have belongs_to_type=server"));
        }
        if input.ip_is_on_fabric_network && input.belongs_to_type == BelongsToType::Zone && input.cn_uuid.is_none() {
            return Err(ModelError::invalid("cn_uuid", "a fabric VNIC requires cn_uuid"));
        }

        Ok(Nic {
            mac: input.mac,
            owner_uuid: input.owner_uuid,
            belongs_to_uuid: input.belongs_to_uuid,
            belongs_to_type: input.belongs_to_type,
            state: NicState::Provisioning,
            primary: input.primary,
            ip: input.ip,
            capabilities: input.capabilities,
            model: input.model,
            cn_uuid: input.cn_uuid,
            nic_tags_provided: input.nic_tags_provided,
        })
    }

    /// True iff this NIC is a fabric VNIC: a zone attachment carrying an
    /// IP and a captured compute node.
    pub fn is_fabric_vnic(&self) -> bool {
        self.belongs_to_type == BelongsToType::Zone && self.ip.is_some() && self.cn_uuid.is_some()
    }
}
