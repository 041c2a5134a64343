use napi_uuid::{OwnerId, VpcId};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use napi_ip::Subnet;

/// A per-owner record holding the owner's 24-bit vnet_id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fabric {
    pub owner_uuid: OwnerId,
    pub vnet_id: u32,
}

impl Fabric {
    pub fn new(owner_uuid: OwnerId, vnet_id: u32) -> Result<Self, ModelError> {
        if vnet_id > 0x00ff_ffff {
            return Err(ModelError::invalid("vnet_id", "must fit in 24 bits"));
        }
        Ok(Fabric { owner_uuid, vnet_id })
    }
}

/// A per-owner (or per-VPC) "extra" fabric record. Quota enforcement from
/// `ip4_cidr`/`allocated` is intentionally left to an external subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vpc {
    pub vpc_uuid: VpcId,
    pub owner_uuid: OwnerId,
    pub ip4_cidr: Subnet,
    pub allocated: u64,
}

/// Either scope a `FabricVLAN` can be unique under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FabricVlanScope {
    Owner(OwnerId),
    Vpc(VpcId),
}

/// (owner_uuid or vpc_uuid, vlan_id) -> name, vnet_id. Unique under its
/// scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FabricVlan {
    pub scope: FabricVlanScope,
    pub vlan_id: u16,
    pub name: String,
    pub vnet_id: u32,
}

impl FabricVlan {
    pub fn new(scope: FabricVlanScope, vlan_id: u16, name: impl Into<String>, vnet_id: u32) -> Result<Self, ModelError> {
        if vlan_id > 4094 || vlan_id == 1 {
            return Err(ModelError::invalid("vlan_id", "must be in 0..=4094 and not 1"));
        }
        Ok(FabricVlan {
            scope,
            vlan_id,
            name: name.into(),
            vnet_id,
        })
    }

    /// The store key this record is unique under: `{scope}-{vlan_id}`.
    pub fn key(&self) -> String {
        match self.scope {
            FabricVlanScope::Owner(owner) => format!("owner-{owner}-{}", self.vlan_id),
            FabricVlanScope::Vpc(vpc) => format!("vpc-{vpc}-{}", self.vlan_id),
        }
    }
}
