use napi_ip::Address;
use napi_uuid::{BelongsToId, OwnerId};
use serde::{Deserialize, Serialize};

use crate::belongs_to::BelongsToType;

/// The {belongs_to_uuid, belongs_to_type, owner_uuid} triplet. Its
/// presence is what makes an IP "assigned".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub belongs_to_uuid: BelongsToId,
    pub belongs_to_type: BelongsToType,
    pub owner_uuid: OwnerId,
}

/// A per-network IP record, keyed by `address` in the network's IP
/// bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ip {
    pub address: Address,
    pub reserved: bool,
    pub assignment: Option<Assignment>,
}

impl Ip {
    pub fn free(address: Address) -> Self {
        Ip {
            address,
            reserved: false,
            assignment: None,
        }
    }

    /// A bootstrap record seeded at network creation time: reserved, owned
    /// by `belongs_to_type=other`.
    pub fn bootstrap(address: Address, owner_uuid: OwnerId) -> Self {
        Ip {
            address,
            reserved: true,
            assignment: Some(Assignment {
                belongs_to_uuid: BelongsToId::from(owner_uuid.0),
                belongs_to_type: BelongsToType::Other,
                owner_uuid,
            }),
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.assignment.is_some()
    }

    /// True iff this address is free to hand out via the next-free path.
    pub fn is_available_for_next_free(&self) -> bool {
        !self.reserved && self.assignment.is_none()
    }

    /// True iff an explicit-IP request may take this record over: free, or currently held by a bootstrap
    /// (`belongs_to_type=other`) or admin-owned record.
    pub fn is_provisionable(&self, admin: OwnerId) -> bool {
        match &self.assignment {
            None => true,
            Some(assignment) => assignment.belongs_to_type == BelongsToType::Other || assignment.owner_uuid == admin,
        }
    }

    pub fn assign(&mut self, assignment: Assignment) {
        self.assignment = Some(assignment);
    }

    /// Clear the triplet while preserving `reserved`.
    pub fn unassign(&mut self) {
        self.assignment = None;
    }
}
