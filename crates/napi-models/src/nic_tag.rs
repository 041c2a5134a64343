use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Bounds on tag/network MTU.
pub const MTU_MIN: u32 = 1500;
pub const MTU_MAX: u32 = 9000;
pub const DEFAULT_MTU: u32 = 1500;

/// A named tag with an MTU, referenced by networks and NICs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NicTag {
    pub name: String,
    pub mtu: u32,
}

impl NicTag {
    pub fn new(name: impl Into<String>, mtu: u32) -> Result<Self, ModelError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ModelError::invalid("name", "must not be empty"));
        }
        if !(MTU_MIN..=MTU_MAX).contains(&mtu) {
            return Err(ModelError::invalid("mtu", format!("must be between {MTU_MIN} and {MTU_MAX}")));
        }
        Ok(NicTag { name, mtu })
    }
}
