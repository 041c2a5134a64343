//! Strongly typed RFC-4122 identifiers.
//!
//! A `Uuid` newtype per entity kind so that, say, a `NetworkId` can
//! never be passed where an `OwnerId` is expected. `typed_uuid!`
//! generates the `Display`/`FromStr`/`serde`/(optional) `sqlx` impls
//! for each one.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum UuidConversionError {
    #[error("invalid UUID for field of type {ty}: {value}")]
    InvalidUuid { ty: &'static str, value: String },
}

macro_rules! typed_uuid {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, Eq, Hash, PartialEq, PartialOrd, Ord)]
        #[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
        #[cfg_attr(feature = "sqlx", sqlx(transparent))]
        pub struct $name(pub uuid::Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(value: uuid::Uuid) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = UuidConversionError;

            fn from_str(input: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(input)
                    .map(Self)
                    .map_err(|_| UuidConversionError::InvalidUuid {
                        ty: stringify!($name),
                        value: input.to_string(),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

typed_uuid!(NetworkId, "Identifies a Network record.");
typed_uuid!(NetworkPoolId, "Identifies a NetworkPool record.");
typed_uuid!(OwnerId, "Identifies the tenant/account that owns a resource.");
typed_uuid!(BelongsToId, "Identifies the server/zone/other entity a NIC is attached to.");
typed_uuid!(VpcId, "Identifies a per-owner VPC prefix record within a Fabric.");
typed_uuid!(ComputeNodeId, "Identifies a compute node (cn_uuid) hosting a fabric VNIC.");

/// The reserved administrative account. Owner checks always admit this id regardless of a network's
/// configured owner set.
pub fn admin_owner() -> OwnerId {
    // A nil UUID is never issued to a real tenant by the identity system
    // this core integrates with; it is reserved here as the admin sentinel.
    OwnerId(uuid::Uuid::nil())
}
