//! Record types for the NAPI data model: nic-tags, networks,
//! pools, fabrics, IPs, NICs, and aggregations.
//!
//! Every type here is a plain, serde-serializable record plus the
//! *local* invariant checks a constructor can perform without touching
//! the store (format ranges, family matches, self-consistent flags).
//! Cross-record invariants - subnet overlap against other networks, IP
//! uniqueness, primary-flag exclusivity - are the provisioning engine's
//! job, since only it can see the rest of the store.

mod aggregation;
mod belongs_to;
mod bucket;
mod error;
mod fabric;
mod ip;
mod network;
mod network_pool;
mod nic;
mod nic_tag;

pub use aggregation::{Aggregation, LacpMode};
pub use belongs_to::BelongsToType;
pub use bucket::*;
pub use error::ModelError;
pub use fabric::{Fabric, FabricVlan, FabricVlanScope, Vpc};
pub use ip::{Assignment, Ip};
pub use network::{NewNetwork, Network, Route, MAX_RESOLVERS};
pub use network_pool::{Intersection, NetworkPool};
pub use nic::{CapabilityFlags, NewNic, Nic, NicAddress, NicState};
pub use nic_tag::{NicTag, DEFAULT_MTU, MTU_MAX, MTU_MIN};
