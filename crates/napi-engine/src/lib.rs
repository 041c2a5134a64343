//! The provisioning engine: the only component that
//! writes NIC records, plus the surrounding model operations
//! (NicTag/Network/NetworkPool/Fabric/Aggregation CRUD) that the engine
//! and its callers share a store handle with.
//!
//! Every operation here takes the store contract (`napi_store::StoreAdapter`)
//! as a trait object so the same engine code runs against the in-memory
//! fake in tests and the Postgres-backed adapter in production, decoupling
//! the provisioning logic from its backing table.

mod aggregation;
mod config;
mod error;
mod fabric;
mod ip_allocator;
mod nic;
mod nic_tag;
mod network;
mod network_pool;
#[cfg(test)]
mod test_support;

use std::sync::Arc;

use napi_store::{BucketDef, StoreAdapter, StoreError};

pub use config::EngineConfig;
pub use error::NapiError;
pub use ip_allocator::IpRequest;
pub use network::NetworkPatch;
pub use network_pool::NetworkPoolPatch;
pub use nic::{CreateNicInput, UpdateNicInput};

/// The engine's handle to durable state plus its tunable knobs. Cheap to
/// clone (an `Arc<dyn StoreAdapter>` and a small config struct), so
/// embedders typically construct one `Engine` per process and share it.
#[derive(Clone)]
pub struct Engine {
    pub(crate) store: Arc<dyn StoreAdapter>,
    pub(crate) config: EngineConfig,
}

impl Engine {
    pub fn new(store: Arc<dyn StoreAdapter>, config: EngineConfig) -> Self {
        Engine { store, config }
    }

    /// Declare every bucket this core writes to. Idempotent and safe to
    /// call on every startup; the
    /// per-network IP buckets are declared separately, at network-create
    /// time, since their names are derived from a network's uuid.
    pub async fn init_buckets(&self) -> Result<(), StoreError> {
        let defs = [
            BucketDef::new(self.config.bucket(napi_models::NIC_TAGS), 1),
            BucketDef::new(self.config.bucket(napi_models::NETWORKS), 1)
                .index("name")
                .index("nic_tag")
                .index("vlan_id")
                .index("vnet_id"),
            BucketDef::new(self.config.bucket(napi_models::NETWORK_POOLS), 1).index("nic_tag"),
            BucketDef::new(self.config.bucket(napi_models::FABRICS), 1).index("owner_uuid"),
            BucketDef::new(self.config.bucket(napi_models::FABRIC_VLANS), 1),
            BucketDef::new(self.config.bucket(napi_models::AGGREGATIONS), 1).index("belongs_to_uuid"),
            BucketDef::new(self.config.bucket(napi_models::NICS), 1)
                .index("mac")
                .index("belongs_to_uuid")
                .index("primary")
                .index("cn_uuid"),
            // Overlay buckets are addressed by `napi-overlay`'s own
            // hardcoded constants (it has no `EngineConfig` to prefix
            // with), so they are declared here unprefixed too.
            BucketDef::new(napi_overlay::VL2_BUCKET, 1).index("vnet_id"),
            BucketDef::new(napi_overlay::VL3_BUCKET, 1).index("vnet_id"),
            BucketDef::new(napi_overlay::UNDERLAY_BUCKET, 1),
            BucketDef::new(napi_overlay::SHOOTDOWN_LOG_BUCKET, 1),
        ];
        for def in &defs {
            self.store.init_bucket(def).await?;
        }
        Ok(())
    }
}
