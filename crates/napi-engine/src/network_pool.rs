//! NetworkPool Create/Get/Update/Delete/List.

use napi_ip::IpAddressFamily;
use napi_models::{Network, NetworkPool};
use napi_store::{BatchOp, Filter, FindOptions, Precondition, StoreError};
use napi_uuid::{NetworkId, NetworkPoolId, OwnerId};
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::NapiError;
use crate::Engine;

pub const BUCKET: &str = "napi_network_pools";

fn value(pool: &NetworkPool) -> Result<serde_json::Map<String, Value>, NapiError> {
    match serde_json::to_value(pool).map_err(|e| NapiError::Internal { message: e.to_string() })? {
        Value::Object(map) => Ok(map),
        _ => Err(NapiError::Internal { message: "NetworkPool must serialize to an object".into() }),
    }
}

fn from_value(v: &serde_json::Map<String, Value>) -> Result<NetworkPool, NapiError> {
    serde_json::from_value(Value::Object(v.clone())).map_err(|e| NapiError::Internal { message: e.to_string() })
}

impl Engine {
    #[instrument(skip(self), err)]
    pub async fn create_network_pool(
        &self,
        name: String,
        nic_tag: String,
        family: IpAddressFamily,
        members: Vec<NetworkId>,
        owner_uuids: Option<Vec<OwnerId>>,
    ) -> Result<NetworkPool, NapiError> {
        let mut member_networks = Vec::with_capacity(members.len());
        for id in &members {
            member_networks.push(self.get_network(*id).await?);
        }
        let refs: Vec<&Network> = member_networks.iter().collect();
        let pool = NetworkPool::create(name, nic_tag, family, refs, owner_uuids)?;

        let bucket = self.config.bucket(BUCKET);
        self.store.put(&bucket, &pool.uuid.to_string(), value(&pool)?, Precondition::Create).await?;
        info!(pool_uuid = %pool.uuid, "created network pool");
        Ok(pool)
    }

    #[instrument(skip(self), err)]
    pub async fn get_network_pool(&self, id: NetworkPoolId) -> Result<NetworkPool, NapiError> {
        let bucket = self.config.bucket(BUCKET);
        let record = self.store.get(&bucket, &id.to_string()).await?;
        from_value(&record.value)
    }

    #[instrument(skip(self), err)]
    pub async fn list_network_pools(&self, limit: Option<usize>, offset: Option<usize>) -> Result<Vec<NetworkPool>, NapiError> {
        let bucket = self.config.bucket(BUCKET);
        let options = FindOptions { sort: None, limit: Some(self.config.list_limit(limit)), offset };
        let records = self.store.find(&bucket, &Filter::and([]), &options).await?;
        records.iter().map(|r| from_value(&r.value)).collect()
    }

    /// Only name, owner set, ordering, and member set may change; adding a member enforces nic_tag/family match.
    #[instrument(skip(self, patch), err)]
    pub async fn update_network_pool(&self, id: NetworkPoolId, patch: NetworkPoolPatch) -> Result<NetworkPool, NapiError> {
        let bucket = self.config.bucket(BUCKET);
        loop {
            let record = self.store.get(&bucket, &id.to_string()).await?;
            let mut pool = from_value(&record.value)?;

            if let Some(name) = patch.name.clone() {
                pool.name = name;
            }
            if let Some(owner_uuids) = patch.owner_uuids.clone() {
                pool.owner_uuids = owner_uuids;
            }
            if let Some(members) = patch.members.clone() {
                let mut rebuilt = Vec::new();
                for id in members {
                    let network = self.get_network(id).await?;
                    pool.add_member(&network).map_err(NapiError::from)?;
                    rebuilt.push(id);
                }
                pool.members = rebuilt;
                pool.cursor = 0;
            }

            match self.store.put(&bucket, &id.to_string(), value(&pool)?, Precondition::Etag(record.etag)).await {
                Ok(_) => return Ok(pool),
                Err(StoreError::EtagConflict { .. }) => continue,
                Err(other) => return Err(other.into()),
            }
        }
    }

    #[instrument(skip(self), err)]
    pub async fn delete_network_pool(&self, id: NetworkPoolId) -> Result<(), NapiError> {
        let bucket = self.config.bucket(BUCKET);
        let record = self.store.get(&bucket, &id.to_string()).await?;
        self.store
            .batch(vec![BatchOp::Delete { bucket, key: id.to_string(), precondition: Some(record.etag) }])
            .await?;
        Ok(())
    }

    /// Persist an advanced cursor after a successful provision-on-pool.
    /// Best-effort: a lost race here only costs a future caller one extra
    /// probe, never correctness, so it is not folded into the NIC's own
    /// batch.
    pub(crate) async fn advance_pool_cursor(&self, id: NetworkPoolId) -> Result<(), NapiError> {
        let bucket = self.config.bucket(BUCKET);
        let record = self.store.get(&bucket, &id.to_string()).await?;
        let mut pool = from_value(&record.value)?;
        pool.advance_cursor();
        match self.store.put(&bucket, &id.to_string(), value(&pool)?, Precondition::Etag(record.etag)).await {
            Ok(_) => Ok(()),
            Err(StoreError::EtagConflict { .. }) => Ok(()),
            Err(other) => Err(other.into()),
        }
    }
}

/// Which fields an Update request wants to change; `None` means "leave
/// as-is".
#[derive(Debug, Clone, Default)]
pub struct NetworkPoolPatch {
    pub name: Option<String>,
    pub owner_uuids: Option<Option<Vec<OwnerId>>>,
    pub members: Option<Vec<NetworkId>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_network, test_engine};

    #[tokio::test]
    async fn create_pool_round_trips() {
        let engine = test_engine().await;
        let network = create_test_network(&engine, "external").await;
        let pool = engine
            .create_network_pool("p".to_string(), "external".to_string(), IpAddressFamily::Ipv4, vec![network.uuid], None)
            .await
            .unwrap();
        let fetched = engine.get_network_pool(pool.uuid).await.unwrap();
        assert_eq!(fetched.members, vec![network.uuid]);
    }

    #[tokio::test]
    async fn rejects_member_with_mismatched_nic_tag() {
        let engine = test_engine().await;
        let network = create_test_network(&engine, "external").await;
        let mut other_input = crate::test_support::new_network_input("internal");
        other_input.name = "internal-net".to_string();
        other_input.subnet = "10.50.0.0/24".parse().unwrap();
        other_input.provision_start = "10.50.0.10".parse().unwrap();
        other_input.provision_end = "10.50.0.20".parse().unwrap();
        other_input.gateway = None;
        other_input.resolvers = vec![];
        let other = engine.create_network(other_input).await.unwrap();

        let err = engine
            .create_network_pool(
                "p".to_string(),
                "external".to_string(),
                IpAddressFamily::Ipv4,
                vec![network.uuid, other.uuid],
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, NapiError::InvalidParams { .. }));
    }
}
