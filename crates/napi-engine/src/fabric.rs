//! Fabric/Vpc/FabricVLAN Create/Get/Delete/List.
//!
//! Fabric and Vpc share the `napi_fabrics` bucket. A
//! `vpc-` key prefix keeps a Vpc's key from colliding with its owner's
//! bare Fabric record.

use napi_models::{Fabric, FabricVlan, FabricVlanScope, Vpc};
use napi_store::{BatchOp, Filter, FindOptions, Precondition, StoreError};
use napi_uuid::{OwnerId, VpcId};
use serde_json::Value;
use tracing::instrument;

use crate::error::NapiError;
use crate::Engine;

pub const FABRICS_BUCKET: &str = "napi_fabrics";
pub const FABRIC_VLANS_BUCKET: &str = "napi_fabric_vlans";

fn vpc_key(id: VpcId) -> String {
    format!("vpc-{id}")
}

fn fabric_value(f: &Fabric) -> Result<serde_json::Map<String, Value>, NapiError> {
    as_object(f)
}

fn vpc_value(v: &Vpc) -> Result<serde_json::Map<String, Value>, NapiError> {
    as_object(v)
}

fn vlan_value(v: &FabricVlan) -> Result<serde_json::Map<String, Value>, NapiError> {
    as_object(v)
}

fn as_object<T: serde::Serialize>(v: &T) -> Result<serde_json::Map<String, Value>, NapiError> {
    match serde_json::to_value(v).map_err(|e| NapiError::Internal { message: e.to_string() })? {
        Value::Object(map) => Ok(map),
        _ => Err(NapiError::Internal { message: "record must serialize to an object".into() }),
    }
}

fn from_value<T: serde::de::DeserializeOwned>(v: &serde_json::Map<String, Value>) -> Result<T, NapiError> {
    serde_json::from_value(Value::Object(v.clone())).map_err(|e| NapiError::Internal { message: e.to_string() })
}

impl Engine {
    #[instrument(skip(self), err)]
    pub async fn create_fabric(&self, owner_uuid: OwnerId, vnet_id: u32) -> Result<Fabric, NapiError> {
        let fabric = Fabric::new(owner_uuid, vnet_id)?;
        let bucket = self.config.bucket(FABRICS_BUCKET);
        self.store
            .put(&bucket, &owner_uuid.to_string(), fabric_value(&fabric)?, Precondition::Create)
            .await
            .map_err(|e| match e {
                StoreError::EtagConflict { .. } => NapiError::InvalidParams {
                    fields: vec![napi_validate::FieldError::duplicate("owner_uuid", "a fabric already exists for this owner")],
                },
                other => other.into(),
            })?;
        Ok(fabric)
    }

    #[instrument(skip(self), err)]
    pub async fn get_fabric(&self, owner_uuid: OwnerId) -> Result<Fabric, NapiError> {
        let bucket = self.config.bucket(FABRICS_BUCKET);
        let record = self.store.get(&bucket, &owner_uuid.to_string()).await?;
        from_value(&record.value)
    }

    #[instrument(skip(self), err)]
    pub async fn delete_fabric(&self, owner_uuid: OwnerId) -> Result<(), NapiError> {
        let bucket = self.config.bucket(FABRICS_BUCKET);
        let record = self.store.get(&bucket, &owner_uuid.to_string()).await?;
        self.store
            .batch(vec![BatchOp::Delete { bucket, key: owner_uuid.to_string(), precondition: Some(record.etag) }])
            .await?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn create_vpc(&self, owner_uuid: OwnerId, ip4_cidr: napi_ip::Subnet) -> Result<Vpc, NapiError> {
        let vpc = Vpc {
            vpc_uuid: napi_uuid::VpcId::new(),
            owner_uuid,
            ip4_cidr,
            allocated: 0,
        };
        let bucket = self.config.bucket(FABRICS_BUCKET);
        self.store
            .put(&bucket, &vpc_key(vpc.vpc_uuid), vpc_value(&vpc)?, Precondition::Create)
            .await?;
        Ok(vpc)
    }

    #[instrument(skip(self), err)]
    pub async fn get_vpc(&self, vpc_uuid: VpcId) -> Result<Vpc, NapiError> {
        let bucket = self.config.bucket(FABRICS_BUCKET);
        let record = self.store.get(&bucket, &vpc_key(vpc_uuid)).await?;
        from_value(&record.value)
    }

    #[instrument(skip(self), err)]
    pub async fn create_fabric_vlan(
        &self,
        scope: FabricVlanScope,
        vlan_id: u16,
        name: String,
        vnet_id: u32,
    ) -> Result<FabricVlan, NapiError> {
        let vlan = FabricVlan::new(scope, vlan_id, name, vnet_id)?;
        let bucket = self.config.bucket(FABRIC_VLANS_BUCKET);
        self.store
            .put(&bucket, &vlan.key(), vlan_value(&vlan)?, Precondition::Create)
            .await
            .map_err(|e| match e {
                StoreError::EtagConflict { .. } => NapiError::InvalidParams {
                    fields: vec![napi_validate::FieldError::duplicate("vlan_id", "a FabricVLAN with this id already exists in scope")],
                },
                other => other.into(),
            })?;
        Ok(vlan)
    }

    #[instrument(skip(self), err)]
    pub async fn get_fabric_vlan(&self, scope: FabricVlanScope, vlan_id: u16) -> Result<FabricVlan, NapiError> {
        let key = match scope {
            FabricVlanScope::Owner(owner) => format!("owner-{owner}-{vlan_id}"),
            FabricVlanScope::Vpc(vpc) => format!("vpc-{vpc}-{vlan_id}"),
        };
        let bucket = self.config.bucket(FABRIC_VLANS_BUCKET);
        let record = self.store.get(&bucket, &key).await?;
        from_value(&record.value)
    }

    #[instrument(skip(self), err)]
    pub async fn delete_fabric_vlan(&self, scope: FabricVlanScope, vlan_id: u16) -> Result<(), NapiError> {
        let vlan = self.get_fabric_vlan(scope, vlan_id).await?;
        let bucket = self.config.bucket(FABRIC_VLANS_BUCKET);
        let record = self.store.get(&bucket, &vlan.key()).await?;
        self.store
            .batch(vec![BatchOp::Delete { bucket, key: vlan.key(), precondition: Some(record.etag) }])
            .await?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn list_fabric_vlans(&self, limit: Option<usize>, offset: Option<usize>) -> Result<Vec<FabricVlan>, NapiError> {
        let bucket = self.config.bucket(FABRIC_VLANS_BUCKET);
        let options = FindOptions { sort: None, limit: Some(self.config.list_limit(limit)), offset };
        let records = self.store.find(&bucket, &Filter::and([]), &options).await?;
        records.iter().map(from_value).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_engine;

    #[tokio::test]
    async fn create_and_get_fabric_round_trips() {
        let engine = test_engine().await;
        let owner = OwnerId::new();
        engine.create_fabric(owner, 42).await.unwrap();
        let fabric = engine.get_fabric(owner).await.unwrap();
        assert_eq!(fabric.vnet_id, 42);
    }

    #[tokio::test]
    async fn duplicate_fabric_for_owner_is_rejected() {
        let engine = test_engine().await;
        let owner = OwnerId::new();
        engine.create_fabric(owner, 42).await.unwrap();
        let err = engine.create_fabric(owner, 43).await.unwrap_err();
        assert!(matches!(err, NapiError::InvalidParams { .. }));
    }

    #[tokio::test]
    async fn fabric_vlan_round_trips_by_scope() {
        let engine = test_engine().await;
        let owner = OwnerId::new();
        engine.create_fabric_vlan(FabricVlanScope::Owner(owner), 20, "prod".to_string(), 7).await.unwrap();
        let vlan = engine.get_fabric_vlan(FabricVlanScope::Owner(owner), 20).await.unwrap();
        assert_eq!(vlan.vnet_id, 7);
    }
}
