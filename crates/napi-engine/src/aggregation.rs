//! Aggregation Create/Get/Update/Delete/List.

use napi_mac::MacAddress;
use napi_models::{Aggregation, BelongsToType, LacpMode};
use napi_store::{BatchOp, Filter, FindOptions, Precondition, StoreError};
use napi_uuid::BelongsToId;
use serde_json::Value;
use tracing::instrument;

use crate::error::NapiError;
use crate::nic::nic_key;
use crate::Engine;

pub const BUCKET: &str = "napi_aggregations";

fn value(agg: &Aggregation) -> Result<serde_json::Map<String, Value>, NapiError> {
    match serde_json::to_value(agg).map_err(|e| NapiError::Internal { message: e.to_string() })? {
        Value::Object(map) => Ok(map),
        _ => Err(NapiError::Internal { message: "Aggregation must serialize to an object".into() }),
    }
}

fn from_value(v: &serde_json::Map<String, Value>) -> Result<Aggregation, NapiError> {
    serde_json::from_value(Value::Object(v.clone())).map_err(|e| NapiError::Internal { message: e.to_string() })
}

impl Engine {
    /// Every MAC in `macs` must already name a NIC belonging to
    /// `belongs_to_uuid` with `belongs_to_type=server`.
    #[instrument(skip(self, macs), err)]
    pub async fn create_aggregation(
        &self,
        belongs_to_uuid: BelongsToId,
        name: String,
        macs: Vec<MacAddress>,
        lacp_mode: LacpMode,
        nic_tags_provided: Vec<String>,
    ) -> Result<Aggregation, NapiError> {
        let nics_bucket = self.config.bucket(crate::nic::BUCKET);
        let mut members = Vec::with_capacity(macs.len());
        for mac in &macs {
            let record = self.store.get(&nics_bucket, &nic_key(*mac)).await?;
            let nic: napi_models::Nic = serde_json::from_value(Value::Object(record.value))
                .map_err(|e| NapiError::Internal { message: e.to_string() })?;
            members.push((nic.belongs_to_uuid, nic.belongs_to_type));
        }

        let agg = Aggregation::create(belongs_to_uuid, name, macs, &members, lacp_mode, nic_tags_provided)?;

        let bucket = self.config.bucket(BUCKET);
        self.store
            .put(&bucket, &agg.id(), value(&agg)?, Precondition::Create)
            .await
            .map_err(|e| match e {
                StoreError::EtagConflict { .. } => NapiError::InvalidParams {
                    fields: vec![napi_validate::FieldError::duplicate("name", "an aggregation with this name already exists for this belongs_to_uuid")],
                },
                other => other.into(),
            })?;
        Ok(agg)
    }

    #[instrument(skip(self), err)]
    pub async fn get_aggregation(&self, belongs_to_uuid: BelongsToId, name: &str) -> Result<Aggregation, NapiError> {
        let bucket = self.config.bucket(BUCKET);
        let key = format!("{belongs_to_uuid}-{name}");
        let record = self.store.get(&bucket, &key).await?;
        from_value(&record.value)
    }

    #[instrument(skip(self), err)]
    pub async fn list_aggregations_for(&self, belongs_to_uuid: BelongsToId, limit: Option<usize>, offset: Option<usize>) -> Result<Vec<Aggregation>, NapiError> {
        let bucket = self.config.bucket(BUCKET);
        let filter = Filter::eq("belongs_to_uuid", serde_json::json!(belongs_to_uuid.to_string()));
        let options = FindOptions { sort: None, limit: Some(self.config.list_limit(limit)), offset };
        let records = self.store.find(&bucket, &filter, &options).await?;
        records.iter().map(|r| from_value(&r.value)).collect()
    }

    #[instrument(skip(self), err)]
    pub async fn delete_aggregation(&self, belongs_to_uuid: BelongsToId, name: &str) -> Result<(), NapiError> {
        let bucket = self.config.bucket(BUCKET);
        let key = format!("{belongs_to_uuid}-{name}");
        let record = self.store.get(&bucket, &key).await?;
        self.store
            .batch(vec![BatchOp::Delete { bucket, key, precondition: Some(record.etag) }])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_engine;
    use napi_models::{CapabilityFlags, NewNic};

    #[tokio::test]
    async fn create_aggregation_round_trips() {
        let engine = test_engine().await;
        let belongs_to = BelongsToId::new();
        let mac: MacAddress = "aa:bb:cc:00:00:01".parse().unwrap();
        let nic = napi_models::Nic::create(NewNic {
            mac,
            owner_uuid: napi_uuid::admin_owner(),
            belongs_to_uuid: belongs_to,
            belongs_to_type: BelongsToType::Server,
            primary: false,
            ip: None,
            capabilities: CapabilityFlags::default(),
            model: None,
            cn_uuid: None,
            nic_tags_provided: vec![],
            ip_is_on_fabric_network: false,
        })
        .unwrap();
        let nics_bucket = engine.config.bucket(crate::nic::BUCKET);
        engine
            .store
            .put(&nics_bucket, &nic_key(mac), crate::nic::nic_value(&nic).unwrap(), Precondition::Create)
            .await
            .unwrap();

        let agg = engine
            .create_aggregation(belongs_to, "aggr0".to_string(), vec![mac], LacpMode::Active, vec![])
            .await
            .unwrap();
        let fetched = engine.get_aggregation(belongs_to, "aggr0").await.unwrap();
        assert_eq!(fetched.id(), agg.id());
    }

    #[tokio::test]
    async fn rejects_mac_belonging_to_a_different_server() {
        let engine = test_engine().await;
        let belongs_to = BelongsToId::new();
        let other = BelongsToId::new();
        let mac: MacAddress = "aa:bb:cc:00:00:02".parse().unwrap();
        let nic = napi_models::Nic::create(NewNic {
            mac,
            owner_uuid: napi_uuid::admin_owner(),
            belongs_to_uuid: other,
            belongs_to_type: BelongsToType::Server,
            primary: false,
            ip: None,
            capabilities: CapabilityFlags::default(),
            model: None,
            cn_uuid: None,
            nic_tags_provided: vec![],
            ip_is_on_fabric_network: false,
        })
        .unwrap();
        let nics_bucket = engine.config.bucket(crate::nic::BUCKET);
        engine
            .store
            .put(&nics_bucket, &nic_key(mac), crate::nic::nic_value(&nic).unwrap(), Precondition::Create)
            .await
            .unwrap();

        let err = engine
            .create_aggregation(belongs_to, "aggr0".to_string(), vec![mac], LacpMode::Active, vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, NapiError::InvalidParams { .. }));
    }
}
