//! NicTag Create/Get/Delete/List.

use napi_models::NicTag;
use napi_store::{BatchOp, Filter, FindOptions, Precondition, StoreError};
use serde_json::Value;
use tracing::instrument;

use crate::error::NapiError;
use crate::Engine;

pub const BUCKET: &str = "napi_nic_tags";

fn value(tag: &NicTag) -> Result<serde_json::Map<String, Value>, NapiError> {
    match serde_json::to_value(tag).map_err(|e| NapiError::Internal { message: e.to_string() })? {
        Value::Object(map) => Ok(map),
        _ => Err(NapiError::Internal { message: "NicTag must serialize to an object".into() }),
    }
}

fn from_value(v: &serde_json::Map<String, Value>) -> Result<NicTag, NapiError> {
    serde_json::from_value(Value::Object(v.clone())).map_err(|e| NapiError::Internal { message: e.to_string() })
}

impl Engine {
    #[instrument(skip(self), err)]
    pub async fn create_nic_tag(&self, name: String, mtu: u32) -> Result<NicTag, NapiError> {
        let tag = NicTag::new(name, mtu)?;
        let bucket = self.config.bucket(BUCKET);
        self.store.put(&bucket, &tag.name, value(&tag)?, Precondition::Create).await.map_err(|e| match e {
            StoreError::EtagConflict { .. } => NapiError::InvalidParams {
                fields: vec![napi_validate::FieldError::duplicate("name", "a nic tag with this name already exists")],
            },
            other => other.into(),
        })?;
        Ok(tag)
    }

    #[instrument(skip(self), err)]
    pub async fn get_nic_tag(&self, name: &str) -> Result<NicTag, NapiError> {
        let bucket = self.config.bucket(BUCKET);
        let record = self.store.get(&bucket, name).await?;
        from_value(&record.value)
    }

    #[instrument(skip(self), err)]
    pub async fn list_nic_tags(&self, limit: Option<usize>, offset: Option<usize>) -> Result<Vec<NicTag>, NapiError> {
        let bucket = self.config.bucket(BUCKET);
        let options = FindOptions { sort: None, limit: Some(self.config.list_limit(limit)), offset };
        let records = self.store.find(&bucket, &Filter::and([]), &options).await?;
        records.iter().map(|r| from_value(&r.value)).collect()
    }

    /// Delete is refused if any network still references this tag.
    #[instrument(skip(self), err)]
    pub async fn delete_nic_tag(&self, name: &str) -> Result<(), NapiError> {
        let networks_bucket = self.config.bucket(crate::network::BUCKET);
        let referrers = self
            .store
            .find(&networks_bucket, &Filter::eq("nic_tag", Value::String(name.to_string())), &FindOptions::default())
            .await?;
        if !referrers.is_empty() {
            return Err(NapiError::InUse {
                message: format!("nic tag {name} is referenced by {} network(s)", referrers.len()),
                referrers: referrers.into_iter().map(|r| r.key).collect(),
            });
        }

        let bucket = self.config.bucket(BUCKET);
        let record = self.store.get(&bucket, name).await?;
        self.store
            .batch(vec![BatchOp::Delete { bucket, key: name.to_string(), precondition: Some(record.etag) }])
            .await?;
        Ok(())
    }
}
