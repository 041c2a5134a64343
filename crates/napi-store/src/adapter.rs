use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::etag::Etag;
use crate::filter::Filter;

/// A bucket's indexed-field schema and migration bookkeeping. `version` is the schema version
/// the running binary expects; `migration_version` tracks how far the
/// bucket's *data* has been migrated so the migrator can resume.
#[derive(Debug, Clone)]
pub struct BucketDef {
    pub name: String,
    pub indexed_fields: Vec<String>,
    pub version: u32,
    pub min_store_version: u32,
}

impl BucketDef {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        BucketDef {
            name: name.into(),
            indexed_fields: Vec::new(),
            version,
            min_store_version: 0,
        }
    }

    pub fn index(mut self, field: impl Into<String>) -> Self {
        self.indexed_fields.push(field.into());
        self
    }

    pub fn min_store_version(mut self, v: u32) -> Self {
        self.min_store_version = v;
        self
    }
}

/// `put`'s concurrency precondition: `None` means "create
/// only, fail if the key already exists"; `Some(etag)` means "update only
/// if the stored etag still matches".
#[derive(Debug, Clone)]
pub enum Precondition {
    Create,
    Etag(Etag),
}

#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub sort: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct Record {
    pub key: String,
    pub value: Map<String, Value>,
    pub etag: Etag,
}

/// One operation inside an atomic [`StoreAdapter::batch`] call.
#[derive(Debug, Clone)]
pub enum BatchOp {
    Put {
        bucket: String,
        key: String,
        value: Map<String, Value>,
        precondition: Precondition,
    },
    Delete {
        bucket: String,
        key: String,
        precondition: Option<Etag>,
    },
    UpdateByFilter {
        bucket: String,
        fields: Map<String, Value>,
        filter: Filter,
    },
}

/// The contract exposed to the rest of the core. Every
/// method here is the *only* thing the engine, models, and migrator know
/// about persistence - no component talks to a concrete database type
/// directly.
#[async_trait]
pub trait StoreAdapter: Send + Sync {
    async fn init_bucket(&self, def: &BucketDef) -> Result<(), StoreError>;

    async fn get(&self, bucket: &str, key: &str) -> Result<Record, StoreError>;

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        value: Map<String, Value>,
        precondition: Precondition,
    ) -> Result<Etag, StoreError>;

    async fn delete(&self, bucket: &str, key: &str, precondition: Option<Etag>) -> Result<(), StoreError>;

    async fn find(
        &self,
        bucket: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Record>, StoreError>;

    /// Atomically commit every operation in `ops`, or none of them. Any
    /// single etag conflict fails the whole batch; the returned error's
    /// [`StoreError::conflict_key`] identifies the offending record so the
    /// caller can decide which selection to retry.
    async fn batch(&self, ops: Vec<BatchOp>) -> Result<(), StoreError>;

    /// Return the smallest address `a` such that `min <= a <= max`, `a` is
    /// not a key in `bucket`, and `a - 1` is a key. `None`
    /// means no gap was found in range - the caller falls back to a bounded
    /// range scan.
    async fn gap_search(&self, bucket: &str, min: &str, max: &str) -> Result<Option<String>, StoreError>;
}
