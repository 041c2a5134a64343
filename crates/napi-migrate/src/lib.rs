//! Per-bucket schema migration.
//!
//! A [`BucketMigration`] pairs a [`BucketDef`] with the current schema
//! version and a rebuild function; [`run`] walks the bucket forward to
//! that version, resuming safely if interrupted. Migration progress is
//! itself stored as ordinary records in a `napi_migrations` bucket rather
//! than a field bolted onto `BucketDef`, so the migrator needs nothing
//! from `napi-store` beyond the contract every other crate already uses.

use async_trait::async_trait;
use napi_store::{BatchOp, BucketDef, FindOptions, Filter, Precondition, StoreAdapter, StoreError};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

const MIGRATIONS_BUCKET: &str = "napi_migrations";
const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    #[error("store version {store_version} is below {bucket}'s required minimum {min_store_version}")]
    StoreTooOld {
        bucket: String,
        store_version: u32,
        min_store_version: u32,
    },

    #[error("failed to rebuild record {bucket}/{key}: {message}")]
    RebuildFailed { bucket: String, key: String, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One bucket's migration target: the schema it migrates *to*, and how to
/// rebuild a record written under an older schema.
#[async_trait]
pub trait BucketMigration: Send + Sync {
    fn bucket_def(&self) -> &BucketDef;

    /// The schema version records should carry after this migration runs.
    /// Distinct from `bucket_def().version`, which is the *bucket's*
    /// declared version used for `init_bucket`; `schema_version` is the
    /// per-record `v` field this migration brings every record up to.
    fn schema_version(&self) -> u32;

    /// Rewrite one record from whatever schema it was stored under to the
    /// one this migration targets. Implementations typically deserialize
    /// into the old shape (or read ad hoc via `Value` indexing) and
    /// re-serialize via the current model constructor.
    fn rebuild(&self, value: Map<String, Value>) -> Result<Map<String, Value>, MigrateError>;
}

/// Run every migration in `migrations` against `store`, in order
///. `store_version` is the running store's reported
/// version, checked against each bucket's `min_store_version`.
pub async fn run(
    store: &dyn StoreAdapter,
    store_version: u32,
    migrations: &[Box<dyn BucketMigration>],
) -> Result<(), MigrateError> {
    run_with_batch_size(store, store_version, migrations, DEFAULT_BATCH_SIZE).await
}

pub async fn run_with_batch_size(
    store: &dyn StoreAdapter,
    store_version: u32,
    migrations: &[Box<dyn BucketMigration>],
    batch_size: usize,
) -> Result<(), MigrateError> {
    store
        .init_bucket(&BucketDef::new(MIGRATIONS_BUCKET, 1).index("bucket"))
        .await?;

    for migration in migrations {
        migrate_one(store, store_version, migration.as_ref(), batch_size).await?;
    }
    Ok(())
}

async fn migrate_one(
    store: &dyn StoreAdapter,
    store_version: u32,
    migration: &dyn BucketMigration,
    batch_size: usize,
) -> Result<(), MigrateError> {
    let def = migration.bucket_def();

    // Step 1: store-version gate.
    if def.min_store_version > store_version {
        return Err(MigrateError::StoreTooOld {
            bucket: def.name.clone(),
            store_version,
            min_store_version: def.min_store_version,
        });
    }

    // Step 2: (re-)declare the bucket's schema. `init_bucket` is additive
    // and idempotent - calling it on every startup is how "replace schema"
    // is realized here.
    store.init_bucket(def).await?;

    let marker = read_marker(store, &def.name).await?;
    if marker >= migration.schema_version() {
        debug!(bucket = %def.name, version = migration.schema_version(), "bucket already migrated");
        return Ok(());
    }

    // Steps 3-4: stream under-versioned records in bounded batches,
    // rebuilding and writing each back under its read etag. A record
    // without a `v` field at all is treated as schema version 0.
    let under_versioned = Filter::or([
        Filter::not(Filter::present("v")),
        Filter::le("v", json!(migration.schema_version() - 1)),
    ]);

    loop {
        let page = store
            .find(
                &def.name,
                &under_versioned,
                &FindOptions { sort: None, limit: Some(batch_size), offset: None },
            )
            .await?;
        if page.is_empty() {
            break;
        }

        for record in page {
            let mut rebuilt = match migration.rebuild(record.value) {
                Ok(v) => v,
                Err(err) => {
                    warn!(bucket = %def.name, key = %record.key, error = %err, "skipping record that failed to rebuild");
                    continue;
                }
            };
            rebuilt.insert("v".to_string(), json!(migration.schema_version()));

            match store
                .put(&def.name, &record.key, rebuilt, Precondition::Etag(record.etag))
                .await
            {
                Ok(_) => {}
                Err(StoreError::EtagConflict { .. }) => {
                    // Someone else wrote this record concurrently; leave it
                    // for the next run to pick up.
                    debug!(bucket = %def.name, key = %record.key, "etag conflict during migration, deferring");
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    write_marker(store, &def.name, migration.schema_version()).await?;
    Ok(())
}

async fn read_marker(store: &dyn StoreAdapter, bucket: &str) -> Result<u32, MigrateError> {
    match store.get(MIGRATIONS_BUCKET, bucket).await {
        Ok(record) => Ok(record.value.get("migration_version").and_then(Value::as_u64).unwrap_or(0) as u32),
        Err(StoreError::NotFound { .. }) => Ok(0),
        Err(other) => Err(other.into()),
    }
}

async fn write_marker(store: &dyn StoreAdapter, bucket: &str, version: u32) -> Result<(), MigrateError> {
    let value: Map<String, Value> = [
        ("bucket".to_string(), json!(bucket)),
        ("migration_version".to_string(), json!(version)),
    ]
    .into_iter()
    .collect();

    match store.get(MIGRATIONS_BUCKET, bucket).await {
        Ok(existing) => {
            store
                .put(MIGRATIONS_BUCKET, bucket, value, Precondition::Etag(existing.etag))
                .await?;
        }
        Err(StoreError::NotFound { .. }) => {
            store.put(MIGRATIONS_BUCKET, bucket, value, Precondition::Create).await?;
        }
        Err(other) => return Err(other.into()),
    }
    Ok(())
}

/// Build a single-op batch that, applied atomically, reindexes a record
/// under its existing key by re-putting its unchanged value. Used when a
/// migration only adds a new indexed field derived from existing data,
/// not a value rewrite.
pub fn reindex_op(bucket: impl Into<String>, key: impl Into<String>, value: Map<String, Value>, etag: napi_store::Etag) -> BatchOp {
    BatchOp::Put {
        bucket: bucket.into(),
        key: key.into(),
        value,
        precondition: Precondition::Etag(etag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use napi_testing::FakeStore;

    struct WidgetMigration {
        def: BucketDef,
    }

    #[async_trait]
    impl BucketMigration for WidgetMigration {
        fn bucket_def(&self) -> &BucketDef {
            &self.def
        }

        fn schema_version(&self) -> u32 {
            2
        }

        fn rebuild(&self, mut value: Map<String, Value>) -> Result<Map<String, Value>, MigrateError> {
            // v1 -> v2: `label` renamed to `name`.
            if let Some(label) = value.remove("label") {
                value.insert("name".to_string(), label);
            }
            Ok(value)
        }
    }

    #[tokio::test]
    async fn migrates_under_versioned_records_and_writes_marker() {
        let store = FakeStore::new();
        store.init_bucket(&BucketDef::new("widgets", 2).index("v")).await.unwrap();
        let legacy: Map<String, Value> = [("label".to_string(), json!("old-name")), ("v".to_string(), json!(1))]
            .into_iter()
            .collect();
        store.put("widgets", "w1", legacy, Precondition::Create).await.unwrap();

        let migration: Box<dyn BucketMigration> = Box::new(WidgetMigration {
            def: BucketDef::new("widgets", 2).index("v"),
        });
        run(&store, 10, &[migration]).await.unwrap();

        let record = store.get("widgets", "w1").await.unwrap();
        assert_eq!(record.value.get("name"), Some(&json!("old-name")));
        assert_eq!(record.value.get("v"), Some(&json!(2)));
        assert!(record.value.get("label").is_none());
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let store = FakeStore::new();
        store.init_bucket(&BucketDef::new("widgets", 2).index("v")).await.unwrap();
        let legacy: Map<String, Value> = [("label".to_string(), json!("x")), ("v".to_string(), json!(1))]
            .into_iter()
            .collect();
        store.put("widgets", "w1", legacy, Precondition::Create).await.unwrap();

        let def = BucketDef::new("widgets", 2).index("v");
        run(&store, 10, &[Box::new(WidgetMigration { def: def.clone() })]).await.unwrap();
        run(&store, 10, &[Box::new(WidgetMigration { def })]).await.unwrap();

        let record = store.get("widgets", "w1").await.unwrap();
        assert_eq!(record.value.get("v"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn rejects_store_below_minimum_version() {
        let store = FakeStore::new();
        let def = BucketDef::new("widgets", 2).index("v").min_store_version(5);
        let migration: Box<dyn BucketMigration> = Box::new(WidgetMigration { def });
        let err = run(&store, 1, &[migration]).await.unwrap_err();
        assert!(matches!(err, MigrateError::StoreTooOld { .. }));
    }
}
