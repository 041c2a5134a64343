//! An in-memory [`StoreAdapter`] fake.
//!
//! Gives every test its own isolated, disposable store - but since this
//! workspace's only commitment is the store *contract*, an in-process
//! fake is more faithful to that contract than spinning up a real
//! Postgres instance per test, and lets the engine's retry/allocation
//! logic run deterministically and fast.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use napi_store::{BatchOp, BucketDef, Etag, FindOptions, Filter, Precondition, Record, StoreAdapter, StoreError};
use serde_json::{Map, Value};

struct Bucket {
    def: BucketDef,
    rows: BTreeMap<String, (Map<String, Value>, Etag)>,
}

pub struct FakeStore {
    buckets: Mutex<BTreeMap<String, Bucket>>,
}

impl FakeStore {
    pub fn new() -> Self {
        FakeStore {
            buckets: Mutex::new(BTreeMap::new()),
        }
    }

    /// Read the bucket contents directly, bypassing `find`'s index
    /// requirement - useful for asserting on overlay/shootdown buckets in
    /// tests without declaring every field indexed.
    pub fn dump(&self, bucket: &str) -> Vec<(String, Map<String, Value>)> {
        let buckets = self.buckets.lock().expect("fake store lock poisoned");
        buckets
            .get(bucket)
            .map(|b| b.rows.iter().map(|(k, (v, _))| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }
}

impl Default for FakeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreAdapter for FakeStore {
    async fn init_bucket(&self, def: &BucketDef) -> Result<(), StoreError> {
        let mut buckets = self.buckets.lock().expect("fake store lock poisoned");
        buckets.entry(def.name.clone()).or_insert_with(|| Bucket {
            def: def.clone(),
            rows: BTreeMap::new(),
        });
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Record, StoreError> {
        let buckets = self.buckets.lock().expect("fake store lock poisoned");
        let b = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::BucketNotFound { bucket: bucket.to_string() })?;
        let (value, etag) = b.rows.get(key).ok_or_else(|| StoreError::NotFound {
            bucket: bucket.to_string(),
            key: Some(key.to_string()),
        })?;
        Ok(Record {
            key: key.to_string(),
            value: value.clone(),
            etag: *etag,
        })
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        value: Map<String, Value>,
        precondition: Precondition,
    ) -> Result<Etag, StoreError> {
        let mut buckets = self.buckets.lock().expect("fake store lock poisoned");
        let b = buckets
            .entry(bucket.to_string())
            .or_insert_with(|| Bucket { def: BucketDef::new(bucket, 1), rows: BTreeMap::new() });
        apply_put(b, key, value, precondition)
    }

    async fn delete(&self, bucket: &str, key: &str, precondition: Option<Etag>) -> Result<(), StoreError> {
        let mut buckets = self.buckets.lock().expect("fake store lock poisoned");
        let b = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::BucketNotFound { bucket: bucket.to_string() })?;
        apply_delete(b, key, precondition)
    }

    async fn find(&self, bucket: &str, filter: &Filter, options: &FindOptions) -> Result<Vec<Record>, StoreError> {
        let buckets = self.buckets.lock().expect("fake store lock poisoned");
        let b = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::BucketNotFound { bucket: bucket.to_string() })?;
        for field in filter.referenced_fields() {
            if !b.def.indexed_fields.iter().any(|f| f == field) {
                return Err(StoreError::InvalidQuery {
                    bucket: bucket.to_string(),
                    message: format!("field {field} is not indexed"),
                });
            }
        }

        let mut matched: Vec<Record> = b
            .rows
            .iter()
            .filter(|(_, (value, _))| filter.matches(value))
            .map(|(key, (value, etag))| Record {
                key: key.clone(),
                value: value.clone(),
                etag: *etag,
            })
            .collect();

        if let Some(sort_field) = &options.sort {
            matched.sort_by(|a, b| {
                let av = a.value.get(sort_field).and_then(Value::as_f64).unwrap_or(0.0);
                let bv = b.value.get(sort_field).and_then(Value::as_f64).unwrap_or(0.0);
                av.partial_cmp(&bv).unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        let offset = options.offset.unwrap_or(0);
        let matched: Vec<Record> = matched.into_iter().skip(offset).collect();
        let matched = match options.limit {
            Some(limit) => matched.into_iter().take(limit).collect(),
            None => matched,
        };
        Ok(matched)
    }

    async fn batch(&self, ops: Vec<BatchOp>) -> Result<(), StoreError> {
        let mut buckets = self.buckets.lock().expect("fake store lock poisoned");
        // Snapshot every touched bucket so a mid-batch failure leaves no
        // partial effect visible.
        let touched: Vec<String> = ops
            .iter()
            .map(|op| match op {
                BatchOp::Put { bucket, .. } => bucket.clone(),
                BatchOp::Delete { bucket, .. } => bucket.clone(),
                BatchOp::UpdateByFilter { bucket, .. } => bucket.clone(),
            })
            .collect();
        let snapshot: BTreeMap<String, Bucket> = touched
            .iter()
            .filter_map(|name| buckets.get(name).map(|b| (name.clone(), Bucket { def: b.def.clone(), rows: b.rows.clone() })))
            .collect();

        let result = (|| {
            for op in ops {
                match op {
                    BatchOp::Put { bucket, key, value, precondition } => {
                        let b = buckets
                            .entry(bucket.clone())
                            .or_insert_with(|| Bucket { def: BucketDef::new(&bucket, 1), rows: BTreeMap::new() });
                        apply_put(b, &key, value, precondition)?;
                    }
                    BatchOp::Delete { bucket, key, precondition } => {
                        let b = buckets
                            .get_mut(&bucket)
                            .ok_or_else(|| StoreError::BucketNotFound { bucket: bucket.clone() })?;
                        apply_delete(b, &key, precondition)?;
                    }
                    BatchOp::UpdateByFilter { bucket, fields, filter } => {
                        let b = buckets
                            .get_mut(&bucket)
                            .ok_or_else(|| StoreError::BucketNotFound { bucket: bucket.clone() })?;
                        for (_, (value, etag)) in b.rows.iter_mut() {
                            if filter.matches(value) {
                                value.extend(fields.clone());
                                *etag = etag.next();
                            }
                        }
                    }
                }
            }
            Ok(())
        })();

        if result.is_err() {
            for (name, bucket) in snapshot {
                buckets.insert(name, bucket);
            }
        }
        result
    }

    async fn gap_search(&self, bucket: &str, min: &str, max: &str) -> Result<Option<String>, StoreError> {
        let buckets = self.buckets.lock().expect("fake store lock poisoned");
        let b = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::BucketNotFound { bucket: bucket.to_string() })?;
        let lo: i128 = min.parse().map_err(|_| StoreError::InvalidQuery {
            bucket: bucket.to_string(),
            message: "gap_search bounds must be numeric".to_string(),
        })?;
        let hi: i128 = max.parse().map_err(|_| StoreError::InvalidQuery {
            bucket: bucket.to_string(),
            message: "gap_search bounds must be numeric".to_string(),
        })?;

        let occupied = |n: i128| b.rows.contains_key(&n.to_string());

        // First gap: either `lo` itself if free, or the first free slot
        // immediately after a run of occupied addresses starting at `lo`
        //.
        if !occupied(lo) {
            return Ok(Some(lo.to_string()));
        }
        let mut candidate = lo + 1;
        while candidate <= hi {
            if !occupied(candidate) {
                return Ok(Some(candidate.to_string()));
            }
            candidate += 1;
        }
        Ok(None)
    }
}

fn apply_put(
    b: &mut Bucket,
    key: &str,
    value: Map<String, Value>,
    precondition: Precondition,
) -> Result<Etag, StoreError> {
    match precondition {
        Precondition::Create => {
            if b.rows.contains_key(key) {
                return Err(StoreError::EtagConflict {
                    bucket: b.def.name.clone(),
                    key: key.to_string(),
                });
            }
            let etag = Etag::initial();
            b.rows.insert(key.to_string(), (value, etag));
            Ok(etag)
        }
        Precondition::Etag(expected) => {
            let current = b.rows.get(key).ok_or_else(|| StoreError::NotFound {
                bucket: b.def.name.clone(),
                key: Some(key.to_string()),
            })?;
            if current.1 != expected {
                return Err(StoreError::EtagConflict {
                    bucket: b.def.name.clone(),
                    key: key.to_string(),
                });
            }
            let next = current.1.next();
            b.rows.insert(key.to_string(), (value, next));
            Ok(next)
        }
    }
}

fn apply_delete(b: &mut Bucket, key: &str, precondition: Option<Etag>) -> Result<(), StoreError> {
    if let Some(expected) = precondition {
        let current = b.rows.get(key).ok_or_else(|| StoreError::NotFound {
            bucket: b.def.name.clone(),
            key: Some(key.to_string()),
        })?;
        if current.1 != expected {
            return Err(StoreError::EtagConflict {
                bucket: b.def.name.clone(),
                key: key.to_string(),
            });
        }
    }
    b.rows
        .remove(key)
        .map(|_| ())
        .ok_or_else(|| StoreError::NotFound {
            bucket: b.def.name.clone(),
            key: Some(key.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[tokio::test]
    async fn put_with_create_precondition_rejects_existing_key() {
        let store = FakeStore::new();
        store.init_bucket(&BucketDef::new("nics", 1)).await.unwrap();
        store
            .put("nics", "a", obj(&[("mac", json!(1))]), Precondition::Create)
            .await
            .unwrap();
        let err = store
            .put("nics", "a", obj(&[("mac", json!(1))]), Precondition::Create)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::EtagConflict { .. }));
    }

    #[tokio::test]
    async fn put_with_stale_etag_conflicts() {
        let store = FakeStore::new();
        store.init_bucket(&BucketDef::new("nics", 1)).await.unwrap();
        let etag = store
            .put("nics", "a", obj(&[("mac", json!(1))]), Precondition::Create)
            .await
            .unwrap();
        store
            .put("nics", "a", obj(&[("mac", json!(2))]), Precondition::Etag(etag))
            .await
            .unwrap();
        let err = store
            .put("nics", "a", obj(&[("mac", json!(3))]), Precondition::Etag(etag))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::EtagConflict { .. }));
    }

    #[tokio::test]
    async fn batch_rolls_back_entirely_on_conflict() {
        let store = FakeStore::new();
        store
            .init_bucket(&BucketDef::new("ips", 1).index("owner"))
            .await
            .unwrap();
        store
            .put("ips", "10", obj(&[("owner", json!("a"))]), Precondition::Create)
            .await
            .unwrap();

        let ops = vec![
            BatchOp::Put {
                bucket: "ips".to_string(),
                key: "11".to_string(),
                value: obj(&[("owner", json!("b"))]),
                precondition: Precondition::Create,
            },
            BatchOp::Put {
                bucket: "ips".to_string(),
                key: "10".to_string(),
                value: obj(&[("owner", json!("c"))]),
                precondition: Precondition::Create,
            },
        ];
        let err = store.batch(ops).await.unwrap_err();
        assert!(matches!(err, StoreError::EtagConflict { .. }));

        // `11` must not have been committed even though its own Put
        // succeeded in isolation - the whole batch failed.
        let err = store.get("ips", "11").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn gap_search_finds_first_free_address_in_range() {
        let store = FakeStore::new();
        store.init_bucket(&BucketDef::new("ips", 1)).await.unwrap();
        for n in 38..40 {
            store
                .put("ips", &n.to_string(), obj(&[]), Precondition::Create)
                .await
                .unwrap();
        }
        let gap = store.gap_search("ips", "38", "253").await.unwrap();
        assert_eq!(gap, Some("40".to_string()));
    }

    #[tokio::test]
    async fn gap_search_returns_start_when_wholly_free() {
        let store = FakeStore::new();
        store.init_bucket(&BucketDef::new("ips", 1)).await.unwrap();
        let gap = store.gap_search("ips", "38", "253").await.unwrap();
        assert_eq!(gap, Some("38".to_string()));
    }

    #[tokio::test]
    async fn find_rejects_unindexed_fields() {
        let store = FakeStore::new();
        store.init_bucket(&BucketDef::new("nics", 1)).await.unwrap();
        let err = store
            .find("nics", &Filter::eq("owner_uuid", json!("x")), &FindOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidQuery { .. }));
    }
}
