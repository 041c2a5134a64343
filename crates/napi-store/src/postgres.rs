//! A Postgres-backed [`StoreAdapter`], built on `sqlx` against Postgres
//! rather than a purpose-built document-store client. Each bucket is one
//! table
//! `{key TEXT PRIMARY KEY, value JSONB, etag TEXT}` plus a `GENERATED
//! ALWAYS AS` column per declared indexed field, so `find`'s filter tree
//! can be pushed down as a normal `WHERE` clause instead of scanning JSONB.

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::{Map, Value};
use sqlx::{PgPool, Row};

use crate::adapter::{BatchOp, BucketDef, FindOptions, Precondition, Record, StoreAdapter};
use crate::error::StoreError;
use crate::etag::Etag;
use crate::filter::Filter;

pub struct PostgresStore {
    pool: PgPool,
    buckets: RwLock<HashMap<String, BucketDef>>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        PostgresStore {
            pool,
            buckets: RwLock::new(HashMap::new()),
        }
    }

    fn table_name(bucket: &str) -> String {
        format!("napi_bucket_{bucket}")
    }

    fn column_name(field: &str) -> String {
        format!("idx_{field}")
    }

    fn require_indexed(&self, bucket: &str, filter: &Filter) -> Result<(), StoreError> {
        let buckets = self.buckets.read().expect("bucket registry lock poisoned");
        let def = buckets
            .get(bucket)
            .ok_or_else(|| StoreError::BucketNotFound { bucket: bucket.to_string() })?;
        for field in filter.referenced_fields() {
            if !def.indexed_fields.iter().any(|f| f == field) {
                return Err(StoreError::InvalidQuery {
                    bucket: bucket.to_string(),
                    message: format!("field {field} is not indexed"),
                });
            }
        }
        Ok(())
    }

    fn lower_filter(filter: &Filter, args: &mut Vec<Value>) -> String {
        match filter {
            Filter::And(fs) => {
                if fs.is_empty() {
                    return "TRUE".to_string();
                }
                let parts: Vec<_> = fs.iter().map(|f| Self::lower_filter(f, args)).collect();
                format!("({})", parts.join(" AND "))
            }
            Filter::Or(fs) => {
                if fs.is_empty() {
                    return "FALSE".to_string();
                }
                let parts: Vec<_> = fs.iter().map(|f| Self::lower_filter(f, args)).collect();
                format!("({})", parts.join(" OR "))
            }
            Filter::Not(f) => format!("NOT ({})", Self::lower_filter(f, args)),
            Filter::Eq(field, value) => {
                args.push(value.clone());
                format!("{} = ${}::jsonb", Self::column_name(field), args.len())
            }
            Filter::Present(field) => format!("{} IS NOT NULL", Self::column_name(field)),
            Filter::Ge(field, value) => {
                args.push(value.clone());
                format!("{} >= ${}::jsonb", Self::column_name(field), args.len())
            }
            Filter::Le(field, value) => {
                args.push(value.clone());
                format!("{} <= ${}::jsonb", Self::column_name(field), args.len())
            }
        }
    }
}

#[async_trait::async_trait]
impl StoreAdapter for PostgresStore {
    async fn init_bucket(&self, def: &BucketDef) -> Result<(), StoreError> {
        let table = Self::table_name(&def.name);
        let mut columns = vec![
            "key TEXT PRIMARY KEY".to_string(),
            "value JSONB NOT NULL".to_string(),
            "etag TEXT NOT NULL".to_string(),
        ];
        for field in &def.indexed_fields {
            columns.push(format!(
                "{} JSONB GENERATED ALWAYS AS (value -> '{}') STORED",
                Self::column_name(field),
                field
            ));
        }
        let create = format!("CREATE TABLE IF NOT EXISTS {table} ({})", columns.join(", "));
        sqlx::query(&create)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable { message: e.to_string() })?;

        for field in &def.indexed_fields {
            let index = format!(
                "CREATE INDEX IF NOT EXISTS {table}_{field}_idx ON {table} ({})",
                Self::column_name(field)
            );
            sqlx::query(&index)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Unavailable { message: e.to_string() })?;
        }

        self.buckets
            .write()
            .expect("bucket registry lock poisoned")
            .insert(def.name.clone(), def.clone());
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Record, StoreError> {
        let table = Self::table_name(bucket);
        let row = sqlx::query(&format!("SELECT key, value, etag FROM {table} WHERE key = $1"))
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable { message: e.to_string() })?
            .ok_or_else(|| StoreError::NotFound {
                bucket: bucket.to_string(),
                key: Some(key.to_string()),
            })?;

        let value: Value = row.try_get("value").map_err(|e| StoreError::Unavailable { message: e.to_string() })?;
        let etag: String = row.try_get("etag").map_err(|e| StoreError::Unavailable { message: e.to_string() })?;
        Ok(Record {
            key: key.to_string(),
            value: value.as_object().cloned().unwrap_or_default(),
            etag: etag.parse().map_err(|_| StoreError::Unavailable {
                message: "corrupt etag in store".to_string(),
            })?,
        })
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        value: Map<String, Value>,
        precondition: Precondition,
    ) -> Result<Etag, StoreError> {
        let table = Self::table_name(bucket);
        let new_etag = Etag::initial();
        let value = Value::Object(value);

        let affected = match precondition {
            Precondition::Create => {
                sqlx::query(&format!(
                    "INSERT INTO {table} (key, value, etag) VALUES ($1, $2, $3) ON CONFLICT (key) DO NOTHING"
                ))
                .bind(key)
                .bind(&value)
                .bind(new_etag.to_string())
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Unavailable { message: e.to_string() })?
                .rows_affected()
            }
            Precondition::Etag(expected) => {
                sqlx::query(&format!(
                    "UPDATE {table} SET value = $2, etag = $3 WHERE key = $1 AND etag = $4"
                ))
                .bind(key)
                .bind(&value)
                .bind(new_etag.to_string())
                .bind(expected.to_string())
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::Unavailable { message: e.to_string() })?
                .rows_affected()
            }
        };

        if affected == 0 {
            return Err(StoreError::EtagConflict {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        Ok(new_etag)
    }

    async fn delete(&self, bucket: &str, key: &str, precondition: Option<Etag>) -> Result<(), StoreError> {
        let table = Self::table_name(bucket);
        let affected = match precondition {
            Some(etag) => sqlx::query(&format!("DELETE FROM {table} WHERE key = $1 AND etag = $2"))
                .bind(key)
                .bind(etag.to_string())
                .execute(&self.pool)
                .await,
            None => sqlx::query(&format!("DELETE FROM {table} WHERE key = $1"))
                .bind(key)
                .execute(&self.pool)
                .await,
        }
        .map_err(|e| StoreError::Unavailable { message: e.to_string() })?
        .rows_affected();

        if affected == 0 {
            return Err(StoreError::NotFound {
                bucket: bucket.to_string(),
                key: Some(key.to_string()),
            });
        }
        Ok(())
    }

    async fn find(&self, bucket: &str, filter: &Filter, options: &FindOptions) -> Result<Vec<Record>, StoreError> {
        self.require_indexed(bucket, filter)?;
        let table = Self::table_name(bucket);
        let mut args = Vec::new();
        let where_clause = Self::lower_filter(filter, &mut args);

        let mut sql = format!("SELECT key, value, etag FROM {table} WHERE {where_clause}");
        if let Some(sort) = &options.sort {
            sql.push_str(&format!(" ORDER BY {}", Self::column_name(sort)));
        }
        if let Some(limit) = options.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = options.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        let mut query = sqlx::query(&sql);
        for arg in &args {
            query = query.bind(arg);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Unavailable { message: e.to_string() })?;

        rows.into_iter()
            .map(|row| {
                let key: String = row.try_get("key").map_err(|e| StoreError::Unavailable { message: e.to_string() })?;
                let value: Value = row.try_get("value").map_err(|e| StoreError::Unavailable { message: e.to_string() })?;
                let etag: String = row.try_get("etag").map_err(|e| StoreError::Unavailable { message: e.to_string() })?;
                Ok(Record {
                    key,
                    value: value.as_object().cloned().unwrap_or_default(),
                    etag: etag.parse().map_err(|_| StoreError::Unavailable {
                        message: "corrupt etag in store".to_string(),
                    })?,
                })
            })
            .collect()
    }

    async fn batch(&self, ops: Vec<BatchOp>) -> Result<(), StoreError> {
        let mut txn = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Unavailable { message: e.to_string() })?;

        for op in ops {
            match op {
                BatchOp::Put { bucket, key, value, precondition } => {
                    let table = Self::table_name(&bucket);
                    let new_etag = Etag::initial();
                    let value = Value::Object(value);
                    let affected = match precondition {
                        Precondition::Create => {
                            sqlx::query(&format!(
                                "INSERT INTO {table} (key, value, etag) VALUES ($1, $2, $3) ON CONFLICT (key) DO NOTHING"
                            ))
                            .bind(&key)
                            .bind(&value)
                            .bind(new_etag.to_string())
                            .execute(&mut *txn)
                            .await
                        }
                        Precondition::Etag(expected) => {
                            sqlx::query(&format!(
                                "UPDATE {table} SET value = $2, etag = $3 WHERE key = $1 AND etag = $4"
                            ))
                            .bind(&key)
                            .bind(&value)
                            .bind(new_etag.to_string())
                            .bind(expected.to_string())
                            .execute(&mut *txn)
                            .await
                        }
                    }
                    .map_err(|e| StoreError::Unavailable { message: e.to_string() })?
                    .rows_affected();

                    if affected == 0 {
                        return Err(StoreError::EtagConflict { bucket, key });
                    }
                }
                BatchOp::Delete { bucket, key, precondition } => {
                    let table = Self::table_name(&bucket);
                    let affected = match precondition {
                        Some(etag) => {
                            sqlx::query(&format!("DELETE FROM {table} WHERE key = $1 AND etag = $2"))
                                .bind(&key)
                                .bind(etag.to_string())
                                .execute(&mut *txn)
                                .await
                        }
                        None => sqlx::query(&format!("DELETE FROM {table} WHERE key = $1"))
                            .bind(&key)
                            .execute(&mut *txn)
                            .await,
                    }
                    .map_err(|e| StoreError::Unavailable { message: e.to_string() })?
                    .rows_affected();

                    if affected == 0 {
                        return Err(StoreError::EtagConflict { bucket, key });
                    }
                }
                BatchOp::UpdateByFilter { bucket, fields, filter } => {
                    self.require_indexed(&bucket, &filter)?;
                    let table = Self::table_name(&bucket);
                    let mut args = Vec::new();
                    let where_clause = Self::lower_filter(&filter, &mut args);
                    let set_clause = "value = value || $1::jsonb";
                    let sql = format!(
                        "UPDATE {table} SET {set_clause} WHERE {}",
                        where_clause.replace("$1", "$__placeholder__")
                    );
                    // Re-number bound params after the leading $1 reserved for `fields`.
                    let mut renumbered = sql;
                    for (i, _) in args.iter().enumerate().rev() {
                        renumbered = renumbered.replace(&format!("${}::jsonb", i + 1), &format!("${}::jsonb", i + 2));
                    }
                    renumbered = renumbered.replace("$__placeholder__", "$1");

                    let mut query = sqlx::query(&renumbered).bind(Value::Object(fields));
                    for arg in &args {
                        query = query.bind(arg);
                    }
                    query
                        .execute(&mut *txn)
                        .await
                        .map_err(|e| StoreError::Unavailable { message: e.to_string() })?;
                }
            }
        }

        txn.commit()
            .await
            .map_err(|e| StoreError::Unavailable { message: e.to_string() })?;
        Ok(())
    }

    async fn gap_search(&self, bucket: &str, min: &str, max: &str) -> Result<Option<String>, StoreError> {
        // Treat keys as numeric (they are, for both legacy numeric IP keys
        // and the v2 dotted/colon-form keys cast through the bucket's
        // address-ordinal column) and find the smallest `a` in `[min, max]`
        // absent from the table whose predecessor `a-1` is present - i.e.
        // the first hole immediately after a run of occupied addresses.
        let table = Self::table_name(bucket);
        let row = sqlx::query(&format!(
            "WITH bounds AS (SELECT $1::numeric AS lo, $2::numeric AS hi), \
             candidates AS ( \
               SELECT (lo + 1) AS candidate FROM bounds \
               WHERE EXISTS (SELECT 1 FROM {table} WHERE key::numeric = (SELECT lo FROM bounds)) \
               UNION ALL \
               SELECT lo AS candidate FROM bounds \
               WHERE NOT EXISTS (SELECT 1 FROM {table} WHERE key::numeric = (SELECT lo FROM bounds)) \
             ) \
             SELECT candidate::text AS candidate FROM candidates \
             WHERE candidate <= (SELECT hi FROM bounds) \
               AND NOT EXISTS (SELECT 1 FROM {table} t WHERE t.key::numeric = candidates.candidate) \
             LIMIT 1"
        ))
        .bind(min)
        .bind(max)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable { message: e.to_string() })?;

        match row {
            Some(row) => {
                let candidate: String = row.try_get("candidate").map_err(|e| StoreError::Unavailable { message: e.to_string() })?;
                Ok(Some(candidate))
            }
            None => Ok(None),
        }
    }
}
