//! The LDAP-shaped filter tree `find` accepts.
//!
//! Only indexed fields may appear here; a bucket's `BucketDef` declares
//! which fields are indexed and `StoreAdapter` implementations are free to
//! reject (with `StoreError::InvalidQuery`) a filter that references an
//! unindexed one.

use serde_json::Value;

#[derive(Debug, Clone)]
pub enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Eq(String, Value),
    Present(String),
    Ge(String, Value),
    Le(String, Value),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(field.into(), value.into())
    }

    pub fn present(field: impl Into<String>) -> Self {
        Filter::Present(field.into())
    }

    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Ge(field.into(), value.into())
    }

    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Le(field.into(), value.into())
    }

    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::And(filters.into_iter().collect())
    }

    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    pub fn not(filter: Filter) -> Self {
        Filter::Not(Box::new(filter))
    }

    /// Every indexed field name this filter references, used by an adapter
    /// to validate the filter against a bucket's declared index set before
    /// running the query.
    pub fn referenced_fields(&self) -> Vec<&str> {
        match self {
            Filter::And(fs) | Filter::Or(fs) => fs.iter().flat_map(Filter::referenced_fields).collect(),
            Filter::Not(f) => f.referenced_fields(),
            Filter::Eq(field, _) | Filter::Present(field) | Filter::Ge(field, _) | Filter::Le(field, _) => {
                vec![field.as_str()]
            }
        }
    }

    /// Evaluate this filter against an in-memory record, used by
    /// `napi-testing`'s fake store. A Postgres-backed adapter instead
    /// lowers this tree to a `WHERE` clause over indexed columns.
    pub fn matches(&self, record: &serde_json::Map<String, Value>) -> bool {
        match self {
            Filter::And(fs) => fs.iter().all(|f| f.matches(record)),
            Filter::Or(fs) => fs.iter().any(|f| f.matches(record)),
            Filter::Not(f) => !f.matches(record),
            Filter::Eq(field, value) => record.get(field) == Some(value),
            Filter::Present(field) => record.contains_key(field),
            Filter::Ge(field, value) => compare(record.get(field), value, |o| o.is_ge()),
            Filter::Le(field, value) => compare(record.get(field), value, |o| o.is_le()),
        }
    }
}

fn compare(actual: Option<&Value>, bound: &Value, accept: impl Fn(std::cmp::Ordering) -> bool) -> bool {
    let (Some(actual), Some(actual_n), Some(bound_n)) = (actual, actual.and_then(Value::as_f64), bound.as_f64())
    else {
        return false;
    };
    let _ = actual;
    actual_n
        .partial_cmp(&bound_n)
        .map(accept)
        .unwrap_or(false)
}
