//! The outer error taxonomy that every `Engine` operation
//! returns. Inner crates keep their own narrower enums
//! (`napi_store::StoreError`, `napi_validate::ValidationError`); this
//! type folds them into a single service-facing error.

use napi_models::ModelError;
use napi_store::StoreError;
use napi_validate::{FieldError, ValidationError};

#[derive(Debug, Clone, thiserror::Error)]
pub enum NapiError {
    /// Field-level validation failure.
    #[error("invalid parameters")]
    InvalidParams { fields: Vec<FieldError> },

    #[error("{bucket}/{key:?} not found")]
    NotFound { bucket: String, key: Option<String> },

    /// Delete refused because of a live reference.
    #[error("in use: {message}")]
    InUse { message: String, referrers: Vec<String> },

    #[error("no address available in the target network")]
    SubnetFull,

    #[error("all networks in the pool/intersection are full")]
    PoolFull,

    /// Retry budget exhausted, or the store is transiently unreachable.
    /// `EtagConflict` itself is never surfaced past this point - see
    /// `classify_conflict`.
    #[error("unavailable: {message}")]
    Unavailable { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl NapiError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        NapiError::InvalidParams { fields: vec![FieldError::invalid(field, message)] }
    }

    pub fn used_by(field: impl Into<String>, message: impl Into<String>, extra: serde_json::Value) -> Self {
        NapiError::InvalidParams { fields: vec![FieldError::used_by(field, message).with_extra(extra)] }
    }
}

impl From<ModelError> for NapiError {
    fn from(err: ModelError) -> Self {
        NapiError::InvalidParams { fields: vec![FieldError::from(err)] }
    }
}

impl From<ValidationError> for NapiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidParams { fields } => NapiError::InvalidParams { fields },
        }
    }
}

/// Fold a `StoreError` that was *not* an `EtagConflict` (those are
/// consumed by a caller's retry loop - see `ip_allocator`/`nic`) into the
/// outer taxonomy. The engine never leaks partial state: any store
/// failure reaching this point is either a genuine not-found or a
/// transient unavailability, never a conflict the caller should see raw.
impl From<StoreError> for NapiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { bucket, key } => NapiError::NotFound { bucket, key },
            StoreError::BucketNotFound { bucket } => NapiError::NotFound { bucket, key: None },
            StoreError::EtagConflict { bucket, key } => {
                NapiError::Unavailable { message: format!("unresolved conflict on {bucket}/{key}") }
            }
            StoreError::Unavailable { message } => NapiError::Unavailable { message },
            StoreError::InvalidQuery { bucket, message } => {
                NapiError::Internal { message: format!("invalid query against {bucket}: {message}") }
            }
        }
    }
}
