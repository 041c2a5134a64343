use serde::Serialize;

/// The classified failure kinds a `StoreAdapter` surfaces.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
pub enum StoreError {
    #[error("{bucket}/{key:?} not found")]
    NotFound { bucket: String, key: Option<String> },

    #[error("etag conflict on {bucket}/{key}")]
    EtagConflict { bucket: String, key: String },

    #[error("bucket {bucket} does not exist")]
    BucketNotFound { bucket: String },

    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    #[error("invalid query against {bucket}: {message}")]
    InvalidQuery { bucket: String, message: String },
}

impl StoreError {
    pub fn bucket(&self) -> &str {
        match self {
            StoreError::NotFound { bucket, .. }
            | StoreError::EtagConflict { bucket, .. }
            | StoreError::BucketNotFound { bucket }
            | StoreError::InvalidQuery { bucket, .. } => bucket,
            StoreError::Unavailable { .. } => "",
        }
    }

    /// The `{bucket, key}` pair a batch conflict is classified by, used by the engine's retry loop to decide which selection to
    /// retry.
    pub fn conflict_key(&self) -> Option<(&str, &str)> {
        match self {
            StoreError::EtagConflict { bucket, key } => Some((bucket, key)),
            _ => None,
        }
    }
}
