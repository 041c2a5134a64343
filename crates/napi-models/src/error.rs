use napi_validate::FieldError;

/// Errors a model constructor can raise while checking the invariants
/// attached to its own fields (as opposed to cross-record invariants,
/// which the engine checks against the store).
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },

    #[error("failed to deserialize record: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ModelError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ModelError::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<ModelError> for FieldError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidField { field, message } => FieldError::invalid(field, message),
            ModelError::Malformed(e) => FieldError::invalid("record", e.to_string()),
        }
    }
}
