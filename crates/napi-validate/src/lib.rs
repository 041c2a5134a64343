//! The field-error vocabulary every validation failure in this workspace
//! is expressed in.
//!
//! Each operation's input is a typed record (`NewNetwork`, `NewNic`, ...),
//! not a raw field-name/value bag, so the checks against it live directly
//! on the record's own constructor (`Network::create`, `Nic::create`, ...)
//! rather than behind a separate schema-description layer: a
//! `network_uuid` field, say, is already a `NetworkId` by the time a
//! constructor sees it, so there is nothing left for a generic validator
//! to parse or resolve. What every one of those constructors needs is a
//! shared, sortable error shape to report through - that shape is this
//! crate.

use serde_json::Value;

/// The taxonomy `code` attached to each field error.
#[derive(Debug, Clone, Copy, Eq, PartialEq, serde::Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum ErrorCode {
    Missing,
    Invalid,
    Duplicate,
    UsedBy,
    InUse,
}

/// One field-level validation failure.
#[derive(Debug, Clone, serde::Serialize)]
pub struct FieldError {
    pub field: String,
    pub code: ErrorCode,
    pub message: String,
    pub extra: Option<Value>,
}

impl FieldError {
    pub fn missing(field: impl Into<String>) -> Self {
        let field = field.into();
        FieldError {
            message: format!("{field} is required"),
            field,
            code: ErrorCode::Missing,
            extra: None,
        }
    }

    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            code: ErrorCode::Invalid,
            message: message.into(),
            extra: None,
        }
    }

    /// The address is already held by someone else (explicit-IP takeover
    /// rejected because the current holder isn't a bootstrap/admin
    /// record).
    pub fn used_by(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            code: ErrorCode::UsedBy,
            message: message.into(),
            extra: None,
        }
    }

    /// An identity that must be unique (a name, a MAC, a vlan_id in
    /// scope, ...) collided with an existing record.
    pub fn duplicate(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            code: ErrorCode::Duplicate,
            message: message.into(),
            extra: None,
        }
    }

    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }
}

/// The aggregated, field-name-sorted failure a caller sees when more than
/// one field error applies.
#[derive(Debug, Clone, thiserror::Error, serde::Serialize)]
pub enum ValidationError {
    #[error("invalid parameters")]
    InvalidParams { fields: Vec<FieldError> },
}

impl ValidationError {
    pub fn from_errors(mut errors: Vec<FieldError>) -> Self {
        errors.sort_by(|a, b| a.field.cmp(&b.field));
        ValidationError::InvalidParams { fields: errors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_errors_sorts_by_field_name() {
        let err = ValidationError::from_errors(vec![FieldError::invalid("zeta", "x"), FieldError::invalid("alpha", "y")]);
        let ValidationError::InvalidParams { fields } = err;
        assert_eq!(fields[0].field, "alpha");
        assert_eq!(fields[1].field, "zeta");
    }

    #[test]
    fn duplicate_and_used_by_carry_distinct_codes() {
        assert_eq!(FieldError::duplicate("mac", "taken").code, ErrorCode::Duplicate);
        assert_eq!(FieldError::used_by("ip", "taken").code, ErrorCode::UsedBy);
    }

    #[test]
    fn with_extra_attaches_structured_context() {
        let err = FieldError::used_by("ip", "taken").with_extra(serde_json::json!({"belongs_to_uuid": "x"}));
        assert_eq!(err.extra.unwrap()["belongs_to_uuid"], "x");
    }
}
