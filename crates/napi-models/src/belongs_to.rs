use serde::{Deserialize, Serialize};

/// What kind of entity a NIC or IP assignment is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BelongsToType {
    Server,
    Zone,
    Other,
}
