use napi_mac::MacAddress;
use napi_uuid::BelongsToId;
use serde::{Deserialize, Serialize};

use crate::belongs_to::BelongsToType;
use crate::error::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LacpMode {
    Off,
    Active,
    Passive,
}

/// A server-side LACP bundle of NIC MACs. `id` is derived,
/// not stored separately, since it's a deterministic function of
/// `belongs_to_uuid` and `name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregation {
    pub belongs_to_uuid: BelongsToId,
    pub name: String,
    pub macs: Vec<MacAddress>,
    pub lacp_mode: LacpMode,
    pub nic_tags_provided: Vec<String>,
}

impl Aggregation {
    /// `member_belongs_to` / `member_type` describe each MAC in `macs`, in
    /// the same order, so the constructor can check "all NICs must share
    /// belongs_to_uuid and be belongs_to_type=server" without the caller
    /// re-deriving that invariant.
    pub fn create(
        belongs_to_uuid: BelongsToId,
        name: impl Into<String>,
        macs: Vec<MacAddress>,
        members: &[(BelongsToId, BelongsToType)],
        lacp_mode: LacpMode,
        nic_tags_provided: Vec<String>,
    ) -> Result<Self, ModelError> {
        for (member_belongs_to, member_type) in members {
            if *member_belongs_to != belongs_to_uuid {
                return Err(ModelError::invalid("macs", "every member NIC must share belongs_to_uuid"));
            }
            if *member_type != BelongsToType::Server {
                return Err(ModelError::invalid("macs", "every member NIC must be belongs_to_type=server"));
            }
        }

        Ok(Aggregation {
            belongs_to_uuid,
            name: name.into(),
            macs,
            lacp_mode,
            nic_tags_provided,
        })
    }

    pub fn id(&self) -> String {
        format!("{}-{}", self.belongs_to_uuid, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_joins_belongs_to_and_name() {
        let belongs_to = BelongsToId::new();
        let agg = Aggregation::create(belongs_to, "aggr0", vec![], &[], LacpMode::Active, vec![]).unwrap();
        assert_eq!(agg.id(), format!("{belongs_to}-aggr0"));
    }

    #[test]
    fn rejects_member_with_different_belongs_to() {
        let belongs_to = BelongsToId::new();
        let other = BelongsToId::new();
        let err = Aggregation::create(
            belongs_to,
            "aggr0",
            vec![],
            &[(other, BelongsToType::Server)],
            LacpMode::Active,
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidField { .. }));
    }

    #[test]
    fn rejects_non_server_member() {
        let belongs_to = BelongsToId::new();
        let err = Aggregation::create(
            belongs_to,
            "aggr0",
            vec![],
            &[(belongs_to, BelongsToType::Zone)],
            LacpMode::Active,
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidField { .. }));
    }
}
