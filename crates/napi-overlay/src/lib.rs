//! Overlay mapping (VL2/VL3/underlay) records and shootdown log entries.
//!
//! Nothing here talks to the store on its own initiative - every function
//! in this crate builds [`BatchOp`]s that the caller (`napi-engine`)
//! appends to the *same* batch as the NIC/IP writes it accompanies, so
//! that "NIC provisioned" and "overlay reachable" commit atomically.

use napi_ip::Address;
use napi_mac::MacAddress;
use napi_store::{BatchOp, Etag, Filter, FindOptions, Precondition, StoreAdapter, StoreError};
use napi_uuid::ComputeNodeId;
use serde_json::{json, Map, Value};

pub const VL2_BUCKET: &str = "napi_vl2_overlay";
pub const VL3_BUCKET: &str = "napi_vl3_overlay";
pub const UNDERLAY_BUCKET: &str = "napi_underlay";
pub const SHOOTDOWN_LOG_BUCKET: &str = "napi_shootdown_log";

pub fn vl2_key(vnet_id: u32, mac: MacAddress) -> String {
    format!("{vnet_id}-{}", mac.as_u64())
}

pub fn vl3_key(vnet_id: u32, address: Address) -> String {
    format!("{vnet_id}-{address}")
}

pub fn underlay_key(cn_uuid: ComputeNodeId) -> String {
    cn_uuid.to_string()
}

/// Append the VL2 (vnet_id, mac -> cn_uuid) and VL3 (vnet_id, address ->
/// mac, cn_uuid) records for a newly provisioned fabric VNIC.
pub fn overlay_add_ops(vnet_id: u32, mac: MacAddress, address: Address, cn_uuid: ComputeNodeId) -> Vec<BatchOp> {
    let vl2_value: Map<String, Value> = [
        ("vnet_id".to_string(), json!(vnet_id)),
        ("mac".to_string(), json!(mac.to_string())),
        ("cn_uuid".to_string(), json!(cn_uuid.to_string())),
    ]
    .into_iter()
    .collect();

    let vl3_value: Map<String, Value> = [
        ("vnet_id".to_string(), json!(vnet_id)),
        ("address".to_string(), json!(address.to_string())),
        ("mac".to_string(), json!(mac.to_string())),
        ("cn_uuid".to_string(), json!(cn_uuid.to_string())),
    ]
    .into_iter()
    .collect();

    vec![
        BatchOp::Put {
            bucket: VL2_BUCKET.to_string(),
            key: vl2_key(vnet_id, mac),
            value: vl2_value,
            precondition: Precondition::Create,
        },
        BatchOp::Put {
            bucket: VL3_BUCKET.to_string(),
            key: vl3_key(vnet_id, address),
            value: vl3_value,
            precondition: Precondition::Create,
        },
    ]
}

/// Remove the VL2/VL3 records for a fabric VNIC being deleted or moved
/// off its network/cn. `etags` are the
/// records' current etags, read by the caller before building the batch.
pub fn overlay_delete_ops(
    vnet_id: u32,
    mac: MacAddress,
    address: Address,
    vl2_etag: Option<Etag>,
    vl3_etag: Option<Etag>,
) -> Vec<BatchOp> {
    vec![
        BatchOp::Delete {
            bucket: VL2_BUCKET.to_string(),
            key: vl2_key(vnet_id, mac),
            precondition: vl2_etag,
        },
        BatchOp::Delete {
            bucket: VL3_BUCKET.to_string(),
            key: vl3_key(vnet_id, address),
            precondition: vl3_etag,
        },
    ]
}

/// Append (or replace, on cn_uuid move) the underlay mapping entry for an
/// underlay NIC.
pub fn underlay_op(cn_uuid: ComputeNodeId, mac: MacAddress, precondition: Precondition) -> BatchOp {
    let value: Map<String, Value> = [
        ("cn_uuid".to_string(), json!(cn_uuid.to_string())),
        ("mac".to_string(), json!(mac.to_string())),
    ]
    .into_iter()
    .collect();

    BatchOp::Put {
        bucket: UNDERLAY_BUCKET.to_string(),
        key: underlay_key(cn_uuid),
        value,
        precondition,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShootdownKind {
    RouteUpdate,
    Shootdown,
}

/// An advisory event appended to the shootdown log instructing mapping
/// consumers to invalidate a cached translation. Entries are appended, never updated; a separate
/// compaction consumer removes entries once `acknowledged`.
pub fn shootdown_append_op(key: impl Into<String>, vnet_id: u32, kind: ShootdownKind, target_cn: ComputeNodeId) -> BatchOp {
    let value: Map<String, Value> = [
        ("vnet_id".to_string(), json!(vnet_id)),
        ("kind".to_string(), serde_json::to_value(kind).expect("ShootdownKind always serializes")),
        ("target_cn".to_string(), json!(target_cn.to_string())),
        ("acknowledged".to_string(), json!(false)),
    ]
    .into_iter()
    .collect();

    BatchOp::Put {
        bucket: SHOOTDOWN_LOG_BUCKET.to_string(),
        key: key.into(),
        value,
        precondition: Precondition::Create,
    }
}

/// One shootdown event per compute node in `targets`, for broadcasting a
/// VL3 event to every CN currently hosting a VNIC on `vnet_id`.
pub fn broadcast_shootdown_ops(log_key_prefix: &str, vnet_id: u32, kind: ShootdownKind, targets: &[ComputeNodeId]) -> Vec<BatchOp> {
    targets
        .iter()
        .enumerate()
        .map(|(i, cn)| shootdown_append_op(format!("{log_key_prefix}-{i}"), vnet_id, kind, *cn))
        .collect()
}

/// The set of compute nodes currently hosting a VNIC on `vnet_id`,
/// queried from the VL2 table. Requires the VL2 bucket to index `vnet_id`.
pub async fn compute_nodes_for_vnet(store: &dyn StoreAdapter, vnet_id: u32) -> Result<Vec<ComputeNodeId>, StoreError> {
    let records = store
        .find(VL2_BUCKET, &Filter::eq("vnet_id", json!(vnet_id)), &FindOptions::default())
        .await?;

    let mut cns = Vec::new();
    for record in records {
        if let Some(cn) = record.value.get("cn_uuid").and_then(Value::as_str) {
            if let Ok(id) = cn.parse::<ComputeNodeId>() {
                cns.push(id);
            }
        }
    }
    Ok(cns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use napi_store::BucketDef;

    #[tokio::test]
    async fn overlay_add_and_lookup_round_trip() {
        let store = napi_testing::FakeStore::new();
        store.init_bucket(&BucketDef::new(VL2_BUCKET, 1).index("vnet_id")).await.unwrap();
        store.init_bucket(&BucketDef::new(VL3_BUCKET, 1).index("vnet_id")).await.unwrap();

        let mac: MacAddress = "aa:bb:cc:dd:ee:01".parse().unwrap();
        let address: Address = "10.0.0.5".parse().unwrap();
        let cn = ComputeNodeId::new();

        for op in overlay_add_ops(42, mac, address, cn) {
            store.batch(vec![op]).await.unwrap();
        }

        let cns = compute_nodes_for_vnet(&store, 42).await.unwrap();
        assert_eq!(cns, vec![cn]);

        let other_vnet = compute_nodes_for_vnet(&store, 99).await.unwrap();
        assert!(other_vnet.is_empty());
    }

    #[tokio::test]
    async fn broadcast_shootdown_creates_one_entry_per_target() {
        let store = napi_testing::FakeStore::new();
        store.init_bucket(&BucketDef::new(SHOOTDOWN_LOG_BUCKET, 1)).await.unwrap();

        let targets = vec![ComputeNodeId::new(), ComputeNodeId::new()];
        let ops = broadcast_shootdown_ops("vnic-delete", 7, ShootdownKind::Shootdown, &targets);
        assert_eq!(ops.len(), 2);
        store.batch(ops).await.unwrap();

        let dump = store.dump(SHOOTDOWN_LOG_BUCKET);
        assert_eq!(dump.len(), 2);
        assert!(dump.iter().all(|(_, v)| v.get("acknowledged") == Some(&json!(false))));
    }
}
