//! Fixed bucket names.

use napi_uuid::NetworkId;

pub const NICS: &str = "napi_nics";
pub const NETWORKS: &str = "napi_networks";
pub const NETWORK_POOLS: &str = "napi_network_pools";
pub const NIC_TAGS: &str = "napi_nic_tags";
pub const AGGREGATIONS: &str = "napi_aggregations";
pub const FABRICS: &str = "napi_fabrics";
pub const FABRIC_VLANS: &str = "napi_fabric_vlans";
pub const VL2_OVERLAY: &str = "napi_vl2_overlay";
pub const VL3_OVERLAY: &str = "napi_vl3_overlay";
pub const UNDERLAY: &str = "napi_underlay";
pub const SHOOTDOWN_LOG: &str = "napi_shootdown_log";

/// The per-network IP bucket name: the network's UUID with every `-`
/// replaced by `_`.
pub fn ip_bucket_name(network: NetworkId) -> String {
    format!("napi_ips_{}", network.to_string().replace('-', "_"))
}

/// Prepend the `test_` prefix a test deployment uses for every bucket
/// name.
pub fn test_prefixed(bucket: &str) -> String {
    format!("test_{bucket}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_bucket_name_replaces_dashes() {
        let id: NetworkId = "11111111-2222-3333-4444-555555555555".parse().unwrap();
        assert_eq!(ip_bucket_name(id), "napi_ips_11111111_2222_3333_4444_555555555555");
    }
}
