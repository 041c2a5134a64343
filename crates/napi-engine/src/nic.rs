//! The NIC provisioning engine: the only component that
//! writes NIC records. Implements the lettered Create/Update algorithm,
//! Delete, Get, and List.

use std::collections::HashSet;

use napi_ip::Address;
use napi_mac::MacAddress;
use napi_models::{BelongsToType, CapabilityFlags, Intersection, NewNic, Nic, NicAddress, NicState};
use napi_overlay::ShootdownKind;
use napi_store::{BatchOp, Filter, FindOptions, Precondition, StoreError};
use napi_uuid::{BelongsToId, ComputeNodeId, NetworkId, NetworkPoolId, OwnerId};
use rand::thread_rng;
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::NapiError;
use crate::ip_allocator::{self, Candidate, IpRequest};
use crate::Engine;

pub const BUCKET: &str = "napi_nics";

pub(crate) fn nic_key(mac: MacAddress) -> String {
    mac.as_u64().to_string()
}

pub(crate) fn nic_value(nic: &Nic) -> Result<serde_json::Map<String, Value>, NapiError> {
    match serde_json::to_value(nic).map_err(|e| NapiError::Internal { message: e.to_string() })? {
        Value::Object(map) => Ok(map),
        _ => Err(NapiError::Internal { message: "Nic must serialize to an object".into() }),
    }
}

fn nic_from_value(v: &serde_json::Map<String, Value>) -> Result<Nic, NapiError> {
    serde_json::from_value(Value::Object(v.clone())).map_err(|e| NapiError::Internal { message: e.to_string() })
}

/// Where a Create/Update request wants its one IP from, in the order
/// `resolve_provisioner` checks them: an explicit address first, then a
/// network pool, then a bare network, else none at all.
enum Provisioner {
    ExplicitIp { network: napi_models::Network, address: Address },
    NetworkPool(NetworkPoolId, Vec<Intersection>),
    Network(napi_models::Network),
    None,
}

pub struct CreateNicInput {
    pub owner_uuid: OwnerId,
    pub belongs_to_uuid: BelongsToId,
    pub belongs_to_type: BelongsToType,
    pub mac: Option<MacAddress>,
    pub network_uuid: Option<NetworkId>,
    pub network_pool_uuid: Option<NetworkPoolId>,
    pub ip: Option<Address>,
    /// Required alongside `ip` when `network_uuid` is not supplied, so
    /// the engine can `find_containing` the network.
    pub nic_tag: Option<String>,
    pub vlan_id: Option<u16>,
    pub vnet_id: Option<u32>,
    /// Per-NIC filters narrowing `network_pool_uuid`'s members, tried in
    /// order; the engine moves to the next only once every network
    /// matching the current one is `SubnetFull`. Empty means "the whole
    /// pool is one intersection" (every member qualifies).
    pub pool_intersections: Vec<Intersection>,
    pub primary: bool,
    pub capabilities: CapabilityFlags,
    pub model: Option<String>,
    pub cn_uuid: Option<ComputeNodeId>,
    pub nic_tags_provided: Vec<String>,
    pub check_owner: bool,
}

#[derive(Default)]
pub struct UpdateNicInput {
    pub network_uuid: Option<NetworkId>,
    pub network_pool_uuid: Option<NetworkPoolId>,
    pub ip: Option<Address>,
    pub nic_tag: Option<String>,
    pub vlan_id: Option<u16>,
    pub vnet_id: Option<u32>,
    pub pool_intersections: Vec<Intersection>,
    pub primary: Option<bool>,
    pub state: Option<NicState>,
    pub capabilities: Option<CapabilityFlags>,
    pub model: Option<Option<String>>,
    pub cn_uuid: Option<Option<ComputeNodeId>>,
    pub nic_tags_provided: Option<Vec<String>>,
    pub check_owner: bool,
}

impl Engine {
    async fn resolve_provisioner(
        &self,
        network_uuid: Option<NetworkId>,
        network_pool_uuid: Option<NetworkPoolId>,
        ip: Option<Address>,
        nic_tag: Option<&str>,
        vlan_id: Option<u16>,
        vnet_id: Option<u32>,
        pool_intersections: &[Intersection],
    ) -> Result<Provisioner, NapiError> {
        if let Some(address) = ip {
            let network = match network_uuid {
                Some(id) => self.get_network(id).await?,
                None => {
                    let nic_tag = nic_tag.ok_or_else(|| NapiError::invalid("nic_tag", "required to resolve network from ip alone"))?;
                    let vlan_id = vlan_id.ok_or_else(|| NapiError::invalid("vlan_id", "required to resolve network from ip alone"))?;
                    self.find_containing(vlan_id, nic_tag, vnet_id, address).await?
                }
            };
            return Ok(Provisioner::ExplicitIp { network, address });
        }
        if let Some(pool_id) = network_pool_uuid {
            return Ok(Provisioner::NetworkPool(pool_id, pool_intersections.to_vec()));
        }
        if let Some(network_id) = network_uuid {
            return Ok(Provisioner::Network(self.get_network(network_id).await?));
        }
        Ok(Provisioner::None)
    }

    /// Select a candidate IP for one attempt of the provisioning loop.
    /// Returns `None` when the request carries no IP provisioner at all.
    async fn select_candidate(&self, provisioner: &Provisioner, req: &IpRequest) -> Result<Option<(napi_models::Network, Candidate)>, NapiError> {
        match provisioner {
            Provisioner::ExplicitIp { network, address } => {
                let mut req = req.clone();
                req.explicit_ip = Some(*address);
                let candidate = ip_allocator::candidate(self.store.as_ref(), network, &req).await?;
                Ok(Some((network.clone(), candidate)))
            }
            Provisioner::Network(network) => {
                let candidate = ip_allocator::candidate(self.store.as_ref(), network, req).await?;
                Ok(Some((network.clone(), candidate)))
            }
            Provisioner::NetworkPool(pool_id, intersections) => {
                let pool = self.get_network_pool(*pool_id).await?;
                if pool.members.is_empty() {
                    return Err(NapiError::PoolFull);
                }
                // No caller-supplied filter: the whole pool is one
                // intersection, matching every member.
                let owned_any = [Intersection::any()];
                let intersections: &[Intersection] = if intersections.is_empty() { &owned_any } else { intersections };

                for intersection in intersections {
                    for network_id in pool.members_from_cursor() {
                        let network = self.get_network(network_id).await?;
                        if !intersection.matches(&network) {
                            continue;
                        }
                        match ip_allocator::candidate(self.store.as_ref(), &network, req).await {
                            Ok(candidate) => return Ok(Some((network, candidate))),
                            Err(NapiError::SubnetFull) => continue,
                            Err(other) => return Err(other),
                        }
                    }
                    // Every matching member of this intersection was full;
                    // move on to the next one.
                }
                let _ = self.advance_pool_cursor(*pool_id).await;
                Err(NapiError::PoolFull)
            }
            Provisioner::None => Ok(None),
        }
    }

    /// Create a NIC. Loops selecting an IP and a
    /// MAC until a batch commits cleanly or a retry budget is exhausted.
    #[instrument(skip(self, input), err)]
    pub async fn create_nic(&self, input: CreateNicInput) -> Result<Nic, NapiError> {
        let provisioner = self
            .resolve_provisioner(
                input.network_uuid,
                input.network_pool_uuid,
                input.ip,
                input.nic_tag.as_deref(),
                input.vlan_id,
                input.vnet_id,
                &input.pool_intersections,
            )
            .await?;

        let ip_req = IpRequest {
            owner_uuid: input.owner_uuid,
            belongs_to_uuid: input.belongs_to_uuid,
            belongs_to_type: input.belongs_to_type,
            reserved: false,
            explicit_ip: None,
            check_owner: input.check_owner,
        };

        let mut mac = input.mac;
        let mut mac_retries = 0usize;

        for _ in 0..self.config.nic_provision_retries {
            let mut batch = Vec::new();

            let selected = self.select_candidate(&provisioner, &ip_req).await?;
            let (network, nic_address) = match &selected {
                Some((network, candidate)) => {
                    batch.push(candidate.op.clone());
                    (Some(network.clone()), Some(NicAddress { network_uuid: network.uuid, address: candidate.address }))
                }
                None => (None, None),
            };

            let mut cns = Vec::new();
            let is_fabric_vnic = input.belongs_to_type == BelongsToType::Zone
                && nic_address.is_some()
                && input.cn_uuid.is_some()
                && network.as_ref().map(|n| n.fabric).unwrap_or(false);
            if is_fabric_vnic {
                if let Some(network) = &network {
                    if let Some(vnet_id) = network.vnet_id {
                        cns = napi_overlay::compute_nodes_for_vnet(self.store.as_ref(), vnet_id).await?;
                    }
                }
            }

            let chosen_mac = match mac {
                Some(m) => m,
                None => MacAddress::random_in_oui(&mut thread_rng(), self.config.oui),
            };

            let nic = Nic::create(NewNic {
                mac: chosen_mac,
                owner_uuid: input.owner_uuid,
                belongs_to_uuid: input.belongs_to_uuid,
                belongs_to_type: input.belongs_to_type,
                primary: input.primary,
                ip: nic_address,
                capabilities: input.capabilities,
                model: input.model.clone(),
                cn_uuid: input.cn_uuid,
                nic_tags_provided: input.nic_tags_provided.clone(),
                ip_is_on_fabric_network: network.as_ref().map(|n| n.fabric).unwrap_or(false),
            })?;

            batch.push(BatchOp::Put {
                bucket: self.config.bucket(BUCKET),
                key: nic_key(chosen_mac),
                value: nic_value(&nic)?,
                precondition: Precondition::Create,
            });

            if input.primary {
                batch.push(self.clear_other_primaries_op(input.belongs_to_uuid, chosen_mac));
            }

            if is_fabric_vnic {
                // `network`/`nic_address`/`input.cn_uuid` are all `Some` here:
                // `is_fabric_vnic` required `nic_address.is_some()` and
                // `input.cn_uuid.is_some()`, and a resolved address implies a
                // resolved network with a vnet_id (only fabric networks set
                // `network.fabric`, which `is_fabric_vnic` also required).
                let network = network.as_ref().expect("fabric vnic implies a resolved network");
                let vnet_id = network.vnet_id.expect("fabric network carries vnet_id");
                let address = nic.ip.expect("fabric vnic implies an ip").address;
                batch.extend(napi_overlay::overlay_add_ops(vnet_id, chosen_mac, address, input.cn_uuid.expect("fabric vnic implies cn_uuid")));
                batch.extend(napi_overlay::broadcast_shootdown_ops(
                    &format!("nic-create-{}", chosen_mac.as_u64()),
                    vnet_id,
                    ShootdownKind::RouteUpdate,
                    &cns,
                ));
            } else if nic.capabilities.underlay {
                if let Some(cn_uuid) = input.cn_uuid {
                    batch.push(napi_overlay::underlay_op(cn_uuid, chosen_mac, Precondition::Create));
                }
            }

            if let Some(gateway_op) = self.gateway_provisioned_op(&network, nic_address.map(|a| a.address)).await? {
                batch.push(gateway_op);
            }

            match self.store.batch(batch).await {
                Ok(()) => {
                    if let Provisioner::NetworkPool(pool_id, _) = &provisioner {
                        let _ = self.advance_pool_cursor(*pool_id).await;
                    }
                    info!(mac = %chosen_mac, belongs_to_uuid = %input.belongs_to_uuid, "created nic");
                    return Ok(nic);
                }
                Err(StoreError::EtagConflict { bucket, key }) => {
                    let nics_bucket = self.config.bucket(BUCKET);
                    if bucket == nics_bucket && key == nic_key(chosen_mac) {
                        if input.mac.is_some() {
                            return Err(NapiError::InvalidParams {
                                fields: vec![napi_validate::FieldError::duplicate("mac", "mac address is already in use")],
                            });
                        }
                        mac_retries += 1;
                        if mac_retries > self.config.mac_retries {
                            return Err(NapiError::Unavailable { message: "mac retry budget exhausted".to_string() });
                        }
                        mac = None;
                        continue;
                    }
                    // An IP-bucket or overlay conflict: retry the whole
                    // loop, which re-selects the candidate.
                    continue;
                }
                Err(other) => return Err(other.into()),
            }
        }
        Err(NapiError::Unavailable { message: "nic provisioning retry budget exhausted".to_string() })
    }

    /// Update a NIC: Create minus MAC
    /// selection plus old-IP reclamation.
    #[instrument(skip(self, patch), err)]
    pub async fn update_nic(&self, mac: MacAddress, patch: UpdateNicInput) -> Result<Nic, NapiError> {
        let bucket = self.config.bucket(BUCKET);

        for _ in 0..self.config.nic_provision_retries {
            let record = self.store.get(&bucket, &nic_key(mac)).await?;
            let mut nic = nic_from_value(&record.value)?;
            let old_ip = nic.ip;

            let provisioner = self
                .resolve_provisioner(
                    patch.network_uuid,
                    patch.network_pool_uuid,
                    patch.ip,
                    patch.nic_tag.as_deref(),
                    patch.vlan_id,
                    patch.vnet_id,
                    &patch.pool_intersections,
                )
                .await?;
            let wants_new_ip = !matches!(provisioner, Provisioner::None);

            let ip_req = IpRequest {
                owner_uuid: nic.owner_uuid,
                belongs_to_uuid: nic.belongs_to_uuid,
                belongs_to_type: nic.belongs_to_type,
                reserved: false,
                explicit_ip: None,
                check_owner: patch.check_owner,
            };

            let mut batch = Vec::new();
            let mut new_address: Option<NicAddress> = old_ip;
            let mut new_network = None;

            if wants_new_ip {
                if let Some((network, candidate)) = self.select_candidate(&provisioner, &ip_req).await? {
                    batch.push(candidate.op.clone());
                    new_address = Some(NicAddress { network_uuid: network.uuid, address: candidate.address });
                    new_network = Some(network);
                }
            }

            // Step d: free the old IP if it is being replaced and the
            // owner still matches.
            if let Some(old) = old_ip {
                if new_address.map(|a| a.address) != Some(old.address) {
                    if let Ok(old_network) = self.get_network(old.network_uuid).await {
                        if let Ok((current, etag)) = ip_allocator::read(self.store.as_ref(), &old_network, old.address).await {
                            if current.assignment.map(|a| a.owner_uuid) == Some(nic.owner_uuid) {
                                batch.push(ip_allocator::release_op(&old_network, current, etag)?);
                            }
                        }
                        if nic.is_fabric_vnic() {
                            if let Some(vnet_id) = old_network.vnet_id {
                                batch.extend(napi_overlay::overlay_delete_ops(vnet_id, mac, old.address, None, None));
                                let cns = napi_overlay::compute_nodes_for_vnet(self.store.as_ref(), vnet_id).await?;
                                batch.extend(napi_overlay::broadcast_shootdown_ops(
                                    &format!("nic-update-free-{}", mac.as_u64()),
                                    vnet_id,
                                    ShootdownKind::Shootdown,
                                    &cns,
                                ));
                            }
                        }
                    }
                }
            }

            if let Some(primary) = patch.primary {
                nic.primary = primary;
            }
            if let Some(state) = patch.state {
                nic.state = state;
            }
            if let Some(capabilities) = patch.capabilities {
                nic.capabilities = capabilities;
            }
            if let Some(model) = patch.model.clone() {
                nic.model = model;
            }
            if let Some(cn_uuid) = patch.cn_uuid {
                nic.cn_uuid = cn_uuid;
            }
            if let Some(tags) = patch.nic_tags_provided.clone() {
                nic.nic_tags_provided = tags;
            }
            nic.ip = new_address;

            batch.push(BatchOp::Put {
                bucket: bucket.clone(),
                key: nic_key(mac),
                value: nic_value(&nic)?,
                precondition: Precondition::Etag(record.etag),
            });

            if nic.primary {
                batch.push(self.clear_other_primaries_op(nic.belongs_to_uuid, mac));
            }

            if nic.is_fabric_vnic() {
                let network = new_network.as_ref();
                if let Some(network) = network {
                    if let Some(vnet_id) = network.vnet_id {
                        let address = nic.ip.expect("fabric vnic implies an ip").address;
                        let cn_uuid = nic.cn_uuid.expect("fabric vnic implies cn_uuid");
                        batch.extend(napi_overlay::overlay_add_ops(vnet_id, mac, address, cn_uuid));
                        let cns = napi_overlay::compute_nodes_for_vnet(self.store.as_ref(), vnet_id).await?;
                        batch.extend(napi_overlay::broadcast_shootdown_ops(
                            &format!("nic-update-{}", mac.as_u64()),
                            vnet_id,
                            ShootdownKind::RouteUpdate,
                            &cns,
                        ));
                    }
                }
            } else if nic.capabilities.underlay {
                if let Some(cn_uuid) = nic.cn_uuid {
                    batch.push(napi_overlay::underlay_op(cn_uuid, mac, Precondition::Etag(record.etag)));
                }
            }

            if let Some(gateway_op) = self.gateway_provisioned_op(&new_network, nic.ip.map(|a| a.address)).await? {
                batch.push(gateway_op);
            }

            match self.store.batch(batch).await {
                Ok(()) => {
                    if let Provisioner::NetworkPool(pool_id, _) = &provisioner {
                        let _ = self.advance_pool_cursor(*pool_id).await;
                    }
                    return Ok(nic);
                }
                Err(StoreError::EtagConflict { .. }) => continue,
                Err(other) => return Err(other.into()),
            }
        }
        Err(NapiError::Unavailable { message: "nic update retry budget exhausted".to_string() })
    }

    /// Delete a NIC. Frees or unassigns any held
    /// IP depending on its reserved flag and emits matching overlay
    /// teardown for fabric NICs.
    #[instrument(skip(self), err)]
    pub async fn delete_nic(&self, mac: MacAddress) -> Result<(), NapiError> {
        let bucket = self.config.bucket(BUCKET);
        let record = self.store.get(&bucket, &nic_key(mac)).await?;
        let nic = nic_from_value(&record.value)?;

        let mut batch = vec![BatchOp::Delete { bucket, key: nic_key(mac), precondition: Some(record.etag) }];

        if let Some(held) = nic.ip {
            if let Ok(network) = self.get_network(held.network_uuid).await {
                if let Ok((current, etag)) = ip_allocator::read(self.store.as_ref(), &network, held.address).await {
                    if current.assignment.map(|a| a.owner_uuid) == Some(nic.owner_uuid) {
                        batch.push(ip_allocator::release_op(&network, current, etag)?);
                    }
                }

                if nic.is_fabric_vnic() {
                    if let Some(vnet_id) = network.vnet_id {
                        batch.extend(napi_overlay::overlay_delete_ops(vnet_id, mac, held.address, None, None));
                        let cns = napi_overlay::compute_nodes_for_vnet(self.store.as_ref(), vnet_id).await?;
                        batch.extend(napi_overlay::broadcast_shootdown_ops(
                            &format!("nic-delete-{}", mac.as_u64()),
                            vnet_id,
                            ShootdownKind::Shootdown,
                            &cns,
                        ));
                    }
                }
            }
        }

        self.store.batch(batch).await?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn get_nic(&self, mac: MacAddress) -> Result<Nic, NapiError> {
        let bucket = self.config.bucket(BUCKET);
        let record = self.store.get(&bucket, &nic_key(mac)).await?;
        nic_from_value(&record.value)
    }

    #[instrument(skip(self), err)]
    pub async fn list_nics_for(&self, belongs_to_uuid: BelongsToId, limit: Option<usize>, offset: Option<usize>) -> Result<Vec<Nic>, NapiError> {
        let bucket = self.config.bucket(BUCKET);
        let filter = Filter::eq("belongs_to_uuid", serde_json::json!(belongs_to_uuid.to_string()));
        let options = FindOptions { sort: None, limit: Some(self.config.list_limit(limit)), offset };
        let records = self.store.find(&bucket, &filter, &options).await?;
        records.iter().map(|r| nic_from_value(&r.value)).collect()
    }

    fn clear_other_primaries_op(&self, belongs_to_uuid: BelongsToId, except_mac: MacAddress) -> BatchOp {
        let filter = Filter::and([
            Filter::eq("belongs_to_uuid", serde_json::json!(belongs_to_uuid.to_string())),
            Filter::eq("primary", serde_json::json!(true)),
            Filter::not(Filter::eq("mac", serde_json::json!(except_mac.to_string()))),
        ]);
        let fields: serde_json::Map<String, Value> = [("primary".to_string(), Value::Bool(false))].into_iter().collect();
        BatchOp::UpdateByFilter { bucket: self.config.bucket(BUCKET), fields, filter }
    }

    /// If `address` is the resolved network's configured gateway and the
    /// network has not yet recorded it, append the network update that
    /// flips `gateway_provisioned`.
    async fn gateway_provisioned_op(&self, network: &Option<napi_models::Network>, address: Option<Address>) -> Result<Option<BatchOp>, NapiError> {
        let (Some(network), Some(address)) = (network, address) else { return Ok(None) };
        if network.gateway != Some(address) || network.gateway_provisioned {
            return Ok(None);
        }
        let bucket = self.config.bucket(crate::network::BUCKET);
        let record = self.store.get(&bucket, &network.uuid.to_string()).await?;
        let mut fresh: napi_models::Network = serde_json::from_value(Value::Object(record.value))
            .map_err(|e| NapiError::Internal { message: e.to_string() })?;
        if fresh.gateway_provisioned {
            return Ok(None);
        }
        fresh.gateway_provisioned = true;
        let value = match serde_json::to_value(&fresh).map_err(|e| NapiError::Internal { message: e.to_string() })? {
            Value::Object(map) => map,
            _ => return Err(NapiError::Internal { message: "Network must serialize to an object".into() }),
        };
        Ok(Some(BatchOp::Put { bucket, key: network.uuid.to_string(), value, precondition: Precondition::Etag(record.etag) }))
    }
}

/// Every distinct address this NIC occupies, for callers reconciling
/// overlay state after a batch of changes (currently always ≤1, since a
/// NIC holds at most one IP).
pub fn addresses_of(nic: &Nic) -> HashSet<Address> {
    nic.ip.into_iter().map(|a| a.address).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_network, test_engine};
    use napi_uuid::admin_owner;

    fn base_input(network_uuid: NetworkId) -> CreateNicInput {
        CreateNicInput {
            owner_uuid: admin_owner(),
            belongs_to_uuid: BelongsToId::new(),
            belongs_to_type: BelongsToType::Server,
            mac: None,
            network_uuid: Some(network_uuid),
            network_pool_uuid: None,
            ip: None,
            nic_tag: None,
            vlan_id: None,
            vnet_id: None,
            pool_intersections: vec![],
            primary: false,
            capabilities: CapabilityFlags::default(),
            model: None,
            cn_uuid: None,
            nic_tags_provided: vec![],
            check_owner: false,
        }
    }

    #[tokio::test]
    async fn allocates_provision_start() {
        let engine = test_engine().await;
        let network = create_test_network(&engine, "external").await;
        let nic = engine.create_nic(base_input(network.uuid)).await.unwrap();
        assert_eq!(nic.ip.unwrap().address.to_string(), "10.99.99.38");
    }

    #[tokio::test]
    async fn two_allocations_get_distinct_addresses() {
        let engine = test_engine().await;
        let network = create_test_network(&engine, "external").await;
        let a = engine.create_nic(base_input(network.uuid)).await.unwrap();
        let b = engine.create_nic(base_input(network.uuid)).await.unwrap();
        assert_ne!(a.ip.unwrap().address, b.ip.unwrap().address);
    }

    #[tokio::test]
    async fn explicit_used_ip_is_rejected() {
        let engine = test_engine().await;
        let network = create_test_network(&engine, "external").await;
        engine.create_nic(base_input(network.uuid)).await.unwrap();

        let mut second = base_input(network.uuid);
        second.ip = Some("10.99.99.38".parse().unwrap());
        let err = engine.create_nic(second).await.unwrap_err();
        assert!(matches!(err, NapiError::InvalidParams { .. }));
    }

    #[tokio::test]
    async fn primary_bump_clears_old_primary() {
        let engine = test_engine().await;
        let network = create_test_network(&engine, "external").await;
        let belongs_to = BelongsToId::new();

        let mut first = base_input(network.uuid);
        first.belongs_to_uuid = belongs_to;
        first.primary = true;
        let a = engine.create_nic(first).await.unwrap();
        assert!(a.primary);

        let mut second = base_input(network.uuid);
        second.belongs_to_uuid = belongs_to;
        second.primary = true;
        let c = engine.create_nic(second).await.unwrap();
        assert!(c.primary);

        let refreshed_a = engine.get_nic(a.mac).await.unwrap();
        assert!(!refreshed_a.primary);
    }

    #[tokio::test]
    async fn delete_frees_the_held_ip() {
        let engine = test_engine().await;
        let network = create_test_network(&engine, "external").await;
        let nic = engine.create_nic(base_input(network.uuid)).await.unwrap();
        let address = nic.ip.unwrap().address;

        engine.delete_nic(nic.mac).await.unwrap();
        assert!(engine.get_nic(nic.mac).await.is_err());

        let ip_bucket = engine.config.bucket(&network.ip_bucket_name());
        let key = ip_allocator::ip_key(address);
        let record = engine.store.get(&ip_bucket, &key).await.unwrap();
        let ip: napi_models::Ip = serde_json::from_value(Value::Object(record.value)).unwrap();
        assert!(!ip.is_assigned());
    }

    #[tokio::test]
    async fn fabric_nic_emits_overlay_mappings() {
        let engine = test_engine().await;
        let mut fabric_input = crate::test_support::new_network_input("fabric0");
        fabric_input.fabric = true;
        fabric_input.vnet_id = Some(555);
        fabric_input.name = "fabric-net".to_string();
        let network = engine.create_network(fabric_input).await.unwrap();

        let mut input = base_input(network.uuid);
        input.belongs_to_type = BelongsToType::Zone;
        input.cn_uuid = Some(ComputeNodeId::new());
        let nic = engine.create_nic(input).await.unwrap();

        let vl2 = engine.store.find(napi_overlay::VL2_BUCKET, &Filter::and([]), &FindOptions::default()).await.unwrap();
        assert_eq!(vl2.len(), 1);
        let vl3 = engine.store.find(napi_overlay::VL3_BUCKET, &Filter::and([]), &FindOptions::default()).await.unwrap();
        assert_eq!(vl3.len(), 1);
        assert!(nic.is_fabric_vnic());
    }

    #[tokio::test]
    async fn pool_intersection_falls_through_once_its_vlan_is_full() {
        use napi_ip::IpAddressFamily;
        use napi_models::Intersection;

        let engine = test_engine().await;

        let mut a_input = crate::test_support::new_network_input("external");
        a_input.name = "a-net".to_string();
        a_input.vlan_id = 20;
        a_input.subnet = "10.20.0.0/29".parse().unwrap();
        a_input.provision_start = "10.20.0.2".parse().unwrap();
        a_input.provision_end = "10.20.0.2".parse().unwrap();
        let network_a = engine.create_network(a_input).await.unwrap();

        let mut b_input = crate::test_support::new_network_input("external");
        b_input.name = "b-net".to_string();
        b_input.vlan_id = 30;
        b_input.subnet = "10.30.0.0/29".parse().unwrap();
        b_input.provision_start = "10.30.0.2".parse().unwrap();
        b_input.provision_end = "10.30.0.2".parse().unwrap();
        let network_b = engine.create_network(b_input).await.unwrap();

        let pool = engine
            .create_network_pool(
                "p".to_string(),
                "external".to_string(),
                IpAddressFamily::Ipv4,
                vec![network_a.uuid, network_b.uuid],
                None,
            )
            .await
            .unwrap();

        // Exhaust network_a's single address directly, outside the pool,
        // so the pool provision below must fall through to network_b.
        let used_up = engine.create_nic(base_input(network_a.uuid)).await.unwrap();
        assert_eq!(used_up.ip.unwrap().network_uuid, network_a.uuid);

        let mut pool_input = base_input(network_a.uuid);
        pool_input.network_uuid = None;
        pool_input.network_pool_uuid = Some(pool.uuid);
        pool_input.pool_intersections = vec![
            Intersection { vlan_id: Some(20), ..Intersection::any() },
            Intersection { vlan_id: Some(30), ..Intersection::any() },
        ];
        let nic = engine.create_nic(pool_input).await.unwrap();
        assert_eq!(nic.ip.unwrap().network_uuid, network_b.uuid);
    }
}
