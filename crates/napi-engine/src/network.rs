//! Network Create/Get/Update/Delete/List plus `find_containing`.

use napi_ip::{Address, IpAddressFamily};
use napi_models::{Ip, NewNetwork, Network};
use napi_store::{BatchOp, BucketDef, Filter, FindOptions, Precondition, StoreError};
use napi_uuid::{admin_owner, NetworkId};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::error::NapiError;
use crate::ip_allocator::{self, ADDRESS_NUM_FIELD, BELONGS_TO_UUID_FIELD, RESERVED_FIELD};
use crate::Engine;

pub const BUCKET: &str = "napi_networks";

fn value(network: &Network) -> Result<serde_json::Map<String, Value>, NapiError> {
    match serde_json::to_value(network).map_err(|e| NapiError::Internal { message: e.to_string() })? {
        Value::Object(map) => Ok(map),
        _ => Err(NapiError::Internal { message: "Network must serialize to an object".into() }),
    }
}

fn from_value(v: &serde_json::Map<String, Value>) -> Result<Network, NapiError> {
    serde_json::from_value(Value::Object(v.clone())).map_err(|e| NapiError::Internal { message: e.to_string() })
}

impl Engine {
    pub(crate) fn ip_bucket_def(&self, network: &Network) -> BucketDef {
        BucketDef::new(self.config.bucket(&network.ip_bucket_name()), 1)
            .index(ADDRESS_NUM_FIELD)
            .index(BELONGS_TO_UUID_FIELD)
            .index(RESERVED_FIELD)
    }

    /// Networks sharing (nic_tag, vlan_id, vnet_id) with `candidate`; used
    /// both by the overlap check on create and by `find_containing`.
    async fn networks_in_same_segment(&self, nic_tag: &str, vlan_id: u16, vnet_id: Option<u32>) -> Result<Vec<Network>, NapiError> {
        let bucket = self.config.bucket(BUCKET);
        let mut clauses = vec![Filter::eq("nic_tag", json!(nic_tag)), Filter::eq("vlan_id", json!(vlan_id))];
        match vnet_id {
            Some(v) => clauses.push(Filter::eq("vnet_id", json!(v))),
            None => clauses.push(Filter::not(Filter::present("vnet_id"))),
        }
        let records = self.store.find(&bucket, &Filter::and(clauses), &FindOptions::default()).await?;
        records.iter().map(|r| from_value(&r.value)).collect()
    }

    /// Create a network: validates the record (napi-models), checks
    /// subnet overlap against every network sharing (nic_tag, vlan_id,
    /// vnet_id), initializes the per-network IP bucket, and
    /// seeds reserved bootstrap records.
    #[instrument(skip(self, input), fields(name = %input.name), err)]
    pub async fn create_network(&self, input: NewNetwork) -> Result<Network, NapiError> {
        let network = Network::create(input)?;

        let bucket = self.config.bucket(BUCKET);
        let name_taken = self
            .store
            .find(&bucket, &Filter::eq("name", json!(network.name)), &FindOptions::default())
            .await?;
        if !name_taken.is_empty() {
            return Err(NapiError::InvalidParams {
                fields: vec![napi_validate::FieldError::duplicate("name", "a network with this name already exists")],
            });
        }

        let siblings = self.networks_in_same_segment(&network.nic_tag, network.vlan_id, network.vnet_id).await?;
        for sibling in &siblings {
            if sibling.subnet.overlaps(&network.subnet) {
                return Err(NapiError::InvalidParams {
                    fields: vec![napi_validate::FieldError::invalid(
                        "subnet",
                        format!("overlaps network {} on the same nic_tag/vlan_id/vnet_id", sibling.uuid),
                    )],
                });
            }
        }

        self.store.init_bucket(&self.ip_bucket_def(&network)).await?;

        self.store
            .put(&bucket, &network.uuid.to_string(), value(&network)?, Precondition::Create)
            .await?;

        self.seed_bootstrap_ips(&network).await?;

        info!(network_uuid = %network.uuid, nic_tag = %network.nic_tag, "created network");
        Ok(network)
    }

    /// Seed reserved, `other`-owned IP records for the network/broadcast
    /// addresses (v4 only) plus gateway and resolvers.
    async fn seed_bootstrap_ips(&self, network: &Network) -> Result<(), NapiError> {
        let ip_bucket = self.config.bucket(&network.ip_bucket_name());
        for address in network.bootstrap_addresses() {
            let ip = Ip::bootstrap(address, admin_owner());
            let key = ip_allocator::ip_key(address);
            let op = put_ip_op(ip_bucket.clone(), key, &ip)?;
            // Each bootstrap address is independent; a conflict here would
            // mean the bucket was non-empty immediately after creation,
            // which cannot happen for a fresh per-network bucket.
            self.store.batch(vec![op]).await?;
        }
        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn get_network(&self, id: NetworkId) -> Result<Network, NapiError> {
        let bucket = self.config.bucket(BUCKET);
        let record = self.store.get(&bucket, &id.to_string()).await?;
        from_value(&record.value)
    }

    #[instrument(skip(self), err)]
    pub async fn list_networks(&self, limit: Option<usize>, offset: Option<usize>) -> Result<Vec<Network>, NapiError> {
        let bucket = self.config.bucket(BUCKET);
        let options = FindOptions { sort: None, limit: Some(self.config.list_limit(limit)), offset };
        let records = self.store.find(&bucket, &Filter::and([]), &options).await?;
        records.iter().map(|r| from_value(&r.value)).collect()
    }

    /// Update: provision range, owners, routes, resolvers, description,
    /// mtu, gateway_provisioned only; subnet/family/nic_tag/vlan_id are
    /// immutable after creation.
    #[instrument(skip(self, patch), err)]
    pub async fn update_network(&self, id: NetworkId, patch: NetworkPatch) -> Result<Network, NapiError> {
        let bucket = self.config.bucket(BUCKET);
        loop {
            let record = self.store.get(&bucket, &id.to_string()).await?;
            let mut network = from_value(&record.value)?;

            if let Some(start) = patch.provision_start {
                network.provision_start = start;
            }
            if let Some(end) = patch.provision_end {
                network.provision_end = end;
            }
            if !network.subnet.contains(network.provision_start) || !network.subnet.contains(network.provision_end) {
                return Err(NapiError::invalid("provision_start", "must lie within the subnet"));
            }
            if network.provision_start > network.provision_end {
                return Err(NapiError::invalid("provision_start", "must not be greater than provision_end"));
            }
            if let Some(owners) = patch.owner_uuids.clone() {
                network.owner_uuids = owners;
            }
            if let Some(routes) = patch.routes.clone() {
                network.routes = routes;
            }
            if let Some(resolvers) = patch.resolvers.clone() {
                if resolvers.len() > napi_models::MAX_RESOLVERS {
                    return Err(NapiError::invalid("resolvers", "too many resolvers"));
                }
                network.resolvers = resolvers;
            }
            if let Some(description) = patch.description.clone() {
                network.description = Some(description);
            }
            if let Some(mtu) = patch.mtu {
                network.mtu = mtu;
            }
            if let Some(gateway_provisioned) = patch.gateway_provisioned {
                network.gateway_provisioned = gateway_provisioned;
            }

            match self
                .store
                .put(&bucket, &id.to_string(), value(&network)?, Precondition::Etag(record.etag))
                .await
            {
                Ok(_) => return Ok(network),
                Err(StoreError::EtagConflict { .. }) => continue,
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// Refused if any IP on the network is assigned to a NIC, or any pool
    /// references it.
    #[instrument(skip(self), err)]
    pub async fn delete_network(&self, id: NetworkId) -> Result<(), NapiError> {
        let bucket = self.config.bucket(BUCKET);
        let record = self.store.get(&bucket, &id.to_string()).await?;
        let network = from_value(&record.value)?;

        let ip_bucket = self.config.bucket(&network.ip_bucket_name());
        let assigned = self
            .store
            .find(&ip_bucket, &Filter::present(BELONGS_TO_UUID_FIELD), &FindOptions { sort: None, limit: Some(1), offset: None })
            .await?;
        if !assigned.is_empty() {
            return Err(NapiError::InUse {
                message: "network has at least one assigned IP".to_string(),
                referrers: assigned.into_iter().map(|r| r.key).collect(),
            });
        }

        let pools_bucket = self.config.bucket(crate::network_pool::BUCKET);
        let pool_records = self
            .store
            .find(&pools_bucket, &Filter::and([]), &FindOptions::default())
            .await?;
        let referring_pools: Vec<String> = pool_records
            .iter()
            .filter(|r| r.value.get("members").and_then(Value::as_array).map(|m| m.iter().any(|v| v.as_str() == Some(&id.to_string()))).unwrap_or(false))
            .map(|r| r.key.clone())
            .collect();
        if !referring_pools.is_empty() {
            return Err(NapiError::InUse {
                message: "network is a member of at least one network pool".to_string(),
                referrers: referring_pools,
            });
        }

        self.store
            .batch(vec![BatchOp::Delete { bucket, key: id.to_string(), precondition: Some(record.etag) }])
            .await?;
        Ok(())
    }

    /// Infer the network a NIC request should attach to when it supplies
    /// an address but no network.
    #[instrument(skip(self), err)]
    pub async fn find_containing(
        &self,
        vlan_id: u16,
        nic_tag: &str,
        vnet_id: Option<u32>,
        address: Address,
    ) -> Result<Network, NapiError> {
        let candidates = self.networks_in_same_segment(nic_tag, vlan_id, vnet_id).await?;
        candidates
            .into_iter()
            .find(|n| n.family == address.family() && n.subnet.contains(address))
            .ok_or_else(|| NapiError::NotFound { bucket: self.config.bucket(BUCKET), key: None })
    }
}

fn put_ip_op(bucket: String, key: String, ip: &Ip) -> Result<BatchOp, NapiError> {
    let value = match serde_json::to_value(ip).map_err(|e| NapiError::Internal { message: e.to_string() })? {
        Value::Object(map) => map,
        _ => return Err(NapiError::Internal { message: "Ip must serialize to an object".into() }),
    };
    let mut value = value;
    value.insert(ADDRESS_NUM_FIELD.to_string(), json!(ip.address.to_u128() as f64));
    if let Some(assignment) = ip.assignment {
        value.insert(BELONGS_TO_UUID_FIELD.to_string(), json!(assignment.belongs_to_uuid.to_string()));
    }
    Ok(BatchOp::Put { bucket, key, value, precondition: Precondition::Create })
}

/// Which fields an Update request wants to change; `None` means "leave
/// as-is".
#[derive(Debug, Clone, Default)]
pub struct NetworkPatch {
    pub provision_start: Option<Address>,
    pub provision_end: Option<Address>,
    pub owner_uuids: Option<Option<Vec<napi_uuid::OwnerId>>>,
    pub routes: Option<Vec<napi_models::Route>>,
    pub resolvers: Option<Vec<Address>>,
    pub description: Option<String>,
    pub mtu: Option<u32>,
    pub gateway_provisioned: Option<bool>,
}

pub fn family_of(address: Address) -> IpAddressFamily {
    address.family()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_network, new_network_input, test_engine};

    #[tokio::test]
    async fn create_network_seeds_expected_bootstrap_ips() {
        let engine = test_engine().await;
        let network = create_test_network(&engine, "external").await;
        let ip_bucket = engine.config.bucket(&network.ip_bucket_name());
        let mut keys: Vec<String> = engine
            .store
            .find(&ip_bucket, &Filter::and([]), &FindOptions::default())
            .await
            .unwrap()
            .into_iter()
            .map(|r| from_value_addr(&r.value))
            .collect();
        keys.sort();
        assert_eq!(keys, vec!["10.99.99.0", "10.99.99.1", "10.99.99.11", "10.99.99.255"]);
    }

    fn from_value_addr(v: &serde_json::Map<String, Value>) -> String {
        v.get("address").and_then(Value::as_str).unwrap().to_string()
    }

    #[tokio::test]
    async fn rejects_duplicate_name() {
        let engine = test_engine().await;
        create_test_network(&engine, "external").await;
        let mut second = new_network_input("external");
        second.vlan_id = 20;
        second.subnet = "10.50.0.0/24".parse().unwrap();
        second.provision_start = "10.50.0.10".parse().unwrap();
        second.provision_end = "10.50.0.20".parse().unwrap();
        second.gateway = None;
        second.resolvers = vec![];
        second.name = "external-net".to_string();
        let err = engine.create_network(second).await.unwrap_err();
        assert!(matches!(err, NapiError::InvalidParams { .. }));
    }

    #[tokio::test]
    async fn rejects_overlapping_subnet_on_same_segment() {
        let engine = test_engine().await;
        create_test_network(&engine, "external").await;
        let mut second = new_network_input("external");
        second.name = "external-net-2".to_string();
        let err = engine.create_network(second).await.unwrap_err();
        assert!(matches!(err, NapiError::InvalidParams { .. }));
    }

    #[tokio::test]
    async fn allows_overlapping_subnet_on_distinct_vlan() {
        let engine = test_engine().await;
        create_test_network(&engine, "external").await;
        let mut second = new_network_input("external");
        second.name = "external-net-2".to_string();
        second.vlan_id = 20;
        let network = engine.create_network(second).await.unwrap();
        assert_eq!(network.vlan_id, 20);
    }

    #[tokio::test]
    async fn find_containing_resolves_by_address() {
        let engine = test_engine().await;
        let network = create_test_network(&engine, "external").await;
        let found = engine
            .find_containing(network.vlan_id, &network.nic_tag, None, "10.99.99.38".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(found.uuid, network.uuid);
    }

    #[tokio::test]
    async fn delete_refused_while_ip_is_assigned() {
        let engine = test_engine().await;
        let network = create_test_network(&engine, "external").await;
        let req = crate::ip_allocator::IpRequest {
            owner_uuid: admin_owner(),
            belongs_to_uuid: napi_uuid::BelongsToId::new(),
            belongs_to_type: napi_models::BelongsToType::Server,
            reserved: false,
            explicit_ip: None,
            check_owner: false,
        };
        crate::ip_allocator::allocate(engine.store.as_ref(), &network, &req).await.unwrap();
        let err = engine.delete_network(network.uuid).await.unwrap_err();
        assert!(matches!(err, NapiError::InUse { .. }));
    }

    #[tokio::test]
    async fn update_changes_provision_range_but_not_subnet() {
        let engine = test_engine().await;
        let network = create_test_network(&engine, "external").await;
        let patch = NetworkPatch {
            provision_start: Some("10.99.99.100".parse().unwrap()),
            ..Default::default()
        };
        let updated = engine.update_network(network.uuid, patch).await.unwrap();
        assert_eq!(updated.provision_start.to_string(), "10.99.99.100");
        assert_eq!(updated.subnet, network.subnet);
    }
}
