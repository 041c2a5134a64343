//! Integration tests crossing module boundaries (Engine + FakeStore),
//! in the style of crate-level `tests/` directories elsewhere in the
//! workspace stack: exercise the public API only, no access to
//! `napi-engine`'s private modules.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use napi_engine::{CreateNicInput, Engine, EngineConfig};
use napi_models::{BelongsToType, CapabilityFlags, Network, NewNetwork, Route};
use napi_uuid::{BelongsToId, OwnerId};

fn network_input() -> NewNetwork {
    NewNetwork {
        name: "concurrency-net".to_string(),
        nic_tag: "external".to_string(),
        vlan_id: 11,
        subnet: "10.88.0.0/28".parse().unwrap(),
        provision_start: "10.88.0.4".parse().unwrap(),
        provision_end: "10.88.0.6".parse().unwrap(),
        gateway: None,
        resolvers: vec![],
        routes: Vec::<Route>::new(),
        owner_uuids: None,
        fabric: false,
        vnet_id: None,
        internet_nat: false,
        mtu: None,
        description: None,
    }
}

async fn engine() -> Engine {
    let engine = Engine::new(Arc::new(napi_testing::FakeStore::new()), EngineConfig::default());
    engine.init_buckets().await.unwrap();
    engine
}

fn base_input(owner_uuid: OwnerId, belongs_to_uuid: BelongsToId, network: &Network) -> CreateNicInput {
    CreateNicInput {
        owner_uuid,
        belongs_to_uuid,
        belongs_to_type: BelongsToType::Server,
        mac: None,
        network_uuid: Some(network.uuid),
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

/// Three concurrent provision requests against a network whose
/// provision range holds exactly three addresses: every request
/// succeeds and the assigned addresses are pairwise distinct.
#[tokio::test]
async fn concurrent_provisioning_assigns_distinct_addresses() {
    let engine = engine().await;
    let network = engine.create_network(network_input()).await.unwrap();
    let owner = napi_uuid::admin_owner();

    let requests = (0..3).map(|_| {
        let engine = engine.clone();
        let network = network.clone();
        let belongs_to = BelongsToId::new();
        async move { engine.create_nic(base_input(owner, belongs_to, &network)).await.unwrap() }
    });

    let nics = join_all(requests).await;
    let addresses: HashSet<_> = nics.iter().map(|n| n.ip.unwrap().address).collect();
    assert_eq!(addresses.len(), 3, "all three concurrent provisions must land on distinct addresses");

    let err = engine.create_nic(base_input(owner, BelongsToId::new(), &network)).await.unwrap_err();
    assert!(matches!(err, napi_engine::NapiError::SubnetFull));
}

/// At most one NIC per (owner, belongs_to) pair may carry
/// `primary=true`, no matter how many primary NICs are created in
/// sequence for the same pair.
#[tokio::test]
async fn at_most_one_primary_nic_per_owner_and_belongs_to() {
    let engine = engine().await;
    let network = engine.create_network(network_input()).await.unwrap();
    let owner = napi_uuid::admin_owner();
    let belongs_to = BelongsToId::new();

    let mut input_a = base_input(owner, belongs_to, &network);
    input_a.primary = true;
    let nic_a = engine.create_nic(input_a).await.unwrap();

    let mut input_b = base_input(owner, belongs_to, &network);
    input_b.primary = true;
    let nic_b = engine.create_nic(input_b).await.unwrap();

    let mut input_c = base_input(owner, belongs_to, &network);
    input_c.primary = true;
    let nic_c = engine.create_nic(input_c).await.unwrap();

    let nics = engine.list_nics_for(belongs_to, None, None).await.unwrap();
    let primaries: Vec<_> = nics.iter().filter(|n| n.primary).collect();
    assert_eq!(primaries.len(), 1);
    assert_eq!(primaries[0].mac, nic_c.mac);

    let fetched_a = engine.get_nic(nic_a.mac).await.unwrap();
    let fetched_b = engine.get_nic(nic_b.mac).await.unwrap();
    assert!(!fetched_a.primary);
    assert!(!fetched_b.primary);
}

/// Deleting a NIC frees any non-reserved IP it held, and a subsequent
/// Get on the deleted NIC returns NotFound.
#[tokio::test]
async fn delete_then_get_yields_not_found_and_frees_the_ip() {
    let engine = engine().await;
    let network = engine.create_network(network_input()).await.unwrap();
    let owner = napi_uuid::admin_owner();
    let belongs_to = BelongsToId::new();

    let nic = engine.create_nic(base_input(owner, belongs_to, &network)).await.unwrap();
    let address = nic.ip.unwrap().address;

    engine.delete_nic(nic.mac).await.unwrap();
    let err = engine.get_nic(nic.mac).await.unwrap_err();
    assert!(matches!(err, napi_engine::NapiError::NotFound { .. }));

    // The freed address is provisionable again: a fresh NIC can claim it.
    let mut retry_input = base_input(owner, BelongsToId::new(), &network);
    retry_input.ip = Some(address);
    let reclaimed = engine.create_nic(retry_input).await.unwrap();
    assert_eq!(reclaimed.ip.unwrap().address, address);
}
