//! Shared test fixtures used by every module's `#[cfg(test)]` block
//! below. Not part of the public API.

#![cfg(test)]

use std::sync::Arc;

use napi_models::{NewNetwork, Network, Route};

use crate::{Engine, EngineConfig};

pub async fn test_engine() -> Engine {
    let engine = Engine::new(Arc::new(napi_testing::FakeStore::new()), EngineConfig::default());
    engine.init_buckets().await.unwrap();
    engine
}

pub fn new_network_input(nic_tag: &str) -> NewNetwork {
    NewNetwork {
        name: format!("{nic_tag}-net"),
        nic_tag: nic_tag.to_string(),
        vlan_id: 10,
        subnet: "10.99.99.0/24".parse().unwrap(),
        provision_start: "10.99.99.38".parse().unwrap(),
        provision_end: "10.99.99.253".parse().unwrap(),
        gateway: Some("10.99.99.1".parse().unwrap()),
        resolvers: vec!["10.99.99.11".parse().unwrap()],
        routes: Vec::<Route>::new(),
        owner_uuids: None,
        fabric: false,
        vnet_id: None,
        internet_nat: false,
        mtu: None,
        description: None,
    }
}

pub async fn create_test_network(engine: &Engine, nic_tag: &str) -> Network {
    engine.create_network(new_network_input(nic_tag)).await.unwrap()
}
