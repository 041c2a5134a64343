//! The IP allocator: owner check, explicit-IP takeover,
//! and the gap-search-then-range-scan next-free path.
//!
//! The per-network IP bucket is keyed by the *numeric* form of the
//! address (`Address::to_u128()` as a decimal string) rather than its
//! dotted/colon form, so that `StoreAdapter::gap_search` - which probes
//! keys as plain integers - can walk it directly.

use napi_ip::{Address, IpAddressFamily};
use napi_models::{Assignment, BelongsToType, Ip, Network};
use napi_store::{BatchOp, Filter, FindOptions, Precondition, StoreAdapter, StoreError};
use napi_uuid::{BelongsToId, OwnerId};
use serde_json::{json, Value};

use crate::error::NapiError;

/// Bounded retry count for the allocator's own internal batch commit,
/// used by [`allocate`] when it drives the store directly (e.g. seeding
/// bootstrap records). The NIC engine has its own outer retry loop and
/// calls [`candidate`] directly instead.
pub const ALLOCATOR_RETRIES: usize = 100;

/// How many next-free candidates the range-scan fallback considers
/// before giving up.
const RANGE_SCAN_LIMIT: usize = 32;

pub const ADDRESS_NUM_FIELD: &str = "address_num";
pub const BELONGS_TO_UUID_FIELD: &str = "belongs_to_uuid";
pub const RESERVED_FIELD: &str = "reserved";

pub fn ip_key(address: Address) -> String {
    address.to_u128().to_string()
}

fn address_from_numeric(family: IpAddressFamily, n: u128) -> Result<Address, NapiError> {
    match family {
        IpAddressFamily::Ipv4 => {
            let n: u32 = n.try_into().map_err(|_| NapiError::Internal { message: "address_num out of range for v4".into() })?;
            Ok(Address::V4(n))
        }
        IpAddressFamily::Ipv6 => Ok(Address::V6(n)),
    }
}

fn ip_value(ip: &Ip) -> Result<serde_json::Map<String, Value>, NapiError> {
    match serde_json::to_value(ip).map_err(|e| NapiError::Internal { message: e.to_string() })? {
        Value::Object(map) => {
            let mut map = map;
            map.insert(ADDRESS_NUM_FIELD.to_string(), json!(ip.address.to_u128() as f64));
            // `belongs_to_uuid` is nested inside the optional `assignment`
            // triplet on the wire; flatten it to a top-level, indexable
            // field so `find` can select "no triplet" addresses without every adapter having to reach into
            // nested JSON.
            match ip.assignment {
                Some(assignment) => {
                    map.insert(BELONGS_TO_UUID_FIELD.to_string(), json!(assignment.belongs_to_uuid.to_string()));
                }
                None => {
                    map.remove(BELONGS_TO_UUID_FIELD);
                }
            }
            Ok(map)
        }
        _ => Err(NapiError::Internal { message: "Ip must serialize to an object".into() }),
    }
}

fn ip_from_value(value: &serde_json::Map<String, Value>) -> Result<Ip, NapiError> {
    serde_json::from_value(Value::Object(value.clone())).map_err(|e| NapiError::Internal { message: e.to_string() })
}

/// Parameters for a single IP request, independent of whether the caller
/// supplied an explicit address.
#[derive(Debug, Clone)]
pub struct IpRequest {
    pub owner_uuid: OwnerId,
    pub belongs_to_uuid: BelongsToId,
    pub belongs_to_type: BelongsToType,
    pub reserved: bool,
    pub explicit_ip: Option<Address>,
    pub check_owner: bool,
}

/// The batch operation to append for a chosen address, plus the address
/// itself so the caller can denormalize it onto the NIC record.
pub struct Candidate {
    pub address: Address,
    pub op: BatchOp,
}

/// Select a candidate address for `req` against `network` and build the
/// `BatchOp` that claims it. Does not commit; the caller appends this to
/// its own batch and retries from here on an
/// `EtagConflict` whose bucket is this network's IP bucket.
pub async fn candidate(store: &dyn StoreAdapter, network: &Network, req: &IpRequest) -> Result<Candidate, NapiError> {
    if !network.permits_owner(req.owner_uuid, req.check_owner) {
        return Err(NapiError::invalid("owner_uuid", "owner is not permitted to provision on this network"));
    }

    let bucket = network.ip_bucket_name();
    let assignment = Assignment {
        belongs_to_uuid: req.belongs_to_uuid,
        belongs_to_type: req.belongs_to_type,
        owner_uuid: req.owner_uuid,
    };

    if let Some(address) = req.explicit_ip {
        if address.family() != network.family || !network.subnet.contains(address) {
            return Err(NapiError::invalid("ip", "address is not within the network's subnet"));
        }

        let key = ip_key(address);
        let precondition = match store.get(&bucket, &key).await {
            Ok(record) => {
                let current = ip_from_value(&record.value)?;
                if !current.is_provisionable(napi_uuid::admin_owner()) {
                    let holder = current.assignment.expect("is_provisionable checked assignment is Some");
                    return Err(NapiError::used_by(
                        "ip",
                        "address is already assigned",
                        json!({
                            "belongs_to_type": holder.belongs_to_type,
                            "belongs_to_uuid": holder.belongs_to_uuid.to_string(),
                        }),
                    ));
                }
                Precondition::Etag(record.etag)
            }
            Err(StoreError::NotFound { .. }) => Precondition::Create,
            Err(other) => return Err(other.into()),
        };

        let mut ip = Ip::free(address);
        ip.reserved = req.reserved;
        ip.assign(assignment);
        let op = BatchOp::Put { bucket, key, value: ip_value(&ip)?, precondition };
        return Ok(Candidate { address, op });
    }

    // Next-free path.
    let start = ip_key(network.provision_start);
    let end = ip_key(network.provision_end);
    let address = match store.gap_search(&bucket, &start, &end).await? {
        Some(key) => {
            let n: u128 = key.parse().map_err(|_| NapiError::Internal { message: "gap_search returned a non-numeric key".into() })?;
            address_from_numeric(network.family, n)?
        }
        None => {
            let filter = Filter::and([
                Filter::ge(ADDRESS_NUM_FIELD, json!(network.provision_start.to_u128() as f64)),
                Filter::le(ADDRESS_NUM_FIELD, json!(network.provision_end.to_u128() as f64)),
                Filter::not(Filter::present(BELONGS_TO_UUID_FIELD)),
                Filter::eq(RESERVED_FIELD, json!(false)),
            ]);
            let options = FindOptions { sort: Some(ADDRESS_NUM_FIELD.to_string()), limit: Some(RANGE_SCAN_LIMIT), offset: None };
            let records = store.find(&bucket, &filter, &options).await?;
            let Some(record) = records.into_iter().next() else {
                return Err(NapiError::SubnetFull);
            };
            let current = ip_from_value(&record.value)?;
            let mut ip = current;
            ip.assign(assignment);
            ip.reserved = req.reserved;
            let op = BatchOp::Put { bucket, key: record.key, value: ip_value(&ip)?, precondition: Precondition::Etag(record.etag) };
            return Ok(Candidate { address: ip.address, op });
        }
    };

    let mut ip = Ip::free(address);
    ip.reserved = req.reserved;
    ip.assign(assignment);
    let key = ip_key(address);
    let op = BatchOp::Put { bucket, key, value: ip_value(&ip)?, precondition: Precondition::Create };
    Ok(Candidate { address, op })
}

/// Build the "free" or "unassign" operation for an IP being released.
/// `current` is the record as last read; its etag becomes the
/// precondition.
pub fn release_op(network: &Network, mut current: Ip, etag: napi_store::Etag) -> Result<BatchOp, NapiError> {
    current.unassign();
    let bucket = network.ip_bucket_name();
    let key = ip_key(current.address);
    Ok(BatchOp::Put { bucket, key, value: ip_value(&current)?, precondition: Precondition::Etag(etag) })
}

/// Resolve the current record for `address` on `network`, for callers
/// that need to read-before-release (NIC update/delete).
pub async fn read(store: &dyn StoreAdapter, network: &Network, address: Address) -> Result<(Ip, napi_store::Etag), NapiError> {
    let bucket = network.ip_bucket_name();
    let key = ip_key(address);
    let record = store.get(&bucket, &key).await?;
    Ok((ip_from_value(&record.value)?, record.etag))
}

/// Drive [`candidate`] to a committed address in isolation (used to seed
/// bootstrap records and by tests exercising the allocator without a
/// full NIC). The NIC engine instead appends `candidate`'s op to its own
/// batch and retries the whole provisioning loop on conflict.
pub async fn allocate(store: &dyn StoreAdapter, network: &Network, req: &IpRequest) -> Result<Address, NapiError> {
    for _ in 0..ALLOCATOR_RETRIES {
        let chosen = candidate(store, network, req).await?;
        match store.batch(vec![chosen.op]).await {
            Ok(()) => return Ok(chosen.address),
            Err(StoreError::EtagConflict { .. }) => continue,
            Err(other) => return Err(other.into()),
        }
    }
    Err(NapiError::Unavailable { message: "IP allocator retry budget exhausted".to_string() })
}
