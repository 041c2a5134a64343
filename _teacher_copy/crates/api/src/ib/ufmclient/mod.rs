/*
 * SPDX-FileCopyrightText: Copyright (c) 2021-2023 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: LicenseRef-NvidiaProprietary
 *
 * NVIDIA CORPORATION, its affiliates and licensors retain all intellectual
 * property and proprietary rights in and to this material, related
 * documentation and any modifications thereto. Any use, reproduction,
 * disclosure or distribution of this material and related documentation
 * without an express license agreement from NVIDIA CORPORATION or
 * its affiliates is strictly prohibited.
 */

use std::collections::{HashMap, HashSet};
use std::fmt;

use base64::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use self::rest::{RestClient, RestClientConfig, RestError, RestScheme};
use crate::ib::ufmclient::rest::ResponseDetails;

mod rest;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SmConfig {
    /// The subnet_prefix of openSM
    pub subnet_prefix: String,
    /// The m_key of openSM
    pub m_key: String,
    /// The sm_key of openSM
    pub sm_key: String,
    /// The sa_key of openSM
    pub sa_key: String,
    /// The m_key_per_port of openSM
    pub m_key_per_port: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PartitionQoS {
    // Default 2k; one of 2k or 4k; the MTU of the services.
    pub mtu_limit: u16,
    // Default is None, value can be range from 0-15
    pub service_level: u8,
    /// Supported values: 10, 30, 5, 20, 40, 60, 80, 120, 14, 56, 112, 168, 25, 100, 200, or 300.
    /// 2 is also valid but is used internally to represent rate limit 2.5 that is possible in UFM for lagecy hardware.
    /// It is done to avoid floating point data type usage for rate limit w/o obvious benefits.
    /// 2 to 2.5 and back conversion is done just on REST API operations.
    pub rate_limit: f32,
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PortMembership {
    Limited,
    Full,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PortConfig {
    /// The GUID of Port.
    pub guid: String,
    /// Default false; store the PKey at index 0 of the PKey table of the GUID.
    pub index0: bool,
    /// Default is full:
    ///   "full"    - members with full membership can communicate with all hosts (members) within the network/partition
    ///   "limited" - members with limited membership cannot communicate with other members with limited membership.
    ///               However, communication is allowed between every other combination of membership types.
    pub membership: PortMembership,
}

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey(u16);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Partition {
    /// The name of Partition.
    pub name: String,
    /// The pkey of Partition.
    pub pkey: PartitionKey,
    /// Default false
    pub ipoib: bool,
    /// The QoS of Partition.
    pub qos: Option<PartitionQoS>,
    /// GUIDS attached to the Partition. Only available if explictly queried for
    pub guids: Option<HashSet<String>>,
    /// The default membership status of ports on this partition
    /// The value is only available if all of these things are true:
    /// - The partition is the default partition
    /// - associated ports/guid are queried
    /// - UFM version is 6.19 or newer
    pub membership: Option<PortMembership>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct Port {
    pub guid: String,
    pub name: String,
    #[serde(rename = "systemID")]
    pub system_id: String,
    pub lid: i32,
    pub dname: String,
    pub system_name: String,
    pub physical_state: String,
    pub logical_state: String,
}

#[derive(Default)]
pub struct Filter {
    pub guids: Option<HashSet<String>>,
    pub pkey: Option<PartitionKey>,
    pub logical_state: Option<String>,
}

#[derive(Default, Debug, Copy, Clone)]
pub struct GetPartitionOptions {
    /// Whether to include `guids` associated with each partition in the response
    pub include_guids_data: bool,
    /// Whether the response should contain the `qos_conf` and `ip_over_ib` parameters
    pub include_qos_conf: bool,
}

/// Partition data with extra options as presented by UFM
#[derive(Serialize, Deserialize, Debug)]
struct PartitionData {
    partition: String,
    ip_over_ib: bool,
    /// Quality of Service related data. Only available if `qos_conf==true`
    qos_conf: Option<PartitionQoS>,
    /// Ports attached to a partition. Only available if `guids_data==true`
    #[serde(default)]
    guids: Vec<PortConfig>,
    /// The default membership status of ports on this partition
    /// The value is only available if all of these things are true:
    /// - The partition is the default partition
    /// - associated ports/guid are queried with `guids_data==true`
    /// - UFM version is 6.19 or newer
    pub membership: Option<PortMembership>,
}

const HEX_PRE: &str = "0x";

impl TryFrom<u16> for PartitionKey {
    type Error = UFMError;

    fn try_from(pkey: u16) -> Result<Self, Self::Error> {
        if pkey != (pkey & 0x7fff) {
            return Err(UFMError::InvalidPKey(pkey.to_string()));
        }

        Ok(PartitionKey(pkey))
    }
}

impl TryFrom<String> for PartitionKey {
    type Error = UFMError;

    fn try_from(pkey: String) -> Result<Self, Self::Error> {
        let pkey = pkey.to_lowercase();
        let base = if pkey.starts_with(HEX_PRE) { 16 } else { 10 };
        let p = pkey.trim_start_matches(HEX_PRE);
        let k = u16::from_str_radix(p, base);

        match k {
            Ok(v) => Ok(PartitionKey(v)),
            Err(_e) => Err(UFMError::InvalidPKey(pkey.to_string())),
        }
    }
}

impl TryFrom<&String> for PartitionKey {
    type Error = UFMError;

    fn try_from(pkey: &String) -> Result<Self, Self::Error> {
        PartitionKey::try_from(pkey.to_string())
    }
}

impl TryFrom<&str> for PartitionKey {
    type Error = UFMError;

    fn try_from(pkey: &str) -> Result<Self, Self::Error> {
        PartitionKey::try_from(pkey.to_string())
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{HEX_PRE}{:x}", self.0)
    }
}

impl From<PartitionKey> for u16 {
    fn from(v: PartitionKey) -> u16 {
        v.0
    }
}

pub struct Ufm {
    client: RestClient,
}

#[derive(Error, Debug)]
pub enum UFMError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid pkey '{0}'")]
    InvalidPKey(String),
    #[error("Invalid configuration: '{0}'")]
    InvalidConfig(String),
    #[error("Response body can not be deserialized: {body}")]
    MalformedResponse {
        status_code: u16,
        body: String,
        headers: Box<http::HeaderMap>,
    },
    #[error("failed to execute HTTP request: {0}")]
    HttpConnectionError(String),
    #[error("HTTP error code {status_code}")]
    HttpError {
        status_code: u16,
        body: String,
        headers: Box<http::HeaderMap>,
    },
    /// This error type is just needed because UFM in some cases does not return a 404 status
    /// code but a 200 status code with a body containing {}
    #[error(
        "Resource at path {path} was not found. UFM returned: '{body}'. Status code: {status_code}"
    )]
    NotFound {
        path: String,
        status_code: u16,
        body: String,
        headers: Box<http::HeaderMap>,
    },
}

impl From<RestError> for UFMError {
    fn from(e: RestError) -> Self {
        match e {
            RestError::InvalidConfig(msg) => UFMError::InvalidConfig(msg),
            RestError::HttpConnectionError(msg) => UFMError::HttpConnectionError(msg),
            RestError::HttpError {
                status_code,
                body,
                headers,
            } => UFMError::HttpError {
                status_code,
                body,
                headers,
            },
            RestError::MalformedResponse {
                status_code,
                body,
                headers,
            } => UFMError::MalformedResponse {
                status_code,
                body,
                headers,
            },
            RestError::NotFound {
                path,
                status_code,
                body,
                headers,
            } => UFMError::NotFound {
                path,
                status_code,
                body,
                headers,
            },
        }
    }
}

#[derive(Clone, Debug)]
pub struct UFMCert {
    pub ca_crt: String,
    pub tls_key: String,
    pub tls_crt: String,
}

pub struct UFMConfig {
    pub address: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    pub cert: Option<UFMCert>,
}

pub fn new_client(conf: UFMConfig) -> Result<Ufm, UFMError> {
    let addr = Url::parse(&conf.address)
        .map_err(|_| UFMError::InvalidConfig(format!("invalid UFM url: {}", conf.address)))?;
    let address = addr.host_str().ok_or(UFMError::InvalidConfig(format!(
        "invalid UFM host; url: {addr}"
    )))?;

    let (base_path, auth_info) = match &conf.token {
        None if conf.cert.is_some() => {
            let auth_cert = conf.cert.unwrap();
            (
                "/ufmRest".to_string(),
                format!(
                    "{}\n{}\n{}",
                    auth_cert.ca_crt, auth_cert.tls_key, auth_cert.tls_crt
                ),
            )
        }
        None => {
            let password = conf
                .password
                .clone()
                .ok_or(UFMError::InvalidConfig("password is empty".to_string()))?;
            let username = conf
                .username
                .clone()
                .ok_or(UFMError::InvalidConfig("username is empty".to_string()))?;

            (
                "/ufmRest".to_string(),
                BASE64_STANDARD.encode(format!("{username}:{password}")),
            )
        }
        Some(t) => ("/ufmRestV3".to_string(), t.to_string()),
    };

    let c = RestClient::new(&RestClientConfig {
        address: address.to_string(),
        port: addr.port(),
        auth_info,
        base_path,
        scheme: RestScheme::from(addr.scheme().to_string()),
    })?;

    Ok(Ufm { client: c })
}

impl Ufm {
    pub async fn get_sm_config(&self) -> Result<SmConfig, UFMError> {
        let path = String::from("/app/smconf");
        let sm_config: SmConfig = self.client.get(&path).await?.0;

        Ok(sm_config)
    }

    pub async fn update_partition_qos(
        &self,
        pkey: PartitionKey,
        qos: PartitionQoS,
    ) -> Result<(), UFMError> {
        let path = String::from("/resources/pkeys/qos_conf");

        #[derive(Serialize, Deserialize, Debug)]
        struct PkeyQoS {
            pkey: String,
            mtu_limit: u16,
            service_level: u8,
            rate_limit: f32,
        }

        let data = serde_json::to_string(&PkeyQoS {
            pkey: pkey.to_string(),
            mtu_limit: qos.mtu_limit,
            rate_limit: qos.rate_limit,
            service_level: qos.service_level,
        })
        .map_err(|_| UFMError::InvalidConfig("invalid partition qos".to_string()))?;

        self.client.put(&path, data).await?;

        Ok(())
    }

    pub async fn bind_ports(&self, p: Partition, ports: Vec<PortConfig>) -> Result<(), UFMError> {
        let path = String::from("/resources/pkeys");

        let mut membership = PortMembership::Full;
        let mut index0 = true;

        let mut guids = Vec::with_capacity(ports.len());
        for pb in ports {
            membership = pb.membership;
            index0 = pb.index0;
            guids.push(pb.guid.to_string());
        }

        #[derive(Serialize, Deserialize, Debug)]
        struct Pkey {
            pkey: String,
            ip_over_ib: bool,
            membership: PortMembership,
            index0: bool,
            guids: Vec<String>,
        }

        let pkey = Pkey {
            pkey: p.pkey.clone().to_string(),
            ip_over_ib: p.ipoib,
            membership,
            index0,
            guids,
        };

        let data = serde_json::to_string(&pkey)
            .map_err(|_| UFMError::InvalidConfig("invalid partition".to_string()))?;

        self.client.post(&path, data).await?;

        Ok(())
    }

    pub async fn unbind_ports(
        &self,
        pkey: PartitionKey,
        guids: Vec<String>,
    ) -> Result<(), UFMError> {
        let path = String::from("/actions/remove_guids_from_pkey");

        #[derive(Serialize, Deserialize, Debug)]
        struct Pkey {
            pkey: String,
            guids: Vec<String>,
        }

        let pkey = Pkey {
            pkey: pkey.clone().to_string(),
            guids,
        };

        let data = serde_json::to_string(&pkey)
            .map_err(|_| UFMError::InvalidConfig("invalid partition".to_string()))?;

        self.client.post(&path, data).await?;

        Ok(())
    }

    pub async fn list_partitions(
        &self,
        options: GetPartitionOptions,
    ) -> Result<HashMap<PartitionKey, Partition>, UFMError> {
        let path = match (options.include_guids_data, options.include_qos_conf) {
            (true, true) => {
                // This API is not supported in current UFM version: https://nvbugspro.nvidia.com/bug/5409095
                // Instead of returning unexpected results, don't even try to talk to UFM
                // and make developers aware of the issue.
                // That at least allows the application developer to implement a workaround
                return Err(UFMError::InvalidArgument("Returning qos_conf and guids_data is not supported: https://nvbugspro.nvidia.com/bug/5409095".to_string()));
            }
            (true, false) => "/resources/pkeys?guids_data=true",
            (false, true) => "/resources/pkeys?qos_conf=true",
            (false, false) => "/resources/pkeys?qos_conf=true", // Without any query argument, UFM return structure is different
        };

        let partitions: HashMap<String, PartitionData> = self.client.get(path).await?.0;

        let mut results = HashMap::with_capacity(partitions.len());
        for (pkey, partition) in partitions.into_iter() {
            let pkey = PartitionKey::try_from(pkey)?;
            let partition = Partition {
                name: partition.partition,
                pkey,
                ipoib: partition.ip_over_ib,
                qos: partition.qos_conf,
                guids: match options.include_guids_data {
                    true => Some(partition.guids.into_iter().map(|p| p.guid).collect()),
                    false => None,
                },
                membership: partition.membership,
            };
            results.insert(pkey, partition);
        }

        Ok(results)
    }

    pub async fn get_partition(
        &self,
        pkey: PartitionKey,
        options: GetPartitionOptions,
    ) -> Result<Partition, UFMError> {
        let mut path = format!("/resources/pkeys/{pkey}");
        let mut has_query_args = false;
        if options.include_guids_data {
            path.push(if has_query_args { '&' } else { '?' });
            has_query_args = true;
            path += "guids_data=true";
        }
        if options.include_qos_conf {
            path.push(if has_query_args { '&' } else { '?' });
            path += "qos_conf=true";
        }

        let partition: PartitionData = self.client.get(&path).await?.0;

        Ok(Partition {
            name: partition.partition,
            pkey,
            ipoib: partition.ip_over_ib,
            qos: partition.qos_conf,
            guids: match options.include_guids_data {
                true => Some(partition.guids.into_iter().map(|p| p.guid).collect()),
                false => None,
            },
            membership: partition.membership,
        })
    }

    pub async fn list_port(&self, filter: Option<Filter>) -> Result<Vec<Port>, UFMError> {
        let path = String::from("/resources/ports?sys_type=Computer");
        let ports: Vec<Port> = self.client.list(&path).await?.0;

        let f = filter.unwrap_or_default();
        let pkey_guids = match f.pkey {
            Some(pkey) => Some(
                self.get_partition(
                    pkey,
                    GetPartitionOptions {
                        include_guids_data: true,
                        include_qos_conf: false,
                    },
                )
                .await?
                .guids,
            ),
            None => None,
        }
        .flatten();

        Ok(Self::filter_ports(
            ports,
            pkey_guids,
            f.guids,
            f.logical_state,
        ))
    }

    fn filter_ports(
        ports: Vec<Port>,
        pkey_guids: Option<HashSet<String>>,
        guids: Option<HashSet<String>>,
        logical_state: Option<String>,
    ) -> Vec<Port> {
        let guid_filter = match (pkey_guids, guids) {
            // If both are None, means no filter, return all ports.
            (None, None) => None,
            // If just one is None, filter ports by the other guids set.
            (Some(pkey_guids), None) => Some(pkey_guids),
            (None, Some(guids)) => Some(guids),
            // If both are Some, filter ports by the intersection.
            (Some(pkey_guids), Some(guids)) => {
                Some(pkey_guids.intersection(&guids).cloned().collect())
            }
        };

        let ports = match guid_filter {
            // If no filter, return all ports;
            None => ports,
            // otherwise, filter ports accordingly.
            Some(filter) => ports
                .into_iter()
                .filter(|p: &Port| filter.contains(&p.guid))
                .collect(),
        };

        match logical_state {
            None => ports,
            Some(logical_state) => {
                let logical_state = logical_state.to_lowercase();
                let logical_state = logical_state.as_str().trim();
                ports
                    .into_iter()
                    .filter(|p| p.logical_state.to_lowercase().as_str().trim() == logical_state)
                    .collect()
            }
        }
    }

    pub async fn version(&self) -> Result<String, UFMError> {
        #[derive(Serialize, Deserialize, Debug)]
        struct Version {
            ufm_release_version: String,
        }

        let path = String::from("/app/ufm_version");
        let v: Version = self.client.get(&path).await?.0;

        Ok(v.ufm_release_version)
    }

    pub async fn raw_get(&self, path: &str) -> Result<(String, ResponseDetails), UFMError> {
        let (body, details) = self.client.get_raw(path).await?;

        Ok((body, details))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_port() {
        struct TestCase {
            name: String,
            ports: Vec<Port>,
            pkey_guids: Option<HashSet<String>>,
            guids: Option<HashSet<String>>,
            port_state: Option<String>,
            expected: Vec<Port>,
        }

        let p1_id = String::from("p1");
        let p1 = Port {
            guid: p1_id.clone(),
            logical_state: "Active".to_string(),
            ..Port::default()
        };

        let p2_id = String::from("p2");
        let p2 = Port {
            guid: p2_id.clone(),
            logical_state: "Down".to_string(),
            ..Port::default()
        };

        let p3_id = String::from("p3");
        let p3 = Port {
            guid: p3_id.clone(),
            logical_state: "Initialize".to_string(),
            ..Port::default()
        };

        let cases = vec![
            TestCase {
                name: String::from("no filter"),
                ports: vec![p1.clone(), p2.clone(), p3.clone()],
                pkey_guids: None,
                guids: None,
                port_state: None,
                expected: vec![p1.clone(), p2.clone(), p3.clone()],
            },
            TestCase {
                name: String::from("filter by pkey guids"),
                ports: vec![p1.clone(), p2.clone(), p3.clone()],
                pkey_guids: Some(HashSet::from_iter([p1_id.clone()])),
                guids: None,
                port_state: None,
                expected: vec![p1.clone()],
            },
            TestCase {
                name: String::from("filter by guids"),
                ports: vec![p1.clone(), p2.clone(), p3.clone()],
                pkey_guids: None,
                guids: Some(HashSet::from_iter([p1_id.clone()])),
                port_state: None,
                expected: vec![p1.clone()],
            },
            TestCase {
                name: String::from("filter by guids (1) and pkey guids (1,2)"),
                ports: vec![p1.clone(), p2.clone(), p3.clone()],
                pkey_guids: Some(HashSet::from_iter([p1_id.clone(), p2_id.clone()])),
                guids: Some(HashSet::from_iter([p1_id.clone()])),
                port_state: None,
                expected: vec![p1.clone()],
            },
            TestCase {
                name: String::from("filter by guids (2,3) and pkey guids (1,2)"),
                ports: vec![p1.clone(), p2.clone(), p3.clone()],
                pkey_guids: Some(HashSet::from_iter([p1_id.clone(), p2_id.clone()])),
                guids: Some(HashSet::from_iter([p2_id, p3_id])),
                port_state: None,
                expected: vec![p2.clone()],
            },
            TestCase {
                name: String::from("filter by port statet"),
                ports: vec![p1.clone(), p2.clone(), p3.clone()],
                pkey_guids: None,
                guids: None,
                port_state: Some("Active".to_string()),
                expected: vec![p1.clone()],
            },
            TestCase {
                name: String::from("filter by guids and port state"),
                ports: vec![p1, p2, p3],
                pkey_guids: None,
                guids: Some(HashSet::from_iter([p1_id])),
                port_state: Some("Disabled".to_string()),
                expected: vec![],
            },
        ];

        for c in cases {
            let got = Ufm::filter_ports(c.ports, c.pkey_guids, c.guids, c.port_state);
            assert_eq!(c.expected, got, "{}", c.name);
        }
    }
}
