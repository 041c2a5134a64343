/*
 * SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: LicenseRef-NvidiaProprietary
 *
 * NVIDIA CORPORATION, its affiliates and licensors retain all intellectual
 * property and proprietary rights in and to this material, related
 * documentation and any modifications thereto. Any use, reproduction,
 * disclosure or distribution of this material and related documentation
 * without an express license agreement from NVIDIA CORPORATION or
 * its affiliates is strictly prohibited.
 */

use std::sync::Arc;

use async_trait::async_trait;
use db::DatabaseError;
use forge_secrets::credentials::{CredentialKey, CredentialProvider, Credentials};
use libnmxm::{Nmxm, NmxmApiError};

use crate::handlers::credential::DEFAULT_NMX_M_NAME;

#[allow(dead_code)]
#[derive(thiserror::Error, Debug)]
pub enum NvLinkPartitionError {
    #[error("Failed to look up credentials {0}")]
    MissingCredentials(eyre::Report),
    #[error("Failed NMX-M api request {0}")]
    NmxmApiError(NmxmApiError),
    #[error("Database error {0}")]
    DbError(DatabaseError),
    #[error("{0}: {1} in use / busy")]
    ObjectInUse(String, String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid arguments")]
    InvalidArguments,
    #[error("Invalid API response")]
    InvalidApiResponse,
}

#[async_trait]
pub trait NmxmClientPool: Send + Sync + 'static {
    async fn create_client(
        &self,
        endpoint: &str,
        nmxm_id: Option<String>,
    ) -> Result<Box<dyn Nmxm>, NvLinkPartitionError>;
}

#[allow(dead_code)]
#[derive(Debug)]
pub struct NmxmClientPoolImpl<C> {
    pool: libnmxm::NmxmClientPool,
    credential_provider: Arc<C>,
}

impl<C: CredentialProvider + 'static> NmxmClientPoolImpl<C> {
    pub fn new(credential_provider: Arc<C>, pool: libnmxm::NmxmClientPool) -> Self {
        NmxmClientPoolImpl {
            credential_provider,
            pool,
        }
    }
}

#[async_trait]
impl<C: CredentialProvider + 'static> NmxmClientPool for NmxmClientPoolImpl<C> {
    async fn create_client(
        &self,
        endpoint: &str,
        nmxm_id: Option<String>,
    ) -> Result<Box<dyn Nmxm>, NvLinkPartitionError> {
        let id = nmxm_id.unwrap_or(DEFAULT_NMX_M_NAME.to_string());
        let credentials = self
            .credential_provider
            .get_credentials(&CredentialKey::NmxM { nmxm_id: id })
            .await
            .map_err(|e| NvLinkPartitionError::MissingCredentials(eyre::Report::from(e)))?
            .ok_or(NvLinkPartitionError::MissingCredentials(eyre::Report::msg(
                "NMX-M credentials not found",
            )))?;
        let (user, pass) = match credentials {
            Credentials::UsernamePassword { username, password } => (username, password),
        };
        if endpoint.parse::<http::Uri>().is_err() {
            return Err(NvLinkPartitionError::InvalidArguments);
        };
        let endpoint = libnmxm::Endpoint {
            host: endpoint.to_string(),
            username: Some(user),
            password: Some(pass),
        };

        self.pool
            .create_client(endpoint)
            .await
            .map_err(NvLinkPartitionError::NmxmApiError)
    }
}
