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

use carbide_uuid::instance_type::InstanceTypeId;
use config_version::ConfigVersion;
use model::instance_type::{InstanceType, InstanceTypeMachineCapabilityFilter};
use model::metadata::Metadata;
use sqlx::{PgConnection, Postgres};

use crate::DatabaseError;

/// Creates a new InstanceType DB record.  It enforces a unique `name` by
/// only creating if there is no active record found with the same name.
///
/// * `txn`               - A reference to an active DB transaction
/// * `new_instance_type` - A reference to a NewInstanceType struct with the
///   details of the InstanceType to create
pub async fn create(
    txn: &mut PgConnection,
    id: &InstanceTypeId,
    metadata: &Metadata,
    desired_capabilities: &[InstanceTypeMachineCapabilityFilter],
) -> Result<InstanceType, DatabaseError> {
    let query = "INSERT INTO instance_types
                (id, name, labels, description, desired_capabilities, version)
            SELECT $1::varchar, $2::varchar, $3::jsonb, $4::varchar, $5::jsonb, $6::varchar
            WHERE NOT EXISTS
                /* There should be a unique constraint on id.  The condition here is just defensive. */
                (SELECT id FROM instance_types WHERE id=$7::varchar OR (name=$8::varchar AND deleted IS NULL))
            RETURNING *";

    match sqlx::query_as::<Postgres, InstanceType>(query)
        .bind(id)
        .bind(&metadata.name)
        .bind(sqlx::types::Json(&metadata.labels))
        .bind(&metadata.description)
        .bind(sqlx::types::Json(desired_capabilities))
        .bind(ConfigVersion::initial())
        .bind(id)
        .bind(&metadata.name)
        .fetch_one(txn)
        .await
    {
        Ok(instance_type) => Ok(instance_type),
        // This error should only show up when we didn't
        // create a record because the subquery found an existing name already.
        Err(sqlx::Error::RowNotFound) => Err(DatabaseError::AlreadyFoundError {
            kind: "InstanceType",
            id: metadata.name.clone(),
        }),
        Err(e) => Err(DatabaseError::query(query, e)),
    }
}

/// Returns a list of IDs for all non-deleted InstanceType records.
///
/// * `txn`        - A reference to an active DB transaction
/// * `for_update` - A boolean flag to acquire DB locks for synchronization
pub async fn find_ids(
    txn: &mut PgConnection,
    for_update: bool,
) -> Result<Vec<InstanceTypeId>, DatabaseError> {
    let mut builder =
        sqlx::QueryBuilder::new("SELECT id FROM instance_types WHERE deleted is NULL");

    if for_update {
        builder.push(" FOR UPDATE ");
    }

    builder
        .build_query_as()
        .fetch_all(txn)
        .await
        .map_err(|err| DatabaseError::query(builder.sql(), err))
}

/// Queries the DB for non-deleted InstanceType records
/// based on the supplied list of IDs
///
/// * `txn`               - A reference to an active DB transaction
/// * `instance_type_ids` - A list of InstanceTypeId values to use for querying the Db for active InstanceType records
/// * `for_update`        - A boolean flag to acquire DB locks for synchronization
pub async fn find_by_ids(
    txn: &mut PgConnection,
    instance_type_ids: &[InstanceTypeId],
    for_update: bool,
) -> Result<Vec<InstanceType>, DatabaseError> {
    let mut builder =
        sqlx::QueryBuilder::new("SELECT * from instance_types WHERE deleted is NULL AND");

    builder.push(" id = ANY(");
    builder.push_bind(instance_type_ids);
    builder.push(") ");

    if for_update {
        builder.push(" FOR UPDATE ");
    }

    builder
        .build_query_as()
        .bind(instance_type_ids)
        .fetch_all(txn)
        .await
        .map_err(|err| DatabaseError::query(builder.sql(), err))
}

/// Updates an InstanceType records in the DB.
///
/// This does **NOT** check for any machine associations.
///
/// * `txn`                  - A reference to an active DB transaction
/// * `update_instance_type` - A reference to an UpdateInstanceType struct
///   with the details of the InstanceType to update
pub async fn update(
    txn: &mut PgConnection,
    id: &InstanceTypeId,
    metadata: &Metadata,
    desired_capabilities: &[InstanceTypeMachineCapabilityFilter],
    expected_version: ConfigVersion,
) -> Result<InstanceType, DatabaseError> {
    let query = "UPDATE instance_types
            SET
                name=$1::varchar,
                labels=$2::jsonb,
                description=$3::varchar,
                desired_capabilities=$4::jsonb,
                version=$5::varchar
            WHERE
                id=$6::varchar
                AND version = $7::varchar /* This is just to be defensive.  This case is already covered when we query in advance to check and bump version */
                AND deleted IS NULL       /* Also just here to be defensive and for the same reason */
                AND NOT EXISTS
                    (SELECT id FROM instance_types WHERE id!=$8::varchar AND name=$9::varchar AND deleted IS NULL)
            RETURNING *";

    match sqlx::query_as::<Postgres, InstanceType>(query)
        .bind(&metadata.name)
        .bind(sqlx::types::Json(&metadata.labels))
        .bind(&metadata.description)
        .bind(sqlx::types::Json(&desired_capabilities))
        .bind(expected_version.increment())
        .bind(id)
        .bind(expected_version)
        .bind(id)
        .bind(&metadata.name)
        .fetch_one(txn)
        .await
    {
        Ok(instance_type) => Ok(instance_type),
        // This error should only show up when we didn't
        // update a record because the subquery found an existing name already.
        // deleted and version should have already been checked and reported
        // before calling update()
        Err(sqlx::Error::RowNotFound) => Err(DatabaseError::AlreadyFoundError {
            kind: "InstanceType",
            id: metadata.name.clone(),
        }),
        Err(e) => Err(DatabaseError::query(query, e)),
    }
}

/// Soft deletes an instance type by updating the deleted column in the DB.
/// If the record with that ID is already deleted, nothing changes and Ok(None)
/// is returned.
///
/// This does **NOT** check for any machine associations.
///
/// * `txn`              - A reference to an active DB transaction
/// * `instance_type_id` - An InstanceTypeId for the InstanceType to be soft-deleted
pub async fn soft_delete(
    txn: &mut PgConnection,
    instance_type_id: &InstanceTypeId,
) -> Result<Option<InstanceTypeId>, DatabaseError> {
    let query = "UPDATE instance_types SET deleted=NOW() WHERE id=$1::varchar AND deleted is NULL RETURNING id";

    match sqlx::query_as(query)
        .bind(instance_type_id)
        .fetch_one(txn)
        .await
    {
        Ok(instance_type) => Ok(Some(instance_type)),
        Err(sqlx::Error::RowNotFound) => Ok(None),
        Err(e) => Err(DatabaseError::query(query, e)),
    }
}
