/*
 * SPDX-FileCopyrightText: Copyright (c) 2021-2026 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: LicenseRef-NvidiaProprietary
 *
 * NVIDIA CORPORATION, its affiliates and licensors retain all intellectual
 * property and proprietary rights in and to this material, related
 * documentation and any modifications thereto. Any use, reproduction,
 * disclosure or distribution of this material and related documentation
 * without an express license agreement from NVIDIA CORPORATION or
 * its affiliates is strictly prohibited.
 */

use ::rpc::admin_cli::{CarbideCliError, CarbideCliResult, OutputFormat};
use ::rpc::forge as rpc;
use prettytable::{Cell, Row, Table};

use super::args::AddressArgs;
use crate::rpc::ApiClient;

pub async fn get(format: OutputFormat, api_client: &ApiClient) -> CarbideCliResult<()> {
    let route_servers = api_client.0.get_route_servers().await?;

    match format {
        OutputFormat::AsciiTable => {
            let table = route_servers_to_table(&route_servers)?;
            table.printstd();
        }
        OutputFormat::Csv => {
            println!("address,source_type");
            for route_server in &route_servers.route_servers {
                println!("{},{:?}", route_server.address, route_server.source_type)
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&route_servers)?)
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&route_servers)?)
        }
    }

    Ok(())
}

pub async fn add(args: AddressArgs, api_client: &ApiClient) -> CarbideCliResult<()> {
    api_client
        .0
        .add_route_servers(rpc::RouteServers {
            route_servers: args.ip.iter().map(ToString::to_string).collect(),
            source_type: args.source_type as i32,
        })
        .await?;

    Ok(())
}

pub async fn remove(args: AddressArgs, api_client: &ApiClient) -> CarbideCliResult<()> {
    api_client
        .0
        .remove_route_servers(rpc::RouteServers {
            route_servers: args.ip.iter().map(ToString::to_string).collect(),
            source_type: args.source_type as i32,
        })
        .await?;

    Ok(())
}

pub async fn replace(args: AddressArgs, api_client: &ApiClient) -> CarbideCliResult<()> {
    api_client
        .0
        .replace_route_servers(rpc::RouteServers {
            route_servers: args.ip.iter().map(ToString::to_string).collect(),
            source_type: args.source_type as i32,
        })
        .await?;

    Ok(())
}

// route_servers_to_table converts the RouteServerEntries
// response into a pretty ASCII table.
fn route_servers_to_table(
    route_server_entries: &rpc::RouteServerEntries,
) -> CarbideCliResult<Table> {
    let mut table = Table::new();

    table.add_row(Row::new(vec![
        Cell::new("Address"),
        Cell::new("Source Type"),
    ]));

    for route_server in &route_server_entries.route_servers {
        let source_type = rpc::RouteServerSourceType::try_from(route_server.source_type)
            .map_err(|e| e.to_string())
            .map_err(CarbideCliError::GenericError)?;

        table.add_row(Row::new(vec![
            Cell::new(&route_server.address),
            Cell::new(format!("{source_type:?}").as_str()),
        ]));
    }

    Ok(table)
}
