/*
 * SPDX-FileCopyrightText: Copyright (c) 2021-2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
 * SPDX-License-Identifier: LicenseRef-NvidiaProprietary
 *
 * NVIDIA CORPORATION, its affiliates and licensors retain all intellectual
 * property and proprietary rights in and to this material, related
 * documentation and any modifications thereto. Any use, reproduction,
 * disclosure or distribution of this material and related documentation
 * without an express license agreement from NVIDIA CORPORATION or
 * its affiliates is strictly prohibited.
 */
use std::str::FromStr;

use axum::http::uri::PathAndQuery;
use axum::http::{Request, Uri};
use axum::response::Response;

pub mod logging;
pub mod metrics;

pub async fn normalize_url<B>(mut request: Request<B>) -> Request<B> {
    let uri = request.uri_mut();
    if let Some(p_q) = uri.path_and_query() {
        let path_and_query = p_q.to_string();
        let removed_duplicated_slashes = path_and_query.as_str().replace("//", "/");
        let new_path_and_query = match PathAndQuery::from_str(removed_duplicated_slashes.as_str()) {
            Ok(path_and_query) => path_and_query,
            _ => unreachable!(),
        };
        *uri = Uri::from(new_path_and_query);
    }
    request
}

// Converts content-length -> Content-Length to work with BMC http-download FW 24.07
pub async fn fix_content_length_header<B>(mut response: Response<B>) -> Response<B> {
    if let Some(value) = response.headers_mut().remove("content-length") {
        response.headers_mut().insert("Content-Length", value);
    }

    response
}
