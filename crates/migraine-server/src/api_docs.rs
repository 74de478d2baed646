// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OpenAPI documentation for migraine-server, served at `/api/openapi.json`.

use axum::{extract::State, Json};
use utoipa::openapi::server::Server;
use utoipa::OpenApi;

use crate::api::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Migraine Server API",
        version = "1.0.0",
        description = "Provisions CouchDB accounts, each with a private per-user database.",
        license(name = "Proprietary"),
        contact(
            name = "Geoffrey Huntley",
            email = "ghuntley@ghuntley.com",
            url = "https://ghuntley.com"
        )
    ),
    tags(
        (name = "users", description = "Account provisioning and deprovisioning"),
        (name = "health", description = "Health checks")
    ),
    paths(
        crate::routes::users::create_user,
        crate::routes::users::list_users,
        crate::routes::users::get_user,
        crate::routes::users::delete_user,
        crate::routes::health::health_check,
    ),
    components(schemas(
        crate::routes::users::CreateUserRequest,
        crate::routes::users::DeleteUserRequest,
        crate::routes::users::UserResponse,
        crate::routes::users::UserListResponse,
        crate::routes::health::HealthResponse,
        crate::routes::health::ComponentHealth,
        crate::routes::health::HealthStatus,
        crate::error::ErrorResponse,
    ))
)]
pub struct ApiDoc;

/// GET /api/openapi.json - The OpenAPI document with the configured server URL.
pub async fn openapi_json(State(state): State<AppState>) -> Json<utoipa::openapi::OpenApi> {
	let mut doc = ApiDoc::openapi();
	doc.servers = Some(vec![Server::new(state.base_url.as_str())]);
	Json(doc)
}
