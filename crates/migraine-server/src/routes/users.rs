// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Account provisioning HTTP handlers.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	Json,
};
use migraine_common_secret::SecretString;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
	api::AppState,
	error::{ApiError, ErrorResponse},
	gate::{Gated, GatedBody, NoBody},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
	pub user_name: String,
	#[schema(value_type = String, format = Password)]
	pub user_password: SecretString,
	/// Required when the server has a provisioning key configured.
	#[serde(default)]
	pub secret_key: Option<String>,
}

impl GatedBody for CreateUserRequest {
	const MUTATING: bool = true;

	fn secret_key(&self) -> Option<&str> {
		self.secret_key.as_deref()
	}
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DeleteUserRequest {
	/// Required when the server has a provisioning key configured.
	#[serde(default)]
	pub secret_key: Option<String>,
}

impl GatedBody for DeleteUserRequest {
	const MUTATING: bool = true;

	fn secret_key(&self) -> Option<&str> {
		self.secret_key.as_deref()
	}
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
	pub status: u16,
	pub user_name: String,
	pub database: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
	pub status: u16,
	pub users: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Account and database created", body = UserResponse),
        (status = 400, description = "Malformed request body", body = ErrorResponse),
        (status = 403, description = "Bad credentials or invalid user name", body = ErrorResponse),
        (status = 409, description = "User already exists", body = ErrorResponse),
        (status = 500, description = "CouchDB failure", body = ErrorResponse)
    ),
    tag = "users"
)]
/// POST /users - Create an account and its private database.
#[tracing::instrument(skip(state, body), fields(user_name = %body.user_name))]
pub async fn create_user(
	State(state): State<AppState>,
	Gated(body): Gated<CreateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
	let session = state.admin_session().await?;
	let account = state
		.observe(
			&session,
			state
				.provisioning
				.create_account(&session, &body.user_name, &body.user_password)
				.await,
		)
		.await?;

	tracing::info!(database = %account.database, "user created");
	Ok(Json(UserResponse {
		status: StatusCode::OK.as_u16(),
		user_name: account.account,
		database: account.database,
	}))
}

#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "Provisioned user names", body = UserListResponse),
        (status = 403, description = "Bad credentials", body = ErrorResponse),
        (status = 500, description = "CouchDB failure", body = ErrorResponse)
    ),
    tag = "users"
)]
/// GET /users - List provisioned accounts.
#[tracing::instrument(skip(state, _body))]
pub async fn list_users(
	State(state): State<AppState>,
	Gated(_body): Gated<NoBody>,
) -> Result<Json<UserListResponse>, ApiError> {
	let session = state.admin_session().await?;
	let users = state
		.observe(&session, state.provisioning.list_accounts(&session).await)
		.await?;

	Ok(Json(UserListResponse {
		status: StatusCode::OK.as_u16(),
		users,
	}))
}

#[utoipa::path(
    get,
    path = "/users/{user_name}",
    params(
        ("user_name" = String, Path, description = "Account name")
    ),
    responses(
        (status = 200, description = "Account and its database", body = UserResponse),
        (status = 403, description = "Bad credentials or invalid user name", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "CouchDB failure or partially provisioned account", body = ErrorResponse)
    ),
    tag = "users"
)]
/// GET /users/{user_name} - Look up one account.
#[tracing::instrument(skip(state, _body))]
pub async fn get_user(
	State(state): State<AppState>,
	Path(user_name): Path<String>,
	Gated(_body): Gated<NoBody>,
) -> Result<Json<UserResponse>, ApiError> {
	let session = state.admin_session().await?;
	let account = state
		.observe(&session, state.provisioning.get_account(&session, &user_name).await)
		.await?;

	Ok(Json(UserResponse {
		status: StatusCode::OK.as_u16(),
		user_name: account.account,
		database: account.database,
	}))
}

#[utoipa::path(
    delete,
    path = "/users/{user_name}",
    params(
        ("user_name" = String, Path, description = "Account name")
    ),
    request_body(content = DeleteUserRequest, description = "Optional; carries the provisioning key"),
    responses(
        (status = 204, description = "Account, database, or both removed"),
        (status = 403, description = "Bad credentials or invalid user name", body = ErrorResponse),
        (status = 404, description = "Nothing to remove", body = ErrorResponse),
        (status = 500, description = "CouchDB failure", body = ErrorResponse)
    ),
    tag = "users"
)]
/// DELETE /users/{user_name} - Remove an account and its database.
#[tracing::instrument(skip(state, _body))]
pub async fn delete_user(
	State(state): State<AppState>,
	Path(user_name): Path<String>,
	Gated(_body): Gated<DeleteUserRequest>,
) -> Result<StatusCode, ApiError> {
	let session = state.admin_session().await?;
	let removed = state
		.observe(&session, state.provisioning.delete_account(&session, &user_name).await)
		.await?;

	if removed {
		tracing::info!("user deleted");
		Ok(StatusCode::NO_CONTENT)
	} else {
		Err(ApiError::NotFound(format!("User {user_name} not found")))
	}
}
