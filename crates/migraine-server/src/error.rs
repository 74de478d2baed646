// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! API error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use migraine_server_couchdb::CouchError;
use migraine_server_provisioning::{ErrorKind, ProvisioningError};
use serde::Serialize;
use utoipa::ToSchema;

/// Body of every non-2xx response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
	#[error("bad request: {0}")]
	BadRequest(String),

	#[error("forbidden")]
	Forbidden,

	#[error("not found: {0}")]
	NotFound(String),

	#[error(transparent)]
	Provisioning(#[from] ProvisioningError),

	/// Admin login failed before the engine ran.
	#[error("backend error: {0}")]
	Backend(#[from] CouchError),
}

impl ApiError {
	pub fn status_code(&self) -> StatusCode {
		match self {
			ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
			ApiError::Forbidden => StatusCode::FORBIDDEN,
			ApiError::NotFound(_) => StatusCode::NOT_FOUND,
			ApiError::Provisioning(e) => match e.kind() {
				ErrorKind::Forbidden => StatusCode::FORBIDDEN,
				ErrorKind::Conflict => StatusCode::CONFLICT,
				ErrorKind::NotFound => StatusCode::NOT_FOUND,
				ErrorKind::BackendFailure => StatusCode::INTERNAL_SERVER_ERROR,
			},
			ApiError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = self.status_code();
		let (error, message) = match &self {
			ApiError::BadRequest(msg) => ("bad_request", msg.clone()),
			ApiError::Forbidden => ("forbidden", "Forbidden".to_string()),
			ApiError::NotFound(msg) => ("not_found", msg.clone()),
			ApiError::Provisioning(e) => match e.kind() {
				ErrorKind::Forbidden => ("forbidden", "Invalid user name".to_string()),
				ErrorKind::Conflict => ("conflict", "User already exists".to_string()),
				ErrorKind::NotFound => ("not_found", "User not found".to_string()),
				ErrorKind::BackendFailure => {
					tracing::error!(error = %e, "provisioning failed");
					("backend_failure", "Backend failure".to_string())
				}
			},
			ApiError::Backend(e) => {
				tracing::error!(error = %e, "admin authentication failed");
				("backend_failure", "Backend failure".to_string())
			}
		};

		let body = ErrorResponse {
			error: error.to_string(),
			message,
		};
		(status, Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn provisioning_errors_map_by_kind() {
		let cases = [
			(
				ApiError::from(ProvisioningError::InvalidAccountName("user_bob".into())),
				StatusCode::FORBIDDEN,
			),
			(
				ApiError::from(ProvisioningError::AccountExists("bob".into())),
				StatusCode::CONFLICT,
			),
			(
				ApiError::from(ProvisioningError::AccountNotFound("bob".into())),
				StatusCode::NOT_FOUND,
			),
			(
				ApiError::from(ProvisioningError::from(CouchError::status(409, "conflict", ""))),
				StatusCode::CONFLICT,
			),
			(
				ApiError::from(ProvisioningError::from(CouchError::Timeout)),
				StatusCode::INTERNAL_SERVER_ERROR,
			),
			(
				ApiError::from(ProvisioningError::StorageMissing {
					account: "bob".into(),
					database: "user_9f9d51bc70ef21ca5c14f307980a29d8".into(),
				}),
				StatusCode::INTERNAL_SERVER_ERROR,
			),
		];

		for (error, expected) in cases {
			assert_eq!(error.status_code(), expected, "{error}");
		}
	}

	#[test]
	fn gate_errors() {
		assert_eq!(
			ApiError::BadRequest("missing field".into()).status_code(),
			StatusCode::BAD_REQUEST
		);
		assert_eq!(ApiError::Forbidden.status_code(), StatusCode::FORBIDDEN);
		assert_eq!(
			ApiError::from(CouchError::status(401, "unauthorized", "Name or password is incorrect."))
				.status_code(),
			StatusCode::INTERNAL_SERVER_ERROR
		);
	}
}
