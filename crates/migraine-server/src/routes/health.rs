// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Health HTTP handler.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tokio::time::Instant;
use utoipa::ToSchema;

use crate::api::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
	Healthy,
	Unhealthy,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentHealth {
	pub status: HealthStatus,
	pub latency_ms: u64,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
	pub status: HealthStatus,
	pub version: String,
	pub couchdb: ComponentHealth,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "CouchDB is reachable", body = HealthResponse),
        (status = 503, description = "CouchDB is unreachable", body = HealthResponse)
    ),
    tag = "health"
)]
/// GET /health - Report whether CouchDB answers.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	let start = Instant::now();
	let result = state.store.ping().await;
	let latency_ms = start.elapsed().as_millis() as u64;

	let couchdb = match result {
		Ok(()) => ComponentHealth {
			status: HealthStatus::Healthy,
			latency_ms,
			error: None,
		},
		Err(e) => {
			tracing::warn!(error = %e, "CouchDB health check failed");
			ComponentHealth {
				status: HealthStatus::Unhealthy,
				latency_ms,
				error: Some("CouchDB unreachable".to_string()),
			}
		}
	};

	let status = couchdb.status;
	let http_status = match status {
		HealthStatus::Healthy => StatusCode::OK,
		HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
	};

	let response = HealthResponse {
		status,
		version: env!("CARGO_PKG_VERSION").to_string(),
		couchdb,
	};

	(http_status, Json(response))
}
