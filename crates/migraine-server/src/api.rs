// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Router and shared handler state.

use std::sync::Arc;

use axum::{
	routing::{get, post},
	Router,
};
use migraine_server_config::{AuthConfig, CouchDbConfig};
use migraine_server_couchdb::{DocumentStore, Session};
use migraine_server_provisioning::{AccountProvisioningService, AdminSessionCache, ProvisioningError};

use crate::{api_docs, error::ApiError, routes};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
	pub provisioning: Arc<AccountProvisioningService>,
	pub admin_sessions: Arc<AdminSessionCache>,
	pub store: Arc<dyn DocumentStore>,
	pub auth: Arc<AuthConfig>,
	/// Server URL advertised in `/api/openapi.json`.
	pub base_url: String,
}

impl AppState {
	/// Advertise `base_url` as the server in the OpenAPI document.
	pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
		self.base_url = base_url.into();
		self
	}

	/// The cached admin session, logging in first if it is missing or stale.
	pub async fn admin_session(&self) -> Result<Session, ApiError> {
		Ok(self.admin_sessions.get().await?)
	}

	/// Pass an engine result through, dropping `session` if CouchDB rejected
	/// it so the next request logs in again.
	pub async fn observe<T>(
		&self,
		session: &Session,
		result: Result<T, ProvisioningError>,
	) -> Result<T, ApiError> {
		if let Err(e) = &result {
			if e.backend().is_some_and(|b| b.is_unauthorized()) {
				tracing::warn!("CouchDB rejected the admin session, invalidating");
				self.admin_sessions.invalidate(session).await;
			}
		}
		result.map_err(ApiError::from)
	}
}

/// Wire the engine and session cache to `store` using the resolved config.
pub fn create_app_state(
	store: Arc<dyn DocumentStore>,
	couchdb: &CouchDbConfig,
	auth: AuthConfig,
) -> AppState {
	let admin_sessions = AdminSessionCache::new(
		Arc::clone(&store),
		couchdb.admin_user.clone(),
		couchdb.admin_password.clone(),
		couchdb.session_ttl(),
	);
	let provisioning = AccountProvisioningService::new(Arc::clone(&store), couchdb.admin_role.clone());

	AppState {
		provisioning: Arc::new(provisioning),
		admin_sessions: Arc::new(admin_sessions),
		store,
		auth: Arc::new(auth),
		base_url: "/".to_string(),
	}
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route(
			"/users",
			post(routes::users::create_user).get(routes::users::list_users),
		)
		.route("/users/", post(routes::users::create_user))
		.route(
			"/users/{user_name}",
			get(routes::users::get_user).delete(routes::users::delete_user),
		)
		.route("/health", get(routes::health::health_check))
		.route("/api/openapi.json", get(api_docs::openapi_json))
		.with_state(state)
}
