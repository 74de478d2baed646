// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! CouchDB backend configuration.

use std::time::Duration;

use migraine_common_config::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_URL: &str = "http://localhost:5984";
const DEFAULT_ADMIN_USER: &str = "admin";
const DEFAULT_ADMIN_ROLE: &str = "_admin";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SESSION_TTL_SECS: u64 = 120;

/// CouchDB configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct CouchDbConfig {
	pub url: String,
	pub admin_user: String,
	pub admin_password: SecretString,
	/// Role granted member and admin access on every per-account database.
	pub admin_role: String,
	pub request_timeout_secs: u64,
	pub session_ttl_secs: u64,
}

impl CouchDbConfig {
	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_secs)
	}

	pub fn session_ttl(&self) -> Duration {
		Duration::from_secs(self.session_ttl_secs)
	}
}

impl Default for CouchDbConfig {
	fn default() -> Self {
		Self {
			url: DEFAULT_URL.to_string(),
			admin_user: DEFAULT_ADMIN_USER.to_string(),
			admin_password: SecretString::new(String::new()),
			admin_role: DEFAULT_ADMIN_ROLE.to_string(),
			request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
			session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
		}
	}
}

/// CouchDB configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CouchDbConfigLayer {
	#[serde(default)]
	pub url: Option<String>,
	#[serde(default)]
	pub admin_user: Option<String>,
	#[serde(default)]
	pub admin_password: Option<SecretString>,
	#[serde(default)]
	pub admin_role: Option<String>,
	#[serde(default)]
	pub request_timeout_secs: Option<u64>,
	#[serde(default)]
	pub session_ttl_secs: Option<u64>,
}

impl CouchDbConfigLayer {
	pub fn merge(&mut self, other: CouchDbConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
		if other.admin_user.is_some() {
			self.admin_user = other.admin_user;
		}
		if other.admin_password.is_some() {
			self.admin_password = other.admin_password;
		}
		if other.admin_role.is_some() {
			self.admin_role = other.admin_role;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
		if other.session_ttl_secs.is_some() {
			self.session_ttl_secs = other.session_ttl_secs;
		}
	}

	pub fn finalize(self) -> Result<CouchDbConfig, ConfigError> {
		let admin_password = self
			.admin_password
			.filter(|password| !password.is_empty())
			.ok_or_else(|| {
				ConfigError::Validation(
					"CouchDB admin password is required: set MIGRAINE_SERVER_COUCHDB_ADMIN_PASSWORD \
					 or MIGRAINE_SERVER_COUCHDB_ADMIN_PASSWORD_FILE"
						.to_string(),
				)
			})?;

		let request_timeout_secs = self
			.request_timeout_secs
			.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
		if request_timeout_secs == 0 {
			return Err(ConfigError::Validation(
				"couchdb.request_timeout_secs must be greater than zero".to_string(),
			));
		}

		let session_ttl_secs = self.session_ttl_secs.unwrap_or(DEFAULT_SESSION_TTL_SECS);
		if session_ttl_secs == 0 {
			return Err(ConfigError::Validation(
				"couchdb.session_ttl_secs must be greater than zero".to_string(),
			));
		}

		Ok(CouchDbConfig {
			url: self
				.url
				.map(|url| url.trim_end_matches('/').to_string())
				.unwrap_or_else(|| DEFAULT_URL.to_string()),
			admin_user: self
				.admin_user
				.unwrap_or_else(|| DEFAULT_ADMIN_USER.to_string()),
			admin_password,
			admin_role: self
				.admin_role
				.unwrap_or_else(|| DEFAULT_ADMIN_ROLE.to_string()),
			request_timeout_secs,
			session_ttl_secs,
		})
	}
}
