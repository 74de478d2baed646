// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client authentication for the provisioning API.

use migraine_common_config::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

/// Authentication configuration (runtime, fully resolved).
#[derive(Debug, Clone)]
pub struct AuthConfig {
	/// Expected in `Authorization: Bearer <key>` on every `/users` request.
	pub client_secret_key: SecretString,
	/// When set, create and delete must also carry it as `secret_key` in the body.
	pub provisioning_key: Option<SecretString>,
	pub environment: String,
}

impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			client_secret_key: SecretString::new(String::new()),
			provisioning_key: None,
			environment: "development".to_string(),
		}
	}
}

/// Authentication configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfigLayer {
	#[serde(default)]
	pub client_secret_key: Option<SecretString>,
	#[serde(default)]
	pub provisioning_key: Option<SecretString>,
	#[serde(default)]
	pub environment: Option<String>,
}

impl AuthConfigLayer {
	pub fn merge(&mut self, other: AuthConfigLayer) {
		if other.client_secret_key.is_some() {
			self.client_secret_key = other.client_secret_key;
		}
		if other.provisioning_key.is_some() {
			self.provisioning_key = other.provisioning_key;
		}
		if other.environment.is_some() {
			self.environment = other.environment;
		}
	}

	pub fn finalize(self) -> Result<AuthConfig, ConfigError> {
		let client_secret_key = self
			.client_secret_key
			.filter(|key| !key.is_empty())
			.ok_or_else(|| {
				ConfigError::Validation(
					"client secret key is required: set MIGRAINE_SERVER_CLIENT_SECRET_KEY \
					 or MIGRAINE_SERVER_CLIENT_SECRET_KEY_FILE"
						.to_string(),
				)
			})?;

		Ok(AuthConfig {
			client_secret_key,
			provisioning_key: self.provisioning_key.filter(|key| !key.is_empty()),
			environment: self
				.environment
				.unwrap_or_else(|| "development".to_string()),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn client_secret_is_required() {
		let err = AuthConfigLayer::default().finalize().unwrap_err();
		assert!(err.to_string().contains("CLIENT_SECRET_KEY"));
	}

	#[test]
	fn empty_client_secret_is_rejected() {
		let layer = AuthConfigLayer {
			client_secret_key: Some(SecretString::from("")),
			..Default::default()
		};
		assert!(layer.finalize().is_err());
	}

	#[test]
	fn empty_provisioning_key_means_disabled() {
		let config = AuthConfigLayer {
			client_secret_key: Some(SecretString::from("client")),
			provisioning_key: Some(SecretString::from("")),
			environment: None,
		}
		.finalize()
		.unwrap();
		assert!(config.provisioning_key.is_none());
		assert_eq!(config.environment, "development");
	}
}
