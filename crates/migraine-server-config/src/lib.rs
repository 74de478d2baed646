// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Migraine provisioning server.
//!
//! - Layered configuration from defaults, a TOML file and the environment
//! - Required secrets (CouchDB admin password, client secret key) checked at load
//! - Environment variables use the `MIGRAINE_SERVER_*` prefix
//!
//! ```ignore
//! use migraine_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("CouchDB at {}", config.couchdb.url);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info, warn};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub couchdb: CouchDbConfig,
	pub auth: AuthConfig,
	pub logging: LoggingConfig,
}

impl ServerConfig {
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`MIGRAINE_SERVER_*`)
/// 2. Config file (`/etc/migraine/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_config_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path in place of the system one.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_config_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge `sources` in precedence order and resolve the result.
pub fn load_config_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize();
	let couchdb = layer.couchdb.unwrap_or_default().finalize()?;
	let auth = layer.auth.unwrap_or_default().finalize()?;
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&auth);

	info!(
		host = %http.host,
		port = http.port,
		couchdb = %couchdb.url,
		admin_user = %couchdb.admin_user,
		session_ttl_secs = couchdb.session_ttl_secs,
		provisioning_key = auth.provisioning_key.is_some(),
		environment = %auth.environment,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		couchdb,
		auth,
		logging,
	})
}

fn validate_config(auth: &AuthConfig) {
	if auth.environment == "production" && auth.provisioning_key.is_none() {
		warn!(
			"MIGRAINE_SERVER_ENV=production without MIGRAINE_SERVER_PROVISIONING_KEY; \
			 create and delete are guarded by the client secret key alone"
		);
	}
}
