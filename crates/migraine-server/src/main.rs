// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Migraine account provisioning server binary.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use migraine_server::{create_app_state, create_router};
use migraine_server_couchdb::CouchClient;
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Migraine server - provisions CouchDB accounts with private databases.
#[derive(Parser, Debug)]
#[command(
	name = "migraine-server",
	about = "Migraine account provisioning server",
	version
)]
struct Args {
	/// Config file to read instead of /etc/migraine/server.toml
	#[arg(long, env = "MIGRAINE_SERVER_CONFIG")]
	config: Option<PathBuf>,

	/// Subcommands for migraine-server (e.g., `version`)
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version information
	Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("migraine-server {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => migraine_server_config::load_config_with_file(path)?,
		None => migraine_server_config::load_config()?,
	};

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	tracing::info!(
			host = %config.http.host,
			port = config.http.port,
			couchdb = %config.couchdb.url,
			admin_user = %config.couchdb.admin_user,
			"starting migraine-server"
	);

	let couch = CouchClient::new(&config.couchdb.url, config.couchdb.request_timeout())?;
	let state = create_app_state(Arc::new(couch), &config.couchdb, config.auth.clone())
		.with_base_url(config.http.base_url.clone());

	// Log in once up front so a bad admin password shows at startup
	if let Err(e) = state.admin_sessions.get().await {
		tracing::warn!(error = %e, "initial CouchDB admin login failed, will retry per request");
	}

	let app = create_router(state)
		.layer(TraceLayer::new_for_http())
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods(Any)
				.allow_headers(Any),
		);

	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr).await?;

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	tracing::info!("Server shutdown complete");
	Ok(())
}
