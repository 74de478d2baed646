// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Migraine account provisioning server.
//!
//! Exposes `/users` over HTTP. Every request passes the [`gate::Gated`]
//! extractor (body shape, then client secret) before the provisioning engine
//! runs against CouchDB under a cached admin session.

pub mod api;
pub mod api_docs;
pub mod error;
pub mod gate;
pub mod routes;

pub use api::{create_app_state, create_router, AppState};
pub use api_docs::ApiDoc;
pub use error::{ApiError, ErrorResponse};
pub use migraine_server_config::ServerConfig;
