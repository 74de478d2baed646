// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod auth;
mod couchdb;
mod http;
mod logging;

pub use auth::{AuthConfig, AuthConfigLayer};
pub use couchdb::{CouchDbConfig, CouchDbConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
