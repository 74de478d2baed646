// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

/// Client builder carrying the Migraine User-Agent.
///
/// ```ignore
/// let client = migraine_common_http::builder()
///     .timeout(Duration::from_secs(5))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Build a client whose every request is bounded by `timeout`.
pub fn new_client_with_timeout(timeout: Duration) -> Result<Client, reqwest::Error> {
	builder().timeout(timeout).connect_timeout(timeout).build()
}

/// `migraine/{version} ({os}-{arch})`
pub fn user_agent() -> String {
	format!(
		"migraine/{} ({}-{})",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}
