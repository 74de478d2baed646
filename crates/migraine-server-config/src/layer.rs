// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{AuthConfigLayer, CouchDbConfigLayer, HttpConfigLayer, LoggingConfigLayer};

/// Server configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub couchdb: Option<CouchDbConfigLayer>,
	#[serde(default)]
	pub auth: Option<AuthConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl ServerConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_option(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_option(&mut self.couchdb, other.couchdb, CouchDbConfigLayer::merge);
		merge_option(&mut self.auth, other.auth, AuthConfigLayer::merge);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn merge_into_empty_takes_other() {
		let mut base = ServerConfigLayer::default();
		base.merge(ServerConfigLayer {
			couchdb: Some(CouchDbConfigLayer {
				url: Some("http://couch:5984".to_string()),
				..Default::default()
			}),
			..Default::default()
		});
		assert_eq!(
			base.couchdb.unwrap().url.as_deref(),
			Some("http://couch:5984")
		);
		assert!(base.http.is_none());
	}

	#[test]
	fn merge_is_field_wise() {
		let mut base = ServerConfigLayer {
			couchdb: Some(CouchDbConfigLayer {
				url: Some("http://file:5984".to_string()),
				admin_user: Some("root".to_string()),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer {
			couchdb: Some(CouchDbConfigLayer {
				url: Some("http://env:5984".to_string()),
				..Default::default()
			}),
			..Default::default()
		});
		let couchdb = base.couchdb.unwrap();
		assert_eq!(couchdb.url.as_deref(), Some("http://env:5984"));
		assert_eq!(couchdb.admin_user.as_deref(), Some("root"));
	}

	#[test]
	fn deserialize_toml_sections() {
		let layer: ServerConfigLayer = toml::from_str(
			r#"
[http]
port = 9000

[couchdb]
url = "http://couch:5984"
admin_password = "from-toml"
session_ttl_secs = 30

[auth]
client_secret_key = "client"
"#,
		)
		.unwrap();
		assert_eq!(layer.http.unwrap().port, Some(9000));
		let couchdb = layer.couchdb.unwrap();
		assert_eq!(couchdb.admin_password.unwrap().expose(), "from-toml");
		assert_eq!(couchdb.session_ttl_secs, Some(30));
		assert!(layer.logging.is_none());
	}
}
