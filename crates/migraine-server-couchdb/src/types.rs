// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire types shared by the CouchDB implementations.

use migraine_common_secret::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CouchError;
use crate::SERVER_ADMIN_ROLE;

/// An authenticated CouchDB session, carried as the `AuthSession` cookie.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
	name: Option<String>,
	roles: Vec<String>,
	token: SecretString,
}

impl Session {
	pub fn new(name: impl Into<String>, roles: Vec<String>, token: SecretString) -> Self {
		Self {
			name: Some(name.into()),
			roles,
			token,
		}
	}

	/// A session that sends no cookie. CouchDB treats it as the anonymous user.
	pub fn anonymous() -> Self {
		Self {
			name: None,
			roles: Vec::new(),
			token: SecretString::new(String::new()),
		}
	}

	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	pub fn roles(&self) -> &[String] {
		&self.roles
	}

	pub fn token(&self) -> &SecretString {
		&self.token
	}

	pub fn is_anonymous(&self) -> bool {
		self.token.is_empty()
	}

	pub fn is_server_admin(&self) -> bool {
		self.roles.iter().any(|role| role == SERVER_ADMIN_ROLE)
	}
}

/// A document as returned by `GET /{db}/{id}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
	pub id: String,
	pub rev: String,
	/// Every field except `_id` and `_rev`.
	pub body: Map<String, Value>,
}

impl Document {
	pub fn from_value(value: Value) -> Result<Self, CouchError> {
		let Value::Object(mut body) = value else {
			return Err(CouchError::InvalidResponse(
				"document is not a JSON object".to_string(),
			));
		};
		let id = take_string(&mut body, "_id")?;
		let rev = take_string(&mut body, "_rev")?;
		Ok(Self { id, rev, body })
	}
}

fn take_string(body: &mut Map<String, Value>, field: &str) -> Result<String, CouchError> {
	match body.remove(field) {
		Some(Value::String(s)) => Ok(s),
		_ => Err(CouchError::InvalidResponse(format!(
			"document is missing {field}"
		))),
	}
}

/// Names and roles granted one level of access on a database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroup {
	#[serde(default)]
	pub names: Vec<String>,
	#[serde(default)]
	pub roles: Vec<String>,
}

impl SecurityGroup {
	pub fn is_empty(&self) -> bool {
		self.names.is_empty() && self.roles.is_empty()
	}

	pub fn admits(&self, name: Option<&str>, roles: &[String]) -> bool {
		name.is_some_and(|name| self.names.iter().any(|n| n == name))
			|| roles.iter().any(|role| self.roles.contains(role))
	}
}

/// The `_security` document of a database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityDocument {
	#[serde(default)]
	pub admins: SecurityGroup,
	#[serde(default)]
	pub members: SecurityGroup,
}

impl SecurityDocument {
	/// Restrict a database to `owner` plus holders of `admin_role`.
	pub fn owned_by(owner: &str, admin_role: &str) -> Self {
		Self {
			admins: SecurityGroup {
				names: Vec::new(),
				roles: vec![admin_role.to_string()],
			},
			members: SecurityGroup {
				names: vec![owner.to_string()],
				roles: vec![admin_role.to_string()],
			},
		}
	}

	/// CouchDB reader check: an empty member list leaves the database public.
	pub fn admits_reader(&self, session: &Session) -> bool {
		session.is_server_admin()
			|| self.members.is_empty()
			|| self.members.admits(session.name(), session.roles())
			|| self.admins.admits(session.name(), session.roles())
	}
}

/// Body of an identity record in `_users`.
pub fn user_document(name: &str, password: &SecretString, roles: &[String]) -> Value {
	serde_json::json!({
		"type": "user",
		"name": name,
		"password": password.expose(),
		"roles": roles,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn session(name: &str, roles: &[&str]) -> Session {
		Session::new(
			name,
			roles.iter().map(|r| r.to_string()).collect(),
			SecretString::from("token"),
		)
	}

	#[test]
	fn owned_by_matches_couchdb_layout() {
		let doc = SecurityDocument::owned_by("alice", "_admin");
		assert_eq!(
			serde_json::to_value(&doc).unwrap(),
			json!({
				"admins": {"names": [], "roles": ["_admin"]},
				"members": {"names": ["alice"], "roles": ["_admin"]},
			})
		);
	}

	#[test]
	fn reader_check_follows_membership() {
		let doc = SecurityDocument::owned_by("alice", "_admin");
		assert!(doc.admits_reader(&session("alice", &[])));
		assert!(doc.admits_reader(&session("admin", &["_admin"])));
		assert!(!doc.admits_reader(&session("bob", &[])));
		assert!(!doc.admits_reader(&Session::anonymous()));
	}

	#[test]
	fn empty_security_is_public() {
		let doc = SecurityDocument::default();
		assert!(doc.admits_reader(&Session::anonymous()));
	}

	#[test]
	fn document_splits_meta_fields() {
		let doc = Document::from_value(json!({
			"_id": "org.couchdb.user:alice",
			"_rev": "1-abc",
			"name": "alice",
		}))
		.unwrap();
		assert_eq!(doc.id, "org.couchdb.user:alice");
		assert_eq!(doc.rev, "1-abc");
		assert_eq!(doc.body.get("name"), Some(&json!("alice")));
		assert!(!doc.body.contains_key("_rev"));
	}

	#[test]
	fn document_without_rev_is_invalid() {
		let err = Document::from_value(json!({"_id": "x"})).unwrap_err();
		assert!(matches!(err, CouchError::InvalidResponse(_)));
	}

	#[test]
	fn user_document_carries_password() {
		let body = user_document("alice", &SecretString::from("pw"), &[]);
		assert_eq!(
			body,
			json!({"type": "user", "name": "alice", "password": "pw", "roles": []})
		);
	}
}
