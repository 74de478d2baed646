// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! In-process stand-in for a CouchDB server.
//!
//! [`MemoryCouch`] keeps the CouchDB behaviour the provisioning engine depends
//! on:
//!
//! - creating an existing document, or writing with a stale `_rev`, is a 409
//! - creating an existing database is a 412
//! - `_users` is only visible to server admins (and to a user reading their
//!   own record, without the password)
//! - `_security` members gate document access: anonymous callers get 401,
//!   authenticated non-members get 403
//! - sessions are issued against the configured admin or `_users` records
//!
//! Each operation yields to the scheduler once before touching state, so two
//! tasks driven by `tokio::join!` interleave call by call the way two HTTP
//! clients would. Calls are recorded, and a failure can be armed for the next
//! call of any [`Operation`].
//!
//! Clones share the same server.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use migraine_common_secret::SecretString;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::CouchError;
use crate::store::DocumentStore;
use crate::types::{Document, SecurityDocument, Session};
use crate::{SERVER_ADMIN_ROLE, USERS_DB, USER_DOC_PREFIX};

/// The [`DocumentStore`] calls, used to record traffic and arm failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
	Authenticate,
	GetDocument,
	PutDocument,
	DeleteDocument,
	DatabaseExists,
	CreateDatabase,
	DeleteDatabase,
	PutSecurity,
	ListDocumentIds,
	Ping,
}

#[derive(Debug, Clone, Copy)]
enum Injected {
	Status(u16),
	Timeout,
}

#[derive(Debug, Clone)]
struct StoredDocument {
	rev: String,
	body: Map<String, Value>,
}

#[derive(Debug, Default)]
struct Database {
	docs: BTreeMap<String, StoredDocument>,
	security: SecurityDocument,
}

#[derive(Debug, Default)]
struct State {
	admins: HashMap<String, String>,
	sessions: HashMap<String, Session>,
	databases: BTreeMap<String, Database>,
	calls: Vec<Operation>,
	failures: HashMap<Operation, Injected>,
}

#[derive(Debug, Clone)]
pub struct MemoryCouch {
	state: Arc<Mutex<State>>,
}

impl MemoryCouch {
	/// A server with one admin account and an empty `_users` database.
	pub fn new(admin_user: &str, admin_password: &str) -> Self {
		let mut users = Database::default();
		users.docs.insert(
			"_design/_auth".to_string(),
			StoredDocument {
				rev: new_rev(1),
				body: Map::from_iter([("language".to_string(), Value::from("javascript"))]),
			},
		);

		let mut state = State::default();
		state
			.admins
			.insert(admin_user.to_string(), admin_password.to_string());
		state.databases.insert(USERS_DB.to_string(), users);

		Self {
			state: Arc::new(Mutex::new(state)),
		}
	}

	/// Fail the next call of `operation` with `status`.
	pub async fn fail_next(&self, operation: Operation, status: u16) {
		self.state
			.lock()
			.await
			.failures
			.insert(operation, Injected::Status(status));
	}

	/// Fail the next call of `operation` as if the request timed out.
	pub async fn time_out_next(&self, operation: Operation) {
		self.state
			.lock()
			.await
			.failures
			.insert(operation, Injected::Timeout);
	}

	pub async fn calls(&self) -> Vec<Operation> {
		self.state.lock().await.calls.clone()
	}

	pub async fn call_count(&self) -> usize {
		self.state.lock().await.calls.len()
	}

	pub async fn reset_calls(&self) {
		self.state.lock().await.calls.clear();
	}

	pub async fn contains_database(&self, db: &str) -> bool {
		self.state.lock().await.databases.contains_key(db)
	}

	pub async fn database_names(&self) -> Vec<String> {
		self.state.lock().await.databases.keys().cloned().collect()
	}

	/// Raw stored document, bypassing access checks.
	pub async fn document(&self, db: &str, id: &str) -> Option<Document> {
		let state = self.state.lock().await;
		let stored = state.databases.get(db)?.docs.get(id)?;
		Some(Document {
			id: id.to_string(),
			rev: stored.rev.clone(),
			body: stored.body.clone(),
		})
	}

	pub async fn security(&self, db: &str) -> Option<SecurityDocument> {
		let state = self.state.lock().await;
		state.databases.get(db).map(|d| d.security.clone())
	}

	/// Record the call, apply any armed failure, and lock the server.
	async fn begin(&self, operation: Operation) -> Result<MutexGuard<'_, State>, CouchError> {
		tokio::task::yield_now().await;
		let mut state = self.state.lock().await;
		state.calls.push(operation);
		trace!(?operation, "memory couch call");
		let injected = state.failures.remove(&operation);
		match injected {
			Some(Injected::Status(status)) => {
				debug!(?operation, status, "injected failure");
				Err(CouchError::status(status, error_name(status), "injected failure"))
			}
			Some(Injected::Timeout) => Err(CouchError::Timeout),
			None => Ok(state),
		}
	}
}

impl State {
	/// The server-side view of the caller. Unknown cookies are rejected.
	fn principal(&self, session: &Session) -> Result<Session, CouchError> {
		if session.is_anonymous() {
			return Ok(Session::anonymous());
		}
		self.sessions
			.get(session.token().expose())
			.cloned()
			.ok_or_else(|| {
				CouchError::status(401, "unauthorized", "Session is not valid or has expired.")
			})
	}

	fn database(&self, db: &str) -> Result<&Database, CouchError> {
		self.databases.get(db).ok_or_else(missing_database)
	}

	fn database_mut(&mut self, db: &str) -> Result<&mut Database, CouchError> {
		self.databases.get_mut(db).ok_or_else(missing_database)
	}

	fn check_reader(&self, principal: &Session, db: &str) -> Result<(), CouchError> {
		let allowed = if db == USERS_DB {
			principal.is_server_admin()
		} else {
			self.database(db)?.security.admits_reader(principal)
		};
		if allowed {
			Ok(())
		} else {
			Err(denied(principal))
		}
	}
}

fn require_server_admin(principal: &Session) -> Result<(), CouchError> {
	if principal.is_server_admin() {
		Ok(())
	} else {
		Err(denied(principal))
	}
}

fn denied(principal: &Session) -> CouchError {
	if principal.is_anonymous() {
		CouchError::status(401, "unauthorized", "You are not authorized to access this db.")
	} else {
		CouchError::status(403, "forbidden", "You are not allowed to access this db.")
	}
}

fn missing_database() -> CouchError {
	CouchError::status(404, "not_found", "Database does not exist.")
}

fn error_name(status: u16) -> &'static str {
	match status {
		400 => "bad_request",
		401 => "unauthorized",
		403 => "forbidden",
		404 => "not_found",
		409 => "conflict",
		412 => "file_exists",
		503 => "service_unavailable",
		_ => "internal_server_error",
	}
}

fn new_rev(generation: u64) -> String {
	format!("{generation}-{}", Uuid::new_v4().simple())
}

fn rev_generation(rev: &str) -> u64 {
	rev.split_once('-')
		.and_then(|(generation, _)| generation.parse().ok())
		.unwrap_or(0)
}

/// CouchDB database names: a lowercase letter, then `[a-z0-9_$()+/-]`.
fn valid_database_name(db: &str) -> bool {
	let mut chars = db.chars();
	chars.next().is_some_and(|c| c.is_ascii_lowercase())
		&& chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "_$()+/-".contains(c))
}

fn user_roles(body: &Map<String, Value>) -> Vec<String> {
	body.get("roles")
		.and_then(Value::as_array)
		.map(|roles| {
			roles
				.iter()
				.filter_map(|r| r.as_str().map(str::to_string))
				.collect()
		})
		.unwrap_or_default()
}

#[async_trait]
impl DocumentStore for MemoryCouch {
	async fn authenticate(&self, name: &str, password: &SecretString) -> Result<Session, CouchError> {
		let mut state = self.begin(Operation::Authenticate).await?;

		let roles = if state
			.admins
			.get(name)
			.is_some_and(|expected| password.matches(expected))
		{
			Some(vec![SERVER_ADMIN_ROLE.to_string()])
		} else {
			state
				.databases
				.get(USERS_DB)
				.and_then(|users| users.docs.get(&format!("{USER_DOC_PREFIX}{name}")))
				.filter(|doc| {
					doc.body
						.get("password")
						.and_then(Value::as_str)
						.is_some_and(|expected| password.matches(expected))
				})
				.map(|doc| user_roles(&doc.body))
		};

		let Some(roles) = roles else {
			return Err(CouchError::status(
				401,
				"unauthorized",
				"Name or password is incorrect.",
			));
		};

		let token = Uuid::new_v4().simple().to_string();
		let session = Session::new(name, roles, SecretString::new(token.clone()));
		state.sessions.insert(token, session.clone());
		Ok(session)
	}

	async fn get_document(
		&self,
		session: &Session,
		db: &str,
		id: &str,
	) -> Result<Option<Document>, CouchError> {
		let state = self.begin(Operation::GetDocument).await?;
		let principal = state.principal(session)?;
		let Some(database) = state.databases.get(db) else {
			return Ok(None);
		};

		let own_record = db == USERS_DB
			&& principal
				.name()
				.is_some_and(|name| id.strip_prefix(USER_DOC_PREFIX) == Some(name));
		if !own_record {
			state.check_reader(&principal, db)?;
		}

		Ok(database.docs.get(id).map(|stored| {
			let mut body = stored.body.clone();
			if db == USERS_DB {
				body.remove("password");
			}
			Document {
				id: id.to_string(),
				rev: stored.rev.clone(),
				body,
			}
		}))
	}

	async fn put_document(
		&self,
		session: &Session,
		db: &str,
		id: &str,
		body: &Value,
	) -> Result<String, CouchError> {
		let mut state = self.begin(Operation::PutDocument).await?;
		let principal = state.principal(session)?;
		state.database(db)?;
		if db == USERS_DB {
			require_server_admin(&principal)?;
		} else {
			state.check_reader(&principal, db)?;
		}

		let Value::Object(body) = body else {
			return Err(CouchError::status(
				400,
				"bad_request",
				"Document must be a JSON object",
			));
		};
		let mut body = body.clone();
		body.remove("_id");
		let given_rev = match body.remove("_rev") {
			Some(Value::String(rev)) => Some(rev),
			_ => None,
		};

		let database = state.database_mut(db)?;
		let generation = match (database.docs.get(id), given_rev) {
			(None, None) => 1,
			(Some(existing), Some(rev)) if existing.rev == rev => rev_generation(&rev) + 1,
			_ => {
				return Err(CouchError::status(
					409,
					"conflict",
					"Document update conflict.",
				))
			}
		};

		let rev = new_rev(generation);
		database.docs.insert(
			id.to_string(),
			StoredDocument {
				rev: rev.clone(),
				body,
			},
		);
		Ok(rev)
	}

	async fn delete_document(
		&self,
		session: &Session,
		db: &str,
		id: &str,
		rev: &str,
	) -> Result<(), CouchError> {
		let mut state = self.begin(Operation::DeleteDocument).await?;
		let principal = state.principal(session)?;
		state.database(db)?;
		if db == USERS_DB {
			require_server_admin(&principal)?;
		} else {
			state.check_reader(&principal, db)?;
		}

		let database = state.database_mut(db)?;
		match database.docs.get(id) {
			None => Err(CouchError::status(404, "not_found", "deleted")),
			Some(existing) if existing.rev != rev => Err(CouchError::status(
				409,
				"conflict",
				"Document update conflict.",
			)),
			Some(_) => {
				database.docs.remove(id);
				Ok(())
			}
		}
	}

	async fn database_exists(&self, session: &Session, db: &str) -> Result<bool, CouchError> {
		let state = self.begin(Operation::DatabaseExists).await?;
		let principal = state.principal(session)?;
		if !state.databases.contains_key(db) {
			return Ok(false);
		}
		state.check_reader(&principal, db)?;
		Ok(true)
	}

	async fn create_database(&self, session: &Session, db: &str) -> Result<(), CouchError> {
		let mut state = self.begin(Operation::CreateDatabase).await?;
		let principal = state.principal(session)?;
		require_server_admin(&principal)?;

		if !valid_database_name(db) {
			return Err(CouchError::status(
				400,
				"illegal_database_name",
				format!("Name: '{db}'. Only lowercase characters (a-z), digits (0-9), and any of the characters _, $, (, ), +, -, and / are allowed. Must begin with a letter."),
			));
		}
		if state.databases.contains_key(db) {
			return Err(CouchError::status(
				412,
				"file_exists",
				"The database could not be created, the file already exists.",
			));
		}
		state.databases.insert(db.to_string(), Database::default());
		Ok(())
	}

	async fn delete_database(&self, session: &Session, db: &str) -> Result<(), CouchError> {
		let mut state = self.begin(Operation::DeleteDatabase).await?;
		let principal = state.principal(session)?;
		require_server_admin(&principal)?;
		state
			.databases
			.remove(db)
			.map(|_| ())
			.ok_or_else(missing_database)
	}

	async fn put_security(
		&self,
		session: &Session,
		db: &str,
		security: &SecurityDocument,
	) -> Result<(), CouchError> {
		let mut state = self.begin(Operation::PutSecurity).await?;
		let principal = state.principal(session)?;
		let database = state.database_mut(db)?;
		if !principal.is_server_admin()
			&& !database.security.admins.admits(principal.name(), principal.roles())
		{
			return Err(denied(&principal));
		}
		database.security = security.clone();
		Ok(())
	}

	async fn list_document_ids(
		&self,
		session: &Session,
		db: &str,
	) -> Result<Vec<String>, CouchError> {
		let state = self.begin(Operation::ListDocumentIds).await?;
		let principal = state.principal(session)?;
		let database = state.database(db)?;
		state.check_reader(&principal, db)?;
		Ok(database.docs.keys().cloned().collect())
	}

	async fn ping(&self) -> Result<(), CouchError> {
		self.begin(Operation::Ping).await?;
		Ok(())
	}
}
