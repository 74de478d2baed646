// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The document-store abstraction used by the provisioning engine.

use async_trait::async_trait;
use migraine_common_secret::SecretString;
use serde_json::Value;

use crate::error::CouchError;
use crate::types::{Document, SecurityDocument, Session};

/// CouchDB operations needed to provision accounts.
///
/// Every call is a single HTTP round trip. Implementations never retry and
/// never combine calls; callers sequence them.
#[async_trait]
pub trait DocumentStore: Send + Sync {
	/// `POST /_session`.
	async fn authenticate(&self, name: &str, password: &SecretString) -> Result<Session, CouchError>;

	/// `GET /{db}/{id}`. `None` on 404.
	async fn get_document(
		&self,
		session: &Session,
		db: &str,
		id: &str,
	) -> Result<Option<Document>, CouchError>;

	/// `PUT /{db}/{id}`. Returns the new revision. Creating a document that
	/// already exists, or updating with a stale `_rev`, is a 409.
	async fn put_document(
		&self,
		session: &Session,
		db: &str,
		id: &str,
		body: &Value,
	) -> Result<String, CouchError>;

	/// `DELETE /{db}/{id}` with `If-Match: {rev}`.
	async fn delete_document(
		&self,
		session: &Session,
		db: &str,
		id: &str,
		rev: &str,
	) -> Result<(), CouchError>;

	/// `HEAD /{db}`.
	async fn database_exists(&self, session: &Session, db: &str) -> Result<bool, CouchError>;

	/// `PUT /{db}`. 412 if the database exists.
	async fn create_database(&self, session: &Session, db: &str) -> Result<(), CouchError>;

	/// `DELETE /{db}`.
	async fn delete_database(&self, session: &Session, db: &str) -> Result<(), CouchError>;

	/// `PUT /{db}/_security`.
	async fn put_security(
		&self,
		session: &Session,
		db: &str,
		security: &SecurityDocument,
	) -> Result<(), CouchError>;

	/// `GET /{db}/_all_docs`, ids in collation order.
	async fn list_document_ids(&self, session: &Session, db: &str)
		-> Result<Vec<String>, CouchError>;

	/// `GET /`, unauthenticated.
	async fn ping(&self) -> Result<(), CouchError>;
}
