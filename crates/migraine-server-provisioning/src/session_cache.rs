// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Process-wide cache of the CouchDB admin session.

use std::sync::Arc;
use std::time::Duration;

use migraine_common_secret::SecretString;
use migraine_server_couchdb::{CouchError, DocumentStore, Session};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

struct CachedSession {
	session: Session,
	created_at: Instant,
}

/// Reuses one admin session until it is older than the TTL.
///
/// The lock is held across re-authentication, so at most one login is in
/// flight and concurrent callers receive the session it produces.
pub struct AdminSessionCache {
	store: Arc<dyn DocumentStore>,
	admin_user: String,
	admin_password: SecretString,
	ttl: Duration,
	cached: Mutex<Option<CachedSession>>,
}

impl AdminSessionCache {
	pub fn new(
		store: Arc<dyn DocumentStore>,
		admin_user: impl Into<String>,
		admin_password: SecretString,
		ttl: Duration,
	) -> Self {
		Self {
			store,
			admin_user: admin_user.into(),
			admin_password,
			ttl,
			cached: Mutex::new(None),
		}
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// The cached session, or a fresh one if it is missing or older than the TTL.
	#[instrument(skip(self), fields(admin_user = %self.admin_user))]
	pub async fn get(&self) -> Result<Session, CouchError> {
		let mut cached = self.cached.lock().await;

		if let Some(entry) = cached.as_ref() {
			if entry.created_at.elapsed() <= self.ttl {
				return Ok(entry.session.clone());
			}
			debug!("admin session expired");
		}

		let session = self
			.store
			.authenticate(&self.admin_user, &self.admin_password)
			.await
			.inspect_err(|e| warn!(error = %e, "admin authentication failed"))?;

		*cached = Some(CachedSession {
			session: session.clone(),
			created_at: Instant::now(),
		});
		info!("admin session refreshed");
		Ok(session)
	}

	/// Forget `rejected` so the next [`get`](Self::get) logs in again.
	///
	/// A session that has already been replaced by a newer login is left
	/// alone.
	pub async fn invalidate(&self, rejected: &Session) {
		let mut cached = self.cached.lock().await;
		if cached
			.as_ref()
			.is_some_and(|entry| entry.session.token() == rejected.token())
		{
			cached.take();
			debug!("admin session invalidated");
		} else {
			debug!("rejected admin session already replaced");
		}
	}
}
