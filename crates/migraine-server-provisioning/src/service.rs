// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use migraine_common_secret::SecretString;
use migraine_server_couchdb::{user_document, DocumentStore, SecurityDocument, Session, USERS_DB};
use serde::Serialize;

use crate::error::ProvisioningError;
use crate::naming::{account_from_identity_doc_id, database_for_user, identity_doc_id, validate_user};

/// Result type for provisioning operations.
pub type Result<T> = std::result::Result<T, ProvisioningError>;

/// An account and the database provisioned for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedAccount {
	pub account: String,
	pub database: String,
}

/// Creates and removes accounts against a [`DocumentStore`].
///
/// The existence checks are advisory. Nothing stops two requests for the same
/// name from passing them together; the backend's atomic document create
/// decides the winner, and the loser surfaces the resulting 409.
///
/// No step is compensated. A create that fails after writing the identity
/// record leaves the record behind (and possibly an unprotected database);
/// retrying it reports [`ProvisioningError::AccountExists`].
#[derive(Clone)]
pub struct AccountProvisioningService {
	store: Arc<dyn DocumentStore>,
	admin_role: String,
}

impl AccountProvisioningService {
	/// `admin_role` is granted member and admin access on every database created.
	pub fn new(store: Arc<dyn DocumentStore>, admin_role: impl Into<String>) -> Self {
		Self {
			store,
			admin_role: admin_role.into(),
		}
	}

	pub fn store(&self) -> &Arc<dyn DocumentStore> {
		&self.store
	}

	fn check_name(account: &str) -> Result<()> {
		if validate_user(account) {
			Ok(())
		} else {
			tracing::warn!(account, "rejected invalid account name");
			Err(ProvisioningError::InvalidAccountName(account.to_string()))
		}
	}

	/// Create the identity record, then the database, then its access policy.
	#[tracing::instrument(skip(self, session, password), fields(account = %account))]
	pub async fn create_account(
		&self,
		session: &Session,
		account: &str,
		password: &SecretString,
	) -> Result<ProvisionedAccount> {
		Self::check_name(account)?;

		let identity_id = identity_doc_id(account);
		let database = database_for_user(account);

		if self
			.store
			.get_document(session, USERS_DB, &identity_id)
			.await?
			.is_some()
		{
			tracing::info!(account, "account already exists");
			return Err(ProvisioningError::AccountExists(account.to_string()));
		}

		if self.store.database_exists(session, &database).await? {
			tracing::warn!(account, database = %database, "storage exists without an identity record");
			return Err(ProvisioningError::StorageExists {
				account: account.to_string(),
				database,
			});
		}

		self
			.store
			.put_document(
				session,
				USERS_DB,
				&identity_id,
				&user_document(account, password, &[]),
			)
			.await
			.inspect_err(|e| tracing::warn!(error = %e, "identity record create failed"))?;
		tracing::debug!(account, "identity record created");

		self
			.store
			.create_database(session, &database)
			.await
			.inspect_err(|e| {
				tracing::error!(
					error = %e,
					database = %database,
					"storage create failed; identity record left without storage"
				)
			})?;
		tracing::debug!(database = %database, "storage created");

		let security = SecurityDocument::owned_by(account, &self.admin_role);
		self
			.store
			.put_security(session, &database, &security)
			.await
			.inspect_err(|e| {
				tracing::error!(
					error = %e,
					database = %database,
					"access policy write failed; storage left unprotected"
				)
			})?;

		tracing::info!(account, database = %database, "provisioned account");
		Ok(ProvisionedAccount {
			account: account.to_string(),
			database,
		})
	}

	/// Remove whatever part of the account exists.
	///
	/// Returns `false` if neither the identity record nor the database existed.
	#[tracing::instrument(skip(self, session), fields(account = %account))]
	pub async fn delete_account(&self, session: &Session, account: &str) -> Result<bool> {
		Self::check_name(account)?;

		let identity_id = identity_doc_id(account);
		let database = database_for_user(account);
		let mut removed = false;

		if let Some(record) = self
			.store
			.get_document(session, USERS_DB, &identity_id)
			.await?
		{
			self
				.store
				.delete_document(session, USERS_DB, &identity_id, &record.rev)
				.await?;
			tracing::debug!(account, "identity record deleted");
			removed = true;
		}

		if self.store.database_exists(session, &database).await? {
			self.store.delete_database(session, &database).await?;
			tracing::debug!(database = %database, "storage deleted");
			removed = true;
		}

		if removed {
			tracing::info!(account, "deprovisioned account");
		}
		Ok(removed)
	}

	/// Look up an account. An identity record without its database is an
	/// error, not a partial success.
	#[tracing::instrument(skip(self, session), fields(account = %account))]
	pub async fn get_account(&self, session: &Session, account: &str) -> Result<ProvisionedAccount> {
		Self::check_name(account)?;

		let identity_id = identity_doc_id(account);
		if self
			.store
			.get_document(session, USERS_DB, &identity_id)
			.await?
			.is_none()
		{
			return Err(ProvisioningError::AccountNotFound(account.to_string()));
		}

		let database = database_for_user(account);
		if !self.store.database_exists(session, &database).await? {
			tracing::error!(account, database = %database, "identity record has no storage");
			return Err(ProvisioningError::StorageMissing {
				account: account.to_string(),
				database,
			});
		}

		Ok(ProvisionedAccount {
			account: account.to_string(),
			database,
		})
	}

	/// Names of all accounts with an identity record, sorted.
	#[tracing::instrument(skip(self, session))]
	pub async fn list_accounts(&self, session: &Session) -> Result<Vec<String>> {
		let ids = self.store.list_document_ids(session, USERS_DB).await?;
		let mut accounts: Vec<String> = ids
			.iter()
			.filter_map(|id| account_from_identity_doc_id(id))
			.map(str::to_string)
			.collect();
		accounts.sort();
		tracing::debug!(count = accounts.len(), "listed accounts");
		Ok(accounts)
	}
}
