// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use migraine_server_couchdb::CouchError;

/// Errors that can occur while provisioning or deprovisioning an account.
#[derive(Debug, thiserror::Error)]
pub enum ProvisioningError {
	#[error("invalid account name: {0:?}")]
	InvalidAccountName(String),

	#[error("account already exists: {0}")]
	AccountExists(String),

	#[error("storage {database} for account {account} already exists")]
	StorageExists { account: String, database: String },

	#[error("account not found: {0}")]
	AccountNotFound(String),

	/// The identity record exists without its database, left behind by an
	/// interrupted create.
	#[error("storage {database} for account {account} is missing")]
	StorageMissing { account: String, database: String },

	#[error("backend error: {0}")]
	Backend(#[from] CouchError),
}

/// Outcome categories callers map to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	Forbidden,
	Conflict,
	NotFound,
	BackendFailure,
}

impl ProvisioningError {
	pub fn kind(&self) -> ErrorKind {
		match self {
			ProvisioningError::InvalidAccountName(_) => ErrorKind::Forbidden,
			ProvisioningError::AccountExists(_) | ProvisioningError::StorageExists { .. } => {
				ErrorKind::Conflict
			}
			ProvisioningError::AccountNotFound(_) => ErrorKind::NotFound,
			ProvisioningError::Backend(e) if e.is_conflict() => ErrorKind::Conflict,
			ProvisioningError::StorageMissing { .. } | ProvisioningError::Backend(_) => {
				ErrorKind::BackendFailure
			}
		}
	}

	/// The underlying CouchDB error, if there is one.
	pub fn backend(&self) -> Option<&CouchError> {
		match self {
			ProvisioningError::Backend(e) => Some(e),
			_ => None,
		}
	}
}
