// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the CouchDB client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CouchError {
	#[error("network error: {0}")]
	Network(#[from] reqwest::Error),

	#[error("request to CouchDB timed out")]
	Timeout,

	/// CouchDB answered with a non-success status. `error` and `reason` come
	/// from the JSON error body when there is one.
	#[error("CouchDB returned {status} {error}: {reason}")]
	Status {
		status: u16,
		error: String,
		reason: String,
	},

	#[error("invalid response from CouchDB: {0}")]
	InvalidResponse(String),

	#[error("invalid CouchDB URL: {0}")]
	InvalidUrl(String),
}

impl CouchError {
	pub fn status(status: u16, error: impl Into<String>, reason: impl Into<String>) -> Self {
		CouchError::Status {
			status,
			error: error.into(),
			reason: reason.into(),
		}
	}

	/// HTTP status of the failed call, if CouchDB answered at all.
	pub fn status_code(&self) -> Option<u16> {
		match self {
			CouchError::Status { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// 409 (document update conflict) or 412 (database already exists).
	pub fn is_conflict(&self) -> bool {
		matches!(self.status_code(), Some(409) | Some(412))
	}

	pub fn is_unauthorized(&self) -> bool {
		self.status_code() == Some(401)
	}

	pub fn is_forbidden(&self) -> bool {
		self.status_code() == Some(403)
	}

	pub fn is_not_found(&self) -> bool {
		self.status_code() == Some(404)
	}
}

impl From<url::ParseError> for CouchError {
	fn from(e: url::ParseError) -> Self {
		CouchError::InvalidUrl(e.to_string())
	}
}
