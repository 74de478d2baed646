// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Account names and the CouchDB resource names derived from them.

use std::sync::LazyLock;

use md5::{Digest, Md5};
use migraine_server_couchdb::USER_DOC_PREFIX;
use regex::Regex;

/// Prefix of every per-account database. Account names may not start with it.
pub const DATABASE_PREFIX: &str = "user_";

static ACCOUNT_NAME_REGEX: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.]{1,32}$").unwrap());

/// Whether `account` may be provisioned: 1 to 32 characters from
/// `[A-Za-z0-9_.]`, not starting with `user_`.
pub fn validate_user(account: &str) -> bool {
	!account.starts_with(DATABASE_PREFIX) && ACCOUNT_NAME_REGEX.is_match(account)
}

/// `user_` followed by the lowercase hex MD5 of the account name.
///
/// The digest keeps the database name within CouchDB's lowercase-only naming
/// rules whatever the case of the account name.
pub fn database_for_user(account: &str) -> String {
	let digest = Md5::digest(account.as_bytes());
	format!("{DATABASE_PREFIX}{}", hex::encode(digest))
}

/// Id of the account's identity record in `_users`.
pub fn identity_doc_id(account: &str) -> String {
	format!("{USER_DOC_PREFIX}{account}")
}

pub fn account_from_identity_doc_id(id: &str) -> Option<&str> {
	id.strip_prefix(USER_DOC_PREFIX)
}
