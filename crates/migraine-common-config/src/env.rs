// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Loading secrets from the process environment.
//!
//! Each secret can be given inline (`MIGRAINE_SERVER_COUCHDB_ADMIN_PASSWORD`)
//! or as a path to a mounted file (`MIGRAINE_SERVER_COUCHDB_ADMIN_PASSWORD_FILE`).
//! The file form wins when both are present.

use std::path::PathBuf;
use std::{env, fs};

use migraine_common_secret::SecretString;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecretEnvError {
	#[error("failed to read secret file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("secret file path in {var} is empty")]
	EmptyPath { var: String },
}

/// Name of the companion variable holding a path to the secret.
fn file_var_name(var: &str) -> String {
	format!("{var}_FILE")
}

/// Load `var` from the environment, preferring `{var}_FILE`.
///
/// A single trailing newline is stripped from file contents; everything else
/// is kept verbatim. Returns `Ok(None)` when neither variable is set.
///
/// ```no_run
/// use migraine_common_config::load_secret_env;
///
/// if let Some(password) = load_secret_env("MIGRAINE_SERVER_COUCHDB_ADMIN_PASSWORD")? {
///     println!("admin password: {password}"); // prints "[REDACTED]"
/// }
/// # Ok::<(), migraine_common_config::SecretEnvError>(())
/// ```
pub fn load_secret_env(var: &str) -> Result<Option<SecretString>, SecretEnvError> {
	let file_var = file_var_name(var);

	if let Ok(path) = env::var(&file_var) {
		if path.is_empty() {
			return Err(SecretEnvError::EmptyPath { var: file_var });
		}
		let path = PathBuf::from(path);
		let content = fs::read_to_string(&path).map_err(|source| SecretEnvError::Io {
			path: path.clone(),
			source,
		})?;
		let value = content.strip_suffix('\n').unwrap_or(&content).to_string();
		return Ok(Some(SecretString::new(value)));
	}

	Ok(env::var(var).ok().map(SecretString::new))
}
