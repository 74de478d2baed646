// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redacting wrapper for sensitive strings.
//!
//! Migraine handles three kinds of secrets: the CouchDB admin password, the
//! shared keys clients present to the provisioning API, and the passwords of
//! the accounts being created. All of them travel as [`SecretString`], which:
//!
//! - prints `[REDACTED]` through `Debug`, `Display` and `Serialize`
//! - is zeroized on drop
//! - only yields its value through an explicit [`Secret::expose`] call
//! - compares against untrusted input in constant time via [`SecretString::matches`]
//!
//! ```
//! use migraine_common_secret::SecretString;
//!
//! let key = SecretString::new("hunter2".to_string());
//! assert_eq!(format!("{key}"), "[REDACTED]");
//! assert!(key.matches("hunter2"));
//! assert!(!key.matches("hunter3"));
//! ```

use std::fmt;

use subtle::ConstantTimeEq;
use zeroize::Zeroize;

/// Placeholder printed in place of any secret value.
pub const REDACTED: &str = "[REDACTED]";

/// A value that must not leak into logs, error messages or responses.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Secret<T>
where
	T: Zeroize,
{
	inner: T,
}

pub type SecretString = Secret<String>;

impl<T> Secret<T>
where
	T: Zeroize,
{
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	/// Access the wrapped value.
	pub fn expose(&self) -> &T {
		&self.inner
	}
}

impl Secret<String> {
	/// Compare against an untrusted candidate without short-circuiting on the
	/// first differing byte.
	///
	/// Length differences still return early; the length of a shared key is
	/// not treated as sensitive.
	pub fn matches(&self, candidate: &str) -> bool {
		let expected = self.inner.as_bytes();
		let candidate = candidate.as_bytes();
		if expected.len() != candidate.len() {
			return false;
		}
		expected.ct_eq(candidate).into()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}
}

impl From<&str> for Secret<String> {
	fn from(value: &str) -> Self {
		Self::new(value.to_string())
	}
}

impl<T> Clone for Secret<T>
where
	T: Zeroize + Clone,
{
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T> fmt::Debug for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Secret").field(&REDACTED).finish()
	}
}

impl<T> fmt::Display for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T> PartialEq for Secret<T>
where
	T: Zeroize + PartialEq,
{
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl<T> Eq for Secret<T> where T: Zeroize + Eq {}

#[cfg(feature = "serde")]
mod serde_impl {
	use super::{Secret, REDACTED};
	use serde::{Deserialize, Deserializer, Serialize, Serializer};
	use zeroize::Zeroize;

	impl<T> Serialize for Secret<T>
	where
		T: Serialize + Zeroize,
	{
		fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
		where
			S: Serializer,
		{
			serializer.serialize_str(REDACTED)
		}
	}

	impl<'de, T> Deserialize<'de> for Secret<T>
	where
		T: Deserialize<'de> + Zeroize,
	{
		fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
		where
			D: Deserializer<'de>,
		{
			T::deserialize(deserializer).map(Secret::new)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn debug_and_display_are_redacted() {
		let password = SecretString::from("couch-admin-pw");
		assert_eq!(format!("{password}"), REDACTED);
		assert_eq!(format!("{password:?}"), "Secret(\"[REDACTED]\")");
	}

	#[test]
	fn option_of_secret_is_redacted() {
		let key: Option<SecretString> = Some(SecretString::from("provisioning-key"));
		let debug = format!("{key:?}");
		assert!(!debug.contains("provisioning-key"));
		assert!(debug.contains(REDACTED));
	}

	#[test]
	fn matches_accepts_only_exact_value() {
		let key = SecretString::from("s3cret");
		assert!(key.matches("s3cret"));
		assert!(!key.matches("s3cre"));
		assert!(!key.matches("s3cret "));
		assert!(!key.matches("S3CRET"));
		assert!(!key.matches(""));
	}

	#[test]
	fn empty_secret_matches_empty_candidate() {
		let key = SecretString::from("");
		assert!(key.is_empty());
		assert!(key.matches(""));
	}

	#[test]
	fn serialize_is_redacted() {
		let key = SecretString::from("client-secret");
		let json = serde_json::to_string(&key).unwrap();
		assert_eq!(json, "\"[REDACTED]\"");
	}

	#[test]
	fn deserialize_populates_value() {
		let key: SecretString = serde_json::from_str("\"client-secret\"").unwrap();
		assert_eq!(key.expose(), "client-secret");
	}

	proptest! {
		#[test]
		fn display_never_contains_value(inner in "[a-zA-Z0-9_.-]{3,40}") {
			prop_assume!(!REDACTED.contains(&inner));
			let secret = SecretString::new(inner.clone());
			let displayed = secret.to_string();
			let debugged = format!("{:?}", secret);
			prop_assert!(!displayed.contains(&inner));
			prop_assert!(!debugged.contains(&inner));
		}

		#[test]
		fn matches_agrees_with_equality(a in ".{0,20}", b in ".{0,20}") {
			let secret = SecretString::new(a.clone());
			prop_assert_eq!(secret.matches(&b), a == b);
		}
	}
}
