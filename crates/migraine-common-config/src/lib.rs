// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration primitives shared across Migraine crates.
//!
//! - [`Secret<T>`] re-exported from [`migraine_common_secret`]
//! - [`load_secret_env`] for the `VAR` / `VAR_FILE` convention used by the
//!   CouchDB admin password and the API keys

pub mod env;

pub use migraine_common_secret::{Secret, SecretString, REDACTED};

pub use env::{load_secret_env, SecretEnvError};
