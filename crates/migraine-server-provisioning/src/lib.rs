// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Account provisioning for Migraine.
//!
//! An account is two CouchDB resources that must appear and disappear
//! together: an identity record in `_users` and a private database restricted
//! to that identity. CouchDB has no transactions spanning both, so
//! [`AccountProvisioningService`] runs a fixed sequence of single-document
//! calls and stops at the first failure, reporting it as-is.
//!
//! [`AdminSessionCache`] supplies the admin session those calls run under.

mod error;
pub mod naming;
mod service;
mod session_cache;

pub use error::{ErrorKind, ProvisioningError};
pub use naming::{account_from_identity_doc_id, database_for_user, identity_doc_id, validate_user};
pub use service::{AccountProvisioningService, ProvisionedAccount, Result};
pub use session_cache::AdminSessionCache;
