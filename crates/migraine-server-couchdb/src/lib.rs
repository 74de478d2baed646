// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! CouchDB access for the Migraine provisioning server.
//!
//! [`DocumentStore`] is the narrow slice of the CouchDB HTTP API that account
//! provisioning needs: sessions, single-document CRUD, HEAD existence checks,
//! database lifecycle and `_security` documents. There are two implementations:
//!
//! - [`CouchClient`] talks to a real server over HTTP
//! - [`MemoryCouch`] keeps everything in process, for tests
//!
//! Neither retries. Every non-success answer becomes a [`CouchError`] carrying
//! the HTTP status.

pub mod client;
pub mod error;
pub mod memory;
pub mod store;
pub mod types;

pub use client::CouchClient;
pub use error::CouchError;
pub use memory::{MemoryCouch, Operation};
pub use store::DocumentStore;
pub use types::{user_document, Document, SecurityDocument, SecurityGroup, Session};

/// Database holding identity records.
pub const USERS_DB: &str = "_users";

/// Role CouchDB grants to server administrators.
pub const SERVER_ADMIN_ROLE: &str = "_admin";

/// Id prefix of identity records in [`USERS_DB`].
pub const USER_DOC_PREFIX: &str = "org.couchdb.user:";
