// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared HTTP client with a consistent User-Agent header.
//!
//! Requests are never retried here. Provisioning steps are not idempotent, so
//! a failed call is reported to the caller as-is.

mod client;

pub use client::{builder, new_client_with_timeout, user_agent};
