// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request gate for the `/users` endpoints.
//!
//! [`Gated<T>`] runs three checks in a fixed order before a handler sees the
//! request:
//!
//! 1. the body parses as `T` (an empty body is read as `{}`), else 400
//! 2. `Authorization: Bearer <client_secret_key>` matches, else 403
//! 3. for mutating requests, when a provisioning key is configured, the body's
//!    `secret_key` matches it, else 403
//!
//! No backend call happens until all three pass.

use axum::{
	body::Bytes,
	extract::{FromRequest, Request},
	http::header::AUTHORIZATION,
};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::{api::AppState, error::ApiError};

/// A request body the gate knows how to authorize.
pub trait GatedBody: DeserializeOwned + Send {
	/// Whether the request creates or destroys resources.
	const MUTATING: bool = false;

	/// The provisioning key carried in the body, if any.
	fn secret_key(&self) -> Option<&str> {
		None
	}
}

/// Schema for routes that take no body.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct NoBody {}

impl GatedBody for NoBody {}

/// Extractor wrapping a body that passed every gate check.
#[derive(Debug)]
pub struct Gated<T>(pub T);

impl<T> FromRequest<AppState> for Gated<T>
where
	T: GatedBody,
{
	type Rejection = ApiError;

	async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
		let authorization = req
			.headers()
			.get(AUTHORIZATION)
			.and_then(|h| h.to_str().ok())
			.map(str::to_owned);

		let bytes = Bytes::from_request(req, state)
			.await
			.map_err(|e| ApiError::BadRequest(e.body_text()))?;
		let body = parse_body::<T>(&bytes)?;

		check_client_secret(state, authorization.as_deref())?;

		if T::MUTATING {
			check_provisioning_key(state, body.secret_key())?;
		}

		Ok(Gated(body))
	}
}

fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
	let bytes: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
		b"{}"
	} else {
		bytes
	};
	serde_json::from_slice(bytes).map_err(|e| {
		warn!(error = %e, "rejected malformed request body");
		ApiError::BadRequest(e.to_string())
	})
}

fn check_client_secret(state: &AppState, authorization: Option<&str>) -> Result<(), ApiError> {
	let Some(auth_value) = authorization else {
		warn!("request rejected: missing Authorization header");
		return Err(ApiError::Forbidden);
	};

	let Some(token) = auth_value.strip_prefix("Bearer ") else {
		warn!("request rejected: invalid Authorization format");
		return Err(ApiError::Forbidden);
	};

	if state.auth.client_secret_key.matches(token.trim()) {
		Ok(())
	} else {
		warn!("request rejected: invalid client secret");
		Err(ApiError::Forbidden)
	}
}

fn check_provisioning_key(state: &AppState, presented: Option<&str>) -> Result<(), ApiError> {
	let Some(expected) = &state.auth.provisioning_key else {
		return Ok(());
	};

	match presented {
		Some(key) if expected.matches(key) => Ok(()),
		Some(_) => {
			warn!("request rejected: invalid provisioning key");
			Err(ApiError::Forbidden)
		}
		None => {
			warn!("request rejected: missing provisioning key");
			Err(ApiError::Forbidden)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, Deserialize)]
	struct Named {
		name: String,
	}

	#[test]
	fn empty_body_reads_as_empty_object() {
		assert!(parse_body::<NoBody>(b"").is_ok());
		assert!(parse_body::<NoBody>(b"  \n").is_ok());
		assert!(parse_body::<NoBody>(b"{}").is_ok());
	}

	#[test]
	fn missing_required_field_is_bad_request() {
		let err = parse_body::<Named>(b"").unwrap_err();
		assert!(matches!(err, ApiError::BadRequest(_)));
	}

	#[test]
	fn wrong_type_is_bad_request() {
		let err = parse_body::<Named>(br#"{"name": 7}"#).unwrap_err();
		assert!(matches!(err, ApiError::BadRequest(_)));

		let named = parse_body::<Named>(br#"{"name": "bob", "extra": true}"#).unwrap();
		assert_eq!(named.name, "bob");
	}

	#[test]
	fn malformed_json_is_bad_request() {
		let err = parse_body::<NoBody>(b"{not json").unwrap_err();
		assert!(matches!(err, ApiError::BadRequest(_)));
	}
}
