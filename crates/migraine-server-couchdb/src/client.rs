// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP implementation of [`DocumentStore`].

use std::time::Duration;

use async_trait::async_trait;
use migraine_common_secret::SecretString;
use reqwest::header::{self, HeaderMap};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::error::CouchError;
use crate::store::DocumentStore;
use crate::types::{Document, SecurityDocument, Session};

const SESSION_COOKIE: &str = "AuthSession";

/// CouchDB client over HTTP.
#[derive(Debug, Clone)]
pub struct CouchClient {
	http_client: Client,
	base_url: Url,
}

#[derive(Debug, Serialize)]
struct SessionRequest<'a> {
	name: &'a str,
	password: &'a str,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
	name: Option<String>,
	#[serde(default)]
	roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
	rev: String,
}

#[derive(Debug, Deserialize)]
struct AllDocsResponse {
	rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
struct AllDocsRow {
	id: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
	#[serde(default)]
	error: String,
	#[serde(default)]
	reason: String,
}

impl CouchClient {
	/// Client for the server at `base_url`, bounding every request by `timeout`.
	pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CouchError> {
		let http_client = migraine_common_http::new_client_with_timeout(timeout)?;
		Self::with_http_client(base_url, http_client)
	}

	pub fn with_http_client(base_url: &str, http_client: Client) -> Result<Self, CouchError> {
		let base_url = Url::parse(base_url)?;
		if base_url.cannot_be_a_base() {
			return Err(CouchError::InvalidUrl(base_url.to_string()));
		}
		Ok(Self {
			http_client,
			base_url,
		})
	}

	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Append percent-encoded path segments to the base URL.
	fn url(&self, segments: &[&str]) -> Result<Url, CouchError> {
		let mut url = self.base_url.clone();
		url.path_segments_mut()
			.map_err(|_| CouchError::InvalidUrl(self.base_url.to_string()))?
			.pop_if_empty()
			.extend(segments);
		Ok(url)
	}

	fn request(
		&self,
		method: Method,
		session: &Session,
		segments: &[&str],
	) -> Result<RequestBuilder, CouchError> {
		let mut request = self.http_client.request(method, self.url(segments)?);
		if !session.is_anonymous() {
			request = request.header(
				header::COOKIE,
				format!("{SESSION_COOKIE}={}", session.token().expose()),
			);
		}
		Ok(request.header(header::ACCEPT, "application/json"))
	}

	async fn send(&self, request: RequestBuilder) -> Result<Response, CouchError> {
		request.send().await.map_err(|e| {
			if e.is_timeout() {
				error!("CouchDB request timed out");
				return CouchError::Timeout;
			}
			error!(error = %e, "network error talking to CouchDB");
			CouchError::Network(e)
		})
	}

	async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, CouchError> {
		let body = response.text().await.map_err(|e| {
			if e.is_timeout() {
				return CouchError::Timeout;
			}
			CouchError::Network(e)
		})?;
		serde_json::from_str(&body)
			.map_err(|e| CouchError::InvalidResponse(format!("JSON parse error: {e}")))
	}
}

/// Turn a non-success response into [`CouchError::Status`].
async fn check(response: Response) -> Result<Response, CouchError> {
	let status = response.status();
	if status.is_success() {
		return Ok(response);
	}
	let body: ErrorBody = response.json().await.unwrap_or_default();
	debug!(status = status.as_u16(), error = %body.error, reason = %body.reason, "CouchDB error");
	Err(CouchError::Status {
		status: status.as_u16(),
		error: body.error,
		reason: body.reason,
	})
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
	headers
		.get_all(header::SET_COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.find_map(|cookie| {
			let pair = cookie.split(';').next()?.trim();
			let (name, value) = pair.split_once('=')?;
			(name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
		})
}

#[async_trait]
impl DocumentStore for CouchClient {
	#[instrument(skip(self, password))]
	async fn authenticate(&self, name: &str, password: &SecretString) -> Result<Session, CouchError> {
		let request = self
			.http_client
			.post(self.url(&["_session"])?)
			.json(&SessionRequest {
				name,
				password: password.expose(),
			});
		let response = check(self.send(request).await?).await.inspect_err(|e| {
			if e.is_unauthorized() {
				warn!("CouchDB rejected session credentials");
			}
		})?;

		let token = session_cookie(response.headers()).ok_or_else(|| {
			CouchError::InvalidResponse("missing AuthSession cookie".to_string())
		})?;
		let body: SessionResponse = Self::read_json(response).await?;

		debug!(roles = ?body.roles, "CouchDB session established");
		Ok(Session::new(
			body.name.unwrap_or_else(|| name.to_string()),
			body.roles,
			SecretString::new(token),
		))
	}

	#[instrument(skip(self, session))]
	async fn get_document(
		&self,
		session: &Session,
		db: &str,
		id: &str,
	) -> Result<Option<Document>, CouchError> {
		let response = self
			.send(self.request(Method::GET, session, &[db, id])?)
			.await?;
		if response.status() == StatusCode::NOT_FOUND {
			return Ok(None);
		}
		let value: Value = Self::read_json(check(response).await?).await?;
		Document::from_value(value).map(Some)
	}

	#[instrument(skip(self, session, body))]
	async fn put_document(
		&self,
		session: &Session,
		db: &str,
		id: &str,
		body: &Value,
	) -> Result<String, CouchError> {
		let request = self.request(Method::PUT, session, &[db, id])?.json(body);
		let response = check(self.send(request).await?).await?;
		let put: PutResponse = Self::read_json(response).await?;
		debug!(rev = %put.rev, "document written");
		Ok(put.rev)
	}

	#[instrument(skip(self, session))]
	async fn delete_document(
		&self,
		session: &Session,
		db: &str,
		id: &str,
		rev: &str,
	) -> Result<(), CouchError> {
		let request = self
			.request(Method::DELETE, session, &[db, id])?
			.header(header::IF_MATCH, rev);
		check(self.send(request).await?).await?;
		Ok(())
	}

	#[instrument(skip(self, session))]
	async fn database_exists(&self, session: &Session, db: &str) -> Result<bool, CouchError> {
		let response = self
			.send(self.request(Method::HEAD, session, &[db])?)
			.await?;
		match response.status() {
			StatusCode::OK => Ok(true),
			StatusCode::NOT_FOUND => Ok(false),
			_ => check(response).await.map(|_| true),
		}
	}

	#[instrument(skip(self, session))]
	async fn create_database(&self, session: &Session, db: &str) -> Result<(), CouchError> {
		check(self.send(self.request(Method::PUT, session, &[db])?).await?).await?;
		Ok(())
	}

	#[instrument(skip(self, session))]
	async fn delete_database(&self, session: &Session, db: &str) -> Result<(), CouchError> {
		check(self.send(self.request(Method::DELETE, session, &[db])?).await?).await?;
		Ok(())
	}

	#[instrument(skip(self, session, security))]
	async fn put_security(
		&self,
		session: &Session,
		db: &str,
		security: &SecurityDocument,
	) -> Result<(), CouchError> {
		let request = self
			.request(Method::PUT, session, &[db, "_security"])?
			.json(security);
		check(self.send(request).await?).await?;
		Ok(())
	}

	#[instrument(skip(self, session))]
	async fn list_document_ids(
		&self,
		session: &Session,
		db: &str,
	) -> Result<Vec<String>, CouchError> {
		let response = check(
			self.send(self.request(Method::GET, session, &[db, "_all_docs"])?)
				.await?,
		)
		.await?;
		let all_docs: AllDocsResponse = Self::read_json(response).await?;
		Ok(all_docs.rows.into_iter().map(|row| row.id).collect())
	}

	#[instrument(skip(self))]
	async fn ping(&self) -> Result<(), CouchError> {
		let request = self.http_client.get(self.base_url.clone());
		check(self.send(request).await?).await?;
		Ok(())
	}
}
