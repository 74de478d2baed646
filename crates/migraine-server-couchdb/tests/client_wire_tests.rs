// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `CouchClient` against a mock CouchDB, checking the requests on the wire.

use std::time::Duration;

use migraine_common_secret::SecretString;
use migraine_server_couchdb::{CouchClient, CouchError, DocumentStore, SecurityDocument, Session};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session() -> Session {
	Session::new(
		"admin",
		vec!["_admin".to_string()],
		SecretString::from("c2Vzc2lvbg"),
	)
}

async fn client(server: &MockServer) -> CouchClient {
	CouchClient::new(&server.uri(), Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn authenticate_posts_credentials_and_reads_cookie() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/_session"))
		.and(body_json(json!({"name": "admin", "password": "pw"})))
		.respond_with(
			ResponseTemplate::new(200)
				.insert_header("Set-Cookie", "AuthSession=c2Vzc2lvbg; Version=1; Path=/; HttpOnly")
				.set_body_json(json!({"ok": true, "name": "admin", "roles": ["_admin"]})),
		)
		.expect(1)
		.mount(&server)
		.await;

	let session = client(&server)
		.await
		.authenticate("admin", &SecretString::from("pw"))
		.await
		.unwrap();

	assert_eq!(session.name(), Some("admin"));
	assert!(session.is_server_admin());
	assert_eq!(session.token().expose(), "c2Vzc2lvbg");
}

#[tokio::test]
async fn authenticate_rejection_keeps_status() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/_session"))
		.respond_with(ResponseTemplate::new(401).set_body_json(json!({
			"error": "unauthorized",
			"reason": "Name or password is incorrect."
		})))
		.mount(&server)
		.await;

	let err = client(&server)
		.await
		.authenticate("admin", &SecretString::from("wrong"))
		.await
		.unwrap_err();

	match err {
		CouchError::Status {
			status,
			error,
			reason,
		} => {
			assert_eq!(status, 401);
			assert_eq!(error, "unauthorized");
			assert_eq!(reason, "Name or password is incorrect.");
		}
		other => panic!("unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn authenticate_without_cookie_is_invalid_response() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/_session"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
		.mount(&server)
		.await;

	let err = client(&server)
		.await
		.authenticate("admin", &SecretString::from("pw"))
		.await
		.unwrap_err();
	assert!(matches!(err, CouchError::InvalidResponse(_)));
}

#[tokio::test]
async fn get_document_sends_cookie_and_maps_404_to_none() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/_users/org.couchdb.user:alice"))
		.and(header("cookie", "AuthSession=c2Vzc2lvbg"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"_id": "org.couchdb.user:alice",
			"_rev": "1-abc",
			"type": "user",
			"name": "alice",
			"roles": []
		})))
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/_users/org.couchdb.user:bob"))
		.respond_with(ResponseTemplate::new(404).set_body_json(json!({
			"error": "not_found",
			"reason": "missing"
		})))
		.mount(&server)
		.await;

	let client = client(&server).await;
	let doc = client
		.get_document(&session(), "_users", "org.couchdb.user:alice")
		.await
		.unwrap()
		.unwrap();
	assert_eq!(doc.rev, "1-abc");
	assert_eq!(doc.body["name"], json!("alice"));

	let missing = client
		.get_document(&session(), "_users", "org.couchdb.user:bob")
		.await
		.unwrap();
	assert!(missing.is_none());
}

#[tokio::test]
async fn put_document_returns_revision_and_surfaces_conflict() {
	let server = MockServer::start().await;
	Mock::given(method("PUT"))
		.and(path("/_users/org.couchdb.user:carol"))
		.and(body_json(json!({"type": "user", "name": "carol", "password": "pw", "roles": []})))
		.respond_with(ResponseTemplate::new(201).set_body_json(json!({
			"ok": true,
			"id": "org.couchdb.user:carol",
			"rev": "1-def"
		})))
		.up_to_n_times(1)
		.mount(&server)
		.await;
	Mock::given(method("PUT"))
		.and(path("/_users/org.couchdb.user:carol"))
		.respond_with(ResponseTemplate::new(409).set_body_json(json!({
			"error": "conflict",
			"reason": "Document update conflict."
		})))
		.mount(&server)
		.await;

	let client = client(&server).await;
	let body = json!({"type": "user", "name": "carol", "password": "pw", "roles": []});

	let rev = client
		.put_document(&session(), "_users", "org.couchdb.user:carol", &body)
		.await
		.unwrap();
	assert_eq!(rev, "1-def");

	let err = client
		.put_document(&session(), "_users", "org.couchdb.user:carol", &body)
		.await
		.unwrap_err();
	assert!(err.is_conflict());
}

#[tokio::test]
async fn delete_document_sends_if_match() {
	let server = MockServer::start().await;
	Mock::given(method("DELETE"))
		.and(path("/_users/org.couchdb.user:alice"))
		.and(header("if-match", "3-xyz"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "rev": "4-xyz"})))
		.expect(1)
		.mount(&server)
		.await;

	client(&server)
		.await
		.delete_document(&session(), "_users", "org.couchdb.user:alice", "3-xyz")
		.await
		.unwrap();
}

#[tokio::test]
async fn database_lifecycle() {
	let server = MockServer::start().await;
	Mock::given(method("HEAD"))
		.and(path("/user_present"))
		.respond_with(ResponseTemplate::new(200))
		.mount(&server)
		.await;
	Mock::given(method("HEAD"))
		.and(path("/user_absent"))
		.respond_with(ResponseTemplate::new(404))
		.mount(&server)
		.await;
	Mock::given(method("PUT"))
		.and(path("/user_present"))
		.respond_with(ResponseTemplate::new(412).set_body_json(json!({
			"error": "file_exists",
			"reason": "The database could not be created, the file already exists."
		})))
		.mount(&server)
		.await;
	Mock::given(method("DELETE"))
		.and(path("/user_present"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
		.expect(1)
		.mount(&server)
		.await;

	let client = client(&server).await;
	assert!(client.database_exists(&session(), "user_present").await.unwrap());
	assert!(!client.database_exists(&session(), "user_absent").await.unwrap());

	let err = client
		.create_database(&session(), "user_present")
		.await
		.unwrap_err();
	assert_eq!(err.status_code(), Some(412));

	client
		.delete_database(&session(), "user_present")
		.await
		.unwrap();
}

#[tokio::test]
async fn database_exists_surfaces_forbidden() {
	let server = MockServer::start().await;
	Mock::given(method("HEAD"))
		.and(path("/user_private"))
		.respond_with(ResponseTemplate::new(403))
		.mount(&server)
		.await;

	let err = client(&server)
		.await
		.database_exists(&session(), "user_private")
		.await
		.unwrap_err();
	assert!(err.is_forbidden());
}

#[tokio::test]
async fn put_security_sends_access_policy() {
	let server = MockServer::start().await;
	Mock::given(method("PUT"))
		.and(path("/user_abc/_security"))
		.and(body_json(json!({
			"admins": {"names": [], "roles": ["_admin"]},
			"members": {"names": ["alice"], "roles": ["_admin"]}
		})))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
		.expect(1)
		.mount(&server)
		.await;

	client(&server)
		.await
		.put_security(
			&session(),
			"user_abc",
			&SecurityDocument::owned_by("alice", "_admin"),
		)
		.await
		.unwrap();
}

#[tokio::test]
async fn list_document_ids_reads_all_docs_rows() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/_users/_all_docs"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"total_rows": 2,
			"offset": 0,
			"rows": [
				{"id": "_design/_auth", "key": "_design/_auth", "value": {"rev": "1-a"}},
				{"id": "org.couchdb.user:alice", "key": "org.couchdb.user:alice", "value": {"rev": "1-b"}}
			]
		})))
		.mount(&server)
		.await;

	let ids = client(&server)
		.await
		.list_document_ids(&session(), "_users")
		.await
		.unwrap();
	assert_eq!(ids, vec!["_design/_auth", "org.couchdb.user:alice"]);
}

#[tokio::test]
async fn slow_response_is_timeout() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/"))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_json(json!({"couchdb": "Welcome"}))
				.set_delay(Duration::from_secs(2)),
		)
		.mount(&server)
		.await;

	let client = CouchClient::new(&server.uri(), Duration::from_millis(100)).unwrap();
	let err = client.ping().await.unwrap_err();
	assert!(matches!(err, CouchError::Timeout));
}

#[tokio::test]
async fn ping_is_unauthenticated() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({"couchdb": "Welcome"})))
		.expect(1)
		.mount(&server)
		.await;

	client(&server).await.ping().await.unwrap();
	let requests = server.received_requests().await.unwrap();
	assert!(requests[0].headers.get("cookie").is_none());
}

#[tokio::test]
async fn anonymous_session_sends_no_cookie() {
	let server = MockServer::start().await;
	Mock::given(method("HEAD"))
		.and(path("/user_abc"))
		.respond_with(ResponseTemplate::new(401))
		.mount(&server)
		.await;

	let err = client(&server)
		.await
		.database_exists(&Session::anonymous(), "user_abc")
		.await
		.unwrap_err();
	assert!(err.is_unauthorized());

	let requests = server.received_requests().await.unwrap();
	assert!(requests[0].headers.get("cookie").is_none());
}
