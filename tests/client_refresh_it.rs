#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use http_web_client::{
	auth::TokenPair,
	client::{ClientConfig, ReqwestWebClient},
	error::Error,
	response::ResponseBody,
	store::{MemoryStorage, TokenStorage},
};

const REFRESH_PATH: &str = "/auth/refresh";

fn build_client(server: &MockServer, storage: &MemoryStorage) -> ReqwestWebClient {
	let config = ClientConfig::new(server.base_url()).with_refresh_endpoint(REFRESH_PATH);

	ReqwestWebClient::new(config, Arc::new(storage.clone()))
		.expect("Failed to build the reqwest-backed client for refresh tests.")
}

fn seeded_storage() -> MemoryStorage {
	MemoryStorage::with_entries([("access", "stale"), ("refresh", "refresh-1")])
}

#[tokio::test]
async fn expired_access_token_is_refreshed_and_the_call_retried() {
	let server = MockServer::start_async().await;
	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/me").header("authorization", "Bearer stale");
			then.status(401)
				.header("content-type", "application/json")
				.json_body(json!({ "error": "expired" }));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH).header("authorization", "Bearer refresh-1");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "access": "fresh", "refresh": "refresh-2" }));
		})
		.await;
	let accepted = server
		.mock_async(|when, then| {
			when.method(GET).path("/me").header("authorization", "Bearer fresh");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "id": 7, "name": "Ada" }));
		})
		.await;
	let storage = seeded_storage();
	let client = build_client(&server, &storage);
	let body = client
		.get_authorized("/me", Default::default())
		.await
		.expect("The retried call should succeed after a refresh.");

	rejected.assert_async().await;
	refresh.assert_async().await;
	accepted.assert_async().await;

	assert_eq!(body, ResponseBody::Json(json!({ "id": 7, "name": "Ada" })));
	assert_eq!(
		storage.get_item("access").expect("Memory storage reads should succeed."),
		Some("fresh".into())
	);
	assert_eq!(
		storage.get_item("refresh").expect("Memory storage reads should succeed."),
		Some("refresh-2".into())
	);
}

#[tokio::test]
async fn revoked_refresh_token_clears_the_session() {
	let server = MockServer::start_async().await;
	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/me");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(401)
				.header("content-type", "application/json")
				.json_body(json!({ "error": "invalid_refresh_token" }));
		})
		.await;
	let storage = seeded_storage();
	let client = build_client(&server, &storage);
	let err = client
		.get_authorized("/me", Default::default())
		.await
		.expect_err("A rejected refresh should fail the call.");

	rejected.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;

	match err {
		Error::Refresh(error) => {
			assert_eq!(error.status, 401);
			assert_eq!(error.body, ResponseBody::Json(json!({ "error": "invalid_refresh_token" })));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	assert!(!client.has_access_token());
	assert!(!client.has_refresh_token());
	assert!(storage.is_empty());
}

#[tokio::test]
async fn retry_rejection_does_not_trigger_a_second_refresh() {
	let server = MockServer::start_async().await;
	let protected = server
		.mock_async(|when, then| {
			when.method(PUT).path("/items/1");
			then.status(401).header("content-type", "text/plain").body("denied");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "access": "fresh" }));
		})
		.await;
	let storage = seeded_storage();
	let client = build_client(&server, &storage);
	let err = client
		.put_authorized("/items/1", Some(json!({ "name": "renamed" })), Default::default())
		.await
		.expect_err("A second 401 should surface to the caller.");

	protected.assert_calls_async(2).await;
	refresh.assert_calls_async(1).await;

	match err {
		Error::Http(error) => {
			assert!(error.is_unauthorized());
			assert_eq!(error.body, ResponseBody::Text("denied".into()));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	assert!(!client.has_access_token());
	assert_eq!(
		storage.get_item("refresh").expect("Memory storage reads should succeed."),
		Some("refresh-1".into())
	);
}

#[tokio::test]
async fn refresh_server_errors_keep_the_refresh_token() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/me");
			then.status(401);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(503).header("retry-after", "30");
		})
		.await;

	let storage = seeded_storage();
	let client = build_client(&server, &storage);
	let err = client
		.get_authorized("/me", Default::default())
		.await
		.expect_err("A failing refresh endpoint should fail the call.");

	match err {
		Error::Refresh(error) => {
			assert_eq!(error.status, 503);
			assert_eq!(error.retry_after, Some(time::Duration::seconds(30)));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	assert!(client.has_refresh_token());
	assert_eq!(client.refresh_metrics.failures(), 1);
}

#[tokio::test]
async fn manual_refresh_installs_a_new_pair() {
	let server = MockServer::start_async().await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH).header("authorization", "Bearer refresh-1");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "access": "fresh", "refresh": "refresh-2" }));
		})
		.await;
	let storage = MemoryStorage::default();
	let client = build_client(&server, &storage);

	client
		.set_tokens(TokenPair { access: None, refresh: Some("refresh-1".into()) })
		.expect("Seeding the refresh token should succeed.");
	client.refresh_tokens().await.expect("Manual refresh should succeed.");

	refresh.assert_async().await;

	assert_eq!(
		storage.get_item("access").expect("Memory storage reads should succeed."),
		Some("fresh".into())
	);
	assert_eq!(client.refresh_metrics.successes(), 1);
}
