#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde::Deserialize;
use serde_json::json;
// self
use http_web_client::{
	client::{ClientConfig, ReqwestWebClient},
	error::{DecodeError, Error},
	request::{Query, RequestOptions},
	response::ResponseBody,
	store::MemoryStorage,
};

#[derive(Debug, Deserialize, PartialEq)]
struct Item {
	id: u32,
	name: String,
}

fn build_client(server: &MockServer, storage: MemoryStorage) -> ReqwestWebClient {
	ReqwestWebClient::new(ClientConfig::new(server.base_url()), Arc::new(storage))
		.expect("Failed to build the reqwest-backed client for request tests.")
}

#[tokio::test]
async fn authorized_calls_carry_bearer_query_and_json_body() {
	let server = MockServer::start_async().await;
	let create = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/items")
				.query_param("page", "2")
				.query_param("tag", "rust")
				.header("authorization", "Bearer token-1")
				.header("content-type", "application/json")
				.header("x-trace", "abc")
				.json_body(json!({ "name": "widget" }));
			then.status(201)
				.header("content-type", "application/json; charset=utf-8")
				.json_body(json!({ "id": 1, "name": "widget" }));
		})
		.await;
	let client = build_client(&server, MemoryStorage::with_entries([("access", "token-1")]));
	let options = RequestOptions::default()
		.query(Query::from_pairs([("page", "2"), ("tag", "rust")]))
		.header("X-Trace", "abc");
	let body = client
		.post_authorized("/items", Some(json!({ "name": "widget" })), options)
		.await
		.expect("Creating an item should succeed.");

	create.assert_async().await;

	assert_eq!(
		body.json::<Item>().expect("The response should match the item shape."),
		Item { id: 1, name: "widget".into() }
	);
}

#[tokio::test]
async fn unauthenticated_calls_never_send_a_token() {
	let server = MockServer::start_async().await;
	let public = server
		.mock_async(|when, then| {
			when.method(GET).path("/public").header_missing("authorization");
			then.status(200).header("content-type", "text/plain").body("hello");
		})
		.await;
	let client = build_client(&server, MemoryStorage::with_entries([("access", "token-1")]));
	let body =
		client.get("/public", Default::default()).await.expect("Public call should succeed.");

	public.assert_async().await;

	assert_eq!(body, ResponseBody::Text("hello".into()));
}

#[tokio::test]
async fn absolute_inputs_bypass_the_base_url() {
	let server = MockServer::start_async().await;
	let other = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/elsewhere");
			then.status(204);
		})
		.await;
	let storage = MemoryStorage::default();
	let client = ReqwestWebClient::new(
		ClientConfig::new("http://unreachable.invalid"),
		Arc::new(storage),
	)
	.expect("Failed to build the reqwest-backed client for request tests.");
	let body = client
		.delete(&server.url("/elsewhere"), Default::default())
		.await
		.expect("Absolute inputs should reach the mock server.");

	other.assert_async().await;

	assert_eq!(body, ResponseBody::Empty);
}

#[tokio::test]
async fn response_kinds_follow_the_content_type() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/form");
			then.status(200)
				.header("content-type", "application/x-www-form-urlencoded")
				.body("a=1&b=two");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/blob");
			then.status(200)
				.header("content-type", "application/octet-stream")
				.body([0_u8, 1, 2]);
		})
		.await;

	let client = build_client(&server, MemoryStorage::default());
	let form = client.get("/form", Default::default()).await.expect("Form call should succeed.");
	let blob = client.get("/blob", Default::default()).await.expect("Blob call should succeed.");

	assert_eq!(
		form,
		ResponseBody::Form(vec![("a".into(), "1".into()), ("b".into(), "two".into())])
	);
	assert_eq!(blob.as_bytes(), Some(&[0_u8, 1, 2][..]));
}

#[tokio::test]
async fn failures_carry_the_decoded_body() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(PATCH).path("/items/9");
			then.status(422)
				.header("content-type", "application/problem+json")
				.json_body(json!({ "field": "name" }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/broken");
			then.status(200).header("content-type", "application/json").body("{not json");
		})
		.await;

	let client = build_client(&server, MemoryStorage::default());
	let err = client
		.patch("/items/9", Some(json!({ "name": "" })), Default::default())
		.await
		.expect_err("A 422 should surface as an HTTP error.");

	match err {
		Error::Http(error) => {
			assert_eq!(error.status, 422);
			assert_eq!(error.status_text, "Unprocessable Entity");
			assert_eq!(error.body, ResponseBody::Json(json!({ "field": "name" })));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	let err = client
		.get("/broken", Default::default())
		.await
		.expect_err("Malformed JSON should fail to decode.");

	assert!(matches!(err, Error::Decode(DecodeError::MalformedJson { status: 200, .. })));
}
