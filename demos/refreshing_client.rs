//! Demonstrates the default reqwest-backed client recovering from an expired access token.
//!
//! The mock server rejects the stale token, accepts the refresh exchange, and serves the
//! retried call; the caller only sees the final profile.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde::Deserialize;
// self
use http_web_client::{
	auth::TokenPair,
	client::{ClientConfig, ReqwestWebClient},
	request::{Query, RequestOptions},
	store::MemoryStorage,
};

#[derive(Debug, Deserialize)]
struct Profile {
	id: u64,
	name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/me").header("authorization", "Bearer demo-expired");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh").header("authorization", "Bearer demo-refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access\":\"demo-access\",\"refresh\":\"demo-refresh-2\"}");
		})
		.await;
	let profile = server
		.mock_async(|when, then| {
			when.method(GET).path("/me").header("authorization", "Bearer demo-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":42,\"name\":\"Demo User\"}");
		})
		.await;
	let storage = MemoryStorage::default();
	let config = ClientConfig::new(server.base_url()).with_refresh_endpoint("/auth/refresh");
	let client = ReqwestWebClient::new(config, Arc::new(storage.clone()))?;

	client.set_tokens(TokenPair::new("demo-expired", "demo-refresh"))?;

	let options = RequestOptions::default().query(Query::from_pairs([("expand", "name")]));
	let me = client.get_authorized("/me", options).await?.json::<Profile>()?;

	println!("Signed in as {} (#{}).", me.name, me.id);
	println!("Refresh exchanges: {}.", client.refresh_metrics.successes());
	println!("Persisted token entries: {}.", storage.len());

	expired.assert_async().await;
	refresh.assert_async().await;
	profile.assert_async().await;

	Ok(())
}
