//! Demonstrates plugging a custom [`HttpTransport`] into the client.
//!
//! 1. Implement [`HttpTransport::send`] and return every HTTP status as a
//!    [`TransportResponse`]; only failures to obtain a response become [`TransportError`]s.
//! 2. Pass the transport to [`HttpWebClient::with_transport`] together with a token storage.
//! 3. Choose [`RefreshPolicy::Coalesce`] so concurrent `401`s share one refresh exchange.

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use color_eyre::Result;
// self
use http_web_client::{
	auth::TokenPair,
	client::{ClientConfig, HttpWebClient, RefreshPolicy},
	error::TransportError,
	http::{
		HeaderValue, HttpTransport, Method, StatusCode, TransportFuture, TransportRequest,
		TransportResponse, header,
	},
	request::RequestOptions,
	store::MemoryStorage,
};

/// Offline transport that expires the first access token and counts refresh exchanges.
#[derive(Default)]
struct OfflineTransport {
	refreshes: AtomicUsize,
}
impl OfflineTransport {
	fn answer(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
		let bearer = request.header(header::AUTHORIZATION).unwrap_or_default();
		let (status, body) = match (request.url.path(), bearer) {
			("/auth/refresh", "Bearer offline-refresh") => {
				let issued = self.refreshes.fetch_add(1, Ordering::Relaxed) + 1;

				(StatusCode::OK, format!("{{\"access\":\"offline-access-{issued}\"}}"))
			},
			("/auth/refresh", _) => (StatusCode::UNAUTHORIZED, String::new()),
			(_, bearer) if bearer.starts_with("Bearer offline-access-") =>
				(StatusCode::OK, format!("{{\"method\":\"{}\"}}", request.method)),
			_ => (StatusCode::UNAUTHORIZED, String::new()),
		};
		let mut response = TransportResponse::new(status, body.into_bytes());

		response.headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

		Ok(response)
	}
}
impl HttpTransport for OfflineTransport {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
		Box::pin(async move { self.answer(&request) })
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let transport = Arc::new(OfflineTransport::default());
	let config = ClientConfig::new("https://offline.example")
		.with_refresh_endpoint("/auth/refresh")
		.with_refresh_policy(RefreshPolicy::Coalesce);
	let client = <HttpWebClient<OfflineTransport>>::with_transport(
		config,
		Arc::new(MemoryStorage::default()),
		Arc::clone(&transport),
	)?;

	client.set_tokens(TokenPair::new("offline-expired", "offline-refresh"))?;

	let other = client.clone();
	let (reads, writes) = tokio::join!(
		client.get_authorized("/items", Default::default()),
		other.request(Method::DELETE, "/items/1", RequestOptions::default().auth(true)),
	);

	println!("GET answered with {:?}.", reads?);
	println!("DELETE answered with {:?}.", writes?);
	println!("Refresh exchanges: {}.", transport.refreshes.load(Ordering::Relaxed));

	Ok(())
}
