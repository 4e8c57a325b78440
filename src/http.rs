//! Transport primitives for outbound requests.
//!
//! The module exposes [`HttpTransport`] alongside the buffered [`TransportRequest`] and
//! [`TransportResponse`] types so downstream crates can plug in custom HTTP stacks (or
//! scripted fakes) without touching the refresh protocol. [`ReqwestTransport`] is the
//! default implementation behind the `reqwest` feature.

pub use ::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header};

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
use std::time::Duration as StdDuration;
// crates.io
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	error::{DecodeError, HttpError, TransportError},
	response::ResponseBody,
};

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing a single request.
///
/// The trait is the client's only dependency on a network stack. Implementations must be
/// `Send + Sync + 'static` so one transport can be shared by every clone of a client, and
/// the futures they return must be `Send` so callers can spawn client calls on
/// multi-threaded executors. Transports report every HTTP status as a successful
/// [`TransportResponse`]; only failures to obtain a response map to [`TransportError`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and buffers the full response.
	fn send(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// Fully resolved request handed to a transport.
#[derive(Clone, Debug)]
pub struct TransportRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute request URL.
	pub url: Url,
	/// Request headers.
	pub headers: HeaderMap,
	/// Serialized request body.
	pub body: Option<Vec<u8>>,
	/// Per-request timeout forwarded to the transport.
	pub timeout: Option<StdDuration>,
}
impl TransportRequest {
	/// Creates a request without headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: None, timeout: None }
	}

	/// Returns the value of `name` as a string, if present and valid UTF-8.
	pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
		self.headers.get(name).and_then(|value| value.to_str().ok())
	}
}

/// Buffered response returned by a transport.
#[derive(Clone, Debug)]
pub struct TransportResponse {
	/// HTTP status.
	pub status: StatusCode,
	/// Response headers (case-insensitive lookup).
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Creates a response without headers.
	pub fn new(status: StatusCode, body: Vec<u8>) -> Self {
		Self { status, headers: HeaderMap::new(), body }
	}

	/// Returns `true` for 2xx and 3xx statuses.
	pub fn is_ok(&self) -> bool {
		self.status.is_success() || self.status.is_redirection()
	}

	/// Returns the `Content-Type` header, if present and valid UTF-8.
	pub fn content_type(&self) -> Option<&str> {
		self.headers.get(header::CONTENT_TYPE).and_then(|value| value.to_str().ok())
	}

	/// Returns the `Retry-After` hint as a relative duration.
	pub fn retry_after(&self) -> Option<Duration> {
		parse_retry_after(&self.headers)
	}

	/// Decodes the body according to its declared content type.
	pub fn decode(&self) -> Result<ResponseBody, DecodeError> {
		ResponseBody::decode(self.status.as_u16(), self.content_type(), &self.body)
	}

	/// Converts a non-ok response into the error surfaced to callers.
	///
	/// The status alone classifies the failure; a body that does not decode as announced is
	/// kept as lossy text.
	pub(crate) fn into_http_error(self) -> HttpError {
		let status = self.status.as_u16();

		HttpError {
			status,
			status_text: self.status.canonical_reason().unwrap_or_default().to_owned(),
			retry_after: self.retry_after(),
			body: ResponseBody::decode_lossy(status, self.content_type(), &self.body),
		}
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let TransportRequest { method, url, headers, body, timeout } = request;
			let mut builder = self.0.request(method, url).headers(headers);

			if let Some(body) = body {
				builder = builder.body(body);
			}
			if let Some(timeout) = timeout {
				builder = builder.timeout(timeout);
			}

			let response = builder.send().await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?.to_vec();

			Ok(TransportResponse { status, headers, body })
		})
	}
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(header::RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn response(status: u16) -> TransportResponse {
		TransportResponse::new(
			StatusCode::from_u16(status).expect("Test status should be valid."),
			Vec::new(),
		)
	}

	#[test]
	fn ok_covers_success_and_redirection() {
		assert!(response(200).is_ok());
		assert!(response(204).is_ok());
		assert!(response(304).is_ok());
		assert!(!response(401).is_ok());
		assert!(!response(500).is_ok());
	}

	#[test]
	fn retry_after_accepts_delta_seconds() {
		let mut response = response(429);

		response.headers.insert(header::RETRY_AFTER, HeaderValue::from_static("7"));

		assert_eq!(response.retry_after(), Some(Duration::seconds(7)));
	}

	#[test]
	fn retry_after_ignores_past_dates_and_garbage() {
		let mut response = response(503);

		response
			.headers
			.insert(header::RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));

		assert_eq!(response.retry_after(), None);

		response.headers.insert(header::RETRY_AFTER, HeaderValue::from_static("soon"));

		assert_eq!(response.retry_after(), None);
	}

	#[test]
	fn http_error_carries_status_text_and_body() {
		let mut response = response(403);

		response.headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
		response.body = b"forbidden".to_vec();

		let error = response.into_http_error();

		assert_eq!(error.status, 403);
		assert_eq!(error.status_text, "Forbidden");
		assert_eq!(error.body, ResponseBody::Text("forbidden".into()));
	}

	#[test]
	fn http_error_keeps_malformed_json_as_text() {
		let mut response = response(401);

		response.headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
		response.body = b"Unauthorized".to_vec();

		let error = response.into_http_error();

		assert!(error.is_unauthorized());
		assert_eq!(error.body, ResponseBody::Text("Unauthorized".into()));
	}
}
