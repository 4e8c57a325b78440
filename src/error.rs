//! Client-level error types shared across resolution, transport, refresh, and storage.

// self
use crate::{_prelude::*, response::ResponseBody};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration or request-construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// Upstream answered with a non-ok status.
	#[error("{0}")]
	Http(HttpError),
	/// Refresh endpoint rejected the refresh token exchange.
	#[error("Token refresh failed: {0}")]
	Refresh(HttpError),
}
impl Error {
	/// Returns the HTTP failure carried by [`Error::Http`] or [`Error::Refresh`].
	pub fn http_error(&self) -> Option<&HttpError> {
		match self {
			Self::Http(e) | Self::Refresh(e) => Some(e),
			_ => None,
		}
	}

	/// Returns `true` when the failure is an HTTP `401 Unauthorized`.
	pub fn is_unauthorized(&self) -> bool {
		self.http_error().is_some_and(HttpError::is_unauthorized)
	}
}

/// Non-ok HTTP response surfaced to the caller.
#[derive(Clone, Debug, PartialEq, ThisError)]
#[error("Request failed with HTTP {status} {status_text}.")]
pub struct HttpError {
	/// HTTP status code.
	pub status: u16,
	/// Canonical reason phrase for the status, empty when unknown.
	pub status_text: String,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
	/// Decoded error body.
	pub body: ResponseBody,
}
impl HttpError {
	/// Returns `true` for `401 Unauthorized`.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Resolved request URL cannot be parsed.
	#[error("Request URL `{url}` is invalid.")]
	InvalidUrl {
		/// URL string that failed to parse.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Header name or value is not valid HTTP.
	#[error("Header `{name}` is invalid.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
		/// Underlying validation failure.
		#[source]
		source: BoxError,
	},
	/// Query value could not be encoded.
	#[error("Query string could not be encoded.")]
	QueryEncoding {
		/// Serialization failure of the query value.
		#[source]
		source: serde_json::Error,
	},
	/// Request body could not be serialized as JSON.
	#[error("Request body could not be serialized as JSON.")]
	BodyEncoding(#[from] serde_json::Error),
	/// Client configuration document is malformed.
	#[error("Client configuration is invalid.")]
	InvalidConfig {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Refresh was requested without a configured refresh endpoint.
	#[error("No refresh endpoint is configured.")]
	MissingRefreshEndpoint,
	/// Refresh was requested without a stored refresh token.
	#[error("No refresh token is stored.")]
	MissingRefreshToken,
}
impl ConfigError {
	/// Wraps a header validation failure.
	pub fn invalid_header(
		name: impl Into<String>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::InvalidHeader { name: name.into(), source: Box::new(src) }
	}
}
/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while sending the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Response decoding failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Body announced as JSON did not parse.
	#[error("Response with HTTP {status} announced JSON but the body is malformed.")]
	MalformedJson {
		/// HTTP status of the response.
		status: u16,
		/// Underlying parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// Body announced as `multipart/form-data` could not be split into parts.
	#[error("Response with HTTP {status} announced multipart form data but {reason}.")]
	MalformedMultipart {
		/// HTTP status of the response.
		status: u16,
		/// What was wrong with the body.
		reason: &'static str,
	},
	/// JSON body does not match the requested type.
	#[error("Response body does not match the expected shape.")]
	Shape {
		/// Structured deserialization failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Refresh endpoint returned a body that is not a token grant.
	#[error("Refresh endpoint returned a malformed token grant.")]
	RefreshGrant {
		/// Structured deserialization failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Body is not JSON.
	#[error("Expected a JSON response body but found {found}.")]
	NotJson {
		/// Kind of body that was received.
		found: &'static str,
	},
}
