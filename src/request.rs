//! Request descriptors, options, and resolution into transport requests.
//!
//! Resolution turns a caller-supplied input (absolute URL or path relative to the client's
//! base URL) plus [`RequestOptions`] into a [`TransportRequest`]:
//!
//! - an input that does not parse as an absolute URL is appended to the base URL verbatim;
//! - a non-empty [`Query`] is appended with `?` (or `&` when the URL already has a query);
//! - a body without an explicit `Content-Type` is sent as JSON with `application/json`;
//! - an authorized request carries `Authorization: Bearer <access>` when a token exists.

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ConfigError,
	http::{HeaderMap, HeaderName, HeaderValue, Method, TransportRequest, header},
};

/// Media type applied to JSON-serialized bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Canonical, already-encoded query string.
///
/// Pairs keep the order they were supplied in, so the same input always produces the same
/// string.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Query(String);
impl Query {
	/// Encodes ordered key/value pairs.
	pub fn from_pairs<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: AsRef<str>,
	{
		let mut serializer = url::form_urlencoded::Serializer::new(String::new());

		for (key, value) in pairs {
			serializer.append_pair(key.as_ref(), value.as_ref());
		}

		Self(serializer.finish())
	}

	/// Encodes any serializable value with bracket notation for nesting.
	///
	/// Struct fields keep declaration order and `None` fields are skipped. Sequences become
	/// `tags[0]=a&tags[1]=b` and nested maps become `filter[state]=open`, with the brackets
	/// percent-encoded. A scalar at the top level encodes to an empty query.
	pub fn from_serialize<T>(value: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		let value =
			serde_json::to_value(value).map_err(|source| ConfigError::QueryEncoding { source })?;
		let mut serializer = url::form_urlencoded::Serializer::new(String::new());

		match value {
			JsonValue::Object(map) => {
				for (key, value) in map {
					append_nested(&mut serializer, key, &value);
				}
			},
			JsonValue::Array(items) => {
				for (index, value) in items.iter().enumerate() {
					append_nested(&mut serializer, index.to_string(), value);
				}
			},
			_ => (),
		}

		Ok(Self(serializer.finish()))
	}

	/// Returns the encoded query string without the leading `?`.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the query encodes no pairs.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl Display for Query {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

fn append_nested(
	serializer: &mut url::form_urlencoded::Serializer<'_, String>,
	key: String,
	value: &JsonValue,
) {
	match value {
		JsonValue::Null => (),
		JsonValue::Bool(flag) => {
			serializer.append_pair(&key, if *flag { "true" } else { "false" });
		},
		JsonValue::Number(number) => {
			serializer.append_pair(&key, &number.to_string());
		},
		JsonValue::String(text) => {
			serializer.append_pair(&key, text);
		},
		JsonValue::Array(items) => {
			for (index, item) in items.iter().enumerate() {
				append_nested(serializer, format!("{key}[{index}]"), item);
			}
		},
		JsonValue::Object(map) => {
			for (name, item) in map {
				append_nested(serializer, format!("{key}[{name}]"), item);
			}
		},
	}
}

/// Per-call options recognized by the client.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestOptions {
	/// Query appended to the resolved URL.
	pub query: Option<Query>,
	/// Attach the access token and take part in the refresh protocol.
	pub auth: bool,
	/// Caller-supplied headers; names are matched case-insensitively.
	pub headers: BTreeMap<String, String>,
	/// Request body.
	pub body: Option<JsonValue>,
	/// Timeout forwarded to the transport.
	pub timeout: Option<StdDuration>,
}
impl RequestOptions {
	/// Sets the query.
	pub fn query(mut self, query: Query) -> Self {
		self.query = Some(query);

		self
	}

	/// Sets the authorization flag.
	pub fn auth(mut self, auth: bool) -> Self {
		self.auth = auth;

		self
	}

	/// Adds or replaces a header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Sets the body.
	pub fn body(mut self, body: JsonValue) -> Self {
		self.body = Some(body);

		self
	}

	/// Sets the transport timeout.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	fn has_content_type(&self) -> bool {
		self.headers.keys().any(|name| name.eq_ignore_ascii_case(header::CONTENT_TYPE.as_str()))
	}
}

/// Immutable description of one logical call, reused verbatim for the post-refresh retry.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestDescriptor {
	/// Absolute URL or path relative to the base URL.
	pub input: String,
	/// HTTP method.
	pub method: Method,
	/// Call options.
	pub options: RequestOptions,
}
impl RequestDescriptor {
	/// Creates a descriptor.
	pub fn new(method: Method, input: impl Into<String>, options: RequestOptions) -> Self {
		Self { input: input.into(), method, options }
	}

	/// Returns `true` when the call takes part in the refresh protocol.
	pub fn requires_auth(&self) -> bool {
		self.options.auth
	}

	/// Resolves the descriptor against `base_url`, attaching `bearer` when authorized.
	pub fn resolve(
		&self,
		base_url: &str,
		bearer: Option<&TokenSecret>,
	) -> Result<TransportRequest> {
		let url = resolve_url(base_url, &self.input, self.options.query.as_ref())?;
		let mut request = TransportRequest::new(self.method.clone(), url);

		request.headers = build_headers(&self.options.headers)?;
		request.timeout = self.options.timeout;

		if let Some(body) = &self.options.body {
			request.body = Some(if self.options.has_content_type() {
				match body {
					JsonValue::String(raw) => raw.clone().into_bytes(),
					other => serde_json::to_vec(other).map_err(ConfigError::from)?,
				}
			} else {
				request
					.headers
					.insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

				serde_json::to_vec(body).map_err(ConfigError::from)?
			});
		}
		if let Some(secret) = bearer.filter(|_| self.options.auth) {
			request.headers.insert(header::AUTHORIZATION, authorization_value(secret)?);
		}

		Ok(request)
	}
}

/// Returns `true` when `input` parses as an absolute URL.
///
/// Parse failures are the "treat as relative" answer, never an error.
pub fn is_absolute_url(input: &str) -> bool {
	Url::parse(input).is_ok()
}

/// Resolves `input` against `base_url` and appends `query`.
pub fn resolve_url(base_url: &str, input: &str, query: Option<&Query>) -> Result<Url> {
	let mut raw =
		if is_absolute_url(input) { input.to_owned() } else { format!("{base_url}{input}") };

	if let Some(query) = query.filter(|query| !query.is_empty()) {
		raw.push(if raw.contains('?') { '&' } else { '?' });
		raw.push_str(query.as_str());
	}

	Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { url: raw, source }.into())
}

/// Builds the `Authorization` header value for `secret`, hidden from debug output.
pub(crate) fn authorization_value(secret: &TokenSecret) -> Result<HeaderValue> {
	let mut value = HeaderValue::from_str(&secret.bearer())
		.map_err(|e| ConfigError::invalid_header(header::AUTHORIZATION.as_str(), e))?;

	value.set_sensitive(true);

	Ok(value)
}

fn build_headers(headers: &BTreeMap<String, String>) -> Result<HeaderMap> {
	let mut map = HeaderMap::with_capacity(headers.len());

	for (name, value) in headers {
		let header_name = HeaderName::from_bytes(name.as_bytes())
			.map_err(|e| ConfigError::invalid_header(name, e))?;
		let header_value =
			HeaderValue::from_str(value).map_err(|e| ConfigError::invalid_header(name, e))?;

		map.insert(header_name, header_value);
	}

	Ok(map)
}
