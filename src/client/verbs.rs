//! Verb bindings over [`HttpWebClient::execute`].
//!
//! The verb decides whether the call is authorized; `options.auth` is overwritten. Verbs
//! with a body always send the explicit argument, replacing `options.body` even when the
//! argument is `None`. Verbs without a body forward `options.body` untouched.

// self
use crate::{
	_prelude::*,
	client::HttpWebClient,
	http::{HttpTransport, Method},
	request::{RequestDescriptor, RequestOptions},
	response::ResponseBody,
};

impl<T> HttpWebClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Sends an unauthenticated `GET`.
	pub async fn get(&self, input: &str, options: RequestOptions) -> Result<ResponseBody> {
		self.bodiless(Method::GET, input, options, false).await
	}

	/// Sends an authorized `GET`.
	pub async fn get_authorized(
		&self,
		input: &str,
		options: RequestOptions,
	) -> Result<ResponseBody> {
		self.bodiless(Method::GET, input, options, true).await
	}

	/// Sends an unauthenticated `HEAD`.
	pub async fn head(&self, input: &str, options: RequestOptions) -> Result<ResponseBody> {
		self.bodiless(Method::HEAD, input, options, false).await
	}

	/// Sends an authorized `HEAD`.
	pub async fn head_authorized(
		&self,
		input: &str,
		options: RequestOptions,
	) -> Result<ResponseBody> {
		self.bodiless(Method::HEAD, input, options, true).await
	}

	/// Sends an unauthenticated `DELETE`.
	pub async fn delete(&self, input: &str, options: RequestOptions) -> Result<ResponseBody> {
		self.bodiless(Method::DELETE, input, options, false).await
	}

	/// Sends an authorized `DELETE`.
	pub async fn delete_authorized(
		&self,
		input: &str,
		options: RequestOptions,
	) -> Result<ResponseBody> {
		self.bodiless(Method::DELETE, input, options, true).await
	}

	/// Sends an unauthenticated `POST`.
	pub async fn post(
		&self,
		input: &str,
		body: Option<JsonValue>,
		options: RequestOptions,
	) -> Result<ResponseBody> {
		self.with_body(Method::POST, input, body, options, false).await
	}

	/// Sends an authorized `POST`.
	pub async fn post_authorized(
		&self,
		input: &str,
		body: Option<JsonValue>,
		options: RequestOptions,
	) -> Result<ResponseBody> {
		self.with_body(Method::POST, input, body, options, true).await
	}

	/// Sends an unauthenticated `PUT`.
	pub async fn put(
		&self,
		input: &str,
		body: Option<JsonValue>,
		options: RequestOptions,
	) -> Result<ResponseBody> {
		self.with_body(Method::PUT, input, body, options, false).await
	}

	/// Sends an authorized `PUT`.
	pub async fn put_authorized(
		&self,
		input: &str,
		body: Option<JsonValue>,
		options: RequestOptions,
	) -> Result<ResponseBody> {
		self.with_body(Method::PUT, input, body, options, true).await
	}

	/// Sends an unauthenticated `PATCH`.
	pub async fn patch(
		&self,
		input: &str,
		body: Option<JsonValue>,
		options: RequestOptions,
	) -> Result<ResponseBody> {
		self.with_body(Method::PATCH, input, body, options, false).await
	}

	/// Sends an authorized `PATCH`.
	pub async fn patch_authorized(
		&self,
		input: &str,
		body: Option<JsonValue>,
		options: RequestOptions,
	) -> Result<ResponseBody> {
		self.with_body(Method::PATCH, input, body, options, true).await
	}

	/// Sends an unauthenticated `OPTIONS`.
	pub async fn options(&self, input: &str, options: RequestOptions) -> Result<ResponseBody> {
		self.bodiless(Method::OPTIONS, input, options, false).await
	}

	/// Sends an unauthenticated `CONNECT`.
	pub async fn connect(&self, input: &str, options: RequestOptions) -> Result<ResponseBody> {
		self.bodiless(Method::CONNECT, input, options, false).await
	}

	/// Sends an unauthenticated `TRACE`.
	pub async fn trace(&self, input: &str, options: RequestOptions) -> Result<ResponseBody> {
		self.bodiless(Method::TRACE, input, options, false).await
	}

	async fn bodiless(
		&self,
		method: Method,
		input: &str,
		mut options: RequestOptions,
		auth: bool,
	) -> Result<ResponseBody> {
		options.auth = auth;

		self.execute(&RequestDescriptor::new(method, input, options)).await
	}

	async fn with_body(
		&self,
		method: Method,
		input: &str,
		body: Option<JsonValue>,
		mut options: RequestOptions,
		auth: bool,
	) -> Result<ResponseBody> {
		options.auth = auth;
		options.body = body;

		self.execute(&RequestDescriptor::new(method, input, options)).await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, client::ClientConfig, http::header};

	#[tokio::test]
	async fn verbs_choose_method_and_authorization() {
		let transport = ScriptedTransport::default()
			.respond(204, None, Vec::new())
			.respond(204, None, Vec::new())
			.respond(204, None, Vec::new())
			.respond(204, None, Vec::new());
		let (client, _storage) =
			scripted_client(ClientConfig::new("https://api.example.com"), transport.clone());

		client.set_access_token(Some("a")).expect("Seeding should succeed.");
		client
			.head("/ping", RequestOptions::default().auth(true))
			.await
			.expect("HEAD should succeed.");
		client
			.patch_authorized("/items/1", None, Default::default())
			.await
			.expect("PATCH should succeed.");
		client.options("/items", Default::default()).await.expect("OPTIONS should succeed.");
		client.trace("/items", Default::default()).await.expect("TRACE should succeed.");

		let requests = transport.requests();
		let methods = requests.iter().map(|request| request.method.clone()).collect::<Vec<_>>();

		assert_eq!(methods, [Method::HEAD, Method::PATCH, Method::OPTIONS, Method::TRACE]);
		assert_eq!(
			requests[0].header(header::AUTHORIZATION),
			None,
			"The verb overrides options.auth."
		);
		assert_eq!(requests[1].header(header::AUTHORIZATION), Some("Bearer a"));
		assert_eq!(requests[2].header(header::AUTHORIZATION), None);
	}

	#[tokio::test]
	async fn body_argument_replaces_the_options_body() {
		let transport = ScriptedTransport::default()
			.respond(204, None, Vec::new())
			.respond(204, None, Vec::new())
			.respond(204, None, Vec::new());
		let (client, _storage) =
			scripted_client(ClientConfig::new("https://api.example.com"), transport.clone());
		let options = RequestOptions::default().body(serde_json::json!({ "from": "options" }));

		client
			.put("/a", Some(serde_json::json!({ "from": "argument" })), options.clone())
			.await
			.expect("PUT should succeed.");
		client.post("/b", None, options.clone()).await.expect("POST should succeed.");
		client.get("/c", options).await.expect("GET should succeed.");

		let requests = transport.requests();

		assert_eq!(requests[0].body.as_deref(), Some(&br#"{"from":"argument"}"#[..]));
		assert_eq!(requests[1].body, None, "A `None` argument clears `options.body`.");
		assert_eq!(requests[1].header(header::CONTENT_TYPE), None);
		assert_eq!(
			requests[2].body.as_deref(),
			Some(&br#"{"from":"options"}"#[..]),
			"Bodiless verbs forward `options.body`."
		);
	}
}
