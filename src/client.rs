//! Authenticated request engine.
//!
//! [`HttpWebClient`] owns the transport, the client configuration, and the shared
//! [`CredentialStore`]. Every call runs the same sequence: resolve the descriptor, send it,
//! and, when an authorized call is answered with `401`, run the refresh sub-protocol (see
//! [`refresh`]) before retrying the original descriptor exactly once.

pub mod refresh;

mod verbs;

pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::{CredentialStore, TokenPair, TokenSecret},
	error::{ConfigError, HttpError},
	http::{HttpTransport, Method},
	obs::{self, CallOutcome, CallSpan, CallStage},
	request::{RequestDescriptor, RequestOptions},
	response::ResponseBody,
	store::TokenStorage,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestWebClient = HttpWebClient<ReqwestTransport>;

/// Construction-time configuration; immutable for the lifetime of a client.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
	/// Prefix prepended to every input that is not an absolute URL.
	pub base_url: String,
	/// Path appended to `base_url` to reach the refresh endpoint; `None` disables refresh.
	pub refresh_endpoint: Option<String>,
	/// Coordination between concurrent refreshes.
	pub refresh_policy: RefreshPolicy,
}
impl ClientConfig {
	/// Creates a configuration for `base_url` without a refresh endpoint.
	pub fn new(base_url: impl Into<String>) -> Self {
		Self { base_url: base_url.into(), ..Default::default() }
	}

	/// Loads a configuration from a JSON document.
	///
	/// Missing fields fall back to their defaults; unknown fields are rejected.
	pub fn from_json(raw: &str) -> Result<Self> {
		let mut de = serde_json::Deserializer::from_str(raw);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ConfigError::InvalidConfig { source }.into())
	}

	/// Sets the refresh endpoint path.
	pub fn with_refresh_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.refresh_endpoint = Some(endpoint.into());

		self
	}

	/// Sets the refresh policy.
	pub fn with_refresh_policy(mut self, policy: RefreshPolicy) -> Self {
		self.refresh_policy = policy;

		self
	}

	/// Returns the refresh endpoint URL (`base_url` + `refresh_endpoint`).
	pub fn refresh_url(&self) -> Result<Url> {
		let endpoint =
			self.refresh_endpoint.as_deref().ok_or(ConfigError::MissingRefreshEndpoint)?;
		let raw = format!("{}{endpoint}", self.base_url);

		Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl { url: raw, source }.into())
	}
}

/// HTTP client that attaches bearer tokens and refreshes them on `401`.
///
/// Clones share the transport, the credential pair, the refresh latch, and the metrics, so
/// a clone behaves like the same client instance.
pub struct HttpWebClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound request, including refresh calls.
	pub transport: Arc<T>,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	config: ClientConfig,
	credentials: CredentialStore,
	refresh_latch: Arc<AsyncMutex<()>>,
}
impl<T> HttpWebClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client over the provided transport, reading persisted tokens from `storage`.
	pub fn with_transport(
		config: ClientConfig,
		storage: Arc<dyn TokenStorage>,
		transport: impl Into<Arc<T>>,
	) -> Result<Self> {
		Ok(Self {
			transport: transport.into(),
			refresh_metrics: Default::default(),
			config,
			credentials: CredentialStore::load(storage)?,
			refresh_latch: Default::default(),
		})
	}

	/// Returns the construction-time configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Returns the shared credential store.
	pub fn credentials(&self) -> &CredentialStore {
		&self.credentials
	}

	/// Returns `true` when an access token is held.
	pub fn has_access_token(&self) -> bool {
		self.credentials.has_access_token()
	}

	/// Returns `true` when a refresh token is held.
	pub fn has_refresh_token(&self) -> bool {
		self.credentials.has_refresh_token()
	}

	/// Sets or clears the access token.
	pub fn set_access_token(&self, value: Option<&str>) -> Result<()> {
		self.credentials.set_access_token(value)
	}

	/// Sets or clears the refresh token.
	pub fn set_refresh_token(&self, value: Option<&str>) -> Result<()> {
		self.credentials.set_refresh_token(value)
	}

	/// Sets both tokens.
	pub fn set_tokens(&self, pair: TokenPair) -> Result<()> {
		self.credentials.set_tokens(pair)
	}

	/// Clears both tokens.
	pub fn remove_tokens(&self) -> Result<()> {
		self.credentials.remove_tokens()
	}

	/// Sends `method` to `input`, honoring `options.auth`.
	pub async fn request(
		&self,
		method: Method,
		input: impl AsRef<str>,
		options: RequestOptions,
	) -> Result<ResponseBody> {
		self.execute(&RequestDescriptor::new(method, input.as_ref(), options)).await
	}

	/// Runs a descriptor through attempt → refresh on `401` → retry once.
	pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<ResponseBody> {
		let (sent, error) = match self.attempt(descriptor, CallStage::Request).await? {
			Attempt::Settled(body) => return Ok(body),
			Attempt::Unauthorized { sent, error } => (sent, error),
		};

		self.recover_from_unauthorized(sent.as_ref(), error).await?;
		self.refresh_metrics.record_retry();

		match self.attempt(descriptor, CallStage::Retry).await? {
			Attempt::Settled(body) => Ok(body),
			Attempt::Unauthorized { sent, error } => {
				self.discard_stale_access_token(sent.as_ref())?;

				Err(Error::Http(error))
			},
		}
	}

	async fn attempt(&self, descriptor: &RequestDescriptor, stage: CallStage) -> Result<Attempt> {
		let span = CallSpan::new(stage, descriptor.method.as_str());

		obs::record_call_outcome(stage, CallOutcome::Attempt);

		let result: Result<Attempt> = span
			.instrument(async {
				let sent = if descriptor.requires_auth() {
					self.credentials.access_token()
				} else {
					None
				};
				let request = descriptor.resolve(&self.config.base_url, sent.as_ref())?;
				let response = self.transport.send(request).await?;

				if response.is_ok() {
					return Ok(Attempt::Settled(response.decode()?));
				}

				let error = response.into_http_error();

				if descriptor.requires_auth() && error.is_unauthorized() {
					Ok(Attempt::Unauthorized { sent, error })
				} else {
					Err(Error::Http(error))
				}
			})
			.await;

		match &result {
			Ok(Attempt::Settled(_)) => obs::record_call_outcome(stage, CallOutcome::Success),
			_ => obs::record_call_outcome(stage, CallOutcome::Failure),
		}

		result
	}
}
#[cfg(feature = "reqwest")]
impl HttpWebClient<ReqwestTransport> {
	/// Creates a client backed by a default reqwest transport.
	pub fn new(config: ClientConfig, storage: Arc<dyn TokenStorage>) -> Result<Self> {
		Self::with_transport(config, storage, ReqwestTransport::default())
	}
}
impl<T> Clone for HttpWebClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			config: self.config.clone(),
			credentials: self.credentials.clone(),
			refresh_latch: self.refresh_latch.clone(),
		}
	}
}
impl<T> Debug for HttpWebClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HttpWebClient")
			.field("config", &self.config)
			.field("credentials", &self.credentials)
			.finish()
	}
}

enum Attempt {
	Settled(ResponseBody),
	Unauthorized { sent: Option<TokenSecret>, error: HttpError },
}
