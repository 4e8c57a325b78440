//! Refresh sub-protocol: exchange the refresh token for a new access token.
//!
//! A `401` on an authorized call first discards the access token that was sent, then
//! `POST`s to `base_url + refresh_endpoint` with `Authorization: Bearer <refresh>` and no
//! body. A successful grant stores the new access token (and the rotated refresh token, when
//! the endpoint returns one). A `401` from the refresh endpoint means the session is gone,
//! so both tokens are cleared.
//!
//! Concurrent refreshes follow [`RefreshPolicy`]: independent calls each refresh on their
//! own, while [`RefreshPolicy::Coalesce`] serializes refreshes behind one latch and lets
//! waiters reuse a token that was rotated while they queued.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	client::HttpWebClient,
	error::{ConfigError, DecodeError, HttpError},
	http::{HttpTransport, Method, StatusCode, TransportRequest, header},
	obs::{self, CallOutcome, CallSpan, CallStage},
	request,
};

/// Lifecycle of the most recent refresh exchange.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RefreshState {
	/// No refresh has run yet.
	#[default]
	Idle,
	/// A refresh request is in flight.
	Refreshing,
	/// The last refresh stored a new access token.
	Refreshed,
	/// The last refresh failed.
	Failed,
}
impl RefreshState {
	/// Returns a stable label for logs and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Idle => "idle",
			Self::Refreshing => "refreshing",
			Self::Refreshed => "refreshed",
			Self::Failed => "failed",
		}
	}
}
impl Display for RefreshState {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Coordination between calls that hit `401` at the same time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
	/// Every rejected call refreshes on its own; concurrent refreshes may race.
	#[default]
	Independent,
	/// Refreshes are serialized; a call that waited reuses the token its predecessor stored.
	Coalesce,
}

#[derive(Debug, Deserialize)]
struct RefreshGrant {
	access: String,
	#[serde(default)]
	refresh: Option<String>,
}

impl<T> HttpWebClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Exchanges the held refresh token for a new access token.
	///
	/// Fails with [`ConfigError::MissingRefreshEndpoint`] or
	/// [`ConfigError::MissingRefreshToken`] when no exchange is possible. A non-ok response
	/// surfaces as [`Error::Refresh`]; a `401` additionally clears both tokens.
	pub async fn refresh_tokens(&self) -> Result<()> {
		const STAGE: CallStage = CallStage::Refresh;

		let span = CallSpan::new(STAGE, Method::POST.as_str());

		obs::record_call_outcome(STAGE, CallOutcome::Attempt);
		self.refresh_metrics.record_attempt();
		self.refresh_metrics.record_state(RefreshState::Refreshing);

		let result: Result<()> = span
			.instrument(async {
				let url = self.config.refresh_url()?;
				let refresh =
					self.credentials.refresh_token().ok_or(ConfigError::MissingRefreshToken)?;
				let mut exchange = TransportRequest::new(Method::POST, url);

				exchange
					.headers
					.insert(header::AUTHORIZATION, request::authorization_value(&refresh)?);

				let response = self.transport.send(exchange).await?;

				if !response.is_ok() {
					if response.status == StatusCode::UNAUTHORIZED {
						self.refresh_metrics.record_rejection();
						self.credentials.remove_tokens()?;
					}

					return Err(Error::Refresh(response.into_http_error()));
				}

				let mut de = serde_json::Deserializer::from_slice(&response.body);
				let grant: RefreshGrant = serde_path_to_error::deserialize(&mut de)
					.map_err(|source| DecodeError::RefreshGrant { source })?;

				self.credentials.set_access_token(Some(&grant.access))?;

				if let Some(rotated) = grant.refresh.as_deref().filter(|value| !value.is_empty()) {
					self.credentials.set_refresh_token(Some(rotated))?;
				}

				Ok(())
			})
			.await;

		match &result {
			Ok(()) => {
				obs::record_call_outcome(STAGE, CallOutcome::Success);
				self.refresh_metrics.record_success();
				self.refresh_metrics.record_state(RefreshState::Refreshed);
			},
			Err(_) => {
				obs::record_call_outcome(STAGE, CallOutcome::Failure);
				self.refresh_metrics.record_failure();
				self.refresh_metrics.record_state(RefreshState::Failed);
			},
		}

		result
	}

	/// Handles a `401` on an authorized call; `Ok` means the call may be retried.
	pub(crate) async fn recover_from_unauthorized(
		&self,
		sent: Option<&TokenSecret>,
		error: HttpError,
	) -> Result<()> {
		self.discard_stale_access_token(sent)?;

		let _latch = match self.config.refresh_policy {
			RefreshPolicy::Independent => None,
			RefreshPolicy::Coalesce => {
				let latch = self.refresh_latch.lock().await;

				if self.rotated_since(sent) {
					return Ok(());
				}

				Some(latch)
			},
		};

		if !self.can_refresh() {
			return Err(Error::Http(error));
		}

		self.refresh_tokens().await
	}

	/// Drops the access token after a `401`.
	///
	/// Independent calls clear whatever is held. Coalescing calls only clear the token they
	/// sent, so a token rotated by another call survives.
	pub(crate) fn discard_stale_access_token(&self, sent: Option<&TokenSecret>) -> Result<()> {
		match self.config.refresh_policy {
			RefreshPolicy::Independent => self.credentials.set_access_token(None),
			RefreshPolicy::Coalesce => self.credentials.discard_access_token_if(sent).map(drop),
		}
	}

	fn can_refresh(&self) -> bool {
		self.config.refresh_endpoint.is_some() && self.credentials.has_refresh_token()
	}

	fn rotated_since(&self, sent: Option<&TokenSecret>) -> bool {
		self.credentials.access_token().is_some_and(|current| Some(&current) != sent)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, auth::TokenPair, client::ClientConfig, response::ResponseBody};

	fn coalescing_config() -> ClientConfig {
		ClientConfig::new("https://api.example.com")
			.with_refresh_endpoint("/auth/refresh")
			.with_refresh_policy(RefreshPolicy::Coalesce)
	}

	#[test]
	fn policy_serializes_in_snake_case() {
		assert_eq!(
			serde_json::to_value(RefreshPolicy::Coalesce).expect("Policy should serialize."),
			serde_json::json!("coalesce")
		);
		assert_eq!(RefreshPolicy::default(), RefreshPolicy::Independent);
		assert_eq!(RefreshState::default().to_string(), "idle");
	}

	#[tokio::test]
	async fn coalescing_waiter_reuses_rotated_token() {
		let transport = ScriptedTransport::default();
		let (client, _storage) = scripted_client(coalescing_config(), transport.clone());

		client.set_tokens(TokenPair::new("fresh", "refresh-1")).expect("Seeding should succeed.");

		let stale = TokenSecret::new("stale");
		let error = HttpError {
			status: 401,
			status_text: "Unauthorized".into(),
			retry_after: None,
			body: ResponseBody::Empty,
		};

		client
			.recover_from_unauthorized(stale.as_ref(), error)
			.await
			.expect("A rotated token should allow the retry.");

		assert!(transport.requests().is_empty(), "No refresh request should be sent.");
		assert_eq!(client.credentials().access_token(), TokenSecret::new("fresh"));
		assert_eq!(client.refresh_metrics.attempts(), 0);
	}

	#[tokio::test]
	async fn coalescing_discard_keeps_a_newer_token() {
		let (client, _storage) = scripted_client(coalescing_config(), ScriptedTransport::default());

		client.set_access_token(Some("fresh")).expect("Seeding should succeed.");
		client
			.discard_stale_access_token(TokenSecret::new("stale").as_ref())
			.expect("Discard should succeed.");

		assert!(client.has_access_token());
	}

	#[tokio::test]
	async fn independent_discard_clears_any_token() {
		let (client, storage) = scripted_client(
			ClientConfig::new("https://api.example.com"),
			ScriptedTransport::default(),
		);

		client.set_access_token(Some("fresh")).expect("Seeding should succeed.");
		client
			.discard_stale_access_token(TokenSecret::new("stale").as_ref())
			.expect("Discard should succeed.");

		assert!(!client.has_access_token());
		assert!(storage.is_empty());
	}

	#[tokio::test]
	async fn manual_refresh_sends_bearer_refresh_token() {
		let transport = ScriptedTransport::default()
			.respond_json(200, serde_json::json!({ "access": "fresh", "refresh": "" }));
		let (client, _storage) = scripted_client(coalescing_config(), transport.clone());

		client.set_refresh_token(Some("refresh-1")).expect("Seeding should succeed.");
		client.refresh_tokens().await.expect("Refresh should succeed.");

		let requests = transport.requests();

		assert_eq!(requests[0].header(header::AUTHORIZATION), Some("Bearer refresh-1"));
		assert_eq!(client.credentials().access_token(), TokenSecret::new("fresh"));
		assert_eq!(
			client.credentials().refresh_token(),
			TokenSecret::new("refresh-1"),
			"An empty rotated token is ignored."
		);
	}
}
