//! Bearer-token HTTP client with automatic access-token refresh, pluggable transports, and
//! persisted credentials.
//!
//! [`HttpWebClient`](client::HttpWebClient) attaches `Authorization: Bearer <access>` to
//! authorized calls, exchanges the refresh token for a new access token when a call is
//! rejected with `401`, and retries the original call once.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod error;
pub mod http;
pub mod obs;
pub mod request;
pub mod response;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// self
	use crate::{
		client::{ClientConfig, HttpWebClient},
		error::TransportError,
		http::{
			HttpTransport, StatusCode, TransportFuture, TransportRequest, TransportResponse, header,
		},
		store::{MemoryStorage, TokenStorage},
	};

	/// In-process transport that replays queued responses and records every request.
	#[derive(Clone, Debug, Default)]
	pub struct ScriptedTransport {
		responses: Arc<Mutex<VecDeque<TransportResponse>>>,
		requests: Arc<Mutex<Vec<TransportRequest>>>,
	}
	impl ScriptedTransport {
		/// Queues a response with the provided status, content type, and body.
		pub fn respond(
			self,
			status: u16,
			content_type: Option<&str>,
			body: impl Into<Vec<u8>>,
		) -> Self {
			let status = StatusCode::from_u16(status).expect("Scripted status should be valid.");
			let mut response = TransportResponse::new(status, body.into());

			if let Some(content_type) = content_type {
				response.headers.insert(
					header::CONTENT_TYPE,
					content_type.parse().expect("Scripted content type should be valid."),
				);
			}

			self.responses.lock().push_back(response);

			self
		}

		/// Queues a JSON response.
		pub fn respond_json(self, status: u16, body: serde_json::Value) -> Self {
			self.respond(status, Some("application/json"), body.to_string())
		}

		/// Returns every request sent so far.
		pub fn requests(&self) -> Vec<TransportRequest> {
			self.requests.lock().clone()
		}

		/// Returns the number of queued responses that were never consumed.
		pub fn pending(&self) -> usize {
			self.responses.lock().len()
		}
	}
	impl HttpTransport for ScriptedTransport {
		fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
			Box::pin(async move {
				self.requests.lock().push(request);

				self.responses.lock().pop_front().ok_or_else(|| {
					TransportError::network(std::io::Error::other("Transport script exhausted."))
				})
			})
		}
	}

	/// Builds a client over a [`ScriptedTransport`] and a fresh [`MemoryStorage`].
	pub fn scripted_client(
		config: ClientConfig,
		transport: ScriptedTransport,
	) -> (HttpWebClient<ScriptedTransport>, MemoryStorage) {
		let storage_backend = MemoryStorage::default();
		let storage: Arc<dyn TokenStorage> = Arc::new(storage_backend.clone());
		let client = HttpWebClient::with_transport(config, storage, transport)
			.expect("Memory storage should never fail to load.");

		(client, storage_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
