//! Single source of truth for the access/refresh token pair, written through to storage.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	store::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TokenStorage},
};

/// Access/refresh pair accepted by [`CredentialStore::set_tokens`].
///
/// Field names match the JSON body returned by refresh endpoints, so the same shape can be
/// deserialized from a login response and handed over directly.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
	/// Access token; `None` clears the stored value.
	#[serde(default)]
	pub access: Option<String>,
	/// Refresh token; `None` clears the stored value.
	#[serde(default)]
	pub refresh: Option<String>,
}
impl TokenPair {
	/// Builds a pair where both tokens are present.
	pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
		Self { access: Some(access.into()), refresh: Some(refresh.into()) }
	}
}

#[derive(Debug, Default)]
struct TokenSlots {
	access: Option<TokenSecret>,
	refresh: Option<TokenSecret>,
}

/// Shared credential state backed by a [`TokenStorage`].
///
/// Clones share the same slots, so every clone of a client observes the same pair. Each
/// mutation writes to storage first and only updates the in-memory slot once the write
/// succeeded.
#[derive(Clone)]
pub struct CredentialStore {
	storage: Arc<dyn TokenStorage>,
	slots: Arc<RwLock<TokenSlots>>,
}
impl CredentialStore {
	/// Reads both tokens from `storage` once and returns the populated store.
	pub fn load(storage: Arc<dyn TokenStorage>) -> Result<Self> {
		let access = storage.get_item(ACCESS_TOKEN_KEY)?.and_then(TokenSecret::new);
		let refresh = storage.get_item(REFRESH_TOKEN_KEY)?.and_then(TokenSecret::new);

		Ok(Self { storage, slots: Arc::new(RwLock::new(TokenSlots { access, refresh })) })
	}

	/// Returns `true` when a non-empty access token is held.
	pub fn has_access_token(&self) -> bool {
		self.slots.read().access.is_some()
	}

	/// Returns `true` when a non-empty refresh token is held.
	pub fn has_refresh_token(&self) -> bool {
		self.slots.read().refresh.is_some()
	}

	/// Returns a copy of the current access token.
	pub fn access_token(&self) -> Option<TokenSecret> {
		self.slots.read().access.clone()
	}

	/// Returns a copy of the current refresh token.
	pub fn refresh_token(&self) -> Option<TokenSecret> {
		self.slots.read().refresh.clone()
	}

	/// Sets the access token; `None` or an empty string removes the persisted entry.
	pub fn set_access_token(&self, value: Option<&str>) -> Result<()> {
		let mut slots = self.slots.write();

		slots.access = self.write_through(ACCESS_TOKEN_KEY, value)?;

		Ok(())
	}

	/// Sets the refresh token; `None` or an empty string removes the persisted entry.
	pub fn set_refresh_token(&self, value: Option<&str>) -> Result<()> {
		let mut slots = self.slots.write();

		slots.refresh = self.write_through(REFRESH_TOKEN_KEY, value)?;

		Ok(())
	}

	/// Sets both tokens.
	pub fn set_tokens(&self, pair: TokenPair) -> Result<()> {
		self.set_access_token(pair.access.as_deref())?;
		self.set_refresh_token(pair.refresh.as_deref())
	}

	/// Clears both tokens.
	pub fn remove_tokens(&self) -> Result<()> {
		self.set_tokens(TokenPair::default())
	}

	/// Clears the access token only if it still equals `stale`.
	///
	/// Returns `true` when the token was cleared.
	pub(crate) fn discard_access_token_if(&self, stale: Option<&TokenSecret>) -> Result<bool> {
		let mut slots = self.slots.write();

		if slots.access.is_none() || slots.access.as_ref() != stale {
			return Ok(false);
		}

		slots.access = self.write_through(ACCESS_TOKEN_KEY, None)?;

		Ok(true)
	}

	fn write_through(&self, key: &str, value: Option<&str>) -> Result<Option<TokenSecret>> {
		match value.and_then(TokenSecret::new) {
			Some(secret) => {
				self.storage.set_item(key, secret.expose())?;

				Ok(Some(secret))
			},
			None => {
				self.storage.remove_item(key)?;

				Ok(None)
			},
		}
	}
}
impl Debug for CredentialStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let slots = self.slots.read();

		f.debug_struct("CredentialStore")
			.field("access_set", &slots.access.is_some())
			.field("refresh_set", &slots.refresh.is_some())
			.finish()
	}
}
