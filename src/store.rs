//! Storage contracts and built-in key-value backends for persisted tokens.

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

// self
use crate::_prelude::*;

/// Storage key holding the access token.
pub const ACCESS_TOKEN_KEY: &str = "access";
/// Storage key holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh";

/// Durable key-value storage consulted by the credential store.
///
/// Calls are synchronous: the credential store reads both keys once at construction and
/// writes through on every mutation, so implementations should be cheap enough to call
/// from async contexts.
pub trait TokenStorage
where
	Self: Send + Sync,
{
	/// Returns the value stored under `key`, if any.
	fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;

	/// Persists or replaces the value stored under `key`.
	fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;

	/// Removes the value stored under `key`; missing keys are not an error.
	fn remove_item(&self, key: &str) -> Result<(), StoreError>;
}

/// Error type produced by [`TokenStorage`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
