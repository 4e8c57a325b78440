//! Credential state: the persisted access/refresh token pair and redacted secrets.

pub mod credentials;
pub mod secret;

pub use credentials::*;
pub use secret::*;
