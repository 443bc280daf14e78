//! Provider key pair exchanged for access tokens.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// API key + secret key pair registered with the provider.
///
/// The pair is owned by the [`TokenManager`](crate::flows::TokenManager) and only ever sent to
/// the token endpoint as `client_id`/`client_secret`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientCredentials {
	/// Public API key (`client_id`).
	pub api_key: String,
	/// Secret key (`client_secret`).
	pub secret_key: TokenSecret,
}
impl ClientCredentials {
	/// Creates a new key pair.
	pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
		Self { api_key: api_key.into(), secret_key: TokenSecret::new(secret_key) }
	}
}
