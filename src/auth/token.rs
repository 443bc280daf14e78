//! Cached access token and its lifecycle helpers.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Access token issued by the provider's client-credentials endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
	/// Bearer secret; callers must avoid logging it.
	pub secret: TokenSecret,
	/// Instant the exchange completed.
	pub issued_at: OffsetDateTime,
	/// Instant after which the token must no longer be used.
	pub expires_at: OffsetDateTime,
}
impl AccessToken {
	/// Builds a token whose expiry is `issued_at + (lifetime - safety_margin)`.
	///
	/// A margin equal to or larger than the lifetime yields a token that is already stale, so it
	/// is handed out once and never served from cache.
	pub fn from_lifetime(
		secret: TokenSecret,
		issued_at: OffsetDateTime,
		lifetime: Duration,
		safety_margin: Duration,
	) -> Self {
		let usable = lifetime.saturating_sub(safety_margin);

		Self { secret, issued_at, expires_at: issued_at.saturating_add(usable) }
	}

	/// Returns `true` while `instant` is strictly before the expiry.
	pub fn is_fresh_at(&self, instant: OffsetDateTime) -> bool {
		instant < self.expires_at
	}
}
