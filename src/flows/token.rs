//! Client-credentials token manager with expiry-aware caching + singleflight refreshes.
//!
//! [`TokenManager::ensure_token`] serves the cached access token while `now < expires_at` and
//! only contacts the token endpoint when the cache is cold, expired, or invalidated. Refreshes
//! are serialized behind an async guard and re-check the cache once the guard is held, so callers
//! that race on a cold cache normally share a single exchange. No retry is performed: a failed
//! exchange surfaces as [`Error::TokenAcquisitionFailed`].

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ClientCredentials, TokenSecret},
	error::TokenError,
	http::{HttpReply, ProviderHttpClient, ProviderRequest},
	obs::{self, CallKind, CallOutcome, CallSpan},
};

/// Owns the provider key pair and the single cached access token.
pub struct TokenManager<C>
where
	C: ?Sized + ProviderHttpClient,
{
	http_client: Arc<C>,
	token_endpoint: Url,
	credentials: ClientCredentials,
	safety_margin: Duration,
	cache: Mutex<Option<AccessToken>>,
	refresh_guard: AsyncMutex<()>,
}
impl<C> TokenManager<C>
where
	C: ?Sized + ProviderHttpClient,
{
	/// Lifetime subtracted from `expires_in` unless overridden.
	pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::seconds(60);

	/// Creates a manager with an empty cache.
	pub fn new(
		http_client: impl Into<Arc<C>>,
		token_endpoint: Url,
		credentials: ClientCredentials,
	) -> Self {
		Self {
			http_client: http_client.into(),
			token_endpoint,
			credentials,
			safety_margin: Self::DEFAULT_SAFETY_MARGIN,
			cache: Mutex::new(None),
			refresh_guard: AsyncMutex::new(()),
		}
	}

	/// Overrides the safety margin (defaults to 60 seconds). Negative values clamp to zero.
	pub fn with_safety_margin(mut self, margin: Duration) -> Self {
		self.safety_margin = if margin.is_negative() { Duration::ZERO } else { margin };

		self
	}

	/// Returns the configured safety margin.
	pub fn safety_margin(&self) -> Duration {
		self.safety_margin
	}

	/// Returns a usable access token, exchanging the key pair when the cache cannot serve one.
	pub async fn ensure_token(&self) -> Result<TokenSecret> {
		if let Some(secret) = self.cached_at(OffsetDateTime::now_utc()) {
			return Ok(secret);
		}

		let _singleflight = self.refresh_guard.lock().await;

		if let Some(secret) = self.cached_at(OffsetDateTime::now_utc()) {
			return Ok(secret);
		}

		let token = self.exchange().await?;
		let secret = token.secret.clone();

		*self.cache.lock() = Some(token);

		Ok(secret)
	}

	/// Drops the cached token so the next call performs a fresh exchange.
	pub fn invalidate(&self) {
		self.cache.lock().take();
	}

	/// Expiry of the cached token, if one is held.
	pub fn cached_expiry(&self) -> Option<OffsetDateTime> {
		self.cache.lock().as_ref().map(|token| token.expires_at)
	}

	fn cached_at(&self, now: OffsetDateTime) -> Option<TokenSecret> {
		let mut cache = self.cache.lock();

		if let Some(token) = cache.as_ref().filter(|token| token.is_fresh_at(now)) {
			return Some(token.secret.clone());
		}

		// Expired tokens are discarded, never served.
		*cache = None;

		None
	}

	async fn exchange(&self) -> Result<AccessToken, TokenError> {
		const KIND: CallKind = CallKind::TokenExchange;

		let span = CallSpan::new(KIND, "client_credentials");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async {
				let request = ProviderRequest::get(self.token_endpoint.clone())
					.query("grant_type", "client_credentials")
					.query("client_id", self.credentials.api_key.as_str())
					.query("client_secret", self.credentials.secret_key.expose());
				let reply = self.http_client.execute(request).await?;

				parse_token_reply(reply, OffsetDateTime::now_utc(), self.safety_margin)
			})
			.await;

		match &result {
			Ok(_token) => {
				obs::record_call_outcome(KIND, CallOutcome::Success);

				#[cfg(feature = "tracing")]
				tracing::debug!(expires_at = %_token.expires_at, "Provider access token refreshed.");
			},
			Err(_err) => {
				obs::record_call_outcome(KIND, CallOutcome::Failure);

				#[cfg(feature = "tracing")]
				tracing::warn!(error = %_err, "Provider token exchange failed.");
			},
		}

		result
	}
}
impl<C> Debug for TokenManager<C>
where
	C: ?Sized + ProviderHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("credentials", &self.credentials)
			.field("safety_margin", &self.safety_margin)
			.field("cached_expiry", &self.cached_expiry())
			.finish()
	}
}

#[derive(Debug, Deserialize)]
struct TokenReply {
	access_token: Option<String>,
	expires_in: Option<i64>,
	error: Option<String>,
	error_description: Option<String>,
}

fn parse_token_reply(
	reply: HttpReply,
	now: OffsetDateTime,
	safety_margin: Duration,
) -> Result<AccessToken, TokenError> {
	let status = reply.status;
	let body = match serde_path_to_error::deserialize::<_, TokenReply>(
		&mut serde_json::Deserializer::from_slice(&reply.body),
	) {
		Ok(body) => body,
		Err(source) if reply.is_success() => return Err(TokenError::ResponseParse { source, status }),
		Err(_) =>
			return Err(TokenError::Rejected {
				status,
				reason: format!("HTTP {status}: {}", reply.body_preview()),
			}),
	};

	if body.error.is_some() || !reply.is_success() {
		let reason = body
			.error_description
			.filter(|value| !value.is_empty())
			.or(body.error)
			.unwrap_or_else(|| format!("HTTP {status}"));

		return Err(TokenError::Rejected { status, reason });
	}

	let access_token =
		body.access_token.filter(|value| !value.is_empty()).ok_or(TokenError::MissingAccessToken)?;
	let expires_in = body.expires_in.ok_or(TokenError::MissingExpiresIn)?;

	if expires_in <= 0 {
		return Err(TokenError::NonPositiveExpiresIn);
	}

	Ok(AccessToken::from_lifetime(
		TokenSecret::new(access_token),
		now,
		Duration::seconds(expires_in),
		safety_margin,
	))
}
