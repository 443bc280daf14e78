//! Relay configuration: the provider key pair, endpoints, and request limits.
//!
//! Configuration is an explicit initialization step. [`RelayConfig::from_env`] and
//! [`RelayConfigBuilder::build`] return [`ConfigError`] instead of failing while modules load, so
//! the binary can abort with a readable report when a secret is missing.

// self
use crate::{
	_prelude::*,
	auth::ClientCredentials,
	error::ConfigError,
	flows::TokenManager,
	http::ProviderHttpClient,
	provider::ProviderDescriptor,
};

/// Environment variable holding the provider API key.
pub const API_KEY_ENV: &str = "BAIDU_API_KEY";
/// Environment variable holding the provider secret key.
pub const SECRET_KEY_ENV: &str = "BAIDU_SECRET_KEY";
/// Environment variable overriding the provider REST base URL.
pub const PROVIDER_URL_ENV: &str = "IMAGE_RELAY_PROVIDER_URL";
/// Environment variable overriding the token endpoint.
pub const TOKEN_URL_ENV: &str = "IMAGE_RELAY_TOKEN_URL";
/// Environment variable overriding the token safety margin, in seconds.
pub const TOKEN_MARGIN_ENV: &str = "IMAGE_RELAY_TOKEN_MARGIN_SECS";
/// Environment variable overriding the maximum encoded image length, in bytes.
pub const MAX_IMAGE_BYTES_ENV: &str = "IMAGE_RELAY_MAX_IMAGE_BYTES";

/// Validated relay configuration.
#[derive(Clone, Debug)]
pub struct RelayConfig {
	/// Provider key pair.
	pub credentials: ClientCredentials,
	/// Provider endpoints.
	pub descriptor: ProviderDescriptor,
	/// Seconds subtracted from each token's reported lifetime.
	pub token_safety_margin: Duration,
	/// Maximum accepted length of the base64 image text.
	pub max_image_bytes: usize,
}
impl RelayConfig {
	/// Default maximum encoded image length (10 MiB of base64 text).
	pub const DEFAULT_MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

	/// Creates a new builder.
	pub fn builder() -> RelayConfigBuilder {
		RelayConfigBuilder::default()
	}

	/// Reads the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Reads the configuration through `lookup`, which maps variable names to values.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut builder = Self::builder();

		if let Some(value) = lookup(API_KEY_ENV) {
			builder = builder.api_key(value);
		}
		if let Some(value) = lookup(SECRET_KEY_ENV) {
			builder = builder.secret_key(value);
		}
		if let Some(value) = lookup(PROVIDER_URL_ENV) {
			builder = builder.provider_url(value);
		}
		if let Some(value) = lookup(TOKEN_URL_ENV) {
			builder = builder.token_url(value);
		}
		if let Some(value) = lookup(TOKEN_MARGIN_ENV) {
			let secs = value
				.trim()
				.parse::<i64>()
				.map_err(|_| ConfigError::InvalidSetting { name: TOKEN_MARGIN_ENV, value })?;

			builder = builder.token_safety_margin(Duration::seconds(secs));
		}
		if let Some(value) = lookup(MAX_IMAGE_BYTES_ENV) {
			let bytes = value
				.trim()
				.parse::<usize>()
				.map_err(|_| ConfigError::InvalidSetting { name: MAX_IMAGE_BYTES_ENV, value })?;

			builder = builder.max_image_bytes(bytes);
		}

		builder.build()
	}

	/// Builds the token manager described by this configuration.
	pub fn token_manager<C>(&self, http_client: impl Into<Arc<C>>) -> TokenManager<C>
	where
		C: ?Sized + ProviderHttpClient,
	{
		TokenManager::new(
			http_client,
			self.descriptor.token_endpoint.clone(),
			self.credentials.clone(),
		)
		.with_safety_margin(self.token_safety_margin)
	}
}

/// Builder for [`RelayConfig`] values.
#[derive(Debug, Default)]
pub struct RelayConfigBuilder {
	api_key: Option<String>,
	secret_key: Option<String>,
	provider_url: Option<String>,
	token_url: Option<String>,
	descriptor: Option<ProviderDescriptor>,
	token_safety_margin: Option<Duration>,
	max_image_bytes: Option<usize>,
}
impl RelayConfigBuilder {
	/// Sets the provider API key.
	pub fn api_key(mut self, value: impl Into<String>) -> Self {
		self.api_key = Some(value.into());

		self
	}

	/// Sets the provider secret key.
	pub fn secret_key(mut self, value: impl Into<String>) -> Self {
		self.secret_key = Some(value.into());

		self
	}

	/// Overrides the provider REST base URL.
	pub fn provider_url(mut self, value: impl Into<String>) -> Self {
		self.provider_url = Some(value.into());

		self
	}

	/// Overrides the token endpoint.
	pub fn token_url(mut self, value: impl Into<String>) -> Self {
		self.token_url = Some(value.into());

		self
	}

	/// Supplies a prebuilt descriptor; takes precedence over the URL overrides.
	pub fn descriptor(mut self, descriptor: ProviderDescriptor) -> Self {
		self.descriptor = Some(descriptor);

		self
	}

	/// Overrides the token safety margin (defaults to 60 seconds).
	pub fn token_safety_margin(mut self, margin: Duration) -> Self {
		self.token_safety_margin = Some(margin);

		self
	}

	/// Overrides the maximum encoded image length.
	pub fn max_image_bytes(mut self, bytes: usize) -> Self {
		self.max_image_bytes = Some(bytes);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<RelayConfig, ConfigError> {
		let api_key = require_secret(API_KEY_ENV, self.api_key)?;
		let secret_key = require_secret(SECRET_KEY_ENV, self.secret_key)?;
		let descriptor = match self.descriptor {
			Some(descriptor) => descriptor,
			None => {
				let mut builder = ProviderDescriptor::builder();

				if let Some(raw) = self.provider_url {
					builder = builder.base_url(parse_url(PROVIDER_URL_ENV, &raw)?);
				}
				if let Some(raw) = self.token_url {
					builder = builder.token_endpoint(parse_url(TOKEN_URL_ENV, &raw)?);
				}

				builder.build()?
			},
		};
		let token_safety_margin = self
			.token_safety_margin
			.unwrap_or(TokenManager::<dyn ProviderHttpClient>::DEFAULT_SAFETY_MARGIN);

		if token_safety_margin.is_negative() {
			return Err(ConfigError::InvalidSetting {
				name: TOKEN_MARGIN_ENV,
				value: token_safety_margin.whole_seconds().to_string(),
			});
		}

		let max_image_bytes = self.max_image_bytes.unwrap_or(RelayConfig::DEFAULT_MAX_IMAGE_BYTES);

		if max_image_bytes == 0 {
			return Err(ConfigError::InvalidSetting { name: MAX_IMAGE_BYTES_ENV, value: "0".into() });
		}

		Ok(RelayConfig {
			credentials: ClientCredentials::new(api_key, secret_key),
			descriptor,
			token_safety_margin,
			max_image_bytes,
		})
	}
}

fn require_secret(name: &'static str, value: Option<String>) -> Result<String, ConfigError> {
	value
		.map(|value| value.trim().to_owned())
		.filter(|value| !value.is_empty())
		.ok_or(ConfigError::MissingSecret { name })
}

fn parse_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { name, source })
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;

	fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map = pairs
			.iter()
			.map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
			.collect::<HashMap<_, _>>();

		move |name: &str| map.get(name).cloned()
	}

	#[test]
	fn missing_secrets_are_fatal() {
		let err = RelayConfig::from_lookup(lookup(&[(SECRET_KEY_ENV, "s")]))
			.expect_err("Missing API key should fail.");

		assert!(matches!(err, ConfigError::MissingSecret { name: API_KEY_ENV }));

		let err = RelayConfig::from_lookup(lookup(&[(API_KEY_ENV, "k"), (SECRET_KEY_ENV, "  ")]))
			.expect_err("Blank secret key should fail.");

		assert!(matches!(err, ConfigError::MissingSecret { name: SECRET_KEY_ENV }));
	}

	#[test]
	fn defaults_apply_when_only_secrets_are_set() {
		let config = RelayConfig::from_lookup(lookup(&[(API_KEY_ENV, "k"), (SECRET_KEY_ENV, "s")]))
			.expect("Secrets alone should be enough.");

		assert_eq!(config.credentials.api_key, "k");
		assert_eq!(config.credentials.secret_key.expose(), "s");
		assert_eq!(config.token_safety_margin, Duration::seconds(60));
		assert_eq!(config.max_image_bytes, RelayConfig::DEFAULT_MAX_IMAGE_BYTES);
		assert_eq!(
			config.descriptor.token_endpoint.as_str(),
			"https://aip.baidubce.com/oauth/2.0/token"
		);
	}

	#[test]
	fn overrides_are_parsed_and_validated() {
		let config = RelayConfig::from_lookup(lookup(&[
			(API_KEY_ENV, "k"),
			(SECRET_KEY_ENV, "s"),
			(PROVIDER_URL_ENV, "http://127.0.0.1:9000"),
			(TOKEN_MARGIN_ENV, "120"),
			(MAX_IMAGE_BYTES_ENV, "1024"),
		]))
		.expect("Overrides should parse.");

		assert_eq!(config.descriptor.token_endpoint.as_str(), "http://127.0.0.1:9000/oauth/2.0/token");
		assert_eq!(config.token_safety_margin, Duration::seconds(120));
		assert_eq!(config.max_image_bytes, 1024);

		let err = RelayConfig::from_lookup(lookup(&[
			(API_KEY_ENV, "k"),
			(SECRET_KEY_ENV, "s"),
			(TOKEN_MARGIN_ENV, "soon"),
		]))
		.expect_err("Non-numeric margin should fail.");

		assert!(matches!(err, ConfigError::InvalidSetting { name: TOKEN_MARGIN_ENV, .. }));

		let err = RelayConfig::from_lookup(lookup(&[
			(API_KEY_ENV, "k"),
			(SECRET_KEY_ENV, "s"),
			(PROVIDER_URL_ENV, "http://aip.example.com"),
		]))
		.expect_err("Remote plain-HTTP provider should fail.");

		assert!(matches!(err, ConfigError::InsecureEndpoint { .. }));
	}
}
