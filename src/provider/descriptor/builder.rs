// std
use std::net::IpAddr;
// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	provider::{DEFAULT_BASE_URL, DEFAULT_TOKEN_PATH, ProviderDescriptor, descriptor::append_path},
};

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug, Default)]
pub struct ProviderDescriptorBuilder {
	/// REST base URL; defaults to [`DEFAULT_BASE_URL`].
	pub base_url: Option<Url>,
	/// Token endpoint; defaults to [`DEFAULT_TOKEN_PATH`] under the base URL.
	pub token_endpoint: Option<Url>,
}
impl ProviderDescriptorBuilder {
	/// Creates an empty builder that falls back to the production endpoints.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the REST base URL.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ConfigError> {
		let base_url = match self.base_url {
			Some(url) => url,
			None => Url::parse(DEFAULT_BASE_URL)
				.map_err(|source| ConfigError::InvalidUrl { name: "provider_url", source })?,
		};
		let token_endpoint =
			self.token_endpoint.unwrap_or_else(|| append_path(&base_url, DEFAULT_TOKEN_PATH));
		let descriptor = ProviderDescriptor { base_url, token_endpoint };

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ConfigError> {
		validate_endpoint("provider", &self.base_url)?;
		validate_endpoint("token", &self.token_endpoint)?;

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	}
}
