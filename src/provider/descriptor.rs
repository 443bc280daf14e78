//! Provider descriptor data structures shared by the token manager and the relay.

/// Builder API for assembling provider descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, provider::Effect};

/// Production REST base of the image-processing provider.
pub const DEFAULT_BASE_URL: &str = "https://aip.baidubce.com";
/// Client-credentials token path relative to the base URL.
pub const DEFAULT_TOKEN_PATH: &str = "/oauth/2.0/token";

/// Immutable provider descriptor consumed by the relay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderDescriptor {
	/// REST base every effect path is appended to.
	pub base_url: Url,
	/// Token endpoint used for the client-credentials exchange.
	pub token_endpoint: Url,
}
impl ProviderDescriptor {
	/// Creates a new builder seeded with the production defaults.
	pub fn builder() -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new()
	}

	/// Resolves the endpoint URL for an effect.
	///
	/// The effect path is appended to any path prefix carried by the base URL, so relays sitting
	/// behind a path-routed gateway keep working.
	pub fn effect_endpoint(&self, effect: Effect) -> Url {
		append_path(&self.base_url, effect.endpoint_path())
	}
}

pub(crate) fn append_path(base: &Url, path: &str) -> Url {
	let mut url = base.clone();
	let joined = format!("{}{}", base.path().trim_end_matches('/'), path);

	url.set_path(&joined);

	url
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn effect_endpoints_keep_base_prefix() {
		let descriptor = ProviderDescriptor::builder()
			.base_url(Url::parse("https://gateway.example.com/baidu/").expect("URL should parse."))
			.build()
			.expect("Descriptor should build.");

		assert_eq!(
			descriptor.effect_endpoint(Effect::Dehaze).as_str(),
			"https://gateway.example.com/baidu/rest/2.0/image-process/v1/dehaze"
		);
		assert_eq!(
			descriptor.token_endpoint.as_str(),
			"https://gateway.example.com/baidu/oauth/2.0/token"
		);
	}

	#[test]
	fn defaults_point_at_production() {
		let descriptor = ProviderDescriptor::builder().build().expect("Defaults should build.");

		assert_eq!(descriptor.token_endpoint.as_str(), "https://aip.baidubce.com/oauth/2.0/token");
		assert_eq!(
			descriptor.effect_endpoint(Effect::Colorize).as_str(),
			"https://aip.baidubce.com/rest/2.0/image-process/v1/colourize"
		);
	}
}
