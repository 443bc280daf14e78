//! Command-line interface of the relay binary.

// std
use std::net::SocketAddr;
// crates.io
use clap::Parser;
// self
use crate::{
	_prelude::*,
	config::{self, RelayConfig},
	error::ConfigError,
};

/// Image effect relay server.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
	/// Address to listen on.
	#[arg(long, env = "IMAGE_RELAY_BIND", default_value = "127.0.0.1:3000")]
	pub bind: SocketAddr,
	/// Provider API key.
	#[arg(long, env = config::API_KEY_ENV, hide_env_values = true)]
	pub api_key: Option<String>,
	/// Provider secret key.
	#[arg(long, env = config::SECRET_KEY_ENV, hide_env_values = true)]
	pub secret_key: Option<String>,
	/// Provider REST base URL.
	#[arg(long, env = config::PROVIDER_URL_ENV)]
	pub provider_url: Option<String>,
	/// Token endpoint URL.
	#[arg(long, env = config::TOKEN_URL_ENV)]
	pub token_url: Option<String>,
	/// Seconds subtracted from each token's lifetime before it is considered expired.
	#[arg(long, env = config::TOKEN_MARGIN_ENV)]
	pub token_margin_secs: Option<i64>,
	/// Maximum accepted length of the base64 image, in bytes.
	#[arg(long, env = config::MAX_IMAGE_BYTES_ENV)]
	pub max_image_bytes: Option<usize>,
	/// Emit logs as JSON lines.
	#[arg(long)]
	pub log_json: bool,
}
impl Cli {
	/// Builds the relay configuration from the parsed arguments.
	pub fn relay_config(&self) -> Result<RelayConfig, ConfigError> {
		let mut builder = RelayConfig::builder();

		if let Some(value) = &self.api_key {
			builder = builder.api_key(value);
		}
		if let Some(value) = &self.secret_key {
			builder = builder.secret_key(value);
		}
		if let Some(value) = &self.provider_url {
			builder = builder.provider_url(value);
		}
		if let Some(value) = &self.token_url {
			builder = builder.token_url(value);
		}
		if let Some(secs) = self.token_margin_secs {
			builder = builder.token_safety_margin(Duration::seconds(secs));
		}
		if let Some(bytes) = self.max_image_bytes {
			builder = builder.max_image_bytes(bytes);
		}

		builder.build()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn flags_feed_the_config() {
		let cli = Cli::try_parse_from([
			"image-effect-relay",
			"--bind",
			"0.0.0.0:8080",
			"--api-key",
			"k",
			"--secret-key",
			"s",
			"--token-margin-secs",
			"30",
			"--log-json",
		])
		.expect("Flags should parse.");
		let config = cli.relay_config().expect("Config should build.");

		assert_eq!(cli.bind.port(), 8080);
		assert!(cli.log_json);
		assert_eq!(config.token_safety_margin, Duration::seconds(30));
		assert_eq!(config.credentials.api_key, "k");
	}

	#[test]
	fn negative_margin_is_rejected() {
		let cli = Cli::try_parse_from([
			"image-effect-relay",
			"--api-key",
			"k",
			"--secret-key",
			"s",
			"--token-margin-secs=-5",
		])
		.expect("Flags should parse.");

		assert!(matches!(cli.relay_config(), Err(ConfigError::InvalidSetting { .. })));
	}
}
