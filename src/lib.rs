//! Token-caching relay that forwards base64 images to a cloud image-processing provider, plus the
//! axum surface that exposes it to browsers.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
#[cfg(feature = "server")] pub mod cli;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod provider;
#[cfg(feature = "server")] pub mod server;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::RelayConfig,
		flows::{EffectRelay, TokenManager},
		http::ReqwestHttpClient,
		provider::ProviderDescriptor,
	};

	/// Relay type alias used by reqwest-backed integration tests.
	pub type ReqwestTestRelay = EffectRelay<ReqwestHttpClient>;

	/// API key shared by the integration tests.
	pub const TEST_API_KEY: &str = "test-api-key";
	/// API secret shared by the integration tests.
	pub const TEST_SECRET_KEY: &str = "test-secret-key";

	/// Builds the plain reqwest HTTP client used against loopback mock servers.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.build()
			.expect("Failed to build Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a descriptor whose provider and token endpoints live under `base_url`.
	pub fn test_descriptor(base_url: &str) -> ProviderDescriptor {
		let base = Url::parse(base_url).expect("Mock provider base URL should parse.");
		let token = base.join("/oauth/2.0/token").expect("Mock token endpoint should join.");

		ProviderDescriptor::builder()
			.base_url(base)
			.token_endpoint(token)
			.build()
			.expect("Mock provider descriptor should build.")
	}

	/// Builds a relay configuration pointed at `base_url` with the shared test key pair.
	pub fn test_config(base_url: &str) -> RelayConfig {
		RelayConfig::builder()
			.api_key(TEST_API_KEY)
			.secret_key(TEST_SECRET_KEY)
			.descriptor(test_descriptor(base_url))
			.build()
			.expect("Test relay configuration should build.")
	}

	/// Constructs an [`EffectRelay`] backed by reqwest and returns the token manager it shares.
	pub fn build_reqwest_test_relay(
		config: RelayConfig,
	) -> (ReqwestTestRelay, Arc<TokenManager<ReqwestHttpClient>>) {
		let http_client = Arc::new(test_reqwest_http_client());
		let tokens = Arc::new(config.token_manager(http_client.clone()));
		let relay = EffectRelay::with_token_manager(http_client, &config, tokens.clone());

		(relay, tokens)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(any(test, feature = "server"))] use color_eyre as _;
#[cfg(test)] use {httpmock as _, tower as _};
