//! Demonstrates colorizing an image through the relay with the default reqwest transport against
//! a mock provider, showing that the second call reuses the cached access token.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use image_effect_relay::{
	config::RelayConfig,
	flows::{EffectRelay, EffectRequest},
	http::ReqwestHttpClient,
	reqwest::Client,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/oauth/2.0/token").query_param("grant_type", "client_credentials");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-access\",\"expires_in\":2592000}");
		})
		.await;
	let effect_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/rest/2.0/image-process/v1/colourize");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"log_id\":1,\"image\":\"Y29sb3JpemVk\"}");
		})
		.await;
	let config = RelayConfig::builder()
		.api_key("demo-api-key")
		.secret_key("demo-secret-key")
		.provider_url(server.base_url())
		.build()?;
	let relay = <EffectRelay<ReqwestHttpClient>>::new(
		Arc::new(ReqwestHttpClient::with_client(Client::builder().build()?)),
		&config,
	);

	for _ in 0..2 {
		let image = relay
			.process(EffectRequest::new("colorize", "data:image/jpeg;base64,aGVsbG8="))
			.await?;

		println!("Colorized image: {}.", image.image);
	}

	token_mock.assert_calls_async(1).await;
	effect_mock.assert_calls_async(2).await;

	Ok(())
}
