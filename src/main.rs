//! Image effect relay server binary.

// std
use std::sync::Arc;
// crates.io
use clap::Parser;
use color_eyre::eyre::WrapErr;
// self
use image_effect_relay::{cli::Cli, flows::EffectRelay, obs};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let cli = Cli::parse();

	obs::init_tracing(cli.log_json);

	let config = cli.relay_config().wrap_err("Invalid relay configuration.")?;
	let relay = EffectRelay::from_config(&config).wrap_err("Failed to build the HTTP client.")?;

	tracing::info!(
		provider = %config.descriptor.base_url,
		token_endpoint = %config.descriptor.token_endpoint,
		"Relay configured."
	);

	image_effect_relay::server::serve(Arc::new(relay), cli.bind)
		.await
		.wrap_err("Relay server stopped with an error.")
}
