// crates.io
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global `tracing` subscriber for the server binary.
///
/// The filter comes from `RUST_LOG` and falls back to `info`. Output is human-readable unless
/// `json` is set.
pub fn init_tracing(json: bool) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let registry = tracing_subscriber::registry().with(filter);

	if json {
		registry.with(fmt::layer().json().with_current_span(true)).init();
	} else {
		registry.with(fmt::layer().with_target(true)).init();
	}
}
