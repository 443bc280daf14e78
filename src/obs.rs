//! Optional observability helpers for relay calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `image_effect_relay.call` with the `op`
//!   (outbound call) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `image_effect_relay_call_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`.

mod metrics;
#[cfg(feature = "server")] mod subscriber;
mod tracing;

pub use metrics::*;
#[cfg(feature = "server")] pub use subscriber::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Outbound calls observed by the relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// Client-credentials exchange against the token endpoint.
	TokenExchange,
	/// Effect request against an image-processing endpoint.
	Effect,
}
impl CallKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallKind::TokenExchange => "token_exchange",
			CallKind::Effect => "effect",
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to a relay operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CallOutcome::Attempt => "attempt",
			CallOutcome::Success => "success",
			CallOutcome::Failure => "failure",
		}
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
