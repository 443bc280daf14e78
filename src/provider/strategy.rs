//! Classification of the provider's numeric error codes.
//!
//! Effect endpoints answer business failures with `error_code`/`error_msg` pairs, usually under an
//! HTTP 200. The relay only needs a coarse view of those codes: whether the cached token must be
//! dropped, and what to log.

/// Canonical upstream error categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpstreamErrorKind {
	/// Access token invalid or expired; the cached token must be discarded.
	TokenRejected,
	/// Request, QPS, or daily quota exhausted.
	RateLimited,
	/// Provider refused the image or parameters.
	InvalidInput,
	/// Any other failure.
	Other,
}
impl UpstreamErrorKind {
	/// Classifies an `error_code` returned by an effect endpoint.
	pub fn classify(code: Option<i64>) -> Self {
		match code {
			Some(110 | 111) => UpstreamErrorKind::TokenRejected,
			Some(4 | 17 | 18 | 19) => UpstreamErrorKind::RateLimited,
			Some(216100 | 216101 | 216200 | 216201 | 216202) => UpstreamErrorKind::InvalidInput,
			_ => UpstreamErrorKind::Other,
		}
	}

	/// Returns a stable label suitable for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			UpstreamErrorKind::TokenRejected => "token_rejected",
			UpstreamErrorKind::RateLimited => "rate_limited",
			UpstreamErrorKind::InvalidInput => "invalid_input",
			UpstreamErrorKind::Other => "other",
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn classifies_known_codes() {
		assert_eq!(UpstreamErrorKind::classify(Some(110)), UpstreamErrorKind::TokenRejected);
		assert_eq!(UpstreamErrorKind::classify(Some(111)), UpstreamErrorKind::TokenRejected);
		assert_eq!(UpstreamErrorKind::classify(Some(18)), UpstreamErrorKind::RateLimited);
		assert_eq!(UpstreamErrorKind::classify(Some(216201)), UpstreamErrorKind::InvalidInput);
		assert_eq!(UpstreamErrorKind::classify(Some(1)), UpstreamErrorKind::Other);
		assert_eq!(UpstreamErrorKind::classify(None), UpstreamErrorKind::Other);
	}
}
