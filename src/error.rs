//! Relay-level error types shared across the token manager, the effect relay, and the server.

// self
use crate::_prelude::*;

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical relay error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The provider token could not be obtained.
	#[error("Failed to acquire a provider access token: {0}")]
	TokenAcquisitionFailed(#[from] TokenError),
	/// Transport failure (DNS, TCP, TLS) while calling an effect endpoint.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Requested effect is not part of the supported set.
	#[error("Effect `{name}` is not supported.")]
	UnsupportedEffect {
		/// Effect name supplied by the caller.
		name: String,
	},
	/// An effect option carries a value outside its enumeration.
	#[error("Option `{option}` does not accept `{value}`.")]
	InvalidOption {
		/// Option field name.
		option: &'static str,
		/// Value supplied by the caller.
		value: String,
	},
	/// The request carried no image payload.
	#[error("Request does not contain image data.")]
	MissingImage,
	/// The image payload is not base64 text.
	#[error("Image data is not valid base64.")]
	InvalidImage,
	/// The image payload exceeds the configured limit.
	#[error("Image payload of {size} bytes exceeds the {limit}-byte limit.")]
	ImageTooLarge {
		/// Encoded payload length.
		size: usize,
		/// Configured maximum encoded length.
		limit: usize,
	},
	/// Provider reported a business error for the effect call.
	#[error("Provider rejected the request: {message}.")]
	Upstream {
		/// Provider `error_code`, when one was returned.
		code: Option<i64>,
		/// HTTP status of the provider response.
		status: u16,
		/// Provider-supplied (or relay-synthesized) message.
		message: String,
	},
	/// Provider response carried neither `image` nor `result`.
	#[error("Provider response did not contain an image: {reason}.")]
	MissingResult {
		/// What was wrong with the response.
		reason: String,
	},
}
impl Error {
	/// Returns the coarse classification used for status mapping and error bodies.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Config(_) => ErrorKind::ConfigurationError,
			Self::TokenAcquisitionFailed(_) => ErrorKind::TokenAcquisitionFailed,
			Self::Transport(_) => ErrorKind::TransportError,
			Self::UnsupportedEffect { .. } => ErrorKind::UnsupportedEffect,
			Self::InvalidOption { .. } => ErrorKind::InvalidOption,
			Self::MissingImage | Self::InvalidImage | Self::ImageTooLarge { .. } =>
				ErrorKind::InvalidRequest,
			Self::Upstream { .. } => ErrorKind::UpstreamError,
			Self::MissingResult { .. } => ErrorKind::MissingResult,
		}
	}
}

/// Coarse error classes surfaced to HTTP callers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Effect name outside the supported set.
	UnsupportedEffect,
	/// Option value outside its enumeration.
	InvalidOption,
	/// Missing, malformed, or oversized request payload.
	InvalidRequest,
	/// Token exchange failed.
	TokenAcquisitionFailed,
	/// Provider reported a business error.
	UpstreamError,
	/// Provider response lacked a result image.
	MissingResult,
	/// Network failure while calling the provider.
	TransportError,
	/// Missing secrets or invalid settings.
	ConfigurationError,
}
impl ErrorKind {
	/// Returns a stable label suitable for error bodies and log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ErrorKind::UnsupportedEffect => "unsupported_effect",
			ErrorKind::InvalidOption => "invalid_option",
			ErrorKind::InvalidRequest => "invalid_request",
			ErrorKind::TokenAcquisitionFailed => "token_acquisition_failed",
			ErrorKind::UpstreamError => "upstream_error",
			ErrorKind::MissingResult => "missing_result",
			ErrorKind::TransportError => "transport_error",
			ErrorKind::ConfigurationError => "configuration_error",
		}
	}

	/// Returns `true` for validation-class errors caused by the caller's input.
	pub const fn is_client_error(self) -> bool {
		matches!(
			self,
			ErrorKind::UnsupportedEffect | ErrorKind::InvalidOption | ErrorKind::InvalidRequest
		)
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration and validation failures raised while initializing the relay.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A required secret was not supplied.
	#[error("Required secret `{name}` is not configured.")]
	MissingSecret {
		/// Setting or environment variable name.
		name: &'static str,
	},
	/// A configured URL cannot be parsed.
	#[error("Setting `{name}` is not a valid URL.")]
	InvalidUrl {
		/// Setting name.
		name: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A numeric or enumerated setting holds an unusable value.
	#[error("Setting `{name}` has an invalid value `{value}`.")]
	InvalidSetting {
		/// Setting name.
		name: &'static str,
		/// Raw value supplied.
		value: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised by the client-credentials exchange.
#[derive(Debug, ThisError)]
pub enum TokenError {
	/// Network failure while calling the token endpoint.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token endpoint refused the key pair or answered with a non-success status.
	#[error("Token endpoint rejected the client credentials: {reason}.")]
	Rejected {
		/// HTTP status code of the response.
		status: u16,
		/// Provider `error_description`, `error`, or a synthesized summary.
		reason: String,
	},
	/// Token endpoint responded with malformed JSON.
	#[error("Token endpoint returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Token endpoint response omitted `access_token`.
	#[error("Token endpoint response is missing access_token.")]
	MissingAccessToken,
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned a non-positive lifetime.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
}

/// Transport-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		// Request URLs carry the access token as a query parameter.
		Self::network(e.without_url())
	}
}
