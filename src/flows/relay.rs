//! Effect relay: validates a caller request and forwards it to the matching provider endpoint.
//!
//! [`EffectRelay::process`] never contacts the provider for requests it can reject locally. The
//! effect name and style are resolved first, then the image payload is normalized (data-URL
//! prefix stripped, size and base64 checked), and only then is an access token obtained and the
//! form-encoded POST issued. Provider replies are reduced to the base64 result image or a typed
//! [`Error`].

// crates.io
use base64::{
	Engine,
	alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
// self
use crate::{
	_prelude::*,
	config::RelayConfig,
	flows::TokenManager,
	http::{HttpReply, ProviderHttpClient, ProviderRequest},
	obs::{self, CallKind, CallOutcome, CallSpan},
	provider::{EffectCall, ProviderDescriptor, UpstreamErrorKind},
};
#[cfg(feature = "reqwest")]
use crate::{error::ConfigError, http::ReqwestHttpClient};

// Browsers emit unpadded or loosely padded payloads often enough that strict decoding is wrong here.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
	&alphabet::STANDARD,
	GeneralPurposeConfig::new()
		.with_decode_padding_mode(DecodePaddingMode::Indifferent)
		.with_decode_allow_trailing_bits(true),
);

/// Inbound effect request as posted by the front end.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectRequest {
	/// Base64 image, optionally prefixed with a `data:` URL header.
	#[serde(default)]
	pub image: String,
	/// Effect wire name.
	#[serde(default)]
	pub effect: String,
	/// Effect options.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub options: Option<EffectOptions>,
}
impl EffectRequest {
	/// Creates a request without options.
	pub fn new(effect: impl Into<String>, image: impl Into<String>) -> Self {
		Self { image: image.into(), effect: effect.into(), options: None }
	}

	/// Sets the style option.
	pub fn with_style(mut self, style: impl Into<String>) -> Self {
		self.options = Some(EffectOptions { style: Some(style.into()) });

		self
	}

	fn style(&self) -> Option<&str> {
		self.options.as_ref().and_then(|options| options.style.as_deref())
	}
}

/// Options accompanying an [`EffectRequest`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectOptions {
	/// Style name; only consulted for style transfer.
	#[serde(default)]
	pub style: Option<String>,
}

/// Processed image returned to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectImage {
	/// Base64 result image.
	pub image: String,
}

/// Forwards validated effect requests to the provider.
pub struct EffectRelay<C>
where
	C: ?Sized + ProviderHttpClient,
{
	http_client: Arc<C>,
	descriptor: ProviderDescriptor,
	tokens: Arc<TokenManager<C>>,
	max_image_bytes: usize,
}
impl<C> EffectRelay<C>
where
	C: ?Sized + ProviderHttpClient,
{
	/// Creates a relay with its own token manager.
	pub fn new(http_client: impl Into<Arc<C>>, config: &RelayConfig) -> Self {
		let http_client = http_client.into();
		let tokens = Arc::new(config.token_manager(http_client.clone()));

		Self::with_token_manager(http_client, config, tokens)
	}

	/// Creates a relay that shares an existing token manager.
	pub fn with_token_manager(
		http_client: impl Into<Arc<C>>,
		config: &RelayConfig,
		tokens: Arc<TokenManager<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			descriptor: config.descriptor.clone(),
			tokens,
			max_image_bytes: config.max_image_bytes,
		}
	}

	/// Token manager backing this relay.
	pub fn tokens(&self) -> &Arc<TokenManager<C>> {
		&self.tokens
	}

	/// Provider endpoints this relay targets.
	pub fn descriptor(&self) -> &ProviderDescriptor {
		&self.descriptor
	}

	/// Maximum accepted length of the encoded image.
	pub fn max_image_bytes(&self) -> usize {
		self.max_image_bytes
	}

	/// Validates `request`, forwards it, and returns the provider's result image.
	pub async fn process(&self, request: EffectRequest) -> Result<EffectImage> {
		let call = EffectCall::resolve(&request.effect, request.style())?;
		let image = normalize_image(&request.image, self.max_image_bytes)?;

		self.apply(call, image).await
	}

	/// Forwards an already validated call.
	pub async fn apply(&self, call: EffectCall, image: &str) -> Result<EffectImage> {
		const KIND: CallKind = CallKind::Effect;

		let span = CallSpan::new(KIND, call.effect.as_str());

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async {
				let token = self.tokens.ensure_token().await?;
				let request =
					ProviderRequest::post_form(self.descriptor.effect_endpoint(call.effect))
						.query("access_token", token.expose())
						.form(call.form(image));
				let reply = self.http_client.execute(request).await?;

				parse_effect_reply(reply)
			})
			.await;

		match &result {
			Ok(_) => {
				obs::record_call_outcome(KIND, CallOutcome::Success);

				#[cfg(feature = "tracing")]
				tracing::debug!(effect = %call.effect, "Effect applied.");
			},
			Err(err) => {
				obs::record_call_outcome(KIND, CallOutcome::Failure);

				let upstream = upstream_kind(err);

				if upstream == Some(UpstreamErrorKind::TokenRejected) {
					self.tokens.invalidate();

					#[cfg(feature = "tracing")]
					tracing::warn!("Provider rejected the cached token; cache cleared.");
				}

				#[cfg(feature = "tracing")]
				tracing::warn!(
					effect = %call.effect,
					kind = %err.kind(),
					upstream = upstream.map(UpstreamErrorKind::as_str),
					error = %err,
					"Effect failed."
				);
			},
		}

		result
	}
}
#[cfg(feature = "reqwest")]
impl EffectRelay<ReqwestHttpClient> {
	/// Builds a reqwest-backed relay from `config`.
	///
	/// Redirects are disabled so the access token never follows a `Location` header.
	pub fn from_config(config: &RelayConfig) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().redirect(reqwest::redirect::Policy::none()).build()?;

		Ok(Self::new(ReqwestHttpClient::with_client(client), config))
	}
}
impl<C> Debug for EffectRelay<C>
where
	C: ?Sized + ProviderHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("EffectRelay")
			.field("descriptor", &self.descriptor)
			.field("tokens", &self.tokens)
			.field("max_image_bytes", &self.max_image_bytes)
			.finish()
	}
}

/// Classifies provider business errors; `None` for every other failure.
pub fn upstream_kind(err: &Error) -> Option<UpstreamErrorKind> {
	match err {
		Error::Upstream { code, .. } => Some(UpstreamErrorKind::classify(*code)),
		_ => None,
	}
}

/// Strips an optional `data:<mime>;base64,` header and validates the remaining payload.
pub fn normalize_image(raw: &str, limit: usize) -> Result<&str> {
	let image = strip_data_url(raw.trim());

	if image.is_empty() {
		return Err(Error::MissingImage);
	}
	if image.len() > limit {
		return Err(Error::ImageTooLarge { size: image.len(), limit });
	}

	LENIENT_BASE64.decode(image).map_err(|_| Error::InvalidImage)?;

	Ok(image)
}

fn strip_data_url(image: &str) -> &str {
	if !image.starts_with("data:") {
		return image;
	}

	image.split_once(',').map_or(image, |(_, payload)| payload)
}

#[derive(Debug, Deserialize)]
struct EffectReply {
	image: Option<String>,
	result: Option<String>,
	error_code: Option<i64>,
	error_msg: Option<String>,
}

fn parse_effect_reply(reply: HttpReply) -> Result<EffectImage> {
	let status = reply.status;
	let body = serde_path_to_error::deserialize::<_, EffectReply>(
		&mut serde_json::Deserializer::from_slice(&reply.body),
	);

	// Business errors usually arrive under HTTP 200.
	if let Some((code, message)) = body
		.as_ref()
		.ok()
		.and_then(|body| body.error_code.filter(|code| *code != 0).map(|code| (code, &body.error_msg)))
	{
		let message = message
			.clone()
			.filter(|message| !message.is_empty())
			.unwrap_or_else(|| "Processing failed".into());

		return Err(Error::Upstream { code: Some(code), status, message });
	}
	if !reply.is_success() {
		return Err(Error::Upstream {
			code: None,
			status,
			message: format!("HTTP {status}: {}", reply.body_preview()),
		});
	}

	let body = body.map_err(|source| Error::MissingResult {
		reason: format!("response is not valid JSON ({source})"),
	})?;

	body.image
		.filter(|image| !image.is_empty())
		.or(body.result.filter(|result| !result.is_empty()))
		.map(|image| EffectImage { image })
		.ok_or_else(|| Error::MissingResult { reason: "neither image nor result is set".into() })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		http::{
			HttpMethod,
			testing::{ScriptedHttpClient, json_reply},
		},
		provider::Effect,
	};

	const TOKEN_PATH: &str = "/oauth/2.0/token";
	const TOKEN_REPLY: &str = r#"{"access_token":"tok-1","expires_in":2592000}"#;

	fn relay(client: Arc<ScriptedHttpClient>) -> EffectRelay<ScriptedHttpClient> {
		let config = RelayConfig::builder()
			.api_key("api-key")
			.secret_key("secret-key")
			.provider_url("https://aip.example.com")
			.build()
			.expect("Config should build.");

		EffectRelay::new(client, &config)
	}

	#[tokio::test]
	async fn forwards_form_with_access_token() {
		let client = Arc::new(ScriptedHttpClient::with_replies([
			json_reply(200, TOKEN_REPLY),
			json_reply(200, r#"{"log_id":1,"image":"b3V0"}"#),
		]));
		let relay = relay(client.clone());
		let image = relay
			.process(EffectRequest::new("styleTransfer", "aGVsbG8=").with_style("pencil"))
			.await
			.expect("Effect should succeed.");

		assert_eq!(image.image, "b3V0");

		let requests = client.requests();
		let effect = &requests[1];

		assert_eq!(effect.method, HttpMethod::PostForm);
		assert_eq!(effect.url.path(), Effect::StyleTransfer.endpoint_path());
		assert_eq!(effect.query_value("access_token"), Some("tok-1"));
		assert_eq!(effect.form_value("image"), Some("aGVsbG8="));
		assert_eq!(effect.form_value("option"), Some("pencil"));
	}

	#[tokio::test]
	async fn local_validation_failures_make_no_calls() {
		let client = Arc::new(ScriptedHttpClient::default());
		let relay = relay(client.clone());
		let err = relay
			.process(EffectRequest::new("sepia", "aGVsbG8="))
			.await
			.expect_err("Unknown effect should fail.");

		assert!(matches!(err, Error::UnsupportedEffect { .. }));

		let err = relay
			.process(EffectRequest::new("styleTransfer", "aGVsbG8=").with_style("bogus"))
			.await
			.expect_err("Unknown style should fail.");

		assert!(matches!(err, Error::InvalidOption { option: "style", .. }));

		let err = relay
			.process(EffectRequest::new("dehaze", ""))
			.await
			.expect_err("Empty image should fail.");

		assert!(matches!(err, Error::MissingImage));
		assert!(client.requests().is_empty());
	}

	#[tokio::test]
	async fn upstream_error_code_carries_message() {
		let client = Arc::new(ScriptedHttpClient::with_replies([
			json_reply(200, TOKEN_REPLY),
			json_reply(200, r#"{"error_code":1,"error_msg":"Unknown error"}"#),
		]));
		let err = relay(client)
			.process(EffectRequest::new("colorize", "aGVsbG8="))
			.await
			.expect_err("Provider error should surface.");

		assert!(matches!(
			err,
			Error::Upstream { code: Some(1), status: 200, ref message } if message == "Unknown error"
		));
	}

	#[tokio::test]
	async fn token_rejection_clears_the_cache() {
		let client = Arc::new(ScriptedHttpClient::with_replies([
			json_reply(200, TOKEN_REPLY),
			json_reply(200, r#"{"error_code":110,"error_msg":"Access token invalid or no longer valid"}"#),
			json_reply(200, r#"{"access_token":"tok-2","expires_in":2592000}"#),
			json_reply(200, r#"{"image":"b3V0"}"#),
		]));
		let relay = relay(client.clone());

		relay
			.process(EffectRequest::new("anime", "aGVsbG8="))
			.await
			.expect_err("Rejected token should fail the call.");

		assert!(relay.tokens().cached_expiry().is_none());

		relay
			.process(EffectRequest::new("anime", "aGVsbG8="))
			.await
			.expect("Retry with a fresh token should succeed.");

		assert_eq!(client.calls_to(TOKEN_PATH), 2);
		assert_eq!(client.requests()[3].query_value("access_token"), Some("tok-2"));
	}

	#[tokio::test]
	async fn rate_limited_reply_keeps_the_cached_token() {
		let client = Arc::new(ScriptedHttpClient::with_replies([
			json_reply(200, TOKEN_REPLY),
			json_reply(200, r#"{"error_code":18,"error_msg":"Open api qps request limit reached"}"#),
		]));
		let relay = relay(client.clone());
		let call = EffectCall::resolve("contrast", None).expect("Effect should resolve.");
		let err = relay.apply(call, "aGVsbG8=").await.expect_err("Rate limit should fail the call.");

		assert_eq!(upstream_kind(&err), Some(UpstreamErrorKind::RateLimited));
		assert_eq!(UpstreamErrorKind::RateLimited.as_str(), "rate_limited");
		assert!(relay.tokens().cached_expiry().is_some());
		assert_eq!(client.calls_to(TOKEN_PATH), 1);
	}

	#[tokio::test]
	async fn relay_state_never_renders_secrets() {
		let client = Arc::new(ScriptedHttpClient::with_replies([json_reply(200, TOKEN_REPLY)]));
		let relay = relay(client);

		relay.tokens().ensure_token().await.expect("Exchange should succeed.");

		let rendered = format!("{relay:?}");

		assert!(rendered.contains("api-key"));
		assert!(!rendered.contains("secret-key"));
		assert!(!rendered.contains("tok-1"));
	}

	#[test]
	fn only_provider_errors_are_classified() {
		let invalid = Error::Upstream { code: Some(216201), status: 200, message: "bad".into() };

		assert_eq!(upstream_kind(&invalid), Some(UpstreamErrorKind::InvalidInput));
		assert_eq!(upstream_kind(&Error::MissingImage), None);
	}

	#[tokio::test]
	async fn token_failure_skips_the_effect_call() {
		let client = Arc::new(ScriptedHttpClient::with_replies([json_reply(
			401,
			r#"{"error":"invalid_client"}"#,
		)]));
		let err = relay(client.clone())
			.process(EffectRequest::new("colorize", "aGVsbG8="))
			.await
			.expect_err("Token failure should propagate.");

		assert!(matches!(err, Error::TokenAcquisitionFailed(_)));
		assert_eq!(client.requests().len(), 1);
	}

	#[test]
	fn reply_without_image_is_missing_result() {
		assert!(matches!(
			parse_effect_reply(json_reply(200, r#"{"log_id":5}"#)),
			Err(Error::MissingResult { .. })
		));
		assert!(matches!(
			parse_effect_reply(json_reply(200, r#"{"image":""}"#)),
			Err(Error::MissingResult { .. })
		));
		assert!(matches!(
			parse_effect_reply(json_reply(200, "<html>")),
			Err(Error::MissingResult { .. })
		));
	}

	#[test]
	fn reply_falls_back_to_result_field() {
		let image = parse_effect_reply(json_reply(200, r#"{"result":"cmVz","error_code":0}"#))
			.expect("Result field should be accepted.");

		assert_eq!(image.image, "cmVz");
	}

	#[test]
	fn non_success_status_is_upstream_error() {
		assert!(matches!(
			parse_effect_reply(json_reply(503, "unavailable")),
			Err(Error::Upstream { code: None, status: 503, .. })
		));
	}

	#[test]
	fn data_url_prefix_is_stripped() {
		assert_eq!(
			normalize_image("data:image/png;base64,aGVsbG8=", 1024).expect("Prefixed image is valid."),
			"aGVsbG8="
		);
		assert_eq!(normalize_image("abc", 1024).expect("Unpadded image is valid."), "abc");
		assert!(matches!(normalize_image("data:image/png;base64,", 1024), Err(Error::MissingImage)));
		assert!(matches!(normalize_image("not base64!", 1024), Err(Error::InvalidImage)));
		assert!(matches!(
			normalize_image("aGVsbG8=", 4),
			Err(Error::ImageTooLarge { size: 8, limit: 4 })
		));
	}

	#[test]
	fn request_accepts_missing_fields() {
		let request = serde_json::from_str::<EffectRequest>(r#"{"effect":"dehaze"}"#)
			.expect("Missing image should deserialize.");

		assert_eq!(request.image, "");
		assert_eq!(request.style(), None);

		let request = serde_json::from_str::<EffectRequest>(
			r#"{"image":"abc","effect":"styleTransfer","options":{"style":"wave"}}"#,
		)
		.expect("Full request should deserialize.");

		assert_eq!(request.style(), Some("wave"));
	}
}
