//! Browser-facing HTTP surface built on axum.
//!
//! `POST /api/image` runs [`EffectRelay::process`]; `GET /api/effects` lists the catalog and
//! `GET /health` answers liveness probes. Every route is CORS-enabled for any origin.

// std
use std::net::SocketAddr;
// crates.io
use axum::{
	Json, Router,
	extract::{DefaultBodyLimit, State, rejection::JsonRejection},
	http::{Method, StatusCode, header},
	response::{IntoResponse, Response},
	routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};
// self
use crate::{
	_prelude::*,
	error::ErrorKind,
	flows::{EffectImage, EffectRelay, EffectRequest},
	http::ProviderHttpClient,
	provider::EffectCatalog,
};

// Headroom for the JSON envelope around the base64 image.
const BODY_OVERHEAD: usize = 64 * 1024;

/// Builds the router serving `relay`.
pub fn router<C>(relay: Arc<EffectRelay<C>>) -> Router
where
	C: ?Sized + ProviderHttpClient,
{
	let body_limit = relay.max_image_bytes().saturating_add(BODY_OVERHEAD);

	Router::new()
		// CORS answers real preflights; this route only sees bare OPTIONS without an Origin.
		.route("/api/image", post(process_image::<C>).options(preflight))
		.route("/api/effects", get(list_effects))
		.route("/health", get(health))
		.layer(DefaultBodyLimit::max(body_limit))
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods([Method::GET, Method::POST, Method::OPTIONS])
				.allow_headers([header::CONTENT_TYPE]),
		)
		.layer(TraceLayer::new_for_http())
		.with_state(relay)
}

/// Binds `addr` and serves `relay` until Ctrl-C.
pub async fn serve<C>(relay: Arc<EffectRelay<C>>, addr: SocketAddr) -> std::io::Result<()>
where
	C: ?Sized + ProviderHttpClient,
{
	let listener = TcpListener::bind(addr).await?;

	tracing::info!(addr = %listener.local_addr()?, "Image effect relay listening.");

	axum::serve(listener, router(relay)).with_graceful_shutdown(shutdown_signal()).await
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "Failed to listen for the shutdown signal.");

		return;
	}

	tracing::info!("Shutdown signal received.");
}

async fn process_image<C>(
	State(relay): State<Arc<EffectRelay<C>>>,
	payload: Result<Json<EffectRequest>, JsonRejection>,
) -> Result<Json<EffectImage>, ApiError>
where
	C: ?Sized + ProviderHttpClient,
{
	let Json(request) = payload?;

	Ok(Json(relay.process(request).await?))
}

async fn preflight() -> StatusCode {
	StatusCode::OK
}

async fn list_effects() -> Json<EffectCatalog> {
	Json(EffectCatalog::new())
}

async fn health() -> Json<serde_json::Value> {
	Json(serde_json::json!({ "status": "ok" }))
}

/// JSON error body returned for every failed request.
#[derive(Debug, Serialize)]
struct ErrorBody {
	error: String,
	kind: &'static str,
}

/// Error response carrying the HTTP status and the relay's error classification.
#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	kind: ErrorKind,
	message: String,
}
impl ApiError {
	/// HTTP status of the response.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// Error classification.
	pub fn kind(&self) -> ErrorKind {
		self.kind
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		let kind = err.kind();
		let status = match (&err, kind) {
			(Error::ImageTooLarge { .. }, _) => StatusCode::PAYLOAD_TOO_LARGE,
			(_, kind) if kind.is_client_error() => StatusCode::BAD_REQUEST,
			(_, ErrorKind::ConfigurationError) => StatusCode::INTERNAL_SERVER_ERROR,
			_ => StatusCode::BAD_GATEWAY,
		};

		if status.is_server_error() {
			tracing::error!(kind = %kind, error = %err, "Effect request failed.");
		}

		Self { status, kind, message: err.to_string() }
	}
}
impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		let status = match rejection.status() {
			StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
			_ => StatusCode::BAD_REQUEST,
		};

		Self {
			status,
			kind: ErrorKind::InvalidRequest,
			message: rejection.body_text(),
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error: self.message, kind: self.kind.as_str() };

		(self.status, Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use axum::body::{Body, to_bytes};
	use tower::ServiceExt;
	// self
	use super::*;
	use crate::{
		config::RelayConfig,
		http::testing::{ScriptedHttpClient, json_reply},
	};

	const TOKEN_REPLY: &str = r#"{"access_token":"tok-1","expires_in":2592000}"#;

	fn app(client: Arc<ScriptedHttpClient>) -> Router {
		let config = RelayConfig::builder()
			.api_key("api-key")
			.secret_key("secret-key")
			.provider_url("https://aip.example.com")
			.max_image_bytes(64)
			.build()
			.expect("Config should build.");

		router(Arc::new(EffectRelay::<ScriptedHttpClient>::new(client, &config)))
	}

	fn post_json(body: &str) -> axum::http::Request<Body> {
		axum::http::Request::post("/api/image")
			.header(header::CONTENT_TYPE, "application/json")
			.body(Body::from(body.to_owned()))
			.expect("Request should build.")
	}

	async fn json_body(response: Response) -> serde_json::Value {
		let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("Body should read.");

		serde_json::from_slice(&bytes).expect("Body should be JSON.")
	}

	#[tokio::test]
	async fn process_returns_the_provider_image() {
		let client = Arc::new(ScriptedHttpClient::with_replies([
			json_reply(200, TOKEN_REPLY),
			json_reply(200, r#"{"image":"b3V0"}"#),
		]));
		let response = app(client)
			.oneshot(post_json(r#"{"image":"abc","effect":"colorize"}"#))
			.await
			.expect("Router should respond.");

		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(json_body(response).await, serde_json::json!({ "image": "b3V0" }));
	}

	#[tokio::test]
	async fn validation_errors_map_to_bad_request() {
		let client = Arc::new(ScriptedHttpClient::default());
		let app = app(client.clone());
		let response = app
			.clone()
			.oneshot(post_json(
				r#"{"image":"abc","effect":"styleTransfer","options":{"style":"bogus"}}"#,
			))
			.await
			.expect("Router should respond.");

		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
		assert_eq!(json_body(response).await["kind"], "invalid_option");

		let response = app
			.clone()
			.oneshot(post_json(r#"{"image":"abc","effect":"sepia"}"#))
			.await
			.expect("Router should respond.");

		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
		assert_eq!(json_body(response).await["kind"], "unsupported_effect");

		let response =
			app.oneshot(post_json("{not json")).await.expect("Router should respond.");

		assert_eq!(response.status(), StatusCode::BAD_REQUEST);
		assert_eq!(json_body(response).await["kind"], "invalid_request");
		assert!(client.requests().is_empty());
	}

	#[tokio::test]
	async fn oversized_images_map_to_payload_too_large() {
		let client = Arc::new(ScriptedHttpClient::default());
		let body = format!(r#"{{"image":"{}","effect":"dehaze"}}"#, "A".repeat(128));
		let response = app(client).oneshot(post_json(&body)).await.expect("Router should respond.");

		assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
		assert_eq!(json_body(response).await["kind"], "invalid_request");
	}

	#[tokio::test]
	async fn provider_failures_map_to_bad_gateway() {
		let client = Arc::new(ScriptedHttpClient::with_replies([
			json_reply(200, TOKEN_REPLY),
			json_reply(200, r#"{"error_code":17,"error_msg":"Open api daily request limit reached"}"#),
		]));
		let response = app(client)
			.oneshot(post_json(r#"{"image":"abc","effect":"upscale"}"#))
			.await
			.expect("Router should respond.");

		assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

		let body = json_body(response).await;

		assert_eq!(body["kind"], "upstream_error");
		assert!(
			body["error"].as_str().is_some_and(|error| error.contains("daily request limit"))
		);
	}

	#[tokio::test]
	async fn preflight_allows_any_origin() {
		let request = axum::http::Request::builder()
			.method(Method::OPTIONS)
			.uri("/api/image")
			.header(header::ORIGIN, "https://app.example.com")
			.header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
			.header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
			.body(Body::empty())
			.expect("Request should build.");
		let response = app(Arc::new(ScriptedHttpClient::default()))
			.oneshot(request)
			.await
			.expect("Router should respond.");

		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(
			response
				.headers()
				.get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
				.and_then(|value| value.to_str().ok()),
			Some("*")
		);
	}

	#[tokio::test]
	async fn bare_options_is_ok() {
		let request = axum::http::Request::builder()
			.method(Method::OPTIONS)
			.uri("/api/image")
			.body(Body::empty())
			.expect("Request should build.");
		let response = app(Arc::new(ScriptedHttpClient::default()))
			.oneshot(request)
			.await
			.expect("Router should respond.");

		assert_eq!(response.status(), StatusCode::OK);
	}

	#[tokio::test]
	async fn catalog_and_health_are_served() {
		let app = app(Arc::new(ScriptedHttpClient::default()));
		let response = app
			.clone()
			.oneshot(
				axum::http::Request::get("/api/effects")
					.body(Body::empty())
					.expect("Request should build."),
			)
			.await
			.expect("Router should respond.");

		assert_eq!(response.status(), StatusCode::OK);
		assert_eq!(json_body(response).await["defaultStyle"], "cartoon");

		let response = app
			.oneshot(
				axum::http::Request::get("/health").body(Body::empty()).expect("Request should build."),
			)
			.await
			.expect("Router should respond.");

		assert_eq!(json_body(response).await, serde_json::json!({ "status": "ok" }));
	}
}
