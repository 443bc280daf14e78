//! Transport primitives for provider calls.
//!
//! The module exposes [`ProviderHttpClient`] alongside [`ProviderRequest`] and [`HttpReply`] so
//! downstream crates can plug in custom HTTP stacks (or counting fakes in tests) without the
//! relay depending on reqwest types. Implementations only move bytes: status interpretation and
//! JSON decoding stay inside the token manager and the relay.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`ProviderHttpClient::execute`].
pub type HttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpReply, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of reaching the provider.
///
/// The trait acts as the relay's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync + 'static` so a single client can be shared (behind `Arc<T>`) by the token
/// manager and the relay, and the futures they return must be `Send` so axum handlers can hop
/// executors.
pub trait ProviderHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and returns the raw status and body.
	///
	/// Non-2xx statuses are not errors at this layer; only failures that prevent a response from
	/// arriving map to [`TransportError`].
	fn execute(&self, request: ProviderRequest) -> HttpFuture<'_>;
}

/// Request shapes the provider understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
	/// `GET` with query parameters only.
	Get,
	/// `POST` with an `application/x-www-form-urlencoded` body.
	PostForm,
}

/// Outbound provider request.
#[derive(Clone)]
pub struct ProviderRequest {
	/// Request shape.
	pub method: HttpMethod,
	/// Endpoint URL without query parameters.
	pub url: Url,
	/// Query parameters; may carry credentials.
	pub query: Vec<(&'static str, String)>,
	/// Form body fields (ignored for [`HttpMethod::Get`]).
	pub form: Vec<(&'static str, String)>,
}
impl ProviderRequest {
	/// Creates a `GET` request.
	pub fn get(url: Url) -> Self {
		Self { method: HttpMethod::Get, url, query: Vec::new(), form: Vec::new() }
	}

	/// Creates a form-encoded `POST` request.
	pub fn post_form(url: Url) -> Self {
		Self { method: HttpMethod::PostForm, url, query: Vec::new(), form: Vec::new() }
	}

	/// Appends a query parameter.
	pub fn query(mut self, key: &'static str, value: impl Into<String>) -> Self {
		self.query.push((key, value.into()));

		self
	}

	/// Replaces the form body.
	pub fn form(mut self, form: Vec<(&'static str, String)>) -> Self {
		self.form = form;

		self
	}

	/// Returns the value of the first query parameter named `key`.
	pub fn query_value(&self, key: &str) -> Option<&str> {
		self.query.iter().find(|(name, _)| *name == key).map(|(_, value)| value.as_str())
	}

	/// Returns the value of the first form field named `key`.
	pub fn form_value(&self, key: &str) -> Option<&str> {
		self.form.iter().find(|(name, _)| *name == key).map(|(_, value)| value.as_str())
	}
}
impl Debug for ProviderRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let query_keys = self.query.iter().map(|(key, _)| *key).collect::<Vec<_>>();
		let form_keys = self.form.iter().map(|(key, _)| *key).collect::<Vec<_>>();

		f.debug_struct("ProviderRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("query", &query_keys)
			.field("form", &form_keys)
			.finish()
	}
}

/// Raw provider response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpReply {
	/// HTTP status code.
	pub status: u16,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl HttpReply {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Lossy UTF-8 preview of the body, truncated for log output.
	pub fn body_preview(&self) -> String {
		let body = String::from_utf8_lossy(&self.body);

		if body.chars().count() <= Self::BODY_PREVIEW_LIMIT {
			return body.into_owned();
		}

		let mut buf = body.chars().take(Self::BODY_PREVIEW_LIMIT).collect::<String>();

		buf.push('…');

		buf
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl ProviderHttpClient for ReqwestHttpClient {
	fn execute(&self, request: ProviderRequest) -> HttpFuture<'_> {
		Box::pin(async move {
			let ProviderRequest { method, url, query, form } = request;
			let builder = match method {
				HttpMethod::Get => self.0.get(url),
				HttpMethod::PostForm => self.0.post(url).form(&form),
			};
			let response = builder.query(&query).send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(HttpReply { status, body })
		})
	}
}
