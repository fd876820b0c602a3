//! Authenticated backend requests with 401 redirect deduplication.
//!
//! [`ApiClient::request`] is the single outbound contract feature views use to call the
//! backend: the session is resolved (and silently refreshed) first, the bearer token is
//! attached when present, and responses are parsed as JSON. A 401 means the session is
//! invalid server-side—local tokens are dropped and at most one redirect to sign-in is
//! started across any number of concurrent failures. A 403 is an authorization problem
//! with a valid session: surfaced as access denied, tokens untouched, no redirect.
//!
//! Requests aborted by the host (dropping the future on navigation) never reach the
//! status handling below, so an abandoned 401 cannot trigger a stray redirect.

// crates.io
use reqwest::{
	Method,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
	flow::SessionClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Options for a single backend request.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
	/// HTTP method (defaults to GET).
	pub method: Method,
	/// JSON body to send.
	pub body: Option<Value>,
	/// Additional headers as name/value pairs.
	pub headers: Vec<(String, String)>,
}
impl RequestOptions {
	/// GET request with no body.
	pub fn get() -> Self {
		Self::default()
	}

	/// Request with the provided method and no body.
	pub fn method(method: Method) -> Self {
		Self { method, ..Self::default() }
	}

	/// Attaches a JSON body.
	pub fn with_body(mut self, body: Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Appends a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}
}

/// Backend client that applies authentication to every request.
#[derive(Clone, Debug)]
pub struct ApiClient {
	session: Arc<SessionClient>,
	http_client: ReqwestClient,
	base: Url,
}
impl ApiClient {
	/// Creates a client with a default reqwest transport.
	pub fn new(session: Arc<SessionClient>, base: Url) -> Self {
		Self::with_http_client(session, base, ReqwestClient::new())
	}

	/// Creates a client that reuses the caller-provided reqwest transport.
	pub fn with_http_client(session: Arc<SessionClient>, base: Url, http_client: ReqwestClient) -> Self {
		Self { session, http_client, base }
	}

	/// Performs an authenticated request and returns the parsed JSON body.
	pub async fn request(&self, path: &str, options: RequestOptions) -> Result<Value> {
		const KIND: FlowKind = FlowKind::Request;

		let span = FlowSpan::new(KIND, "request");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.dispatch(path, options)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn dispatch(&self, path: &str, options: RequestOptions) -> Result<Value> {
		// Resolve the session first so an expired-but-refreshable token is rotated
		// before the request goes out.
		let session = self.session.check_session().await?;
		let url =
			self.base.join(path).map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let mut request =
			self.http_client.request(options.method, url).header(ACCEPT, "application/json");

		if session.is_authenticated()
			&& let Some(pair) = self.session.store.load_tokens()?
		{
			request =
				request.header(AUTHORIZATION, format!("Bearer {}", pair.access_token.expose()));
		}

		for (name, value) in &options.headers {
			request = request.header(name.as_str(), value.as_str());
		}
		if let Some(body) = &options.body {
			request = request.header(CONTENT_TYPE, "application/json").body(body.to_string());
		}

		let response = request.send().await.map_err(TransportError::from)?;
		let status = response.status();
		let text = response.text().await.map_err(TransportError::from)?;

		match status.as_u16() {
			401 => {
				self.handle_unauthorized().await;

				Err(Error::AuthenticationRequired)
			},
			403 => Err(Error::AccessDenied { reason: summarize(&text) }),
			code if !status.is_success() =>
				Err(Error::Request { status: code, body: summarize(&text) }),
			_ => Ok(parse_body(&text)),
		}
	}

	async fn handle_unauthorized(&self) {
		// Invalid server-side: drop local tokens regardless of who wins the redirect.
		let _ = self.session.store.clear_tokens();

		if self.session.redirect_guard.try_acquire() {
			let location = self.session.navigator.current_location();
			let result = self.session.begin_sign_in(location).await;

			// Clear-on-settle: the slot reopens once the attempt finished, even when the
			// shell rejected the navigation.
			self.session.redirect_guard.settle();

			if let Err(_err) = result {
				#[cfg(feature = "tracing")]
				tracing::warn!(error = %_err, "Sign-in redirect after a 401 failed.");
			}
		}
	}
}

fn summarize(text: &str) -> String {
	if text.is_empty() {
		return "empty response body".into();
	}

	match serde_json::from_str::<Value>(text) {
		Ok(Value::Object(map)) => map
			.get("message")
			.and_then(Value::as_str)
			.map(str::to_owned)
			.unwrap_or_else(|| text.to_owned()),
		_ => text.to_owned(),
	}
}

fn parse_body(text: &str) -> Value {
	if text.is_empty() {
		return Value::Null;
	}

	serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_owned()))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn summaries_prefer_the_message_field() {
		assert_eq!(summarize(r#"{"message":"out of stock"}"#), "out of stock");
		assert_eq!(summarize(r#"{"code":42}"#), r#"{"code":42}"#);
		assert_eq!(summarize("plain text"), "plain text");
		assert_eq!(summarize(""), "empty response body");
	}

	#[test]
	fn bodies_parse_as_json_with_text_fallback() {
		assert_eq!(parse_body(""), Value::Null);
		assert_eq!(parse_body("[1,2]"), serde_json::json!([1, 2]));
		assert_eq!(parse_body("not json"), Value::String("not json".into()));
	}
}
