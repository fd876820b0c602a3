//! Shared fixtures for integration tests: a mock-provider-backed client and JWT helpers.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use httpmock::MockServer;
use time::OffsetDateTime;
use url::Url;
// self
use oidc_session::{
	config::ClientConfig,
	flow::SessionClient,
	shell::RecordingNavigator,
	store::MemoryStore,
};

/// Builds a configuration whose issuer points at the mock provider.
pub fn config_for(server: &MockServer) -> ClientConfig {
	ClientConfig::builder()
		.issuer(Url::parse(&server.base_url()).expect("Mock issuer URL should parse."))
		.client_id("webapp")
		.redirect_uri(
			Url::parse("https://app.example.com/callback")
				.expect("Redirect URI fixture should parse."),
		)
		.scopes(["openid", "profile", "read", "write"])
		.build()
		.expect("Mock configuration should build.")
}

/// Constructs a [`SessionClient`] backed by an in-memory store and a recording navigator.
pub fn build_client(
	server: &MockServer,
) -> (Arc<SessionClient>, Arc<MemoryStore>, Arc<RecordingNavigator>) {
	let store = Arc::new(MemoryStore::default());
	let navigator = Arc::new(RecordingNavigator::new("/shop"));
	let client = Arc::new(
		SessionClient::new(config_for(server), store.clone(), navigator.clone())
			.expect("Session client should build against the mock provider."),
	);

	(client, store, navigator)
}

/// Builds an unsigned JWT access token with the provided subject, role, and expiry.
pub fn access_token(subject: &str, role: &str, expires_at: OffsetDateTime) -> String {
	let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(
		serde_json::json!({
			"sub": subject,
			"role": role,
			"exp": expires_at.unix_timestamp(),
		})
		.to_string(),
	);

	format!("{header}.{payload}.signature")
}

/// JSON token endpoint response body carrying the provided tokens.
pub fn token_response_body(access_token: &str, refresh_token: Option<&str>) -> String {
	let mut body = serde_json::json!({
		"access_token": access_token,
		"token_type": "bearer",
		"expires_in": 3600,
	});

	if let Some(refresh) = refresh_token {
		body["refresh_token"] = serde_json::Value::String(refresh.into());
	}

	body.to_string()
}
