mod common;

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use time::{Duration, OffsetDateTime};
use url::Url;
// self
use oidc_session::{
	api::{ApiClient, RequestOptions},
	error::Error,
	reqwest::Method,
	store::SessionStore,
	token::TokenPair,
};

fn api_for(server: &MockServer, session: Arc<oidc_session::flow::SessionClient>) -> ApiClient {
	let base = Url::parse(&server.base_url()).expect("Mock backend URL should parse.");

	ApiClient::new(session, base)
}

#[tokio::test]
async fn bearer_token_is_attached_to_authenticated_requests() {
	let server = MockServer::start_async().await;
	let (client, store, _) = common::build_client(&server);
	let token =
		common::access_token("user-1", "USER", OffsetDateTime::now_utc() + Duration::hours(1));

	store
		.save_tokens(&TokenPair::new(token.clone(), None::<String>))
		.expect("Token fixture should save.");

	let mock = server
		.mock_async(move |when, then| {
			when.method(GET)
				.path("/api/profile")
				.header("authorization", format!("Bearer {token}"));
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"email":"user-1"}"#);
		})
		.await;
	let api = api_for(&server, client);
	let body = api.request("/api/profile", RequestOptions::get()).await.expect(
		"An authenticated request should succeed.",
	);

	mock.assert_async().await;

	assert_eq!(body, serde_json::json!({ "email": "user-1" }));
}

#[tokio::test]
async fn concurrent_401_responses_trigger_a_single_redirect() {
	let server = MockServer::start_async().await;
	let (client, store, navigator) = common::build_client(&server);
	let token =
		common::access_token("user-1", "USER", OffsetDateTime::now_utc() + Duration::hours(1));

	store
		.save_tokens(&TokenPair::new(token, None::<String>))
		.expect("Token fixture should save.");
	navigator.set_location("/orders");

	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/orders");
			then.status(401);
		})
		.await;
	let api = api_for(&server, client.clone());
	let (first, second, third) = tokio::join!(
		api.request("/api/orders", RequestOptions::get()),
		api.request("/api/orders", RequestOptions::get()),
		api.request("/api/orders", RequestOptions::get()),
	);

	for result in [first, second, third] {
		assert!(matches!(
			result.expect_err("Every 401 response must surface as authentication required."),
			Error::AuthenticationRequired
		));
	}

	assert_eq!(mock.hits_async().await, 3);
	assert_eq!(
		navigator.navigations().len(),
		1,
		"Concurrent 401s must produce exactly one redirect to sign-in.",
	);
	assert!(
		store.load_tokens().expect("Token load should succeed.").is_none(),
		"A 401 invalidates the local session.",
	);
	assert_eq!(
		store
			.take_pending()
			.expect("Pending load should succeed.")
			.expect("The redirect must persist a pending request.")
			.return_url,
		"/orders",
		"The redirect must capture the current location as the return URL.",
	);

	// The slot settled after the redirect; a later 401 episode redirects again.
	let err = api
		.request("/api/orders", RequestOptions::get())
		.await
		.expect_err("The follow-up 401 must also fail.");

	assert!(matches!(err, Error::AuthenticationRequired));
	assert_eq!(navigator.navigations().len(), 2);
}

#[tokio::test]
async fn forbidden_responses_keep_the_session_intact() {
	let server = MockServer::start_async().await;
	let (client, store, navigator) = common::build_client(&server);
	let token =
		common::access_token("user-1", "USER", OffsetDateTime::now_utc() + Duration::hours(1));

	store
		.save_tokens(&TokenPair::new(token, None::<String>))
		.expect("Token fixture should save.");

	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/admin/products");
			then.status(403)
				.header("content-type", "application/json")
				.body(r#"{"message":"admin role required"}"#);
		})
		.await;
	let api = api_for(&server, client);
	let err = api
		.request("/api/admin/products", RequestOptions::method(Method::POST))
		.await
		.expect_err("A 403 must surface as access denied.");

	assert!(matches!(err, Error::AccessDenied { ref reason } if reason == "admin role required"));
	assert!(
		store.load_tokens().expect("Token load should succeed.").is_some(),
		"A 403 must not clear the session: the user is signed in, just not allowed.",
	);
	assert!(navigator.navigations().is_empty(), "A 403 must not trigger a sign-in redirect.");
}

#[tokio::test]
async fn other_failures_carry_the_response_body() {
	let server = MockServer::start_async().await;
	let (client, _, _) = common::build_client(&server);
	let _mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/products");
			then.status(500)
				.header("content-type", "application/json")
				.body(r#"{"message":"database unavailable"}"#);
		})
		.await;
	let api = api_for(&server, client);
	let err = api
		.request("/api/products", RequestOptions::get())
		.await
		.expect_err("A 500 must surface as a request failure.");

	assert!(matches!(
		err,
		Error::Request { status: 500, ref body } if body == "database unavailable"
	));
}

#[tokio::test]
async fn empty_bodies_parse_as_null_and_anonymous_requests_pass_through() {
	let server = MockServer::start_async().await;
	let (client, _, _) = common::build_client(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/products");
			then.status(200);
		})
		.await;
	let api = api_for(&server, client);
	let body = api
		.request("/api/products", RequestOptions::get())
		.await
		.expect("A public endpoint should succeed without a session.");

	mock.assert_async().await;

	assert_eq!(body, serde_json::Value::Null);
}

#[tokio::test]
async fn request_bodies_are_sent_as_json() {
	let server = MockServer::start_async().await;
	let (client, store, _) = common::build_client(&server);
	let token =
		common::access_token("user-1", "USER", OffsetDateTime::now_utc() + Duration::hours(1));

	store
		.save_tokens(&TokenPair::new(token, None::<String>))
		.expect("Token fixture should save.");

	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/checkout")
				.header("content-type", "application/json")
				.body(r#"{"quantity":2,"sku":"widget"}"#);
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"order":"ord-1"}"#);
		})
		.await;
	let api = api_for(&server, client);
	let options = RequestOptions::method(Method::POST)
		.with_body(serde_json::json!({ "sku": "widget", "quantity": 2 }));
	let body = api.request("/api/checkout", options).await.expect("Checkout should succeed.");

	mock.assert_async().await;

	assert_eq!(body, serde_json::json!({ "order": "ord-1" }));
}
