//! Token endpoint facade over the `oauth2` client.
//!
//! The session core is a public client: possession of the authorization code is proven
//! via PKCE, so no client secret is ever configured and `client_id` travels in the form
//! body. Exchange and refresh failures are mapped into the crate taxonomy with the HTTP
//! status captured by the instrumented transport.

// crates.io
use oauth2::{
	AuthUrl, AuthorizationCode, ClientId, EndpointNotSet, EndpointSet, HttpClientError,
	PkceCodeVerifier, RedirectUrl, RefreshToken, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	error::{ConfigError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenTransport},
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Grants issued against the token endpoint; keys error attribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TokenGrant {
	AuthorizationCode,
	RefreshToken,
}

/// Raw token material returned by a successful endpoint call.
#[derive(Clone)]
pub(crate) struct IssuedTokens {
	pub(crate) access_token: String,
	pub(crate) refresh_token: Option<String>,
}

/// Configured `oauth2` client plus the instrumented transport it runs on.
pub(crate) struct TokenEndpoint {
	oauth_client: ConfiguredBasicClient,
	transport: TokenTransport,
}
impl TokenEndpoint {
	pub(crate) fn from_config(config: &ClientConfig, http_client: ReqwestClient) -> Result<Self> {
		let auth_url = AuthUrl::new(config.authorization_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let token_url = TokenUrl::new(config.token_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let redirect_url = RedirectUrl::new(config.redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let oauth_client = BasicClient::new(ClientId::new(config.client_id.clone()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url);

		Ok(Self { oauth_client, transport: TokenTransport::new(http_client) })
	}

	/// Exchanges an authorization code plus PKCE verifier for a token pair.
	pub(crate) async fn exchange_code(&self, code: &str, verifier: &str) -> Result<IssuedTokens> {
		let meta = ResponseMetadataSlot::default();
		let handle = self.transport.handle(meta.clone());
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.set_pkce_verifier(PkceCodeVerifier::new(verifier.to_owned()))
			.request_async(&handle)
			.await
			.map_err(|err| map_request_error(TokenGrant::AuthorizationCode, meta.take(), err))?;

		Ok(issued_from(&response))
	}

	/// Performs the `refresh_token` grant.
	pub(crate) async fn refresh(&self, refresh_token: &str) -> Result<IssuedTokens> {
		let meta = ResponseMetadataSlot::default();
		let handle = self.transport.handle(meta.clone());
		let secret = RefreshToken::new(refresh_token.to_owned());
		let response = self
			.oauth_client
			.exchange_refresh_token(&secret)
			.request_async(&handle)
			.await
			.map_err(|err| map_request_error(TokenGrant::RefreshToken, meta.take(), err))?;

		Ok(issued_from(&response))
	}
}
impl Debug for TokenEndpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenEndpoint").finish_non_exhaustive()
	}
}

fn issued_from(response: &oauth2::basic::BasicTokenResponse) -> IssuedTokens {
	IssuedTokens {
		access_token: response.access_token().secret().to_owned(),
		refresh_token: response.refresh_token().map(|token| token.secret().to_owned()),
	}
}

fn map_request_error(
	grant: TokenGrant,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	let status = meta.and_then(|value| value.status);

	match err {
		RequestTokenError::ServerResponse(response) => {
			let body = match response.error_description() {
				Some(description) => format!("{} ({description})", response.error().as_ref()),
				None => response.error().as_ref().to_owned(),
			};

			grant_error(grant, status, body)
		},
		RequestTokenError::Parse(_, body) =>
			grant_error(grant, status, String::from_utf8_lossy(&body).into_owned()),
		RequestTokenError::Request(error) => map_transport_error(error),
		RequestTokenError::Other(message) => grant_error(grant, status, message),
	}
}

fn grant_error(grant: TokenGrant, status: Option<u16>, body: String) -> Error {
	match grant {
		TokenGrant::AuthorizationCode => Error::TokenExchange { status, body },
		TokenGrant::RefreshToken => Error::TokenRefresh { status, body },
	}
}

fn map_transport_error(err: HttpClientError<ReqwestError>) -> Error {
	match err {
		HttpClientError::Reqwest(inner) => TransportError::from(*inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransportError::Network { source: message.into() }.into(),
		_ => TransportError::Network { source: "unknown transport failure".into() }.into(),
	}
}
