//! Crate-level error types shared across flows, the session monitor, and stores.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical session error exposed by public APIs.
///
/// Every failure path transitions the session to a well-defined state before the error
/// surfaces: either the stored tokens remain valid (the session stays authenticated) or
/// they have been cleared (the session is unauthenticated). "Unknown" is never a terminal
/// state.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Redirect-away navigation was rejected by the host shell.
	#[error(transparent)]
	Navigation(#[from] crate::shell::NavigateError),
	/// Access token payload could not be decoded.
	#[error(transparent)]
	InvalidToken(#[from] crate::token::ClaimsError),

	/// The identity provider reported an error on the callback redirect.
	#[error("Identity provider rejected the authorization request: {reason}.")]
	Authorization {
		/// Error code or description forwarded by the provider.
		reason: String,
	},
	/// Callback `state` does not match the stored nonce; possible forgery or replay.
	#[error("Authorization callback state does not match the pending request.")]
	StateMismatch,
	/// Token endpoint rejected the authorization-code exchange.
	#[error("Authorization code exchange failed: {body}.")]
	TokenExchange {
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Response body (or a summary of it) returned by the token endpoint.
		body: String,
	},
	/// Token endpoint rejected the refresh grant.
	#[error("Token refresh failed: {body}.")]
	TokenRefresh {
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Response body (or a summary of it) returned by the token endpoint.
		body: String,
	},
	/// Backend answered 401; the session is invalid server-side.
	#[error("Authentication is required for this request.")]
	AuthenticationRequired,
	/// Backend answered 403, or the resolved role does not match the required one.
	#[error("Access denied: {reason}.")]
	AccessDenied {
		/// Backend- or guard-supplied reason string.
		reason: String,
	},
	/// Backend answered with an unexpected non-2xx status.
	#[error("Request failed with status {status}: {body}.")]
	Request {
		/// HTTP status code of the response.
		status: u16,
		/// Parsed or raw response body.
		body: String,
	},
}

/// Configuration and validation failures raised at runtime.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// An endpoint URL was rejected by the OAuth client layer.
	#[error("Endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<reqwest::Error> for ConfigError {
	fn from(e: reqwest::Error) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the remote endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as StdError;
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn store_error_converts_into_session_error_with_source() {
		let store_error = StoreError::Backend { message: "storage unavailable".into() };
		let session_error: Error = store_error.clone().into();

		assert!(matches!(session_error, Error::Storage(_)));
		assert!(session_error.to_string().contains("storage unavailable"));

		let source = StdError::source(&session_error)
			.expect("Session error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn protocol_errors_render_their_payloads() {
		let exchange = Error::TokenExchange { status: Some(400), body: "invalid_grant".into() };

		assert!(exchange.to_string().contains("invalid_grant"));

		let denied = Error::AccessDenied { reason: "insufficient role".into() };

		assert!(denied.to_string().contains("insufficient role"));
	}
}
