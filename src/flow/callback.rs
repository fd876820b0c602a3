//! Callback handling: state validation and the code-for-token exchange.

// self
use crate::{
	_prelude::*,
	flow::SessionClient,
	monitor::Session,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	token::TokenPair,
};

/// Query parameters delivered to the callback route by the identity provider.
#[derive(Clone, Debug, Default)]
pub struct CallbackParams {
	/// Authorization code, on success.
	pub code: Option<String>,
	/// Echoed anti-forgery state nonce.
	pub state: Option<String>,
	/// Provider error code, when the authorization request was rejected.
	pub error: Option<String>,
	/// Optional human-readable error detail.
	pub error_description: Option<String>,
}
impl CallbackParams {
	/// Extracts the callback parameters from the redirect URL.
	pub fn from_url(url: &Url) -> Self {
		let mut params = Self::default();

		for (key, value) in url.query_pairs() {
			match key.as_ref() {
				"code" => params.code = Some(value.into_owned()),
				"state" => params.state = Some(value.into_owned()),
				"error" => params.error = Some(value.into_owned()),
				"error_description" => params.error_description = Some(value.into_owned()),
				_ => {},
			}
		}

		params
	}
}

/// Result of a completed sign-in round trip.
#[derive(Clone, Debug)]
pub struct SignInOutcome {
	/// The authenticated session derived from the freshly issued tokens.
	pub session: Session,
	/// In-app location the caller should navigate to.
	pub return_to: String,
}

impl SessionClient {
	/// Completes the sign-in round trip after the provider redirected back.
	///
	/// The pending request is consumed before anything else happens, so a replayed
	/// callback finds no stored state and is rejected without a network call. The
	/// standalone return URL is likewise consumed exactly once, whether or not it ends
	/// up being used.
	pub async fn complete_sign_in(&self, params: CallbackParams) -> Result<SignInOutcome> {
		const KIND: FlowKind = FlowKind::Exchange;

		let span = FlowSpan::new(KIND, "complete_sign_in");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				if let Some(error) = params.error {
					let reason = match params.error_description {
						Some(description) => format!("{error}: {description}"),
						None => error,
					};

					return Err(Error::Authorization { reason });
				}

				let code = params.code.ok_or_else(|| Error::Authorization {
					reason: "no authorization code received".into(),
				})?;
				let pending = self.store.take_pending()?.ok_or(Error::StateMismatch)?;

				if params.state.as_deref() != Some(pending.state.as_str()) {
					return Err(Error::StateMismatch);
				}

				let issued = self
					.token_endpoint
					.exchange_code(&code, pending.code_verifier.expose())
					.await?;
				let pair = TokenPair::new(issued.access_token, issued.refresh_token);

				self.store.save_tokens(&pair)?;

				let stored = self.store.take_return_url()?;
				let return_to = if pending.return_url.is_empty() {
					stored
						.filter(|url| !url.is_empty())
						.unwrap_or_else(|| self.config.default_route.clone())
				} else {
					pending.return_url
				};
				let claims = match self.decode_claims(&pair) {
					Ok(claims) => claims,
					Err(err) => {
						let _ = self.store.clear_tokens();

						return Err(err.into());
					},
				};

				Ok(SignInOutcome { session: Session::authenticated(claims), return_to })
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
