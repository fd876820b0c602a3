//! Session monitoring: expiry detection, silent refresh, and the periodic watcher.
//!
//! [`SessionClient::check_session`] is the single entry point for "is this user signed
//! in": it decodes the current access token, treats tokens expiring within the
//! configured leeway as already expired, and silently refreshes when a refresh token is
//! available. Refresh runs behind a singleflight gate—callers that arrive while a
//! rotation is in flight await it and reuse the rotated pair instead of issuing a second
//! grant. A refresh failure clears all tokens and is never retried for the same failure;
//! the caller ends up cleanly unauthenticated, not in limbo.

mod metrics;

pub use metrics::MonitorMetrics;

// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	flow::SessionClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	token::{Claims, ClaimsError, TokenPair},
};

/// Session status derived from the stored tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
	/// A decodable, unexpired (or freshly refreshed) access token is present.
	Authenticated,
	/// No usable token material remains.
	Unauthenticated,
}

/// Point-in-time session snapshot; computed on every check, never persisted.
#[derive(Clone, Debug)]
pub struct Session {
	/// Authentication status at the instant of the check.
	pub status: SessionStatus,
	/// Claims decoded from the access token, present iff authenticated.
	pub claims: Option<Claims>,
}
impl Session {
	/// Builds an authenticated session around decoded claims.
	pub fn authenticated(claims: Claims) -> Self {
		Self { status: SessionStatus::Authenticated, claims: Some(claims) }
	}

	/// Builds the unauthenticated session.
	pub fn unauthenticated() -> Self {
		Self { status: SessionStatus::Unauthenticated, claims: None }
	}

	/// Returns `true` when the session is authenticated.
	pub fn is_authenticated(&self) -> bool {
		matches!(self.status, SessionStatus::Authenticated)
	}

	/// Returns `true` when the resolved role equals `role`.
	pub fn has_role(&self, role: &str) -> bool {
		self.claims.as_ref().is_some_and(|claims| claims.role == role)
	}
}

impl SessionClient {
	/// Computes the current session, refreshing expired tokens when possible.
	pub async fn check_session(&self) -> Result<Session> {
		self.monitor_metrics.record_check();

		let Some(pair) = self.store.load_tokens()? else {
			return Ok(Session::unauthenticated());
		};
		let now = OffsetDateTime::now_utc();

		match self.decode_claims(&pair) {
			Ok(claims) if !claims.is_expired_at(now, self.config.expiry_leeway) =>
				Ok(Session::authenticated(claims)),
			Ok(_) => self.refresh_expired_session(pair).await,
			Err(_) => {
				// Undecodable token: treat as signed out rather than crashing.
				self.store.clear_tokens()?;

				Ok(Session::unauthenticated())
			},
		}
	}

	async fn refresh_expired_session(&self, pair: TokenPair) -> Result<Session> {
		if pair.refresh_token.is_none() {
			self.store.clear_tokens()?;

			return Ok(Session::unauthenticated());
		}

		match self.refresh().await {
			Ok(rotated) => match self.decode_claims(&rotated) {
				Ok(claims) => Ok(Session::authenticated(claims)),
				Err(_) => {
					self.store.clear_tokens()?;

					Ok(Session::unauthenticated())
				},
			},
			// The provider rejected the grant and the tokens are already gone; the
			// caller is cleanly signed out.
			Err(Error::TokenRefresh { .. } | Error::AuthenticationRequired) =>
				Ok(Session::unauthenticated()),
			Err(err) => Err(err),
		}
	}

	/// Rotates the stored token pair; at most one refresh is outstanding at a time.
	pub async fn refresh(&self) -> Result<TokenPair> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _gate = self.refresh_gate.lock().await;

				self.monitor_metrics.record_refresh_attempt();

				let pair = self.store.load_tokens()?.ok_or(Error::AuthenticationRequired)?;
				let now = OffsetDateTime::now_utc();

				// A previous gate holder may have rotated the pair while we waited.
				if let Ok(claims) = self.decode_claims(&pair)
					&& !claims.is_expired_at(now, self.config.expiry_leeway)
				{
					self.monitor_metrics.record_refresh_success();

					return Ok(pair);
				}

				let Some(refresh_token) = pair.refresh_token.clone() else {
					self.store.clear_tokens()?;
					self.monitor_metrics.record_refresh_failure();

					return Err(Error::AuthenticationRequired);
				};

				match self.token_endpoint.refresh(refresh_token.expose()).await {
					Ok(issued) => {
						let rotated = pair.rotated(issued.access_token, issued.refresh_token);

						// One atomic replacement of the whole pair.
						self.store.save_tokens(&rotated)?;
						self.monitor_metrics.record_refresh_success();

						Ok(rotated)
					},
					Err(err) => {
						// Terminal for this session; the same failure is never retried.
						self.store.clear_tokens()?;
						self.monitor_metrics.record_refresh_failure();

						Err(err)
					},
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Runs [`check_session`](Self::check_session) immediately and then on every tick.
	///
	/// The future never resolves on its own; dropping or aborting it cancels the timer,
	/// which is how an owning context ends monitoring.
	pub async fn watch(&self, period: StdDuration) {
		let mut ticker = tokio::time::interval(period);

		ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

		loop {
			ticker.tick().await;

			if let Err(_err) = self.check_session().await {
				#[cfg(feature = "tracing")]
				tracing::warn!(error = %_err, "Periodic session check failed.");
			}
		}
	}

	pub(crate) fn decode_claims(&self, pair: &TokenPair) -> Result<Claims, ClaimsError> {
		crate::token::claims::decode(
			pair.access_token.expose(),
			&self.config.role_rules,
			&self.config.default_role,
		)
	}
}
