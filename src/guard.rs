//! Render-time route gating by authentication state and role.
//!
//! A [`RouteGuard`] is created per mount of a protected view. Each render cycle calls
//! [`resolve`](RouteGuard::resolve); the guard settles from `Checking` into one of the
//! terminal states and tells the host what to draw. An anonymous visitor triggers the
//! sign-in redirect exactly once per mount—re-renders while the navigation is underway
//! keep showing the loading indicator. An authenticated visitor with the wrong role is
//! sent to the neutral route, never back into sign-in.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{_prelude::*, flow::SessionClient};

/// Resolution states for a guarded route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteState {
	/// Session status not yet resolved (e.g. a refresh is in flight).
	Checking,
	/// Visitor is not authenticated; a sign-in redirect has been (or is being) started.
	Anonymous,
	/// Authenticated and, when a role is required, holding it.
	AuthenticatedOk,
	/// Authenticated but the resolved role does not match the required one.
	AuthenticatedWrongRole,
}

/// What the host should render after a resolution step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RouteDecision {
	/// Draw a neutral loading indicator; no content yet.
	Loading,
	/// Draw the guarded content.
	Render,
	/// Navigate to the provided in-app route.
	Redirect(String),
}

/// Per-mount guard deciding between content, loading, and redirects.
pub struct RouteGuard {
	session: Arc<SessionClient>,
	required_role: Option<String>,
	state: Mutex<RouteState>,
	sign_in_started: AtomicBool,
}
impl RouteGuard {
	/// Creates a guard, optionally requiring an exact role match.
	pub fn new(session: Arc<SessionClient>, required_role: Option<String>) -> Self {
		Self {
			session,
			required_role,
			state: Mutex::new(RouteState::Checking),
			sign_in_started: AtomicBool::new(false),
		}
	}

	/// Returns the state reached by the most recent resolution step.
	pub fn state(&self) -> RouteState {
		*self.state.lock()
	}

	/// Resolves the session and returns the render decision for this cycle.
	pub async fn resolve(&self, current_location: &str) -> Result<RouteDecision> {
		let session = self.session.check_session().await?;

		if !session.is_authenticated() {
			*self.state.lock() = RouteState::Anonymous;

			// One redirect per mount, no matter how often the host re-renders.
			if !self.sign_in_started.swap(true, Ordering::SeqCst) {
				self.session.begin_sign_in(current_location).await?;
			}

			return Ok(RouteDecision::Loading);
		}

		match &self.required_role {
			Some(role) if !session.has_role(role) => {
				*self.state.lock() = RouteState::AuthenticatedWrongRole;

				Ok(RouteDecision::Redirect(self.session.config.neutral_route.clone()))
			},
			_ => {
				*self.state.lock() = RouteState::AuthenticatedOk;

				Ok(RouteDecision::Render)
			},
		}
	}
}
impl Debug for RouteGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RouteGuard")
			.field("required_role", &self.required_role)
			.field("state", &self.state())
			.finish_non_exhaustive()
	}
}
