//! Sign-in flow orchestration around the [`SessionClient`] facade.
//!
//! The facade owns the injected storage and navigation seams, the configured token
//! endpoint, and the two concurrency guards the protocol needs: a refresh gate so token
//! rotation never runs twice at once, and a [`RedirectGuard`] so a burst of 401s
//! produces a single redirect to the provider.

pub mod authorize;
pub mod callback;
pub mod logout;

pub use authorize::{PkceCodeChallengeMethod, PkcePair};
pub use callback::{CallbackParams, SignInOutcome};

// std
use std::sync::atomic::{AtomicBool, Ordering};
// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	monitor::MonitorMetrics,
	oauth::TokenEndpoint,
	shell::Navigator,
	store::SessionStore,
};

/// Coordinates the sign-in, callback, refresh, and sign-out flows for one client.
///
/// The client is cheap to share behind an [`Arc`]; all interior state is synchronized.
/// [`ApiClient`](crate::api::ApiClient) and [`RouteGuard`](crate::guard::RouteGuard)
/// both operate on a shared handle.
pub struct SessionClient {
	/// Validated client configuration.
	pub config: ClientConfig,
	/// Injected persistence backend.
	pub store: Arc<dyn SessionStore>,
	/// Injected shell navigation.
	pub navigator: Arc<dyn Navigator>,
	/// Counters describing session checks and refresh outcomes.
	pub monitor_metrics: Arc<MonitorMetrics>,
	pub(crate) token_endpoint: TokenEndpoint,
	pub(crate) refresh_gate: AsyncMutex<()>,
	pub(crate) redirect_guard: RedirectGuard,
}
impl SessionClient {
	/// Creates a client with a default reqwest transport.
	pub fn new(
		config: ClientConfig,
		store: Arc<dyn SessionStore>,
		navigator: Arc<dyn Navigator>,
	) -> Result<Self> {
		Self::with_http_client(config, store, navigator, ReqwestClient::new())
	}

	/// Creates a client that reuses the caller-provided reqwest transport.
	pub fn with_http_client(
		config: ClientConfig,
		store: Arc<dyn SessionStore>,
		navigator: Arc<dyn Navigator>,
		http_client: ReqwestClient,
	) -> Result<Self> {
		let token_endpoint = TokenEndpoint::from_config(&config, http_client)?;

		Ok(Self {
			config,
			store,
			navigator,
			monitor_metrics: Default::default(),
			token_endpoint,
			refresh_gate: AsyncMutex::new(()),
			redirect_guard: RedirectGuard::default(),
		})
	}
}
impl Debug for SessionClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionClient")
			.field("issuer", &self.config.issuer)
			.field("client_id", &self.config.client_id)
			.field("redirect_in_flight", &self.redirect_guard.in_flight())
			.finish_non_exhaustive()
	}
}

/// Single-slot in-flight guard deduplicating the 401 sign-in redirect.
///
/// The first caller that observes an invalid session acquires the slot and starts the
/// redirect; concurrent callers see the slot taken and skip re-triggering. The slot is
/// released once the navigation attempt settles—including when the shell rejects it—so
/// a later "session became invalid" episode can redirect again.
#[derive(Debug, Default)]
pub struct RedirectGuard(AtomicBool);
impl RedirectGuard {
	/// Attempts to take the slot; returns `true` for exactly one concurrent caller.
	pub fn try_acquire(&self) -> bool {
		!self.0.swap(true, Ordering::SeqCst)
	}

	/// Releases the slot after the redirect attempt settled.
	pub fn settle(&self) {
		self.0.store(false, Ordering::SeqCst);
	}

	/// Returns `true` while a redirect attempt is outstanding.
	pub fn in_flight(&self) -> bool {
		self.0.load(Ordering::SeqCst)
	}
}
