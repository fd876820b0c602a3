//! Storage contracts and built-in backends for session state.
//!
//! A [`SessionStore`] is the crate's only durable surface: it holds the token pair, the
//! pending authorization request written immediately before navigating to the identity
//! provider, and a standalone one-shot return URL. Pending request and return URL follow
//! take semantics—read and cleared in a single call—so a completed callback can never be
//! replayed against stale material.
//!
//! The trait is synchronous on purpose. Expiry checks, refresh decisions, and one-shot
//! consumption are read-modify-write sequences that must not be interleaved with other
//! session mutations; keeping store calls free of suspension points preserves that
//! guarantee under cooperative scheduling.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	token::{TokenPair, TokenSecret},
};

/// Persistence contract implemented by session storage backends.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Returns the stored token pair, if any.
	fn load_tokens(&self) -> Result<Option<TokenPair>, StoreError>;

	/// Persists or replaces the token pair as a single record.
	fn save_tokens(&self, tokens: &TokenPair) -> Result<(), StoreError>;

	/// Removes both access and refresh tokens.
	fn clear_tokens(&self) -> Result<(), StoreError>;

	/// Persists the pending authorization request, replacing any previous one.
	fn save_pending(&self, pending: &PendingAuthRequest) -> Result<(), StoreError>;

	/// Returns and clears the pending authorization request in one step.
	fn take_pending(&self) -> Result<Option<PendingAuthRequest>, StoreError>;

	/// Persists the one-shot return URL, replacing any previous one.
	fn save_return_url(&self, url: &str) -> Result<(), StoreError>;

	/// Returns and clears the one-shot return URL in one step.
	fn take_return_url(&self) -> Result<Option<String>, StoreError>;
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Handshake material persisted between the redirect to the provider and the callback.
///
/// Written exactly once per sign-in attempt, immediately before navigating away, and
/// consumed exactly once by the callback exchange. The `state` nonce must round-trip via
/// the provider unchanged; the verifier never leaves the store until the code exchange.
#[derive(Clone, Serialize, Deserialize)]
pub struct PendingAuthRequest {
	/// Anti-forgery nonce that the callback must echo.
	pub state: String,
	/// PKCE code verifier backing the challenge sent in the authorization URL.
	pub code_verifier: TokenSecret,
	/// In-app location to resume once the round trip completes.
	pub return_url: String,
	/// Instant the request was created, for diagnostics.
	pub created_at: OffsetDateTime,
}
impl Debug for PendingAuthRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PendingAuthRequest")
			.field("state", &self.state)
			.field("code_verifier", &"<redacted>")
			.field("return_url", &self.return_url)
			.field("created_at", &self.created_at)
			.finish()
	}
}
