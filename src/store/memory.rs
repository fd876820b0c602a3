//! Thread-safe in-memory [`SessionStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{PendingAuthRequest, SessionStore, StoreError},
	token::TokenPair,
};

#[derive(Clone, Debug, Default)]
struct StoreState {
	tokens: Option<TokenPair>,
	pending: Option<PendingAuthRequest>,
	return_url: Option<String>,
}

/// Keeps session state in-process; the in-memory stand-in for origin-scoped browser
/// storage used by tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<StoreState>>);
impl SessionStore for MemoryStore {
	fn load_tokens(&self) -> Result<Option<TokenPair>, StoreError> {
		Ok(self.0.read().tokens.clone())
	}

	fn save_tokens(&self, tokens: &TokenPair) -> Result<(), StoreError> {
		self.0.write().tokens = Some(tokens.clone());

		Ok(())
	}

	fn clear_tokens(&self) -> Result<(), StoreError> {
		self.0.write().tokens = None;

		Ok(())
	}

	fn save_pending(&self, pending: &PendingAuthRequest) -> Result<(), StoreError> {
		self.0.write().pending = Some(pending.clone());

		Ok(())
	}

	fn take_pending(&self) -> Result<Option<PendingAuthRequest>, StoreError> {
		Ok(self.0.write().pending.take())
	}

	fn save_return_url(&self, url: &str) -> Result<(), StoreError> {
		self.0.write().return_url = Some(url.to_owned());

		Ok(())
	}

	fn take_return_url(&self) -> Result<Option<String>, StoreError> {
		Ok(self.0.write().return_url.take())
	}
}
