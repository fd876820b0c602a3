//! Authorization redirect construction: PKCE material, the state nonce, and the
//! navigate-away step that starts every sign-in round trip.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	flow::SessionClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::PendingAuthRequest,
	token::TokenSecret,
};

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;
// RFC 3986 unreserved characters; RFC 7636 restricts verifiers to exactly this set.
const UNRESERVED: &[u8] =
	b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Supported PKCE challenge methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// PKCE verifier/challenge pair backing one authorization attempt.
///
/// Only the challenge travels in the authorization URL; the verifier goes into storage
/// and resurfaces solely during the code exchange.
#[derive(Clone)]
pub struct PkcePair {
	verifier: String,
	challenge: String,
	method: PkceCodeChallengeMethod,
}
impl PkcePair {
	/// Generates a fresh verifier and its derived challenge.
	pub fn generate() -> Self {
		let verifier = random_string(PKCE_VERIFIER_LEN);
		let challenge = compute_challenge(&verifier);

		Self { verifier, challenge, method: PkceCodeChallengeMethod::S256 }
	}

	/// PKCE code challenge derived from the secret verifier.
	pub fn challenge(&self) -> &str {
		&self.challenge
	}

	/// PKCE challenge method (currently always `S256`).
	pub fn method(&self) -> PkceCodeChallengeMethod {
		self.method
	}

	pub(crate) fn verifier(&self) -> &str {
		&self.verifier
	}
}
impl Debug for PkcePair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PkcePair")
			.field("verifier", &"<redacted>")
			.field("challenge", &self.challenge)
			.field("method", &self.method)
			.finish()
	}
}

impl SessionClient {
	/// Starts the sign-in round trip from `return_url`.
	///
	/// The pending request (state nonce + verifier + return URL) is persisted before the
	/// browser leaves; if persistence fails the flow aborts without navigating, since a
	/// lost verifier would make the callback unrecoverable.
	pub async fn begin_sign_in(&self, return_url: impl Into<String>) -> Result<()> {
		const KIND: FlowKind = FlowKind::Authorize;

		let span = FlowSpan::new(KIND, "begin_sign_in");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let return_url = return_url.into();
		let result = span
			.instrument(async move {
				let pkce = PkcePair::generate();
				let state = random_string(STATE_LEN);
				let pending = PendingAuthRequest {
					state: state.clone(),
					code_verifier: TokenSecret::new(pkce.verifier()),
					return_url: return_url.clone(),
					created_at: OffsetDateTime::now_utc(),
				};

				self.store.save_pending(&pending)?;
				self.store.save_return_url(&return_url)?;

				let url = self.authorize_url(&state, &pkce);

				self.navigator.navigate(&url).await?;

				Ok(())
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	fn authorize_url(&self, state: &str, pkce: &PkcePair) -> Url {
		let mut url = self.config.authorization_endpoint.clone();
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("response_type", "code");
		pairs.append_pair("client_id", &self.config.client_id);
		pairs.append_pair("redirect_uri", self.config.redirect_uri.as_str());
		pairs.append_pair("scope", &self.config.scope_parameter());
		pairs.append_pair("state", state);
		pairs.append_pair("code_challenge", pkce.challenge());
		pairs.append_pair("code_challenge_method", pkce.method().as_str());

		drop(pairs);

		url
	}
}

fn random_string(len: usize) -> String {
	let mut rng = rand::rng();

	(0..len).map(|_| UNRESERVED[rng.random_range(0..UNRESERVED.len())] as char).collect()
}

fn compute_challenge(verifier: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;
	use crate::{
		config::ClientConfig,
		shell::RecordingNavigator,
		store::{MemoryStore, SessionStore, StoreError},
		token::TokenPair,
	};

	fn test_client() -> (SessionClient, Arc<MemoryStore>, Arc<RecordingNavigator>) {
		let config = ClientConfig::builder()
			.issuer(Url::parse("https://id.example.com").expect("Issuer fixture should parse."))
			.client_id("webapp")
			.redirect_uri(
				Url::parse("https://app.example.com/callback")
					.expect("Redirect fixture should parse."),
			)
			.scopes(["openid", "profile", "read"])
			.build()
			.expect("Configuration fixture should build.");
		let store = Arc::new(MemoryStore::default());
		let navigator = Arc::new(RecordingNavigator::new("/"));
		let client = SessionClient::new(config, store.clone(), navigator.clone())
			.expect("Session client should build.");

		(client, store, navigator)
	}

	#[test]
	fn verifiers_stay_inside_the_unreserved_charset() {
		for _ in 0..32 {
			let pair = PkcePair::generate();

			assert!((43..=128).contains(&pair.verifier().len()));
			assert!(pair.verifier().bytes().all(|byte| UNRESERVED.contains(&byte)));
		}
	}

	#[test]
	fn challenge_matches_the_rfc_7636_vector() {
		assert_eq!(
			compute_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
			"E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
		);
	}

	#[test]
	fn pkce_debug_redacts_the_verifier() {
		let pair = PkcePair::generate();
		let rendered = format!("{pair:?}");

		assert!(!rendered.contains(pair.verifier()));
		assert!(rendered.contains(pair.challenge()));
	}

	#[tokio::test]
	async fn begin_sign_in_persists_before_navigating() {
		let (client, store, navigator) = test_client();

		client.begin_sign_in("/shop").await.expect("Sign-in should start.");

		let navigations = navigator.navigations();

		assert_eq!(navigations.len(), 1);

		let pairs: HashMap<_, _> = navigations[0].query_pairs().into_owned().collect();
		let pending = store
			.take_pending()
			.expect("Pending request should load.")
			.expect("Pending request should be stored before navigation.");

		assert_eq!(pairs.get("response_type"), Some(&"code".into()));
		assert_eq!(pairs.get("client_id"), Some(&"webapp".into()));
		assert_eq!(pairs.get("redirect_uri"), Some(&"https://app.example.com/callback".into()));
		assert_eq!(pairs.get("scope"), Some(&"openid profile read".into()));
		assert_eq!(pairs.get("code_challenge_method"), Some(&"S256".into()));
		assert_eq!(pairs.get("state"), Some(&pending.state));
		assert_eq!(
			pairs.get("code_challenge").map(String::as_str),
			Some(compute_challenge(pending.code_verifier.expose()).as_str()),
			"The challenge in the URL must derive from the stored verifier.",
		);
		assert!(
			!navigations[0].as_str().contains(pending.code_verifier.expose()),
			"The verifier must never appear in the authorization URL.",
		);
		assert_eq!(pending.state.len(), 32);
		assert_eq!(
			store.take_return_url().expect("Return URL should load."),
			Some("/shop".into())
		);
	}

	struct FailingStore;
	impl SessionStore for FailingStore {
		fn load_tokens(&self) -> Result<Option<TokenPair>, StoreError> {
			Err(StoreError::Backend { message: "offline".into() })
		}

		fn save_tokens(&self, _: &TokenPair) -> Result<(), StoreError> {
			Err(StoreError::Backend { message: "offline".into() })
		}

		fn clear_tokens(&self) -> Result<(), StoreError> {
			Err(StoreError::Backend { message: "offline".into() })
		}

		fn save_pending(&self, _: &PendingAuthRequest) -> Result<(), StoreError> {
			Err(StoreError::Backend { message: "offline".into() })
		}

		fn take_pending(&self) -> Result<Option<PendingAuthRequest>, StoreError> {
			Err(StoreError::Backend { message: "offline".into() })
		}

		fn save_return_url(&self, _: &str) -> Result<(), StoreError> {
			Err(StoreError::Backend { message: "offline".into() })
		}

		fn take_return_url(&self) -> Result<Option<String>, StoreError> {
			Err(StoreError::Backend { message: "offline".into() })
		}
	}

	#[tokio::test]
	async fn storage_failure_aborts_before_navigation() {
		let (client, _, _) = test_client();
		let navigator = Arc::new(RecordingNavigator::new("/"));
		let client = SessionClient::new(client.config, Arc::new(FailingStore), navigator.clone())
			.expect("Session client should build.");
		let err = client
			.begin_sign_in("/shop")
			.await
			.expect_err("Sign-in must fail when the store is unavailable.");

		assert!(matches!(err, Error::Storage(_)));
		assert!(
			navigator.navigations().is_empty(),
			"Navigation must never happen without a durably stored verifier.",
		);
	}
}
