//! The persisted access/refresh token pair.

// self
use crate::{_prelude::*, token::TokenSecret};

/// Access and refresh tokens treated as a single storage record.
///
/// The pair is only ever replaced wholesale: the callback exchange writes the initial
/// record and the refresh path rotates it. A refresh response that omits a new refresh
/// token keeps the previous one via [`TokenPair::rotated`].
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenPair {
	/// Bearer token presented to the backend.
	pub access_token: TokenSecret,
	/// Refresh token, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
}
impl TokenPair {
	/// Builds a pair from raw token strings.
	pub fn new(access_token: impl Into<String>, refresh_token: Option<impl Into<String>>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: refresh_token.map(TokenSecret::new),
		}
	}

	/// Produces the replacement pair after a refresh, carrying the previous refresh token
	/// forward when the provider did not rotate it.
	pub fn rotated(&self, access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: refresh_token.map(TokenSecret::new).or_else(|| self.refresh_token.clone()),
		}
	}
}
impl Debug for TokenPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenPair")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn rotation_keeps_the_old_refresh_token_when_none_is_issued() {
		let pair = TokenPair::new("old-access", Some("old-refresh"));
		let rotated = pair.rotated("new-access", None);

		assert_eq!(rotated.access_token.expose(), "new-access");
		assert_eq!(rotated.refresh_token.as_ref().map(TokenSecret::expose), Some("old-refresh"));
	}

	#[test]
	fn rotation_prefers_a_newly_issued_refresh_token() {
		let pair = TokenPair::new("old-access", Some("old-refresh"));
		let rotated = pair.rotated("new-access", Some("new-refresh".into()));

		assert_eq!(rotated.refresh_token.as_ref().map(TokenSecret::expose), Some("new-refresh"));
	}

	#[test]
	fn debug_never_prints_token_material() {
		let pair = TokenPair::new("visible-access", Some("visible-refresh"));
		let rendered = format!("{pair:?}");

		assert!(!rendered.contains("visible-access"));
		assert!(!rendered.contains("visible-refresh"));
	}
}
