//! Access token payload decoding and role resolution.
//!
//! The access token is treated as an opaque bearer credential everywhere except here:
//! the payload segment is base64url-decoded and parsed just far enough to answer "who is
//! this, what role do they hold, and when does this expire". Signature verification is
//! the backend's job; a client that cannot decode the payload simply treats the token as
//! invalid instead of crashing.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::{Map, Value};
// self
use crate::_prelude::*;

/// Errors emitted while decoding the access token payload.
#[derive(Debug, ThisError)]
pub enum ClaimsError {
	/// Token does not have the dot-separated JWT shape.
	#[error("Access token is not a well-formed JWT.")]
	MalformedJwt,
	/// Payload segment is not valid base64url.
	#[error("Access token payload is not valid base64url.")]
	PayloadDecode(#[from] base64::DecodeError),
	/// Payload JSON could not be parsed.
	#[error("Access token payload is not valid JSON.")]
	PayloadParse(#[from] serde_path_to_error::Error<serde_json::Error>),
	/// Payload JSON is not an object.
	#[error("Access token payload is not a JSON object.")]
	NotAnObject,
	/// Neither `sub` nor `email` is present.
	#[error("Access token payload carries no subject claim.")]
	MissingSubject,
	/// The `exp` claim is absent or not numeric.
	#[error("Access token payload carries no usable expiry claim.")]
	MissingExpiry,
	/// The `exp` claim does not fit into a timestamp.
	#[error("Access token expiry is out of range.")]
	ExpiryOutOfRange,
}

/// One step in the ordered role-resolution chain.
///
/// Providers disagree on where the role lives: some emit a plain `role` claim, some an
/// array under `roles`, some a namespaced custom claim. Rules are evaluated in order and
/// the first one that yields a non-empty string wins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoleRule {
	/// Read a string claim verbatim.
	Claim(String),
	/// Read the first entry of an array claim.
	FirstOf(String),
}
impl RoleRule {
	fn apply(&self, payload: &Map<String, Value>) -> Option<String> {
		match self {
			RoleRule::Claim(name) =>
				payload.get(name).and_then(Value::as_str).map(str::to_owned),
			RoleRule::FirstOf(name) => payload
				.get(name)
				.and_then(Value::as_array)
				.and_then(|entries| entries.first())
				.and_then(Value::as_str)
				.map(str::to_owned),
		}
	}
}

/// Claims derived from the current access token; recomputed on demand, never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Claims {
	/// Stable subject identifier (`sub`, falling back to `email`).
	pub subject: String,
	/// Resolved role name.
	pub role: String,
	/// Expiry instant taken from the `exp` claim.
	pub expires_at: OffsetDateTime,
}
impl Claims {
	/// Returns `true` once the token is within `leeway` of its expiry instant.
	///
	/// The leeway treats tokens that are about to lapse as already expired, so requests
	/// built right at the boundary do not race an in-flight expiry.
	pub fn is_expired_at(&self, now: OffsetDateTime, leeway: Duration) -> bool {
		now + leeway >= self.expires_at
	}
}

/// Decodes the payload segment of `access_token` and resolves the role via `rules`.
pub fn decode(
	access_token: &str,
	rules: &[RoleRule],
	default_role: &str,
) -> Result<Claims, ClaimsError> {
	let segment = access_token.split('.').nth(1).ok_or(ClaimsError::MalformedJwt)?;
	// Tolerate padded emitters; JWT payloads are canonically unpadded.
	let bytes = URL_SAFE_NO_PAD.decode(segment.trim_end_matches('='))?;
	let mut deserializer = serde_json::Deserializer::from_slice(&bytes);
	let payload: Value = serde_path_to_error::deserialize(&mut deserializer)?;
	let payload = payload.as_object().ok_or(ClaimsError::NotAnObject)?;
	let subject = payload
		.get("sub")
		.and_then(Value::as_str)
		.or_else(|| payload.get("email").and_then(Value::as_str))
		.ok_or(ClaimsError::MissingSubject)?
		.to_owned();
	let exp = payload.get("exp").and_then(Value::as_i64).ok_or(ClaimsError::MissingExpiry)?;
	let expires_at =
		OffsetDateTime::from_unix_timestamp(exp).map_err(|_| ClaimsError::ExpiryOutOfRange)?;
	let role = resolve_role(payload, rules).unwrap_or_else(|| default_role.to_owned());

	Ok(Claims { subject, role, expires_at })
}

fn resolve_role(payload: &Map<String, Value>, rules: &[RoleRule]) -> Option<String> {
	rules.iter().find_map(|rule| rule.apply(payload).filter(|role| !role.is_empty()))
}
