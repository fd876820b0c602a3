//! Validated client configuration for the session core.
//!
//! A [`ClientConfig`] pins the identity provider endpoints, the public client identity,
//! and the in-app routes the flows navigate between. Endpoints are derived from the
//! issuer (`/oauth2/authorize`, `/oauth2/token`, `/logout`) but can be overridden for
//! providers with nonstandard layouts. All endpoints must use HTTPS; loopback hosts are
//! exempt so a local development provider keeps working.

// self
use crate::{_prelude::*, token::RoleRule};

/// Errors raised while constructing or validating a [`ClientConfig`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ClientConfigError {
	/// Issuer URL is required.
	#[error("Missing issuer URL.")]
	MissingIssuer,
	/// Client identifier is required.
	#[error("Missing client identifier.")]
	MissingClientId,
	/// Redirect URI is required.
	#[error("Missing redirect URI.")]
	MissingRedirectUri,
	/// Issuer URL cannot carry path segments (e.g. `data:` URLs).
	#[error("Issuer URL cannot be used as a base for endpoint derivation.")]
	OpaqueIssuer,
	/// Endpoints must use HTTPS outside of loopback hosts.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// The scope set must request `openid` for an OpenID Connect flow.
	#[error("Scopes must include `openid`.")]
	MissingOpenidScope,
	/// Scope entries cannot be empty or contain whitespace.
	#[error("Scope is invalid: {scope:?}.")]
	InvalidScope {
		/// The offending scope string.
		scope: String,
	},
	/// A derived URL could not be constructed.
	#[error("Derived URL is invalid.")]
	InvalidDerivedUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// Immutable configuration consumed by the session flows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// Identity provider base URL.
	pub issuer: Url,
	/// OAuth 2.0 public client identifier.
	pub client_id: String,
	/// Callback route on this origin that receives `code`/`state`.
	pub redirect_uri: Url,
	/// Where the provider sends the browser after sign-out.
	pub post_logout_redirect_uri: Url,
	/// Requested scopes; always includes `openid`.
	pub scopes: Vec<String>,
	/// Authorization endpoint used to start the code flow.
	pub authorization_endpoint: Url,
	/// Token endpoint used for exchanges and refreshes.
	pub token_endpoint: Url,
	/// Provider sign-out endpoint.
	pub logout_endpoint: Url,
	/// Landing route used when no return URL survived the round trip.
	pub default_route: String,
	/// In-app route for authenticated users who lack the required role.
	pub neutral_route: String,
	/// Role assigned when no rule yields a value.
	pub default_role: String,
	/// Ordered role-resolution chain applied to the access token payload.
	pub role_rules: Vec<RoleRule>,
	/// Tokens expiring within this window are treated as already expired.
	pub expiry_leeway: Duration,
}
impl ClientConfig {
	/// Creates a new builder.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Returns the scopes as the space-delimited `scope` parameter value.
	pub fn scope_parameter(&self) -> String {
		self.scopes.join(" ")
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
	issuer: Option<Url>,
	client_id: Option<String>,
	redirect_uri: Option<Url>,
	post_logout_redirect_uri: Option<Url>,
	scopes: Vec<String>,
	authorization_endpoint: Option<Url>,
	token_endpoint: Option<Url>,
	logout_endpoint: Option<Url>,
	default_route: String,
	neutral_route: String,
	default_role: String,
	role_rules: Option<Vec<RoleRule>>,
	namespaced_role_claim: Option<String>,
	expiry_leeway: Duration,
}
impl Default for ClientConfigBuilder {
	fn default() -> Self {
		Self {
			issuer: None,
			client_id: None,
			redirect_uri: None,
			post_logout_redirect_uri: None,
			scopes: Vec::new(),
			authorization_endpoint: None,
			token_endpoint: None,
			logout_endpoint: None,
			default_route: "/".into(),
			neutral_route: "/account".into(),
			default_role: "USER".into(),
			role_rules: None,
			namespaced_role_claim: None,
			expiry_leeway: Duration::seconds(5),
		}
	}
}
impl ClientConfigBuilder {
	/// Sets the identity provider base URL.
	pub fn issuer(mut self, url: Url) -> Self {
		self.issuer = Some(url);

		self
	}

	/// Sets the OAuth 2.0 client identifier.
	pub fn client_id(mut self, id: impl Into<String>) -> Self {
		self.client_id = Some(id.into());

		self
	}

	/// Sets the callback route on this origin.
	pub fn redirect_uri(mut self, url: Url) -> Self {
		self.redirect_uri = Some(url);

		self
	}

	/// Overrides the post-sign-out landing URL (defaults to the redirect URI's origin).
	pub fn post_logout_redirect_uri(mut self, url: Url) -> Self {
		self.post_logout_redirect_uri = Some(url);

		self
	}

	/// Replaces the scope set (defaults to `openid profile`).
	pub fn scopes<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Overrides the derived authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Overrides the derived token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Overrides the derived sign-out endpoint.
	pub fn logout_endpoint(mut self, url: Url) -> Self {
		self.logout_endpoint = Some(url);

		self
	}

	/// Overrides the landing route used when no return URL is available.
	pub fn default_route(mut self, route: impl Into<String>) -> Self {
		self.default_route = route.into();

		self
	}

	/// Overrides the route shown to authenticated users lacking the required role.
	pub fn neutral_route(mut self, route: impl Into<String>) -> Self {
		self.neutral_route = route.into();

		self
	}

	/// Overrides the role assigned when no rule matches.
	pub fn default_role(mut self, role: impl Into<String>) -> Self {
		self.default_role = role.into();

		self
	}

	/// Replaces the role-resolution chain entirely.
	pub fn role_rules<I>(mut self, rules: I) -> Self
	where
		I: IntoIterator<Item = RoleRule>,
	{
		self.role_rules = Some(rules.into_iter().collect());

		self
	}

	/// Appends a namespaced custom claim to the default role-resolution chain.
	pub fn namespaced_role_claim(mut self, claim: impl Into<String>) -> Self {
		self.namespaced_role_claim = Some(claim.into());

		self
	}

	/// Overrides the expiry leeway (defaults to 5 seconds; negative values clamp to zero).
	pub fn expiry_leeway(mut self, leeway: Duration) -> Self {
		self.expiry_leeway = if leeway.is_negative() { Duration::ZERO } else { leeway };

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ClientConfigError> {
		let issuer = self.issuer.ok_or(ClientConfigError::MissingIssuer)?;
		let client_id =
			self.client_id.filter(|id| !id.is_empty()).ok_or(ClientConfigError::MissingClientId)?;
		let redirect_uri = self.redirect_uri.ok_or(ClientConfigError::MissingRedirectUri)?;
		let post_logout_redirect_uri = match self.post_logout_redirect_uri {
			Some(url) => url,
			None => redirect_uri
				.join("/")
				.map_err(|source| ClientConfigError::InvalidDerivedUrl { source })?,
		};
		let scopes = if self.scopes.is_empty() {
			vec!["openid".to_owned(), "profile".to_owned()]
		} else {
			self.scopes
		};

		validate_scopes(&scopes)?;

		let authorization_endpoint = match self.authorization_endpoint {
			Some(url) => url,
			None => derive_endpoint(&issuer, &["oauth2", "authorize"])?,
		};
		let token_endpoint = match self.token_endpoint {
			Some(url) => url,
			None => derive_endpoint(&issuer, &["oauth2", "token"])?,
		};
		let logout_endpoint = match self.logout_endpoint {
			Some(url) => url,
			None => derive_endpoint(&issuer, &["logout"])?,
		};
		let mut role_rules = self.role_rules.unwrap_or_else(|| {
			vec![RoleRule::Claim("role".into()), RoleRule::FirstOf("roles".into())]
		});

		if let Some(claim) = self.namespaced_role_claim {
			role_rules.push(RoleRule::Claim(claim));
		}

		let config = ClientConfig {
			issuer,
			client_id,
			redirect_uri,
			post_logout_redirect_uri,
			scopes,
			authorization_endpoint,
			token_endpoint,
			logout_endpoint,
			default_route: self.default_route,
			neutral_route: self.neutral_route,
			default_role: self.default_role,
			role_rules,
			expiry_leeway: self.expiry_leeway,
		};

		config.validate()?;

		Ok(config)
	}
}

impl ClientConfig {
	fn validate(&self) -> Result<(), ClientConfigError> {
		validate_endpoint("issuer", &self.issuer)?;
		validate_endpoint("authorization", &self.authorization_endpoint)?;
		validate_endpoint("token", &self.token_endpoint)?;
		validate_endpoint("logout", &self.logout_endpoint)?;
		validate_endpoint("redirect", &self.redirect_uri)?;
		validate_endpoint("post-logout redirect", &self.post_logout_redirect_uri)?;

		Ok(())
	}
}

fn derive_endpoint(issuer: &Url, segments: &[&str]) -> Result<Url, ClientConfigError> {
	let mut url = issuer.clone();

	{
		let mut path = url.path_segments_mut().map_err(|_| ClientConfigError::OpaqueIssuer)?;

		path.pop_if_empty();
		path.extend(segments);
	}

	Ok(url)
}

fn validate_scopes(scopes: &[String]) -> Result<(), ClientConfigError> {
	for scope in scopes {
		if scope.is_empty() || scope.chars().any(char::is_whitespace) {
			return Err(ClientConfigError::InvalidScope { scope: scope.clone() });
		}
	}
	if !scopes.iter().any(|scope| scope == "openid") {
		return Err(ClientConfigError::MissingOpenidScope);
	}

	Ok(())
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ClientConfigError> {
	if url.scheme() == "https" || is_loopback(url) {
		Ok(())
	} else {
		Err(ClientConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(url::Host::Domain(domain)) => domain == "localhost",
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	}
}
