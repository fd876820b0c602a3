//! Sign-out: local token destruction plus the provider logout redirect.

// self
use crate::{_prelude::*, flow::SessionClient};

impl SessionClient {
	/// Clears the stored tokens and navigates to the provider's logout endpoint.
	///
	/// Tokens are destroyed before the redirect so the local session is gone even if the
	/// shell rejects the navigation.
	pub async fn sign_out(&self) -> Result<()> {
		self.store.clear_tokens()?;

		let mut url = self.config.logout_endpoint.clone();

		{
			let mut pairs = url.query_pairs_mut();

			pairs.append_pair(
				"post_logout_redirect_uri",
				self.config.post_logout_redirect_uri.as_str(),
			);
		}

		self.navigator.navigate(&url).await?;

		Ok(())
	}
}
