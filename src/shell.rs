//! Host-shell integration points.
//!
//! Navigation is the one side effect the crate cannot perform itself: leaving the
//! current document for the provider's authorization or logout pages belongs to the
//! embedding shell. Implementations resolve their future once the navigation attempt has
//! settled—either the document is on its way out or the attempt was rejected—so callers
//! can sequence cleanup (such as releasing the 401 redirect slot) behind it.

// self
use crate::_prelude::*;

/// Future returned by [`Navigator::navigate`].
pub type NavigateFuture<'a> = Pin<Box<dyn Future<Output = Result<(), NavigateError>> + 'a + Send>>;

/// Browser-shell contract for redirect-away navigation and location inspection.
pub trait Navigator
where
	Self: Send + Sync,
{
	/// Navigates the shell to the provided URL.
	fn navigate<'a>(&'a self, url: &'a Url) -> NavigateFuture<'a>;

	/// Returns the current in-app location (path, query, and fragment).
	fn current_location(&self) -> String;
}

/// Error produced when the shell rejects a navigation attempt.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Navigation failed: {message}.")]
pub struct NavigateError {
	/// Shell-supplied reason string.
	pub message: String,
}
impl NavigateError {
	/// Creates a new navigation error.
	pub fn new(message: impl Into<String>) -> Self {
		Self { message: message.into() }
	}
}

/// In-process [`Navigator`] that records navigations instead of performing them; the
/// shell stand-in for tests and demos, mirroring what [`MemoryStore`](crate::store::MemoryStore)
/// is for storage.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
	location: Mutex<String>,
	navigations: Mutex<Vec<Url>>,
	fail_next: Mutex<bool>,
}
impl RecordingNavigator {
	/// Creates a navigator reporting the provided current location.
	pub fn new(location: impl Into<String>) -> Self {
		Self {
			location: Mutex::new(location.into()),
			navigations: Mutex::new(Vec::new()),
			fail_next: Mutex::new(false),
		}
	}

	/// Replaces the reported current location.
	pub fn set_location(&self, location: impl Into<String>) {
		*self.location.lock() = location.into();
	}

	/// Returns every URL navigated to so far.
	pub fn navigations(&self) -> Vec<Url> {
		self.navigations.lock().clone()
	}

	/// Arms the navigator to reject the next navigation attempt.
	pub fn fail_next(&self) {
		*self.fail_next.lock() = true;
	}
}
impl Navigator for RecordingNavigator {
	fn navigate<'a>(&'a self, url: &'a Url) -> NavigateFuture<'a> {
		Box::pin(async move {
			if std::mem::take(&mut *self.fail_next.lock()) {
				return Err(NavigateError::new("navigation rejected by test shell"));
			}

			self.navigations.lock().push(url.clone());

			Ok(())
		})
	}

	fn current_location(&self) -> String {
		self.location.lock().clone()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn recording_navigator_tracks_and_fails_on_demand() {
		let navigator = RecordingNavigator::new("/shop");
		let target = Url::parse("https://id.example.com/oauth2/authorize")
			.expect("Target URL fixture should parse.");

		navigator.navigate(&target).await.expect("First navigation should be recorded.");

		assert_eq!(navigator.navigations(), vec![target.clone()]);
		assert_eq!(navigator.current_location(), "/shop");

		navigator.fail_next();

		assert!(navigator.navigate(&target).await.is_err());
		assert_eq!(navigator.navigations().len(), 1, "Rejected attempts must not be recorded.");
	}
}
