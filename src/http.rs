//! Instrumented reqwest transport for token endpoint exchanges.
//!
//! The `oauth2` crate reports server errors after parsing them, which loses the HTTP
//! status of the response. The transport handle here records the status of the most
//! recent token endpoint response into a shared slot before handing the body back, so
//! error mapping can attach it to exchange and refresh failures.

// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
// self
use crate::_prelude::*;

/// Status metadata captured from the most recent token endpoint response.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct ResponseMetadata {
	pub(crate) status: Option<u16>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub(crate) struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	pub(crate) fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub(crate) fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Reqwest wrapper producing instrumented handles for the `oauth2` request layer.
///
/// Token requests must not follow redirects; token endpoints return results directly
/// instead of delegating to another URI.
#[derive(Clone, Debug)]
pub(crate) struct TokenTransport(ReqwestClient);
impl TokenTransport {
	pub(crate) fn new(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a handle that records response outcomes in `slot`.
	pub(crate) fn handle(&self, slot: ResponseMetadataSlot) -> TransportHandle {
		TransportHandle(Arc::new(HandleInner { client: self.0.clone(), slot }))
	}
}

#[derive(Debug)]
struct HandleInner {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}

/// [`AsyncHttpClient`] adapter handed to the `oauth2` request builders.
#[derive(Clone, Debug)]
pub(crate) struct TransportHandle(Arc<HandleInner>);
impl<'c> AsyncHttpClient<'c> for TransportHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let inner = Arc::clone(&self.0);

		Box::pin(async move {
			// Clear stale metadata so prior attempts never leak into this one.
			inner.slot.take();

			let response = inner
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();

			inner.slot.store(ResponseMetadata { status: Some(status.as_u16()) });

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
