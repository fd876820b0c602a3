//! Client-side OpenID Connect session core—PKCE sign-in, silent token refresh,
//! authenticated requests, and role-gated routing behind pluggable storage and navigation.
//!
//! The crate models the authentication subsystem of a browser-style application as a
//! library. Host shells inject two seams: a [`store::SessionStore`] for origin-scoped
//! persistence (tokens, the pending authorization request, the one-shot return URL) and a
//! [`shell::Navigator`] for redirect-away navigation. Everything else—authorization URL
//! construction, the code-for-token exchange, expiry detection with silent refresh, the
//! 401 redirect deduplication, and the route guard state machine—lives here.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod config;
pub mod error;
pub mod flow;
pub mod guard;
pub mod monitor;
pub mod obs;
pub mod shell;
pub mod store;
pub mod token;

mod http;
mod oauth;

mod _prelude {
	pub use std::{
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {httpmock as _, tempfile as _};
