//! REST clients for Impact Stack services with transparent JWT authentication.
//!
//! A [`ClientFactory`](factory::ClientFactory) turns one [`ClientConfig`](config::ClientConfig)
//! into per-service [`Client`](rest::Client)s. Authenticated clients sign every request through
//! the shared [`AuthMiddleware`](auth::AuthMiddleware), which fetches a JWT from the auth service
//! on demand, caches it, and renews it once less than half of its lifetime remains.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod factory;
pub mod obs;
pub mod rest;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{AuthClient, AuthMiddleware},
		clock::Clock,
		config::ClientConfig,
		factory::ClientFactory,
	};

	/// Builds a factory whose middleware renews tokens against `clock`.
	pub fn build_test_factory(config: ClientConfig, clock: &ManualClock) -> ClientFactory {
		let http = ReqwestClient::new();
		let auth_client = AuthClient::from_config(&config, http.clone())
			.expect("Auth client should build from the test config.");
		let middleware = AuthMiddleware::new(auth_client).with_clock(Arc::new(clock.clone()));

		ClientFactory::with_auth_middleware(config, http, middleware)
	}

	/// Manually driven [`Clock`] so tests can move time across renewal thresholds.
	#[derive(Clone, Debug)]
	pub struct ManualClock(Arc<Mutex<OffsetDateTime>>);
	impl ManualClock {
		/// Creates a clock frozen at `instant`.
		pub fn at(instant: OffsetDateTime) -> Self {
			Self(Arc::new(Mutex::new(instant)))
		}

		/// Moves the clock to `instant`.
		pub fn set(&self, instant: OffsetDateTime) {
			*self.0.lock() = instant;
		}

		/// Moves the clock forward by `delta`.
		pub fn advance(&self, delta: Duration) {
			*self.0.lock() += delta;
		}
	}
	impl Clock for ManualClock {
		fn now(&self) -> OffsetDateTime {
			*self.0.lock()
		}
	}

	/// Builds a [`ClientConfig`] whose API root is `<mock server>/api`.
	pub fn test_config(server_base_url: &str, api_key: Option<&str>) -> ClientConfig {
		let config = ClientConfig::new(format!("{server_base_url}/api"))
			.expect("Mock server URL should form a valid API root.");

		match api_key {
			Some(key) => config.with_api_key(key),
			None => config,
		}
	}

	/// Builds a JWT-shaped string whose payload carries the provided claims.
	///
	/// The signature segment is a fixed placeholder; nothing in the crate verifies it.
	pub fn unsigned_jwt(claims: &serde_json::Value) -> String {
		// crates.io
		use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};

		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
		let payload = URL_SAFE_NO_PAD.encode(claims.to_string());

		format!("{header}.{payload}.c2lnbmF0dXJl")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::Mutex;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError, Method};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use auth::{AuthClient, AuthMiddleware, Token};
pub use config::ClientConfig;
pub use factory::{ClientFactory, ClientOptions, ServiceClient};
pub use reqwest;
pub use rest::{Client, ClientBuilder, RequestOptions, RequestSigner, Target};
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
