//! Request signer that attaches a cached, proactively renewed JWT to every request.
//!
//! [`AuthMiddleware`] keeps the last token issued by the auth service. Each signed request
//! checks it against the clock: a token with at least the renewal margin (half of its issued
//! lifetime by default) left is reused, anything else triggers a fetch. Fetches are serialized
//! on an async guard so concurrent requests that find the cache stale wait for the in-flight
//! fetch instead of issuing their own. Fetch failures propagate to the request that triggered
//! them and leave the cache untouched.

// crates.io
use reqwest::{Request, header::AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	auth::{
		client::AuthClient,
		token::{DEFAULT_RENEWAL_MARGIN, Token},
	},
	clock::{Clock, SystemClock},
	error::ConfigError,
	obs::{self, AuthOp, AuthOutcome, AuthSpan, CacheDecision},
	rest::{RequestSigner, SignFuture},
};

/// Signs requests with `Authorization: Bearer <jwt>`, fetching and renewing the JWT on demand.
pub struct AuthMiddleware {
	client: AuthClient,
	clock: Arc<dyn Clock>,
	renewal_margin: f64,
	cache: Mutex<Option<Token>>,
	fetch_guard: AsyncMutex<()>,
}
impl AuthMiddleware {
	/// Creates a middleware with an empty cache and the default renewal margin.
	pub fn new(client: AuthClient) -> Self {
		Self {
			client,
			clock: Arc::new(SystemClock),
			renewal_margin: DEFAULT_RENEWAL_MARGIN,
			cache: Mutex::new(None),
			fetch_guard: AsyncMutex::new(()),
		}
	}

	/// Replaces the clock for renewal decisions and token stamping.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.client = self.client.with_clock(clock.clone());
		self.clock = clock;

		self
	}

	/// Overrides the renewal margin; clamped to `[0, 1]`, NaN keeps the default.
	pub fn with_renewal_margin(mut self, margin: f64) -> Self {
		if !margin.is_nan() {
			self.renewal_margin = margin.clamp(0., 1.);
		}

		self
	}

	/// Seeds the cache, e.g. with a session token that is renewed without an API key.
	pub fn with_token(self, token: Token) -> Self {
		*self.cache.lock() = Some(token);

		self
	}

	/// Returns a middleware that fetches through `client`.
	///
	/// The clock, renewal margin and cached token are carried over.
	pub fn fork(&self, client: AuthClient) -> Self {
		Self {
			client: client.with_clock(self.clock.clone()),
			clock: self.clock.clone(),
			renewal_margin: self.renewal_margin,
			cache: Mutex::new(self.cached_token()),
			fetch_guard: AsyncMutex::new(()),
		}
	}

	/// The auth-service client used for fetches.
	pub fn auth_client(&self) -> &AuthClient {
		&self.client
	}

	/// Current renewal margin.
	pub fn renewal_margin(&self) -> f64 {
		self.renewal_margin
	}

	/// Returns the cached token without any I/O, usable or not.
	pub fn cached_token(&self) -> Option<Token> {
		self.cache.lock().clone()
	}

	/// Drops the cached token; the next signed request fetches a new one.
	///
	/// Without an API key this leaves nothing to renew from.
	pub fn invalidate(&self) {
		self.cache.lock().take();
	}

	/// Returns a token that is usable right now, fetching one if the cache is empty or stale.
	pub async fn token(&self) -> Result<Token> {
		if let Some(token) = self.usable_cached() {
			return Ok(token);
		}

		let _singleflight = self.fetch_guard.lock().await;

		// Another caller may have refreshed the cache while this one waited.
		if let Some(token) = self.usable_cached() {
			return Ok(token);
		}

		let current = self.cached_token();
		let fresh = self.fetch(current.as_ref()).await?;

		*self.cache.lock() = Some(fresh.clone());

		Ok(fresh)
	}

	fn usable_cached(&self) -> Option<Token> {
		let now = self.clock.now();
		let cache = self.cache.lock();
		let (decision, usable) = match cache.as_ref() {
			None => (CacheDecision::Empty, None),
			Some(token) if token.needs_renewal_at(now, self.renewal_margin) =>
				(CacheDecision::Renew, None),
			Some(token) => (CacheDecision::Reuse, Some(token.clone())),
		};

		obs::record_cache_decision(decision);
		obs::trace_cache_decision(decision, cache.as_ref().map(|token| token.remaining_at(now)));

		usable
	}

	async fn fetch(&self, current: Option<&Token>) -> Result<Token> {
		let op = if self.client.has_api_key() { AuthOp::Issue } else { AuthOp::Renew };
		let span = AuthSpan::new(op, "fetch");

		obs::record_auth_outcome(op, AuthOutcome::Attempt);

		let result = span
			.instrument(async move {
				match (op, current) {
					(AuthOp::Issue, _) => self.client.get_token().await,
					(AuthOp::Renew, Some(token)) => self.client.renew_token(token).await,
					(AuthOp::Renew, None) => Err(ConfigError::MissingApiKey.into()),
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_auth_outcome(op, AuthOutcome::Success),
			Err(_) => obs::record_auth_outcome(op, AuthOutcome::Failure),
		}

		result
	}
}
impl RequestSigner for AuthMiddleware {
	fn sign(&self, mut request: Request) -> SignFuture<'_> {
		Box::pin(async move {
			let token = self.token().await?;

			request.headers_mut().insert(AUTHORIZATION, token.authorization_header()?);

			Ok(request)
		})
	}
}
impl Debug for AuthMiddleware {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthMiddleware")
			.field("client", &self.client)
			.field("renewal_margin", &self.renewal_margin)
			.field("cached", &self.cache.lock().is_some())
			.finish()
	}
}
