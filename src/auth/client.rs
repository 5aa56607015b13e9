//! REST client for the auth service, which issues and renews JWTs.

// crates.io
use reqwest::header::AUTHORIZATION;
// self
use crate::{
	_prelude::*,
	auth::{
		secret::Secret,
		token::{JwtClaims, Token, timestamp},
	},
	clock::{Clock, SystemClock},
	config::{AUTH_API_VERSION, AUTH_SLUG, ClientConfig},
	error::{ConfigError, MalformedResponseError},
	rest::{Client, ClientBuilder, RequestOptions},
};

/// Endpoint exchanging an API key for a JWT.
pub const TOKEN_ENDPOINT: &str = "token";
/// Endpoint exchanging a still valid JWT for a fresh one.
pub const RENEW_ENDPOINT: &str = "renew";

/// Client for `<api root>/auth/v1/`.
#[derive(Clone)]
pub struct AuthClient {
	client: Client,
	api_key: Option<Secret>,
	clock: Arc<dyn Clock>,
}
impl AuthClient {
	/// Wraps an existing (unsigned) REST client rooted at the auth service.
	pub fn new(client: Client, api_key: Option<String>) -> Self {
		Self { client, api_key: api_key.map(Secret::from), clock: Arc::new(SystemClock) }
	}

	/// Builds an auth client from configuration, sharing the provided transport.
	pub fn from_config(config: &ClientConfig, http: ReqwestClient) -> Result<Self, ConfigError> {
		let path = format!("{AUTH_SLUG}/{AUTH_API_VERSION}/");
		let base_url = config
			.api_url
			.join(&path)
			.map_err(|source| ConfigError::invalid_url(path, source))?;
		let client = ClientBuilder::from_url(base_url)
			.http_client(http)
			.timeout(config.request_timeout)
			.build();

		Ok(Self::new(client, config.api_key.clone()))
	}

	/// Replaces the clock used to stamp tokens whose issue time is unknown.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Swaps the REST client, keeping the API key and clock.
	pub fn with_client(mut self, client: Client) -> Self {
		self.client = client;

		self
	}

	/// The underlying REST client.
	pub fn client(&self) -> &Client {
		&self.client
	}

	/// Returns `true` when an API key is configured.
	pub fn has_api_key(&self) -> bool {
		self.api_key.is_some()
	}

	/// Exchanges the configured API key for a JWT.
	pub async fn get_token(&self) -> Result<Token> {
		let api_key = self.api_key.as_ref().ok_or(ConfigError::MissingApiKey)?;
		let response: TokenResponse = self
			.client
			.post_json(TOKEN_ENDPOINT, RequestOptions::new().json(api_key.expose()))
			.await?;

		response.into_token(self.endpoint_url(TOKEN_ENDPOINT), self.clock.now())
	}

	/// Exchanges `current` for a fresh JWT without using the API key.
	pub async fn renew_token(&self, current: &Token) -> Result<Token> {
		let response: TokenResponse = self
			.client
			.post_json(
				RENEW_ENDPOINT,
				RequestOptions::new().header(AUTHORIZATION, current.authorization_header()?),
			)
			.await?;

		response.into_token(self.endpoint_url(RENEW_ENDPOINT), self.clock.now())
	}

	fn endpoint_url(&self, endpoint: &str) -> String {
		format!("{}{endpoint}", self.client.base_url())
	}
}
impl Debug for AuthClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthClient")
			.field("client", &self.client)
			.field("api_key", &self.api_key)
			.finish()
	}
}

/// Body returned by the `token` and `renew` endpoints.
#[derive(Debug, Deserialize)]
struct TokenResponse {
	token: Option<String>,
	exp: Option<f64>,
	iat: Option<f64>,
	expires_in: Option<f64>,
}
impl TokenResponse {
	fn into_token(self, url: String, now: OffsetDateTime) -> Result<Token> {
		let value = self.token.ok_or(MalformedResponseError::MissingField { url, field: "token" })?;
		let claims = JwtClaims::decode(&value).unwrap_or_default();
		let issued_at = self.iat.or(claims.iat).and_then(timestamp).unwrap_or(now);
		let expires_at = self
			.exp
			.and_then(timestamp)
			.or_else(|| {
				self.expires_in
					.and_then(Duration::checked_seconds_f64)
					.and_then(|lifetime| issued_at.checked_add(lifetime))
			})
			.or_else(|| claims.exp.and_then(timestamp))
			.ok_or(MalformedResponseError::MissingExpiry)?;

		Ok(Token::new(value, issued_at, expires_at))
	}
}
