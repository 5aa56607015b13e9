//! Builds per-service clients that share one transport and one auth middleware.
//!
//! Service clients live under `<api root>/<slug>/<version>/`. Every client except the auth
//! service's own is signed by the factory's [`AuthMiddleware`], so tokens are fetched once and
//! shared across services. Per-slug overrides adjust the prepared [`ClientBuilder`] before the
//! client is built, and [`ServiceClient`] lets callers wrap the result in a specialized type.
//! Overrides for the `auth` slug also reach the client the middleware fetches tokens with.

// crates.io
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{AuthClient, AuthMiddleware},
	config::{AUTH_SLUG, ClientConfig},
	error::ConfigError,
	rest::{Client, ClientBuilder, RequestSigner},
};

/// Hook adjusting the prepared builder for one service slug.
pub type ClientOverride = Arc<dyn Fn(ClientBuilder) -> ClientBuilder + Send + Sync>;

/// Specialized client type wrapping the generic REST client of one service.
pub trait ServiceClient
where
	Self: Sized,
{
	/// Slug of the wrapped service.
	const SLUG: &'static str;

	/// Wraps a client already rooted at the service's base URL.
	fn from_client(client: Client) -> Self;
}

/// Per-call options for [`ClientFactory::get_client_with`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientOptions {
	/// API version; falls back to the configured default for the slug.
	pub version: Option<String>,
	/// Whether requests are signed by the auth middleware.
	pub authenticated: bool,
}
impl ClientOptions {
	/// Options for an authenticated client with the default version.
	pub fn new() -> Self {
		Self { version: None, authenticated: true }
	}

	/// Pins the API version.
	pub fn version(mut self, version: impl Into<String>) -> Self {
		self.version = Some(version.into());

		self
	}

	/// Opts out of request signing.
	pub fn unauthenticated(mut self) -> Self {
		self.authenticated = false;

		self
	}
}
impl Default for ClientOptions {
	fn default() -> Self {
		Self::new()
	}
}

/// Assembles REST clients for Impact Stack services from one [`ClientConfig`].
#[derive(Clone)]
pub struct ClientFactory {
	config: Arc<ClientConfig>,
	http: ReqwestClient,
	auth_middleware: Arc<AuthMiddleware>,
	// Auth-service client before any override was applied.
	auth_base: Client,
	overrides: HashMap<String, ClientOverride>,
}
impl ClientFactory {
	/// Creates a factory with its own transport.
	pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
		let http = ReqwestClient::builder().build()?;

		Self::with_http_client(config, http)
	}

	/// Creates a factory that reuses the caller-provided transport.
	pub fn with_http_client(config: ClientConfig, http: ReqwestClient) -> Result<Self, ConfigError> {
		let auth_client = AuthClient::from_config(&config, http.clone())?;

		Ok(Self::with_auth_middleware(config, http, AuthMiddleware::new(auth_client)))
	}

	/// Creates a factory around an already configured middleware (custom clock, seeded token).
	pub fn with_auth_middleware(
		config: ClientConfig,
		http: ReqwestClient,
		auth_middleware: AuthMiddleware,
	) -> Self {
		Self {
			config: Arc::new(config),
			http,
			auth_base: auth_middleware.auth_client().client().clone(),
			auth_middleware: Arc::new(auth_middleware),
			overrides: HashMap::new(),
		}
	}

	/// Reads the configuration from the process environment and builds a factory.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::new(ClientConfig::from_env()?)
	}

	/// Installs an override applied whenever a client for `slug` is built.
	///
	/// An `auth` override also rebuilds the middleware's own auth client, so token fetches go
	/// through it. Clients handed out earlier keep the previous middleware.
	pub fn override_client<F>(mut self, slug: impl Into<String>, hook: F) -> Self
	where
		F: 'static + Fn(ClientBuilder) -> ClientBuilder + Send + Sync,
	{
		let slug = slug.into();
		let is_auth = slug == AUTH_SLUG;

		self.overrides.insert(slug, Arc::new(hook));

		if is_auth {
			let client = self.finish(AUTH_SLUG, self.auth_base.to_builder()).build();
			let auth_client = self.auth_middleware.auth_client().clone().with_client(client);

			self.auth_middleware = Arc::new(self.auth_middleware.fork(auth_client));
		}

		self
	}

	/// The configuration the factory was built from.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// The middleware shared by all authenticated clients.
	pub fn auth_middleware(&self) -> &Arc<AuthMiddleware> {
		&self.auth_middleware
	}

	/// Returns the client for `slug`, authenticated unless it is the auth service itself.
	pub fn get_client(&self, slug: &str, version: Option<&str>) -> Result<Client, ConfigError> {
		let options = ClientOptions {
			version: version.map(Into::into),
			authenticated: slug != AUTH_SLUG,
		};

		self.get_client_with(slug, options)
	}

	/// Returns an authenticated client for a service-to-service call.
	pub fn app_to_app(&self, slug: &str, version: &str) -> Result<Client, ConfigError> {
		self.get_client_with(slug, ClientOptions::new().version(version))
	}

	/// Returns the client for `slug` built with explicit options.
	pub fn get_client_with(&self, slug: &str, options: ClientOptions) -> Result<Client, ConfigError> {
		let base_url = self.service_url(slug, options.version.as_deref())?;
		let mut builder = ClientBuilder::from_url(base_url)
			.http_client(self.http.clone())
			.timeout(self.config.request_timeout);

		if options.authenticated {
			let signer: Arc<dyn RequestSigner> = self.auth_middleware.clone();

			builder = builder.signer(signer);
		}

		Ok(self.finish(slug, builder).build())
	}

	/// Returns the specialized client `T` for its slug.
	pub fn service<T>(&self, version: Option<&str>) -> Result<T, ConfigError>
	where
		T: ServiceClient,
	{
		self.get_client(T::SLUG, version).map(T::from_client)
	}

	/// Resolves `<api root>/<slug>/<version>/`.
	pub fn service_url(&self, slug: &str, version: Option<&str>) -> Result<Url, ConfigError> {
		let version = version
			.or_else(|| self.config.default_version(slug))
			.ok_or_else(|| ConfigError::UnknownVersion { slug: slug.into() })?;
		let path = format!("{}/{}/", escape(slug), escape(version));
		let url = self
			.config
			.api_url
			.join(&path)
			.map_err(|source| ConfigError::invalid_url(path.as_str(), source))?;

		if !url.as_str().starts_with(self.config.api_url.as_str()) || slug.is_empty() {
			return Err(ConfigError::InvalidValue {
				key: "slug",
				reason: format!("`{slug}/{version}` leaves the API root"),
			});
		}

		Ok(url)
	}

	fn finish(&self, slug: &str, mut builder: ClientBuilder) -> ClientBuilder {
		if let Some(hook) = self.overrides.get(slug) {
			builder = hook(builder);
		}

		// The auth service must never sign its own requests, whatever an override installed.
		if slug == AUTH_SLUG { builder.unsigned() } else { builder }
	}
}
impl Debug for ClientFactory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientFactory")
			.field("config", &self.config)
			.field("auth_middleware", &self.auth_middleware)
			.field("overrides", &self.overrides.keys().collect::<Vec<_>>())
			.finish()
	}
}

fn escape(part: &str) -> String {
	form_urlencoded::byte_serialize(part.as_bytes()).collect()
}
