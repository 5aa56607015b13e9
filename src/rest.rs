//! General purpose REST/JSON client bound to a base URL.
//!
//! [`Client`] is a thin layer over [`ReqwestClient`]: it resolves a [`Target`] against its base
//! URL, applies the default timeout and headers, lets an optional [`RequestSigner`] touch the
//! request, and turns non-2xx responses into [`Error::Status`]. JSON decoding is opt-in through
//! the `*_json` methods.

mod options;
mod signer;
mod target;

pub use options::*;
pub use signer::*;
pub use target::*;

// crates.io
use reqwest::{
	Response,
	header::{HeaderMap, HeaderName, HeaderValue},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	config::{DEFAULT_REQUEST_TIMEOUT, with_trailing_slash},
	error::{ConfigError, MalformedResponseError, TransportError},
	obs,
};

macro_rules! def_verbs {
	($(($verb:ident, $verb_json:ident, $method:ident)),+ $(,)?) => {
		impl Client {
			$(
				#[doc = concat!("Sends a `", stringify!($method), "` request to `target`.")]
				pub async fn $verb(
					&self,
					target: impl Into<Target>,
					options: RequestOptions,
				) -> Result<Response> {
					self.request(Method::$method, target, options).await
				}

				#[doc = concat!(
					"Sends a `", stringify!($method), "` request to `target` and decodes the JSON body."
				)]
				pub async fn $verb_json<T>(
					&self,
					target: impl Into<Target>,
					options: RequestOptions,
				) -> Result<T>
				where
					T: DeserializeOwned,
				{
					self.request_json(Method::$method, target, options).await
				}
			)+
		}
	};
}

/// REST/JSON client bound to one base URL.
#[derive(Clone)]
pub struct Client {
	http: ReqwestClient,
	base_url: Url,
	signer: Option<Arc<dyn RequestSigner>>,
	timeout: Duration,
	default_headers: HeaderMap,
}
impl Client {
	/// Creates an unsigned client with default settings.
	pub fn new(base_url: impl AsRef<str>) -> Result<Self, ConfigError> {
		Ok(ClientBuilder::new(base_url)?.build())
	}

	/// Returns a builder for the provided base URL.
	pub fn builder(base_url: impl AsRef<str>) -> Result<ClientBuilder, ConfigError> {
		ClientBuilder::new(base_url)
	}

	/// Base URL every target is resolved against. Always ends with `/`.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Default timeout applied when a call does not override it.
	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	/// Returns a builder preloaded with this client's settings and transport.
	pub fn to_builder(&self) -> ClientBuilder {
		ClientBuilder {
			base_url: self.base_url.clone(),
			http: Some(self.http.clone()),
			signer: self.signer.clone(),
			timeout: self.timeout,
			default_headers: self.default_headers.clone(),
		}
	}

	/// Returns `true` when requests pass through a signer.
	pub fn is_signed(&self) -> bool {
		self.signer.is_some()
	}

	/// Sends a request and returns the raw response after checking its status.
	pub async fn request(
		&self,
		method: Method,
		target: impl Into<Target>,
		options: RequestOptions,
	) -> Result<Response> {
		let url = target.into().resolve(&self.base_url)?;
		let RequestOptions { json, query, headers, timeout } = options;
		let timeout = timeout.filter(|t| t.is_positive()).unwrap_or(self.timeout);
		let mut builder = self
			.http
			.request(method, url)
			.timeout(timeout.unsigned_abs())
			.headers(self.default_headers.clone())
			.headers(headers);

		if !query.is_empty() {
			builder = builder.query(&query);
		}
		if let Some(body) = json {
			builder = builder.json(&body);
		}

		let mut request = builder.build()?;

		if let Some(signer) = &self.signer {
			request = signer.sign(request).await?;
		}

		obs::trace_request(request.method(), request.url());

		let response = self.http.execute(request).await.map_err(TransportError::from)?;
		let status = response.status();

		if !status.is_success() {
			let url = response.url().clone();
			let body = response.text().await.unwrap_or_default();

			obs::trace_status_failure(status.as_u16(), &url);

			return Err(Error::status_with_body(status.as_u16(), &url, &body));
		}

		Ok(response)
	}

	/// Sends a request and decodes the JSON response body into `T`.
	pub async fn request_json<T>(
		&self,
		method: Method,
		target: impl Into<Target>,
		options: RequestOptions,
	) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.request(method, target, options).await?;
		let url = response.url().to_string();
		let bytes = response.bytes().await.map_err(TransportError::from)?;

		decode_json(url, &bytes)
	}
}
def_verbs! {
	(get, get_json, GET),
	(post, post_json, POST),
	(put, put_json, PUT),
	(patch, patch_json, PATCH),
	(delete, delete_json, DELETE),
}
impl Debug for Client {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("base_url", &self.base_url.as_str())
			.field("signed", &self.signer.is_some())
			.field("timeout", &self.timeout)
			.finish()
	}
}

/// Builder for [`Client`] values.
#[derive(Clone)]
pub struct ClientBuilder {
	/// Base URL (normalized to end with `/`).
	pub base_url: Url,
	/// Shared transport; a fresh one is created when absent.
	pub http: Option<ReqwestClient>,
	/// Optional request signer.
	pub signer: Option<Arc<dyn RequestSigner>>,
	/// Default timeout.
	pub timeout: Duration,
	/// Headers sent with every request.
	pub default_headers: HeaderMap,
}
impl ClientBuilder {
	/// Creates a builder for the provided base URL.
	pub fn new(base_url: impl AsRef<str>) -> Result<Self, ConfigError> {
		let raw = base_url.as_ref();
		let url = Url::parse(raw).map_err(|source| ConfigError::invalid_url(raw, source))?;

		Ok(Self::from_url(url))
	}

	/// Creates a builder for an already parsed base URL.
	pub fn from_url(mut base_url: Url) -> Self {
		if !base_url.path().ends_with('/') {
			let path = with_trailing_slash(base_url.path());

			base_url.set_path(&path);
		}

		Self {
			base_url,
			http: None,
			signer: None,
			timeout: DEFAULT_REQUEST_TIMEOUT,
			default_headers: HeaderMap::new(),
		}
	}

	/// Reuses an existing transport (connection pool).
	pub fn http_client(mut self, http: ReqwestClient) -> Self {
		self.http = Some(http);

		self
	}

	/// Installs a request signer.
	pub fn signer(mut self, signer: Arc<dyn RequestSigner>) -> Self {
		self.signer = Some(signer);

		self
	}

	/// Removes any installed signer.
	pub fn unsigned(mut self) -> Self {
		self.signer = None;

		self
	}

	/// Sets the default timeout. Non-positive values are ignored.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		if timeout.is_positive() {
			self.timeout = timeout;
		}

		self
	}

	/// Adds a header sent with every request.
	pub fn default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.default_headers.insert(name, value);

		self
	}

	/// Builds the client.
	pub fn build(self) -> Client {
		Client {
			http: self.http.unwrap_or_default(),
			base_url: self.base_url,
			signer: self.signer,
			timeout: self.timeout,
			default_headers: self.default_headers,
		}
	}
}
impl Debug for ClientBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientBuilder")
			.field("base_url", &self.base_url.as_str())
			.field("signed", &self.signer.is_some())
			.field("timeout", &self.timeout)
			.field("default_headers", &self.default_headers)
			.finish()
	}
}

pub(crate) fn decode_json<T>(url: String, bytes: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| MalformedResponseError::Json { url, source }.into())
}
