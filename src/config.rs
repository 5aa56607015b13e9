//! Resolved configuration shared by every client a factory creates.
//!
//! [`ClientConfig`] only holds already-resolved values. Reading them from the process
//! environment (or any other key/value source) happens in [`ClientConfig::from_vars`] and
//! [`ClientConfig::from_env`], so the rest of the crate never looks anything up by name.

// self
use crate::{_prelude::*, error::ConfigError};

/// Key holding the API root, e.g. `https://impact-stack.net/api`.
pub const API_URL_KEY: &str = "IMPACT_STACK_API_URL";
/// Key holding the API key exchanged for JWTs.
pub const API_KEY_KEY: &str = "IMPACT_STACK_API_KEY";
/// Key holding the default request timeout in (fractional) seconds.
pub const API_TIMEOUT_KEY: &str = "IMPACT_STACK_API_TIMEOUT";

/// Slug of the auth service.
pub const AUTH_SLUG: &str = "auth";
/// API version of the auth service.
pub const AUTH_API_VERSION: &str = "v1";

/// Timeout applied when neither the config nor the call overrides it.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::seconds(2);

/// Immutable client configuration.
#[derive(Clone)]
pub struct ClientConfig {
	/// API root every service path is joined to. Always ends with `/`.
	pub api_url: Url,
	/// API key exchanged for JWTs; optional for flows that only renew existing tokens.
	pub api_key: Option<String>,
	/// Version used per service slug when the caller omits one.
	pub default_versions: BTreeMap<String, String>,
	/// Default timeout for every request.
	pub request_timeout: Duration,
}
impl ClientConfig {
	/// Creates a configuration for the provided API root.
	pub fn new(api_url: impl AsRef<str>) -> Result<Self, ConfigError> {
		let raw = api_url.as_ref();
		let mut api_url =
			Url::parse(raw).map_err(|source| ConfigError::invalid_url(raw, source))?;
		let reason = if api_url.cannot_be_a_base() {
			Some("cannot be used as a base URL")
		} else if api_url.query().is_some() || api_url.fragment().is_some() {
			Some("must not carry a query or fragment")
		} else {
			None
		};

		if let Some(reason) = reason {
			return Err(ConfigError::InvalidValue {
				key: API_URL_KEY,
				reason: format!("`{raw}` {reason}"),
			});
		}
		if !api_url.path().ends_with('/') {
			let path = with_trailing_slash(api_url.path());

			api_url.set_path(&path);
		}

		Ok(Self {
			api_url,
			api_key: None,
			default_versions: BTreeMap::from([(AUTH_SLUG.into(), AUTH_API_VERSION.into())]),
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
		})
	}

	/// Reads the configuration from an arbitrary key/value source.
	///
	/// Only [`API_URL_KEY`] is required. Blank values count as absent.
	pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<String>,
	{
		let mut api_url = None;
		let mut api_key = None;
		let mut timeout = None;

		for (key, value) in vars {
			let slot = match key.as_ref() {
				API_URL_KEY => &mut api_url,
				API_KEY_KEY => &mut api_key,
				API_TIMEOUT_KEY => &mut timeout,
				_ => continue,
			};
			let value: String = value.into();

			*slot = Some(value).filter(|v| !v.trim().is_empty());
		}

		let mut config =
			Self::new(api_url.ok_or(ConfigError::MissingKey { key: API_URL_KEY })?.trim())?;

		if let Some(key) = api_key {
			config = config.with_api_key(key);
		}
		if let Some(raw) = timeout {
			config = config.with_request_timeout(parse_timeout(&raw)?);
		}

		Ok(config)
	}

	/// Reads the configuration from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_vars(std::env::vars())
	}

	/// Sets the API key.
	pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
		self.api_key = Some(api_key.into());

		self
	}

	/// Sets (or replaces) the default version for a service slug.
	pub fn with_default_version(
		mut self,
		slug: impl Into<String>,
		version: impl Into<String>,
	) -> Self {
		self.default_versions.insert(slug.into(), version.into());

		self
	}

	/// Overrides the default request timeout. Non-positive values fall back to the default.
	pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = if timeout.is_positive() { timeout } else { DEFAULT_REQUEST_TIMEOUT };

		self
	}

	/// Returns the default version for `slug`, if one is configured.
	pub fn default_version(&self, slug: &str) -> Option<&str> {
		self.default_versions.get(slug).map(String::as_str)
	}
}
impl Debug for ClientConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientConfig")
			.field("api_url", &self.api_url.as_str())
			.field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
			.field("default_versions", &self.default_versions)
			.field("request_timeout", &self.request_timeout)
			.finish()
	}
}

pub(crate) fn with_trailing_slash(raw: &str) -> String {
	if raw.ends_with('/') { raw.to_owned() } else { format!("{raw}/") }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
	let secs = raw.trim().parse::<f64>().map_err(|e| ConfigError::InvalidValue {
		key: API_TIMEOUT_KEY,
		reason: e.to_string(),
	})?;

	Duration::checked_seconds_f64(secs).filter(|timeout| timeout.is_positive()).ok_or_else(|| {
		ConfigError::InvalidValue {
			key: API_TIMEOUT_KEY,
			reason: format!("`{raw}` is not a positive number of seconds"),
		}
	})
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn new_normalizes_trailing_slash_and_seeds_auth_version() {
		let config = ClientConfig::new("https://impact-stack.net/api")
			.expect("API root fixture should parse.");

		assert_eq!(config.api_url.as_str(), "https://impact-stack.net/api/");
		assert_eq!(
			ClientConfig::new("https://impact-stack.net/api/")
				.expect("API root with slash should parse.")
				.api_url,
			config.api_url
		);
		assert_eq!(config.default_version(AUTH_SLUG), Some(AUTH_API_VERSION));
		assert_eq!(config.request_timeout, DEFAULT_REQUEST_TIMEOUT);
		assert!(config.api_key.is_none());
	}

	#[test]
	fn from_vars_reads_known_keys_and_ignores_others() {
		let config = ClientConfig::from_vars([
			(API_URL_KEY, "https://impact-stack.net/api"),
			(API_KEY_KEY, "api-key"),
			(API_TIMEOUT_KEY, "2.5"),
			("UNRELATED", "ignored"),
		])
		.expect("Complete variable set should produce a config.");

		assert_eq!(config.api_url.as_str(), "https://impact-stack.net/api/");
		assert_eq!(config.api_key.as_deref(), Some("api-key"));
		assert_eq!(config.request_timeout, Duration::milliseconds(2500));
	}

	#[test]
	fn from_vars_requires_api_url_and_treats_blank_as_absent() {
		let err = ClientConfig::from_vars([(API_KEY_KEY, "api-key")])
			.expect_err("Missing API URL must be rejected.");

		assert!(matches!(err, ConfigError::MissingKey { key: API_URL_KEY }));

		let config = ClientConfig::from_vars([
			(API_URL_KEY, "https://impact-stack.net/api"),
			(API_KEY_KEY, "  "),
		])
		.expect("Blank API key should be accepted as absent.");

		assert!(config.api_key.is_none());
	}

	#[test]
	fn invalid_values_are_rejected() {
		assert!(matches!(
			ClientConfig::new("not a url"),
			Err(ConfigError::InvalidUrl { .. })
		));
		assert!(matches!(
			ClientConfig::new("mailto:ops@impact-stack.net"),
			Err(ConfigError::InvalidValue { key: API_URL_KEY, .. })
		));
		assert!(matches!(
			ClientConfig::new("https://impact-stack.net/api?env=staging"),
			Err(ConfigError::InvalidValue { key: API_URL_KEY, .. })
		));
		assert!(matches!(
			ClientConfig::new("https://impact-stack.net/api#docs"),
			Err(ConfigError::InvalidValue { key: API_URL_KEY, .. })
		));
		assert!(matches!(
			ClientConfig::from_vars([
				(API_URL_KEY, "https://impact-stack.net/api"),
				(API_TIMEOUT_KEY, "1e300"),
			]),
			Err(ConfigError::InvalidValue { key: API_TIMEOUT_KEY, .. })
		));
		assert!(matches!(
			ClientConfig::from_vars([
				(API_URL_KEY, "https://impact-stack.net/api"),
				(API_TIMEOUT_KEY, "-1"),
			]),
			Err(ConfigError::InvalidValue { key: API_TIMEOUT_KEY, .. })
		));
	}

	#[test]
	fn debug_redacts_api_key() {
		let config = ClientConfig::new("https://impact-stack.net/api")
			.expect("API root fixture should parse.")
			.with_api_key("super-secret");
		let rendered = format!("{config:?}");

		assert!(!rendered.contains("super-secret"));
		assert!(rendered.contains("<redacted>"));
	}
}
