//! Crate-level error types shared by the REST client, the auth middleware, and the factory.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const BODY_PREVIEW_LIMIT: usize = 512;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response body did not carry what the caller expected.
	#[error(transparent)]
	MalformedResponse(#[from] MalformedResponseError),

	/// Upstream answered with a non-success status code.
	#[error("Request to {url} failed with HTTP status {status}.")]
	Status {
		/// HTTP status code returned by the upstream service.
		status: u16,
		/// Final request URL.
		url: String,
		/// Truncated response body, useful for diagnostics.
		body: String,
	},
	/// Requested URL lies outside the client's base URL.
	#[error("This client only sends requests to {base}, refusing {url}.")]
	InvalidTarget {
		/// Rejected URL.
		url: String,
		/// Base URL the client is bound to.
		base: String,
	},
}
impl Error {
	/// Returns the HTTP status code for [`Error::Status`] failures.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}

	pub(crate) fn status_with_body(status: u16, url: &Url, body: &str) -> Self {
		let body = match body.char_indices().nth(BODY_PREVIEW_LIMIT) {
			Some((idx, _)) => format!("{}...", &body[..idx]),
			None => body.to_owned(),
		};

		Self::Status { status, url: url.to_string(), body }
	}
}
impl From<ReqwestError> for Error {
	fn from(e: ReqwestError) -> Self {
		if e.is_builder() {
			ConfigError::from(e).into()
		} else {
			TransportError::from(e).into()
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A required configuration key is absent.
	#[error("Configuration key `{key}` is not set.")]
	MissingKey {
		/// Name of the missing key.
		key: &'static str,
	},
	/// A configuration value cannot be interpreted.
	#[error("Configuration key `{key}` has an invalid value: {reason}.")]
	InvalidValue {
		/// Name of the offending key.
		key: &'static str,
		/// Why the value was rejected.
		reason: String,
	},
	/// A URL cannot be parsed or joined.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// The URL (or fragment) that failed to parse.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A request body could not be serialized to JSON.
	#[error("Request body cannot be serialized to JSON.")]
	InvalidBody {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// No version was passed and the service has no default.
	#[error("No API version was given for service `{slug}` and no default is configured.")]
	UnknownVersion {
		/// Service slug.
		slug: String,
	},
	/// A token is required but neither an API key nor a renewable token is available.
	#[error("No API key is configured and there is no token to renew.")]
	MissingApiKey,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	pub(crate) fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
		Self::InvalidUrl { url: url.into(), source }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeouts).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {url}.")]
	Network {
		/// Request URL, when known.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request did not complete within its timeout.
	#[error("Request to {url} timed out.")]
	Timeout {
		/// Request URL, when known.
		url: String,
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		let url = e.url().map(ToString::to_string).unwrap_or_else(|| "<unknown>".into());

		if e.is_timeout() {
			Self::Timeout { url, source: Box::new(e) }
		} else {
			Self::Network { url, source: Box::new(e) }
		}
	}
}

/// The response arrived but its body is unusable.
#[derive(Debug, ThisError)]
pub enum MalformedResponseError {
	/// Body could not be decoded as the expected JSON shape.
	#[error("Response from {url} is not valid JSON for the expected type.")]
	Json {
		/// Request URL.
		url: String,
		/// Structured parsing failure with the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// An expected field is absent.
	#[error("Response from {url} is missing the `{field}` field.")]
	MissingField {
		/// Request URL.
		url: String,
		/// Name of the missing field.
		field: &'static str,
	},
	/// Token expiry cannot be derived from the response or the JWT claims.
	#[error("Token expiry cannot be determined from the response or the token claims.")]
	MissingExpiry,
	/// Token contains characters that cannot be sent in an HTTP header.
	#[error("Token cannot be used as an HTTP header value.")]
	InvalidToken,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_error_truncates_long_bodies() {
		let url = Url::parse("https://impact-stack.net/api/test/v1/").expect("URL should parse.");
		let err = Error::status_with_body(502, &url, &"x".repeat(BODY_PREVIEW_LIMIT * 2));

		assert_eq!(err.status(), Some(502));

		let Error::Status { body, .. } = err else {
			panic!("Status helper should build a status error.");
		};

		assert_eq!(body.len(), BODY_PREVIEW_LIMIT + 3);
		assert!(body.ends_with("..."));
	}

	#[test]
	fn status_is_absent_for_other_variants() {
		let err = Error::InvalidTarget { url: "https://evil.test/".into(), base: "https://x/".into() };

		assert_eq!(err.status(), None);
		assert!(err.to_string().contains("https://x/"));
	}
}
