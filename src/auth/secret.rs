//! Credentials exchanged with the auth service: the API key and issued JWTs.

// crates.io
use reqwest::header::HeaderValue;
// self
use crate::{_prelude::*, error::MalformedResponseError};

/// Credential string that never shows up in `Debug` output.
///
/// Both the configured API key and every issued JWT are held in this wrapper, so neither can
/// leak through the `Debug` impls of [`AuthClient`](crate::auth::AuthClient) or
/// [`Token`](crate::auth::Token).
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);
impl Secret {
	/// Wraps a credential.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the raw credential. Do not log the result.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Builds a sensitive `Bearer <credential>` header value.
	pub fn bearer_header(&self) -> Result<HeaderValue, MalformedResponseError> {
		let mut value = HeaderValue::try_from(format!("Bearer {}", self.0))
			.map_err(|_| MalformedResponseError::InvalidToken)?;

		value.set_sensitive(true);

		Ok(value)
	}
}
impl From<String> for Secret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Secret(<redacted>)")
	}
}
