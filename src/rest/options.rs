//! Per-call passthrough options (body, query, headers, timeout).

// crates.io
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
// self
use crate::{_prelude::*, error::ConfigError};

/// Options forwarded to a single request.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
	/// JSON body, if any.
	pub json: Option<serde_json::Value>,
	/// Query string pairs appended to the URL.
	pub query: Vec<(String, String)>,
	/// Extra headers; these replace client defaults with the same name.
	pub headers: HeaderMap,
	/// Timeout overriding the client's default.
	pub timeout: Option<Duration>,
}
impl RequestOptions {
	/// Creates empty options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the JSON body from anything convertible into a JSON value.
	pub fn json(mut self, body: impl Into<serde_json::Value>) -> Self {
		self.json = Some(body.into());

		self
	}

	/// Serializes `body` and uses it as the JSON body.
	pub fn serialize_json<T>(self, body: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		let value =
			serde_json::to_value(body).map_err(|source| ConfigError::InvalidBody { source })?;

		Ok(self.json(value))
	}

	/// Appends a query string pair.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Sets a header.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Overrides the timeout for this call.
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[derive(Serialize)]
	struct Donation<'a> {
		amount: u32,
		currency: &'a str,
	}

	#[test]
	fn serialize_json_uses_serde_representation() {
		let options = RequestOptions::new()
			.serialize_json(&Donation { amount: 1200, currency: "EUR" })
			.expect("Plain struct should serialize.");

		assert_eq!(options.json, Some(serde_json::json!({ "amount": 1200, "currency": "EUR" })));
	}

	#[test]
	fn serialize_json_rejects_bodies_json_cannot_express() {
		let body = BTreeMap::from([((1_u8, 2_u8), "tuple keys")]);
		let err = RequestOptions::new()
			.serialize_json(&body)
			.expect_err("Maps with non-string keys have no JSON form.");

		assert!(matches!(err, ConfigError::InvalidBody { .. }));
	}
}
