//! In-memory JWT model and the renewal policy applied to it.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use reqwest::header::HeaderValue;
// self
use crate::{_prelude::*, auth::secret::Secret, error::MalformedResponseError};

/// Fraction of a token's issued lifetime that must remain for it to be reused.
pub const DEFAULT_RENEWAL_MARGIN: f64 = 0.5;

/// A JWT together with the instants that bound its validity.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
	/// The JWT; callers must avoid logging it.
	pub secret: Secret,
	/// Instant the token was issued (or first observed).
	pub issued_at: OffsetDateTime,
	/// Instant after which the token must not be used.
	pub expires_at: OffsetDateTime,
}
impl Token {
	/// Creates a token from its raw value and validity bounds.
	pub fn new(
		value: impl Into<String>,
		issued_at: OffsetDateTime,
		expires_at: OffsetDateTime,
	) -> Self {
		Self { secret: Secret::new(value), issued_at, expires_at }
	}

	/// Total lifetime the token was issued with.
	pub fn lifetime(&self) -> Duration {
		self.expires_at - self.issued_at
	}

	/// Lifetime left at `now`; negative once expired.
	pub fn remaining_at(&self, now: OffsetDateTime) -> Duration {
		self.expires_at - now
	}

	/// Returns `true` if the token has expired at `now`.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		now >= self.expires_at
	}

	/// Returns `true` once less than `margin` of the issued lifetime remains at `now`.
	///
	/// `margin` is clamped to `[0, 1]`. Expired tokens always need renewal.
	pub fn needs_renewal_at(&self, now: OffsetDateTime, margin: f64) -> bool {
		if self.is_expired_at(now) {
			return true;
		}

		let margin = if margin.is_nan() { DEFAULT_RENEWAL_MARGIN } else { margin.clamp(0., 1.) };

		self.remaining_at(now) < self.lifetime() * margin
	}

	/// Builds the sensitive `Authorization: Bearer <token>` header value.
	pub fn authorization_header(&self) -> Result<HeaderValue, MalformedResponseError> {
		self.secret.bearer_header()
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("secret", &self.secret)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// The subset of registered JWT claims the renewal policy cares about.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
pub(crate) struct JwtClaims {
	pub(crate) iat: Option<f64>,
	pub(crate) exp: Option<f64>,
}
impl JwtClaims {
	/// Decodes the payload segment without verifying the signature.
	pub(crate) fn decode(jwt: &str) -> Option<Self> {
		let payload = jwt.split('.').nth(1)?;
		let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;

		serde_json::from_slice(&bytes).ok()
	}
}

/// Converts (fractional) unix seconds into an instant.
pub(crate) fn timestamp(secs: f64) -> Option<OffsetDateTime> {
	if !secs.is_finite() {
		return None;
	}

	OffsetDateTime::from_unix_timestamp_nanos((secs * 1e9).round() as i128).ok()
}
