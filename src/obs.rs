//! Optional observability helpers for token fetches and outbound requests.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `impact_stack_rest.auth` with the `op` (issue/renew)
//!   and `stage` (call site) fields, plus `debug` events for dispatched requests and
//!   token-cache decisions.
//! - Enable `metrics` to increment the `impact_stack_rest_auth_total` counter for every token
//!   fetch attempt/success/failure, labeled by `op` + `outcome`, and the
//!   `impact_stack_rest_token_cache_total` counter for every cache lookup, labeled by `decision`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Token operations performed against the auth service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthOp {
	/// Exchange of the API key for a fresh JWT.
	Issue,
	/// Renewal of an existing JWT without an API key.
	Renew,
}
impl AuthOp {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthOp::Issue => "issue",
			AuthOp::Renew => "renew",
		}
	}
}
impl Display for AuthOp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each token fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthOutcome {
	/// A fetch was started.
	Attempt,
	/// The auth service issued a token.
	Success,
	/// The failure was propagated back to the caller.
	Failure,
}
impl AuthOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthOutcome::Attempt => "attempt",
			AuthOutcome::Success => "success",
			AuthOutcome::Failure => "failure",
		}
	}
}
impl Display for AuthOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// What the middleware decided to do with its cached token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheDecision {
	/// The cached token has enough lifetime left.
	Reuse,
	/// Nothing is cached yet.
	Empty,
	/// The cached token is past its renewal point.
	Renew,
}
impl CacheDecision {
	/// Returns a stable label suitable for event fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheDecision::Reuse => "reuse",
			CacheDecision::Empty => "empty",
			CacheDecision::Renew => "renew",
		}
	}
}
