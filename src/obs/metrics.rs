// self
use crate::obs::{AuthOp, AuthOutcome, CacheDecision};

/// Counter incremented once per token fetch stage, labeled by `op` + `outcome`.
pub const AUTH_COUNTER: &str = "impact_stack_rest_auth_total";
/// Counter incremented once per token-cache lookup, labeled by `decision`.
pub const TOKEN_CACHE_COUNTER: &str = "impact_stack_rest_token_cache_total";

/// Counts a token fetch stage (when the `metrics` feature is enabled).
pub fn record_auth_outcome(op: AuthOp, outcome: AuthOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(AUTH_COUNTER, "op" => op.as_str(), "outcome" => outcome.as_str())
			.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (op, outcome);
	}
}

/// Counts what the middleware did with its cached token (when the `metrics` feature is enabled).
pub fn record_cache_decision(decision: CacheDecision) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(TOKEN_CACHE_COUNTER, "decision" => decision.as_str()).increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = decision;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn counters_accept_every_label() {
		for op in [AuthOp::Issue, AuthOp::Renew] {
			for outcome in [AuthOutcome::Attempt, AuthOutcome::Success, AuthOutcome::Failure] {
				record_auth_outcome(op, outcome);
			}
		}
		for decision in [CacheDecision::Reuse, CacheDecision::Empty, CacheDecision::Renew] {
			record_cache_decision(decision);
		}

		assert_ne!(AUTH_COUNTER, TOKEN_CACHE_COUNTER);
	}
}
