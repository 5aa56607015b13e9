// self
use crate::{
	_prelude::*,
	obs::{AuthOp, CacheDecision},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedAuth<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedAuth<F> = F;

/// Span wrapping a single token fetch.
#[derive(Clone, Debug)]
pub struct AuthSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl AuthSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(op: AuthOp, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("impact_stack_rest.auth", op = op.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedAuth<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a `debug` event for a request that is about to be sent.
pub fn trace_request(method: &Method, url: &Url) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(%method, %url, "Sending request.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (method, url);
	}
}

/// Emits a `debug` event for a response with a non-success status.
pub fn trace_status_failure(status: u16, url: &Url) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(status, %url, "Request failed with a non-success status.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (status, url);
	}
}

/// Emits a `debug` event describing a token-cache decision.
pub fn trace_cache_decision(decision: CacheDecision, remaining: Option<Duration>) {
	#[cfg(feature = "tracing")]
	{
		let remaining_secs = remaining.map(|d| d.whole_seconds());

		tracing::debug!(decision = decision.as_str(), ?remaining_secs, "Token cache checked.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (decision, remaining);
	}
}
