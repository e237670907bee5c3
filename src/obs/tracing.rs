// self
use crate::{_prelude::*, obs::FlowKind};

/// Future returned by [`FlowSpan::instrument`]; a plain passthrough unless `tracing` is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`FlowSpan::instrument`]; a plain passthrough unless `tracing` is enabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// `x_purge.flow` span wrapping one token exchange, authorization, API call, or purge run.
///
/// `stage` names the call site (`bearer_token`, `send`, a purge job label, ...) so nested spans
/// read as a path through the flow.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens the span for `kind` at `stage`.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self { span: tracing::info_span!("x_purge.flow", flow = kind.as_str(), stage) }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Runs `fut` inside the span; the span is re-entered on every poll.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
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

/// Logs a failure the purge loop records and moves past, such as a single failed delete.
pub fn warn_skipped(kind: FlowKind, subject: &str, error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(flow = kind.as_str(), subject, error = %error, "operation failed and was skipped");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, subject, error);
	}
}

/// Logs a fixed debug message under `kind`.
pub fn debug_event(kind: FlowKind, message: &'static str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(flow = kind.as_str(), "{message}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, message);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{error::ValidationError, obs::FlowOutcome};

	#[tokio::test]
	async fn instrumented_flows_keep_their_result() {
		let span = FlowSpan::new(FlowKind::Purge, "tweets");
		let ok: Result<usize> = span.instrument(async { Ok(3) }).await;
		let failed: Result<usize> =
			span.instrument(async { Err(ValidationError::MissingCredentials.into()) }).await;

		assert_eq!(FlowOutcome::of(&ok), FlowOutcome::Success);
		assert_eq!(ok.expect("Instrumented value should pass through."), 3);
		assert_eq!(FlowOutcome::of(&failed), FlowOutcome::Failure);
	}

	#[test]
	fn log_helpers_accept_crate_errors() {
		warn_skipped(FlowKind::Purge, "1234", &ValidationError::DependentCredential);
		debug_event(FlowKind::TokenExchange, "no consumer pair; using an empty bearer token");
	}
}
