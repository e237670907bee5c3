// self
use crate::obs::{FlowKind, FlowOutcome};

/// Records a flow outcome via the global metrics recorder (when enabled).
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"x_purge_flow_total",
			"flow" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Adds `count` deleted items to the purge counter (when enabled).
pub fn record_purged(label: &str, count: u64) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("x_purge_deleted_total", "job" => label.to_owned()).increment(count);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (label, count);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_metrics() {
		record_flow_outcome(FlowKind::TokenExchange, FlowOutcome::Failure);
		record_purged("tweets", 3);
	}
}
