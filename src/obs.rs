//! Optional observability helpers for the credential core and the purge loop.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `x_purge.flow` with the `flow` and `stage`
//!   (call site) fields, plus events for delete failures the purge loop records and moves past.
//! - Enable `metrics` to increment the `x_purge_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`, and `x_purge_deleted_total`
//!   (labeled by `job`) once per finished purge run.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Client-credentials exchange for a bearer token.
	TokenExchange,
	/// Authorization header computation (bearer or OAuth 1.0a).
	Authorization,
	/// Regular API request.
	ApiCall,
	/// Paginated delete loop.
	Purge,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::TokenExchange => "token_exchange",
			FlowKind::Authorization => "authorization",
			FlowKind::ApiCall => "api_call",
			FlowKind::Purge => "purge",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}

	/// Maps a result onto the success/failure label.
	pub fn of<T, E>(result: &std::result::Result<T, E>) -> Self {
		if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure }
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
