//! Application-only bearer tokens with a single-flight client-credentials exchange.
//!
//! [`BearerTokenManager`] is the only stateful piece of the credential core. Its slot is either
//! empty, resolved to a token, or holds the one exchange currently in flight. Callers never hold
//! a lock while waiting: they attach to the in-flight exchange and all receive its result,
//! failure included. Whichever caller observes completion first clears the marker, so a failed
//! exchange is never cached and the next call starts a fresh one.

mod exchange;

// crates.io
use async_lock::OnceCell;
// self
use crate::{
	_prelude::*,
	auth::{AuthMode, BearerToken, CredentialSet, SigningKeyPair},
	http::ApiHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	transport::{self, TransportErrorMapper},
};

type Flight = Arc<OnceCell<Result<BearerToken, Arc<Error>>>>;

/// Outcome of [`BearerTokenManager::ensure_fresh`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
	/// A token was already cached; nothing happened.
	Cached,
	/// The exchange ran and its token is now cached.
	Exchanged,
	/// No consumer pair is configured, so there is no token to cache and no request was made.
	Unauthenticated,
}

enum Slot {
	Empty,
	InFlight(Flight),
	Ready(BearerToken),
}

/// Caches the application bearer token and coordinates its exchange.
pub struct BearerTokenManager<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	consumer: Option<SigningKeyPair>,
	token_endpoint: Url,
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
	slot: Mutex<Slot>,
}
impl<C, M> BearerTokenManager<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a manager for `credentials`, seeding the cache with any preset bearer token.
	pub fn new(
		credentials: &CredentialSet,
		token_endpoint: Url,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let slot = match credentials.bearer().filter(|token| !token.is_empty()) {
			Some(token) => Slot::Ready(token.clone()),
			None => Slot::Empty,
		};

		Self {
			consumer: credentials.consumer().cloned(),
			token_endpoint,
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			slot: Mutex::new(slot),
		}
	}

	/// Returns the cached token, running the exchange first when the cache is empty.
	///
	/// Without a consumer pair the exchange yields an empty token and performs no request.
	/// Callers that arrive while an exchange is running share its outcome; a shared failure is
	/// reported as [`Error::Shared`], whose [`Error::root`] is the exchange's own error.
	pub async fn token(&self) -> Result<BearerToken> {
		let span = FlowSpan::new(FlowKind::TokenExchange, "bearer_token");

		span.instrument(async move { self.fill().await.map(|(token, _)| token) }).await
	}

	/// Makes sure a bearer token is cached before API calls against `version`.
	///
	/// Refuses with [`Error::InvalidMode`] when `version` uses user authentication.
	pub async fn ensure_fresh(&self, version: &str) -> Result<Freshness> {
		if AuthMode::for_version(version) == AuthMode::User {
			return Err(Error::InvalidMode { version: version.to_owned() });
		}

		let span = FlowSpan::new(FlowKind::TokenExchange, "ensure_fresh");

		span.instrument(async move { self.fill().await.map(|(_, freshness)| freshness) }).await
	}

	/// Returns the cached token without triggering or awaiting an exchange.
	pub fn cached(&self) -> Option<BearerToken> {
		match &*self.slot.lock() {
			Slot::Ready(token) => Some(token.clone()),
			Slot::Empty | Slot::InFlight(_) => None,
		}
	}

	async fn fill(&self) -> Result<(BearerToken, Freshness)> {
		let flight = {
			let mut slot = self.slot.lock();

			match &*slot {
				Slot::Ready(token) => return Ok((token.clone(), Freshness::Cached)),
				Slot::InFlight(flight) => Arc::clone(flight),
				Slot::Empty => {
					let flight = Flight::default();

					*slot = Slot::InFlight(Arc::clone(&flight));

					flight
				},
			}
		};
		let outcome = flight
			.get_or_init(|| async { self.exchange().await.map_err(Arc::new) })
			.await
			.clone();

		self.settle(&flight, &outcome);

		let token = outcome.map_err(Error::Shared)?;
		let freshness =
			if token.is_empty() { Freshness::Unauthenticated } else { Freshness::Exchanged };

		Ok((token, freshness))
	}

	// Replaces the in-flight marker once, leaving any newer state alone.
	fn settle(&self, flight: &Flight, outcome: &Result<BearerToken, Arc<Error>>) {
		let mut slot = self.slot.lock();
		let current = match &*slot {
			Slot::InFlight(current) => Arc::ptr_eq(current, flight),
			Slot::Empty | Slot::Ready(_) => false,
		};

		if !current {
			return;
		}

		*slot = match outcome {
			Ok(token) if !token.is_empty() => Slot::Ready(token.clone()),
			_ => Slot::Empty,
		};
	}

	async fn exchange(&self) -> Result<BearerToken> {
		let Some(consumer) = self.consumer.as_ref() else {
			obs::debug_event(FlowKind::TokenExchange, "no consumer pair; using an empty bearer token");

			return Ok(BearerToken::empty());
		};

		obs::record_flow_outcome(FlowKind::TokenExchange, FlowOutcome::Attempt);

		let result: Result<BearerToken> = async {
			let request = exchange::build_request(&self.token_endpoint, consumer)?;
			let response = transport::execute(
				&*self.http_client,
				&*self.transport_mapper,
				FlowKind::TokenExchange,
				request,
			)
			.await?;

			Ok(exchange::parse_response(&response)?)
		}
		.await;

		obs::record_flow_outcome(FlowKind::TokenExchange, FlowOutcome::of(&result));

		result
	}
}
impl<C, M> Debug for BearerTokenManager<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BearerTokenManager")
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("consumer_set", &self.consumer.is_some())
			.finish()
	}
}
