//! Purge an X/Twitter account from Rust: validated credentials, single-flight bearer tokens,
//! OAuth 1.0a request signing, and a list-then-delete loop behind an injectable transport.
//!
//! The credential core is [`auth::CredentialSet`] (what was supplied),
//! [`bearer::BearerTokenManager`] (app auth), [`signer::RequestSigner`] (user auth), and
//! [`authorizer::Authorizer`], which picks between the two per API version.
//! [`api::ApiClient`] sends the authorized requests and drives [`purge::PurgeJob`]s.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod authorizer;
pub mod bearer;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod purge;
pub mod signer;
pub mod transport;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// std
	use std::{
		collections::VecDeque,
		io::Error as IoError,
		task::{Context, Poll},
	};
	// crates.io
	use oauth2::{
		AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
		http::{HeaderMap, Method, StatusCode},
	};
	// self
	use crate::{
		error::{ConfigError, TransportError},
		http::{ApiHttpClient, ResponseMetadata, ResponseMetadataSlot},
		obs::FlowKind,
		transport::TransportErrorMapper,
	};
	#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

	/// Request captured by [`ScriptedHttpClient`].
	#[derive(Clone, Debug)]
	pub struct RecordedRequest {
		/// HTTP method.
		pub method: Method,
		/// Full request URI.
		pub uri: String,
		/// Request headers.
		pub headers: HeaderMap,
		/// Raw body.
		pub body: Vec<u8>,
	}

	/// In-memory transport that replays canned replies in order and records every request.
	///
	/// Once the script runs out, calls fail with [`HttpClientError::Other`]. Each call yields to
	/// the executor once before answering so concurrent callers genuinely interleave.
	#[derive(Clone, Debug, Default)]
	pub struct ScriptedHttpClient(Arc<ScriptedState>);
	impl ScriptedHttpClient {
		/// Appends a reply with `status` and `body`.
		pub fn reply(self, status: u16, body: impl Into<String>) -> Self {
			self.0.replies.lock().push_back((status, body.into()));

			self
		}

		/// Number of requests received so far.
		pub fn calls(&self) -> usize {
			self.0.requests.lock().len()
		}

		/// Every request received so far, oldest first.
		pub fn requests(&self) -> Vec<RecordedRequest> {
			self.0.requests.lock().clone()
		}
	}
	impl ApiHttpClient for ScriptedHttpClient {
		type Handle = ScriptedHandle;
		type TransportError = IoError;

		fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
			ScriptedHandle { state: Arc::clone(&self.0), slot }
		}
	}

	#[derive(Debug, Default)]
	struct ScriptedState {
		replies: Mutex<VecDeque<(u16, String)>>,
		requests: Mutex<Vec<RecordedRequest>>,
	}

	/// Handle returned by [`ScriptedHttpClient`].
	#[derive(Debug)]
	pub struct ScriptedHandle {
		state: Arc<ScriptedState>,
		slot: ResponseMetadataSlot,
	}
	impl<'c> AsyncHttpClient<'c> for ScriptedHandle {
		type Error = HttpClientError<IoError>;
		type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

		fn call(&'c self, request: HttpRequest) -> Self::Future {
			Box::pin(async move {
				self.slot.take();

				let (parts, body) = request.into_parts();

				self.state.requests.lock().push(RecordedRequest {
					method: parts.method,
					uri: parts.uri.to_string(),
					headers: parts.headers,
					body,
				});

				YieldNow(false).await;

				let next = self.state.replies.lock().pop_front();
				let Some((status, body)) = next else {
					return Err(HttpClientError::Other("no scripted reply left".into()));
				};
				let status = match StatusCode::from_u16(status) {
					Ok(status) => status,
					Err(err) => return Err(HttpClientError::Other(err.to_string())),
				};

				self.slot.store(ResponseMetadata { status: Some(status.as_u16()), retry_after: None });

				let mut response = HttpResponse::new(body.into_bytes());

				*response.status_mut() = status;

				Ok(response)
			})
		}
	}

	/// Maps [`ScriptedHttpClient`] failures into crate errors.
	#[derive(Clone, Copy, Debug, Default)]
	pub struct ScriptedTransportErrorMapper;
	impl TransportErrorMapper<IoError> for ScriptedTransportErrorMapper {
		fn map_transport_error(
			&self,
			flow: FlowKind,
			metadata: Option<&ResponseMetadata>,
			error: HttpClientError<IoError>,
		) -> Error {
			let status = metadata.and_then(|meta| meta.status);

			match error {
				HttpClientError::Io(inner) => TransportError::Io(inner).into(),
				HttpClientError::Http(inner) => ConfigError::from(inner).into(),
				HttpClientError::Other(message) =>
					TransportError::Other { flow: flow.as_str(), message, status }.into(),
				other => TransportError::Other { flow: flow.as_str(), message: other.to_string(), status }
					.into(),
			}
		}
	}

	struct YieldNow(bool);
	impl Future for YieldNow {
		type Output = ();

		fn poll(mut self: Pin<&mut Self>, cx: &mut Context) -> Poll<()> {
			if self.0 {
				return Poll::Ready(());
			}

			self.0 = true;
			cx.waker().wake_by_ref();

			Poll::Pending
		}
	}

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
