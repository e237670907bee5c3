//! Crate-level error types shared by the credential core, the transport, and the API client.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const BODY_PREVIEW_LIMIT: usize = 256;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential bag was rejected before any network use.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Bearer token exchange failed.
	#[error(transparent)]
	TokenExchange(#[from] TokenExchangeError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeouts).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// API call returned an error status or an undecodable body.
	#[error(transparent)]
	Api(#[from] ApiError),

	/// Failure of a single-flight operation, shared by every caller that joined it.
	#[error(transparent)]
	Shared(Arc<Error>),

	/// A bearer token was requested for an API version that uses user authentication.
	#[error("Refusing to create a bearer token for API version `{version}`, which uses user authentication.")]
	InvalidMode {
		/// API version the caller asked about.
		version: String,
	},
}

impl Error {
	/// Returns the underlying failure, looking through [`Error::Shared`].
	pub fn root(&self) -> &Error {
		match self {
			Self::Shared(inner) => inner.root(),
			other => other,
		}
	}
}

/// Failures raised while validating a raw credential bag.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ValidationError {
	/// A credential field is present but does not hold a string.
	#[error("Invalid value for {field}. Expected {expected} but got {actual}.")]
	TypeField {
		/// Offending field name.
		field: &'static str,
		/// Expected JSON type.
		expected: &'static str,
		/// JSON type that was supplied.
		actual: &'static str,
	},
	/// None of the recognized credential fields were supplied.
	#[error("No credentials defined.")]
	MissingCredentials,
	/// Only one half of a key/secret pair was supplied.
	#[error("Both {present} and {missing} must be defined; {missing} is missing.")]
	IncompletePair {
		/// Field that was supplied.
		present: &'static str,
		/// Field that is missing.
		missing: &'static str,
	},
	/// Access-token fields were supplied without the consumer pair they depend on.
	#[error("User authentication requires consumer_key and consumer_secret to be defined.")]
	DependentCredential,
}

/// Failures reported by the bearer token endpoint.
#[derive(Debug, ThisError)]
pub enum TokenExchangeError {
	/// Token endpoint reported application-level errors.
	#[error("Token endpoint rejected the exchange: {message}.")]
	Rejected {
		/// HTTP status code of the response.
		status: u16,
		/// `title` field of the error body, when present.
		title: Option<String>,
		/// Combined `title: errors[0].message` summary.
		message: String,
		/// `type` field of the error body, when present.
		code: Option<String>,
		/// `detail` field of the error body, when present.
		detail: Option<String>,
	},
	/// Token endpoint issued something other than a bearer token.
	#[error("Unexpected reply upon obtaining bearer token: expected \"bearer\" but found {found:?}.")]
	UnexpectedTokenType {
		/// Token type reported by the endpoint.
		found: Option<String>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Token endpoint reported a bearer token without an `access_token` value.
	#[error("Token endpoint response is missing access_token.")]
	MissingAccessToken {
		/// HTTP status code of the response.
		status: u16,
	},
	/// Token endpoint answered with a non-success status and no structured error body.
	#[error("Token endpoint returned HTTP {status}: {body_preview}.")]
	UnexpectedStatus {
		/// HTTP status code of the response.
		status: u16,
		/// Leading part of the response body.
		body_preview: String,
	},
	/// Token endpoint responded with malformed JSON.
	#[error("Token endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
}
impl TokenExchangeError {
	/// Returns the HTTP status attached to the failure.
	pub fn status(&self) -> u16 {
		match self {
			Self::Rejected { status, .. }
			| Self::UnexpectedTokenType { status, .. }
			| Self::MissingAccessToken { status }
			| Self::UnexpectedStatus { status, .. }
			| Self::Parse { status, .. } => *status,
		}
	}
}

/// Configuration and misuse failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A configured or derived URL could not be parsed.
	#[error("The {endpoint} URL is invalid.")]
	InvalidEndpoint {
		/// Which URL failed to parse.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// User authentication was requested but no access-token pair is configured.
	#[error("User authentication requires access_token_key and access_token_secret.")]
	MissingSigningKeyPair,
	/// The HMAC implementation refused the signing key.
	#[error("Signing key cannot be used with the configured signature method.")]
	InvalidSigningKey,
	/// A `.env` file exists but could not be loaded.
	#[error("The .env file could not be loaded.")]
	EnvFile {
		/// Underlying loader failure.
		#[source]
		source: dotenvy::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred during the {flow} call.")]
	Network {
		/// Flow label of the failing call.
		flow: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Request timed out.
	#[error("Request timed out during the {flow} call.")]
	Timeout {
		/// Flow label of the failing call.
		flow: &'static str,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while talking to the API.")]
	Io(#[from] std::io::Error),
	/// Any other HTTP client failure.
	#[error("HTTP client error occurred during the {flow} call: {message}.")]
	Other {
		/// Flow label of the failing call.
		flow: &'static str,
		/// Human-readable failure description.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(flow: &'static str, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { flow, source: Box::new(src) }
	}
}

/// Failures returned by regular API calls.
#[derive(Debug, ThisError)]
pub enum ApiError {
	/// Endpoint answered with a non-success status.
	#[error("{method} {url} returned HTTP {status}: {body_preview}.")]
	Status {
		/// HTTP method of the request.
		method: String,
		/// Request URL without credentials.
		url: String,
		/// HTTP status code.
		status: u16,
		/// Leading part of the response body.
		body_preview: String,
	},
	/// Response body could not be decoded into the requested type.
	#[error("Response from {url} could not be decoded.")]
	Decode {
		/// Request URL.
		url: String,
		/// HTTP status code.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
	},
}

/// Renders the first characters of a response body for error messages.
pub(crate) fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);

	if text.chars().count() <= BODY_PREVIEW_LIMIT {
		return text.into_owned();
	}

	text.chars().take(BODY_PREVIEW_LIMIT).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn body_preview_truncates_long_payloads() {
		let long = "x".repeat(BODY_PREVIEW_LIMIT * 2);

		assert_eq!(body_preview(long.as_bytes()).len(), BODY_PREVIEW_LIMIT);
		assert_eq!(body_preview(b"short"), "short");
	}

	#[test]
	fn validation_messages_name_the_fields() {
		let err = ValidationError::IncompletePair {
			present: "consumer_key",
			missing: "consumer_secret",
		};

		assert_eq!(
			err.to_string(),
			"Both consumer_key and consumer_secret must be defined; consumer_secret is missing."
		);

		let err = ValidationError::TypeField {
			field: "bearer_token",
			expected: "string",
			actual: "number",
		};

		assert_eq!(err.to_string(), "Invalid value for bearer_token. Expected string but got number.");
	}

	#[test]
	fn shared_failures_expose_their_root() {
		let inner = Error::from(ValidationError::MissingCredentials);
		let shared = Error::Shared(Arc::new(Error::Shared(Arc::new(inner))));

		assert!(matches!(shared.root(), Error::Validation(ValidationError::MissingCredentials)));
		assert_eq!(shared.to_string(), "No credentials defined.");
	}
}
