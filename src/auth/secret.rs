//! Redacting wrappers for secrets, bearer tokens, and signing key pairs.

// self
use crate::_prelude::*;

/// Redacted secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);
impl Secret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Secret").field(&"<redacted>").finish()
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Application-level bearer token.
///
/// An empty token stands for "unauthenticated": it is what the exchange yields when no consumer
/// pair is configured, and the token manager never treats it as cached.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(Secret);
impl BearerToken {
	const PREFIX: &'static str = "Bearer ";

	/// Wraps a raw token, stripping a leading `"Bearer "` prefix.
	pub fn new(value: impl Into<String>) -> Self {
		let value = value.into();
		let value = match value.strip_prefix(Self::PREFIX) {
			Some(stripped) => stripped.to_owned(),
			None => value,
		};

		Self(Secret::new(value))
	}

	/// Token used when no consumer pair is available to run an exchange.
	pub fn empty() -> Self {
		Self(Secret::new(String::new()))
	}

	/// Returns the token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		self.0.expose()
	}

	/// Whether this is the "unauthenticated" empty token.
	pub fn is_empty(&self) -> bool {
		self.expose().is_empty()
	}
}
impl Debug for BearerToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("BearerToken").field(&"<redacted>").finish()
	}
}

/// Key/secret pair consumed by the request signer (consumer pair or access-token pair).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigningKeyPair {
	/// Public key half, sent as `oauth_consumer_key` or `oauth_token`.
	pub key: String,
	/// Secret half, only ever used to derive the signing key.
	pub secret: Secret,
}
impl SigningKeyPair {
	/// Builds a pair from its two halves.
	pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
		Self { key: key.into(), secret: Secret::new(secret) }
	}
}

/// Value placed verbatim into an `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationHeader(String);
impl AuthorizationHeader {
	/// Builds a `Bearer <token>` header value.
	pub fn bearer(token: &BearerToken) -> Self {
		Self(format!("Bearer {}", token.expose()))
	}

	pub(crate) fn from_raw(value: String) -> Self {
		Self(value)
	}

	/// Returns the header value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for AuthorizationHeader {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let scheme = self.0.split_once(' ').map(|(scheme, _)| scheme).unwrap_or("<unknown>");

		write!(f, "AuthorizationHeader({scheme} <redacted>)")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = Secret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "Secret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");

		let pair = SigningKeyPair::new("visible-key", "hidden-secret");

		assert!(!format!("{pair:?}").contains("hidden-secret"));
	}

	#[test]
	fn bearer_prefix_is_stripped_once() {
		assert_eq!(BearerToken::new("Bearer abc123").expose(), "abc123");
		assert_eq!(BearerToken::new("abc123").expose(), "abc123");
		assert_eq!(BearerToken::new("Bearer Bearer x").expose(), "Bearer x");
		assert!(BearerToken::new("").is_empty());
	}

	#[test]
	fn authorization_header_debug_hides_credentials() {
		let header = AuthorizationHeader::bearer(&BearerToken::new("abc123"));

		assert_eq!(header.expose(), "Bearer abc123");
		assert_eq!(format!("{header:?}"), "AuthorizationHeader(Bearer <redacted>)");
	}
}
