//! Loosely typed credential input and the validated [`CredentialSet`].

// crates.io
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	auth::{BearerToken, SigningKeyPair},
	error::ValidationError,
};

/// `consumer_key` field name.
pub const CONSUMER_KEY: &str = "consumer_key";
/// `consumer_secret` field name.
pub const CONSUMER_SECRET: &str = "consumer_secret";
/// `bearer_token` field name.
pub const BEARER_TOKEN: &str = "bearer_token";
/// `access_token_key` field name.
pub const ACCESS_TOKEN_KEY: &str = "access_token_key";
/// `access_token_secret` field name.
pub const ACCESS_TOKEN_SECRET: &str = "access_token_secret";

const FIELDS: [&str; 5] =
	[CONSUMER_KEY, CONSUMER_SECRET, BEARER_TOKEN, ACCESS_TOKEN_KEY, ACCESS_TOKEN_SECRET];

/// Unvalidated credential bag, as handed over by configuration loaders.
///
/// Values are arbitrary JSON so callers feeding untrusted input get a typed
/// [`ValidationError::TypeField`] instead of a panic. `null` values count as absent, while empty
/// strings count as present.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawCredentials(Map<String, Value>);
impl RawCredentials {
	/// Creates an empty bag.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets a field to an arbitrary JSON value.
	pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.0.insert(field.into(), value.into());

		self
	}

	/// Builds a bag from a JSON object; any other JSON shape yields an empty bag.
	pub fn from_json(value: Value) -> Self {
		match value {
			Value::Object(map) => Self(map),
			_ => Self::default(),
		}
	}

	/// Reads a field, treating `null` as absent.
	pub fn get(&self, field: &str) -> Option<&Value> {
		self.0.get(field).filter(|value| !value.is_null())
	}

	fn strip_nulls(&mut self) {
		self.0.retain(|_, value| !value.is_null());
	}

	fn string(&self, field: &'static str) -> Result<Option<&str>, ValidationError> {
		match self.0.get(field) {
			None => Ok(None),
			Some(Value::String(value)) => Ok(Some(value)),
			Some(other) =>
				Err(ValidationError::TypeField { field, expected: "string", actual: json_type(other) }),
		}
	}
}
impl<K, V> FromIterator<(K, V)> for RawCredentials
where
	K: Into<String>,
	V: Into<Value>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		Self(iter.into_iter().map(|(field, value)| (field.into(), value.into())).collect())
	}
}

/// Validated, immutable description of which credentials were supplied.
///
/// Only [`CredentialSet::validate`] constructs values, so every downstream consumer can match
/// exhaustively instead of re-checking field presence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialSet {
	/// Consumer pair only; bearer tokens are obtained through the token exchange.
	Consumer {
		/// Application consumer key/secret.
		consumer: SigningKeyPair,
	},
	/// Pre-issued bearer token only.
	Bearer {
		/// Bearer token with any `"Bearer "` prefix stripped.
		bearer: BearerToken,
	},
	/// Consumer pair plus a pre-issued bearer token.
	ConsumerBearer {
		/// Application consumer key/secret.
		consumer: SigningKeyPair,
		/// Bearer token with any `"Bearer "` prefix stripped.
		bearer: BearerToken,
	},
	/// Full user authentication: consumer pair plus access-token pair.
	User {
		/// Application consumer key/secret.
		consumer: SigningKeyPair,
		/// User access-token key/secret.
		access: SigningKeyPair,
		/// Bearer token supplied alongside, if any.
		bearer: Option<BearerToken>,
	},
}
impl CredentialSet {
	/// Validates a raw bag and returns the matching variant.
	pub fn validate(mut raw: RawCredentials) -> Result<Self, ValidationError> {
		raw.strip_nulls();

		let consumer_key = raw.string(CONSUMER_KEY)?;
		let consumer_secret = raw.string(CONSUMER_SECRET)?;
		let bearer_token = raw.string(BEARER_TOKEN)?;
		let access_token_key = raw.string(ACCESS_TOKEN_KEY)?;
		let access_token_secret = raw.string(ACCESS_TOKEN_SECRET)?;

		if FIELDS.iter().all(|field| raw.get(field).is_none()) {
			return Err(ValidationError::MissingCredentials);
		}

		let consumer = pair(CONSUMER_KEY, consumer_key, CONSUMER_SECRET, consumer_secret)?;
		let access =
			pair(ACCESS_TOKEN_KEY, access_token_key, ACCESS_TOKEN_SECRET, access_token_secret)?;
		let bearer = bearer_token.map(BearerToken::new);

		match (consumer, access, bearer) {
			(None, Some(_), _) => Err(ValidationError::DependentCredential),
			(Some(consumer), Some(access), bearer) => Ok(Self::User { consumer, access, bearer }),
			(Some(consumer), None, Some(bearer)) => Ok(Self::ConsumerBearer { consumer, bearer }),
			(Some(consumer), None, None) => Ok(Self::Consumer { consumer }),
			(None, None, Some(bearer)) => Ok(Self::Bearer { bearer }),
			(None, None, None) => Err(ValidationError::MissingCredentials),
		}
	}

	/// Consumer pair, when configured.
	pub fn consumer(&self) -> Option<&SigningKeyPair> {
		match self {
			Self::Consumer { consumer }
			| Self::ConsumerBearer { consumer, .. }
			| Self::User { consumer, .. } => Some(consumer),
			Self::Bearer { .. } => None,
		}
	}

	/// Access-token pair, when user authentication is configured.
	pub fn access(&self) -> Option<&SigningKeyPair> {
		match self {
			Self::User { access, .. } => Some(access),
			Self::Consumer { .. } | Self::Bearer { .. } | Self::ConsumerBearer { .. } => None,
		}
	}

	/// Pre-issued bearer token, when supplied.
	pub fn bearer(&self) -> Option<&BearerToken> {
		match self {
			Self::Bearer { bearer } | Self::ConsumerBearer { bearer, .. } => Some(bearer),
			Self::User { bearer, .. } => bearer.as_ref(),
			Self::Consumer { .. } => None,
		}
	}

	/// Stable label of the variant for logs.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Consumer { .. } => "consumer",
			Self::Bearer { .. } => "bearer",
			Self::ConsumerBearer { .. } => "consumer_bearer",
			Self::User { .. } => "user",
		}
	}
}
impl TryFrom<RawCredentials> for CredentialSet {
	type Error = ValidationError;

	fn try_from(raw: RawCredentials) -> Result<Self, Self::Error> {
		Self::validate(raw)
	}
}

fn pair(
	key_field: &'static str,
	key: Option<&str>,
	secret_field: &'static str,
	secret: Option<&str>,
) -> Result<Option<SigningKeyPair>, ValidationError> {
	match (key, secret) {
		(Some(key), Some(secret)) => Ok(Some(SigningKeyPair::new(key, secret))),
		(None, None) => Ok(None),
		(Some(_), None) =>
			Err(ValidationError::IncompletePair { present: key_field, missing: secret_field }),
		(None, Some(_)) =>
			Err(ValidationError::IncompletePair { present: secret_field, missing: key_field }),
	}
}

fn json_type(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn validate(value: Value) -> Result<CredentialSet, ValidationError> {
		CredentialSet::validate(RawCredentials::from_json(value))
	}

	#[test]
	fn empty_and_null_only_bags_are_missing_credentials() {
		assert_eq!(validate(json!({})), Err(ValidationError::MissingCredentials));
		assert_eq!(
			validate(json!({ "consumer_key": null, "bearer_token": null, "unrelated": "x" })),
			Err(ValidationError::MissingCredentials)
		);
	}

	#[test]
	fn non_string_fields_are_type_errors() {
		assert_eq!(
			validate(json!({ "consumer_key": 7, "consumer_secret": "s" })),
			Err(ValidationError::TypeField {
				field: "consumer_key",
				expected: "string",
				actual: "number"
			})
		);
		assert_eq!(
			validate(json!({ "consumer_key": "k", "consumer_secret": ["s"] })),
			Err(ValidationError::TypeField {
				field: "consumer_secret",
				expected: "string",
				actual: "array"
			})
		);
		assert_eq!(
			validate(json!({ "bearer_token": true })),
			Err(ValidationError::TypeField {
				field: "bearer_token",
				expected: "string",
				actual: "boolean"
			})
		);
	}

	#[test]
	fn half_pairs_are_rejected() {
		assert_eq!(
			validate(json!({ "consumer_key": "k" })),
			Err(ValidationError::IncompletePair {
				present: "consumer_key",
				missing: "consumer_secret"
			})
		);
		assert_eq!(
			validate(json!({ "consumer_secret": "s", "bearer_token": "b" })),
			Err(ValidationError::IncompletePair {
				present: "consumer_secret",
				missing: "consumer_key"
			})
		);
		assert_eq!(
			validate(json!({ "consumer_key": "k", "consumer_secret": "s", "access_token_key": "a" })),
			Err(ValidationError::IncompletePair {
				present: "access_token_key",
				missing: "access_token_secret"
			})
		);
	}

	#[test]
	fn access_pair_requires_consumer_pair() {
		assert_eq!(
			validate(json!({ "access_token_key": "a", "access_token_secret": "b" })),
			Err(ValidationError::DependentCredential)
		);
		assert_eq!(
			validate(json!({
				"access_token_key": "a",
				"access_token_secret": "b",
				"bearer_token": "t"
			})),
			Err(ValidationError::DependentCredential)
		);
	}

	#[test]
	fn valid_bags_map_to_variants() {
		let set = validate(json!({ "consumer_key": "k", "consumer_secret": "s" }))
			.expect("Consumer-only bag should validate.");

		assert_eq!(set, CredentialSet::Consumer { consumer: SigningKeyPair::new("k", "s") });

		let set = validate(json!({ "bearer_token": "Bearer abc123" }))
			.expect("Bearer-only bag should validate.");

		assert_eq!(set.bearer().map(BearerToken::expose), Some("abc123"));
		assert_eq!(set.kind(), "bearer");

		let set = validate(json!({ "consumer_key": "k", "consumer_secret": "s", "bearer_token": "t" }))
			.expect("Consumer + bearer bag should validate.");

		assert_eq!(set.kind(), "consumer_bearer");

		let set = validate(json!({
			"consumer_key": "k",
			"consumer_secret": "s",
			"access_token_key": "a",
			"access_token_secret": "b"
		}))
		.expect("Full user bag should validate.");

		assert_eq!(set.access(), Some(&SigningKeyPair::new("a", "b")));
		assert!(set.bearer().is_none());
	}

	#[test]
	fn empty_strings_count_as_present() {
		let set = validate(json!({
			"consumer_key": "",
			"consumer_secret": "",
			"access_token_key": "",
			"access_token_secret": "",
			"bearer_token": ""
		}))
		.expect("Environment-style bag of empty strings should validate.");

		assert_eq!(set.kind(), "user");
		assert!(set.bearer().is_some_and(BearerToken::is_empty));
		assert_eq!(
			validate(json!({ "consumer_key": "" })),
			Err(ValidationError::IncompletePair {
				present: "consumer_key",
				missing: "consumer_secret"
			})
		);
	}

	#[test]
	fn iterator_construction_matches_json() {
		let raw: RawCredentials = [("consumer_key", "k"), ("consumer_secret", "s")].into_iter().collect();

		assert_eq!(raw, RawCredentials::from_json(json!({ "consumer_key": "k", "consumer_secret": "s" })));
		assert!(CredentialSet::try_from(raw).is_ok());
	}
}
