//! Client configuration and environment-backed credential loading.

// std
use std::{env, path::PathBuf};
// self
use crate::{
	_prelude::*,
	auth::{
		ACCESS_TOKEN_KEY, ACCESS_TOKEN_SECRET, BEARER_TOKEN, CONSUMER_KEY, CONSUMER_SECRET,
		RawCredentials,
	},
	error::ConfigError,
	signer::SignatureMethod,
};

/// Default REST API base.
pub const DEFAULT_API_BASE: &str = "https://api.twitter.com/";
/// Default client-credentials token endpoint.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://api.twitter.com/oauth2/token";

/// Environment variable holding the consumer key.
pub const ENV_CONSUMER_KEY: &str = "TWITTER_CONSUMER_KEY";
/// Environment variable holding the consumer secret.
pub const ENV_CONSUMER_SECRET: &str = "TWITTER_CONSUMER_SECRET";
/// Environment variable holding the access-token key.
pub const ENV_ACCESS_TOKEN_KEY: &str = "TWITTER_ACCESS_TOKEN_KEY";
/// Environment variable holding the access-token secret.
pub const ENV_ACCESS_TOKEN_SECRET: &str = "TWITTER_ACCESS_TOKEN_SECRET";
/// Environment variable holding a pre-issued bearer token.
pub const ENV_BEARER_TOKEN: &str = "TWITTER_BEARER_TOKEN";

const ENV_FIELDS: [(&str, &str); 5] = [
	(ENV_CONSUMER_KEY, CONSUMER_KEY),
	(ENV_CONSUMER_SECRET, CONSUMER_SECRET),
	(ENV_ACCESS_TOKEN_KEY, ACCESS_TOKEN_KEY),
	(ENV_ACCESS_TOKEN_SECRET, ACCESS_TOKEN_SECRET),
	(ENV_BEARER_TOKEN, BEARER_TOKEN),
];

/// Endpoints and signing options shared by the authorizer and the API client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// REST API base; always ends with `/`.
	pub api_base: Url,
	/// Client-credentials token endpoint.
	pub token_endpoint: Url,
	/// HMAC flavor for user-authenticated requests.
	pub signature_method: SignatureMethod,
}
impl ClientConfig {
	/// Starts a builder seeded with the public API defaults.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}
}

/// Builder for [`ClientConfig`]; URLs are parsed in [`ClientConfigBuilder::build`].
#[derive(Clone, Debug)]
pub struct ClientConfigBuilder {
	api_base: String,
	token_endpoint: String,
	signature_method: SignatureMethod,
}
impl ClientConfigBuilder {
	/// Overrides the REST API base.
	pub fn api_base(mut self, url: impl Into<String>) -> Self {
		self.api_base = url.into();

		self
	}

	/// Overrides the token endpoint.
	pub fn token_endpoint(mut self, url: impl Into<String>) -> Self {
		self.token_endpoint = url.into();

		self
	}

	/// Overrides the signature method.
	pub fn signature_method(mut self, method: SignatureMethod) -> Self {
		self.signature_method = method;

		self
	}

	/// Parses the configured URLs.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let mut api_base = self.api_base;

		if !api_base.ends_with('/') {
			api_base.push('/');
		}

		let api_base = Url::parse(&api_base)
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "api_base", source })?;
		let token_endpoint = Url::parse(&self.token_endpoint)
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "token_endpoint", source })?;

		Ok(ClientConfig { api_base, token_endpoint, signature_method: self.signature_method })
	}
}
impl Default for ClientConfigBuilder {
	fn default() -> Self {
		Self {
			api_base: DEFAULT_API_BASE.into(),
			token_endpoint: DEFAULT_TOKEN_ENDPOINT.into(),
			signature_method: SignatureMethod::default(),
		}
	}
}

impl RawCredentials {
	/// Reads the `TWITTER_*` variables from the process environment.
	///
	/// Unset variables become empty strings, so every field is always present.
	pub fn from_env() -> Self {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Same as [`RawCredentials::from_env`] with a caller-provided variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Self
	where
		F: Fn(&str) -> Option<String>,
	{
		ENV_FIELDS
			.iter()
			.map(|&(var, field)| (field, lookup(var).unwrap_or_default()))
			.collect()
	}
}

/// Loads `.env` from the current directory or its parents into the process environment.
///
/// Returns the loaded path, or `None` when no file exists.
pub fn load_dotenv() -> Result<Option<PathBuf>, ConfigError> {
	match dotenvy::dotenv() {
		Ok(path) => Ok(Some(path)),
		Err(err) if err.not_found() => Ok(None),
		Err(source) => Err(ConfigError::EnvFile { source }),
	}
}
