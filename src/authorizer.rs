//! Routes each request to app or user authentication and returns its `Authorization` value.

// crates.io
use oauth2::http::Method;
// self
use crate::{
	_prelude::*,
	auth::{AuthMode, AuthorizationHeader, CredentialSet, RawCredentials},
	bearer::BearerTokenManager,
	config::ClientConfig,
	error::ConfigError,
	http::ApiHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	signer::{RequestSigner, SignableRequest},
	transport::TransportErrorMapper,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, transport::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Authorizer specialized for the crate's default reqwest transport stack.
pub type ReqwestAuthorizer = Authorizer<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Method and form body of a request about to be authorized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
	/// HTTP method the request will be sent with.
	pub method: Method,
	/// Form body parameters; covered by OAuth 1.0a signatures.
	pub form: Vec<(String, String)>,
}
impl ApiRequest {
	/// Describes a request without a body.
	pub fn new(method: Method) -> Self {
		Self { method, form: Vec::new() }
	}

	/// `GET` without a body.
	pub fn get() -> Self {
		Self::new(Method::GET)
	}

	/// `DELETE` without a body.
	pub fn delete() -> Self {
		Self::new(Method::DELETE)
	}

	/// `POST` carrying `form` as an urlencoded body.
	pub fn post<I, K, V>(form: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self::new(Method::POST).with_form(form)
	}

	/// Replaces the form body.
	pub fn with_form<I, K, V>(mut self, form: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.form = form.into_iter().map(|(key, value)| (key.into(), value.into())).collect();

		self
	}
}

/// Computes `Authorization` values from a validated [`CredentialSet`].
///
/// Version `"2"` requests get the application bearer token, every other version is signed with
/// OAuth 1.0a using the access-token pair.
pub struct Authorizer<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	credentials: CredentialSet,
	signer: Option<RequestSigner>,
	bearer: BearerTokenManager<C, M>,
}
impl<C, M> Authorizer<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an authorizer that exchanges bearer tokens through the given transport.
	pub fn with_http_client(
		credentials: CredentialSet,
		config: &ClientConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let signer = credentials.consumer().map(|consumer| {
			RequestSigner::new(consumer.clone()).with_signature_method(config.signature_method)
		});
		let bearer = BearerTokenManager::new(
			&credentials,
			config.token_endpoint.clone(),
			http_client,
			mapper,
		);

		Self { credentials, signer, bearer }
	}

	/// Validates `raw` and builds an authorizer from it.
	pub fn from_raw(
		raw: RawCredentials,
		config: &ClientConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let credentials = CredentialSet::validate(raw)?;

		Ok(Self::with_http_client(credentials, config, http_client, mapper))
	}

	/// Credentials this authorizer was built from.
	pub fn credentials(&self) -> &CredentialSet {
		&self.credentials
	}

	/// Bearer token manager backing app-authenticated requests.
	pub fn bearer(&self) -> &BearerTokenManager<C, M> {
		&self.bearer
	}

	/// Returns the `Authorization` value for `request` against `url` under `version`.
	pub async fn authorize(
		&self,
		url: &Url,
		request: &ApiRequest,
		version: &str,
	) -> Result<AuthorizationHeader> {
		let mode = AuthMode::for_version(version);
		let span = FlowSpan::new(FlowKind::Authorization, mode.as_str());

		obs::record_flow_outcome(FlowKind::Authorization, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				match mode {
					AuthMode::App =>
						self.bearer.token().await.map(|token| AuthorizationHeader::bearer(&token)),
					AuthMode::User => self.sign(url, request),
				}
			})
			.await;

		obs::record_flow_outcome(FlowKind::Authorization, FlowOutcome::of(&result));

		result
	}

	fn sign(&self, url: &Url, request: &ApiRequest) -> Result<AuthorizationHeader> {
		let (Some(signer), Some(access)) = (self.signer.as_ref(), self.credentials.access()) else {
			return Err(ConfigError::MissingSigningKeyPair.into());
		};
		let signable = SignableRequest::new(&request.method, url).with_form(&request.form);

		signer.sign(&signable, access)
	}
}
#[cfg(feature = "reqwest")]
impl Authorizer<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates an authorizer that provisions its own reqwest transport.
	pub fn new(credentials: CredentialSet, config: &ClientConfig) -> Self {
		Self::with_http_client(
			credentials,
			config,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Debug for Authorizer<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Authorizer")
			.field("credentials", &self.credentials.kind())
			.field("bearer", &self.bearer)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::{ScriptedHttpClient, ScriptedTransportErrorMapper},
		auth::SigningKeyPair,
	};

	type TestAuthorizer = Authorizer<ScriptedHttpClient, ScriptedTransportErrorMapper>;

	fn authorizer(raw: RawCredentials, client: &ScriptedHttpClient) -> TestAuthorizer {
		let config = ClientConfig::builder().build().expect("Default config should build.");

		Authorizer::from_raw(raw, &config, client.clone(), ScriptedTransportErrorMapper)
			.expect("Credentials should validate.")
	}

	fn full_set() -> RawCredentials {
		RawCredentials::new()
			.with("consumer_key", "ck")
			.with("consumer_secret", "cs")
			.with("access_token_key", "ak")
			.with("access_token_secret", "as")
	}

	fn url(raw: &str) -> Url {
		Url::parse(raw).expect("Test URL should parse.")
	}

	#[tokio::test]
	async fn version_two_uses_the_bearer_token() {
		let client = ScriptedHttpClient::default();
		let authorizer = authorizer(RawCredentials::new().with("bearer_token", "abc"), &client);
		let header = authorizer
			.authorize(&url("https://api.twitter.com/2/tweets"), &ApiRequest::get(), "2")
			.await
			.expect("Bearer auth should succeed.");

		assert_eq!(header.expose(), "Bearer abc");
		assert_eq!(client.calls(), 0);
	}

	#[tokio::test]
	async fn consumer_pair_exchanges_once_for_app_auth() {
		let client = ScriptedHttpClient::default()
			.reply(200, r#"{"token_type":"bearer","access_token":"fresh"}"#);
		let authorizer = authorizer(
			RawCredentials::new().with("consumer_key", "ck").with("consumer_secret", "cs"),
			&client,
		);
		let target = url("https://api.twitter.com/2/users/by/username/someone");

		for _ in 0..3 {
			let header = authorizer
				.authorize(&target, &ApiRequest::get(), "2")
				.await
				.expect("Bearer auth should succeed.");

			assert_eq!(header.expose(), "Bearer fresh");
		}

		assert_eq!(client.calls(), 1);
		assert_eq!(authorizer.credentials().consumer().map(|pair| pair.key.as_str()), Some("ck"));
		assert_eq!(
			authorizer.bearer().cached().map(|token| token.expose().to_owned()).as_deref(),
			Some("fresh")
		);
	}

	#[tokio::test]
	async fn user_versions_sign_without_touching_the_token_endpoint() {
		let client = ScriptedHttpClient::default();
		let authorizer = authorizer(full_set(), &client);
		let target = url("https://api.twitter.com/1.1/favorites/destroy.json");
		let request = ApiRequest::post([("id", "42")]);
		let header = authorizer
			.authorize(&target, &request, "1.1")
			.await
			.expect("User auth should succeed.");
		let signer = RequestSigner::new(SigningKeyPair::new("ck", "cs"));
		let signable = SignableRequest::new(&request.method, &target).with_form(&request.form);

		assert!(header.expose().starts_with("OAuth "));
		assert!(signer.verify(&signable, &SigningKeyPair::new("ak", "as"), header.expose()));
		assert!(!signer.verify(&signable, &SigningKeyPair::new("ak", "other"), header.expose()));
		assert_eq!(client.calls(), 0);
	}

	#[tokio::test]
	async fn user_versions_require_an_access_pair() {
		let client = ScriptedHttpClient::default();
		let authorizer = authorizer(
			RawCredentials::new().with("consumer_key", "ck").with("consumer_secret", "cs"),
			&client,
		);
		let err = authorizer
			.authorize(&url("https://api.twitter.com/1.1/statuses/destroy/1.json"), &ApiRequest::delete(), "1.1")
			.await
			.expect_err("Missing access pair must fail.");

		assert!(matches!(err, Error::Config(ConfigError::MissingSigningKeyPair)));
	}

	#[test]
	fn invalid_bags_fail_before_construction() {
		let config = ClientConfig::builder().build().expect("Default config should build.");
		let err = TestAuthorizer::from_raw(
			RawCredentials::new().with("consumer_key", "ck"),
			&config,
			ScriptedHttpClient::default(),
			ScriptedTransportErrorMapper,
		)
		.expect_err("Incomplete pairs must be rejected.");

		assert!(matches!(err, Error::Validation(_)));
	}
}
