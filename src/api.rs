//! Authorized JSON calls against the versioned REST API.

// crates.io
use oauth2::{
	HttpRequest,
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
use serde::de::DeserializeOwned;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{ApiVersion, AuthorizationHeader, CredentialSet},
	authorizer::{ApiRequest, Authorizer},
	config::ClientConfig,
	error::{self, ApiError, ConfigError},
	http::ApiHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	transport::{self, TransportErrorMapper},
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, transport::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// API client specialized for the crate's default reqwest transport stack.
pub type ReqwestApiClient = ApiClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Sends authorized requests and decodes their JSON replies.
///
/// Endpoints are given relative to the version root (`users/123/tweets`,
/// `favorites/list.json`); the version, and with it the authentication mode, is derived from the
/// endpoint through [`ApiVersion::for_endpoint`].
pub struct ApiClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	config: ClientConfig,
	authorizer: Authorizer<C, M>,
	http_client: Arc<C>,
	transport_mapper: Arc<M>,
}
impl<C, M> ApiClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client sharing one transport between API calls and token exchanges.
	pub fn with_http_client(
		credentials: CredentialSet,
		config: ClientConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let http_client = http_client.into();
		let transport_mapper = mapper.into();
		let authorizer = Authorizer::with_http_client(
			credentials,
			&config,
			Arc::clone(&http_client),
			Arc::clone(&transport_mapper),
		);

		Self { config, authorizer, http_client, transport_mapper }
	}

	/// Authorizer used for every request.
	pub fn authorizer(&self) -> &Authorizer<C, M> {
		&self.authorizer
	}

	/// Configuration the client was built with.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Builds `<api_base><version>/<endpoint>?<query>`.
	pub fn endpoint_url(
		&self,
		version: ApiVersion,
		endpoint: &str,
		query: &[(&str, &str)],
	) -> Result<Url> {
		let path = format!("{version}/{}", endpoint.trim_start_matches('/'));
		let mut url = self
			.config
			.api_base
			.join(&path)
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "api_endpoint", source })?;

		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query);
		}

		Ok(url)
	}

	/// `GET` with query parameters.
	pub async fn get<T>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.send(endpoint, query, ApiRequest::get()).await
	}

	/// `POST` with an urlencoded form body.
	pub async fn post<T>(&self, endpoint: &str, form: &[(&str, &str)]) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.send(endpoint, &[], ApiRequest::post(form.iter().copied())).await
	}

	/// `DELETE` with query parameters.
	pub async fn delete<T>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.send(endpoint, query, ApiRequest::delete()).await
	}

	/// Authorizes and sends `request`, decoding a successful reply into `T`.
	pub async fn send<T>(&self, endpoint: &str, query: &[(&str, &str)], request: ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let endpoint = endpoint.trim_start_matches('/');
		let version = ApiVersion::for_endpoint(endpoint);
		let url = self.endpoint_url(version, endpoint, query)?;
		let span = FlowSpan::new(FlowKind::ApiCall, "send");

		obs::record_flow_outcome(FlowKind::ApiCall, FlowOutcome::Attempt);

		let result: Result<T> = span
			.instrument(async move {
				let header = self.authorizer.authorize(&url, &request, version.as_str()).await?;
				let http_request = build_request(&url, &request, &header)?;
				let response = transport::execute(
					&*self.http_client,
					&*self.transport_mapper,
					FlowKind::ApiCall,
					http_request,
				)
				.await?;
				let status = response.status();

				if !status.is_success() {
					return Err(ApiError::Status {
						method: request.method.to_string(),
						url: url.to_string(),
						status: status.as_u16(),
						body_preview: error::body_preview(response.body()),
					}
					.into());
				}

				serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_slice(
					response.body(),
				))
				.map_err(|source| {
					ApiError::Decode { url: url.to_string(), status: status.as_u16(), source }.into()
				})
			})
			.await;

		obs::record_flow_outcome(FlowKind::ApiCall, FlowOutcome::of(&result));

		result
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client that provisions its own reqwest transport.
	pub fn new(credentials: CredentialSet, config: ClientConfig) -> Self {
		Self::with_http_client(
			credentials,
			config,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Debug for ApiClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("api_base", &self.config.api_base.as_str())
			.field("authorizer", &self.authorizer)
			.finish()
	}
}

fn build_request(
	url: &Url,
	request: &ApiRequest,
	header: &AuthorizationHeader,
) -> Result<HttpRequest> {
	let mut builder = Request::builder()
		.method(request.method.clone())
		.uri(url.as_str())
		.header(AUTHORIZATION, header.expose())
		.header(ACCEPT, "application/json");
	let body = if request.form.is_empty() {
		Vec::new()
	} else {
		builder = builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE);

		form_urlencoded::Serializer::new(String::new())
			.extend_pairs(&request.form)
			.finish()
			.into_bytes()
	};

	builder.body(body).map_err(|err| ConfigError::from(err).into())
}
