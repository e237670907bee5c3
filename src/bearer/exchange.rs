//! Client-credentials exchange request and response handling.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use oauth2::{
	HttpRequest, HttpResponse,
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
// self
use crate::{
	_prelude::*,
	auth::{BearerToken, SigningKeyPair},
	error::{self, ConfigError, TokenExchangeError},
};

const GRANT_TYPE: &str = "client_credentials";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";
const EXPECTED_TOKEN_TYPE: &str = "bearer";

#[derive(Debug, Default, Deserialize)]
struct TokenResponseBody {
	token_type: Option<String>,
	access_token: Option<String>,
	title: Option<String>,
	#[serde(rename = "type")]
	kind: Option<String>,
	detail: Option<String>,
	#[serde(default)]
	errors: Vec<ErrorEntry>,
}
impl TokenResponseBody {
	fn reports_errors(&self) -> bool {
		!self.errors.is_empty() || self.title.is_some() || self.detail.is_some()
	}

	fn into_rejection(self, status: u16) -> TokenExchangeError {
		let first = self.errors.into_iter().next().and_then(|entry| entry.message);
		let message = match (&self.title, first) {
			(Some(title), Some(first)) => format!("{title}: {first}"),
			(Some(title), None) => title.clone(),
			(None, Some(first)) => first,
			(None, None) => self.detail.clone().unwrap_or_else(|| "unknown error".into()),
		};

		TokenExchangeError::Rejected {
			status,
			title: self.title,
			message,
			code: self.kind,
			detail: self.detail,
		}
	}
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
	message: Option<String>,
}

/// Builds the `POST` request exchanging the consumer pair for a bearer token.
pub(crate) fn build_request(endpoint: &Url, consumer: &SigningKeyPair) -> Result<HttpRequest> {
	let basic = STANDARD.encode(format!("{}:{}", consumer.key, consumer.secret.expose()));

	Request::builder()
		.method(Method::POST)
		.uri(endpoint.as_str())
		.header(AUTHORIZATION, format!("Basic {basic}"))
		.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
		.header(ACCEPT, "application/json")
		.body(format!("grant_type={GRANT_TYPE}").into_bytes())
		.map_err(|err| ConfigError::from(err).into())
}

/// Interprets the token endpoint response.
pub(crate) fn parse_response(response: &HttpResponse) -> Result<BearerToken, TokenExchangeError> {
	let status = response.status();
	let code = status.as_u16();
	let parsed: Result<TokenResponseBody, _> =
		serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_slice(response.body()));

	if !status.is_success() {
		return Err(match parsed {
			Ok(body) if body.reports_errors() => body.into_rejection(code),
			_ => TokenExchangeError::UnexpectedStatus {
				status: code,
				body_preview: error::body_preview(response.body()),
			},
		});
	}

	let body = parsed.map_err(|source| TokenExchangeError::Parse { source, status: code })?;

	if !body.errors.is_empty() {
		return Err(body.into_rejection(code));
	}
	if body.token_type.as_deref() != Some(EXPECTED_TOKEN_TYPE) {
		return Err(TokenExchangeError::UnexpectedTokenType { found: body.token_type, status: code });
	}

	body.access_token
		.map(BearerToken::new)
		.ok_or(TokenExchangeError::MissingAccessToken { status: code })
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::StatusCode;
	// self
	use super::*;

	fn response(status: u16, body: &str) -> HttpResponse {
		let mut response = HttpResponse::new(body.as_bytes().to_vec());

		*response.status_mut() = StatusCode::from_u16(status).expect("Status code should be valid.");

		response
	}

	#[test]
	fn request_uses_basic_auth_and_form_body() {
		let endpoint =
			Url::parse("https://api.example.com/oauth2/token").expect("Endpoint should parse.");
		let request = build_request(&endpoint, &SigningKeyPair::new("key", "secret"))
			.expect("Request should build.");

		assert_eq!(request.method(), Method::POST);
		assert_eq!(request.uri(), "https://api.example.com/oauth2/token");
		assert_eq!(
			request.headers().get(AUTHORIZATION).and_then(|value| value.to_str().ok()),
			Some("Basic a2V5OnNlY3JldA==")
		);
		assert_eq!(
			request.headers().get(CONTENT_TYPE).and_then(|value| value.to_str().ok()),
			Some(FORM_CONTENT_TYPE)
		);
		assert_eq!(request.body().as_slice(), b"grant_type=client_credentials");
	}

	#[test]
	fn bearer_reply_yields_token() {
		let token = parse_response(&response(200, r#"{"token_type":"bearer","access_token":"AAAA"}"#))
			.expect("Bearer reply should parse.");

		assert_eq!(token.expose(), "AAAA");
	}

	#[test]
	fn wrong_token_type_is_rejected() {
		let err = parse_response(&response(200, r#"{"token_type":"mac","access_token":"AAAA"}"#))
			.expect_err("Non-bearer token types must be rejected.");

		assert!(matches!(
			err,
			TokenExchangeError::UnexpectedTokenType { ref found, status: 200 } if found.as_deref() == Some("mac")
		));
	}

	#[test]
	fn error_bodies_surface_title_and_first_message() {
		let body = r#"{"title":"Forbidden","type":"about:blank","detail":"nope","errors":[{"code":99,"message":"Unable to verify your credentials"}]}"#;

		for status in [200, 403] {
			let err = parse_response(&response(status, body))
				.expect_err("Error bodies must be rejected.");

			match err {
				TokenExchangeError::Rejected { status: got, message, code, detail, .. } => {
					assert_eq!(got, status);
					assert_eq!(message, "Forbidden: Unable to verify your credentials");
					assert_eq!(code.as_deref(), Some("about:blank"));
					assert_eq!(detail.as_deref(), Some("nope"));
				},
				other => panic!("Unexpected error variant: {other:?}."),
			}
		}
	}

	#[test]
	fn opaque_failures_keep_status_and_preview() {
		let err = parse_response(&response(503, "upstream unavailable"))
			.expect_err("Non-success statuses must be rejected.");

		assert!(matches!(
			err,
			TokenExchangeError::UnexpectedStatus { status: 503, ref body_preview } if body_preview == "upstream unavailable"
		));
		assert_eq!(err.status(), 503);

		let err = parse_response(&response(200, "not json"))
			.expect_err("Malformed JSON must be rejected.");

		assert!(matches!(err, TokenExchangeError::Parse { status: 200, .. }));
		assert_eq!(err.status(), 200);

		let err = parse_response(&response(200, r#"{"token_type":"bearer"}"#))
			.expect_err("Missing access tokens must be rejected.");

		assert!(matches!(err, TokenExchangeError::MissingAccessToken { status: 200 }));
		assert_eq!(err.status(), 200);
	}
}
