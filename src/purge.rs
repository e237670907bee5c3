//! Repeated list-then-delete runs that empty a timeline or a likes list.
//!
//! Each round lists the ids still present, deletes them one by one, and lists again. Failed
//! deletes are logged and recorded in the [`PurgeReport`] without being retried inside the round;
//! a round in which every delete fails ends the run as stalled so a permanently undeletable item
//! cannot spin the loop forever. Listing failures abort the run.

// crates.io
use oauth2::http::Method;
use serde::de::IgnoredAny;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	api::ApiClient,
	authorizer::ApiRequest,
	http::ApiHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	transport::TransportErrorMapper,
};

const ID_PLACEHOLDER: &str = "{id}";

/// Where to find the ids that still need deleting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listing {
	/// Endpoint relative to the version root.
	pub endpoint: String,
	/// Query parameters.
	pub params: Vec<(String, String)>,
	/// JSON pointer to the array of items; `""` selects the document root.
	pub ids_pointer: String,
	/// Field of each item holding its id.
	pub id_field: String,
}

/// How to delete one id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deletion {
	/// HTTP method of the delete call.
	pub method: Method,
	/// Endpoint relative to the version root; `{id}` is replaced with the id.
	pub endpoint: String,
	/// Query parameter carrying the id, for endpoints that take it there.
	pub id_param: Option<String>,
}

/// One purge target: a listing and the matching delete call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurgeJob {
	/// Label used in logs, metrics, and the report.
	pub label: String,
	/// Listing side.
	pub listing: Listing,
	/// Delete side.
	pub deletion: Deletion,
}
impl PurgeJob {
	/// Deletes every tweet authored by `user_id`.
	pub fn tweets(user_id: &str) -> Self {
		Self {
			label: "tweets".into(),
			listing: Listing {
				endpoint: format!("users/{user_id}/tweets"),
				params: vec![("max_results".into(), "100".into())],
				ids_pointer: "/data".into(),
				id_field: "id".into(),
			},
			deletion: Deletion {
				method: Method::POST,
				endpoint: format!("statuses/destroy/{ID_PLACEHOLDER}.json"),
				id_param: None,
			},
		}
	}

	/// Removes every like of the authenticated user.
	pub fn likes() -> Self {
		Self {
			label: "likes".into(),
			listing: Listing {
				endpoint: "favorites/list.json".into(),
				params: vec![("count".into(), "100".into())],
				ids_pointer: String::new(),
				id_field: "id_str".into(),
			},
			deletion: Deletion {
				method: Method::POST,
				endpoint: "favorites/destroy.json".into(),
				id_param: Some("id".into()),
			},
		}
	}
}

/// A delete that failed and was skipped.
#[derive(Debug)]
pub struct PurgeFailure {
	/// Id that could not be deleted.
	pub id: String,
	/// Failure returned by the delete call.
	pub error: Error,
}

/// Summary of a finished purge run.
#[derive(Debug)]
pub struct PurgeReport {
	/// Label of the job.
	pub label: String,
	/// Number of successful deletes.
	pub deleted: u64,
	/// Every skipped delete, in order.
	pub failures: Vec<PurgeFailure>,
	/// Whether the run ended because a whole round of deletes failed.
	pub stalled: bool,
}
impl PurgeReport {
	fn new(label: &str) -> Self {
		Self { label: label.to_owned(), deleted: 0, failures: Vec::new(), stalled: false }
	}

	/// `true` when the listing drained without any skipped delete.
	pub fn is_clean(&self) -> bool {
		self.failures.is_empty() && !self.stalled
	}
}

impl<C, M> ApiClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Runs `job` until its listing comes back empty or a whole round fails.
	pub async fn purge(&self, job: &PurgeJob) -> Result<PurgeReport> {
		const KIND: FlowKind = FlowKind::Purge;

		let span = FlowSpan::new(KIND, "purge");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result: Result<PurgeReport> = span
			.instrument(async move {
				let mut report = PurgeReport::new(&job.label);
				let mut ids = self.list_ids(&job.listing).await?;

				while !ids.is_empty() {
					let mut round_deleted = 0_u64;

					for id in ids {
						match self.delete_id(&job.deletion, &id).await {
							Ok(()) => round_deleted += 1,
							Err(error) => {
								obs::warn_skipped(KIND, &id, &error);
								report.failures.push(PurgeFailure { id, error });
							},
						}
					}

					report.deleted += round_deleted;

					if round_deleted == 0 {
						report.stalled = true;

						break;
					}

					ids = self.list_ids(&job.listing).await?;
				}

				Ok(report)
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		if let Ok(report) = &result {
			obs::record_purged(&report.label, report.deleted);
		}

		result
	}

	async fn list_ids(&self, listing: &Listing) -> Result<Vec<String>> {
		let params = borrowed_pairs(&listing.params);
		let body: Value = self.get(&listing.endpoint, &params).await?;

		Ok(extract_ids(&body, &listing.ids_pointer, &listing.id_field))
	}

	async fn delete_id(&self, deletion: &Deletion, id: &str) -> Result<()> {
		let endpoint = deletion.endpoint.replace(ID_PLACEHOLDER, id);
		let query = deletion.id_param.as_deref().map(|param| (param, id));
		let query = query.as_slice();
		let _: IgnoredAny = self.send(&endpoint, query, ApiRequest::new(deletion.method.clone())).await?;

		Ok(())
	}
}

fn borrowed_pairs(pairs: &[(String, String)]) -> Vec<(&str, &str)> {
	pairs.iter().map(|(key, value)| (key.as_str(), value.as_str())).collect()
}

/// Collects ids under `pointer`; anything that is not an array of objects yields nothing.
fn extract_ids(body: &Value, pointer: &str, field: &str) -> Vec<String> {
	let Some(items) = body.pointer(pointer).and_then(Value::as_array) else {
		return Vec::new();
	};

	items
		.iter()
		.filter_map(|item| match item.get(field)? {
			Value::String(id) => Some(id.clone()),
			Value::Number(id) => Some(id.to_string()),
			_ => None,
		})
		.collect()
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;
	use crate::{
		_preludet::{ScriptedHttpClient, ScriptedTransportErrorMapper},
		auth::{CredentialSet, RawCredentials},
		config::ClientConfig,
		error::ApiError,
	};

	type TestClient = ApiClient<ScriptedHttpClient, ScriptedTransportErrorMapper>;

	fn client(transport: &ScriptedHttpClient) -> TestClient {
		let raw = RawCredentials::new()
			.with("consumer_key", "ck")
			.with("consumer_secret", "cs")
			.with("access_token_key", "ak")
			.with("access_token_secret", "as")
			.with("bearer_token", "app");
		let credentials = CredentialSet::validate(raw).expect("Credentials should validate.");
		let config = ClientConfig::builder()
			.api_base("https://api.example.com/")
			.build()
			.expect("Config should build.");

		ApiClient::with_http_client(credentials, config, transport.clone(), ScriptedTransportErrorMapper)
	}

	#[test]
	fn ids_come_from_pointer_and_field() {
		let tweets = json!({ "data": [{ "id": "1" }, { "id": "2" }], "meta": { "result_count": 2 } });
		let likes = json!([{ "id": 3, "id_str": "3" }, { "id_str": "4" }, { "id": 5 }]);

		assert_eq!(extract_ids(&tweets, "/data", "id"), ["1", "2"]);
		assert_eq!(extract_ids(&likes, "", "id_str"), ["3", "4"]);
		assert_eq!(extract_ids(&likes, "", "id"), ["3", "5"]);
		assert!(extract_ids(&json!({ "meta": { "result_count": 0 } }), "/data", "id").is_empty());
		assert!(extract_ids(&json!({ "data": "nope" }), "/data", "id").is_empty());
	}

	#[tokio::test]
	async fn tweets_drain_until_listing_is_empty() {
		let transport = ScriptedHttpClient::default()
			.reply(200, r#"{"data":[{"id":"1"},{"id":"2"}]}"#)
			.reply(200, r#"{"id_str":"1"}"#)
			.reply(200, r#"{"id_str":"2"}"#)
			.reply(200, r#"{"meta":{"result_count":0}}"#);
		let report = client(&transport)
			.purge(&PurgeJob::tweets("42"))
			.await
			.expect("Purge should finish.");

		assert_eq!(report.label, "tweets");
		assert_eq!(report.deleted, 2);
		assert!(report.is_clean());

		let uris = transport.requests().into_iter().map(|request| request.uri).collect::<Vec<_>>();

		assert_eq!(uris, [
			"https://api.example.com/2/users/42/tweets?max_results=100",
			"https://api.example.com/1.1/statuses/destroy/1.json",
			"https://api.example.com/1.1/statuses/destroy/2.json",
			"https://api.example.com/2/users/42/tweets?max_results=100",
		]);
	}

	#[tokio::test]
	async fn likes_pass_the_id_as_query_parameter() {
		let transport = ScriptedHttpClient::default()
			.reply(200, r#"[{"id_str":"9"}]"#)
			.reply(200, r#"{"id_str":"9"}"#)
			.reply(200, "[]");
		let report =
			client(&transport).purge(&PurgeJob::likes()).await.expect("Purge should finish.");
		let requests = transport.requests();

		assert_eq!(report.deleted, 1);
		assert_eq!(requests[1].method, Method::POST);
		assert_eq!(requests[1].uri, "https://api.example.com/1.1/favorites/destroy.json?id=9");
	}

	#[tokio::test]
	async fn failing_round_stalls_and_keeps_failures() {
		let transport = ScriptedHttpClient::default()
			.reply(200, r#"{"data":[{"id":"1"},{"id":"2"}]}"#)
			.reply(200, "{}")
			.reply(500, "boom")
			.reply(200, r#"{"data":[{"id":"2"}]}"#)
			.reply(403, "still no");
		let report = client(&transport)
			.purge(&PurgeJob::tweets("42"))
			.await
			.expect("Delete failures are not fatal.");

		assert_eq!(report.deleted, 1);
		assert!(report.stalled);
		assert_eq!(report.failures.len(), 2);
		assert!(report.failures.iter().all(|failure| failure.id == "2"));
		assert!(matches!(
			report.failures[1].error,
			Error::Api(ApiError::Status { status: 403, .. })
		));
		assert_eq!(transport.calls(), 5);
	}

	#[tokio::test]
	async fn listing_errors_abort_the_run() {
		let transport = ScriptedHttpClient::default().reply(429, "slow down");
		let err = client(&transport)
			.purge(&PurgeJob::tweets("42"))
			.await
			.expect_err("Listing failures must propagate.");

		assert!(matches!(err, Error::Api(ApiError::Status { status: 429, .. })));
	}
}
