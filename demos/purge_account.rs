//! Deletes every tweet and like of an account using credentials from `TWITTER_*` environment
//! variables (a `.env` file is picked up when present).
//!
//! Usage: `cargo run --example purge_account -- <username>`.

// std
use std::env;
// crates.io
use color_eyre::{Result, eyre::eyre};
use serde::Deserialize;
// self
use x_purge::{
	api::ReqwestApiClient,
	auth::{CredentialSet, RawCredentials},
	config::{self, ClientConfig},
	purge::{PurgeJob, PurgeReport},
};

#[derive(Deserialize)]
struct UserLookup {
	data: UserData,
}

#[derive(Deserialize)]
struct UserData {
	id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let username = env::args().nth(1).ok_or_else(|| eyre!("Usage: purge_account <username>."))?;

	if let Some(path) = config::load_dotenv()? {
		println!("Loaded credentials from {}.", path.display());
	}

	let credentials = CredentialSet::validate(RawCredentials::from_env())?;
	let client = ReqwestApiClient::new(credentials, ClientConfig::builder().build()?);
	let lookup: UserLookup = client.get(&format!("users/by/username/{username}"), &[]).await?;

	for job in [PurgeJob::tweets(&lookup.data.id), PurgeJob::likes()] {
		summarize(&client.purge(&job).await?);
	}

	println!("Purge finished.");

	Ok(())
}

fn summarize(report: &PurgeReport) {
	println!("Deleted {} {}.", report.deleted, report.label);

	for failure in &report.failures {
		println!("Skipped {} {}: {}.", report.label, failure.id, failure.error);
	}

	if report.stalled {
		println!("Stopped purging {} because a whole round failed.", report.label);
	}
}
