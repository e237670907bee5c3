//! Authentication modes and the API versions that select them.

// self
use crate::_prelude::*;

/// Authorization scheme applied to a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthMode {
	/// Application-level bearer token.
	App,
	/// Per-request OAuth 1.0a signature tied to a user's access token.
	User,
}
impl AuthMode {
	/// Selects the mode for a resource version: `"2"` uses app auth, everything else user auth.
	pub fn for_version(version: &str) -> Self {
		if version == ApiVersion::V2.as_str() { Self::App } else { Self::User }
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::App => "app",
			Self::User => "user",
		}
	}
}
impl Display for AuthMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// REST API versions exposed under the API base URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApiVersion {
	/// Legacy `1.1` endpoints (user auth).
	V1_1,
	/// `2` endpoints (app auth).
	V2,
}
impl ApiVersion {
	const V2_RESOURCES: [&'static str; 2] = ["tweets", "users"];
	const V1_1_EXCEPTIONS: [&'static str; 2] = ["show", "lookup"];

	/// Picks the version serving an endpoint such as `users/123/tweets` or `favorites/list.json`.
	///
	/// A leading `/` is ignored, matching how request URLs are built.
	pub fn for_endpoint(endpoint: &str) -> Self {
		let mut segments = endpoint.trim_start_matches('/').split('/');
		let resource = segments.next().unwrap_or_default();
		let complement = segments.next().unwrap_or_default();

		if Self::V2_RESOURCES.contains(&resource) && !Self::V1_1_EXCEPTIONS.contains(&complement) {
			Self::V2
		} else {
			Self::V1_1
		}
	}

	/// Path segment used in request URLs.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::V1_1 => "1.1",
			Self::V2 => "2",
		}
	}

	/// Mode used to authorize requests against this version.
	pub fn auth_mode(self) -> AuthMode {
		AuthMode::for_version(self.as_str())
	}
}
impl Display for ApiVersion {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn only_version_two_uses_app_auth() {
		assert_eq!(AuthMode::for_version("2"), AuthMode::App);
		assert_eq!(AuthMode::for_version("1.1"), AuthMode::User);
		assert_eq!(AuthMode::for_version("2.0"), AuthMode::User);
		assert_eq!(AuthMode::for_version(""), AuthMode::User);
	}

	#[test]
	fn endpoints_route_to_versions() {
		assert_eq!(ApiVersion::for_endpoint("users/by/username/someone"), ApiVersion::V2);
		assert_eq!(ApiVersion::for_endpoint("users/42/tweets"), ApiVersion::V2);
		assert_eq!(ApiVersion::for_endpoint("tweets"), ApiVersion::V2);
		assert_eq!(ApiVersion::for_endpoint("users/show"), ApiVersion::V1_1);
		assert_eq!(ApiVersion::for_endpoint("users/lookup"), ApiVersion::V1_1);
		assert_eq!(ApiVersion::for_endpoint("favorites/list.json"), ApiVersion::V1_1);
		assert_eq!(ApiVersion::for_endpoint("statuses/destroy/1.json"), ApiVersion::V1_1);
		assert_eq!(ApiVersion::for_endpoint("/users/42/tweets"), ApiVersion::V2);
		assert_eq!(ApiVersion::for_endpoint("/users/show"), ApiVersion::V1_1);
		assert_eq!(ApiVersion::V2.auth_mode(), AuthMode::App);
		assert_eq!(ApiVersion::V1_1.auth_mode(), AuthMode::User);
	}
}
