use anyhow::{Context, Result};
use std::time::Duration;

pub const USER_AGENT: &str = concat!("ratekeeper/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client shared by a provider's requests.
///
/// With `timeout` set, every request (connect plus body) is bounded by it.
pub fn http_client(timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().context("Failed to build HTTP client")
}

/// Joins a configured base URL and an endpoint path without doubling slashes.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
