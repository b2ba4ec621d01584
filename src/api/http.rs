//! HTTP client construction policy for the kernel API.
//!
//! Timeouts, user-agent, and compression live here so every API call shares
//! one connection pool with the same settings.

use std::time::Duration;

use reqwest::Client;

use super::ApiError;
use crate::user_agent;

/// Default HTTP connect timeout (30 seconds).
pub(crate) const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes; large notebooks come back in one body).
pub(crate) const READ_TIMEOUT_SECS: u64 = 300;

/// Builds the client shared by every listing and pull of a run.
pub(crate) fn build_api_http_client() -> Result<Client, ApiError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
        .gzip(true)
        .user_agent(user_agent::default_api_user_agent())
        .build()
        .map_err(|error| ApiError::ClientBuild {
            reason: error.to_string(),
        })
}
