//! Shared User-Agent string for API requests.

/// Project URL for User-Agent identification (RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/kernel-archiver";

/// Default User-Agent for kernel API requests.
#[must_use]
pub(crate) fn default_api_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("kernel-archiver/{version} (+{PROJECT_UA_URL})")
}
