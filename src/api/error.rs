//! Error types for the remote kernel API.
//!
//! Every variant carries the endpoint or path that failed so a single log line
//! is enough to diagnose a listing or pull failure.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while talking to the kernel API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, timeouts).
    #[error("network error calling {endpoint}: {source}")]
    Network {
        /// The endpoint that failed.
        endpoint: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The API rejected the configured credentials.
    #[error(
        "[AUTH] credentials rejected by {endpoint} (HTTP {status})\n  Suggestion: check KAGGLE_USERNAME/KAGGLE_KEY or kaggle.json"
    )]
    Unauthorized {
        /// The endpoint that rejected the request.
        endpoint: String,
        /// The HTTP status code (401 or 403).
        status: u16,
    },

    /// Any other non-success HTTP status.
    #[error("HTTP {status} calling {endpoint}")]
    HttpStatus {
        /// The endpoint that returned an error status.
        endpoint: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body could not be decoded.
    #[error("malformed response from {endpoint}: {reason}")]
    Decode {
        /// The endpoint whose body was malformed.
        endpoint: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A kernel reference that is not of the form `owner/slug`.
    #[error("invalid kernel reference: {kernel_ref}")]
    InvalidRef {
        /// The offending reference.
        kernel_ref: String,
    },

    /// The configured API base URL cannot be used to build request URLs.
    #[error("invalid API base URL {base}: {reason}")]
    InvalidBaseUrl {
        /// The base URL that was rejected.
        base: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client construction failed: {reason}")]
    ClientBuild {
        /// Why construction failed.
        reason: String,
    },

    /// File system error while materializing a pulled kernel.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Creates a network error from a reqwest error.
    pub fn network(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            endpoint: endpoint.into(),
            source,
        }
    }

    /// Maps a non-success status to the matching variant.
    pub fn from_status(endpoint: impl Into<String>, status: u16) -> Self {
        let endpoint = endpoint.into();
        if matches!(status, 401 | 403) {
            Self::Unauthorized { endpoint, status }
        } else {
            Self::HttpStatus { endpoint, status }
        }
    }

    /// Creates a decode error.
    pub fn decode(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid reference error.
    pub fn invalid_ref(kernel_ref: impl Into<String>) -> Self {
        Self::InvalidRef {
            kernel_ref: kernel_ref.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true when the failure is an authentication rejection.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}
