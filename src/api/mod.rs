//! Remote kernel API: the [`KernelApi`] seam and its Kaggle implementation.
//!
//! The harvest loop only ever talks to `dyn KernelApi`, so tests drive it with
//! scripted stubs while the binary uses [`KaggleClient`].
//!
//! # Example
//!
//! ```no_run
//! use kernel_archiver::api::{KaggleClient, KernelApi, ListQuery};
//! use kernel_archiver::config::Credentials;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KaggleClient::new(Credentials::resolve()?)?;
//! let query = ListQuery::new("alice", 1, 100);
//! for kernel in client.list_kernels(&query).await? {
//!     println!("{} {}", kernel.id, kernel.reference());
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod http;
mod kernel;

pub use client::{DEFAULT_API_BASE, KaggleClient};
pub use error::ApiError;
pub use kernel::{
    KernelIdentity, KernelMetadata, KernelSummary, METADATA_FILE_NAME, PullResponse,
    PulledBlob, PulledMetadata, source_extension,
};

use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Sort order requested from the listing endpoint: most recently run first.
pub const SORT_BY_DATE_RUN: &str = "dateRun";

/// One listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Owner whose kernels are listed.
    pub user: String,
    /// 1-based page number.
    pub page: u32,
    /// Kernels per page.
    pub page_size: u32,
}

impl ListQuery {
    /// Creates a listing request.
    #[must_use]
    pub fn new(user: impl Into<String>, page: u32, page_size: u32) -> Self {
        Self {
            user: user.into(),
            page,
            page_size,
        }
    }
}

/// Operations the harvest loop needs from the remote platform.
#[async_trait]
pub trait KernelApi: Send + Sync {
    /// Username the API is authenticated as, used when no user is given.
    fn authenticated_user(&self) -> &str;

    /// Lists one page of a user's kernels, most recently run first.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on network, status, or decode failures.
    async fn list_kernels(&self, query: &ListQuery) -> Result<Vec<KernelSummary>, ApiError>;

    /// Materializes a kernel's source plus its [`METADATA_FILE_NAME`] sidecar
    /// into `dest`, which must already exist. Returns the source file path.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on network, status, decode, or write failures.
    async fn pull_kernel(&self, kernel_ref: &str, dest: &Path) -> Result<PathBuf, ApiError>;
}
