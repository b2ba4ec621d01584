//! Kernel harvesting: list, deduplicate, fetch, normalize, archive.
//!
//! # Architecture
//!
//! - [`list_page`] - one page of a user's kernels, private ones optionally dropped
//! - [`KernelSet`] - identity-keyed ordered set used for dedup and retries
//! - [`claim_folder`] / [`fetch`] - a fresh staging folder per kernel, then the pull
//! - [`normalize_folder`] - canonical renaming and private-kernel removal
//! - [`archive_dir`] - zips the staging directory
//! - [`Harvester`] - the paginate/drain state machine tying them together
//!
//! # Example
//!
//! ```no_run
//! use kernel_archiver::api::KaggleClient;
//! use kernel_archiver::config::Credentials;
//! use kernel_archiver::harvest::{Harvester, RunOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KaggleClient::new(Credentials::resolve()?)?;
//! let report = Harvester::new(&client, RunOptions::new("kernels.zip")).run().await?;
//! println!("Archived {} kernels to {}", report.stats.fetched, report.archive.display());
//! # Ok(())
//! # }
//! ```

mod archive;
mod catalog;
mod fetcher;
mod lister;
mod normalizer;
mod redact;
mod run;

pub use archive::{ArchiveError, archive_dir};
pub use catalog::KernelSet;
pub use fetcher::{FetchError, claim_folder, fetch, kernel_folder};
pub use lister::{MAX_PAGE_SIZE, Page, PageSize, list_page};
pub use normalizer::{NormalizeError, normalize_folder};
pub use redact::{HIDDEN_KERNEL_NAME, Redactor};
pub use run::{
    Harvester, KernelFailure, RunError, RunOptions, RunReport, RunStats, STAGING_PREFIX,
};
