//! The harvest run: paginate, fetch, retry once, archive.
//!
//! A run is a two-phase state machine over a scoped staging directory:
//!
//! - **Paginating**: list page 1, 2, ... For each page, kernels whose identity
//!   has not been processed yet are fetched and normalized, then marked
//!   processed whatever the outcome. Failures go to the retry set. The phase
//!   ends on the first page that brings no new identity, or after processing a
//!   page the API returned short.
//! - **Draining**: each kernel in the retry set gets exactly one more attempt.
//!   Kernels failing again are dropped from the archive with a warning.
//!
//! Then the staging directory is archived once. The staging directory is a
//! [`TempDir`], so it is removed when the run ends, including when the run
//! future is dropped on interrupt.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::archive::{ArchiveError, archive_dir};
use super::catalog::KernelSet;
use super::fetcher::{FetchError, claim_folder, fetch};
use super::lister::{PageSize, list_page};
use super::normalizer::{NormalizeError, normalize_folder};
use super::redact::Redactor;
use crate::api::{ApiError, KernelApi, KernelIdentity, KernelSummary};

/// Prefix of the staging directory name.
pub const STAGING_PREFIX: &str = "kaggle_";

/// Fatal run errors.
#[derive(Debug, Error)]
pub enum RunError {
    /// The staging directory could not be created.
    #[error("cannot create staging directory in {location}: {source}")]
    Staging {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// Listing a page failed, including authentication rejections.
    #[error("listing page {page} failed: {source}")]
    Listing {
        page: u32,
        #[source]
        source: ApiError,
    },

    /// Writing the archive failed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// The user interrupted the run.
    #[error("interrupted")]
    Interrupted,
}

impl RunError {
    /// Whether the failure is an authentication rejection from the API.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Listing { source, .. } if source.is_unauthorized())
    }
}

/// A failed attempt at one kernel. Never fatal.
#[derive(Debug, Error)]
pub enum KernelFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Settings for one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Whose kernels to list; the authenticated user when `None`.
    pub user: Option<String>,
    /// Keep private kernels. When false they are filtered at listing time and
    /// removed again at normalization time.
    pub include_private: bool,
    pub page_size: PageSize,
    /// Final archive path (already resolved to `*.zip`).
    pub output: PathBuf,
    /// Where to create the staging directory; system temp when `None`.
    pub tmp_dir: Option<PathBuf>,
}

impl RunOptions {
    /// Options with defaults for everything but the output path.
    #[must_use]
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            user: None,
            include_private: false,
            page_size: PageSize::default(),
            output: output.into(),
            tmp_dir: None,
        }
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Listing calls made.
    pub pages: usize,
    /// Fetch attempts made, retries included.
    pub attempts: usize,
    /// Kernels fetched, normalized, and kept for the archive.
    pub fetched: usize,
    /// Kernels removed as private during normalization.
    pub removed: usize,
    /// Kernels that went through the retry phase.
    pub retried: usize,
    /// Retried kernels that succeeded the second time.
    pub recovered: usize,
    /// Kernels that failed both attempts.
    pub failed: usize,
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub archive: PathBuf,
    pub stats: RunStats,
    /// Every identity seen while paginating.
    pub processed: Vec<KernelIdentity>,
    /// Kernels that failed both attempts, in identity order.
    pub failed: Vec<KernelIdentity>,
}

#[derive(Debug, Default)]
struct HarvestState {
    processed: KernelSet,
    retry: KernelSet,
    /// Folder each attempted kernel claimed; a retry reuses it.
    folders: BTreeMap<KernelIdentity, PathBuf>,
    failed: Vec<KernelIdentity>,
    stats: RunStats,
}

impl HarvestState {
    fn record(&mut self, outcome: AttemptOutcome) {
        match outcome {
            AttemptOutcome::Kept(path) => {
                debug!(folder = %path.display(), "Kernel staged");
                self.stats.fetched += 1;
            }
            AttemptOutcome::Removed => self.stats.removed += 1,
        }
    }
}

/// Result of a successful attempt.
#[derive(Debug)]
enum AttemptOutcome {
    /// Staged under this folder.
    Kept(PathBuf),
    /// Removed as private.
    Removed,
}

/// Drives one run against a [`KernelApi`].
pub struct Harvester<'a> {
    api: &'a dyn KernelApi,
    options: RunOptions,
    redactor: Redactor,
    progress: ProgressBar,
}

impl<'a> Harvester<'a> {
    #[must_use]
    pub fn new(api: &'a dyn KernelApi, options: RunOptions) -> Self {
        Self {
            api,
            options,
            redactor: Redactor::disabled(),
            progress: ProgressBar::hidden(),
        }
    }

    /// Enables redaction mode with the given redactor.
    #[must_use]
    pub fn with_redactor(mut self, redactor: Redactor) -> Self {
        self.redactor = redactor;
        self
    }

    /// Reports progress on `progress` instead of a hidden bar.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    fn user(&self) -> &str {
        self.options
            .user
            .as_deref()
            .filter(|user| !user.is_empty())
            .unwrap_or_else(|| self.api.authenticated_user())
    }

    /// Runs the whole job.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] for fatal failures only; per-kernel failures are
    /// logged and reported in [`RunReport::failed`].
    pub async fn run(&self) -> Result<RunReport, RunError> {
        let staging = self.create_staging()?;
        info!(
            user = self.user(),
            include_private = self.options.include_private,
            page_size = %self.options.page_size,
            "Harvest starting"
        );

        let mut state = HarvestState::default();
        self.paginate(staging.path(), &mut state).await?;
        self.drain(staging.path(), &mut state).await;

        self.progress.set_message("Writing archive...");
        let archive = archive_dir(staging.path(), &self.options.output)?;
        self.progress.finish_and_clear();

        if let Err(error) = staging.close() {
            warn!(error = %error, "Could not remove staging directory");
        }

        info!(
            pages = state.stats.pages,
            fetched = state.stats.fetched,
            removed = state.stats.removed,
            retried = state.stats.retried,
            recovered = state.stats.recovered,
            failed = state.stats.failed,
            archive = %archive.display(),
            "Harvest complete"
        );

        Ok(RunReport {
            archive,
            stats: state.stats,
            processed: state.processed.identities().cloned().collect(),
            failed: state.failed,
        })
    }

    /// Runs the whole job, aborting with [`RunError::Interrupted`] on Ctrl-C.
    ///
    /// The run future is dropped on interrupt, which removes the staging
    /// directory before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] for fatal failures and interrupts.
    pub async fn run_until_interrupted(&self) -> Result<RunReport, RunError> {
        tokio::select! {
            result = self.run() => result,
            signal = tokio::signal::ctrl_c() => {
                if let Err(error) = signal {
                    warn!(error = %error, "Interrupt handler failed");
                }
                self.progress.abandon();
                Err(RunError::Interrupted)
            }
        }
    }

    fn create_staging(&self) -> Result<TempDir, RunError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX);
        let staging = match &self.options.tmp_dir {
            Some(dir) => builder.tempdir_in(dir),
            None => builder.tempdir(),
        };
        let staging = staging.map_err(|source| RunError::Staging {
            location: self.options.tmp_dir.as_ref().map_or_else(
                || "system temp directory".to_string(),
                |dir| dir.display().to_string(),
            ),
            source,
        })?;
        debug!(staging = %staging.path().display(), "Staging directory ready");
        Ok(staging)
    }

    async fn paginate(&self, staging: &Path, state: &mut HarvestState) -> Result<(), RunError> {
        let user = self.user().to_string();
        let page_size = self.options.page_size;
        let mut page_number = 1u32;

        loop {
            self.progress
                .set_message(format!("Listing page {page_number}..."));
            let page = list_page(
                self.api,
                &user,
                page_number,
                self.options.include_private,
                page_size,
            )
            .await
            .map_err(|source| RunError::Listing {
                page: page_number,
                source,
            })?;
            state.stats.pages += 1;

            let short = page.is_short(page_size);
            let listed: KernelSet = page.kernels.into_iter().collect();
            let fresh = listed.difference(&state.processed);
            if fresh.is_empty() {
                debug!(page = page_number, "No new kernels; pagination finished");
                break;
            }
            info!(page = page_number, new = fresh.len(), "Processing page");

            for kernel in fresh {
                state.stats.attempts += 1;
                let result = self.attempt(&kernel, staging, &mut state.folders).await;
                match result {
                    Ok(outcome) => state.record(outcome),
                    Err(error) => {
                        warn!(
                            kernel = self.redactor.display_name(&kernel),
                            error = %error,
                            details = ?error,
                            "Kernel download failed; will retry after pagination"
                        );
                        state.retry.insert(kernel.clone());
                    }
                }
                state.processed.insert(kernel);
            }

            if short {
                debug!(page = page_number, "Short page; pagination finished");
                break;
            }
            page_number += 1;
        }
        Ok(())
    }

    async fn drain(&self, staging: &Path, state: &mut HarvestState) {
        let retry = std::mem::take(&mut state.retry);
        if retry.is_empty() {
            return;
        }
        info!(count = retry.len(), "Retrying failed kernels");

        for kernel in retry {
            state.stats.retried += 1;
            state.stats.attempts += 1;
            let result = self.attempt(&kernel, staging, &mut state.folders).await;
            match result {
                Ok(outcome) => {
                    state.record(outcome);
                    state.stats.recovered += 1;
                }
                Err(error) => {
                    warn!(
                        kernel = self.redactor.display_name(&kernel),
                        error = %error,
                        details = ?error,
                        "Failed to download kernel"
                    );
                    if let Some(folder) = state.folders.get(&kernel.identity()) {
                        discard_partial(folder);
                    }
                    state.stats.failed += 1;
                    state.failed.push(kernel.identity());
                }
            }
        }
    }

    /// One fetch + normalize attempt.
    ///
    /// The first attempt claims a fresh folder and records it in `folders`;
    /// the retry pulls into the same folder again.
    async fn attempt(
        &self,
        kernel: &KernelSummary,
        staging: &Path,
        folders: &mut BTreeMap<KernelIdentity, PathBuf>,
    ) -> Result<AttemptOutcome, KernelFailure> {
        self.redactor.mask_kernel(kernel);
        self.progress.set_message(format!(
            "Downloading {}...",
            self.redactor.display_name(kernel)
        ));

        let identity = kernel.identity();
        let folder = match folders.get(&identity) {
            Some(folder) => folder.clone(),
            None => {
                let folder = claim_folder(kernel, staging).await?;
                folders.insert(identity, folder.clone());
                folder
            }
        };
        self.mask_folder_name(&folder);

        fetch(self.api, kernel, &folder).await?;
        let outcome = match normalize_folder(&folder, !self.options.include_private)? {
            Some(path) => {
                self.mask_folder_name(&path);
                AttemptOutcome::Kept(path)
            }
            None => {
                warn!(
                    kernel = self.redactor.display_name(kernel),
                    "Removed private kernel"
                );
                AttemptOutcome::Removed
            }
        };
        self.progress.inc(1);
        Ok(outcome)
    }

    fn mask_folder_name(&self, folder: &Path) {
        if let Some(name) = folder.file_name() {
            self.redactor.mask(&name.to_string_lossy());
        }
    }
}

/// Best-effort removal of the folder a failed kernel claimed.
fn discard_partial(folder: &Path) {
    if !folder.exists() {
        return;
    }
    if let Err(error) = std::fs::remove_dir_all(folder) {
        warn!(folder = %folder.display(), error = %error, "Could not remove partial kernel folder");
    }
}
