//! Claims a staging folder for one kernel and pulls the kernel into it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::api::{ApiError, KernelApi, KernelSummary};
use crate::naming::kernel_folder_name;

/// Errors from fetching a single kernel.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The destination folder could not be created.
    #[error("cannot create kernel folder {path}: {source}")]
    CreateDir {
        /// The folder that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Every candidate folder name for the kernel is already in use.
    #[error("no free kernel folder name near {path}")]
    FolderTaken {
        /// The preferred folder.
        path: PathBuf,
    },

    /// The API pull failed.
    #[error("pull of {kernel_ref} failed: {source}")]
    Pull {
        /// Reference of the kernel being pulled.
        kernel_ref: String,
        /// The underlying API error.
        #[source]
        source: ApiError,
    },
}

/// Highest numeric suffix tried when a kernel's folder name is taken.
const MAX_FOLDER_SUFFIX: usize = 1000;

/// Preferred staging folder for a kernel, `{ref}#{id}`.
#[must_use]
pub fn kernel_folder(kernel: &KernelSummary, staging_dir: &Path) -> PathBuf {
    staging_dir.join(kernel_folder_name(kernel))
}

/// Creates a new, empty folder for `kernel` under `staging_dir`.
///
/// Tries [`kernel_folder`] first, then `{name}_2`, `{name}_3`, ... A folder
/// that already exists is never reused: an earlier kernel may have been
/// renamed to this kernel's preferred name.
///
/// # Errors
///
/// Returns [`FetchError`] if no folder can be created.
pub async fn claim_folder(
    kernel: &KernelSummary,
    staging_dir: &Path,
) -> Result<PathBuf, FetchError> {
    let name = kernel_folder_name(kernel);
    for suffix in 1..=MAX_FOLDER_SUFFIX {
        let candidate = if suffix == 1 {
            staging_dir.join(&name)
        } else {
            staging_dir.join(format!("{name}_{suffix}"))
        };
        match tokio::fs::create_dir(&candidate).await {
            Ok(()) => {
                if suffix > 1 {
                    debug!(folder = %candidate.display(), "Preferred kernel folder taken");
                }
                return Ok(candidate);
            }
            Err(error) if error.kind() == ErrorKind::AlreadyExists => {}
            Err(source) => {
                return Err(FetchError::CreateDir {
                    path: candidate,
                    source,
                });
            }
        }
    }
    Err(FetchError::FolderTaken {
        path: staging_dir.join(name),
    })
}

/// Pulls the kernel's source and metadata sidecar into `folder`, which must
/// have been claimed for this kernel with [`claim_folder`].
///
/// # Errors
///
/// Returns [`FetchError::Pull`] if the pull fails.
#[instrument(level = "debug", skip(api, kernel, folder), fields(kernel_id = kernel.id))]
pub async fn fetch(
    api: &dyn KernelApi,
    kernel: &KernelSummary,
    folder: &Path,
) -> Result<(), FetchError> {
    api.pull_kernel(&kernel.kernel_ref, folder)
        .await
        .map_err(|source| FetchError::Pull {
            kernel_ref: kernel.kernel_ref.clone(),
            source,
        })?;

    debug!(folder = %folder.display(), "Fetched kernel");
    Ok(())
}
