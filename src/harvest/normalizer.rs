//! Renames fetched kernel folders to their canonical name, or removes them.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{KernelMetadata, METADATA_FILE_NAME};
use crate::naming::canonical_folder_name;

/// Errors from folder normalization.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The sidecar exists but could not be read.
    #[error("cannot read kernel metadata {path}: {source}")]
    ReadMetadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The sidecar is not valid JSON or lacks its identifiers.
    #[error("malformed kernel metadata {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A private or unidentifiable kernel folder could not be deleted.
    #[error("cannot remove kernel folder {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rename to the canonical name failed.
    #[error("cannot rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Normalizes one fetched kernel folder.
///
/// Returns the folder's final path, or `None` when it was removed because the
/// kernel is private (or its privacy could not be determined) and
/// `remove_private` is set. A canonical name that already exists on disk is
/// never overwritten; the folder keeps its current name instead.
///
/// # Errors
///
/// Returns [`NormalizeError`] on unreadable metadata or failed filesystem
/// operations.
pub fn normalize_folder(
    path: &Path,
    remove_private: bool,
) -> Result<Option<PathBuf>, NormalizeError> {
    let metadata_path = path.join(METADATA_FILE_NAME);
    let contents = match fs::read_to_string(&metadata_path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "Kernel metadata not found");
            if !remove_private {
                return Ok(Some(path.to_path_buf()));
            }
            remove_folder(path)?;
            return Ok(None);
        }
        Err(source) => {
            return Err(NormalizeError::ReadMetadata {
                path: metadata_path,
                source,
            });
        }
    };

    let metadata: KernelMetadata =
        serde_json::from_str(&contents).map_err(|source| NormalizeError::Metadata {
            path: metadata_path,
            source,
        })?;

    if remove_private && metadata.is_private() {
        debug!(path = %path.display(), "Removing private kernel");
        remove_folder(path)?;
        return Ok(None);
    }

    let canonical = canonical_folder_name(&metadata);
    if path.file_name().is_some_and(|name| name == canonical.as_str()) {
        return Ok(Some(path.to_path_buf()));
    }
    let Some(parent) = path.parent() else {
        return Ok(Some(path.to_path_buf()));
    };

    let new_path = parent.join(&canonical);
    if new_path.exists() {
        warn!(
            path = %path.display(),
            canonical = %new_path.display(),
            "Canonical kernel folder already exists; keeping current name"
        );
        return Ok(Some(path.to_path_buf()));
    }

    debug!(from = %path.display(), to = %new_path.display(), "Renaming kernel");
    fs::rename(path, &new_path).map_err(|source| NormalizeError::Rename {
        from: path.to_path_buf(),
        to: new_path.clone(),
        source,
    })?;
    Ok(Some(new_path))
}

fn remove_folder(path: &Path) -> Result<(), NormalizeError> {
    fs::remove_dir_all(path).map_err(|source| NormalizeError::Remove {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn kernel_dir(root: &Path, name: &str, metadata: Option<&str>) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("source.ipynb"), "{}").unwrap();
        if let Some(metadata) = metadata {
            fs::write(dir.join(METADATA_FILE_NAME), metadata).unwrap();
        }
        dir
    }

    const PUBLIC: &str = r#"{"id": "alice/eda", "id_no": 42, "is_private": false}"#;
    const PRIVATE: &str = r#"{"id": "alice/secret", "id_no": 7, "is_private": true}"#;

    #[test]
    fn test_renames_to_canonical_name() {
        let root = TempDir::new().unwrap();
        let dir = kernel_dir(root.path(), "EDA#42", Some(PUBLIC));

        let result = normalize_folder(&dir, true).unwrap().unwrap();
        assert_eq!(result, root.path().join("alice_eda#42"));
        assert!(result.join("source.ipynb").is_file());
        assert!(!dir.exists());
    }

    #[test]
    fn test_second_normalization_is_noop() {
        let root = TempDir::new().unwrap();
        let dir = kernel_dir(root.path(), "EDA#42", Some(PUBLIC));

        let first = normalize_folder(&dir, true).unwrap().unwrap();
        let second = normalize_folder(&first, true).unwrap().unwrap();
        assert_eq!(first, second);

        let names: Vec<_> = fs::read_dir(root.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("alice_eda#42")]);
    }

    #[test]
    fn test_removes_private_kernel_when_requested() {
        let root = TempDir::new().unwrap();
        let dir = kernel_dir(root.path(), "alice_secret#7", Some(PRIVATE));

        assert_eq!(normalize_folder(&dir, true).unwrap(), None);
        assert!(!dir.exists());
    }

    #[test]
    fn test_keeps_private_kernel_when_not_removing() {
        let root = TempDir::new().unwrap();
        let dir = kernel_dir(root.path(), "alice_secret#7", Some(PRIVATE));

        assert_eq!(normalize_folder(&dir, false).unwrap(), Some(dir.clone()));
        assert!(dir.exists());
    }

    #[test]
    fn test_legacy_private_flag_and_missing_flag_count_as_private() {
        let root = TempDir::new().unwrap();
        let legacy = kernel_dir(
            root.path(),
            "legacy",
            Some(r#"{"id": "a/b", "id_no": 1, "isPrivate": true}"#),
        );
        let unknown = kernel_dir(root.path(), "unknown", Some(r#"{"id": "a/c", "id_no": 2}"#));

        assert_eq!(normalize_folder(&legacy, true).unwrap(), None);
        assert_eq!(normalize_folder(&unknown, true).unwrap(), None);
    }

    #[test]
    fn test_missing_metadata_passes_through_or_removes() {
        let root = TempDir::new().unwrap();
        let dir = kernel_dir(root.path(), "orphan#1", None);

        assert_eq!(normalize_folder(&dir, false).unwrap(), Some(dir.clone()));
        assert!(dir.exists());

        assert_eq!(normalize_folder(&dir, true).unwrap(), None);
        assert!(!dir.exists());
    }

    #[test]
    fn test_collision_leaves_folder_untouched() {
        let root = TempDir::new().unwrap();
        let existing = kernel_dir(root.path(), "alice_eda#42", Some(PUBLIC));
        fs::write(existing.join("marker"), "first").unwrap();
        let second = kernel_dir(root.path(), "other#42", Some(PUBLIC));

        assert_eq!(normalize_folder(&second, true).unwrap(), Some(second.clone()));
        assert!(second.exists());
        assert_eq!(fs::read_to_string(existing.join("marker")).unwrap(), "first");
    }

    #[test]
    fn test_malformed_metadata_is_an_error() {
        let root = TempDir::new().unwrap();
        let dir = kernel_dir(root.path(), "bad", Some("{not json"));

        assert!(matches!(
            normalize_folder(&dir, false),
            Err(NormalizeError::Metadata { .. })
        ));
        assert!(dir.exists());
    }
}
