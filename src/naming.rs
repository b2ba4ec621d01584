//! Filesystem-safe names for kernel folders and the output archive.
//!
//! Names are made portable across Linux, macOS, and Windows: the characters
//! `/ \ : * ? " < > |`, control characters, trailing dots/spaces, and reserved
//! device names are never emitted.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::api::{KernelMetadata, KernelSummary};

/// Longest file name (in bytes) accepted by common filesystems.
const MAX_NAME_BYTES: usize = 255;

/// Extension forced onto the output archive.
pub const ARCHIVE_EXTENSION: &str = "zip";

const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Errors from output path validation.
#[derive(Debug, Error)]
pub enum NamingError {
    /// The file name is not safe on every supported platform.
    #[error("invalid filename {name:?}: {reason}")]
    InvalidFilename {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The output's parent directory does not exist.
    #[error("invalid filename {path}: parent directory does not exist ({source})")]
    MissingParent {
        /// The requested output path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

fn is_invalid_char(c: char) -> bool {
    matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
}

fn is_reserved(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or(name).trim_end();
    RESERVED_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem))
}

/// Sanitizes a string into a single safe path segment, replacing every
/// invalid character with `_`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| if is_invalid_char(c) { '_' } else { c })
        .collect();

    let trimmed_len = sanitized.trim_end_matches([' ', '.']).len();
    sanitized.truncate(trimmed_len);

    if sanitized.len() > MAX_NAME_BYTES {
        let mut cut = MAX_NAME_BYTES;
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        sanitized.truncate(cut);
    }

    if sanitized.is_empty() || !is_safe_filename_segment(&sanitized) {
        return "_".to_string();
    }
    if is_reserved(&sanitized) {
        sanitized.push('_');
    }
    sanitized
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Checks that `name` is usable as-is as a file name.
///
/// # Errors
///
/// Returns [`NamingError::InvalidFilename`] describing the first problem found.
pub fn validate_filename(name: &str) -> Result<(), NamingError> {
    let reject = |reason| {
        Err(NamingError::InvalidFilename {
            name: name.to_string(),
            reason,
        })
    };
    if name.is_empty() {
        return reject("name is empty");
    }
    if name.len() > MAX_NAME_BYTES {
        return reject("name is longer than 255 bytes");
    }
    if name.chars().any(is_invalid_char) {
        return reject("name contains a character that is invalid on some filesystems");
    }
    if name.ends_with(' ') || name.ends_with('.') {
        return reject("name ends with a space or dot");
    }
    if is_reserved(name) {
        return reject("name is a reserved device name");
    }
    Ok(())
}

/// Validates the requested output path and returns where the archive will
/// actually be written: `{parent}/{stem}.zip`.
///
/// The parent directory must already exist.
///
/// # Errors
///
/// Returns [`NamingError`] if the parent is missing or the name is unsafe.
pub fn resolve_output_path(requested: &Path) -> Result<PathBuf, NamingError> {
    let name = requested
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    validate_filename(&name)?;

    let parent = match requested.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    parent
        .canonicalize()
        .map_err(|source| NamingError::MissingParent {
            path: requested.to_path_buf(),
            source,
        })?;

    let stem = requested
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or(name);
    Ok(parent.join(format!("{stem}.{ARCHIVE_EXTENSION}")))
}

/// Staging folder name for a freshly listed kernel: `{ref}#{id}`.
#[must_use]
pub fn kernel_folder_name(kernel: &KernelSummary) -> String {
    sanitize_filename(&format!("{}#{}", kernel.reference(), kernel.id))
}

/// Canonical folder name derived from a kernel's sidecar: `{id}#{id_no}`.
#[must_use]
pub fn canonical_folder_name(metadata: &KernelMetadata) -> String {
    sanitize_filename(&format!("{}#{}", metadata.id, metadata.id_no))
}
