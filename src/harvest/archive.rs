//! Zips the staging directory into the output archive.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::result::ZipError;
use zip::write::FileOptions;

/// Errors from archive creation. All of them are fatal to a run.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The output file could not be created.
    #[error("cannot create archive {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The staging directory could not be traversed.
    #[error("cannot walk staging directory {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A staged file could not be read into the archive.
    #[error("cannot add {path} to archive: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The zip writer failed.
    #[error("cannot write archive {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: ZipError,
    },
}

/// Packs every entry under `staging_dir` into a zip archive at `output`.
///
/// Entry names are relative to `staging_dir`, so each kernel folder becomes
/// one top-level folder in the archive. Entries are added in file-name order.
/// The parent of `output` must already exist.
///
/// # Errors
///
/// Returns [`ArchiveError`] on any IO or zip failure.
pub fn archive_dir(staging_dir: &Path, output: &Path) -> Result<PathBuf, ArchiveError> {
    let file = File::create(output).map_err(|source| ArchiveError::Create {
        path: output.to_path_buf(),
        source,
    })?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let zip_error = |source| ArchiveError::Zip {
        path: output.to_path_buf(),
        source,
    };

    let mut entries = 0usize;
    for entry in WalkDir::new(staging_dir)
        .min_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ArchiveError::Walk {
            path: staging_dir.to_path_buf(),
            source,
        })?;
        let Some(name) = entry_name(staging_dir, entry.path()) else {
            continue;
        };

        if entry.file_type().is_dir() {
            writer
                .add_directory(format!("{name}/"), options)
                .map_err(zip_error)?;
        } else {
            writer.start_file(name, options).map_err(zip_error)?;
            let mut source = File::open(entry.path()).map_err(|source| ArchiveError::Read {
                path: entry.path().to_path_buf(),
                source,
            })?;
            io::copy(&mut source, &mut writer).map_err(|source| ArchiveError::Read {
                path: entry.path().to_path_buf(),
                source,
            })?;
        }
        entries += 1;
        debug!(entry = %entry.path().display(), "Archived entry");
    }

    let mut inner = writer.finish().map_err(zip_error)?;
    io::Write::flush(&mut inner).map_err(|source| ArchiveError::Create {
        path: output.to_path_buf(),
        source,
    })?;

    info!(archive = %output.display(), entries, "Archive written");
    Ok(output.to_path_buf())
}

/// Archive entry name for `path`, with `/` separators.
fn entry_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}
