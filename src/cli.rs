//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use kernel_archiver::PageSize;
use kernel_archiver::config::{INCLUDE_PRIVATE_ENV, MASK_ENV, env_flag};
use kernel_archiver::naming::resolve_output_path;

/// Download all of a Kaggle user's kernels into one zip archive.
///
/// Kernels are listed most recently run first, page by page, pulled with
/// their metadata, renamed to `owner_slug#id`, and zipped.
#[derive(Parser, Debug)]
#[command(name = "kernel-archiver")]
#[command(author, version, about)]
pub struct Args {
    /// Name of the output zip file (any extension is replaced by .zip)
    #[arg(short, long, default_value = "kernels.zip", value_parser = parse_output_path)]
    pub output: PathBuf,

    /// Include private kernels in the download (default from KAGGLE_KERNELS_PRIVATE)
    #[arg(short = 'p', long)]
    pub include_private: bool,

    /// Kaggle user whose kernels to download (default: authenticated user)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Maximum number of kernels to request per page
    #[arg(short = 's', long, default_value_t = PageSize::default())]
    pub max_page_size: PageSize,

    /// Directory in which to create the temporary staging directory
    #[arg(short, long)]
    pub tmp_dir: Option<PathBuf>,

    /// Mask kernel names in CI logs (default from KAGGLE_KERNELS_MASK)
    #[arg(long, hide = true)]
    pub add_mask: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Flag value, or the environment default when the flag is absent.
    #[must_use]
    pub fn include_private(&self) -> bool {
        self.include_private || env_flag(INCLUDE_PRIVATE_ENV)
    }

    /// Flag value, or the environment default when the flag is absent.
    #[must_use]
    pub fn add_mask(&self) -> bool {
        self.add_mask || env_flag(MASK_ENV)
    }

    /// Default log level when `RUST_LOG` is unset.
    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}

fn parse_output_path(value: &str) -> Result<PathBuf, String> {
    resolve_output_path(std::path::Path::new(value)).map_err(|error| error.to_string())
}
