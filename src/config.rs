//! Credential discovery and environment flag parsing.
//!
//! Credentials follow the Kaggle convention: `KAGGLE_USERNAME`/`KAGGLE_KEY`
//! environment variables win, otherwise `kaggle.json` is read from
//! `KAGGLE_CONFIG_DIR` or `~/.kaggle`.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Environment variable holding the API username.
pub const USERNAME_ENV: &str = "KAGGLE_USERNAME";
/// Environment variable holding the API key.
pub const KEY_ENV: &str = "KAGGLE_KEY";
/// Environment variable overriding the directory that holds `kaggle.json`.
pub const CONFIG_DIR_ENV: &str = "KAGGLE_CONFIG_DIR";
/// Environment default for `--include-private`.
pub const INCLUDE_PRIVATE_ENV: &str = "KAGGLE_KERNELS_PRIVATE";
/// Environment default for redaction mode.
pub const MASK_ENV: &str = "KAGGLE_KERNELS_MASK";

const CREDENTIALS_FILE_NAME: &str = "kaggle.json";

/// Errors produced while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Neither environment variables nor a credentials file were found.
    #[error(
        "no Kaggle credentials found\n  Suggestion: set {USERNAME_ENV} and {KEY_ENV}, or place kaggle.json in {}",
        .searched.display()
    )]
    MissingCredentials {
        /// The credentials file location that was checked.
        searched: PathBuf,
    },

    /// The credentials file exists but could not be read.
    #[error("cannot read credentials file {path}: {source}")]
    Read {
        /// The credentials file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The credentials file is not valid JSON or lacks fields.
    #[error("malformed credentials file {path}: {source}")]
    Malformed {
        /// The credentials file path.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A credential value is empty.
    #[error("empty Kaggle {field} in credentials")]
    EmptyField {
        /// Which field was empty.
        field: &'static str,
    },

    /// No home directory to look for `.kaggle` in.
    #[error("cannot locate home directory; set {CONFIG_DIR_ENV} or {USERNAME_ENV}/{KEY_ENV}")]
    NoHomeDir,
}

/// API credentials. The key never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    /// Account username; also the default owner for listings.
    pub username: String,
    /// API key.
    pub key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Creates credentials from explicit values.
    #[must_use]
    pub fn new(username: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            key: key.into(),
        }
    }

    /// Resolves credentials from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when no usable credentials are found.
    pub fn resolve() -> Result<Self, ConfigError> {
        let env_value = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let (Some(username), Some(key)) = (env_value(USERNAME_ENV), env_value(KEY_ENV)) {
            debug!(source = "env", "Using Kaggle credentials");
            return Ok(Self::new(username, key));
        }

        let config_dir = match env_value(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => home_dir().ok_or(ConfigError::NoHomeDir)?.join(".kaggle"),
        };
        Self::from_file(&config_dir.join(CREDENTIALS_FILE_NAME))
    }

    /// Reads a `kaggle.json` credentials file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file is missing, unreadable, or malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::MissingCredentials {
                    searched: path.to_path_buf(),
                });
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let credentials: Self =
            serde_json::from_str(&contents).map_err(|source| ConfigError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        if credentials.username.trim().is_empty() {
            return Err(ConfigError::EmptyField { field: "username" });
        }
        if credentials.key.trim().is_empty() {
            return Err(ConfigError::EmptyField { field: "key" });
        }
        debug!(source = %path.display(), "Using Kaggle credentials");
        Ok(credentials)
    }
}

fn home_dir() -> Option<PathBuf> {
    ["HOME", "USERPROFILE"]
        .iter()
        .find_map(|name| std::env::var_os(name).filter(|value| !value.is_empty()))
        .map(PathBuf::from)
}

/// Interprets an environment flag value: `true`, `1`, `y`, `yes`, `ok`
/// (any case) are truthy, everything else is false.
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "y" | "yes" | "ok"
    )
}

/// Reads a boolean flag from the environment using [`is_truthy`].
#[must_use]
pub fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|value| is_truthy(&value))
}
