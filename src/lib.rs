//! Kernel Archiver Library
//!
//! Bulk-downloads a user's Kaggle kernels (notebooks and scripts) and packs
//! them into a single zip archive, one folder per kernel.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`api`] - Remote kernel API seam and its Kaggle REST implementation
//! - [`config`] - Credential discovery and environment flags
//! - [`harvest`] - Pagination, deduplication, fetch/retry, normalization, archiving
//! - [`naming`] - Filesystem-safe folder and archive names

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod config;
pub mod harvest;
pub mod naming;
mod user_agent;

// Re-export commonly used types
pub use api::{ApiError, KaggleClient, KernelApi, KernelIdentity, KernelSummary, ListQuery};
pub use config::{ConfigError, Credentials};
pub use harvest::{Harvester, KernelSet, PageSize, Redactor, RunError, RunOptions, RunReport};
