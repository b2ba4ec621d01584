//! Kernel records exchanged with the remote API and written to disk.

use std::fmt;

use serde::{Deserialize, Serialize};

/// File name of the metadata sidecar written into every pulled kernel folder.
pub const METADATA_FILE_NAME: &str = "kernel-metadata.json";

/// A kernel as returned by the listing endpoint.
///
/// The private flag is normalized once at deserialization: older API versions
/// send `isPrivateNullable`, newer ones `isPrivate`. Either way it ends up in
/// [`KernelSummary::private`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawKernelSummary")]
pub struct KernelSummary {
    /// Stable numeric identity.
    pub id: i64,
    /// Slug-like reference, `owner/slug`. Empty when the listing omitted it.
    pub kernel_ref: String,
    /// Human-readable title.
    pub title: String,
    /// Owner username, when reported.
    pub author: Option<String>,
    /// Privacy flag; `None` when the API did not say.
    pub private: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawKernelSummary {
    id: i64,
    #[serde(rename = "ref", default)]
    kernel_ref: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    is_private: Option<bool>,
    #[serde(default)]
    is_private_nullable: Option<bool>,
}

impl From<RawKernelSummary> for KernelSummary {
    fn from(raw: RawKernelSummary) -> Self {
        Self {
            id: raw.id,
            kernel_ref: raw.kernel_ref.unwrap_or_default(),
            title: raw.title.unwrap_or_default(),
            author: raw.author,
            private: raw.is_private.or(raw.is_private_nullable),
        }
    }
}

impl KernelSummary {
    /// Creates a summary with an unknown privacy flag.
    #[must_use]
    pub fn new(id: i64, kernel_ref: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id,
            kernel_ref: kernel_ref.into(),
            title: title.into(),
            author: None,
            private: None,
        }
    }

    /// Sets the privacy flag.
    #[must_use]
    pub fn with_private(mut self, private: bool) -> Self {
        self.private = Some(private);
        self
    }

    /// Whether the kernel must be treated as private. Unknown means private.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.private.unwrap_or(true)
    }

    /// The reference, falling back to the title when the listing omitted it.
    #[must_use]
    pub fn reference(&self) -> &str {
        if self.kernel_ref.is_empty() {
            &self.title
        } else {
            &self.kernel_ref
        }
    }

    /// The deduplication key for this kernel.
    #[must_use]
    pub fn identity(&self) -> KernelIdentity {
        KernelIdentity {
            id: self.id,
            reference: self.reference().to_string(),
        }
    }
}

/// Deduplication key: `(id, ref-or-title)`.
///
/// Ordered by id first, so sets of identities iterate in a stable order that
/// does not depend on which page a kernel was seen on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KernelIdentity {
    /// Numeric kernel id.
    pub id: i64,
    /// Reference, or title when the reference is missing.
    pub reference: String,
}

impl fmt::Display for KernelIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.reference, self.id)
    }
}

/// The `kernel-metadata.json` sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelMetadata {
    /// Canonical identifier, `owner/slug`.
    pub id: String,
    /// Numeric kernel id.
    pub id_no: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub code_file: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub kernel_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_private: Option<bool>,
    /// Field name used by older sidecars.
    #[serde(rename = "isPrivate", default, skip_serializing_if = "Option::is_none")]
    pub legacy_is_private: Option<bool>,
    #[serde(default)]
    pub enable_gpu: bool,
    #[serde(default)]
    pub enable_tpu: bool,
    #[serde(default)]
    pub enable_internet: bool,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub dataset_sources: Vec<String>,
    #[serde(default)]
    pub kernel_sources: Vec<String>,
    #[serde(default)]
    pub competition_sources: Vec<String>,
    #[serde(default)]
    pub model_sources: Vec<String>,
}

impl KernelMetadata {
    /// Whether the sidecar marks the kernel private. A sidecar without either
    /// flag counts as private.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.is_private.or(self.legacy_is_private).unwrap_or(true)
    }
}

/// Body of the pull endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PullResponse {
    pub metadata: PulledMetadata,
    pub blob: PulledBlob,
}

/// Kernel metadata as the pull endpoint reports it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PulledMetadata {
    pub id: i64,
    #[serde(rename = "ref")]
    pub kernel_ref: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub kernel_type: Option<String>,
    #[serde(default)]
    pub is_private: Option<bool>,
    #[serde(default)]
    pub enable_gpu: Option<bool>,
    #[serde(default)]
    pub enable_tpu: Option<bool>,
    #[serde(default)]
    pub enable_internet: Option<bool>,
    #[serde(default)]
    pub category_ids: Vec<String>,
    #[serde(default)]
    pub dataset_data_sources: Vec<String>,
    #[serde(default)]
    pub kernel_data_sources: Vec<String>,
    #[serde(default)]
    pub competition_data_sources: Vec<String>,
    #[serde(default)]
    pub model_data_sources: Vec<String>,
}

/// Kernel source as the pull endpoint reports it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PulledBlob {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub kernel_type: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

impl PullResponse {
    /// Language, preferring the blob's value over the metadata's.
    #[must_use]
    pub fn language(&self) -> &str {
        self.blob
            .language
            .as_deref()
            .or(self.metadata.language.as_deref())
            .unwrap_or_default()
    }

    /// Kernel type, preferring the blob's value over the metadata's.
    #[must_use]
    pub fn kernel_type(&self) -> &str {
        self.blob
            .kernel_type
            .as_deref()
            .or(self.metadata.kernel_type.as_deref())
            .unwrap_or_default()
    }

    /// Builds the sidecar for a source file saved as `code_file`.
    #[must_use]
    pub fn to_metadata(&self, code_file: impl Into<String>) -> KernelMetadata {
        let meta = &self.metadata;
        KernelMetadata {
            id: meta.kernel_ref.clone(),
            id_no: meta.id,
            title: meta.title.clone(),
            code_file: code_file.into(),
            language: self.language().to_string(),
            kernel_type: self.kernel_type().to_string(),
            is_private: meta.is_private,
            legacy_is_private: None,
            enable_gpu: meta.enable_gpu.unwrap_or(false),
            enable_tpu: meta.enable_tpu.unwrap_or(false),
            enable_internet: meta.enable_internet.unwrap_or(false),
            keywords: meta.category_ids.clone(),
            dataset_sources: meta.dataset_data_sources.clone(),
            kernel_sources: meta.kernel_data_sources.clone(),
            competition_sources: meta.competition_data_sources.clone(),
            model_sources: meta.model_data_sources.clone(),
        }
    }
}

/// File extension for a kernel's source given its language and type.
#[must_use]
pub fn source_extension(language: &str, kernel_type: &str) -> &'static str {
    let script = kernel_type.eq_ignore_ascii_case("script");
    match language.to_ascii_lowercase().as_str() {
        "python" if script => ".py",
        "python" => ".ipynb",
        "r" if script => ".R",
        "r" => ".irnb",
        "rmarkdown" => ".Rmd",
        "sqlite" => ".sql",
        "julia" => ".jl",
        _ => ".txt",
    }
}
