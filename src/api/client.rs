//! Kaggle REST v1 implementation of [`KernelApi`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::{Position, Url};

use super::http::build_api_http_client;
use super::kernel::{METADATA_FILE_NAME, PullResponse, source_extension};
use super::{ApiError, KernelApi, KernelSummary, ListQuery, SORT_BY_DATE_RUN};
use crate::config::Credentials;
use crate::naming::sanitize_filename;

/// Production API root.
pub const DEFAULT_API_BASE: &str = "https://www.kaggle.com/api/v1";

/// Environment variable overriding [`DEFAULT_API_BASE`].
const API_BASE_ENV: &str = "KAGGLE_API_ENDPOINT";

/// Kaggle API client authenticated with basic auth.
///
/// Created once per run and reused for every listing and pull so requests
/// share a connection pool.
#[derive(Debug, Clone)]
pub struct KaggleClient {
    client: Client,
    base: Url,
    credentials: Credentials,
}

impl KaggleClient {
    /// Creates a client against [`DEFAULT_API_BASE`], or `KAGGLE_API_ENDPOINT`
    /// when set.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the base URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(credentials: Credentials) -> Result<Self, ApiError> {
        let base = std::env::var(API_BASE_ENV)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self::with_base_url(credentials, &base)
    }

    /// Creates a client against an explicit API root.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the base URL is invalid or the HTTP client
    /// cannot be built.
    pub fn with_base_url(credentials: Credentials, base: &str) -> Result<Self, ApiError> {
        let parsed = Url::parse(base).map_err(|error| ApiError::InvalidBaseUrl {
            base: base.to_string(),
            reason: error.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl {
                base: base.to_string(),
                reason: "URL cannot be a base".to_string(),
            });
        }
        Ok(Self {
            client: build_api_http_client()?,
            base: parsed,
            credentials,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidBaseUrl {
                base: self.base.to_string(),
                reason: "URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(path.split('/'));
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let endpoint = url[..Position::AfterPath].to_string();
        let response = self
            .client
            .get(url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.key))
            .send()
            .await
            .map_err(|error| ApiError::network(&endpoint, error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(endpoint, status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|error| ApiError::network(&endpoint, error))?;
        serde_json::from_slice(&body).map_err(|error| ApiError::decode(endpoint, error.to_string()))
    }
}

#[async_trait]
impl KernelApi for KaggleClient {
    fn authenticated_user(&self) -> &str {
        &self.credentials.username
    }

    #[instrument(level = "debug", skip(self), fields(user = %query.user, page = query.page))]
    async fn list_kernels(&self, query: &ListQuery) -> Result<Vec<KernelSummary>, ApiError> {
        let mut url = self.endpoint("kernels/list")?;
        url.query_pairs_mut()
            .append_pair("page", &query.page.to_string())
            .append_pair("pageSize", &query.page_size.to_string())
            .append_pair("user", &query.user)
            .append_pair("sortBy", SORT_BY_DATE_RUN)
            .append_pair("group", "profile");

        let kernels: Vec<KernelSummary> = self.get_json(url).await?;
        debug!(count = kernels.len(), "Listed kernels");
        Ok(kernels)
    }

    #[instrument(level = "debug", skip(self, dest), fields(dest = %dest.display()))]
    async fn pull_kernel(&self, kernel_ref: &str, dest: &Path) -> Result<PathBuf, ApiError> {
        let (owner, slug) = split_kernel_ref(kernel_ref)?;
        let mut url = self.endpoint("kernels/pull")?;
        url.query_pairs_mut()
            .append_pair("userName", owner)
            .append_pair("kernelSlug", slug);
        let endpoint = url[..Position::AfterPath].to_string();

        let pulled: PullResponse = self.get_json(url).await?;

        let file_stem = pulled
            .blob
            .slug
            .as_deref()
            .filter(|value| !value.is_empty())
            .unwrap_or(slug);
        let code_file = format!(
            "{}{}",
            sanitize_filename(file_stem),
            source_extension(pulled.language(), pulled.kernel_type())
        );

        let source_path = dest.join(&code_file);
        tokio::fs::write(&source_path, pulled.blob.source.as_bytes())
            .await
            .map_err(|error| ApiError::io(&source_path, error))?;

        let metadata = pulled.to_metadata(code_file);
        let metadata_json = serde_json::to_vec_pretty(&metadata)
            .map_err(|error| ApiError::decode(endpoint, error.to_string()))?;
        let metadata_path = dest.join(METADATA_FILE_NAME);
        tokio::fs::write(&metadata_path, metadata_json)
            .await
            .map_err(|error| ApiError::io(&metadata_path, error))?;

        debug!(source = %source_path.display(), "Pulled kernel");
        Ok(source_path)
    }
}

/// Splits `owner/slug`, rejecting anything else.
fn split_kernel_ref(kernel_ref: &str) -> Result<(&str, &str), ApiError> {
    match kernel_ref.split_once('/') {
        Some((owner, slug)) if !owner.is_empty() && !slug.is_empty() && !slug.contains('/') => {
            Ok((owner, slug))
        }
        _ => Err(ApiError::invalid_ref(kernel_ref)),
    }
}
