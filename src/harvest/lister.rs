//! One page of a user's kernels, optionally without private ones.

use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use tracing::debug;

use crate::api::{ApiError, KernelApi, KernelSummary, ListQuery};

/// Largest page size the listing endpoint serves.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A validated, strictly positive page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize(NonZeroU32);

impl PageSize {
    /// Returns `None` for zero.
    #[must_use]
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(NonZeroU32::MIN.saturating_add(MAX_PAGE_SIZE - 1))
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| "Value must be a positive integer.".to_string())
    }
}

/// One listed page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Kernels that survived privacy filtering, in API order.
    pub kernels: Vec<KernelSummary>,
    /// Number of kernels the API returned before filtering.
    pub raw_len: usize,
}

impl Page {
    /// Whether the API returned fewer kernels than requested.
    #[must_use]
    pub fn is_short(&self, page_size: PageSize) -> bool {
        self.raw_len < page_size.get() as usize
    }
}

/// Lists page `page` of `user`'s kernels, most recently run first.
///
/// With `include_private == false`, kernels that are private, or whose
/// privacy is unknown, are dropped.
///
/// # Errors
///
/// Propagates the [`ApiError`] of the listing call; nothing is retried here.
pub async fn list_page(
    api: &dyn KernelApi,
    user: &str,
    page: u32,
    include_private: bool,
    page_size: PageSize,
) -> Result<Page, ApiError> {
    let query = ListQuery::new(user, page, page_size.get());
    let listed = api.list_kernels(&query).await?;
    let raw_len = listed.len();

    let kernels: Vec<KernelSummary> = if include_private {
        listed
    } else {
        listed.into_iter().filter(|k| !k.is_private()).collect()
    };

    debug!(
        page,
        raw = raw_len,
        kept = kernels.len(),
        include_private,
        "Listed page"
    );
    Ok(Page { kernels, raw_len })
}
