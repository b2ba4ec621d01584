//! Ordered kernel sets keyed by [`KernelIdentity`].

use std::collections::BTreeMap;

use crate::api::{KernelIdentity, KernelSummary};

/// An ordered set of kernels, deduplicated by identity.
///
/// Used for the processed set, the retry set, and each listed page. When two
/// summaries share an identity the first one inserted is kept.
#[derive(Debug, Clone, Default)]
pub struct KernelSet {
    entries: BTreeMap<KernelIdentity, KernelSummary>,
}

impl KernelSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a kernel. Returns false if its identity was already present.
    pub fn insert(&mut self, kernel: KernelSummary) -> bool {
        let identity = kernel.identity();
        if self.entries.contains_key(&identity) {
            return false;
        }
        self.entries.insert(identity, kernel);
        true
    }

    #[must_use]
    pub fn contains(&self, identity: &KernelIdentity) -> bool {
        self.entries.contains_key(identity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Kernels in `self` whose identity is not in `seen`, in identity order.
    #[must_use]
    pub fn difference(&self, seen: &Self) -> Vec<KernelSummary> {
        self.entries
            .iter()
            .filter(|(identity, _)| !seen.contains(identity))
            .map(|(_, kernel)| kernel.clone())
            .collect()
    }

    /// Iterates kernels in identity order.
    pub fn iter(&self) -> impl Iterator<Item = &KernelSummary> {
        self.entries.values()
    }

    /// Iterates identities in order.
    pub fn identities(&self) -> impl Iterator<Item = &KernelIdentity> {
        self.entries.keys()
    }
}

impl FromIterator<KernelSummary> for KernelSet {
    fn from_iter<I: IntoIterator<Item = KernelSummary>>(iter: I) -> Self {
        let mut set = Self::new();
        for kernel in iter {
            set.insert(kernel);
        }
        set
    }
}

impl IntoIterator for KernelSet {
    type Item = KernelSummary;
    type IntoIter = std::collections::btree_map::IntoValues<KernelIdentity, KernelSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_values()
    }
}
