//! Asset cache trait and the process-wide cache policy.
//!
//! The cache is the single source of truth for a URI once an asset is
//! stored. Connections consult it before touching the network and read
//! back from it after every store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::asset::ResourceStream;
use crate::error::CacheError;
use crate::uri::scheme_of;

/// Policy shared by a cache and every connection that writes into it.
///
/// Freshness checking is one global toggle, not per URI or per scheme.
#[derive(Debug, Default)]
pub struct CachePolicy {
    freshness_check: AtomicBool,
    uncachable_schemes: Vec<String>,
    uncachable_prefixes: Vec<String>,
}

impl CachePolicy {
    pub fn new(freshness_check: bool) -> Self {
        Self {
            freshness_check: AtomicBool::new(freshness_check),
            ..Self::default()
        }
    }

    /// Never cache URIs with this scheme (e.g. `file`).
    pub fn with_uncachable_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.uncachable_schemes.push(scheme.into());
        self
    }

    /// Never cache URIs starting with this prefix.
    pub fn with_uncachable_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.uncachable_prefixes.push(prefix.into());
        self
    }

    pub fn freshness_check_enabled(&self) -> bool {
        self.freshness_check.load(Ordering::Acquire)
    }

    pub fn set_freshness_check(&self, enabled: bool) {
        self.freshness_check.store(enabled, Ordering::Release);
    }

    /// Whether a fetched resource for `uri` should be written to the cache.
    pub fn is_cachable(&self, uri: &str) -> bool {
        if let Some(scheme) = scheme_of(uri) {
            if self
                .uncachable_schemes
                .iter()
                .any(|s| s.eq_ignore_ascii_case(scheme))
            {
                return false;
            }
        }
        !self.uncachable_prefixes.iter().any(|p| uri.starts_with(p.as_str()))
    }
}

/// The core AssetCache trait.
///
/// Implementations: in-memory and file-backed. Reads are concurrent; a store
/// consumes its input completely before publishing, so readers never see a
/// truncated asset.
#[async_trait]
pub trait AssetCache: Send + Sync {
    /// The backend name (e.g., "memory", "file").
    fn name(&self) -> &str;

    /// The policy this cache was created with.
    fn policy(&self) -> &CachePolicy;

    /// Whether connections should validate cached assets against the remote.
    fn freshness_check_enabled(&self) -> bool {
        self.policy().freshness_check_enabled()
    }

    /// Whether an asset is stored for `uri`.
    async fn exists(&self, uri: &str) -> bool;

    /// A new stream over the stored asset.
    async fn retrieve(&self, uri: &str) -> std::result::Result<ResourceStream, CacheError>;

    /// Consume `content` and publish it as the asset for `uri`.
    ///
    /// All-or-nothing: on error the previous asset (if any) is untouched.
    async fn store(&self, uri: &str, content: ResourceStream) -> std::result::Result<(), CacheError>;

    /// When the asset for `uri` was stored, if known.
    async fn last_modified(&self, uri: &str) -> Option<DateTime<Utc>>;

    /// Remove the asset for `uri`. Returns whether one was present.
    async fn remove(&self, uri: &str) -> std::result::Result<bool, CacheError>;

    /// All cached URIs, in no particular order.
    async fn uris(&self) -> Vec<String>;

    /// Drop every asset.
    async fn clear(&self) -> std::result::Result<(), CacheError>;
}
