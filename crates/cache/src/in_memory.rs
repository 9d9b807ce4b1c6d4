//! In-memory asset cache: useful for testing and ephemeral sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loadstone_core::asset::{Asset, ResourceStream};
use loadstone_core::cache::{AssetCache, CachePolicy};
use loadstone_core::error::CacheError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// An asset cache that keeps every asset in a map.
///
/// Each entry is an `Arc<Asset>`; a store swaps in a new `Arc` under the
/// write lock, so readers holding the previous one are unaffected.
pub struct InMemoryAssetCache {
    assets: Arc<RwLock<HashMap<String, Arc<Asset>>>>,
    policy: CachePolicy,
}

impl InMemoryAssetCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            assets: Arc::new(RwLock::new(HashMap::new())),
            policy,
        }
    }

    /// Number of cached assets.
    pub async fn len(&self) -> usize {
        self.assets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.assets.read().await.is_empty()
    }
}

impl Default for InMemoryAssetCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

#[async_trait]
impl AssetCache for InMemoryAssetCache {
    fn name(&self) -> &str {
        "memory"
    }

    fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    async fn exists(&self, uri: &str) -> bool {
        self.assets.read().await.contains_key(uri)
    }

    async fn retrieve(&self, uri: &str) -> Result<ResourceStream, CacheError> {
        self.assets
            .read()
            .await
            .get(uri)
            .map(|asset| asset.stream())
            .ok_or_else(|| CacheError::NotFound(uri.to_string()))
    }

    async fn store(&self, uri: &str, content: ResourceStream) -> Result<(), CacheError> {
        // Drain before taking the lock: a failed read leaves the map untouched.
        let bytes = content.read_to_end().await.map_err(|e| CacheError::Write {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;

        debug!(uri = %uri, bytes = bytes.len(), "Storing asset in memory");
        let asset = Arc::new(Asset::new(uri, bytes));
        self.assets.write().await.insert(uri.to_string(), asset);
        Ok(())
    }

    async fn last_modified(&self, uri: &str) -> Option<DateTime<Utc>> {
        self.assets
            .read()
            .await
            .get(uri)
            .and_then(|asset| asset.last_modified)
    }

    async fn remove(&self, uri: &str) -> Result<bool, CacheError> {
        Ok(self.assets.write().await.remove(uri).is_some())
    }

    async fn uris(&self) -> Vec<String> {
        self.assets.read().await.keys().cloned().collect()
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.assets.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;

    #[tokio::test]
    async fn store_and_retrieve() {
        let cache = InMemoryAssetCache::default();
        assert!(!cache.exists("http://example.com/a").await);

        cache
            .store("http://example.com/a", ResourceStream::from_bytes("alpha"))
            .await
            .unwrap();

        assert!(cache.exists("http://example.com/a").await);
        let bytes = cache
            .retrieve("http://example.com/a")
            .await
            .unwrap()
            .read_to_end()
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"alpha");
        assert!(cache.last_modified("http://example.com/a").await.is_some());
    }

    #[tokio::test]
    async fn retrieve_missing_is_not_found() {
        let cache = InMemoryAssetCache::default();
        let err = cache.retrieve("http://example.com/missing").await.unwrap_err();
        assert!(matches!(err, CacheError::NotFound(_)));
        assert!(cache.last_modified("http://example.com/missing").await.is_none());
    }

    #[tokio::test]
    async fn store_replaces_previous_asset() {
        let cache = InMemoryAssetCache::default();
        cache.store("k", ResourceStream::from_bytes("one")).await.unwrap();
        let first = cache.last_modified("k").await.unwrap();

        cache.store("k", ResourceStream::from_bytes("two")).await.unwrap();
        let bytes = cache.retrieve("k").await.unwrap().read_to_end().await.unwrap();
        assert_eq!(&bytes[..], b"two");
        assert!(cache.last_modified("k").await.unwrap() >= first);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn failed_store_keeps_previous_asset() {
        let cache = InMemoryAssetCache::default();
        cache.store("k", ResourceStream::from_bytes("good")).await.unwrap();

        let broken = ResourceStream::from_stream(stream::iter(vec![
            Ok(Bytes::from_static(b"par")),
            Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "cut")),
        ]));
        let err = cache.store("k", broken).await.unwrap_err();
        assert!(matches!(err, CacheError::Write { .. }));

        let bytes = cache.retrieve("k").await.unwrap().read_to_end().await.unwrap();
        assert_eq!(&bytes[..], b"good");
    }

    #[tokio::test]
    async fn failed_first_store_leaves_no_entry() {
        let cache = InMemoryAssetCache::default();
        let broken = ResourceStream::from_stream(stream::iter(vec![Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ))]));
        assert!(cache.store("k", broken).await.is_err());
        assert!(!cache.exists("k").await);
    }

    #[tokio::test]
    async fn remove_and_clear() {
        let cache = InMemoryAssetCache::default();
        cache.store("a", ResourceStream::from_bytes("1")).await.unwrap();
        cache.store("b", ResourceStream::from_bytes("2")).await.unwrap();

        assert!(cache.remove("a").await.unwrap());
        assert!(!cache.remove("a").await.unwrap());
        assert_eq!(cache.uris().await, vec!["b".to_string()]);

        cache.clear().await.unwrap();
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn policy_is_exposed() {
        let cache = InMemoryAssetCache::new(CachePolicy::new(true));
        assert!(cache.freshness_check_enabled());
        cache.policy().set_freshness_check(false);
        assert!(!cache.freshness_check_enabled());
    }
}
