//! CachedConnection: the cache-aside fetch over any `RemoteSource`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loadstone_core::asset::ResourceStream;
use loadstone_core::cache::AssetCache;
use loadstone_core::connection::Connection;
use loadstone_core::error::FetchError;
use std::sync::Arc;
use tracing::{debug, info};

use crate::source::RemoteSource;

/// A connection that serves from the shared cache and falls back to its
/// source.
///
/// With freshness checking disabled a cached asset is returned without any
/// remote access. With it enabled the source is connected and its
/// modification time compared against the cached one; the asset is
/// refetched when the remote is newer or nothing is cached.
pub struct CachedConnection<S> {
    source: S,
    cache: Arc<dyn AssetCache>,
}

impl<S: RemoteSource> CachedConnection<S> {
    pub fn new(source: S, cache: Arc<dyn AssetCache>) -> Self {
        Self { source, cache }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    async fn cached_stream(cache: &dyn AssetCache, uri: &str) -> Result<ResourceStream, FetchError> {
        Ok(cache.retrieve(uri).await?)
    }
}

#[async_trait]
impl<S: RemoteSource> Connection for CachedConnection<S> {
    fn uri(&self) -> &str {
        self.source.uri()
    }

    fn content_type(&self) -> Option<&str> {
        self.source.content_type()
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.source.last_modified()
    }

    async fn connect(&mut self) -> Result<(), FetchError> {
        if !self.source.is_connected() {
            self.source.connect().await?;
        }
        Ok(())
    }

    async fn input_stream(&mut self) -> Result<ResourceStream, FetchError> {
        let uri = self.source.uri().to_string();
        let cached = self.cache.exists(&uri).await;
        let check_freshness = self.cache.freshness_check_enabled();

        if cached && !check_freshness {
            debug!(uri = %uri, "Cache hit");
            return Self::cached_stream(self.cache.as_ref(), &uri).await;
        }

        let mut refresh = !cached;
        if check_freshness {
            self.connect().await?;
            let remote = self.source.last_modified();
            let local = if cached {
                self.cache.last_modified(&uri).await
            } else {
                None
            };
            // None orders before any timestamp.
            refresh = refresh || remote > local;
            debug!(uri = %uri, ?remote, ?local, refresh, "Freshness check");
        }

        if !refresh {
            return Self::cached_stream(self.cache.as_ref(), &uri).await;
        }

        info!(uri = %uri, "Fetching from source");
        let stream = self.source.fetch().await?;

        if !self.cache.policy().is_cachable(&uri) {
            debug!(uri = %uri, "Not cachable, passing through");
            return Ok(stream);
        }

        self.cache.store(&uri, stream).await?;
        Self::cached_stream(self.cache.as_ref(), &uri).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::Duration;
    use futures::stream;
    use loadstone_cache::InMemoryAssetCache;
    use loadstone_core::cache::CachePolicy;
    use loadstone_core::error::CacheError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A scripted source that counts connects and fetches.
    struct FakeSource {
        uri: String,
        body: &'static str,
        remote_modified: Option<DateTime<Utc>>,
        connected: bool,
        fail_mid_stream: bool,
        status: Option<u16>,
        connects: Arc<AtomicUsize>,
        fetches: Arc<AtomicUsize>,
    }

    impl FakeSource {
        fn new(uri: &str, body: &'static str) -> Self {
            Self {
                uri: uri.into(),
                body,
                remote_modified: None,
                connected: false,
                fail_mid_stream: false,
                status: None,
                connects: Arc::new(AtomicUsize::new(0)),
                fetches: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn modified_at(mut self, at: DateTime<Utc>) -> Self {
            self.remote_modified = Some(at);
            self
        }
    }

    #[async_trait]
    impl RemoteSource for FakeSource {
        fn uri(&self) -> &str {
            &self.uri
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        async fn connect(&mut self) -> Result<(), FetchError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            self.connected = true;
            Ok(())
        }

        fn last_modified(&self) -> Option<DateTime<Utc>> {
            if self.connected { self.remote_modified } else { None }
        }

        fn content_type(&self) -> Option<&str> {
            Some("application/json")
        }

        async fn fetch(&mut self) -> Result<ResourceStream, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(status) = self.status {
                return Err(FetchError::Status {
                    uri: self.uri.clone(),
                    status,
                });
            }
            if self.fail_mid_stream {
                return Ok(ResourceStream::from_stream(stream::iter(vec![
                    Ok(Bytes::from_static(b"half")),
                    Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
                ])));
            }
            Ok(ResourceStream::from_bytes(self.body))
        }
    }

    fn cache(freshness: bool) -> Arc<dyn AssetCache> {
        Arc::new(InMemoryAssetCache::new(CachePolicy::new(freshness)))
    }

    async fn read(conn: &mut impl Connection) -> Bytes {
        conn.input_stream().await.unwrap().read_to_end().await.unwrap()
    }

    #[tokio::test]
    async fn miss_fetches_stores_and_rereads() {
        let cache = cache(false);
        let source = FakeSource::new("http://h/a", "alpha");
        let fetches = source.fetches.clone();
        let mut conn = CachedConnection::new(source, cache.clone());

        assert_eq!(&read(&mut conn).await[..], b"alpha");
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert!(cache.exists("http://h/a").await);
    }

    #[tokio::test]
    async fn hit_without_freshness_check_never_touches_source() {
        let cache = cache(false);
        cache
            .store("http://h/a", ResourceStream::from_bytes("cached"))
            .await
            .unwrap();

        let source = FakeSource::new("http://h/a", "remote");
        let (connects, fetches) = (source.connects.clone(), source.fetches.clone());
        let mut conn = CachedConnection::new(source, cache);

        for _ in 0..3 {
            assert_eq!(&read(&mut conn).await[..], b"cached");
        }
        assert_eq!(connects.load(Ordering::SeqCst), 0);
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn newer_remote_triggers_refresh() {
        let cache = cache(true);
        cache
            .store("http://h/a", ResourceStream::from_bytes("old"))
            .await
            .unwrap();
        let stored_at = cache.last_modified("http://h/a").await.unwrap();

        let source =
            FakeSource::new("http://h/a", "new").modified_at(stored_at + Duration::seconds(60));
        let fetches = source.fetches.clone();
        let mut conn = CachedConnection::new(source, cache.clone());

        assert_eq!(&read(&mut conn).await[..], b"new");
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        let bytes = cache
            .retrieve("http://h/a")
            .await
            .unwrap()
            .read_to_end()
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"new");
    }

    #[tokio::test]
    async fn older_remote_serves_cache() {
        let cache = cache(true);
        cache
            .store("http://h/a", ResourceStream::from_bytes("kept"))
            .await
            .unwrap();
        let stored_at = cache.last_modified("http://h/a").await.unwrap();

        let source =
            FakeSource::new("http://h/a", "remote").modified_at(stored_at - Duration::days(1));
        let (connects, fetches) = (source.connects.clone(), source.fetches.clone());
        let mut conn = CachedConnection::new(source, cache);

        assert_eq!(&read(&mut conn).await[..], b"kept");
        assert_eq!(&read(&mut conn).await[..], b"kept");
        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn remote_without_timestamp_serves_cache() {
        let cache = cache(true);
        cache
            .store("http://h/a", ResourceStream::from_bytes("kept"))
            .await
            .unwrap();

        let source = FakeSource::new("http://h/a", "remote");
        let fetches = source.fetches.clone();
        let mut conn = CachedConnection::new(source, cache);

        assert_eq!(&read(&mut conn).await[..], b"kept");
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn freshness_enabled_miss_fetches() {
        let cache = cache(true);
        let source = FakeSource::new("http://h/a", "fresh");
        let (connects, fetches) = (source.connects.clone(), source.fetches.clone());
        let mut conn = CachedConnection::new(source, cache);

        assert_eq!(&read(&mut conn).await[..], b"fresh");
        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn uncachable_uri_passes_through() {
        let cache: Arc<dyn AssetCache> = Arc::new(InMemoryAssetCache::new(
            CachePolicy::new(false).with_uncachable_prefix("http://live/"),
        ));
        let source = FakeSource::new("http://live/feed", "tick");
        let fetches = source.fetches.clone();
        let mut conn = CachedConnection::new(source, cache.clone());

        assert_eq!(&read(&mut conn).await[..], b"tick");
        assert_eq!(&read(&mut conn).await[..], b"tick");
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert!(!cache.exists("http://live/feed").await);
    }

    #[tokio::test]
    async fn failed_fetch_stores_nothing() {
        let cache = cache(false);
        let mut source = FakeSource::new("http://h/a", "");
        source.status = Some(503);
        let mut conn = CachedConnection::new(source, cache.clone());

        let err = conn.input_stream().await.unwrap_err();
        assert_eq!(err.status_code(), 503);
        assert!(!cache.exists("http://h/a").await);
    }

    #[tokio::test]
    async fn broken_body_stores_nothing() {
        let cache = cache(false);
        let mut source = FakeSource::new("http://h/a", "");
        source.fail_mid_stream = true;
        let mut conn = CachedConnection::new(source, cache.clone());

        let err = conn.input_stream().await.unwrap_err();
        assert!(matches!(err, FetchError::Cache(CacheError::Write { .. })));
        assert!(!cache.exists("http://h/a").await);
    }

    #[tokio::test]
    async fn connect_is_idempotent() {
        let source = FakeSource::new("http://h/a", "x");
        let connects = source.connects.clone();
        let mut conn = CachedConnection::new(source, cache(false));

        conn.connect().await.unwrap();
        conn.connect().await.unwrap();
        assert_eq!(connects.load(Ordering::SeqCst), 1);
        assert_eq!(conn.content_type(), Some("application/json"));
    }
}
