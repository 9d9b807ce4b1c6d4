//! LocationResolver: tries candidate locations in order.
//!
//! An absolute URI is tried as-is. A relative one is joined onto each
//! configured search root. The first candidate that yields a stream wins;
//! if every candidate fails, the last failure is returned.

use async_trait::async_trait;
use loadstone_core::asset::ResourceStream;
use loadstone_core::error::{ConfigurationError, ResolveError};
use loadstone_core::resolver::Resolver;
use loadstone_core::uri::scheme_of;
use loadstone_protocol::ConnectionFactory;
use tracing::{debug, info, warn};

pub struct LocationResolver {
    factory: ConnectionFactory,
    search_roots: Vec<String>,
}

impl LocationResolver {
    pub fn new(factory: ConnectionFactory) -> Self {
        Self {
            factory,
            search_roots: Vec::new(),
        }
    }

    pub fn with_search_roots<I, S>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_roots.extend(roots.into_iter().map(Into::into));
        self
    }

    /// The URIs tried for `uri`, in order.
    pub fn candidates(&self, uri: &str) -> Vec<String> {
        if scheme_of(uri).is_some() {
            return vec![uri.to_string()];
        }
        self.search_roots
            .iter()
            .map(|root| join(root, uri))
            .collect()
    }

    async fn try_candidate(&self, candidate: &str) -> Result<ResourceStream, ResolveError> {
        let mut connection = self.factory.open(candidate)?;
        Ok(connection.input_stream().await?)
    }

    /// Make the next load of `uri` a cache hit.
    ///
    /// A candidate equal to `uri` was already cached by its connection.
    async fn publish(
        &self,
        uri: &str,
        candidate: &str,
        stream: ResourceStream,
    ) -> Result<ResourceStream, ResolveError> {
        let cache = self.factory.cache();
        if candidate == uri || !cache.policy().is_cachable(uri) {
            return Ok(stream);
        }
        cache.store(uri, stream).await?;
        Ok(cache.retrieve(uri).await?)
    }
}

fn join(root: &str, relative: &str) -> String {
    let relative = relative.trim_start_matches('/');
    if root.ends_with('/') {
        format!("{root}{relative}")
    } else {
        format!("{root}/{relative}")
    }
}

#[async_trait]
impl Resolver for LocationResolver {
    async fn resolve(&self, uri: &str) -> Result<ResourceStream, ResolveError> {
        let candidates = self.candidates(uri);
        if candidates.is_empty() {
            return Err(ConfigurationError::MalformedUri {
                uri: uri.to_string(),
                reason: "relative URI and no search roots configured".into(),
            }
            .into());
        }

        let mut last_error = None;
        for candidate in &candidates {
            match self.try_candidate(candidate).await {
                Ok(stream) => {
                    info!(uri = %uri, location = %candidate, "Resolved");
                    return self.publish(uri, candidate, stream).await;
                }
                Err(e) => {
                    debug!(uri = %uri, location = %candidate, error = %e, "Candidate failed");
                    last_error = Some(e);
                }
            }
        }

        warn!(uri = %uri, tried = candidates.len(), "No location could supply resource");
        Err(last_error.unwrap_or_else(|| ResolveError::NotFound {
            uri: uri.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadstone_cache::InMemoryAssetCache;
    use loadstone_core::cache::{AssetCache, CachePolicy};
    use std::sync::Arc;

    fn resolver(roots: &[&str]) -> (LocationResolver, Arc<dyn AssetCache>) {
        let cache: Arc<dyn AssetCache> = Arc::new(InMemoryAssetCache::default());
        let resolver = LocationResolver::new(ConnectionFactory::new(cache.clone()))
            .with_search_roots(roots.iter().copied());
        (resolver, cache)
    }

    #[test]
    fn candidates_for_absolute_and_relative() {
        let (r, _) = resolver(&["http://a.example/lib", "http://b.example/lib/"]);
        assert_eq!(r.candidates("http://c.example/x.json"), vec!["http://c.example/x.json"]);
        assert_eq!(
            r.candidates("/tools/x.json"),
            vec![
                "http://a.example/lib/tools/x.json",
                "http://b.example/lib/tools/x.json"
            ]
        );
    }

    #[tokio::test]
    async fn relative_without_roots_is_configuration_error() {
        let (r, _) = resolver(&[]);
        let err = r.resolve("tools/x.json").await.unwrap_err();
        assert!(matches!(err, ResolveError::Configuration(_)));
    }

    #[tokio::test]
    async fn falls_through_to_later_root_and_caches_under_request() {
        let mut primary = mockito::Server::new_async().await;
        let mut mirror = mockito::Server::new_async().await;
        let miss = primary
            .mock("GET", "/tools/box.json")
            .with_status(404)
            .create_async()
            .await;
        let hit = mirror
            .mock("GET", "/tools/box.json")
            .with_status(200)
            .with_body("box")
            .create_async()
            .await;

        let (r, cache) = resolver(&[primary.url().as_str(), mirror.url().as_str()]);
        let bytes = r
            .resolve("tools/box.json")
            .await
            .unwrap()
            .read_to_end()
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"box");
        miss.assert_async().await;
        hit.assert_async().await;

        assert!(cache.exists("tools/box.json").await);
        assert!(cache.exists(&format!("{}/tools/box.json", mirror.url())).await);
    }

    #[tokio::test]
    async fn all_candidates_failing_returns_last_status() {
        let mut server = mockito::Server::new_async().await;
        let _gone = server
            .mock("GET", "/x.json")
            .with_status(410)
            .create_async()
            .await;

        let (r, _) = resolver(&[server.url().as_str()]);
        let err = r.resolve("x.json").await.unwrap_err();
        assert_eq!(err.status_code(), Some(410));
    }

    #[tokio::test]
    async fn uncachable_request_is_not_stored() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("GET", "/live/feed")
            .with_status(200)
            .with_body("tick")
            .create_async()
            .await;

        let cache: Arc<dyn AssetCache> = Arc::new(InMemoryAssetCache::new(
            CachePolicy::new(false).with_uncachable_prefix("live/"),
        ));
        let r = LocationResolver::new(ConnectionFactory::new(cache.clone()))
            .with_search_roots([server.url()]);

        let bytes = r.resolve("live/feed").await.unwrap().read_to_end().await.unwrap();
        assert_eq!(&bytes[..], b"tick");
        assert!(!cache.exists("live/feed").await);
    }
}
