//! Resolver trait: the multi-location lookup used on a cache miss.

use async_trait::async_trait;

use crate::asset::ResourceStream;
use crate::error::ResolveError;

/// Finds a resource by trying one or more candidate locations.
///
/// On success the resolver is responsible for populating the cache (if the
/// URI is cachable), so the next load of the same URI is a cache hit.
#[async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, uri: &str) -> std::result::Result<ResourceStream, ResolveError>;
}
