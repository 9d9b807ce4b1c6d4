//! RemoteSource trait: the uncached side of a connection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loadstone_core::asset::ResourceStream;
use loadstone_core::error::FetchError;

/// Where the bytes for a URI really live.
///
/// `connect` fetches metadata only; `fetch` transfers the body. Sources know
/// nothing about caching.
#[async_trait]
pub trait RemoteSource: Send {
    fn uri(&self) -> &str;

    fn is_connected(&self) -> bool;

    async fn connect(&mut self) -> Result<(), FetchError>;

    /// Remote modification time. `None` until connected, or if the remote
    /// does not report one.
    fn last_modified(&self) -> Option<DateTime<Utc>>;

    fn content_type(&self) -> Option<&str>;

    async fn fetch(&mut self) -> Result<ResourceStream, FetchError>;
}
