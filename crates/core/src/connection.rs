//! Connection trait: one open channel to a URI-addressed resource.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::asset::ResourceStream;
use crate::error::FetchError;

/// A connection to a single resource.
///
/// Construction is where URI validation happens; by the time a caller holds
/// a `Connection` the URI is known to be well formed. `input_stream` applies
/// the cache-aside rules of the implementation.
#[async_trait]
pub trait Connection: Send {
    /// The URI this connection was opened for (also its cache key).
    fn uri(&self) -> &str;

    /// The MIME type reported by the remote or guessed from the path.
    fn content_type(&self) -> Option<&str>;

    /// The remote modification time, known once connected.
    fn last_modified(&self) -> Option<DateTime<Utc>>;

    /// Establish the remote connection (metadata only). Idempotent.
    async fn connect(&mut self) -> std::result::Result<(), FetchError>;

    /// The resource bytes, served from cache or fetched.
    async fn input_stream(&mut self) -> std::result::Result<ResourceStream, FetchError>;
}
