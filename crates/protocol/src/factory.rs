//! ConnectionFactory: picks a source by URI scheme.

use loadstone_core::cache::AssetCache;
use loadstone_core::connection::Connection;
use loadstone_core::error::ConfigurationError;
use loadstone_core::uri::{ARCHIVE_SCHEMES, ArchiveUri, scheme_of};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::archive::ArchiveSource;
use crate::cached::CachedConnection;
use crate::file::FileSource;
use crate::http::HttpSource;
use crate::source::RemoteSource;

/// Opens cache-aside connections against one shared cache.
///
/// Cheap to clone; the HTTP client and the cache are shared.
#[derive(Clone)]
pub struct ConnectionFactory {
    cache: Arc<dyn AssetCache>,
    client: Client,
}

impl ConnectionFactory {
    pub fn new(cache: Arc<dyn AssetCache>) -> Self {
        Self {
            cache,
            client: Client::new(),
        }
    }

    /// Use a preconfigured HTTP client (timeouts, user agent, proxies).
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn cache(&self) -> &Arc<dyn AssetCache> {
        &self.cache
    }

    /// Open a connection for `uri`.
    ///
    /// Fails immediately on a malformed URI or unknown scheme; no I/O
    /// happens here.
    pub fn open(&self, uri: &str) -> Result<Box<dyn Connection>, ConfigurationError> {
        let scheme = scheme_of(uri)
            .ok_or_else(|| ConfigurationError::MalformedUri {
                uri: uri.to_string(),
                reason: "missing scheme".into(),
            })?
            .to_ascii_lowercase();

        match scheme.as_str() {
            "http" | "https" => Ok(self.wrap(HttpSource::new(uri, self.client.clone())?)),
            "file" => Ok(self.wrap(FileSource::new(uri)?)),
            s if ARCHIVE_SCHEMES.contains(&s) => {
                let archive = ArchiveUri::parse(uri)?;
                let base = self.open(&archive.base)?;
                Ok(self.wrap(ArchiveSource::new(uri, archive, base)))
            }
            _ => Err(ConfigurationError::UnsupportedScheme {
                uri: uri.to_string(),
                scheme,
            }),
        }
    }

    fn wrap<S>(&self, source: S) -> Box<dyn Connection>
    where
        S: RemoteSource + 'static,
    {
        Box::new(CachedConnection::new(source, self.cache.clone()))
    }
}

/// Build an HTTP client with a request timeout and user agent.
pub fn http_client(timeout: Duration, user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
}
