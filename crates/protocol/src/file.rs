//! Local file source (`file:` URIs).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use loadstone_core::asset::ResourceStream;
use loadstone_core::error::{ConfigurationError, FetchError};
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

use crate::mime::guess_content_type;
use crate::source::RemoteSource;

pub struct FileSource {
    uri: String,
    path: PathBuf,
    connected: bool,
    last_modified: Option<DateTime<Utc>>,
}

impl FileSource {
    pub fn new(uri: &str) -> Result<Self, ConfigurationError> {
        let malformed = |reason: &str| ConfigurationError::MalformedUri {
            uri: uri.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(uri).map_err(|e| malformed(&e.to_string()))?;
        if url.scheme() != "file" {
            return Err(ConfigurationError::UnsupportedScheme {
                uri: uri.to_string(),
                scheme: url.scheme().to_string(),
            });
        }
        let path = url
            .to_file_path()
            .map_err(|_| malformed("not a local file path"))?;

        Ok(Self {
            uri: uri.to_string(),
            path,
            connected: false,
            last_modified: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> FetchError {
        FetchError::Io {
            uri: self.uri.clone(),
            source,
        }
    }
}

#[async_trait]
impl RemoteSource for FileSource {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn connect(&mut self) -> Result<(), FetchError> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        self.last_modified = metadata.modified().ok().map(DateTime::<Utc>::from);
        self.connected = true;
        debug!(path = %self.path.display(), last_modified = ?self.last_modified, "Stat file");
        Ok(())
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    fn content_type(&self) -> Option<&str> {
        guess_content_type(&self.uri)
    }

    async fn fetch(&mut self) -> Result<ResourceStream, FetchError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        Ok(ResourceStream::from_bytes(bytes))
    }
}
