//! Archive entry source (`archive:<base>!/<entry>`, alias `jar:`).
//!
//! The outer archive is read through its own connection, so it is cached
//! (or not) under its base URI like any other resource. The entry is then
//! extracted on the blocking pool.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use loadstone_core::asset::ResourceStream;
use loadstone_core::connection::Connection;
use loadstone_core::error::FetchError;
use loadstone_core::uri::ArchiveUri;
use std::io::{Cursor, Read};
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::mime::guess_content_type;
use crate::source::RemoteSource;

pub struct ArchiveSource {
    uri: String,
    archive: ArchiveUri,
    base: Box<dyn Connection>,
    connected: bool,
}

impl ArchiveSource {
    /// `base` must be a connection to `archive.base`.
    pub fn new(uri: impl Into<String>, archive: ArchiveUri, base: Box<dyn Connection>) -> Self {
        Self {
            uri: uri.into(),
            archive,
            base,
            connected: false,
        }
    }

    pub fn archive(&self) -> &ArchiveUri {
        &self.archive
    }
}

/// Read one entry out of a zip archive held in memory.
pub fn extract_entry(archive_uri: &str, data: Bytes, entry: &str) -> Result<Bytes, FetchError> {
    let mut zip = ZipArchive::new(Cursor::new(data)).map_err(|e| FetchError::Archive {
        uri: archive_uri.to_string(),
        reason: e.to_string(),
    })?;

    let mut file = match zip.by_name(entry) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => {
            return Err(FetchError::EntryNotFound {
                archive: archive_uri.to_string(),
                entry: entry.to_string(),
            });
        }
        Err(e) => {
            return Err(FetchError::Archive {
                uri: archive_uri.to_string(),
                reason: e.to_string(),
            });
        }
    };

    let mut buf = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
    file.read_to_end(&mut buf).map_err(|e| FetchError::Archive {
        uri: archive_uri.to_string(),
        reason: e.to_string(),
    })?;
    Ok(Bytes::from(buf))
}

#[async_trait]
impl RemoteSource for ArchiveSource {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn connect(&mut self) -> Result<(), FetchError> {
        self.base.connect().await?;
        self.connected = true;
        Ok(())
    }

    /// The entry is as new as the archive that holds it.
    fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.base.last_modified()
    }

    fn content_type(&self) -> Option<&str> {
        guess_content_type(&self.archive.entry)
    }

    async fn fetch(&mut self) -> Result<ResourceStream, FetchError> {
        let base_uri = self.archive.base.clone();
        let data = self
            .base
            .input_stream()
            .await?
            .read_to_end()
            .await
            .map_err(|source| FetchError::Io {
                uri: base_uri.clone(),
                source,
            })?;

        debug!(archive = %base_uri, entry = %self.archive.entry, bytes = data.len(), "Extracting entry");
        let entry = self.archive.entry.clone();
        let task_uri = base_uri.clone();
        let bytes = tokio::task::spawn_blocking(move || extract_entry(&task_uri, data, &entry))
            .await
            .map_err(|e| FetchError::Archive {
                uri: base_uri,
                reason: format!("extraction task failed: {e}"),
            })??;

        Ok(ResourceStream::from_bytes(bytes))
    }
}
