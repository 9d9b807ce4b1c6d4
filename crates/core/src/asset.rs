//! Assets and the byte streams that carry them.
//!
//! A `ResourceStream` is the unit handed between caches, connections,
//! parsers and listeners. It is a boxed stream of byte chunks so a remote
//! body can flow through without buffering, while cached reads are a single
//! shared `Bytes` chunk (cheap to clone, so every read is independent).

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A cached byte resource keyed by URI.
///
/// Assets are immutable; a cache replaces an asset by publishing a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// The exact URI this asset was stored under
    pub uri: String,

    /// The full content
    pub content: Bytes,

    /// When this asset was stored (used for freshness checks)
    pub last_modified: Option<DateTime<Utc>>,
}

impl Asset {
    pub fn new(uri: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            uri: uri.into(),
            content: content.into(),
            last_modified: Some(Utc::now()),
        }
    }

    /// A fresh stream over this asset's bytes.
    pub fn stream(&self) -> ResourceStream {
        ResourceStream::from_bytes(self.content.clone())
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// A one-shot stream of resource bytes.
pub struct ResourceStream {
    inner: BoxStream<'static, std::io::Result<Bytes>>,
}

impl ResourceStream {
    /// A stream that yields `bytes` as a single chunk.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self {
            inner: stream::once(async move { Ok(bytes) }).boxed(),
        }
    }

    /// Wrap an arbitrary chunk stream (e.g. an HTTP body).
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = std::io::Result<Bytes>> + Send + 'static,
    {
        Self {
            inner: stream.boxed(),
        }
    }

    /// Drain the stream into one contiguous buffer.
    ///
    /// Fails with the first chunk error; the partial buffer is discarded.
    pub async fn read_to_end(mut self) -> std::io::Result<Bytes> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.inner.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }
}

impl Stream for ResourceStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for ResourceStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceStream").finish_non_exhaustive()
    }
}
