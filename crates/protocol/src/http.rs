//! HTTP(S) source backed by `reqwest`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use loadstone_core::asset::ResourceStream;
use loadstone_core::error::{ConfigurationError, FetchError};
use reqwest::header::{CONTENT_TYPE, HeaderMap, LAST_MODIFIED};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::source::RemoteSource;

/// A network file reached over http or https.
///
/// `connect` issues a HEAD request for `Last-Modified` and `Content-Type`;
/// `fetch` issues a GET and streams the body.
pub struct HttpSource {
    uri: String,
    url: Url,
    client: Client,
    connected: bool,
    last_modified: Option<DateTime<Utc>>,
    content_type: Option<String>,
}

impl HttpSource {
    pub fn new(uri: &str, client: Client) -> Result<Self, ConfigurationError> {
        let url = Url::parse(uri).map_err(|e| ConfigurationError::MalformedUri {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigurationError::UnsupportedScheme {
                uri: uri.to_string(),
                scheme: url.scheme().to_string(),
            });
        }
        if url.host_str().is_none() {
            return Err(ConfigurationError::MalformedUri {
                uri: uri.to_string(),
                reason: "missing host".into(),
            });
        }

        Ok(Self {
            uri: uri.to_string(),
            url,
            client,
            connected: false,
            last_modified: None,
            content_type: None,
        })
    }

    fn network_error(&self, e: reqwest::Error) -> FetchError {
        FetchError::Network {
            uri: self.uri.clone(),
            reason: e.to_string(),
        }
    }

    fn record_headers(&mut self, headers: &HeaderMap) {
        self.last_modified = headers
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_http_date);
        self.content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.connected = true;
    }
}

/// Parse an HTTP date (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl RemoteSource for HttpSource {
    fn uri(&self) -> &str {
        &self.uri
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn connect(&mut self) -> Result<(), FetchError> {
        let response = self
            .client
            .head(self.url.clone())
            .send()
            .await
            .map_err(|e| self.network_error(e))?;

        let status = response.status();
        if status == StatusCode::METHOD_NOT_ALLOWED {
            // Some servers refuse HEAD; metadata stays unknown.
            warn!(uri = %self.uri, "HEAD not allowed, remote metadata unavailable");
            self.connected = true;
            return Ok(());
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                uri: self.uri.clone(),
                status: status.as_u16(),
            });
        }

        self.record_headers(response.headers());
        debug!(uri = %self.uri, last_modified = ?self.last_modified, "Connected");
        Ok(())
    }

    fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    async fn fetch(&mut self) -> Result<ResourceStream, FetchError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| self.network_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                uri: self.uri.clone(),
                status: status.as_u16(),
            });
        }

        if !self.connected {
            self.record_headers(response.headers());
        }

        let body = response.bytes_stream().map_err(std::io::Error::other);
        Ok(ResourceStream::from_stream(body))
    }
}
