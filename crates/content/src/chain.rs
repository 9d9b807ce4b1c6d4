//! The content handler chain.
//!
//! Links are walked in order; the first link with a parser bound to the
//! requested category wins. An exhausted chain is `NoHandlerAvailable`.

use loadstone_core::connection::Connection;
use loadstone_core::content::{Content, ContentCategory, ContentParser};
use loadstone_core::error::{ContentError, FetchError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::mime::MimeTable;
use crate::parser::JsonParser;

/// One link: a named set of category → parser bindings.
#[derive(Clone, Default)]
pub struct ChainLink {
    name: String,
    parsers: HashMap<ContentCategory, Arc<dyn ContentParser>>,
}

impl ChainLink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parsers: HashMap::new(),
        }
    }

    /// Bind `parser` to the category it produces, replacing any earlier
    /// binding in this link.
    pub fn bind(mut self, parser: impl ContentParser + 'static) -> Self {
        self.parsers.insert(parser.category(), Arc::new(parser));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parser_for(&self, category: ContentCategory) -> Option<Arc<dyn ContentParser>> {
        self.parsers.get(&category).cloned()
    }
}

/// An ordered list of links plus the MIME table used to classify requests.
#[derive(Clone, Default)]
pub struct HandlerChain {
    links: Vec<ChainLink>,
    mime_table: MimeTable,
}

impl HandlerChain {
    pub fn new(mime_table: MimeTable) -> Self {
        Self {
            links: Vec::new(),
            mime_table,
        }
    }

    /// The built-in chain: a single link with JSON parsers for catalogs,
    /// tool groups and tools.
    pub fn standard() -> Self {
        Self::default().with_link(
            ChainLink::new("json")
                .bind(JsonParser::catalog())
                .bind(JsonParser::tool_group())
                .bind(JsonParser::tool()),
        )
    }

    /// Append a link at the end of the chain.
    pub fn with_link(mut self, link: ChainLink) -> Self {
        self.links.push(link);
        self
    }

    pub fn mime_table(&self) -> &MimeTable {
        &self.mime_table
    }

    pub fn mime_table_mut(&mut self) -> &mut MimeTable {
        &mut self.mime_table
    }

    pub fn create_handler(&self, mime: &str) -> Result<ContentHandler, ContentError> {
        let category = self.mime_table.classify(mime);

        for link in &self.links {
            if let Some(parser) = link.parser_for(category) {
                debug!(mime = %mime, %category, link = %link.name, "Handler found");
                return Ok(ContentHandler {
                    mime: mime.to_string(),
                    category,
                    parser,
                });
            }
        }

        Err(ContentError::NoHandlerAvailable {
            mime: mime.to_string(),
            category,
        })
    }
}

/// Turns a connection's bytes into typed content with one bound parser.
#[derive(Clone)]
pub struct ContentHandler {
    mime: String,
    category: ContentCategory,
    parser: Arc<dyn ContentParser>,
}

impl std::fmt::Debug for ContentHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentHandler")
            .field("mime", &self.mime)
            .field("category", &self.category)
            .finish_non_exhaustive()
    }
}

impl ContentHandler {
    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn category(&self) -> ContentCategory {
        self.category
    }

    /// Read the connection's input stream to the end and parse it.
    pub async fn get_content(&self, connection: &mut dyn Connection) -> Result<Content, ContentError> {
        let stream = connection.input_stream().await?;
        let bytes = stream.read_to_end().await.map_err(|source| FetchError::Io {
            uri: connection.uri().to_string(),
            source,
        })?;
        self.parse(&bytes)
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<Content, ContentError> {
        Ok(self.parser.parse(bytes)?)
    }
}
