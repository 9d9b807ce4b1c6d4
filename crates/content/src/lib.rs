//! Typed content handling for Loadstone.
//!
//! A MIME type is classified into a `ContentCategory`, the handler chain
//! finds the first link with a parser bound to that category, and the
//! resulting `ContentHandler` turns a connection's bytes into `Content`.

pub mod chain;
pub mod mime;
pub mod parser;

pub use chain::{ChainLink, ContentHandler, HandlerChain};
pub use mime::{CATALOG_MIME, MimeTable, TOOL_GROUP_MIME, TOOL_MIME};
pub use parser::{CategorizedContent, JsonParser};
