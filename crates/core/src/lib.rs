//! # Loadstone Core
//!
//! Domain types, traits, and error definitions for the Loadstone resource
//! loading layer. This crate defines the contracts that the cache, protocol,
//! content and loader crates implement against.
//!
//! ## Design Philosophy
//!
//! Every seam is a trait here. Implementations live in their respective
//! crates. This enables:
//! - Swapping cache backends via configuration
//! - Easy testing with mock sources, resolvers and listeners
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod asset;
pub mod uri;
pub mod cache;
pub mod connection;
pub mod content;
pub mod listener;
pub mod resolver;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use asset::{Asset, ResourceStream};
pub use uri::{ArchiveUri, scheme_of};
pub use cache::{AssetCache, CachePolicy};
pub use connection::Connection;
pub use content::{Catalog, Content, ContentCategory, ContentParser, Tool, ToolGroup};
pub use listener::{ErrorReporter, FnListener, LoadOutcome, ResourceListener, TracingReporter};
pub use resolver::Resolver;
