//! Protocol connections for Loadstone.
//!
//! Every connection pairs a `RemoteSource` (http, file, archive entry) with
//! the shared asset cache through `CachedConnection`, which implements the
//! cache-aside fetch. `ConnectionFactory` picks the source by URI scheme.

pub mod archive;
pub mod cached;
pub mod factory;
pub mod file;
pub mod http;
pub mod mime;
pub mod source;

pub use archive::ArchiveSource;
pub use cached::CachedConnection;
pub use factory::{ConnectionFactory, http_client};
pub use file::FileSource;
pub use http::HttpSource;
pub use mime::guess_content_type;
pub use source::RemoteSource;
