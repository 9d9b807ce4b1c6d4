//! Error types for the Loadstone domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; `Error` wraps them all.

use thiserror::Error;

use crate::content::ContentCategory;

/// The top-level error type for all Loadstone operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Cache errors ---
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    // --- Remote fetch errors ---
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    // --- URI composition errors ---
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    // --- Typed content errors ---
    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    // --- Resolver errors ---
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("No cached asset for {0}")]
    NotFound(String),

    /// A store failed partway. The previous asset (if any) is still in place.
    #[error("Failed to store {uri}: {reason}")]
    Write { uri: String, reason: String },

    #[error("Cache storage error: {0}")]
    Storage(String),
}

/// A URI could not be turned into a connection. Raised at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("Malformed URI '{uri}': {reason}")]
    MalformedUri { uri: String, reason: String },

    #[error("Unsupported URI scheme '{scheme}' in {uri}")]
    UnsupportedScheme { uri: String, scheme: String },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Remote returned status {status} for {uri}")]
    Status { uri: String, status: u16 },

    #[error("Network error fetching {uri}: {reason}")]
    Network { uri: String, reason: String },

    #[error("I/O error reading {uri}: {source}")]
    Io {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Entry '{entry}' not found in archive {archive}")]
    EntryNotFound { archive: String, entry: String },

    #[error("Invalid archive {uri}: {reason}")]
    Archive { uri: String, reason: String },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl FetchError {
    /// The HTTP-style status code that best describes this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            FetchError::Status { status, .. } => *status,
            FetchError::EntryNotFound { .. } => 404,
            FetchError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => 404,
            FetchError::Configuration(_) => 400,
            _ => 500,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("Empty {category} payload")]
    Empty { category: ContentCategory },

    #[error("Malformed {category} payload: {reason}")]
    Malformed {
        category: ContentCategory,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum ContentError {
    /// No link in the handler chain claims the classified category.
    #[error("No handler available for '{mime}' (category: {category})")]
    NoHandlerAvailable {
        mime: String,
        category: ContentCategory,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Resource not found in any location: {uri}")]
    NotFound { uri: String },

    #[error("Resolver gave status {status} for {uri}")]
    Status { uri: String, status: u16 },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ResolveError {
    /// The HTTP-style status code carried by this failure, if it carries one.
    ///
    /// `None` means the failure was not a status-bearing outcome and callers
    /// should fall back to a generic code.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ResolveError::NotFound { .. } => Some(404),
            ResolveError::Status { status, .. } => Some(*status),
            ResolveError::Fetch(FetchError::Status { status, .. }) => Some(*status),
            ResolveError::Fetch(FetchError::EntryNotFound { .. }) => Some(404),
            ResolveError::Fetch(_) | ResolveError::Configuration(_) | ResolveError::Cache(_) => {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_displays_correctly() {
        let err = Error::Fetch(FetchError::Status {
            uri: "http://example.com/a.json".into(),
            status: 404,
        });
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("a.json"));
    }

    #[test]
    fn fetch_error_status_codes() {
        let missing = FetchError::Io {
            uri: "file:/nope".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(missing.status_code(), 404);

        let denied = FetchError::Io {
            uri: "file:/locked".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no"),
        };
        assert_eq!(denied.status_code(), 500);

        let network = FetchError::Network {
            uri: "http://down".into(),
            reason: "connection refused".into(),
        };
        assert_eq!(network.status_code(), 500);
    }

    #[test]
    fn resolve_error_status_classification() {
        let nf = ResolveError::NotFound { uri: "a".into() };
        assert_eq!(nf.status_code(), Some(404));

        let forbidden = ResolveError::Fetch(FetchError::Status {
            uri: "a".into(),
            status: 403,
        });
        assert_eq!(forbidden.status_code(), Some(403));

        let cache = ResolveError::Cache(CacheError::Storage("disk full".into()));
        assert_eq!(cache.status_code(), None);
    }

    #[test]
    fn no_handler_error_names_mime() {
        let err = ContentError::NoHandlerAvailable {
            mime: "text/plain".into(),
            category: ContentCategory::Unclassified,
        };
        assert!(err.to_string().contains("text/plain"));
        assert!(err.to_string().contains("unclassified"));
    }
}
