//! Loader errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("The {pool} pool is already initialized")]
    AlreadyInitialized { pool: &'static str },

    #[error("The {pool} pool needs at least one thread")]
    InvalidPoolSize { pool: &'static str },

    #[error("Failed to start the {pool} pool: {source}")]
    PoolStart {
        pool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("The loader was shut down before the request completed")]
    ShutDown,
}
