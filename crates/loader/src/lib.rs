//! Asynchronous resource loading for Loadstone.
//!
//! `ResourceLoader` owns two worker pools: "file" for load requests and
//! "data" for caller-supplied bulk work. A load checks the shared cache
//! first and falls back to a `Resolver`; the listener hears exactly once.

pub mod error;
pub mod loader;
pub mod pool;
pub mod resolver;
pub mod task;

pub use error::LoaderError;
pub use loader::{PoolKind, PoolSettings, ResourceLoader};
pub use pool::WorkerPool;
pub use resolver::LocationResolver;
pub use task::{LoadFailure, LoadTask};
