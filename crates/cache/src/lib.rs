//! Asset cache implementations for Loadstone.

pub mod file_backend;
pub mod in_memory;

pub use file_backend::FileAssetCache;
pub use in_memory::InMemoryAssetCache;
