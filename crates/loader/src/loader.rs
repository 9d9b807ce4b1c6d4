//! ResourceLoader: the entry point for asynchronous loads.

use loadstone_core::cache::AssetCache;
use loadstone_core::listener::{ErrorReporter, LoadOutcome, ResourceListener, TracingReporter};
use loadstone_core::resolver::Resolver;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, OnceLock, RwLock};
use tokio::sync::oneshot;
use tracing::warn;

use crate::error::LoaderError;
use crate::pool::WorkerPool;
use crate::task::LoadTask;

/// The two pools a loader owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolKind {
    /// Load requests (`load_resource`).
    File,
    /// Caller-supplied bulk work (`submit`).
    Data,
}

impl PoolKind {
    pub fn name(&self) -> &'static str {
        match self {
            PoolKind::File => "file",
            PoolKind::Data => "data",
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sizes used when a pool is created lazily.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub file_pool_size: usize,
    pub data_pool_size: usize,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            file_pool_size: 4,
            data_pool_size: 2,
        }
    }
}

impl PoolSettings {
    fn size_of(&self, kind: PoolKind) -> usize {
        match kind {
            PoolKind::File => self.file_pool_size,
            PoolKind::Data => self.data_pool_size,
        }
    }
}

/// Runs cache-first loads on the "file" pool and arbitrary work on the
/// "data" pool.
///
/// Pools are created on first use with the sizes from `PoolSettings`
/// unless `initialize`/`initialize_pool` created them first. A pool's size
/// is fixed once it exists.
pub struct ResourceLoader {
    cache: Arc<dyn AssetCache>,
    resolver: Arc<dyn Resolver>,
    reporter: RwLock<Arc<dyn ErrorReporter>>,
    settings: PoolSettings,
    file_pool: OnceLock<WorkerPool>,
    data_pool: OnceLock<WorkerPool>,
}

impl ResourceLoader {
    pub fn new(
        cache: Arc<dyn AssetCache>,
        resolver: Arc<dyn Resolver>,
        settings: PoolSettings,
    ) -> Self {
        Self {
            cache,
            resolver,
            reporter: RwLock::new(Arc::new(TracingReporter)),
            settings,
            file_pool: OnceLock::new(),
            data_pool: OnceLock::new(),
        }
    }

    pub fn cache(&self) -> &Arc<dyn AssetCache> {
        &self.cache
    }

    /// Create both pools with `pool_size` threads and install `reporter`.
    ///
    /// Fails if either pool already exists; the reporter is installed only
    /// when both pools were created here.
    pub fn initialize(
        &self,
        pool_size: usize,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Result<(), LoaderError> {
        for kind in [PoolKind::File, PoolKind::Data] {
            if self.cell(kind).get().is_some() {
                return Err(LoaderError::AlreadyInitialized { pool: kind.name() });
            }
        }
        self.initialize_pool(PoolKind::File, pool_size)?;
        self.initialize_pool(PoolKind::Data, pool_size)?;
        self.set_reporter(reporter);
        Ok(())
    }

    /// Create one pool with `size` threads.
    pub fn initialize_pool(&self, kind: PoolKind, size: usize) -> Result<(), LoaderError> {
        let cell = self.cell(kind);
        if cell.get().is_some() {
            return Err(LoaderError::AlreadyInitialized { pool: kind.name() });
        }
        let pool = WorkerPool::new(kind.name(), size)?;
        cell.set(pool)
            .map_err(|_| LoaderError::AlreadyInitialized { pool: kind.name() })
    }

    pub fn set_reporter(&self, reporter: Arc<dyn ErrorReporter>) {
        match self.reporter.write() {
            Ok(mut guard) => *guard = reporter,
            Err(poisoned) => *poisoned.into_inner() = reporter,
        }
    }

    /// Size of a pool, if it has been created.
    pub fn pool_size(&self, kind: PoolKind) -> Option<usize> {
        self.cell(kind).get().map(WorkerPool::size)
    }

    /// Load `uri` on the file pool and report to `listener`.
    ///
    /// The listener is called exactly once. If the pool cannot be started it
    /// is told immediately with status 500, on the calling thread. After
    /// `shutdown`, or if the pool stops before the load runs, it gets 503.
    pub fn load_resource<L>(&self, uri: impl Into<String>, listener: L)
    where
        L: ResourceListener,
    {
        let task = LoadTask::new(
            uri,
            Box::new(listener),
            self.cache.clone(),
            self.resolver.clone(),
            self.reporter(),
        );

        match self.pool(PoolKind::File) {
            Ok(pool) => {
                let uri = task.uri().to_string();
                // A rejected spawn drops the task, which notifies the listener.
                if let Err(e) = pool.spawn(task.run()) {
                    warn!(uri = %uri, error = %e, "Load rejected");
                }
            }
            Err(e) => {
                warn!(uri = %task.uri(), error = %e, "Load rejected");
                task.reject(&e, 500);
            }
        }
    }

    /// Load `uri` and wait for the outcome.
    pub async fn load(&self, uri: impl Into<String>) -> Result<LoadOutcome, LoaderError> {
        let (tx, rx) = oneshot::channel();
        self.load_resource(uri, tx);
        rx.await.map_err(|_| LoaderError::ShutDown)
    }

    /// Run `task` on the data pool.
    pub fn submit<F>(&self, task: F) -> Result<(), LoaderError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.pool(PoolKind::Data)?.spawn(task)
    }

    /// Stop both pools without waiting.
    ///
    /// Queued loads are dropped and their listeners receive 503; queued
    /// `submit` work is dropped.
    pub fn shutdown(&self) {
        for kind in [PoolKind::File, PoolKind::Data] {
            if let Some(pool) = self.cell(kind).get() {
                pool.shutdown();
            }
        }
    }

    fn reporter(&self) -> Arc<dyn ErrorReporter> {
        match self.reporter.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn cell(&self, kind: PoolKind) -> &OnceLock<WorkerPool> {
        match kind {
            PoolKind::File => &self.file_pool,
            PoolKind::Data => &self.data_pool,
        }
    }

    fn pool(&self, kind: PoolKind) -> Result<&WorkerPool, LoaderError> {
        let cell = self.cell(kind);
        if let Some(pool) = cell.get() {
            return Ok(pool);
        }

        let pool = WorkerPool::new(kind.name(), self.settings.size_of(kind))?;
        // Losing a creation race drops (and shuts down) our pool.
        let _ = cell.set(pool);
        cell.get().ok_or(LoaderError::ShutDown)
    }
}

impl Drop for ResourceLoader {
    fn drop(&mut self) {
        self.shutdown();
    }
}
