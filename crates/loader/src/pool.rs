//! Fixed-size worker pools.
//!
//! Each pool is its own multi-threaded tokio runtime with `size` worker
//! threads. Every task holds one of `size` semaphore permits while it runs,
//! so at most `size` tasks make progress at once; the rest wait in order
//! of permit acquisition.

use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::error::LoaderError;

pub struct WorkerPool {
    name: &'static str,
    size: usize,
    handle: Handle,
    runtime: Mutex<Option<Runtime>>,
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(name: &'static str, size: usize) -> Result<Self, LoaderError> {
        if size == 0 {
            return Err(LoaderError::InvalidPoolSize { pool: name });
        }

        let runtime = Builder::new_multi_thread()
            .worker_threads(size)
            .thread_name(format!("loadstone-{name}"))
            .enable_all()
            .build()
            .map_err(|source| LoaderError::PoolStart { pool: name, source })?;

        info!(pool = name, size, "Worker pool started");
        Ok(Self {
            name,
            size,
            handle: runtime.handle().clone(),
            runtime: Mutex::new(Some(runtime)),
            permits: Arc::new(Semaphore::new(size)),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_shut_down(&self) -> bool {
        self.permits.is_closed()
    }

    /// Queue `task`. Never blocks; callable from any thread.
    ///
    /// After `shutdown` the task is dropped without running and
    /// `LoaderError::ShutDown` is returned. Tasks still queued when the pool
    /// shuts down are dropped as well.
    pub fn spawn<F>(&self, task: F) -> Result<(), LoaderError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_shut_down() {
            return Err(LoaderError::ShutDown);
        }
        let permits = self.permits.clone();
        self.handle.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            task.await;
        });
        Ok(())
    }

    /// Stop the runtime without waiting for queued or running tasks.
    pub fn shutdown(&self) {
        let runtime = match self.runtime.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(runtime) = runtime {
            debug!(pool = self.name, "Worker pool shutting down");
            self.permits.close();
            runtime.shutdown_background();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn zero_size_is_rejected() {
        assert!(matches!(
            WorkerPool::new("file", 0),
            Err(LoaderError::InvalidPoolSize { pool: "file" })
        ));
    }

    #[test]
    fn never_exceeds_pool_size() {
        const SIZE: usize = 2;
        const TASKS: usize = 10;

        let pool = WorkerPool::new("data", SIZE).unwrap();
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (done_tx, done_rx) = mpsc::channel();

        for _ in 0..TASKS {
            let (active, peak, done_tx) = (active.clone(), peak.clone(), done_tx.clone());
            pool.spawn(async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                done_tx.send(()).unwrap();
            })
            .unwrap();
        }

        for _ in 0..TASKS {
            done_rx.recv_timeout(Duration::from_secs(10)).unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= SIZE);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn tasks_run_on_pool_threads() {
        let pool = WorkerPool::new("file", 1).unwrap();
        let (tx, rx) = mpsc::channel();
        pool.spawn(async move {
            let name = std::thread::current().name().map(str::to_string);
            tx.send(name).unwrap();
        })
        .unwrap();
        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("loadstone-file"));
    }

    #[tokio::test]
    async fn shutdown_inside_async_context_does_not_block() {
        let pool = WorkerPool::new("data", 1).unwrap();
        pool.spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        })
        .unwrap();
        pool.shutdown();
        pool.shutdown();
        drop(pool);
    }

    #[test]
    fn spawn_after_shutdown_drops_task() {
        struct Dropped(mpsc::Sender<()>);
        impl Drop for Dropped {
            fn drop(&mut self) {
                let _ = self.0.send(());
            }
        }

        let pool = WorkerPool::new("file", 1).unwrap();
        pool.shutdown();
        assert!(pool.is_shut_down());

        let (tx, rx) = mpsc::channel();
        let guard = Dropped(tx);
        let result = pool.spawn(async move {
            let _guard = guard;
        });
        assert!(matches!(result, Err(LoaderError::ShutDown)));
        rx.recv_timeout(Duration::from_secs(1)).unwrap();
    }
}
