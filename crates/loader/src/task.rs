//! LoadTask: one cache-first load, reported to its listener exactly once.

use futures::FutureExt;
use loadstone_core::asset::ResourceStream;
use loadstone_core::cache::AssetCache;
use loadstone_core::error::{CacheError, ResolveError};
use loadstone_core::listener::{ErrorReporter, ResourceListener};
use loadstone_core::resolver::Resolver;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Why a load produced no stream.
#[derive(Debug, Error)]
pub enum LoadFailure {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Load panicked: {0}")]
    Panicked(String),

    #[error("Load dropped before it ran: worker pool shut down")]
    Abandoned,
}

impl LoadFailure {
    /// The status code handed to `resource_not_found`.
    ///
    /// Known statuses pass through; not-found is 404, malformed or
    /// unsupported URIs are 400, a load the pool never ran is 503, anything
    /// else is 500.
    pub fn status_code(&self) -> u16 {
        match self {
            LoadFailure::Resolve(e) => e.status_code().unwrap_or(match e {
                ResolveError::Configuration(_) => 400,
                ResolveError::Fetch(fetch) => fetch.status_code(),
                _ => 500,
            }),
            LoadFailure::Cache(_) | LoadFailure::Panicked(_) => 500,
            LoadFailure::Abandoned => 503,
        }
    }
}

/// Owns a listener until it has been notified.
///
/// Dropping an unnotified guard reports `LoadFailure::Abandoned`, so a task
/// discarded by a stopped pool still produces its one callback.
struct ListenerGuard {
    uri: String,
    listener: Option<Box<dyn ResourceListener>>,
    reporter: Arc<dyn ErrorReporter>,
}

impl ListenerGuard {
    fn loaded(mut self, stream: ResourceStream) {
        if let Some(listener) = self.listener.take() {
            listener.resource_loaded(&self.uri, stream);
        }
    }

    fn not_found(mut self, failure: &(dyn std::error::Error + 'static), status: u16) {
        self.reporter.report(&self.uri, status, failure);
        if let Some(listener) = self.listener.take() {
            listener.resource_not_found(&self.uri, status);
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            let failure = LoadFailure::Abandoned;
            let status = failure.status_code();
            debug!(uri = %self.uri, "Load abandoned");
            self.reporter.report(&self.uri, status, &failure);
            listener.resource_not_found(&self.uri, status);
        }
    }
}

/// A single load request.
///
/// The listener hears exactly once: from `run`, from `reject`, or, if the
/// task is dropped unrun, with status 503.
pub struct LoadTask {
    listener: ListenerGuard,
    cache: Arc<dyn AssetCache>,
    resolver: Arc<dyn Resolver>,
}

impl LoadTask {
    pub fn new(
        uri: impl Into<String>,
        listener: Box<dyn ResourceListener>,
        cache: Arc<dyn AssetCache>,
        resolver: Arc<dyn Resolver>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            listener: ListenerGuard {
                uri: uri.into(),
                listener: Some(listener),
                reporter,
            },
            cache,
            resolver,
        }
    }

    pub fn uri(&self) -> &str {
        &self.listener.uri
    }

    /// Fail the task without running it.
    pub fn reject(self, error: &(dyn std::error::Error + 'static), status: u16) {
        self.listener.not_found(error, status);
    }

    pub async fn run(self) {
        let LoadTask {
            listener,
            cache,
            resolver,
        } = self;

        let result = AssertUnwindSafe(load(&listener.uri, cache.as_ref(), resolver.as_ref()))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(LoadFailure::Panicked(panic_message(panic.as_ref()))));

        match result {
            Ok(stream) => listener.loaded(stream),
            Err(failure) => {
                let status = failure.status_code();
                listener.not_found(&failure, status);
            }
        }
    }
}

async fn load(
    uri: &str,
    cache: &dyn AssetCache,
    resolver: &dyn Resolver,
) -> Result<ResourceStream, LoadFailure> {
    if cache.exists(uri).await {
        match cache.retrieve(uri).await {
            Ok(stream) => {
                debug!(uri = %uri, "Loaded from cache");
                return Ok(stream);
            }
            // Removed between the two calls; resolve instead.
            Err(CacheError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(resolver.resolve(uri).await?)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
