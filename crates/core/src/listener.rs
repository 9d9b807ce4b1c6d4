//! Load listeners and failure reporting.
//!
//! A listener receives exactly one callback per load request. Both methods
//! take `self: Box<Self>`, so the callback consumes the listener and a second
//! notification cannot be expressed.

use tokio::sync::oneshot;
use tracing::warn;

use crate::asset::ResourceStream;

/// Receives the outcome of one asynchronous load.
///
/// Callbacks run on the worker thread that executed the load. Listeners with
/// thread-affinity requirements must redispatch themselves.
pub trait ResourceListener: Send + 'static {
    /// The resource was found; `stream` carries its bytes.
    fn resource_loaded(self: Box<Self>, uri: &str, stream: ResourceStream);

    /// The resource could not be loaded. `status_code` follows HTTP
    /// conventions (404 not found, 500 generic failure, ...).
    fn resource_not_found(self: Box<Self>, uri: &str, status_code: u16);
}

/// The outcome of a load, as a value.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded { uri: String, stream: ResourceStream },
    NotFound { uri: String, status_code: u16 },
}

impl LoadOutcome {
    pub fn uri(&self) -> &str {
        match self {
            LoadOutcome::Loaded { uri, .. } | LoadOutcome::NotFound { uri, .. } => uri,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded { .. })
    }
}

/// Deliver the outcome through a oneshot channel.
///
/// A dropped receiver is not an error; the outcome is discarded.
impl ResourceListener for oneshot::Sender<LoadOutcome> {
    fn resource_loaded(self: Box<Self>, uri: &str, stream: ResourceStream) {
        let _ = (*self).send(LoadOutcome::Loaded {
            uri: uri.to_string(),
            stream,
        });
    }

    fn resource_not_found(self: Box<Self>, uri: &str, status_code: u16) {
        let _ = (*self).send(LoadOutcome::NotFound {
            uri: uri.to_string(),
            status_code,
        });
    }
}

/// Adapts a closure over `LoadOutcome` into a listener.
pub struct FnListener<F>(F);

impl<F> FnListener<F>
where
    F: FnOnce(LoadOutcome) + Send + 'static,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> ResourceListener for FnListener<F>
where
    F: FnOnce(LoadOutcome) + Send + 'static,
{
    fn resource_loaded(self: Box<Self>, uri: &str, stream: ResourceStream) {
        (self.0)(LoadOutcome::Loaded {
            uri: uri.to_string(),
            stream,
        });
    }

    fn resource_not_found(self: Box<Self>, uri: &str, status_code: u16) {
        (self.0)(LoadOutcome::NotFound {
            uri: uri.to_string(),
            status_code,
        });
    }
}

/// Receives load failures for diagnostics, alongside the listener callback.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, uri: &str, status_code: u16, error: &(dyn std::error::Error + 'static));
}

/// Reports failures as `tracing` warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, uri: &str, status_code: u16, error: &(dyn std::error::Error + 'static)) {
        warn!(uri = %uri, status = status_code, error = %error, "Resource load failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn oneshot_listener_delivers_loaded() {
        let (tx, rx) = oneshot::channel();
        let listener: Box<dyn ResourceListener> = Box::new(tx);
        listener.resource_loaded("mem:a", ResourceStream::from_bytes("abc"));

        match rx.await.unwrap() {
            LoadOutcome::Loaded { uri, stream } => {
                assert_eq!(uri, "mem:a");
                assert_eq!(&stream.read_to_end().await.unwrap()[..], b"abc");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn oneshot_listener_delivers_not_found() {
        let (tx, rx) = oneshot::channel();
        Box::new(tx).resource_not_found("mem:b", 404);
        let outcome = rx.await.unwrap();
        assert!(!outcome.is_loaded());
        assert_eq!(outcome.uri(), "mem:b");
    }

    #[test]
    fn fn_listener_runs_closure_once() {
        let (tx, rx) = std::sync::mpsc::channel();
        let listener = Box::new(FnListener::new(move |outcome: LoadOutcome| {
            tx.send(outcome.uri().to_string()).unwrap();
        }));
        listener.resource_not_found("mem:c", 500);
        assert_eq!(rx.recv().unwrap(), "mem:c");
        assert!(rx.try_recv().is_err());
    }
}
