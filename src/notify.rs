//! Observer fan-out with copy-on-write handler lists.
//!
//! [`AsyncEvent`] holds an ordered list of synchronous and asynchronous
//! handlers. Registration and removal swap in a new list under a short lock;
//! invocation works on a snapshot taken at the start of the call, so handlers
//! may add or remove handlers while being invoked without affecting the
//! current round.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt;
use futures::future::BoxFuture;

/// Error type returned by handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

type SyncHandler<T> = Arc<dyn Fn(&T) -> Result<(), HandlerError> + Send + Sync>;
type AsyncHandler<T> = Arc<dyn Fn(T) -> BoxFuture<'static, Result<(), HandlerError>> + Send + Sync>;

enum Handler<T> {
    Sync(SyncHandler<T>),
    Async(AsyncHandler<T>),
}

impl<T> Clone for Handler<T> {
    fn clone(&self) -> Self {
        match self {
            Handler::Sync(h) => Handler::Sync(Arc::clone(h)),
            Handler::Async(h) => Handler::Async(Arc::clone(h)),
        }
    }
}

/// Identifies a registered handler for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type HandlerList<T> = Arc<Vec<(HandlerId, Handler<T>)>>;

/// A multi-handler event with strict ([`invoke`](Self::invoke)) and
/// best-effort ([`try_invoke`](Self::try_invoke)) invocation.
pub struct AsyncEvent<T> {
    handlers: Mutex<HandlerList<T>>,
    next_id: AtomicU64,
}

impl<T> Default for AsyncEvent<T> {
    fn default() -> Self {
        Self {
            handlers: Mutex::new(Arc::new(Vec::new())),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<T> std::fmt::Debug for AsyncEvent<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncEvent")
            .field("handlers", &self.snapshot().len())
            .finish_non_exhaustive()
    }
}

impl<T> AsyncEvent<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> HandlerList<T> {
        let guard = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    fn push(&self, handler: Handler<T>) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut guard = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        let mut list = Vec::with_capacity(guard.len() + 1);
        list.extend(guard.iter().cloned());
        list.push((id, handler));
        *guard = Arc::new(list);
        id
    }

    /// Register a synchronous handler.
    pub fn add_handler<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&T) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        self.push(Handler::Sync(Arc::new(handler)))
    }

    /// Register an asynchronous handler. It receives its own clone of the arguments.
    pub fn add_async_handler<F, Fut>(&self, handler: F) -> HandlerId
    where
        T: 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.push(Handler::Async(Arc::new(move |args| handler(args).boxed())))
    }

    /// Remove a handler. Returns `false` if it was not registered.
    pub fn remove_handler(&self, id: HandlerId) -> bool {
        let mut guard = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        if !guard.iter().any(|(existing, _)| *existing == id) {
            return false;
        }
        let list: Vec<_> = guard
            .iter()
            .filter(|(existing, _)| *existing != id)
            .cloned()
            .collect();
        *guard = Arc::new(list);
        true
    }

    pub fn has_handlers(&self) -> bool {
        !self.snapshot().is_empty()
    }

    pub fn handler_count(&self) -> usize {
        self.snapshot().len()
    }
}

impl<T: Clone + Send + Sync + 'static> AsyncEvent<T> {
    /// Invoke every handler in registration order, stopping at the first error.
    pub async fn invoke(&self, args: T) -> Result<(), HandlerError> {
        let handlers = self.snapshot();
        for (_, handler) in handlers.iter() {
            match handler {
                Handler::Sync(h) => h(&args)?,
                Handler::Async(h) => h(args.clone()).await?,
            }
        }
        Ok(())
    }

    /// Like [`invoke`](Self::invoke), but failures are logged and swallowed.
    pub async fn try_invoke(&self, args: T) {
        if let Err(e) = self.invoke(args).await {
            tracing::warn!(error = %e, "Event handler failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test]
    async fn test_invoke_runs_handlers_in_order() {
        let event = AsyncEvent::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let sync_log = Arc::clone(&log);
        event.add_handler(move |v| {
            sync_log.lock().unwrap().push(format!("sync {v}"));
            Ok(())
        });
        let async_log = Arc::clone(&log);
        event.add_async_handler(move |v| {
            let async_log = Arc::clone(&async_log);
            async move {
                tokio::task::yield_now().await;
                async_log.lock().unwrap().push(format!("async {v}"));
                Ok(())
            }
        });

        event.invoke(5).await.unwrap();
        assert_eq!(*log.lock().unwrap(), ["sync 5", "async 5"]);
    }

    #[tokio::test]
    async fn test_invoke_stops_at_first_error() {
        let event = AsyncEvent::<()>::new();
        let calls = Arc::new(AtomicUsize::new(0));

        event.add_handler(|_| Err("first failed".into()));
        let counter = Arc::clone(&calls);
        event.add_handler(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let err = event.invoke(()).await.unwrap_err();
        assert_eq!(err.to_string(), "first failed");
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Best-effort invocation swallows the error.
        event.try_invoke(()).await;
    }

    #[tokio::test]
    async fn test_remove_handler() {
        let event = AsyncEvent::<()>::new();
        let id = event.add_handler(|_| Ok(()));
        assert!(event.has_handlers());
        assert!(event.remove_handler(id));
        assert!(!event.remove_handler(id));
        assert!(!event.has_handlers());
    }

    #[tokio::test]
    async fn test_registration_during_invoke_uses_snapshot() {
        let event = Arc::new(AsyncEvent::<()>::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let inner_event = Arc::clone(&event);
        let inner_calls = Arc::clone(&calls);
        event.add_handler(move |_| {
            inner_calls.fetch_add(1, Ordering::SeqCst);
            let late_calls = Arc::clone(&inner_calls);
            inner_event.add_handler(move |_| {
                late_calls.fetch_add(100, Ordering::SeqCst);
                Ok(())
            });
            Ok(())
        });

        event.invoke(()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(event.handler_count(), 2);
    }
}
