//! Capability table and dispatch of events to handlers

use crate::error::{BotError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

/// An event that can be routed by kind
pub trait Event: Clone + Send + 'static {
    type Kind: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    fn kind(&self) -> Self::Kind;
}

/// Trait implemented by everything that reacts to events
#[async_trait]
pub trait EventHandler<E: Event>: Send + Sync {
    async fn handle(&self, event: E) -> Result<()>;
}

/// Adapter turning an async closure into an [`EventHandler`]
pub struct FnHandler<F>(F);

#[async_trait]
impl<E, F, Fut> EventHandler<E> for FnHandler<F>
where
    E: Event,
    F: Fn(E) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn handle(&self, event: E) -> Result<()> {
        (self.0)(event).await
    }
}

/// Wrap an async closure as a shareable handler
pub fn handler_fn<E, F, Fut>(f: F) -> Arc<dyn EventHandler<E>>
where
    E: Event,
    F: Fn(E) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Single-slot holder for the first failure raised by a detached handler
///
/// Later failures are dropped while one is stored. Waiters are woken as soon
/// as a failure lands.
#[derive(Debug, Default)]
pub struct FailureSlot {
    error: Mutex<Option<anyhow::Error>>,
    notify: Notify,
}

impl FailureSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `error` unless a failure is already held; returns whether it was stored
    pub fn record(&self, error: anyhow::Error) -> bool {
        let stored = {
            let mut slot = self.error.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_some() {
                false
            } else {
                *slot = Some(error);
                true
            }
        };

        if stored {
            self.notify.notify_waiters();
        }
        stored
    }

    pub fn is_set(&self) -> bool {
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Remove and return the stored failure
    pub fn take(&self) -> Option<anyhow::Error> {
        self.error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Resolve once a failure is held
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_set() {
                return;
            }
            notified.await;
        }
    }
}

/// Maps event kinds to handlers and runs them
pub struct EventDispatcher<E: Event> {
    handlers: HashMap<E::Kind, Arc<dyn EventHandler<E>>>,
    failures: Arc<FailureSlot>,
}

impl<E: Event> Default for EventDispatcher<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> EventDispatcher<E> {
    pub fn new() -> Self {
        Self::with_failure_slot(Arc::new(FailureSlot::new()))
    }

    /// Create a dispatcher that reports detached failures into `failures`
    pub fn with_failure_slot(failures: Arc<FailureSlot>) -> Self {
        Self {
            handlers: HashMap::new(),
            failures,
        }
    }

    /// Bind `handler` to `kind`, returning the handler it replaced
    pub fn register(
        &mut self,
        kind: E::Kind,
        handler: Arc<dyn EventHandler<E>>,
    ) -> Option<Arc<dyn EventHandler<E>>> {
        debug!("Registering handler for '{}'", kind);
        self.handlers.insert(kind, handler)
    }

    pub fn is_registered(&self, kind: E::Kind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn failures(&self) -> Arc<FailureSlot> {
        Arc::clone(&self.failures)
    }

    /// Run the handler for `event` on its own task without waiting for it
    ///
    /// Returns `None` when no handler is bound. A failing handler stores its
    /// error in the failure slot, wrapped in [`BotError::HandlerFailure`].
    pub fn dispatch_async(&self, event: E) -> Option<JoinHandle<()>> {
        let kind = event.kind();
        let Some(handler) = self.handlers.get(&kind).cloned() else {
            trace!("No handler registered for '{}'", kind);
            return None;
        };

        let failures = Arc::clone(&self.failures);
        Some(tokio::spawn(async move {
            if let Err(e) = handler.handle(event).await {
                let e = e.context(BotError::HandlerFailure {
                    event: kind.to_string(),
                });
                error!("Handler for '{}' failed: {:#}", kind, e);
                if !failures.record(e) {
                    debug!("A failure is already pending, dropping this one");
                }
            }
        }))
    }

    /// Run the handler for `event` and wait for it to finish
    ///
    /// The handler's error is returned to the caller instead of being stored.
    pub async fn dispatch_blocking(&self, event: E) -> Result<()> {
        let kind = event.kind();
        let Some(handler) = self.handlers.get(&kind).cloned() else {
            trace!("No handler registered for '{}'", kind);
            return Ok(());
        };

        handler.handle(event).await.map_err(|e| {
            e.context(BotError::HandlerFailure {
                event: kind.to_string(),
            })
        })
    }
}
