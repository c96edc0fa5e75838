//! Ordered, fail-fast event dispatch.

use std::fmt;
use std::sync::Arc;

use crate::events::{EntityEvent, LifecycleError};

/// Handles lifecycle events for entities of type `E`.
pub trait Listener<E>: Send + Sync {
    fn handle(&self, event: &mut EntityEvent<'_, E>) -> Result<(), LifecycleError>;
}

/// Adapts a closure into a [`Listener`].
pub struct ListenerFn<F>(pub F);

impl<E, F> Listener<E> for ListenerFn<F>
where
    F: Fn(&mut EntityEvent<'_, E>) -> Result<(), LifecycleError> + Send + Sync,
{
    fn handle(&self, event: &mut EntityEvent<'_, E>) -> Result<(), LifecycleError> {
        (self.0)(event)
    }
}

/// An ordered list of listeners; each instance is registered at most once.
pub struct Signal<E> {
    listeners: Vec<Arc<dyn Listener<E>>>,
}

impl<E> Signal<E> {
    pub fn new() -> Self {
        Self { listeners: Vec::new() }
    }

    /// Register a listener. Adding the same instance twice is a no-op.
    pub fn add(&mut self, listener: Arc<dyn Listener<E>>) {
        if self.index_of(&listener).is_none() {
            self.listeners.push(listener);
        }
    }

    /// Unregister a listener, preserving the order of the others.
    pub fn remove(&mut self, listener: &Arc<dyn Listener<E>>) {
        if let Some(index) = self.index_of(listener) {
            self.listeners.remove(index);
        }
    }

    /// Position of a listener, compared by identity.
    pub fn index_of(&self, listener: &Arc<dyn Listener<E>>) -> Option<usize> {
        self.listeners
            .iter()
            .position(|l| std::ptr::addr_eq(Arc::as_ptr(l), Arc::as_ptr(listener)))
    }

    /// Run every listener in registration order; the first error stops dispatch.
    pub fn dispatch(&self, event: &mut EntityEvent<'_, E>) -> Result<(), LifecycleError> {
        for listener in &self.listeners {
            if let Err(e) = listener.handle(event) {
                tracing::debug!(event = event.name(), error = %e, "listener rejected event");
                return Err(e);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<E> Default for Signal<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for Signal<E> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl<E> fmt::Debug for Signal<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
