//! Synchronous bus: a routing table plus a direct call.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use cqrs_eda_core::{DispatchError, Dispatchable, Scope};

use crate::handler::{Handler, Response};

/// Name → handler routing table, dispatched in the caller's task.
///
/// No queue, no concurrency control, no timeout: the caller's scope reaches
/// the handler untouched and whatever the handler returns is returned as is.
///
/// Registration takes `&mut self` and dispatch `&self`, so every handler is
/// registered before the bus can be shared for dispatching.
#[derive(Clone, Default)]
pub struct Bus {
    handlers: HashMap<String, Handler>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`, silently replacing any previous one.
    pub fn register(&mut self, name: impl Into<String>, handler: Handler) {
        self.handlers.insert(name.into(), handler);
    }

    /// Route `dispatchable` to the handler registered under its name and await it.
    pub async fn dispatch(&self, scope: &Scope, dispatchable: Arc<dyn Dispatchable>) -> Response {
        let Some(handler) = self.handlers.get(dispatchable.name()) else {
            return Err(DispatchError::not_dispatchable(dispatchable.name()));
        };

        trace!(name = dispatchable.name(), "dispatching");
        handler(scope.clone(), dispatchable).await
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}
