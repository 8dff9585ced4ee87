//! Handler middleware.
//!
//! A [`Middleware`] wraps a handler in another handler of the same shape.
//! A [`Pipeline`] applies an ordered list of them: the first middleware
//! configured is the outermost, so it sees the call first and the result last.
//!
//! ```ignore
//! let handler = Pipeline::<dyn CommandHandler<AddUser>>::new()
//!     .with(ErrorLogging)
//!     .with(EventPublishing::new(events_bus))
//!     .build(Arc::new(AddUserHandler));
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{error, warn};

use cqrs_eda_bus::Dispatcher;
use cqrs_eda_core::{AsDispatchable, DispatchError, Scope};

use crate::command::{Command, CommandHandler, Events};
use crate::query::{Query, QueryHandler};

pub trait Middleware<H: ?Sized>: Send + Sync {
    fn wrap(&self, next: Arc<H>) -> Arc<H>;
}

/// Ordered middleware list for handlers of type `H`.
pub struct Pipeline<H: ?Sized> {
    layers: Vec<Arc<dyn Middleware<H>>>,
}

impl<H: ?Sized> Pipeline<H> {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Append `middleware` inside every middleware added before it.
    pub fn with<M>(mut self, middleware: M) -> Self
    where
        M: Middleware<H> + 'static,
    {
        self.layers.push(Arc::new(middleware));
        self
    }

    /// Wrap `handler` with every configured middleware.
    pub fn build(&self, handler: Arc<H>) -> Arc<H> {
        self.layers
            .iter()
            .rev()
            .fold(handler, |next, layer| layer.wrap(next))
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl<H: ?Sized> Default for Pipeline<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ?Sized> Clone for Pipeline<H> {
    fn clone(&self) -> Self {
        Self {
            layers: self.layers.clone(),
        }
    }
}

impl<H: ?Sized> fmt::Debug for Pipeline<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("layers", &self.layers.len())
            .finish()
    }
}

/// Logs failed commands and queries at `ERROR`, then passes the result on unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorLogging;

struct LoggedCommand<C> {
    next: Arc<dyn CommandHandler<C>>,
}

struct LoggedQuery<Q, R> {
    next: Arc<dyn QueryHandler<Q, R>>,
}

impl<C: Command> Middleware<dyn CommandHandler<C>> for ErrorLogging {
    fn wrap(&self, next: Arc<dyn CommandHandler<C>>) -> Arc<dyn CommandHandler<C>> {
        Arc::new(LoggedCommand { next })
    }
}

impl<Q: Query, R: Send + 'static> Middleware<dyn QueryHandler<Q, R>> for ErrorLogging {
    fn wrap(&self, next: Arc<dyn QueryHandler<Q, R>>) -> Arc<dyn QueryHandler<Q, R>> {
        Arc::new(LoggedQuery { next })
    }
}

#[async_trait::async_trait]
impl<C: Command> CommandHandler<C> for LoggedCommand<C> {
    async fn handle(&self, scope: &Scope, command: Arc<C>) -> Result<Events, DispatchError> {
        let result = self.next.handle(scope, Arc::clone(&command)).await;
        if let Err(err) = &result {
            error!(name = command.name(), command = ?command, error = %err, "command failed");
        }
        result
    }
}

#[async_trait::async_trait]
impl<Q: Query, R: Send + 'static> QueryHandler<Q, R> for LoggedQuery<Q, R> {
    async fn handle(&self, scope: &Scope, query: Arc<Q>) -> Result<R, DispatchError> {
        let result = self.next.handle(scope, Arc::clone(&query)).await;
        if let Err(err) = &result {
            error!(name = query.name(), query = ?query, error = %err, "query failed");
        }
        result
    }
}

/// Publishes the events of every successful command on an events bus.
///
/// Events go out one by one, in the order the handler returned them, under
/// the command's scope. A publication failure is logged and never fails the
/// command. The caller still receives the events.
#[derive(Clone)]
pub struct EventPublishing {
    events_bus: Arc<dyn Dispatcher>,
}

impl EventPublishing {
    pub fn new(events_bus: Arc<dyn Dispatcher>) -> Self {
        Self { events_bus }
    }
}

impl fmt::Debug for EventPublishing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPublishing").finish_non_exhaustive()
    }
}

struct PublishingCommand<C> {
    next: Arc<dyn CommandHandler<C>>,
    events_bus: Arc<dyn Dispatcher>,
}

impl<C: Command> Middleware<dyn CommandHandler<C>> for EventPublishing {
    fn wrap(&self, next: Arc<dyn CommandHandler<C>>) -> Arc<dyn CommandHandler<C>> {
        Arc::new(PublishingCommand {
            next,
            events_bus: Arc::clone(&self.events_bus),
        })
    }
}

#[async_trait::async_trait]
impl<C: Command> CommandHandler<C> for PublishingCommand<C> {
    async fn handle(&self, scope: &Scope, command: Arc<C>) -> Result<Events, DispatchError> {
        let events = self.next.handle(scope, command).await?;

        for event in &events {
            let dispatched = self
                .events_bus
                .dispatch(scope, Arc::clone(event).into_dispatchable())
                .await;
            if let Err(err) = dispatched {
                warn!(event = event.name(), error = %err, "event publication failed");
            }
        }

        Ok(events)
    }
}
