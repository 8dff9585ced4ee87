//! Event listener: fans one named event stream out to a list of callbacks.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::event::Event;

/// Callback invoked for every matching event.
pub type EventHandler = Box<dyn Fn(&dyn Event) + Send + Sync>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ListenerError {
    /// An event with another name arrived on this listener's channel; it was skipped.
    #[error("unexpected event: listener expects {expected}, received {found}")]
    UnexpectedEvent { expected: String, found: String },
}

/// Consumes events named `name` from a channel and runs every handler on each.
pub struct Listener {
    rx: mpsc::Receiver<Arc<dyn Event>>,
    name: String,
    handlers: Vec<EventHandler>,
}

impl Listener {
    pub fn new(
        rx: mpsc::Receiver<Arc<dyn Event>>,
        name: impl Into<String>,
        handlers: Vec<EventHandler>,
    ) -> Self {
        Self {
            rx,
            name: name.into(),
            handlers,
        }
    }

    /// Append a handler; handlers run in the order they were added.
    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&dyn Event) + Send + Sync + 'static,
    {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Receive and handle events until `shutdown` fires or every sender is gone.
    ///
    /// Events with another name are reported on `errors` (one
    /// [`ListenerError::UnexpectedEvent`] each) and no handler sees them.
    pub async fn listen(
        mut self,
        shutdown: CancellationToken,
        errors: mpsc::Sender<ListenerError>,
    ) {
        info!(listener = %self.name, handlers = self.handlers.len(), "listener started");

        loop {
            let event = tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                event = self.rx.recv() => match event {
                    Some(event) => event,
                    None => {
                        debug!(listener = %self.name, "event channel closed");
                        break;
                    }
                },
            };

            if event.name() != self.name {
                warn!(expected = %self.name, found = event.name(), "unexpected event");
                let err = ListenerError::UnexpectedEvent {
                    expected: self.name.clone(),
                    found: event.name().to_string(),
                };

                tokio::select! {
                    biased;

                    _ = shutdown.cancelled() => break,

                    sent = errors.send(err) => {
                        if sent.is_err() {
                            debug!(listener = %self.name, "error receiver dropped");
                        }
                    }
                }
                continue;
            }

            self.handle(event.as_ref());
        }

        info!(listener = %self.name, "listener stopped");
    }

    fn handle(&self, event: &dyn Event) {
        for handler in &self.handlers {
            handler(event);
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("name", &self.name)
            .field("handlers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}
