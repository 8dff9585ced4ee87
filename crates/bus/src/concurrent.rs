//! Concurrent bus: bounded, deadline-enforced, asynchronous dispatch.
//!
//! ## Pipeline
//!
//! 1. [`ConcurrentBus::dispatch`] wraps the call into an envelope (scope,
//!    dispatchable, private oneshot) and pushes it onto the unbounded submission
//!    channel. The caller gets a [`PendingResponse`] back immediately.
//! 2. The run loop ([`ConcurrentBus::run`]) receives envelopes one at a time.
//!    Unknown names are answered with `NotDispatchable` on the spot.
//! 3. Known names wait for an admission-pool permit. While the pool is
//!    saturated the run loop itself waits, so arrivals queue in the submission
//!    channel instead of piling up as running tasks.
//! 4. Each admitted envelope gets one worker task: it derives a sub-scope
//!    bounded by the bus timeout, runs the handler against it, releases the
//!    permit and delivers exactly one response. A panicking handler is
//!    answered with [`DispatchError::HandlerPanicked`].
//!
//! ## Shutdown
//!
//! When the shutdown token fires the run loop stops admitting work, closes the
//! submission channel and answers every envelope still queued with
//! [`DispatchError::BusStopped`]. Workers already admitted finish normally.
//! Dispatching on a stopped bus resolves to `BusStopped` right away.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::FutureExt;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use cqrs_eda_core::{DispatchError, Dispatchable, Scope};

use crate::config::{ConcurrentBusConfig, ConfigError};
use crate::handler::{Handler, Response};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RunError {
    /// `run` was already called on this bus (or one of its clones).
    #[error("concurrent bus run loop already started")]
    AlreadyStarted,
}

/// One dispatch travelling from the caller to a worker.
struct Envelope {
    scope: Scope,
    dispatchable: Arc<dyn Dispatchable>,
    reply: oneshot::Sender<Response>,
}

impl Envelope {
    fn respond(self, response: Response) {
        // The caller may have dropped its PendingResponse; nobody is left to tell.
        let _ = self.reply.send(response);
    }
}

/// The caller's end of a dispatch: resolves to exactly one [`Response`].
#[derive(Debug)]
#[must_use = "a dispatch is only observed by awaiting its PendingResponse"]
pub struct PendingResponse {
    rx: oneshot::Receiver<Response>,
}

impl Future for PendingResponse {
    type Output = Response;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(DispatchError::BusStopped)))
    }
}

struct Inner {
    handlers: RwLock<HashMap<String, Handler>>,
    timeout: Duration,
    concurrency_limit: usize,
    pool: Arc<Semaphore>,
    submit: mpsc::UnboundedSender<Envelope>,
    // Taken by the one run loop.
    inbox: Mutex<Option<mpsc::UnboundedReceiver<Envelope>>>,
}

/// Bus dispatching through a bounded pool of concurrently running handlers.
///
/// Cheap to clone; clones share handlers, pool and run loop.
///
/// ```ignore
/// let bus = ConcurrentBus::new(ConcurrentBusConfig::new(Duration::from_secs(1), 2))?;
/// bus.register("event0", forward_to::<EventBasic>(tx));
///
/// let shutdown = CancellationToken::new();
/// tokio::spawn({
///     let bus = bus.clone();
///     let shutdown = shutdown.clone();
///     async move { bus.run(shutdown).await }
/// });
///
/// let response = bus.dispatch(&Scope::new(), event).await;
/// ```
#[derive(Clone)]
pub struct ConcurrentBus {
    inner: Arc<Inner>,
}

impl ConcurrentBus {
    pub fn new(config: ConcurrentBusConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let (submit, inbox) = mpsc::unbounded_channel();
        Ok(Self {
            inner: Arc::new(Inner {
                handlers: RwLock::new(HashMap::new()),
                timeout: config.timeout,
                concurrency_limit: config.concurrency_limit,
                pool: Arc::new(Semaphore::new(config.concurrency_limit)),
                submit,
                inbox: Mutex::new(Some(inbox)),
            }),
        })
    }

    /// Register `handler` under `name`, silently replacing any previous one.
    ///
    /// Safe while the bus is running; dispatches already routed keep the
    /// handler they were routed to.
    pub fn register(&self, name: impl Into<String>, handler: Handler) {
        self.inner
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), handler);
    }

    /// Submit `dispatchable`; the returned future yields its response.
    ///
    /// Never blocks: the envelope is queued until the run loop picks it up.
    pub fn dispatch(&self, scope: &Scope, dispatchable: Arc<dyn Dispatchable>) -> PendingResponse {
        let (reply, rx) = oneshot::channel();
        let envelope = Envelope {
            scope: scope.clone(),
            dispatchable,
            reply,
        };

        if let Err(mpsc::error::SendError(envelope)) = self.inner.submit.send(envelope) {
            envelope.respond(Err(DispatchError::BusStopped));
        }
        PendingResponse { rx }
    }

    /// Run the dispatch loop until `shutdown` is cancelled.
    ///
    /// Must be called exactly once per bus; later calls fail with
    /// [`RunError::AlreadyStarted`].
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), RunError> {
        let mut inbox = self
            .inner
            .inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(RunError::AlreadyStarted)?;

        info!(
            concurrency_limit = self.inner.concurrency_limit,
            timeout_ms = u64::try_from(self.inner.timeout.as_millis()).unwrap_or(u64::MAX),
            "concurrent bus running"
        );

        loop {
            let envelope = tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                envelope = inbox.recv() => match envelope {
                    Some(envelope) => envelope,
                    None => break,
                },
            };

            let name = envelope.dispatchable.name();
            let Some(handler) = self.handler(name) else {
                let err = DispatchError::not_dispatchable(name);
                envelope.respond(Err(err));
                continue;
            };

            let permit = tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    envelope.respond(Err(DispatchError::BusStopped));
                    break;
                }

                permit = Arc::clone(&self.inner.pool).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => {
                        envelope.respond(Err(DispatchError::BusStopped));
                        break;
                    }
                },
            };

            self.spawn_worker(envelope, handler, permit);
        }

        inbox.close();
        let mut stopped = 0usize;
        while let Ok(envelope) = inbox.try_recv() {
            envelope.respond(Err(DispatchError::BusStopped));
            stopped += 1;
        }

        info!(pending_failed = stopped, "concurrent bus stopped");
        Ok(())
    }

    /// Number of handler executions currently holding an admission slot.
    pub fn current_size(&self) -> usize {
        self.inner.concurrency_limit - self.inner.pool.available_permits()
    }

    pub fn concurrency_limit(&self) -> usize {
        self.inner.concurrency_limit
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    fn handler(&self, name: &str) -> Option<Handler> {
        self.inner
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn spawn_worker(&self, envelope: Envelope, handler: Handler, permit: OwnedSemaphorePermit) {
        let scope = envelope.scope.with_timeout(self.inner.timeout);

        tokio::spawn(async move {
            let Envelope {
                dispatchable,
                reply,
                ..
            } = envelope;
            trace!(name = dispatchable.name(), "admitted");

            let run = AssertUnwindSafe({
                let scope = scope.clone();
                async move { handler(scope, dispatchable).await }
            })
            .catch_unwind();

            // A handler still pending when its scope ends is dropped here.
            let response = tokio::select! {
                biased;

                outcome = run => outcome.unwrap_or_else(|payload| {
                    let message = panic_message(payload);
                    warn!(panic = %message, "handler panicked");
                    Err(DispatchError::HandlerPanicked(message))
                }),

                reason = scope.done() => {
                    debug!(error = %reason, "dispatch abandoned");
                    Err(reason)
                }
            };

            drop(permit);
            scope.cancel();
            let _ = reply.send(response);
        });
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map_or_else(|| "non-string panic payload".to_string(), |m| m.to_string()),
    }
}

impl fmt::Debug for ConcurrentBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentBus")
            .field("timeout", &self.inner.timeout)
            .field("concurrency_limit", &self.inner.concurrency_limit)
            .field("current_size", &self.current_size())
            .finish_non_exhaustive()
    }
}
