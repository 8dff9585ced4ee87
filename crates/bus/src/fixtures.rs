//! Shared test fixtures.

use std::sync::Arc;
use std::time::Duration;

use cqrs_eda_core::{DispatchError, Dispatchable, Scope};

use crate::handler::{Handler, Reply, Response, handler_fn};

#[derive(Debug, thiserror::Error)]
#[error("handler failed: {0}")]
pub struct HandlerFailed(pub &'static str);

/// A dispatchable with nothing but a name.
#[derive(Debug)]
pub struct Named(pub String);

impl Dispatchable for Named {
    fn name(&self) -> &str {
        &self.0
    }
}

pub fn named(name: &str) -> Arc<dyn Dispatchable> {
    Arc::new(Named(name.to_string()))
}

pub fn reply_str(reply: Reply) -> &'static str {
    *reply
        .downcast::<&'static str>()
        .expect("reply should be a &'static str")
}

/// Handler replying with `value` right away.
pub fn replying(value: &'static str) -> Handler {
    handler_fn(move |_scope, _d| async move { Ok(Box::new(value) as Reply) })
}

/// Handler failing with [`HandlerFailed`] right away.
pub fn failing(reason: &'static str) -> Handler {
    handler_fn(move |_scope, _d| async move { Err(DispatchError::handler(HandlerFailed(reason))) })
}

/// Handler that only returns once its scope ends, with its own error.
pub fn waiting_for_cancellation(reason: &'static str) -> Handler {
    handler_fn(move |scope: Scope, _d| async move {
        scope.done().await;
        Err(DispatchError::handler(HandlerFailed(reason)))
    })
}

/// Handler that sleeps for `duration`, ignoring its scope, then replies.
pub fn sleeping(duration: Duration, value: &'static str) -> Handler {
    handler_fn(move |_scope, _d| async move {
        tokio::time::sleep(duration).await;
        Ok(Box::new(value) as Reply)
    })
}

/// Handler that panics with `message` when polled.
pub fn panicking(message: &'static str) -> Handler {
    handler_fn(move |_scope, _d| panic_with(message))
}

async fn panic_with(message: &'static str) -> Response {
    panic!("{message}")
}
