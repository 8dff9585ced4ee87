//! Handler signature shared by both buses.

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use cqrs_eda_core::{DispatchError, Dispatchable, Scope};

/// Type-erased handler result.
pub type Reply = Box<dyn Any + Send>;

/// What a dispatch ends with.
pub type Response = Result<Reply, DispatchError>;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// A bus handler: `(scope, dispatchable) -> (reply, error)`.
pub type Handler = Arc<dyn Fn(Scope, Arc<dyn Dispatchable>) -> HandlerFuture + Send + Sync>;

/// Build a [`Handler`] from an async closure.
///
/// ```ignore
/// bus.register("user.add", handler_fn(|_scope, d| async move {
///     Ok(Box::new(format!("added {}", d.name())) as Reply)
/// }));
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(Scope, Arc<dyn Dispatchable>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(
        move |scope: Scope, dispatchable: Arc<dyn Dispatchable>| -> HandlerFuture {
            Box::pin(f(scope, dispatchable))
        },
    )
}
