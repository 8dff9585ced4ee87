use std::fmt;
use std::future::Future;
use std::sync::Arc;

use cqrs_eda_core::{DispatchError, Dispatchable, Scope};

/// A read-only request.
///
/// Implementors report [`MessageKind::Query`](cqrs_eda_core::MessageKind::Query)
/// from [`Dispatchable::kind`] so bus adapters accept them.
pub trait Query: Dispatchable + fmt::Debug {}

#[async_trait::async_trait]
pub trait QueryHandler<Q, R>: Send + Sync {
    async fn handle(&self, scope: &Scope, query: Arc<Q>) -> Result<R, DispatchError>;
}

/// [`QueryHandler`] backed by an async closure; see [`query_handler_fn`].
#[derive(Clone)]
pub struct QueryHandlerFn<F> {
    f: F,
}

pub fn query_handler_fn<Q, R, F, Fut>(f: F) -> QueryHandlerFn<F>
where
    Q: Query,
    R: Send + 'static,
    F: Fn(Scope, Arc<Q>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, DispatchError>> + Send + 'static,
{
    QueryHandlerFn { f }
}

#[async_trait::async_trait]
impl<Q, R, F, Fut> QueryHandler<Q, R> for QueryHandlerFn<F>
where
    Q: Query,
    R: Send + 'static,
    F: Fn(Scope, Arc<Q>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, DispatchError>> + Send + 'static,
{
    async fn handle(&self, scope: &Scope, query: Arc<Q>) -> Result<R, DispatchError> {
        (self.f)(scope.clone(), query).await
    }
}
